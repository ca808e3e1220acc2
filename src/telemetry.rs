//! Process-wide counter telemetry
//!
//! Disabled by default. While disabled every emission point is a single
//! atomic load; no tags are built and nothing is allocated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// A sink for counter metrics
pub trait Emitter: Send + Sync {
    /// Record `value` against the counter `name` with the given tags.
    fn counter(&self, name: &str, value: f64, tags: &[(&str, &str)]) -> anyhow::Result<()>;
}

static ENABLED: AtomicBool = AtomicBool::new(false);
static SINK: RwLock<Option<Arc<dyn Emitter>>> = parking_lot::const_rwlock(None);

/// Install `emitter` as the process-wide sink.
pub fn enable(emitter: Arc<dyn Emitter>) {
    *SINK.write() = Some(emitter);
    ENABLED.store(true, Ordering::Release);
}

/// Remove the sink. Calls racing with this may still emit once.
pub fn disable() {
    ENABLED.store(false, Ordering::Release);
    *SINK.write() = None;
}

#[inline]
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Acquire)
}

/// Emit a counter. Sink errors are swallowed.
#[inline]
pub fn emit_counter(name: &str, value: f64, tags: &[(&str, &str)]) {
    if !is_enabled() {
        return;
    }
    let sink = SINK.read().clone();
    if let Some(sink) = sink {
        if let Err(err) = sink.counter(name, value, tags) {
            tracing::debug!(metric = name, error = %err, "telemetry emission failed");
        }
    }
}

/// In-memory emitter used by tests and the similarity CLI.
#[derive(Debug, Default)]
pub struct RecordingEmitter {
    records: parking_lot::Mutex<Vec<CounterRecord>>,
}

/// One recorded counter emission
#[derive(Debug, Clone, PartialEq)]
pub struct CounterRecord {
    pub name: String,
    pub value: f64,
    pub tags: Vec<(String, String)>,
}

impl CounterRecord {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<CounterRecord> {
        self.records.lock().clone()
    }

    /// Records whose name matches `name`
    pub fn named(&self, name: &str) -> Vec<CounterRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.name == name)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Emitter for RecordingEmitter {
    fn counter(&self, name: &str, value: f64, tags: &[(&str, &str)]) -> anyhow::Result<()> {
        self.records.lock().push(CounterRecord {
            name: name.to_string(),
            value,
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        Ok(())
    }
}

/// Serialises tests that install the process-wide sink.
#[cfg(test)]
pub(crate) static TEST_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingEmitter;

    impl Emitter for FailingEmitter {
        fn counter(&self, _name: &str, _value: f64, _tags: &[(&str, &str)]) -> anyhow::Result<()> {
            anyhow::bail!("sink offline")
        }
    }

    #[test]
    fn test_disabled_by_default_emits_nothing() {
        let _guard = TEST_LOCK.lock();
        disable();
        let recorder = Arc::new(RecordingEmitter::new());
        emit_counter("noop", 1.0, &[]);
        assert!(recorder.records().is_empty());
        assert!(!is_enabled());
    }

    #[test]
    fn test_enable_records_and_disable_stops() {
        let _guard = TEST_LOCK.lock();
        let recorder = Arc::new(RecordingEmitter::new());
        enable(recorder.clone());
        emit_counter("calls", 1.0, &[("algorithm", "levenshtein")]);
        disable();
        emit_counter("calls", 1.0, &[]);

        let records = recorder.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tag("algorithm"), Some("levenshtein"));
    }

    #[test]
    fn test_sink_errors_are_swallowed() {
        let _guard = TEST_LOCK.lock();
        enable(Arc::new(FailingEmitter));
        emit_counter("calls", 1.0, &[]);
        disable();
    }
}

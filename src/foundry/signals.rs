//! Signal semantics catalog
//!
//! Describes how a process should react to each POSIX signal, the exit code
//! it should leave with, and what Windows offers in its place. The library
//! only reports the Windows fallback; acting on it is up to the caller.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::assets;
use crate::foundry::exit_codes::ExitCode;

const CATALOG: &str = "foundry/signals.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultBehavior {
    GracefulShutdown,
    GracefulShutdownWithDoubleTap,
    ReloadViaRestart,
    ImmediateExit,
    ObserveOnly,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowsFallback {
    pub fallback_behavior: String,
    pub log_level: String,
    pub log_message: String,
    #[serde(default)]
    pub operation_hint: Option<String>,
    #[serde(default)]
    pub telemetry_event: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadStrategy {
    #[serde(default)]
    pub validation_required: bool,
    #[serde(default)]
    pub cleanup_actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub name: String,
    pub unix_number: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub windows_event: Option<String>,
    #[serde(default)]
    pub windows_fallback: Option<WindowsFallback>,
    pub default_behavior: DefaultBehavior,
    pub exit_code: ExitCode,
    #[serde(default)]
    pub timeout_seconds: Option<u32>,
    /// OS name -> signal number where it differs from Linux
    #[serde(default)]
    pub platform_overrides: BTreeMap<String, i32>,
    #[serde(default)]
    pub double_tap_window_seconds: Option<u32>,
    #[serde(default)]
    pub double_tap_message: Option<String>,
    #[serde(default)]
    pub double_tap_exit_code: Option<ExitCode>,
    #[serde(default)]
    pub reload_strategy: Option<ReloadStrategy>,
}

/// What stands in for a signal on Windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowsMapping<'a> {
    /// A native console control event
    Event(&'a str),
    Fallback(&'a WindowsFallback),
    Unsupported,
}

impl Signal {
    pub fn windows_mapping(&self) -> WindowsMapping<'_> {
        match (&self.windows_event, &self.windows_fallback) {
            (Some(event), _) => WindowsMapping::Event(event),
            (None, Some(fallback)) => WindowsMapping::Fallback(fallback),
            (None, None) => WindowsMapping::Unsupported,
        }
    }

    /// Signal number on the given OS (`std::env::consts::OS` naming)
    pub fn number_for(&self, os: &str) -> i32 {
        self.platform_overrides.get(os).copied().unwrap_or(self.unix_number)
    }

    /// Signal number on the running platform
    pub fn number(&self) -> i32 {
        let os = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        self.number_for(os)
    }

    pub fn supports_double_tap(&self) -> bool {
        self.default_behavior == DefaultBehavior::GracefulShutdownWithDoubleTap
    }
}

#[derive(Debug, Deserialize)]
struct SignalFile {
    version: String,
    signals: Vec<Signal>,
}

#[derive(Debug)]
pub struct SignalCatalog {
    pub version: String,
    signals: Vec<Signal>,
    by_key: HashMap<String, usize>,
}

impl SignalCatalog {
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Accepts the id (`term`), the POSIX name (`SIGTERM`) or the bare name (`TERM`)
    pub fn get(&self, key: &str) -> Option<&Signal> {
        let key = key.trim().to_ascii_lowercase();
        let key = key.strip_prefix("sig").unwrap_or(&key);
        self.by_key.get(key).map(|&i| &self.signals[i])
    }

    /// Looks at the Linux number and every platform override
    pub fn by_number(&self, number: i32) -> Option<&Signal> {
        self.signals.iter().find(|s| s.unix_number == number).or_else(|| {
            self.signals
                .iter()
                .find(|s| s.platform_overrides.values().any(|&n| n == number))
        })
    }
}

pub fn catalog() -> &'static SignalCatalog {
    static CELL: OnceLock<SignalCatalog> = OnceLock::new();
    CELL.get_or_init(|| {
        let file: SignalFile = assets::load_yaml_catalog(CATALOG);
        let mut by_key = HashMap::new();
        for (i, signal) in file.signals.iter().enumerate() {
            if signal.windows_event.is_some() && signal.windows_fallback.is_some() {
                assets::load_failure(CATALOG, &format!("{} declares both a windows event and a fallback", signal.name));
            }
            let bare = signal.name.to_ascii_lowercase();
            let bare = bare.strip_prefix("sig").unwrap_or(&bare).to_string();
            if bare != signal.id {
                assets::load_failure(CATALOG, &format!("{} does not match id {}", signal.name, signal.id));
            }
            if by_key.insert(bare, i).is_some() {
                assets::load_failure(CATALOG, &format!("signal {} listed twice", signal.id));
            }
        }
        tracing::debug!(count = file.signals.len(), "loaded signal catalog");
        SignalCatalog {
            version: file.version,
            signals: file.signals,
            by_key,
        }
    })
}

pub fn signal(key: &str) -> Option<&'static Signal> {
    catalog().get(key)
}

pub fn signal_by_number(number: i32) -> Option<&'static Signal> {
    catalog().by_number(number)
}

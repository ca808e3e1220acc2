//! Schema composition: deep merge and structural diff

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::{canonical_bytes, parse_document};
use crate::error::Result;

/// Deep-merge `overlay` into `base`.
///
/// Objects recurse, arrays are replaced wholesale, scalars are last-writer-wins.
pub fn merge_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => merge_values(existing, value),
                    _ => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

/// Merge serialized documents (JSON or YAML) into canonical JSON bytes.
pub fn merge(base: &[u8], overlays: &[&[u8]]) -> Result<Vec<u8>> {
    let mut merged = parse_document(base, "merge base")?;
    for (index, overlay) in overlays.iter().enumerate() {
        let overlay = parse_document(overlay, &format!("merge overlay #{}", index))?;
        merge_values(&mut merged, &overlay);
    }
    Ok(canonical_bytes(&merged))
}

/// One difference between two documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// Dotted object path with `[i]` array indices; empty for the root
    pub path: String,
    pub message: String,
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Recursive delta from `left` to `right`, in key order.
pub fn diff_values(left: &Value, right: &Value) -> Vec<DiffEntry> {
    let mut out = Vec::new();
    diff_into(left, right, String::new(), &mut out);
    out
}

/// [`diff_values`] over serialized documents.
pub fn diff(left: &[u8], right: &[u8]) -> Result<Vec<DiffEntry>> {
    let left = parse_document(left, "diff left")?;
    let right = parse_document(right, "diff right")?;
    Ok(diff_values(&left, &right))
}

fn diff_into(left: &Value, right: &Value, path: String, out: &mut Vec<DiffEntry>) {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => {
            let mut keys: Vec<&String> = l.keys().chain(r.keys().filter(|k| !l.contains_key(*k))).collect();
            keys.sort();
            for key in keys {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                match (l.get(key), r.get(key)) {
                    (Some(a), Some(b)) => diff_into(a, b, child, out),
                    (None, Some(_)) => out.push(entry(child, "added")),
                    (Some(_), None) => out.push(entry(child, "removed")),
                    (None, None) => {}
                }
            }
        }
        (Value::Array(l), Value::Array(r)) => {
            if l.len() != r.len() {
                out.push(entry(path, format!("array length {} -> {}", l.len(), r.len())));
                return;
            }
            for (index, (a, b)) in l.iter().zip(r).enumerate() {
                diff_into(a, b, format!("{}[{}]", path, index), out);
            }
        }
        (a, b) => {
            if canonical_bytes(a) != canonical_bytes(b) {
                out.push(entry(
                    path,
                    format!("changed from {} to {}", render(a), render(b)),
                ));
            }
        }
    }
}

fn entry(path: String, message: impl Into<String>) -> DiffEntry {
    DiffEntry {
        path,
        message: message.into(),
    }
}

fn render(value: &Value) -> String {
    String::from_utf8_lossy(&canonical_bytes(value)).into_owned()
}

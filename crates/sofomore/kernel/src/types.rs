use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A point of the search space.
pub type Point = Vec<f64>;

/// Termination status of a kernel: reason name to the value that triggered
/// it. Empty means the kernel is still running.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StopStatus(BTreeMap<String, f64>);

impl StopStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status with a single reason.
    pub fn single(reason: impl Into<String>, value: f64) -> Self {
        Self::new().with(reason, value)
    }

    pub fn with(mut self, reason: impl Into<String>, value: f64) -> Self {
        self.0.insert(reason.into(), value);
        self
    }

    pub fn insert(&mut self, reason: impl Into<String>, value: f64) {
        self.0.insert(reason.into(), value);
    }

    /// No reason to stop.
    pub fn is_running(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_stopped(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn contains(&self, reason: &str) -> bool {
        self.0.contains_key(reason)
    }

    pub fn get(&self, reason: &str) -> Option<f64> {
        self.0.get(reason).copied()
    }

    pub fn reasons(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for StopStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "running");
        }
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{}", parts.join(", "))
    }
}

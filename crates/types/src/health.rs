// crates/types/src/health.rs
//! Health probe results persisted by the Health & Report Worker.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The severity a chat alert is sent at, mirroring the three levels the
/// Notifier and monitoring components distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Critical,
    Warning,
    #[default]
    Info,
}

impl AlertLevel {
    /// The emoji prefix used in chat alert titles.
    pub fn emoji(self) -> &'static str {
        match self {
            AlertLevel::Critical => "\u{1F6A8}",
            AlertLevel::Warning => "\u{26A0}\u{FE0F}",
            AlertLevel::Info => "\u{2139}\u{FE0F}",
        }
    }
}

/// A snapshot of every adapter's health, as persisted to `health:current`
/// and pushed onto the `health:history` ring buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub timestamp: DateTime<Utc>,
    pub healthy: bool,
    pub components: BTreeMap<String, bool>,
    pub errors: Vec<String>,
}

impl HealthSnapshot {
    pub fn new(components: BTreeMap<String, bool>, errors: Vec<String>, now: DateTime<Utc>) -> Self {
        let healthy = components.values().all(|ok| *ok);
        Self {
            timestamp: now,
            healthy,
            components,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_requires_every_component_ok() {
        let mut components = BTreeMap::new();
        components.insert("database".to_string(), true);
        components.insert("kv".to_string(), false);
        let snapshot = HealthSnapshot::new(components, vec!["kv timed out".into()], Utc::now());
        assert!(!snapshot.healthy);
    }

    #[test]
    fn healthy_when_all_components_ok() {
        let mut components = BTreeMap::new();
        components.insert("database".to_string(), true);
        components.insert("kv".to_string(), true);
        let snapshot = HealthSnapshot::new(components, vec![], Utc::now());
        assert!(snapshot.healthy);
    }
}

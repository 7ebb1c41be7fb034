//! Core types shared across the registry.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Health of a registered agent's backing module.
///
/// `Unknown` is the initial state on registration. Transitions happen only
/// through loader operations: a successful load or validate moves to
/// `Healthy`, a failed one to `Unhealthy`. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Unknown => write!(f, "unknown"),
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Invocation-time default value carried in agent metadata.
///
/// A closed variant set instead of an untyped blob, so arbitrary config bags
/// stay representable without giving up type safety.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ConfigValue>),
    Map(BTreeMap<String, ConfigValue>),
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Str(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

/// Current UTC time as an RFC 3339 string.
///
/// Stored timestamps are strings so the registry file stays human-diffable;
/// RFC 3339 with a fixed zone keeps them lexicographically sortable.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_serializes_lowercase() {
        let json = serde_json::to_string(&HealthStatus::Unhealthy).unwrap();
        assert_eq!(json, "\"unhealthy\"");
        let back: HealthStatus = serde_json::from_str("\"healthy\"").unwrap();
        assert_eq!(back, HealthStatus::Healthy);
    }

    #[test]
    fn config_value_roundtrips_untagged() {
        let mut map = BTreeMap::new();
        map.insert("temperature".to_string(), ConfigValue::Float(0.7));
        map.insert("retries".to_string(), ConfigValue::Int(3));
        map.insert("stream".to_string(), ConfigValue::Bool(true));
        map.insert(
            "stop".to_string(),
            ConfigValue::List(vec![ConfigValue::from("END")]),
        );

        let json = serde_json::to_string(&map).unwrap();
        let back: BTreeMap<String, ConfigValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn timestamps_sort_chronologically() {
        let a = now_timestamp();
        let b = now_timestamp();
        assert!(a <= b);
    }
}

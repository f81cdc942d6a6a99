//! Effective configuration produced by merging the two configuration sources.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The merged key/value configuration read by every downstream stage.
///
/// Produced once per run by merging the deployment profile (`base`) with the
/// defaults document (`overlay`); a key present in the overlay always wins.
/// Apart from the synthetic namespace keys stamped right after derivation,
/// the configuration is never written again.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectiveConfig {
    values: BTreeMap<String, Value>,
}

/// Synthetic keys written back after namespace derivation.
pub const KEY_STAGE: &str = "stage";
pub const KEY_UUID: &str = "uuid";
pub const KEY_PREFIX: &str = "prefix";

impl EffectiveConfig {
    /// Merge two source mappings, field-wise, overlay wins on collision.
    pub fn merge(
        base: BTreeMap<String, Value>,
        overlay: BTreeMap<String, Value>,
    ) -> Self {
        let mut values = base;
        for (key, value) in overlay {
            values.insert(key, value);
        }
        Self { values }
    }

    /// Build a configuration from a single mapping (mainly for tests and
    /// callers that already hold a merged document).
    pub fn from_values(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }

    /// Get a raw value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Get a string value by key.
    ///
    /// Only returns `Some` for JSON string values; numbers and booleans are
    /// not coerced.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Get a boolean value by key.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    /// Get an unsigned integer value by key.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.values.get(key).and_then(Value::as_u64)
    }

    /// Render any scalar value as a string, the form component builders
    /// receive their parameters in.
    pub fn get_display(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    /// Write the derived namespace back into the configuration under the
    /// synthetic keys `stage`, `uuid` and `prefix`.
    ///
    /// This is the one permitted write after the merge; it exists so that
    /// downstream consumers can read the derived values through the same
    /// key/value interface as everything else.
    pub fn stamp_namespace(&mut self, stage: &str, uuid: &str, prefix: &str) {
        self.values
            .insert(KEY_STAGE.to_string(), Value::String(stage.to_string()));
        self.values
            .insert(KEY_UUID.to_string(), Value::String(uuid.to_string()));
        self.values
            .insert(KEY_PREFIX.to_string(), Value::String(prefix.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_merge_overlay_wins() {
        let base = map(&[
            ("stage", json!("dev")),
            ("db_name", json!("forge")),
            ("https_tcp_port", json!(443)),
        ]);
        let overlay = map(&[("stage", json!("prod")), ("use_sso", json!(true))]);

        let merged = EffectiveConfig::merge(base, overlay);

        assert_eq!(merged.get_str("stage"), Some("prod"));
        assert_eq!(merged.get_str("db_name"), Some("forge"));
        assert_eq!(merged.get_u64("https_tcp_port"), Some(443));
        assert_eq!(merged.get_bool("use_sso"), Some(true));
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn test_merge_disjoint_keys() {
        let base = map(&[("a", json!(1))]);
        let overlay = map(&[("b", json!(2))]);

        let merged = EffectiveConfig::merge(base, overlay);
        assert_eq!(merged.get_u64("a"), Some(1));
        assert_eq!(merged.get_u64("b"), Some(2));
    }

    #[test]
    fn test_typed_accessors_do_not_coerce() {
        let merged = EffectiveConfig::from_values(map(&[("port", json!(8443))]));
        assert_eq!(merged.get_str("port"), None);
        assert_eq!(merged.get_u64("port"), Some(8443));
        assert_eq!(merged.get_display("port"), Some("8443".to_string()));
    }

    #[test]
    fn test_stamp_namespace() {
        let mut merged = EffectiveConfig::from_values(map(&[("team", json!("ops"))]));
        merged.stamp_namespace("dev", "4a5b6c", "iot_dev");

        assert_eq!(merged.get_str(KEY_STAGE), Some("dev"));
        assert_eq!(merged.get_str(KEY_UUID), Some("4a5b6c"));
        assert_eq!(merged.get_str(KEY_PREFIX), Some("iot_dev"));
        assert_eq!(merged.get_str("team"), Some("ops"));
    }
}

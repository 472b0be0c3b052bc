//! Validated records and batch reports.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;

/// Key under which [`ValidatedRecord::is_default`] is serialized.
pub const DEFAULT_MARKER: &str = "_is_default";

/// Field values that satisfied every rule of a [`TaxonomySchema`], or a
/// fallback produced in their place.
///
/// [`TaxonomySchema`]: super::TaxonomySchema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRecord {
    #[serde(flatten)]
    fields: Map<String, Value>,
    #[serde(rename = "_is_default", default)]
    is_default: bool,
}

impl ValidatedRecord {
    pub(crate) fn new(fields: Map<String, Value>, is_default: bool) -> Self {
        Self { fields, is_default }
    }

    /// `true` when this record is a fallback rather than model output.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn f64_field(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn i64_field(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Deserialize the fields into a typed view such as
    /// [`PostTriage`](super::PostTriage).
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }
}

/// Outcome counts for one batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidationReport {
    pub total: usize,
    pub valid: usize,
    pub default: usize,
    /// `valid / total * 100`; `0.0` for an empty batch.
    pub success_rate: f64,
}

impl ValidationReport {
    pub fn from_records(records: &[ValidatedRecord]) -> Self {
        let total = records.len();
        let default = records.iter().filter(|r| r.is_default()).count();
        let valid = total - default;
        let success_rate = if total == 0 {
            0.0
        } else {
            valid as f64 / total as f64 * 100.0
        };
        Self {
            total,
            valid,
            default,
            success_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value, is_default: bool) -> ValidatedRecord {
        ValidatedRecord::new(v.as_object().cloned().unwrap(), is_default)
    }

    #[test]
    fn serializes_with_marker() {
        let r = record(json!({"sentiment": "neutral"}), true);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v, json!({"sentiment": "neutral", "_is_default": true}));

        let back: ValidatedRecord = serde_json::from_value(v).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn typed_accessors() {
        let r = record(
            json!({"s": "x", "f": 0.5, "i": 3, "b": true}),
            false,
        );
        assert_eq!(r.str_field("s"), Some("x"));
        assert_eq!(r.f64_field("f"), Some(0.5));
        assert_eq!(r.i64_field("i"), Some(3));
        assert_eq!(r.bool_field("b"), Some(true));
        assert_eq!(r.str_field("missing"), None);
    }

    #[test]
    fn empty_report_has_zero_rate() {
        let report = ValidationReport::from_records(&[]);
        assert_eq!(report.total, 0);
        assert_eq!(report.success_rate, 0.0);
        assert!(!report.success_rate.is_nan());
    }

    #[test]
    fn report_counts() {
        let records = vec![
            record(json!({}), false),
            record(json!({}), true),
            record(json!({}), false),
            record(json!({}), false),
        ];
        let report = ValidationReport::from_records(&records);
        assert_eq!(report.total, 4);
        assert_eq!(report.valid, 3);
        assert_eq!(report.default, 1);
        assert_eq!(report.success_rate, 75.0);
    }
}

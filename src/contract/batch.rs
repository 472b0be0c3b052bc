//! Parse → validate → (record | fallback), for one response or a batch.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use super::parser::{ParseOutcome, parse_structured};
use super::record::{ValidatedRecord, ValidationReport};
use super::schema::TaxonomySchema;
use crate::telemetry;
use crate::{HuginnError, Result};

/// Applies a [`TaxonomySchema`] to raw model output.
///
/// With `allow_defaults` (the default) every failure is absorbed into the
/// schema's fallback record, so a batch always yields one record per input.
/// In strict mode failures propagate as typed errors.
#[derive(Debug, Clone)]
pub struct ResponseContract {
    schema: Arc<TaxonomySchema>,
    allow_defaults: bool,
}

impl ResponseContract {
    pub fn new(schema: impl Into<Arc<TaxonomySchema>>) -> Self {
        Self {
            schema: schema.into(),
            allow_defaults: true,
        }
    }

    /// Contract for [`TaxonomySchema::post_triage`].
    pub fn post_triage() -> Self {
        Self::new(TaxonomySchema::post_triage())
    }

    pub fn allow_defaults(mut self, allow: bool) -> Self {
        self.allow_defaults = allow;
        self
    }

    /// Propagate every failure instead of substituting fallbacks.
    pub fn strict(self) -> Self {
        self.allow_defaults(false)
    }

    pub fn defaults_allowed(&self) -> bool {
        self.allow_defaults
    }

    pub fn schema(&self) -> &TaxonomySchema {
        &self.schema
    }

    /// Parse and validate one raw response, ignoring `allow_defaults`.
    ///
    /// # Errors
    ///
    /// - `Parse` for empty or unrecoverable text.
    /// - `SchemaValidation` for the first violated rule.
    pub fn validate(&self, raw: &str) -> Result<ValidatedRecord> {
        let object = parse_structured(raw).into_result()?;
        self.schema.validate(&object)
    }

    /// Validate an already-decoded object.
    pub fn validate_object(&self, object: &Map<String, Value>) -> Result<ValidatedRecord> {
        self.schema.validate(object)
    }

    /// Parse and validate, falling back to the default record on any failure.
    pub fn validate_or_default(&self, raw: &str) -> ValidatedRecord {
        let (record, reason) = self.evaluate(raw);
        if let Some(reason) = reason {
            metrics::counter!(telemetry::VALIDATION_DEFAULTS_TOTAL, "reason" => reason)
                .increment(1);
        }
        record_outcome(&record);
        record
    }

    /// Apply the contract to one response, honouring `allow_defaults`.
    pub fn apply(&self, raw: &str) -> Result<ValidatedRecord> {
        if self.allow_defaults {
            Ok(self.validate_or_default(raw))
        } else {
            let record = self.validate(raw)?;
            record_outcome(&record);
            Ok(record)
        }
    }

    /// Apply the contract to every response.
    ///
    /// With defaults allowed this never fails and returns exactly one record
    /// per input, in order. In strict mode the first failing item aborts the
    /// batch with [`HuginnError::BatchItem`].
    pub fn process<S: AsRef<str>>(&self, raw_responses: &[S]) -> Result<Vec<ValidatedRecord>> {
        raw_responses
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                self.apply(raw.as_ref())
                    .map_err(|source| HuginnError::BatchItem {
                        index,
                        source: Box::new(source),
                    })
            })
            .collect()
    }

    /// Like [`process`](Self::process) but keeps going, returning one result
    /// per input.
    pub fn process_collect<S: AsRef<str>>(
        &self,
        raw_responses: &[S],
    ) -> Vec<Result<ValidatedRecord>> {
        raw_responses
            .iter()
            .map(|raw| self.apply(raw.as_ref()))
            .collect()
    }

    /// Summarise a batch.
    pub fn report(records: &[ValidatedRecord]) -> ValidationReport {
        ValidationReport::from_records(records)
    }

    /// The record for `raw`, plus the fallback reason when one was used.
    fn evaluate(&self, raw: &str) -> (ValidatedRecord, Option<&'static str>) {
        let object = match parse_structured(raw) {
            ParseOutcome::Parsed(object) => object,
            ParseOutcome::Empty => {
                debug!("empty model output, using fallback record");
                return (self.schema.fallback(), Some("empty"));
            }
            ParseOutcome::Unparseable(reason) => {
                debug!(%reason, "unparseable model output, using fallback record");
                return (self.schema.fallback(), Some("parse"));
            }
        };
        match self.schema.validate(&object) {
            Ok(record) => (record, None),
            Err(e) => {
                debug!(error = %e, "schema violation, using fallback record");
                (self.schema.fallback(), Some("schema"))
            }
        }
    }
}

fn record_outcome(record: &ValidatedRecord) {
    let outcome = if record.is_default() { "default" } else { "valid" };
    metrics::counter!(telemetry::VALIDATION_TOTAL, "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_empty_is_parse_error() {
        let contract = ResponseContract::post_triage().strict();
        assert!(matches!(
            contract.apply("").unwrap_err(),
            HuginnError::Parse(_)
        ));
    }

    #[test]
    fn strict_batch_reports_failing_index() {
        let contract = ResponseContract::post_triage().strict();
        let err = contract.process(&["nope", "also nope"]).unwrap_err();
        match err {
            HuginnError::BatchItem { index, source } => {
                assert_eq!(index, 0);
                assert!(matches!(*source, HuginnError::Parse(_)));
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn lenient_batch_never_fails() {
        let contract = ResponseContract::post_triage();
        let records = contract.process(&["", "garbage", "{}"]).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(ValidatedRecord::is_default));
    }

    #[test]
    fn collect_keeps_per_item_errors() {
        let contract = ResponseContract::post_triage().strict();
        let results = contract.process_collect(&["", "{}"]);
        assert_eq!(results.len(), 2);
        assert!(matches!(results[0], Err(HuginnError::Parse(_))));
        assert!(matches!(
            results[1],
            Err(HuginnError::SchemaValidation { .. })
        ));
    }
}

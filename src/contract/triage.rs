//! The social-media post triage taxonomy.

use serde::{Deserialize, Serialize};

use super::schema::{FieldKind, TaxonomySchema, ValueKind};

pub const SENTIMENTS: [&str; 3] = ["positive", "neutral", "negative"];
pub const CATEGORIES: [&str; 8] = [
    "billing",
    "network",
    "technical",
    "subscription",
    "complaint",
    "compliment",
    "question",
    "other",
];
pub const PRIORITIES: [&str; 4] = ["critical", "high", "medium", "low"];

impl TaxonomySchema {
    /// Schema for classifying customer posts.
    ///
    /// Fallback values: neutral sentiment, zero score, category `other`,
    /// lowest priority, no keywords, not urgent, needs a response, no
    /// resolution estimate.
    pub fn post_triage() -> Self {
        TaxonomySchema::new()
            .field_with_default("sentiment", FieldKind::one_of(SENTIMENTS), "neutral")
            .field_with_default("sentiment_score", FieldKind::float(-1.0, 1.0), 0.0)
            .field_with_default("category", FieldKind::one_of(CATEGORIES), "other")
            .field_with_default("priority", FieldKind::one_of(PRIORITIES), "low")
            .field("keywords", FieldKind::List(ValueKind::String))
            .field_with_default("is_urgent", FieldKind::Boolean, false)
            .field_with_default("needs_response", FieldKind::Boolean, true)
            .field(
                "estimated_resolution_time",
                FieldKind::Nullable(ValueKind::Integer),
            )
    }
}

/// System prompt asking a model to triage one post into
/// [`TaxonomySchema::post_triage`].
pub fn triage_system_prompt(schema: &TaxonomySchema) -> String {
    format!(
        "You are a customer-care analyst. Classify the social media post you are given.\n\
         `estimated_resolution_time` is in minutes.\n\n{}",
        schema.instructions()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Billing,
    Network,
    Technical,
    Subscription,
    Complaint,
    Compliment,
    Question,
    Other,
}

/// Declared highest first, so `Critical < Low` in the derived ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

/// Typed view of a record validated against [`TaxonomySchema::post_triage`].
///
/// Obtain via [`ValidatedRecord::decode`](super::ValidatedRecord::decode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostTriage {
    pub sentiment: Sentiment,
    pub sentiment_score: f64,
    pub category: Category,
    pub priority: Priority,
    pub keywords: Vec<String>,
    pub is_urgent: bool,
    pub needs_response: bool,
    pub estimated_resolution_time: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fallback_matches_neutral_defaults() {
        let record = TaxonomySchema::post_triage().fallback();
        assert!(record.is_default());
        assert_eq!(
            serde_json::to_value(record.fields()).unwrap(),
            json!({
                "sentiment": "neutral",
                "sentiment_score": 0.0,
                "category": "other",
                "priority": "low",
                "keywords": [],
                "is_urgent": false,
                "needs_response": true,
                "estimated_resolution_time": null
            })
        );
    }

    #[test]
    fn fallback_is_schema_conformant() {
        let schema = TaxonomySchema::post_triage();
        let record = schema.fallback();
        assert!(schema.validate(record.fields()).is_ok());
    }

    #[test]
    fn fallback_decodes_into_typed_view() {
        let triage: PostTriage = TaxonomySchema::post_triage().fallback().decode().unwrap();
        assert_eq!(triage.sentiment, Sentiment::Neutral);
        assert_eq!(triage.category, Category::Other);
        assert_eq!(triage.priority, Priority::Low);
        assert!(triage.needs_response);
        assert!(triage.keywords.is_empty());
        assert_eq!(triage.estimated_resolution_time, None);
    }

    #[test]
    fn schema_field_order() {
        let schema = TaxonomySchema::post_triage();
        let names: Vec<&str> = schema
            .fields()
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(
            names,
            [
                "sentiment",
                "sentiment_score",
                "category",
                "priority",
                "keywords",
                "is_urgent",
                "needs_response",
                "estimated_resolution_time"
            ]
        );
    }

    #[test]
    fn priority_orders_by_severity() {
        assert!(Priority::Critical < Priority::Low);
    }

    #[test]
    fn system_prompt_embeds_instructions() {
        let prompt = triage_system_prompt(&TaxonomySchema::post_triage());
        assert!(prompt.contains("\"category\""));
        assert!(prompt.contains("\"billing\""));
    }
}

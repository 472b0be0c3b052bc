//! Huginn - LLM call layer for post classification
//!
//! This crate sends a prompt to a configured LLM provider, retries transient
//! failures with capped exponential backoff, pulls the model's text out of the
//! provider-specific reply and turns it into a record that satisfies a
//! declared taxonomy (or a well-defined fallback record).
//!
//! # Classification Example
//!
//! ```rust,no_run
//! use huginn::{CallOptions, CompletionProvider, LlmClient, ProviderProfile, ResponseContract};
//!
//! #[tokio::main]
//! async fn main() -> huginn::Result<()> {
//!     let client = LlmClient::builder(ProviderProfile::openai(std::env::var("OPENAI_API_KEY").ok()))
//!         .max_retries(3)
//!         .build()?;
//!
//!     let contract = ResponseContract::post_triage();
//!     let options = CallOptions::default()
//!         .system_prompt(huginn::triage_system_prompt(contract.schema()));
//!
//!     let record = client
//!         .classify("The app crashes every time I upload a photo.", &options, &contract)
//!         .await?;
//!
//!     println!("{:?} (default: {})", record.str_field("category"), record.is_default());
//!     Ok(())
//! }
//! ```
//!
//! # Validating Stored Outputs
//!
//! ```rust
//! use huginn::ResponseContract;
//!
//! let contract = ResponseContract::post_triage();
//! let records = contract.process(&["", "not json"]).unwrap();
//! assert!(records.iter().all(|r| r.is_default()));
//!
//! let report = ResponseContract::report(&records);
//! assert_eq!(report.default, 2);
//! ```

pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod providers;
pub mod telemetry;
pub mod traits;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use client::{LlmClient, LlmClientBuilder};
pub use config::Config;
pub use error::{HuginnError, Result};
pub use traits::CompletionProvider;
pub use version::{PKG_VERSION, version_string};

pub use contract::{
    Category, FieldKind, FieldSpec, ParseOutcome, PostTriage, Priority, ResponseContract,
    Sentiment, TaxonomySchema, ValidatedRecord, ValidationReport, parse_structured,
    triage_system_prompt,
};
pub use providers::{
    AuthStyle, CallEnvelope, CallStats, CallStatsSnapshot, ProviderProfile, RequestBuilder,
    RequestShape, ResponsePath, RetryConfig, RetryingTransport, extract_text,
};
pub use types::{CallOptions, Message, Role};

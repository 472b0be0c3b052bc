//! Response contract: turn raw model text into records that satisfy a
//! declared taxonomy, or into a well-defined fallback.

mod batch;
mod parser;
mod record;
mod schema;
mod triage;

pub use batch::ResponseContract;
pub use parser::{ParseOutcome, parse_structured, strip_code_fences};
pub use record::{DEFAULT_MARKER, ValidatedRecord, ValidationReport};
pub use schema::{FieldKind, FieldSpec, NumberKind, TaxonomySchema, ValueKind};
pub use triage::{
    CATEGORIES, Category, PRIORITIES, PostTriage, Priority, SENTIMENTS, Sentiment,
    triage_system_prompt,
};

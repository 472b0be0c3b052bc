//! Public types shared by the transport and its callers.

mod message;
mod options;

pub use message::{Message, Role};
pub use options::{CallOptions, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};

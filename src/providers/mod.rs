//! Provider-agnostic request/response transport.
//!
//! A call flows through [`RequestBuilder`] (prompt → [`CallEnvelope`]),
//! [`RetryingTransport`] (HTTP with timeout, retry and [`CallStats`]) and
//! [`extract_text`] (payload → model text), all parameterised by a
//! [`ProviderProfile`].

pub mod extract;
pub mod profile;
pub mod request;
pub mod retry;
pub mod stats;
pub mod transport;

pub use extract::extract_text;
pub use profile::{AuthStyle, ProviderProfile, RequestShape, ResponsePath};
pub use request::{CallEnvelope, RequestBuilder};
pub use retry::RetryConfig;
pub use stats::{CallStats, CallStatsSnapshot};
pub use transport::RetryingTransport;

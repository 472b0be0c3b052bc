//! Request envelopes.
//!
//! [`RequestBuilder`] turns a prompt plus [`CallOptions`] into a
//! [`CallEnvelope`]: the headers and JSON body for one call, shaped for the
//! target [`ProviderProfile`]. Building is pure; nothing here touches the
//! network.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::profile::{AuthStyle, ProviderProfile, RequestShape};
use crate::types::{CallOptions, Message};
use crate::{HuginnError, Result};

/// A fully-built request, ready for the transport.
///
/// Built fresh per call and owned by that call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallEnvelope {
    /// Path relative to the profile's base URL.
    pub endpoint: String,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl CallEnvelope {
    /// Model named in the body, if any.
    pub fn model(&self) -> Option<&str> {
        self.body.get("model").and_then(Value::as_str)
    }
}

/// OpenAI-style body: system prompt travels as the first message.
#[derive(Serialize)]
struct ChatMessagesBody<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f64,
    max_tokens: u32,
}

/// Anthropic-style body: system prompt is a top-level field.
#[derive(Serialize)]
struct SystemFieldBody<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    temperature: f64,
}

/// Builds [`CallEnvelope`]s for one provider profile.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    profile: &'a ProviderProfile,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(profile: &'a ProviderProfile) -> Self {
        Self { profile }
    }

    /// Build the envelope for `prompt`.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the profile requires an API key and has none.
    /// - `InvalidInput` if temperature is outside `[0, 1]` or `max_tokens` is 0.
    pub fn build(&self, prompt: &str, options: &CallOptions) -> Result<CallEnvelope> {
        validate_options(options)?;

        let headers = self.headers()?;
        let model = options
            .model
            .as_deref()
            .unwrap_or_else(|| self.profile.default_model());
        let system = options
            .system_prompt
            .as_deref()
            .filter(|s| !s.trim().is_empty());

        let body = match self.profile.request_shape() {
            RequestShape::ChatMessages => {
                let mut messages = Vec::with_capacity(2);
                if let Some(system) = system {
                    messages.push(Message::system(system));
                }
                messages.push(Message::user(prompt));
                serde_json::to_value(ChatMessagesBody {
                    model,
                    messages,
                    temperature: options.temperature,
                    max_tokens: options.max_tokens,
                })?
            }
            RequestShape::SystemField => serde_json::to_value(SystemFieldBody {
                model,
                max_tokens: options.max_tokens,
                messages: vec![Message::user(prompt)],
                system,
                temperature: options.temperature,
            })?,
        };

        Ok(CallEnvelope {
            endpoint: self.profile.endpoint().to_string(),
            headers,
            body,
        })
    }

    fn headers(&self) -> Result<BTreeMap<String, String>> {
        let mut headers = BTreeMap::new();

        let auth = self.profile.auth();
        if auth.requires_key() {
            let key = self.profile.api_key().ok_or_else(|| {
                HuginnError::Configuration(format!(
                    "provider '{}' requires an API key but none is configured",
                    self.profile.name()
                ))
            })?;
            match auth {
                AuthStyle::Bearer => {
                    headers.insert("authorization".to_string(), format!("Bearer {key}"));
                }
                AuthStyle::Header { name } => {
                    headers.insert(name.to_ascii_lowercase(), key.to_string());
                }
                AuthStyle::None => {}
            }
        }

        for (name, value) in self.profile.extra_headers() {
            headers.insert(name.to_ascii_lowercase(), value.clone());
        }
        Ok(headers)
    }
}

fn validate_options(options: &CallOptions) -> Result<()> {
    if !(0.0..=1.0).contains(&options.temperature) {
        return Err(HuginnError::InvalidInput(format!(
            "temperature must be within [0, 1], got {}",
            options.temperature
        )));
    }
    if options.max_tokens == 0 {
        return Err(HuginnError::InvalidInput(
            "max_tokens must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

//! Per-call options

use serde::{Deserialize, Serialize};

/// Default sampling temperature. Classification wants deterministic output.
pub const DEFAULT_TEMPERATURE: f64 = 0.0;

/// Default completion budget.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Options for a single completion call (provider-agnostic)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallOptions {
    /// Model override; `None` uses the profile's default model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Sampling temperature in `[0, 1]`.
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            model: None,
            system_prompt: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl CallOptions {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }
}

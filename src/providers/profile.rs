//! Static descriptions of LLM backends.
//!
//! A [`ProviderProfile`] captures everything that differs between providers:
//! where to send the request, how to authenticate, how to shape the body and
//! where the model text lives in the reply. All provider-specific behaviour is
//! selected here, once, at construction time; the request builder, transport
//! and extractor operate on the profile's data without ever branching on the
//! provider's name.

use std::fmt;

use serde::Deserialize;

/// How a provider expects the API key to be presented.
///
/// In TOML: `auth = { type = "bearer" }`, `{ type = "none" }` or
/// `{ type = "header", name = "x-api-key" }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `<name>: <key>` (e.g. `x-api-key`)
    Header { name: String },
    /// No authentication (local/self-hosted providers).
    None,
}

impl AuthStyle {
    /// Whether calls need an API key to be built.
    pub fn requires_key(&self) -> bool {
        !matches!(self, AuthStyle::None)
    }
}

/// Body layout of the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestShape {
    /// OpenAI style: system and user turns are both role-tagged messages.
    ChatMessages,
    /// Anthropic style: user message list plus a top-level `system` field.
    SystemField,
}

/// Where the model's text lives in a decoded response payload.
///
/// In TOML: `"chat_choices"`, `"content_blocks"` or
/// `{ pointer = "/message/content" }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsePath {
    /// `choices[0].message.content`
    ChatChoices,
    /// First `{"type": "text", "text": ...}` block of `content`.
    ContentBlocks,
    /// Arbitrary RFC 6901 JSON pointer, e.g. `/message/content`.
    Pointer(String),
}

/// Static description of one backend.
///
/// Immutable after construction; build one per configured provider and share
/// it by reference or `Arc`.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    name: String,
    base_url: String,
    endpoint: String,
    default_model: String,
    auth: AuthStyle,
    request_shape: RequestShape,
    response_path: ResponsePath,
    api_key: Option<String>,
    extra_headers: Vec<(String, String)>,
}

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

const ANTHROPIC_VERSION: &str = "2023-06-01";

impl ProviderProfile {
    /// Start a profile for an arbitrary backend.
    ///
    /// Defaults to an OpenAI-compatible layout (`/v1/chat/completions`,
    /// bearer auth, `choices[0].message.content`); adjust with the builder
    /// methods below.
    pub fn custom(
        name: impl Into<String>,
        base_url: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            endpoint: "/v1/chat/completions".to_string(),
            default_model: default_model.into(),
            auth: AuthStyle::Bearer,
            request_shape: RequestShape::ChatMessages,
            response_path: ResponsePath::ChatChoices,
            api_key: None,
            extra_headers: Vec::new(),
        }
    }

    /// OpenAI chat completions.
    pub fn openai(api_key: Option<String>) -> Self {
        Self::custom("openai", OPENAI_BASE_URL, "gpt-4o-mini").with_optional_key(api_key)
    }

    /// Anthropic messages API (`x-api-key` + `anthropic-version`).
    pub fn anthropic(api_key: Option<String>) -> Self {
        Self::custom("anthropic", ANTHROPIC_BASE_URL, "claude-3-5-haiku-latest")
            .with_endpoint("/v1/messages")
            .with_auth(AuthStyle::Header {
                name: "x-api-key".to_string(),
            })
            .with_request_shape(RequestShape::SystemField)
            .with_response_path(ResponsePath::ContentBlocks)
            .with_header("anthropic-version", ANTHROPIC_VERSION)
            .with_optional_key(api_key)
    }

    /// OpenRouter, which speaks the OpenAI dialect.
    pub fn openrouter(api_key: Option<String>) -> Self {
        Self::custom("openrouter", OPENROUTER_BASE_URL, "openai/gpt-4o-mini")
            .with_optional_key(api_key)
    }

    /// Local Ollama through its OpenAI-compatible endpoint. No auth.
    pub fn ollama() -> Self {
        Self::custom("ollama", OLLAMA_BASE_URL, "llama3.1").with_auth(AuthStyle::None)
    }

    /// Look up a built-in preset by name.
    ///
    /// Used by the configuration layer; the call path never consults names.
    pub fn preset(name: &str, api_key: Option<String>) -> Option<Self> {
        match name {
            "openai" => Some(Self::openai(api_key)),
            "anthropic" => Some(Self::anthropic(api_key)),
            "openrouter" => Some(Self::openrouter(api_key)),
            "ollama" => Some(Self::ollama().with_optional_key(api_key)),
            _ => None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_auth(mut self, auth: AuthStyle) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_request_shape(mut self, shape: RequestShape) -> Self {
        self.request_shape = shape;
        self
    }

    pub fn with_response_path(mut self, path: ResponsePath) -> Self {
        self.response_path = path;
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Add a static header sent with every request (e.g. a version pin).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    fn with_optional_key(mut self, key: Option<String>) -> Self {
        // Empty env vars count as unset.
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn auth(&self) -> &AuthStyle {
        &self.auth
    }

    pub fn request_shape(&self) -> RequestShape {
        self.request_shape
    }

    pub fn response_path(&self) -> &ResponsePath {
        &self.response_path
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn extra_headers(&self) -> &[(String, String)] {
        &self.extra_headers
    }

    /// Full request URL: `base_url` and `endpoint` joined by exactly one `/`.
    pub fn url(&self) -> String {
        join_url(&self.base_url, &self.endpoint)
    }
}

// Keys never end up in logs.
impl fmt::Debug for ProviderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderProfile")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("endpoint", &self.endpoint)
            .field("default_model", &self.default_model)
            .field("auth", &self.auth)
            .field("request_shape", &self.request_shape)
            .field("response_path", &self.response_path)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("extra_headers", &self.extra_headers)
            .finish()
    }
}

pub(crate) fn join_url(base: &str, endpoint: &str) -> String {
    let base = base.trim_end_matches('/');
    let endpoint = endpoint.trim_start_matches('/');
    if endpoint.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{endpoint}")
    }
}

//! Model endpoint configuration.

use secrecy::{ExposeSecret, SecretString};

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for one OpenAI-compatible model endpoint.
///
/// The key is held behind [`SecretString`] so it never leaks through
/// `Debug` output or logs.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub model: String,
}

impl ModelConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: SecretString::from(api_key.into()),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Read `{PREFIX}_API_KEY`, `{PREFIX}_BASE_URL`, and `{PREFIX}_MODEL`
    /// from the environment. Returns `None` when the key is absent: the
    /// presence of the key is the flag that enables the corresponding
    /// model (the file-patch tool is only registered when the apply
    /// model is configured).
    pub fn from_env(prefix: &str) -> Option<Self> {
        Self::from_vars(
            std::env::var(format!("{prefix}_API_KEY")).ok(),
            std::env::var(format!("{prefix}_BASE_URL")).ok(),
            std::env::var(format!("{prefix}_MODEL")).ok(),
        )
    }

    fn from_vars(
        api_key: Option<String>,
        base_url: Option<String>,
        model: Option<String>,
    ) -> Option<Self> {
        let api_key = api_key.filter(|key| !key.is_empty())?;
        Some(Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: SecretString::from(api_key),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    /// Expose the API key for request signing.
    pub(crate) fn key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

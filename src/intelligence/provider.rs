use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::AiConfig;

use super::gemini::GeminiProvider;

/// Failures talking to a text-generation backend.
#[derive(Debug, Error)]
pub enum IntelligenceError {
    // Retryable
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Provider rate limit exceeded")]
    RateLimited,

    #[error("Provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // Non-retryable
    #[error("No API key configured. Set GEMINI_API_KEY or ai.apiKey in config.json")]
    MissingApiKey,

    #[error("Provider rejected the API key")]
    Unauthorized,

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

impl IntelligenceError {
    pub fn is_retryable(&self) -> bool {
        match self {
            IntelligenceError::Network(_)
            | IntelligenceError::Timeout(_)
            | IntelligenceError::RateLimited => true,
            IntelligenceError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// One generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    /// When set, ask for a JSON reply matching this schema.
    pub response_schema: Option<serde_json::Value>,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: None,
        }
    }

    pub fn json(prompt: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: Some(schema),
        }
    }
}

#[async_trait]
pub trait IntelligenceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Raw reply text. May be empty.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, IntelligenceError>;
}

/// Stand-in when no API key is configured. Every call fails, so the
/// assistant always answers with its fallbacks.
pub struct DisabledProvider;

#[async_trait]
impl IntelligenceProvider for DisabledProvider {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<String, IntelligenceError> {
        Err(IntelligenceError::MissingApiKey)
    }
}

/// Gemini when an API key is configured, otherwise `DisabledProvider`.
pub fn provider_from_config(ai: &AiConfig) -> Arc<dyn IntelligenceProvider> {
    match GeminiProvider::from_config(ai) {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            log::warn!("Text generation disabled: {}", e);
            Arc::new(DisabledProvider)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(IntelligenceError::Timeout(20).is_retryable());
        assert!(IntelligenceError::RateLimited.is_retryable());
        assert!(IntelligenceError::Http {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!IntelligenceError::Http {
            status: 400,
            body: String::new()
        }
        .is_retryable());
        assert!(!IntelligenceError::MissingApiKey.is_retryable());
    }

    #[test]
    fn test_provider_without_key_is_disabled() {
        let provider = provider_from_config(&AiConfig::default());
        assert_eq!(provider.name(), "disabled");
    }

    #[tokio::test]
    async fn test_disabled_provider_always_fails() {
        let err = DisabledProvider
            .generate(&GenerationRequest::text("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, IntelligenceError::MissingApiKey));
    }
}

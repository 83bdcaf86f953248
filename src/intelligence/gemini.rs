//! Gemini `generateContent` over HTTPS.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::provider::{GenerationRequest, IntelligenceError, IntelligenceProvider};
use crate::types::AiConfig;

pub struct GeminiProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    timeout_secs: u64,
}

impl GeminiProvider {
    pub fn from_config(ai: &AiConfig) -> Result<Self, IntelligenceError> {
        let api_key = ai
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(IntelligenceError::MissingApiKey)?
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(ai.timeout_secs))
            .build()
            .map_err(|e| IntelligenceError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: ai.endpoint.trim_end_matches('/').to_string(),
            model: ai.model.clone(),
            api_key,
            timeout_secs: ai.timeout_secs,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

fn request_body(request: &GenerationRequest) -> Value {
    let mut body = json!({
        "contents": [
            {
                "parts": [
                    { "text": request.prompt }
                ]
            }
        ]
    });
    if let Some(schema) = &request.response_schema {
        body["generationConfig"] = json!({
            "responseMimeType": "application/json",
            "responseSchema": schema,
        });
    }
    body
}

/// Concatenated text of the first candidate's parts. `None` when the
/// response has no candidate content at all.
fn extract_text(response: &Value) -> Option<String> {
    let parts = response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    Some(
        parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<String>(),
    )
}

#[async_trait]
impl IntelligenceProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, IntelligenceError> {
        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IntelligenceError::Timeout(self.timeout_secs)
                } else {
                    IntelligenceError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return match status.as_u16() {
                401 | 403 => Err(IntelligenceError::Unauthorized),
                429 => Err(IntelligenceError::RateLimited),
                code => Err(IntelligenceError::Http {
                    status: code,
                    body: response.text().await.unwrap_or_default(),
                }),
            };
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| IntelligenceError::MalformedResponse(e.to_string()))?;

        // A blocked or empty candidate is an empty reply, not an error.
        Ok(extract_text(&body).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_key() {
        assert!(matches!(
            GeminiProvider::from_config(&AiConfig::default()),
            Err(IntelligenceError::MissingApiKey)
        ));

        let ai = AiConfig {
            api_key: Some("k".into()),
            endpoint: "https://example.test/v1beta/".into(),
            ..Default::default()
        };
        let provider = GeminiProvider::from_config(&ai).expect("provider");
        assert_eq!(
            provider.url(),
            "https://example.test/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[test]
    fn test_request_body_with_schema() {
        let plain = request_body(&GenerationRequest::text("hi"));
        assert_eq!(plain["contents"][0]["parts"][0]["text"], "hi");
        assert!(plain.get("generationConfig").is_none());

        let structured = request_body(&GenerationRequest::json(
            "classify",
            json!({ "type": "OBJECT" }),
        ));
        assert_eq!(
            structured["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(structured["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = json!({
            "candidates": [
                { "content": { "parts": [ { "text": "Call " }, { "text": "Anand today." } ] } }
            ]
        });
        assert_eq!(extract_text(&body).as_deref(), Some("Call Anand today."));
        assert_eq!(extract_text(&json!({ "candidates": [] })), None);
    }
}

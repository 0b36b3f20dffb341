use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::config::AiConfig;

use super::AiError;

/// Thin chat-completions client. One request, one response; retries are the
/// caller's decision.
pub struct OpenAiClient {
    client: Client,
    api_base: String,
    api_key: Option<SecretString>,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &AiConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn chat_completion(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AiError> {
        let api_key = self.api_key.as_ref().ok_or(AiError::Disabled)?;

        let url = format!("{}/chat/completions", self.api_base);
        debug!(model = %self.model, "requesting chat completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose_secret())
            .json(&json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": system_prompt },
                    { "role": "user", "content": user_prompt },
                ],
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response.json().await?;
        extract_content(&body)
    }
}

fn extract_content(body: &serde_json::Value) -> Result<String, AiError> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            AiError::MalformedResponse("no choices[0].message.content in response".to_string())
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extract_content_reads_first_choice() {
        let body = json!({
            "choices": [
                { "message": { "role": "assistant", "content": "hello" } }
            ]
        });
        assert_eq!(extract_content(&body).unwrap(), "hello");
    }

    #[test]
    fn extract_content_rejects_empty_choices() {
        let body = json!({ "choices": [] });
        assert!(matches!(
            extract_content(&body),
            Err(AiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn client_without_key_is_disabled() {
        let client = OpenAiClient::new(&AiConfig::default());
        assert!(!client.is_enabled());
    }
}

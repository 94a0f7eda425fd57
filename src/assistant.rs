use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error};

use crate::config::AssistantConfig;

/// Fixed reply used whenever the assistant cannot produce one. Callers can
/// rely on always getting text back.
pub const ASSISTANT_UNAVAILABLE: &str = "assistant is currently unavailable";

#[async_trait]
pub trait Assistant: Send + Sync {
    /// Answers a prompt given a snapshot-derived context. Degrades to the
    /// fixed placeholder on any failure; never errors.
    async fn respond(&self, prompt: &str, context: &str) -> String;
}

/// Talks to an OpenAI-compatible chat completion endpoint.
pub struct HttpAssistant {
    client: reqwest::Client,
    config: AssistantConfig,
}

impl HttpAssistant {
    pub fn new(config: AssistantConfig) -> Self {
        HttpAssistant {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn request_completion(
        &self,
        endpoint: &str,
        prompt: &str,
        context: &str,
    ) -> anyhow::Result<String> {
        let mut request = self.client.post(endpoint).json(&json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": context },
                { "role": "user", "content": prompt },
            ],
        }));
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request.send().await?.error_for_status()?;
        let body: serde_json::Value = response.json().await?;
        extract_reply(&body).ok_or_else(|| anyhow::anyhow!("completion response had no content"))
    }
}

fn extract_reply(body: &serde_json::Value) -> Option<String> {
    body.pointer("/choices/0/message/content")
        .and_then(|content| content.as_str())
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

#[async_trait]
impl Assistant for HttpAssistant {
    async fn respond(&self, prompt: &str, context: &str) -> String {
        let Some(endpoint) = &self.config.endpoint else {
            debug!("assistant endpoint not configured");
            return ASSISTANT_UNAVAILABLE.to_string();
        };
        match self.request_completion(endpoint, prompt, context).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("assistant request failed: {:?}", e);
                ASSISTANT_UNAVAILABLE.to_string()
            }
        }
    }
}

use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{chat_messages, LlmProvider, Message};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Any OpenAI-compatible chat-completions endpoint.
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }

    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[Message],
        json_mode: bool,
    ) -> anyhow::Result<String> {
        let mut body = json!({
            "model": self.model,
            "messages": chat_messages(system_prompt, messages),
            "temperature": if json_mode { 0.2 } else { 0.35 },
        });
        if json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to call chat completions API")?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse chat completions response")?;

        if !status.is_success() {
            anyhow::bail!("chat completions API error ({}): {}", status, data);
        }

        data["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("missing content in chat completions response"))
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        self.complete(system_prompt, messages, false).await
    }

    async fn chat_json(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        self.complete(system_prompt, messages, true).await
    }
}

use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{chat_messages, LlmProvider, Message};

pub struct OllamaProvider {
    url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(url: String, model: String) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            model,
            client: reqwest::Client::new(),
        }
    }

    async fn send(
        &self,
        system_prompt: &str,
        messages: &[Message],
        json_mode: bool,
    ) -> anyhow::Result<String> {
        let mut body = json!({
            "model": self.model,
            "messages": chat_messages(system_prompt, messages),
            "stream": false,
        });
        if json_mode {
            body["format"] = json!("json");
        }

        let resp = self
            .client
            .post(format!("{}/api/chat", self.url))
            .json(&body)
            .send()
            .await
            .context("failed to call Ollama API")?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse Ollama response")?;

        if !status.is_success() {
            anyhow::bail!("Ollama API error ({}): {}", status, data);
        }

        data["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing content in Ollama response"))
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        self.send(system_prompt, messages, false).await
    }

    async fn chat_json(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        self.send(system_prompt, messages, true).await
    }
}

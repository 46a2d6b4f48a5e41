pub mod ollama;
pub mod openai;
pub mod semantic;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String>;

    /// Same as [`LlmProvider::chat`], asking the backend for a JSON object when it supports that.
    async fn chat_json(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        self.chat(system_prompt, messages).await
    }
}

fn chat_messages(system_prompt: &str, messages: &[Message]) -> Vec<serde_json::Value> {
    let mut out = vec![serde_json::json!({
        "role": "system",
        "content": system_prompt,
    })];
    for msg in messages {
        out.push(serde_json::json!({
            "role": msg.role,
            "content": msg.content,
        }));
    }
    out
}

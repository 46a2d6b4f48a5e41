pub mod whatsapp;

use async_trait::async_trait;

use crate::models::OutboundMessage;

#[async_trait]
pub trait MessagingProvider: Send + Sync {
    async fn send_message(&self, to: &str, message: &OutboundMessage) -> anyhow::Result<()>;
}

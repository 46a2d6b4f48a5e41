use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;

use crate::models::BookingRecord;

const SINK_TIMEOUT: Duration = Duration::from_secs(5);

/// Downstream system of record for confirmed bookings.
#[async_trait]
pub trait BookingSink: Send + Sync {
    async fn deliver(&self, record: &BookingRecord) -> anyhow::Result<()>;
}

/// POSTs each record as JSON with a shared-secret `x-api-key` header.
pub struct HttpBookingSink {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpBookingSink {
    pub fn new(url: String, api_key: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SINK_TIMEOUT)
            .build()
            .context("failed to build booking sink client")?;
        Ok(Self {
            url,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl BookingSink for HttpBookingSink {
    async fn deliver(&self, record: &BookingRecord) -> anyhow::Result<()> {
        let mut request = self.client.post(&self.url).json(record);
        if !self.api_key.is_empty() {
            request = request.header("x-api-key", &self.api_key);
        }

        request
            .send()
            .await
            .context("failed to reach booking sink")?
            .error_for_status()
            .context("booking sink returned error")?;

        tracing::info!(booking_id = %record.booking_id, "booking delivered to sink");
        Ok(())
    }
}

/// Used when no sink URL is configured.
pub struct LogBookingSink;

#[async_trait]
impl BookingSink for LogBookingSink {
    async fn deliver(&self, record: &BookingRecord) -> anyhow::Result<()> {
        let json = serde_json::to_string(record)?;
        tracing::info!(booking_id = %record.booking_id, sender = %record.sender, record = %json, "booking confirmed");
        Ok(())
    }
}

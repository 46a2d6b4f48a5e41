//! WhatsApp Cloud API: outbound rendering and inbound webhook parsing.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::MessagingProvider;
use crate::models::{ChoiceRendering, EventKind, InboundEvent, MediaKind, OutboundMessage};

const LIST_BUTTON_LABEL: &str = "Choose";

pub struct WhatsAppCloudProvider {
    token: String,
    messages_url: String,
    client: reqwest::Client,
}

impl WhatsAppCloudProvider {
    pub fn new(token: String, phone_number_id: &str, api_version: &str) -> Self {
        Self {
            token,
            messages_url: format!(
                "https://graph.facebook.com/{api_version}/{phone_number_id}/messages"
            ),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MessagingProvider for WhatsAppCloudProvider {
    async fn send_message(&self, to: &str, message: &OutboundMessage) -> anyhow::Result<()> {
        let payload = render_payload(to, message);

        let resp = self
            .client
            .post(&self.messages_url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .context("failed to call WhatsApp Cloud API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("WhatsApp Cloud API error ({}): {}", status, body);
        }

        tracing::debug!(to = %to, kind = payload["type"].as_str().unwrap_or(""), "message sent");
        Ok(())
    }
}

/// Builds the Graph API `messages` body. Choices become reply buttons for up to
/// three options and a single-section list beyond that.
pub fn render_payload(to: &str, message: &OutboundMessage) -> Value {
    let interactive = match message {
        OutboundMessage::Text { body } => {
            return json!({
                "messaging_product": "whatsapp",
                "to": to,
                "type": "text",
                "text": { "body": body },
            });
        }
        OutboundMessage::Choice {
            title,
            body,
            options,
        } => match message.rendering() {
            Some(ChoiceRendering::Buttons) => json!({
                "type": "button",
                "body": { "text": body },
                "action": {
                    "buttons": options
                        .iter()
                        .map(|o| json!({ "type": "reply", "reply": { "id": o.id, "title": o.title } }))
                        .collect::<Vec<_>>(),
                },
            }),
            _ => {
                let section_title = if title.is_empty() { "Options" } else { title.as_str() };
                let mut list = json!({
                    "type": "list",
                    "body": { "text": body },
                    "action": {
                        "button": LIST_BUTTON_LABEL,
                        "sections": [{
                            "title": section_title,
                            "rows": options
                                .iter()
                                .map(|o| json!({ "id": o.id, "title": o.title, "description": "" }))
                                .collect::<Vec<_>>(),
                        }],
                    },
                });
                if !title.is_empty() {
                    list["header"] = json!({ "type": "text", "text": title });
                }
                list
            }
        },
    };

    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "interactive",
        "interactive": interactive,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WebhookPayload {
    entry: Vec<Entry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Entry {
    changes: Vec<Change>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Change {
    value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChangeValue {
    contacts: Vec<Contact>,
    messages: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Contact {
    wa_id: Option<String>,
    profile: Option<Profile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Profile {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaMessage {
    id: Option<String>,
    from: Option<String>,
    text: Option<WaText>,
    interactive: Option<WaInteractive>,
    button: Option<WaButton>,
    location: Option<WaLocation>,
    image: Option<WaMedia>,
    document: Option<WaMedia>,
}

#[derive(Debug, Deserialize)]
struct WaText {
    body: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaInteractive {
    button_reply: Option<WaReply>,
    list_reply: Option<WaReply>,
}

#[derive(Debug, Deserialize)]
struct WaReply {
    id: String,
    #[serde(default)]
    title: Option<String>,
}

/// Quick-reply buttons on template messages.
#[derive(Debug, Deserialize)]
struct WaButton {
    #[serde(default)]
    payload: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaLocation {
    latitude: Option<f64>,
    longitude: Option<f64>,
    name: Option<String>,
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaMedia {
    id: String,
}

/// Extracts every supported message from a webhook body, in delivery order.
/// Status callbacks and unsupported message types yield nothing.
pub fn parse_webhook(body: &Value) -> Vec<InboundEvent> {
    let payload: WebhookPayload = match serde_json::from_value(body.clone()) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "webhook body has unexpected shape");
            return Vec::new();
        }
    };

    let mut events = Vec::new();
    for change in payload.entry.into_iter().flat_map(|e| e.changes) {
        let contacts = change.value.contacts;
        for raw in change.value.messages {
            match parse_message(raw, &contacts) {
                Some(event) => events.push(event),
                None => tracing::debug!("skipping unsupported webhook message"),
            }
        }
    }
    events
}

fn parse_message(raw: Value, contacts: &[Contact]) -> Option<InboundEvent> {
    let msg: WaMessage = match serde_json::from_value(raw) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(error = %e, "malformed webhook message");
            return None;
        }
    };
    let (Some(id), Some(sender)) = (msg.id, msg.from) else {
        tracing::warn!("webhook message missing id or sender");
        return None;
    };

    let display_name = contacts
        .iter()
        .find(|c| c.wa_id.as_deref() == Some(sender.as_str()))
        .or_else(|| contacts.first())
        .and_then(|c| c.profile.as_ref())
        .and_then(|p| p.name.clone());

    let kind = if let Some(text) = msg.text {
        EventKind::Text { body: text.body }
    } else if let Some(interactive) = msg.interactive {
        let reply = interactive.button_reply.or(interactive.list_reply)?;
        EventKind::Selection {
            id: reply.id,
            title: reply.title,
        }
    } else if let Some(button) = msg.button {
        EventKind::Selection {
            id: button.payload.clone().or_else(|| button.text.clone())?,
            title: button.text,
        }
    } else if let Some(location) = msg.location {
        EventKind::Location {
            latitude: location.latitude,
            longitude: location.longitude,
            name: location.name,
            address: location.address,
        }
    } else if let Some(image) = msg.image {
        EventKind::Media {
            media: MediaKind::Image,
            reference: image.id,
        }
    } else if let Some(document) = msg.document {
        EventKind::Media {
            media: MediaKind::Document,
            reference: document.id,
        }
    } else {
        return None;
    };

    Some(InboundEvent {
        id,
        sender,
        display_name,
        kind,
    })
}

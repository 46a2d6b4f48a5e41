use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{EventKind, InboundEvent, OutboundMessage};
use crate::state::AppState;

/// A simulated inbound event, for driving the assistant without the WhatsApp channel.
#[derive(Deserialize)]
pub struct DevMessage {
    pub from_phone: String,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Serialize)]
pub struct DevResponse {
    pub messages: Vec<OutboundMessage>,
}

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DevMessage>,
) -> Result<Json<DevResponse>, AppError> {
    let sender = payload.from_phone.trim().to_string();
    if sender.is_empty() {
        return Err(AppError::BadRequest("from_phone is required".to_string()));
    }

    let event = InboundEvent {
        id: payload
            .event_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        sender,
        display_name: payload.display_name,
        kind: payload.kind,
    };

    let messages = state.assistant.handle_event(&event).await;
    Ok(Json(DevResponse { messages }))
}

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::errors::AppError;
use crate::services::messaging::whatsapp;
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "x-hub-signature";

/// Subscription handshake: echoes `hub.challenge` when the verify token matches.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<String, AppError> {
    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token").map(String::as_str);

    match (mode, token, params.get("hub.challenge")) {
        (Some("subscribe"), Some(token), Some(challenge))
            if !state.config.verify_token.is_empty() && token == state.config.verify_token =>
        {
            tracing::info!("webhook verified");
            Ok(challenge.clone())
        }
        _ => {
            tracing::warn!("webhook verification failed");
            Err(AppError::Forbidden("verification failed".to_string()))
        }
    }
}

/// Computes `sha1=<hex>` over the raw body and compares it to the header value.
fn validate_signature(app_secret: &str, signature: &str, body: &[u8]) -> bool {
    let Some(received) = signature.strip_prefix("sha1=") else {
        return false;
    };

    let mut mac = match Hmac::<Sha1>::new_from_slice(app_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);
    let expected: String = mac
        .finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();

    expected.eq_ignore_ascii_case(received)
}

pub async fn receive(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    // Signature check is skipped when no app secret is configured (dev mode)
    if !state.config.app_secret.is_empty() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if signature.is_empty() {
            tracing::warn!("missing X-Hub-Signature header");
            return Err(AppError::Forbidden("missing signature".to_string()));
        }
        if !validate_signature(&state.config.app_secret, signature, &body) {
            tracing::warn!("invalid webhook signature");
            return Err(AppError::Forbidden("invalid signature".to_string()));
        }
    }

    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid JSON: {e}")))?;

    let events = whatsapp::parse_webhook(&payload);
    if events.is_empty() {
        tracing::debug!("webhook carried no user messages");
    }

    // Acknowledge now; replies go out from the background task
    state.assistant.dispatch(events);

    Ok(StatusCode::OK.into_response())
}

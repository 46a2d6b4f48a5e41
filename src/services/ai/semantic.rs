use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use serde::de::DeserializeOwned;

use crate::models::intent::{RawEmotion, RawExtraction};
use crate::models::{Emotion, EmotionReading, SemanticExtraction, Sentiment, Session};
use crate::services::ai::{LlmProvider, Message};

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("extractor transport failed: {0}")]
    Transport(#[from] anyhow::Error),

    #[error("extractor timed out")]
    Timeout,

    #[error("malformed extractor response: {0}")]
    Malformed(String),
}

/// Remote understanding of a user utterance.
#[async_trait]
pub trait SemanticExtractor: Send + Sync {
    /// Sparse entity updates plus intent, given everything already known.
    async fn extract(
        &self,
        utterance: &str,
        session: &Session,
    ) -> Result<SemanticExtraction, ExtractionError>;

    async fn classify_emotion(&self, utterance: &str) -> Result<EmotionReading, ExtractionError>;

    /// A short free-form reply, used when extraction is unavailable.
    async fn converse(&self, utterance: &str) -> Result<String, ExtractionError>;
}

const PERSONA: &str = "You are Warmy, a warm and friendly healthcare assistant on WhatsApp.";

const EXTRACTION_PROMPT: &str = r#"You are Warmy, a helpful healthcare assistant on WhatsApp.

Extract appointment details from the user's latest message: date, time, category, sub_category, location, name, age.

Rules:
- Known info is given below. Existing values MUST be preserved; only fill missing fields.
- Interpret relative phrases (today, tomorrow, next <day>) against today's date.
- Map times of day: morning=09:00, afternoon=15:00, evening=18:00, night=20:00.
- Categories: "care at home", "medicine delivery", "lab test".
- Map "home nurse", "nurse at home" to category "care at home" and sub_category "nurse visit".
- Map dental phrases ("dentist", "dental", "toothache", "teeth cleaning") to "care at home" / "nurse visit".
- If category is known, only use a sub_category from the allowed list; otherwise leave it null.
- Normalize date as YYYY-MM-DD and time as HH:MM.

Return ONLY valid JSON (no markdown, no explanation) with this exact structure:
{
  "intent": "appointment_request|general_query|greeting|start_over|unknown",
  "sentiment": "positive|neutral|negative",
  "entities": {"name": null, "age": null, "date": null, "time": null, "category": null, "sub_category": null, "location": null},
  "response": "a short friendly reply"
}
Only include newly found values in entities; use null for everything else.
"#;

const EMOTION_PROMPT: &str = r#"You are a short-label classifier.
Classify the emotional tone of the user's message in one word (happy, neutral, sad, angry, urgent)
and give a sentiment label (positive, neutral, negative).
Return JSON only like: {"emotion": "...", "sentiment": "..."}"#;

/// Semantic extractor backed by any [`LlmProvider`].
pub struct LlmExtractor {
    llm: Arc<dyn LlmProvider>,
}

impl LlmExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

fn extraction_context(session: &Session) -> String {
    let known = serde_json::to_string_pretty(session).unwrap_or_else(|_| "{}".to_string());
    let mut context = format!(
        "Today is {}.\n\nKnown info:\n{known}",
        Local::now().date_naive().format("%Y-%m-%d (%A)")
    );
    if let Some(category) = session.category {
        let allowed: Vec<&str> = category.sub_categories().iter().map(|s| s.label()).collect();
        context.push_str(&format!(
            "\n\nAllowed subcategories for '{}': {}. If you extract sub_category, use one of them.",
            category.label(),
            allowed.join(", ")
        ));
    }
    context
}

#[async_trait]
impl SemanticExtractor for LlmExtractor {
    async fn extract(
        &self,
        utterance: &str,
        session: &Session,
    ) -> Result<SemanticExtraction, ExtractionError> {
        let system = format!("{EXTRACTION_PROMPT}\n{}", extraction_context(session));
        let response = self.llm.chat_json(&system, &[Message::user(utterance)]).await?;
        let raw: RawExtraction = parse_json_reply(&response)?;
        Ok(raw.into())
    }

    async fn classify_emotion(&self, utterance: &str) -> Result<EmotionReading, ExtractionError> {
        let response = self
            .llm
            .chat_json(EMOTION_PROMPT, &[Message::user(format!("Message: \"{utterance}\""))])
            .await?;
        match parse_json_reply::<RawEmotion>(&response) {
            Ok(raw) => Ok(raw.into()),
            Err(e) => {
                tracing::debug!(error = %e, "emotion reply not JSON, using keyword reading");
                Ok(keyword_emotion(&response))
            }
        }
    }

    async fn converse(&self, utterance: &str) -> Result<String, ExtractionError> {
        let prompt = format!(
            "User said: \"{utterance}\"\nAnswer in 1-2 short sentences, empathetically and clearly. \
             If it's a booking request, ask for the missing info. Keep tone human, use emojis sparingly."
        );
        let reply = self.llm.chat(PERSONA, &[Message::user(prompt)]).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(ExtractionError::Malformed("empty reply".to_string()));
        }
        Ok(reply.to_string())
    }
}

fn keyword_emotion(text: &str) -> EmotionReading {
    let lower = text.to_lowercase();
    if ["urgent", "emergency", "asap"].iter().any(|k| lower.contains(k)) {
        EmotionReading {
            emotion: Emotion::Urgent,
            sentiment: Sentiment::Negative,
        }
    } else {
        EmotionReading::default()
    }
}

/// Reads a JSON object from a model reply: raw, markdown-fenced, or the outermost `{...}` slice.
pub(crate) fn parse_json_reply<T: DeserializeOwned>(response: &str) -> Result<T, ExtractionError> {
    // Try direct parse first
    if let Ok(value) = serde_json::from_str::<T>(response) {
        return Ok(value);
    }

    // Strip markdown code fences
    let cleaned = response
        .trim()
        .strip_prefix("```json")
        .or_else(|| response.trim().strip_prefix("```"))
        .unwrap_or(response.trim());
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    if let Ok(value) = serde_json::from_str::<T>(cleaned) {
        return Ok(value);
    }

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<T>(&cleaned[start..=end]) {
                return Ok(value);
            }
        }
    }

    tracing::warn!("failed to parse extractor reply as JSON");
    Err(ExtractionError::Malformed(response.chars().take(200).collect()))
}

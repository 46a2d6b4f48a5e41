use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    AppointmentRequest,
    GeneralQuery,
    Greeting,
    StartOver,
    Unknown,
}

impl Intent {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "appointment_request" | "book" | "booking" => Intent::AppointmentRequest,
            "general_query" | "general_question" | "question" => Intent::GeneralQuery,
            "greeting" => Intent::Greeting,
            "start_over" | "restart" => Intent::StartOver,
            _ => Intent::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Happy,
    #[default]
    Neutral,
    Sad,
    Angry,
    Urgent,
}

impl Emotion {
    /// Unknown labels read as neutral.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "happy" => Emotion::Happy,
            "sad" => Emotion::Sad,
            "angry" => Emotion::Angry,
            "urgent" => Emotion::Urgent,
            _ => Emotion::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmotionReading {
    pub emotion: Emotion,
    pub sentiment: Sentiment,
}

/// Sparse slot values proposed by an extractor, still in raw textual form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SlotUpdate {
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub age: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub time: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub sub_category: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub location: Option<String>,
}

impl SlotUpdate {
    pub fn is_empty(&self) -> bool {
        *self == SlotUpdate::default()
    }
}

/// Structured result of one semantic extraction call.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticExtraction {
    pub intent: Intent,
    pub sentiment: Sentiment,
    pub updates: SlotUpdate,
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawExtraction {
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub entities: Option<SlotUpdate>,
    #[serde(default)]
    pub response: Option<String>,
}

impl From<RawExtraction> for SemanticExtraction {
    fn from(raw: RawExtraction) -> Self {
        Self {
            intent: raw.intent.as_deref().map(Intent::parse).unwrap_or(Intent::Unknown),
            sentiment: raw.sentiment.as_deref().map(Sentiment::parse).unwrap_or_default(),
            updates: raw.entities.unwrap_or_default(),
            response: raw.response.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEmotion {
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
}

impl From<RawEmotion> for EmotionReading {
    fn from(raw: RawEmotion) -> Self {
        Self {
            emotion: raw.emotion.as_deref().map(Emotion::parse).unwrap_or_default(),
            sentiment: raw.sentiment.as_deref().map(Sentiment::parse).unwrap_or_default(),
        }
    }
}

/// Accepts strings, numbers or null; blank strings and the literal "null" become `None`.
fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

use std::sync::Arc;

use rand::Rng;

use crate::models::Emotion;

/// Chooses one of `len` equivalent phrasings.
pub trait PhraseSelector: Send + Sync {
    fn pick(&self, len: usize) -> usize;
}

pub struct RandomSelector;

impl PhraseSelector for RandomSelector {
    fn pick(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always picks the same variant (wrapped into range). Used by tests.
pub struct FixedSelector(pub usize);

impl PhraseSelector for FixedSelector {
    fn pick(&self, len: usize) -> usize {
        if len == 0 {
            0
        } else {
            self.0 % len
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrase {
    Greeting,
    AckLocation,
    ConfirmSummary,
    Confirmed,
    Cancelled,
    Fallback,
    FriendlyAck,
    Empathetic,
}

impl Phrase {
    fn variants(&self) -> &'static [&'static str] {
        match self {
            Phrase::Greeting => &[
                "Hey {name}! 👋 How can I help you today?",
                "Hi {name}! 👋 Warmy here, how can I assist?",
                "Hello {name}! I'm here for you. What would you like to do today?",
            ],
            Phrase::AckLocation => &[
                "Thanks, got your address: {location}. I'll assign the nearest staff.",
                "Perfect, I've noted {location}. I'll find someone nearby for you.",
                "Thanks! Location saved: {location}. We'll route the nearest staff.",
            ],
            Phrase::ConfirmSummary => &[
                "✅ Here's your appointment summary:\n{summary}\nWould you like me to confirm this now? (Yes / No)",
                "Looks good, here's what I have:\n{summary}\nShall I lock this in for you?",
            ],
            Phrase::Confirmed => &[
                "✅ All set, your appointment is confirmed. If you need anything else, just ask!",
                "Done! ✅ Appointment confirmed. Anything more I can help with?",
            ],
            Phrase::Cancelled => &[
                "Okay, I've cancelled that. Would you like to book something else?",
                "No worries, it's cancelled. Want to start a new booking?",
            ],
            Phrase::Fallback => &[
                "I didn't quite get that. Could you say it another way?",
                "Hmm, I might've missed that. Can you rephrase it for me?",
            ],
            Phrase::FriendlyAck => &["Got it: {summary}.", "Perfect: {summary}.", "Thanks, noted: {summary}."],
            Phrase::Empathetic => &[
                "I'm sorry you're dealing with that. I'll help however I can.",
                "That sounds tough. I'll do my best to help.",
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PhraseParams<'a> {
    pub name: Option<&'a str>,
    pub location: Option<&'a str>,
    pub summary: Option<&'a str>,
}

fn emotion_openers(emotion: Emotion) -> &'static [&'static str] {
    match emotion {
        Emotion::Happy => &["🙂", "😊"],
        Emotion::Neutral => &[],
        Emotion::Sad => &["I'm sorry you're going through that.", "I'm here to help."],
        Emotion::Angry => &["I hear you.", "I'll fix this together with you."],
        Emotion::Urgent => &["I've got you.", "Let's sort this quickly."],
    }
}

/// Picks user-facing phrasings. Stateless apart from the injected selector.
#[derive(Clone)]
pub struct ResponseComposer {
    selector: Arc<dyn PhraseSelector>,
}

impl Default for ResponseComposer {
    fn default() -> Self {
        Self::new(Arc::new(RandomSelector))
    }
}

impl ResponseComposer {
    pub fn new(selector: Arc<dyn PhraseSelector>) -> Self {
        Self { selector }
    }

    pub fn compose(&self, phrase: Phrase, params: &PhraseParams<'_>) -> String {
        let variants = phrase.variants();
        let template = variants
            .get(self.selector.pick(variants.len()))
            .or_else(|| variants.first())
            .copied()
            .unwrap_or_default();

        let name = params
            .name
            .and_then(|n| n.split_whitespace().next())
            .unwrap_or("there");

        template
            .replace("{name}", name)
            .replace("{location}", params.location.unwrap_or("your location"))
            .replace("{summary}", params.summary.unwrap_or_default())
            .trim()
            .to_string()
    }

    /// Prefixes an emotion-appropriate opener. Neutral or absent emotion leaves the text as is.
    pub fn humanize(&self, text: &str, emotion: Option<Emotion>) -> String {
        let openers = emotion.map(emotion_openers).unwrap_or_default();
        if openers.is_empty() {
            return text.to_string();
        }
        match openers.get(self.selector.pick(openers.len())) {
            Some(opener) => format!("{opener} {text}").trim().to_string(),
            None => text.to_string(),
        }
    }
}

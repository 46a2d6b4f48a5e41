use serde::{Deserialize, Serialize};

/// One inbound user event from the messaging channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub id: String,
    pub sender: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Text {
        body: String,
    },
    /// Button or list reply, carrying the option id we sent.
    Selection {
        id: String,
        #[serde(default)]
        title: Option<String>,
    },
    Location {
        #[serde(default)]
        latitude: Option<f64>,
        #[serde(default)]
        longitude: Option<f64>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        address: Option<String>,
    },
    Media {
        media: MediaKind,
        reference: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Document,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Text { .. } => "text",
            EventKind::Selection { .. } => "selection",
            EventKind::Location { .. } => "location",
            EventKind::Media { .. } => "media",
        }
    }
}

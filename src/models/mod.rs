pub mod booking;
pub mod catalog;
pub mod event;
pub mod intent;
pub mod outbound;
pub mod session;

pub use booking::BookingRecord;
pub use catalog::{Category, SubCategory};
pub use event::{EventKind, InboundEvent, MediaKind};
pub use intent::{Emotion, EmotionReading, Intent, SemanticExtraction, Sentiment, SlotUpdate};
pub use outbound::{ChoiceOption, ChoiceRendering, OutboundMessage};
pub use session::{Coordinates, DialogueState, Session, Slot};

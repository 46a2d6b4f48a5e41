//! The slot-filling state machine.
//!
//! One call handles one inbound event against the sender's session and returns
//! the session write plus the messages to send. Nothing here touches the store
//! or the channel directly.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as Days, NaiveDate, NaiveTime};

use crate::models::{
    BookingRecord, Category, DialogueState, EmotionReading, EventKind, InboundEvent, Intent,
    OutboundMessage, Session, Slot, SubCategory,
};
use crate::services::ai::semantic::{ExtractionError, SemanticExtractor};
use crate::services::booking_sink::BookingSink;
use crate::services::composer::{Phrase, PhraseParams, ResponseComposer};
use crate::services::fast_extractor;
use crate::services::normalizer::{normalize_date_time_on, parse_age, resolve_time, sanitize_text};
use crate::services::reconciler::reconcile;

pub const CONFIRM_YES: &str = "confirm_yes";
pub const CONFIRM_NO: &str = "confirm_no";
pub const DATE_TODAY: &str = "date_today";
pub const DATE_TOMORROW: &str = "date_tomorrow";
pub const DATE_PICK: &str = "date_pick";
pub const TIME_MORNING: &str = "time_morning";
pub const TIME_AFTERNOON: &str = "time_afternoon";
pub const TIME_EVENING: &str = "time_evening";
pub const SHARE_LOCATION: &str = "share_location";
pub const TYPE_ADDRESS: &str = "type_address";

const GREETINGS: &[&str] = &["hi", "hello", "hey", "hey warmy"];
const RESTART_PHRASES: &[&str] = &[
    "start over",
    "restart",
    "book new",
    "book another",
    "new appointment",
];
const AFFIRMATIVES: &[&str] = &["yes", "y", "confirm", "ok", "sure"];
const NEGATIVES: &[&str] = &["no", "cancel", "stop"];

const RESTART_ACK: &str = "No problem! Let's start fresh. What service would you like to book today?";
const CLOSE_OUT: &str = "Okay, if you need anything later, just say hi.";
const CONFIRM_REMINDER: &str = "Please reply Yes to confirm or No to cancel.";
const MENU_QUESTION: &str = "What would you like to book today?";
const AGE_PROMPT: &str = "Please type the patient's age (in years).";
const AGE_RETRY: &str = "Please provide a valid age as a number between 1 and 120 (e.g. 32).";
const LOCATION_PROMPT: &str = "Please share your location (📎 → Location) or type your address.";
const ADDRESS_RETRY: &str = "I didn't catch that. Please type your address or share your location.";
const DATE_PICK_PROMPT: &str = "Please type the appointment date (YYYY-MM-DD), or say 'today' / 'tomorrow'.";
const SHARE_LOCATION_HELP: &str = "Please use the attachment (📎) → Location → Send to share your location.";
const TYPE_ADDRESS_PROMPT: &str = "Please type your address now, or share location using WhatsApp's location button.";
const PRESCRIPTION_PROMPT: &str = "Please send the prescription as a PDF or image.";
const MEDICINE_PROMPT: &str = "Please type the medicine name(s) you need.";
const PRESCRIPTION_RECEIVED: &str = "Thanks, prescription received. ✅";
const UNEXPECTED_MEDIA: &str = "Thanks! If this is a prescription, please choose Medicine Delivery → Send Prescription first.";

/// How the stored session changes after a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Save(Session),
    Reset,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct Turn {
    pub update: SessionUpdate,
    pub outbound: Vec<OutboundMessage>,
    pub emotion: Option<EmotionReading>,
}

impl Turn {
    fn save(session: Session, outbound: Vec<OutboundMessage>) -> Self {
        Self {
            update: SessionUpdate::Save(session),
            outbound,
            emotion: None,
        }
    }

    fn reset(outbound: Vec<OutboundMessage>) -> Self {
        Self {
            update: SessionUpdate::Reset,
            outbound,
            emotion: None,
        }
    }

    fn unchanged(outbound: Vec<OutboundMessage>) -> Self {
        Self {
            update: SessionUpdate::Unchanged,
            outbound,
            emotion: None,
        }
    }

    fn with_emotion(mut self, emotion: Option<EmotionReading>) -> Self {
        self.emotion = emotion;
        self
    }

    /// The state the session is in after this turn.
    pub fn resulting_state(&self, before: DialogueState) -> DialogueState {
        match &self.update {
            SessionUpdate::Save(s) => s.state,
            SessionUpdate::Reset => DialogueState::MainMenu,
            SessionUpdate::Unchanged => before,
        }
    }
}

pub struct DialogueController {
    extractor: Arc<dyn SemanticExtractor>,
    sink: Arc<dyn BookingSink>,
    composer: ResponseComposer,
    extractor_timeout: Duration,
}

impl DialogueController {
    pub fn new(
        extractor: Arc<dyn SemanticExtractor>,
        sink: Arc<dyn BookingSink>,
        composer: ResponseComposer,
        extractor_timeout: Duration,
    ) -> Self {
        Self {
            extractor,
            sink,
            composer,
            extractor_timeout,
        }
    }

    pub async fn handle_event(
        &self,
        mut session: Session,
        event: &InboundEvent,
        today: NaiveDate,
    ) -> Turn {
        if session.name.is_none() {
            session.name = sanitize_text(event.display_name.as_deref());
        }

        match &event.kind {
            EventKind::Text { body } => self.handle_text(session, event, body.trim(), today).await,
            EventKind::Selection { id, .. } => self.handle_selection(session, event, id.trim(), today).await,
            EventKind::Location {
                latitude,
                longitude,
                name,
                address,
            } => self.handle_location(session, *latitude, *longitude, name, address),
            EventKind::Media { reference, .. } => self.handle_media(session, reference),
        }
    }

    async fn handle_text(
        &self,
        session: Session,
        event: &InboundEvent,
        text: &str,
        today: NaiveDate,
    ) -> Turn {
        if text.is_empty() {
            tracing::debug!(sender = %event.sender, "ignoring empty text");
            return Turn::unchanged(Vec::new());
        }
        let lowered = text.to_lowercase();
        let normalized = lowered.trim_end_matches(['!', '.', '?']).trim();

        if RESTART_PHRASES.iter().any(|p| lowered.contains(p)) {
            return self.restart(&session);
        }

        if GREETINGS.contains(&normalized) {
            return self.greet(&session);
        }

        if AFFIRMATIVES.contains(&normalized) {
            return self.affirm(session, &event.sender).await;
        }

        if NEGATIVES.contains(&normalized) {
            return self.decline(&session);
        }

        if session.state == DialogueState::Confirming {
            return Turn::unchanged(vec![OutboundMessage::text(CONFIRM_REMINDER)]);
        }

        if let Some(turn) = self.fill_awaited_slot(&session, text, today) {
            return turn;
        }

        self.handle_free_text(session, event, text, today).await
    }

    fn restart(&self, session: &Session) -> Turn {
        tracing::info!("session restarted on request");
        let fresh = Session {
            greeted: true,
            name: session.name.clone(),
            last_interaction: Some("restart".to_string()),
            ..Session::default()
        };
        Turn::save(fresh, vec![OutboundMessage::text(RESTART_ACK), category_menu()])
    }

    fn greet(&self, session: &Session) -> Turn {
        let greeting = self.composer.compose(
            Phrase::Greeting,
            &PhraseParams {
                name: session.name.as_deref(),
                ..PhraseParams::default()
            },
        );
        let fresh = Session {
            greeted: true,
            name: session.name.clone(),
            last_interaction: Some("greeting".to_string()),
            ..Session::default()
        };
        Turn::save(fresh, vec![OutboundMessage::text(greeting), category_menu()])
    }

    async fn affirm(&self, session: Session, sender: &str) -> Turn {
        if session.state != DialogueState::Confirming {
            // Never a confirmation outside the confirming state: start a new booking instead.
            return Turn::unchanged(vec![category_menu()]);
        }

        let mut confirmed = session;
        confirmed.confirmed = true;
        confirmed.state = DialogueState::Confirmed;
        let record = BookingRecord::from_session(sender, &confirmed);
        tracing::info!(sender = %sender, booking_id = %record.booking_id, "booking confirmed");

        if let Err(e) = self.sink.deliver(&record).await {
            tracing::error!(error = %e, booking_id = %record.booking_id, "failed to deliver booking");
        }

        let reply = self.composer.compose(
            Phrase::Confirmed,
            &PhraseParams {
                name: confirmed.name.as_deref(),
                ..PhraseParams::default()
            },
        );
        Turn::reset(vec![OutboundMessage::text(reply)])
    }

    fn decline(&self, session: &Session) -> Turn {
        if session.state != DialogueState::Confirming {
            return Turn::unchanged(vec![OutboundMessage::text(CLOSE_OUT)]);
        }
        tracing::info!("booking discarded");
        let reply = self.composer.compose(
            Phrase::Cancelled,
            &PhraseParams {
                name: session.name.as_deref(),
                ..PhraseParams::default()
            },
        );
        Turn::reset(vec![OutboundMessage::text(reply)])
    }

    fn handle_location(
        &self,
        mut session: Session,
        latitude: Option<f64>,
        longitude: Option<f64>,
        name: &Option<String>,
        address: &Option<String>,
    ) -> Turn {
        let coordinates = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(crate::models::Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        };
        let display = sanitize_text(name.as_deref())
            .or_else(|| sanitize_text(address.as_deref()))
            .or_else(|| coordinates.map(|c| c.to_string()));

        let Some(display) = display else {
            tracing::warn!("location event without coordinates or address");
            return Turn::unchanged(Vec::new());
        };

        session.location = Some(display.clone());
        session.location_address = Some(display.clone());
        session.location_coordinates = coordinates;
        session.awaiting_address = false;
        session.last_interaction = Some("location".to_string());
        session.clear_satisfied_awaiting();

        let ack = self.composer.compose(
            Phrase::AckLocation,
            &PhraseParams {
                name: session.name.as_deref(),
                location: Some(&display),
                ..PhraseParams::default()
            },
        );
        self.advance(session, vec![OutboundMessage::text(ack)])
    }

    fn handle_media(&self, mut session: Session, reference: &str) -> Turn {
        if session.awaiting_field != Some(Slot::PrescriptionUpload) {
            tracing::debug!("media received while no prescription is awaited");
            return Turn::unchanged(vec![OutboundMessage::text(UNEXPECTED_MEDIA)]);
        }

        session.prescription_uploaded = true;
        session.prescription_media_reference = Some(reference.to_string());
        session.awaiting_field = None;
        session.last_interaction = Some("prescription_upload".to_string());
        session.category.get_or_insert(Category::MedicineDelivery);
        session.sub_category.get_or_insert(SubCategory::UploadPrescription);
        session.drop_invalid_sub_category();

        self.advance(session, vec![OutboundMessage::text(PRESCRIPTION_RECEIVED)])
    }

    /// Narrow parse of typed text for the slot the dialogue is blocked on.
    /// `None` means the text goes on to extraction.
    fn fill_awaited_slot(&self, session: &Session, text: &str, today: NaiveDate) -> Option<Turn> {
        let mut session = session.clone();

        if session.awaiting_address || session.awaiting_field == Some(Slot::Location) {
            let Some(address) = sanitize_text(Some(text)) else {
                return Some(Turn::unchanged(vec![OutboundMessage::text(ADDRESS_RETRY)]));
            };
            session.location = Some(address.clone());
            session.location_address = Some(address.clone());
            session.location_coordinates = None;
            session.awaiting_address = false;
            session.last_interaction = Some("typed_address".to_string());
            session.clear_satisfied_awaiting();
            let ack = self.composer.compose(
                Phrase::AckLocation,
                &PhraseParams {
                    name: session.name.as_deref(),
                    location: Some(&address),
                    ..PhraseParams::default()
                },
            );
            return Some(self.advance(session, vec![OutboundMessage::text(ack)]));
        }

        match session.awaiting_field? {
            Slot::Age => {
                let Some(age) = parse_age(text) else {
                    tracing::debug!("typed age did not parse");
                    return Some(Turn::unchanged(vec![OutboundMessage::text(AGE_RETRY)]));
                };
                session.age = Some(age);
                session.last_interaction = Some("typed_age".to_string());
                session.clear_satisfied_awaiting();
                let ack = format!("Thanks, noted age: {age}.");
                Some(self.advance(session, vec![OutboundMessage::text(ack)]))
            }
            Slot::MedicineText => {
                let medicine = sanitize_text(Some(text))?;
                session.medicine_text = Some(medicine.clone());
                session.awaiting_field = None;
                session.last_interaction = Some("medicine_text".to_string());
                session.category.get_or_insert(Category::MedicineDelivery);
                session.sub_category.get_or_insert(SubCategory::TypeTheMedicine);
                session.drop_invalid_sub_category();
                let ack = self.composer.compose(
                    Phrase::FriendlyAck,
                    &PhraseParams {
                        summary: Some(&medicine),
                        ..PhraseParams::default()
                    },
                );
                Some(self.advance(session, vec![OutboundMessage::text(ack)]))
            }
            Slot::Date => {
                let (date, time) = normalize_date_time_on(today, Some(text), None);
                let date = date?;
                session.date = Some(date);
                if !session.is_filled(Slot::Time) {
                    session.time = time.or(session.time);
                }
                session.last_interaction = Some("typed_date".to_string());
                session.clear_satisfied_awaiting();
                let ack = format!("Date set to {}.", date.format("%Y-%m-%d"));
                Some(self.advance(session, vec![OutboundMessage::text(ack)]))
            }
            Slot::Time => {
                let time = resolve_time(text)?;
                session.time = Some(time);
                session.last_interaction = Some("typed_time".to_string());
                session.clear_satisfied_awaiting();
                let ack = format!("Time set to {}.", time.format("%H:%M"));
                Some(self.advance(session, vec![OutboundMessage::text(ack)]))
            }
            _ => None,
        }
    }

    async fn handle_selection(
        &self,
        mut session: Session,
        event: &InboundEvent,
        id: &str,
        today: NaiveDate,
    ) -> Turn {
        match id {
            CONFIRM_YES => return self.affirm(session, &event.sender).await,
            CONFIRM_NO => return self.decline(&session),
            _ => {}
        }

        if session.state == DialogueState::Confirming {
            return Turn::unchanged(vec![OutboundMessage::text(CONFIRM_REMINDER)]);
        }

        session.last_interaction = Some(format!("selection:{id}"));

        if let Some(category) = Category::from_button_id(id) {
            session.category = Some(category);
            session.drop_invalid_sub_category();
            if matches!(session.awaiting_field, Some(Slot::Category | Slot::SubCategory)) {
                session.awaiting_field = None;
            }
            let ack = format!("Got it, {} selected.", category.title());
            return self.advance(session, vec![OutboundMessage::text(ack)]);
        }

        if let Some(sub) = SubCategory::from_button_id(id) {
            session.category.get_or_insert(sub.category());
            session.sub_category = Some(sub);
            if session.drop_invalid_sub_category() {
                tracing::debug!(id = %id, "selected sub-category does not match category");
                return self.advance(session, Vec::new());
            }
            session.clear_satisfied_awaiting();

            match sub {
                SubCategory::UploadPrescription => {
                    session.awaiting_field = Some(Slot::PrescriptionUpload);
                    return Turn::save(session, vec![OutboundMessage::text(PRESCRIPTION_PROMPT)]);
                }
                SubCategory::TypeTheMedicine => {
                    session.awaiting_field = Some(Slot::MedicineText);
                    return Turn::save(session, vec![OutboundMessage::text(MEDICINE_PROMPT)]);
                }
                _ => {}
            }
            let ack = format!("Got it, {} selected.", sub.title());
            return self.advance(session, vec![OutboundMessage::text(ack)]);
        }

        let date = match id {
            DATE_TODAY => Some(today),
            DATE_TOMORROW => Some(today + Days::days(1)),
            _ => None,
        };
        if let Some(date) = date {
            session.date = Some(date);
            session.clear_satisfied_awaiting();
            let ack = format!("Date set to {}.", date.format("%Y-%m-%d"));
            return self.advance(session, vec![OutboundMessage::text(ack)]);
        }

        if let Some((time, label)) = time_shortcut(id) {
            session.time = Some(time);
            session.clear_satisfied_awaiting();
            let ack = format!("Got it, {label} selected.");
            return self.advance(session, vec![OutboundMessage::text(ack)]);
        }

        match id {
            DATE_PICK => {
                session.awaiting_field = Some(Slot::Date);
                Turn::save(session, vec![OutboundMessage::text(DATE_PICK_PROMPT)])
            }
            TYPE_ADDRESS => {
                session.awaiting_field = Some(Slot::Location);
                session.awaiting_address = true;
                Turn::save(session, vec![OutboundMessage::text(TYPE_ADDRESS_PROMPT)])
            }
            SHARE_LOCATION => Turn::unchanged(vec![OutboundMessage::text(SHARE_LOCATION_HELP)]),
            _ => {
                tracing::warn!(id = %id, "ignoring unknown selection id");
                Turn::unchanged(Vec::new())
            }
        }
    }

    async fn handle_free_text(
        &self,
        session: Session,
        event: &InboundEvent,
        text: &str,
        today: NaiveDate,
    ) -> Turn {
        let fast = fast_extractor::extract(text, today);

        let (extraction, emotion) = tokio::join!(
            self.bounded(self.extractor.extract(text, &session)),
            self.bounded(self.extractor.classify_emotion(text)),
        );

        let emotion = match emotion {
            Ok(reading) => Some(reading),
            Err(e) => {
                tracing::debug!(error = %e, "emotion classification unavailable");
                None
            }
        };

        let extraction = match extraction {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::warn!(sender = %event.sender, error = %e, "semantic extraction failed, answering conversationally");
                return self.fallback(text, emotion).await.with_emotion(emotion);
            }
        };

        tracing::debug!(
            sender = %event.sender,
            intent = ?extraction.intent,
            sentiment = ?extraction.sentiment,
            emotion = ?emotion.map(|e| e.emotion),
            fast = fast.is_some(),
            "extraction complete"
        );

        if extraction.intent == Intent::StartOver {
            return self.restart(&session).with_emotion(emotion);
        }

        let mut merged = reconcile(&session, fast.as_ref(), &extraction.updates, today);
        merged.last_interaction = Some("free_text".to_string());

        let mut outbound = Vec::new();
        let reply = extraction.response.trim();
        let noted = describe_new_fields(&session, &merged);

        if extraction.intent == Intent::GeneralQuery && !reply.is_empty() {
            outbound.push(OutboundMessage::text(
                self.composer.humanize(reply, emotion.map(|e| e.emotion)),
            ));
        } else if let Some(noted) = noted {
            outbound.push(OutboundMessage::text(self.composer.compose(
                Phrase::FriendlyAck,
                &PhraseParams {
                    summary: Some(&noted),
                    ..PhraseParams::default()
                },
            )));
        } else if !merged.is_complete() && !reply.is_empty() {
            outbound.push(OutboundMessage::text(
                self.composer.humanize(reply, emotion.map(|e| e.emotion)),
            ));
        }

        self.advance(merged, outbound).with_emotion(emotion)
    }

    /// Reply when extraction is unavailable. Stored fields stay as they were.
    async fn fallback(&self, text: &str, emotion: Option<EmotionReading>) -> Turn {
        let mood = emotion.map(|e| e.emotion);
        let reply = match self.bounded(self.extractor.converse(text)).await {
            Ok(reply) => self.composer.humanize(&reply, mood),
            Err(e) => {
                tracing::warn!(error = %e, "conversational reply failed");
                let phrase = match mood {
                    Some(
                        crate::models::Emotion::Sad
                        | crate::models::Emotion::Angry
                        | crate::models::Emotion::Urgent,
                    ) => Phrase::Empathetic,
                    _ => Phrase::Fallback,
                };
                self.composer.compose(phrase, &PhraseParams::default())
            }
        };
        Turn::unchanged(vec![OutboundMessage::text(reply)])
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ExtractionError>>,
    ) -> Result<T, ExtractionError> {
        match tokio::time::timeout(self.extractor_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ExtractionError::Timeout),
        }
    }

    /// Asks for the next missing slot, or moves to confirmation once nothing is missing.
    fn advance(&self, mut session: Session, mut outbound: Vec<OutboundMessage>) -> Turn {
        session.clear_satisfied_awaiting();

        match session.next_missing_slot() {
            Some(slot) => {
                session.state = DialogueState::Collecting;
                if let Some(pending) = session.awaiting_field {
                    tracing::debug!(slot = pending.as_str(), "question already outstanding, not prompting");
                } else {
                    tracing::info!(slot = slot.as_str(), "prompting for slot");
                    outbound.push(prompt_for(slot, &mut session));
                    session.awaiting_field = Some(slot);
                }
            }
            None => {
                session.state = DialogueState::Confirming;
                session.awaiting_field = None;
                session.awaiting_address = false;
                tracing::info!(state = session.state.as_str(), "all slots filled, asking for confirmation");

                let summary = compose_summary(&session);
                outbound.push(OutboundMessage::text(self.composer.compose(
                    Phrase::ConfirmSummary,
                    &PhraseParams {
                        name: session.name.as_deref(),
                        summary: Some(&summary),
                        ..PhraseParams::default()
                    },
                )));
                outbound.push(OutboundMessage::choice(
                    "Confirm",
                    "Confirm booking?",
                    &[(CONFIRM_YES, "Yes"), (CONFIRM_NO, "No")],
                ));
            }
        }

        Turn::save(session, outbound)
    }
}

fn category_menu() -> OutboundMessage {
    let options: Vec<(&str, &str)> = Category::ALL
        .iter()
        .map(|c| (c.button_id(), c.title()))
        .collect();
    OutboundMessage::choice("Service", MENU_QUESTION, &options)
}

fn time_shortcut(id: &str) -> Option<(NaiveTime, &'static str)> {
    let (hour, label) = match id {
        TIME_MORNING => (9, "Morning"),
        TIME_AFTERNOON => (15, "Afternoon"),
        TIME_EVENING => (18, "Evening"),
        _ => return None,
    };
    Some((NaiveTime::from_hms_opt(hour, 0, 0)?, label))
}

/// The canonical prompt for `slot`.
fn prompt_for(slot: Slot, session: &mut Session) -> OutboundMessage {
    match slot {
        Slot::Date => OutboundMessage::choice(
            "Date",
            "Please select appointment date:",
            &[
                (DATE_TODAY, "Today"),
                (DATE_TOMORROW, "Tomorrow"),
                (DATE_PICK, "Pick another date"),
            ],
        ),
        Slot::Time => OutboundMessage::choice(
            "Time",
            "Select preferred time:",
            &[
                (TIME_MORNING, "Morning"),
                (TIME_AFTERNOON, "Afternoon"),
                (TIME_EVENING, "Evening"),
            ],
        ),
        Slot::Age => OutboundMessage::text(AGE_PROMPT),
        Slot::Location => {
            session.awaiting_address = true;
            OutboundMessage::choice(
                "Location",
                LOCATION_PROMPT,
                &[(SHARE_LOCATION, "Share Location"), (TYPE_ADDRESS, "Type Address")],
            )
        }
        Slot::Category => category_menu(),
        Slot::SubCategory => match session.category {
            Some(category) => {
                let options: Vec<(&str, &str)> = category
                    .sub_categories()
                    .iter()
                    .map(|s| (s.button_id(), s.title()))
                    .collect();
                OutboundMessage::choice(category.title(), category.sub_category_question(), &options)
            }
            None => OutboundMessage::text("Please tell me which sub-service you want."),
        },
        Slot::MedicineText => OutboundMessage::text(MEDICINE_PROMPT),
        Slot::PrescriptionUpload => OutboundMessage::text(PRESCRIPTION_PROMPT),
    }
}

/// Human-readable booking summary. Absent fields are omitted; medicine
/// delivery shows prescription or medicine details instead of the sub-service.
pub fn compose_summary(session: &Session) -> String {
    let mut lines = Vec::new();
    if let Some(date) = session.date {
        lines.push(format!("• Date: {}", date.format("%Y-%m-%d")));
    }
    if let Some(time) = session.time {
        lines.push(format!("• Time: {}", time.format("%H:%M")));
    }
    if let Some(age) = session.age {
        lines.push(format!("• Age: {age}"));
    }
    if let Some(category) = session.category {
        lines.push(format!("• Service: {}", category.title()));
    }

    if session.category == Some(Category::MedicineDelivery) {
        if session.prescription_uploaded {
            lines.push("• Prescription: received".to_string());
        } else if let Some(medicine) = &session.medicine_text {
            lines.push(format!("• Medicine details: {medicine}"));
        } else {
            match session.sub_category {
                Some(SubCategory::UploadPrescription) => {
                    lines.push("• Prescription: pending upload".to_string())
                }
                Some(SubCategory::TypeTheMedicine) => {
                    lines.push("• Medicine details: pending".to_string())
                }
                Some(sub) => lines.push(format!("• Details: {}", sub.title())),
                None => {}
            }
        }
    } else if let Some(sub) = session.sub_category {
        lines.push(format!("• Sub-service: {}", sub.title()));
    }

    if let Some(location) = &session.location {
        lines.push(format!("• Location: {location}"));
    }
    lines.join("\n")
}

/// Short description of the slots `after` gained over `before`.
fn describe_new_fields(before: &Session, after: &Session) -> Option<String> {
    let mut parts = Vec::new();
    if before.sub_category.is_none() {
        if let Some(sub) = after.sub_category {
            parts.push(sub.title().to_string());
        }
    }
    if parts.is_empty() && before.category.is_none() {
        if let Some(category) = after.category {
            parts.push(category.title().to_string());
        }
    }
    if !before.is_filled(Slot::Date) {
        if let Some(date) = after.date {
            parts.push(format!("on {}", date.format("%Y-%m-%d")));
        }
    }
    if !before.is_filled(Slot::Time) && after.is_filled(Slot::Time) {
        if let Some(time) = after.time {
            parts.push(format!("at {}", time.format("%H:%M")));
        }
    }
    if before.age.is_none() {
        if let Some(age) = after.age {
            parts.push(format!("age {age}"));
        }
    }
    if !before.is_filled(Slot::Location) {
        if let Some(location) = &after.location {
            parts.push(format!("at {location}"));
        }
    }
    (!parts.is_empty()).then(|| parts.join(" "))
}

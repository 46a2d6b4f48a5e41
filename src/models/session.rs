use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::catalog::{Category, SubCategory};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    #[default]
    MainMenu,
    Collecting,
    Confirming,
    Confirmed,
    Discarded,
}

impl DialogueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueState::MainMenu => "main_menu",
            DialogueState::Collecting => "collecting",
            DialogueState::Confirming => "confirming",
            DialogueState::Confirmed => "confirmed",
            DialogueState::Discarded => "discarded",
        }
    }
}

/// A schema field the dialogue can block on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Date,
    Time,
    Age,
    Location,
    Category,
    SubCategory,
    MedicineText,
    PrescriptionUpload,
}

impl Slot {
    /// Required slots in the order they are asked for.
    pub const REQUIRED: [Slot; 6] = [
        Slot::Date,
        Slot::Time,
        Slot::Age,
        Slot::Location,
        Slot::Category,
        Slot::SubCategory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Date => "date",
            Slot::Time => "time",
            Slot::Age => "age",
            Slot::Location => "location",
            Slot::Category => "category",
            Slot::SubCategory => "sub_category",
            Slot::MedicineText => "medicine_text",
            Slot::PrescriptionUpload => "prescription_upload",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Per-sender dialogue state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Session {
    pub name: Option<String>,
    pub age: Option<u8>,
    pub date: Option<NaiveDate>,
    #[serde(with = "hhmm")]
    pub time: Option<NaiveTime>,
    pub category: Option<Category>,
    pub sub_category: Option<SubCategory>,
    pub location: Option<String>,
    pub location_address: Option<String>,
    pub location_coordinates: Option<Coordinates>,
    pub awaiting_field: Option<Slot>,
    pub awaiting_address: bool,
    pub state: DialogueState,
    pub last_interaction: Option<String>,
    pub greeted: bool,
    pub confirmed: bool,
    pub prescription_uploaded: bool,
    pub prescription_media_reference: Option<String>,
    pub medicine_text: Option<String>,
}

/// `00:00` stands for "no time chosen", never midnight.
pub fn is_sentinel_time(time: NaiveTime) -> bool {
    time == NaiveTime::MIN
}

impl Session {
    pub fn is_filled(&self, slot: Slot) -> bool {
        match slot {
            Slot::Date => self.date.is_some(),
            Slot::Time => self.time.is_some_and(|t| !is_sentinel_time(t)),
            Slot::Age => self.age.is_some(),
            Slot::Location => self.location.as_deref().is_some_and(|l| !l.trim().is_empty()),
            Slot::Category => self.category.is_some(),
            Slot::SubCategory => self.sub_category.is_some(),
            Slot::MedicineText => self.medicine_text.is_some(),
            Slot::PrescriptionUpload => self.prescription_uploaded,
        }
    }

    pub fn next_missing_slot(&self) -> Option<Slot> {
        Slot::REQUIRED.into_iter().find(|slot| !self.is_filled(*slot))
    }

    pub fn is_complete(&self) -> bool {
        self.next_missing_slot().is_none()
    }

    /// Drops `awaiting_field` once the slot it names has been supplied.
    pub fn clear_satisfied_awaiting(&mut self) {
        if let Some(slot) = self.awaiting_field {
            if self.is_filled(slot) {
                self.awaiting_field = None;
                if slot == Slot::Location {
                    self.awaiting_address = false;
                }
            }
        }
    }

    /// Enforces the category → sub-category mapping by discarding a mismatched value.
    pub fn drop_invalid_sub_category(&mut self) -> bool {
        match (self.category, self.sub_category) {
            (Some(category), Some(sub)) if !category.allows(sub) => {
                tracing::debug!(
                    category = category.label(),
                    sub_category = sub.label(),
                    "dropping sub-category outside the allowed set"
                );
                self.sub_category = None;
                true
            }
            _ => false,
        }
    }
}

/// Serializes `Option<NaiveTime>` as canonical `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => s.serialize_str(&t.format(FORMAT).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw {
            Some(s) => NaiveTime::parse_from_str(&s, FORMAT)
                .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

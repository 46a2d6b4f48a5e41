use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::{Category, SubCategory};
use super::session::{hhmm, Coordinates, Session};

/// Flat snapshot of a confirmed session, handed to the booking sink and then dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRecord {
    pub booking_id: String,
    pub confirmed_at: DateTime<Utc>,
    pub sender: String,
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
    pub medicine_text: Option<String>,
    pub prescription_uploaded: bool,
    pub prescription_media_reference: Option<String>,
}

impl BookingRecord {
    pub fn from_session(sender: &str, session: &Session) -> Self {
        Self {
            booking_id: uuid::Uuid::new_v4().to_string(),
            confirmed_at: Utc::now(),
            sender: sender.to_string(),
            name: session.name.clone(),
            age: session.age,
            date: session.date,
            time: session.time,
            category: session.category,
            sub_category: session.sub_category,
            location: session.location.clone(),
            location_address: session.location_address.clone(),
            location_coordinates: session.location_coordinates,
            medicine_text: session.medicine_text.clone(),
            prescription_uploaded: session.prescription_uploaded,
            prescription_media_reference: session.prescription_media_reference.clone(),
        }
    }
}

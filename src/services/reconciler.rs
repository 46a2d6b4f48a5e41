//! Field-by-field merge of the stored session with both extractors' proposals.
//!
//! Precedence per field: previous session value, then fast extractor, then
//! semantic extractor. Extraction only fills gaps.

use chrono::{NaiveDate, NaiveTime};

use crate::models::session::is_sentinel_time;
use crate::models::{Category, Session, Slot, SlotUpdate, SubCategory};
use crate::services::normalizer::{normalize_date_time_on, parse_age, sanitize_text};

/// One extractor's proposal after canonicalisation.
#[derive(Debug, Default)]
struct Proposal {
    name: Option<String>,
    age: Option<u8>,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    category: Option<Category>,
    sub_category: Option<SubCategory>,
    location: Option<String>,
}

impl Proposal {
    fn from_update(update: &SlotUpdate, today: NaiveDate) -> Self {
        let (date, time) =
            normalize_date_time_on(today, update.date.as_deref(), update.time.as_deref());
        let category = sanitize_text(update.category.as_deref())
            .as_deref()
            .and_then(Category::from_label);
        let sub_category = sanitize_text(update.sub_category.as_deref())
            .as_deref()
            .and_then(SubCategory::from_label);

        Self {
            name: sanitize_text(update.name.as_deref()),
            age: update.age.as_deref().and_then(parse_age),
            date,
            time: time.filter(|t| !is_sentinel_time(*t)),
            category,
            sub_category,
            location: sanitize_text(update.location.as_deref()),
        }
    }
}

pub fn reconcile(
    previous: &Session,
    fast: Option<&SlotUpdate>,
    semantic: &SlotUpdate,
    today: NaiveDate,
) -> Session {
    let fast = fast
        .map(|update| Proposal::from_update(update, today))
        .unwrap_or_default();
    let semantic = Proposal::from_update(semantic, today);

    let mut merged = previous.clone();

    merged.name = previous.name.clone().or(fast.name).or(semantic.name);
    merged.age = previous.age.or(fast.age).or(semantic.age);
    merged.date = previous.date.or(fast.date).or(semantic.date);
    merged.time = previous
        .time
        .filter(|t| !is_sentinel_time(*t))
        .or(fast.time)
        .or(semantic.time)
        .or(previous.time);
    merged.category = previous.category.or(fast.category).or(semantic.category);
    merged.sub_category = previous
        .sub_category
        .or(fast.sub_category)
        .or(semantic.sub_category);

    if merged.category.is_none() {
        merged.category = merged.sub_category.map(|sub| sub.category());
    }

    let had_location = previous.is_filled(Slot::Location);
    merged.location = if had_location {
        previous.location.clone()
    } else {
        fast.location.or(semantic.location)
    };
    if !had_location && merged.location.is_some() && merged.location_address.is_none() {
        merged.location_address = merged.location.clone();
    }

    merged.drop_invalid_sub_category();
    merged.clear_satisfied_awaiting();
    merged
}

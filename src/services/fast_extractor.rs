//! Keyword and pattern extraction for common phrasings.
//!
//! Runs before the semantic extractor and never calls out. Its values are
//! canonical strings so the reconciler treats them like any other source.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::models::{Category, SlotUpdate, SubCategory};
use crate::services::normalizer::{find_clock_time, resolve_date, time_of_day};

const NURSE_KEYWORDS: &[&str] = &["home nurse", "nurse visit", "nurse at home", "nurse"];
const DENTAL_KEYWORDS: &[&str] = &[
    "dentist",
    "dental",
    "toothache",
    "tooth pain",
    "teeth cleaning",
    "tooth cleaning",
    "tooth extraction",
    "root canal",
];
const CARE_AT_HOME_KEYWORDS: &[&str] = &[
    "care at home",
    "home care",
    "at-home care",
    "careathome",
    "physio",
    "elderly care",
    "post surgery",
    "post-surgery",
];
const MEDICINE_KEYWORDS: &[&str] = &[
    "medicine delivery",
    "deliver meds",
    "deliver medicine",
    "delivery",
    "medicine",
    "meds",
];
const LAB_KEYWORDS: &[&str] = &[
    "lab test",
    "blood test",
    "urine test",
    "covid test",
    "full body checkup",
    "full-body",
];

static TIME_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(morning|afternoon|evening|tonight|night)\b").expect("time word regex")
});

static RELATIVE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(day after tomorrow|today|tonight|tomorrow|tmrw|in \d{1,3} days?|next week)\b")
        .expect("relative date regex")
});

static WEEKDAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:next\s+)?(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
        .expect("weekday regex")
});

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").expect("iso date regex"));

const MONTH_ALTERNATION: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";

static DAY_MONTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b\d{{1,2}}(?:st|nd|rd|th)?\s+(?:of\s+)?(?:{MONTH_ALTERNATION})\b(?:,?\s+\d{{4}})?"
    ))
    .expect("day month regex")
});

static MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:{MONTH_ALTERNATION})\s+\d{{1,2}}(?:st|nd|rd|th)?\b(?:,?\s+\d{{4}})?"
    ))
    .expect("month day regex")
});

/// Numeric dates only count after a marker word, so ages and counts are never read as dates.
static MARKED_NUMERIC_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:on|date|dated|day|for)\s+(\d{1,2}[/.]\d{1,2}(?:[/.](?:\d{4}|\d{2}))?)\b")
        .expect("numeric date regex")
});

/// Returns the fields found in `text`, or `None` when nothing was recognised.
pub fn extract(text: &str, today: NaiveDate) -> Option<SlotUpdate> {
    let lowered = text.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    let (category, sub_category) = detect_service(&lowered);
    let update = SlotUpdate {
        category: category.map(|c| c.label().to_string()),
        sub_category: sub_category.map(|s| s.label().to_string()),
        date: detect_date(&lowered, today).map(|d| d.format("%Y-%m-%d").to_string()),
        time: detect_time(&lowered),
        ..SlotUpdate::default()
    };

    if update.is_empty() {
        None
    } else {
        tracing::debug!(?update, "fast extraction matched");
        Some(update)
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

fn detect_service(text: &str) -> (Option<Category>, Option<SubCategory>) {
    let nurse = contains_any(text, NURSE_KEYWORDS) || contains_any(text, DENTAL_KEYWORDS);

    if nurse || contains_any(text, CARE_AT_HOME_KEYWORDS) {
        let sub = if nurse {
            Some(SubCategory::NurseVisit)
        } else if text.contains("physio") {
            Some(SubCategory::Physiotherapy)
        } else if text.contains("elderly") {
            Some(SubCategory::ElderlyCare)
        } else if text.contains("surgery") {
            Some(SubCategory::PostSurgeryCare)
        } else {
            None
        };
        return (Some(Category::CareAtHome), sub);
    }

    if contains_any(text, MEDICINE_KEYWORDS) {
        let sub = if text.contains("urgent") {
            Some(SubCategory::UrgentMedicines)
        } else if text.contains("refill") || text.contains("regular") {
            Some(SubCategory::RegularMedicines)
        } else {
            None
        };
        return (Some(Category::MedicineDelivery), sub);
    }

    if contains_any(text, LAB_KEYWORDS) {
        let sub = Category::LabTest
            .sub_categories()
            .iter()
            .copied()
            .find(|s| text.contains(s.label()));
        return (Some(Category::LabTest), sub);
    }

    (None, None)
}

fn detect_time(text: &str) -> Option<String> {
    let time = TIME_WORD_RE
        .find(text)
        .and_then(|m| time_of_day(m.as_str()))
        .or_else(|| find_clock_time(text))?;
    Some(time.format("%H:%M").to_string())
}

fn detect_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let candidates = [
        &*RELATIVE_DATE_RE,
        &*ISO_DATE_RE,
        &*DAY_MONTH_RE,
        &*MONTH_DAY_RE,
        &*WEEKDAY_RE,
    ];
    for re in candidates {
        if let Some(date) = re.find(text).and_then(|m| resolve_date(m.as_str(), today)) {
            return Some(date);
        }
    }
    MARKED_NUMERIC_DATE_RE
        .captures(text)
        .and_then(|caps| resolve_date(&caps[1], today))
}

#[cfg(test)]
mod tests {
    use super::*;

    // A Wednesday.
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 18).unwrap()
    }

    #[test]
    fn test_lab_test_with_date_and_time_word() {
        let update = extract("I need a blood test tomorrow morning", today()).unwrap();
        assert_eq!(update.category.as_deref(), Some("lab test"));
        assert_eq!(update.sub_category.as_deref(), Some("blood test"));
        assert_eq!(update.date.as_deref(), Some("2025-06-19"));
        assert_eq!(update.time.as_deref(), Some("09:00"));
        assert_eq!(update.age, None);
    }

    #[test]
    fn test_dental_routes_to_nurse_visit() {
        let update = extract("my toothache is killing me", today()).unwrap();
        assert_eq!(update.category.as_deref(), Some("care at home"));
        assert_eq!(update.sub_category.as_deref(), Some("nurse visit"));
    }

    #[test]
    fn test_physio_and_elderly_care() {
        let physio = extract("physio at home please", today()).unwrap();
        assert_eq!(physio.sub_category.as_deref(), Some("physiotherapy"));

        let elderly = extract("elderly care for my father", today()).unwrap();
        assert_eq!(elderly.category.as_deref(), Some("care at home"));
        assert_eq!(elderly.sub_category.as_deref(), Some("elderly care"));
    }

    #[test]
    fn test_urgent_medicine() {
        let update = extract("urgent medicine delivery on friday at 4pm", today()).unwrap();
        assert_eq!(update.category.as_deref(), Some("medicine delivery"));
        assert_eq!(update.sub_category.as_deref(), Some("urgent medicines"));
        assert_eq!(update.date.as_deref(), Some("2025-06-20"));
        assert_eq!(update.time.as_deref(), Some("16:00"));
    }

    #[test]
    fn test_clock_time_followed_by_punctuation() {
        let update = extract("can you come tomorrow at 3pm?", today()).unwrap();
        assert_eq!(update.date.as_deref(), Some("2025-06-19"));
        assert_eq!(update.time.as_deref(), Some("15:00"));

        let update = extract("blood test at 3pm, tomorrow", today()).unwrap();
        assert_eq!(update.sub_category.as_deref(), Some("blood test"));
        assert_eq!(update.time.as_deref(), Some("15:00"));
        assert_eq!(update.date.as_deref(), Some("2025-06-19"));
    }

    #[test]
    fn test_bare_numbers_are_not_dates() {
        assert_eq!(extract("I am 45", today()), None);
        assert_eq!(extract("12/7", today()), None);
    }

    #[test]
    fn test_marked_numeric_date() {
        let update = extract("book it on 05/07/2025", today()).unwrap();
        assert_eq!(update.date.as_deref(), Some("2025-07-05"));
    }

    #[test]
    fn test_month_names() {
        let update = extract("lab test on 15th march", today()).unwrap();
        assert_eq!(update.date.as_deref(), Some("2026-03-15"));
        let update = extract("can you come july 2", today()).unwrap();
        assert_eq!(update.date.as_deref(), Some("2025-07-02"));
    }

    #[test]
    fn test_nothing_recognised() {
        assert_eq!(extract("hello there", today()), None);
        assert_eq!(extract("   ", today()), None);
    }
}

//! Canonicalisation of date/time phrases, category labels and free text.
//!
//! Everything here is pure and fails closed: input that cannot be read comes
//! back as `None` instead of an error.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime, Weekday};
use regex::Regex;

static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?(?::\d{2})?\s*(a\.?m\b\.?|p\.?m\b\.?)|\b(\d{1,2}):(\d{2})(?::\d{2})?\b")
        .expect("clock regex")
});

static NUMERIC_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})[/.\-](\d{1,2})(?:[/.\-](\d{2}|\d{4}))?$").expect("numeric date regex")
});

static DAY_MONTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})(?:st|nd|rd|th)?\s+(?:of\s+)?([a-z]+)(?:,?\s+(\d{4}))?$")
        .expect("day month regex")
});

static MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z]+)\s+(\d{1,2})(?:st|nd|rd|th)?(?:,?\s+(\d{4}))?$").expect("month day regex")
});

static IN_DAYS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:in|after)\s+(\d{1,3})\s+days?$").expect("in days regex")
});

static AGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(\d{1,3})(?:\D|$)").expect("age regex"));

/// Longest span a relative phrase may reach into the future.
const MAX_DAYS_AHEAD: i64 = 365;

/// Maps the four time-of-day words (plus `tonight`) to canonical times.
pub fn time_of_day(word: &str) -> Option<NaiveTime> {
    let hour = match word.trim().to_lowercase().as_str() {
        "morning" => 9,
        "afternoon" => 15,
        "evening" => 18,
        "night" | "tonight" => 20,
        _ => return None,
    };
    NaiveTime::from_hms_opt(hour, 0, 0)
}

/// Resolves a date/time pair against the local calendar.
pub fn normalize_date_time(
    date_phrase: Option<&str>,
    time_phrase: Option<&str>,
) -> (Option<NaiveDate>, Option<NaiveTime>) {
    normalize_date_time_on(Local::now().date_naive(), date_phrase, time_phrase)
}

/// Same as [`normalize_date_time`] with an explicit "today".
///
/// A time-of-day word or clock time embedded in the date phrase
/// ("tomorrow morning") is split out when no time phrase was supplied.
pub fn normalize_date_time_on(
    today: NaiveDate,
    date_phrase: Option<&str>,
    time_phrase: Option<&str>,
) -> (Option<NaiveDate>, Option<NaiveTime>) {
    let date_phrase = date_phrase.map(str::trim).filter(|s| !s.is_empty());
    let time_phrase = time_phrase.map(str::trim).filter(|s| !s.is_empty());

    let mut time = time_phrase.and_then(resolve_time);

    let date = date_phrase.and_then(|phrase| {
        let (rest, embedded) = split_time_from_date(phrase);
        if time.is_none() {
            time = embedded;
        }
        resolve_date(phrase, today).or_else(|| {
            if rest.is_empty() {
                None
            } else {
                resolve_date(&rest, today)
            }
        })
    });

    (date, time)
}

/// Resolves a whole date phrase, preferring future occurrences.
pub fn resolve_date(phrase: &str, today: NaiveDate) -> Option<NaiveDate> {
    let cleaned = clean_phrase(phrase);
    let mut p = cleaned.as_str();
    for filler in ["on ", "for ", "the ", "date "] {
        p = p.strip_prefix(filler).unwrap_or(p);
    }

    match p {
        "today" | "tonight" | "now" => return Some(today),
        "tomorrow" | "tmrw" | "tomorow" | "tommorow" | "tommorrow" => {
            return Some(today + Duration::days(1))
        }
        "day after tomorrow" | "the day after tomorrow" => return Some(today + Duration::days(2)),
        "next week" => return Some(today + Duration::days(7)),
        _ => {}
    }

    if let Some(caps) = IN_DAYS_RE.captures(p) {
        let days: i64 = caps[1].parse().ok()?;
        return (days <= MAX_DAYS_AHEAD).then(|| today + Duration::days(days));
    }

    if let Some(date) = resolve_weekday(p, today) {
        return Some(date);
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(p, format) {
            return Some(date);
        }
    }

    if let Some(caps) = NUMERIC_DATE_RE.captures(p) {
        // Day first.
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year = caps.get(3).and_then(|y| expand_year(y.as_str()));
        return calendar_date(today, year, month, day);
    }

    if let Some(caps) = DAY_MONTH_RE.captures(p) {
        let day: u32 = caps[1].parse().ok()?;
        let month = month_number(&caps[2])?;
        let year = caps.get(3).and_then(|y| y.as_str().parse().ok());
        return calendar_date(today, year, month, day);
    }

    if let Some(caps) = MONTH_DAY_RE.captures(p) {
        let month = month_number(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        let year = caps.get(3).and_then(|y| y.as_str().parse().ok());
        return calendar_date(today, year, month, day);
    }

    None
}

/// Resolves a time phrase: time-of-day words, `3pm`, `3:30 pm`, `15:00`, `noon`.
pub fn resolve_time(phrase: &str) -> Option<NaiveTime> {
    let cleaned = clean_phrase(phrase);
    let p = cleaned.strip_prefix("at ").unwrap_or(&cleaned);

    if let Some(time) = time_of_day(p) {
        return Some(time);
    }
    match p {
        "noon" | "midday" => return NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" => return Some(NaiveTime::MIN),
        _ => {}
    }

    let caps = CLOCK_RE.captures(p)?;
    if caps.get(0)?.as_str().trim().len() != p.len() {
        return None;
    }
    clock_from_captures(&caps)
}

/// Finds the first clock time (`3pm`, `10:30`) anywhere in `text`.
pub fn find_clock_time(text: &str) -> Option<NaiveTime> {
    CLOCK_RE
        .captures_iter(text)
        .find_map(|caps| clock_from_captures(&caps))
}

/// Reads an age from the first run of 1-3 digits, bounded to 1..=120.
pub fn parse_age(text: &str) -> Option<u8> {
    let run = AGE_RE.captures(text)?.get(1)?;
    let age: u8 = run.as_str().parse().ok()?;
    (1..=120).contains(&age).then_some(age)
}

/// Lowercases, trims and turns separators into spaces. Comparison only, never stored.
pub fn normalize_category_label(label: &str) -> String {
    label
        .to_lowercase()
        .replace(['_', '-', '/'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strips zero-width and control characters and collapses whitespace.
pub fn sanitize_text(value: Option<&str>) -> Option<String> {
    let value = value?;
    let stripped: String = value
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| !is_invisible(*c))
        .collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

fn is_invisible(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200F}' | '\u{FEFF}' | '\u{2060}') || c.is_control()
}

fn clean_phrase(phrase: &str) -> String {
    phrase
        .to_lowercase()
        .replace(',', " ")
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '.' | '!' | '?'))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn clock_from_captures(caps: &regex::Captures<'_>) -> Option<NaiveTime> {
    if let Some(hour) = caps.get(1) {
        let hour: u32 = hour.as_str().parse().ok()?;
        let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
        if !(1..=12).contains(&hour) {
            return None;
        }
        let pm = caps.get(3)?.as_str().starts_with('p');
        let hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
        return NaiveTime::from_hms_opt(hour, minute, 0);
    }
    let hour: u32 = caps.get(4)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(5)?.as_str().parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn split_time_from_date(phrase: &str) -> (String, Option<NaiveTime>) {
    let lower = phrase.to_lowercase();
    let mut time = None;
    let mut rest = lower.clone();

    if let Some(m) = CLOCK_RE.find(&lower) {
        time = find_clock_time(m.as_str());
        rest = format!("{} {}", &lower[..m.start()], &lower[m.end()..]);
    }

    let mut kept = Vec::new();
    for word in rest.split_whitespace() {
        match time_of_day(word) {
            Some(t) => {
                time.get_or_insert(t);
                if word == "tonight" {
                    kept.push("today");
                }
            }
            None if word == "at" => {}
            None => kept.push(word),
        }
    }
    (kept.join(" "), time)
}

fn resolve_weekday(p: &str, today: NaiveDate) -> Option<NaiveDate> {
    let (strict, name) = match p.split_once(' ') {
        Some(("next", rest)) => (true, rest),
        Some(("this" | "coming" | "this coming", rest)) => (false, rest),
        _ => (false, p),
    };
    let target = parse_weekday(name)?;
    let current = today.weekday().num_days_from_monday();
    let wanted = target.num_days_from_monday();
    let mut ahead = i64::from((wanted + 7 - current) % 7);
    if strict && ahead == 0 {
        ahead = 7;
    }
    Some(today + Duration::days(ahead))
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    let day = match name {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thur" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january", "february", "march", "april", "may", "june", "july", "august", "september",
        "october", "november", "december",
    ];
    if name.len() < 3 {
        return None;
    }
    let name = if name == "sept" { "sep" } else { name };
    MONTHS
        .iter()
        .position(|m| m.starts_with(name) && (name.len() == 3 || *m == name))
        .and_then(|i| u32::try_from(i + 1).ok())
}

fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    Some(if raw.len() == 2 { 2000 + year } else { year })
}

/// Builds a date; without a year the next occurrence on or after `today` wins.
fn calendar_date(today: NaiveDate, year: Option<i32>, month: u32, day: u32) -> Option<NaiveDate> {
    match year {
        Some(year) => NaiveDate::from_ymd_opt(year, month, day),
        None => {
            let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
            match this_year {
                Some(date) if date >= today => Some(date),
                _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A Wednesday.
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 18).unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    #[test]
    fn test_today_with_no_time() {
        let local_today = Local::now().date_naive();
        assert_eq!(normalize_date_time(Some("today"), None), (Some(local_today), None));
    }

    #[test]
    fn test_morning_with_no_date() {
        assert_eq!(normalize_date_time(None, Some("morning")), (None, Some(t("09:00"))));
    }

    #[test]
    fn test_time_of_day_words() {
        assert_eq!(resolve_time("afternoon"), Some(t("15:00")));
        assert_eq!(resolve_time("Evening"), Some(t("18:00")));
        assert_eq!(resolve_time("night"), Some(t("20:00")));
    }

    #[test]
    fn test_clock_times() {
        assert_eq!(resolve_time("3pm"), Some(t("15:00")));
        assert_eq!(resolve_time("at 3:30 p.m."), Some(t("15:30")));
        assert_eq!(resolve_time("12 am"), Some(t("00:00")));
        assert_eq!(resolve_time("15:00"), Some(t("15:00")));
        assert_eq!(resolve_time("09:00:00"), Some(t("09:00")));
        assert_eq!(resolve_time("25:00"), None);
        assert_eq!(resolve_time("whenever"), None);
        assert_eq!(resolve_time("3 amazing"), None);
    }

    #[test]
    fn test_clock_time_before_punctuation() {
        assert_eq!(find_clock_time("at 3pm?"), Some(t("15:00")));
        assert_eq!(find_clock_time("3pm, tomorrow"), Some(t("15:00")));
        assert_eq!(find_clock_time("ok 10 a.m.!"), Some(t("10:00")));
    }

    #[test]
    fn test_relative_dates() {
        assert_eq!(resolve_date("tomorrow", today()), Some(d("2025-06-19")));
        assert_eq!(resolve_date("day after tomorrow", today()), Some(d("2025-06-20")));
        assert_eq!(resolve_date("in 3 days", today()), Some(d("2025-06-21")));
    }

    #[test]
    fn test_weekdays_prefer_future() {
        assert_eq!(resolve_date("friday", today()), Some(d("2025-06-20")));
        assert_eq!(resolve_date("on Monday", today()), Some(d("2025-06-23")));
        assert_eq!(resolve_date("wednesday", today()), Some(d("2025-06-18")));
        assert_eq!(resolve_date("next wednesday", today()), Some(d("2025-06-25")));
    }

    #[test]
    fn test_absolute_dates() {
        assert_eq!(resolve_date("2025-07-01", today()), Some(d("2025-07-01")));
        assert_eq!(resolve_date("05/07/2025", today()), Some(d("2025-07-05")));
        assert_eq!(resolve_date("15th March", today()), Some(d("2026-03-15")));
        assert_eq!(resolve_date("june 20", today()), Some(d("2025-06-20")));
        assert_eq!(resolve_date("31/02/2025", today()), None);
    }

    #[test]
    fn test_embedded_time_of_day_is_split_out() {
        assert_eq!(
            normalize_date_time_on(today(), Some("tomorrow morning"), None),
            (Some(d("2025-06-19")), Some(t("09:00")))
        );
        assert_eq!(
            normalize_date_time_on(today(), Some("friday at 4pm"), None),
            (Some(d("2025-06-20")), Some(t("16:00")))
        );
    }

    #[test]
    fn test_explicit_time_wins_over_embedded() {
        assert_eq!(
            normalize_date_time_on(today(), Some("tomorrow evening"), Some("10:30")),
            (Some(d("2025-06-19")), Some(t("10:30")))
        );
    }

    #[test]
    fn test_unparseable_fails_closed() {
        assert_eq!(
            normalize_date_time_on(today(), Some("whenever suits"), Some("soonish")),
            (None, None)
        );
        assert_eq!(normalize_date_time_on(today(), None, None), (None, None));
    }

    #[test]
    fn test_canonical_values_pass_through() {
        assert_eq!(
            normalize_date_time_on(today(), Some("2025-06-20"), Some("18:00")),
            (Some(d("2025-06-20")), Some(t("18:00")))
        );
    }

    #[test]
    fn test_parse_age() {
        assert_eq!(parse_age("I'm 42 years old"), Some(42));
        assert_eq!(parse_age("7"), Some(7));
        assert_eq!(parse_age("0"), None);
        assert_eq!(parse_age("130"), None);
        assert_eq!(parse_age("forty"), None);
        assert_eq!(parse_age("12345"), None);
        assert_eq!(parse_age("67yrs"), Some(67));
        assert_eq!(parse_age("age 45y"), Some(45));
        assert_eq!(parse_age("(58)"), Some(58));
    }

    #[test]
    fn test_category_label() {
        assert_eq!(normalize_category_label("  Care_At-Home "), "care at home");
        assert_eq!(normalize_category_label("LAB/TEST"), "lab test");
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(
            sanitize_text(Some("  12\u{200B} Baker\n\n Street\u{FEFF} ")),
            Some("12 Baker Street".to_string())
        );
        assert_eq!(sanitize_text(Some(" \u{200C} ")), None);
        assert_eq!(sanitize_text(None), None);
    }
}

//! Per-type normalization of captured slot values. `None` means the capture
//! is not a valid value of its type.

use chrono::{Duration, NaiveDate};

use mneme_core::models::SlotType;

pub fn normalize(slot_type: SlotType, raw: &str, today: NaiveDate) -> Option<String> {
    match slot_type {
        SlotType::Text => collapse_whitespace(raw),
        SlotType::Entity => {
            let value = collapse_whitespace(raw)?;
            value
                .chars()
                .next()
                .is_some_and(char::is_uppercase)
                .then_some(value)
        }
        SlotType::Number => normalize_number(raw),
        SlotType::Date => normalize_date(raw, today).map(|d| d.format("%Y-%m-%d").to_string()),
        SlotType::Any => {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    }
}

fn collapse_whitespace(raw: &str) -> Option<String> {
    let joined = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!joined.is_empty()).then_some(joined)
}

/// Reparse and print canonically: integers without a fraction, other values
/// in shortest round-trip form.
pub fn normalize_number(raw: &str) -> Option<String> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        Some(format!("{}", value as i64))
    } else {
        Some(format!("{value}"))
    }
}

/// Parse ISO (`2024-03-05`), US (`3/5/2024`), month-name (`March 5th, 2024`)
/// and relative (`today`, `tomorrow`, `yesterday`) dates.
pub fn normalize_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lower = raw.trim().to_ascii_lowercase();
    match lower.as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.checked_add_signed(Duration::days(1)),
        "yesterday" => return today.checked_sub_signed(Duration::days(1)),
        _ => {}
    }

    if let Some((y, rest)) = lower.split_once('-') {
        let (m, d) = rest.split_once('-')?;
        return ymd(y, m, d);
    }
    if let Some((m, rest)) = lower.split_once('/') {
        let (d, y) = rest.split_once('/')?;
        return ymd(y, m, d);
    }

    let cleaned = lower.replace([',', '.'], " ");
    let mut parts = cleaned.split_whitespace();
    let month = month_number(parts.next()?)?;
    let day = parts
        .next()?
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .parse::<u32>()
        .ok()?;
    let year = parts.next()?.parse::<i32>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn ymd(y: &str, m: &str, d: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
        y.trim().parse().ok()?,
        m.trim().parse().ok()?,
        d.trim().parse().ok()?,
    )
}

fn month_number(token: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let prefix = token.get(..3)?;
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .map(|i| i as u32 + 1)
}

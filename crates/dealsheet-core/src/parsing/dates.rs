use crate::model::EffectiveDateRange;
use crate::parsing::normalize::normalize_dashes;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static EFFECTIVE_DATES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)DEAL EFFECTIVE DATES\s+([A-Z]{3,9})\s+([0-9]{1,2})\s*-\s*(?:([A-Z]{3,9})\s+)?([0-9]{1,2}),?\s*([0-9]{4})",
    )
    .expect("static regex must compile")
});

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Extract the "DEAL EFFECTIVE DATES FEB 1 - FEB 27, 2026" banner.
///
/// The end month may be omitted for same-month ranges ("MAR 5 - 19, 2026").
/// Both dates share the banner's year. Returns `None` when the banner is
/// missing, names an unknown month, or names a day the month doesn't have.
pub fn extract_effective_date_range(raw_text: &str) -> Option<EffectiveDateRange> {
    let normalized = normalize_dashes(raw_text);
    let caps = EFFECTIVE_DATES_RE.captures(&normalized)?;

    let start_month = month_number(caps.get(1)?.as_str())?;
    let end_month = match caps.get(3) {
        Some(m) => month_number(m.as_str())?,
        None => start_month,
    };
    let start_day: u32 = caps.get(2)?.as_str().parse().ok()?;
    let end_day: u32 = caps.get(4)?.as_str().parse().ok()?;
    let year: i32 = caps.get(5)?.as_str().parse().ok()?;

    Some(EffectiveDateRange {
        starts_at: NaiveDate::from_ymd_opt(year, start_month, start_day)?,
        ends_at: NaiveDate::from_ymd_opt(year, end_month, end_day)?,
    })
}

/// Month number (1-12) from an English month name, matched on its first three letters.
fn month_number(name: &str) -> Option<u32> {
    let key = name.get(..3)?.to_uppercase();
    MONTHS
        .iter()
        .position(|m| *m == key)
        .map(|i| i as u32 + 1)
}

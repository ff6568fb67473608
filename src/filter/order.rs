use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::quote::MatchedQuote;

// Timestamps without an offset carry no zone; they are read as UTC.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

/// Parse an API timestamp. Accepts RFC 3339, naive date-times (read as UTC) and bare dates.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parsed date, or the Unix epoch when the date is missing or unreadable.
pub fn date_or_epoch(raw: &str) -> DateTime<Utc> {
    parse_date(raw).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Stable ascending sort by date. Unreadable dates sort as the epoch.
pub fn sort_by_date(quotes: &mut [MatchedQuote]) {
    for q in quotes.iter().filter(|q| parse_date(&q.record.date).is_none()) {
        tracing::warn!(id = q.id(), date = %q.record.date, "unreadable date, sorting as epoch");
    }
    quotes.sort_by_cached_key(|q| date_or_epoch(&q.record.date));
}

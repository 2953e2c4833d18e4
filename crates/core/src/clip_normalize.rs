//! Normalization of raw clip documents into [`ClipTimeRecord`]s.
//!
//! Clip documents in the store have accumulated several spellings for the
//! same field (`startTimeSeconds`, `startSec`, ...) and sometimes store
//! times as strings or leave them out entirely. This adapter is the only
//! place that knows about those shapes; everything downstream works on the
//! strict record.

use serde_json::{Map, Value};

use crate::clip_time::{ClipTimeRecord, TimeField};
use crate::types::Seconds;

// ---------------------------------------------------------------------------
// Field aliases
// ---------------------------------------------------------------------------

/// Canonical field name for the start offset.
pub const START_FIELD: &str = "startTimeSeconds";

/// Canonical field name for the end offset.
pub const END_FIELD: &str = "endTimeSeconds";

/// Accepted spellings of the start offset, in precedence order.
pub const START_ALIASES: &[&str] = &[
    START_FIELD,
    "startSec",
    "start_time_seconds",
    "startTime",
    "start",
];

/// Accepted spellings of the end offset, in precedence order.
pub const END_ALIASES: &[&str] = &[
    END_FIELD,
    "endSec",
    "end_time_seconds",
    "endTime",
    "end",
];

/// Accepted spellings of the source-video grouping key.
pub const EPISODE_ALIASES: &[&str] = &["episode", "episodeId", "videoId"];

/// Accepted spellings of the clip label.
pub const TITLE_ALIASES: &[&str] = &["title", "name"];

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Convert a raw document into the strict validation shape.
///
/// For each time field the first alias holding a parseable value wins.
/// When no alias parses, the field is set to `0` and recorded in
/// [`ClipTimeRecord::coerced_fields`].
pub fn normalize_clip_document(id: &str, fields: &Map<String, Value>) -> ClipTimeRecord {
    let mut coerced_fields = Vec::new();

    let start_time_seconds = match first_time(fields, START_ALIASES) {
        Some(value) => value,
        None => {
            coerced_fields.push(TimeField::Start);
            0.0
        }
    };
    let end_time_seconds = match first_time(fields, END_ALIASES) {
        Some(value) => value,
        None => {
            coerced_fields.push(TimeField::End);
            0.0
        }
    };

    ClipTimeRecord {
        id: id.to_string(),
        start_time_seconds,
        end_time_seconds,
        episode: first_string(fields, EPISODE_ALIASES),
        title: first_string(fields, TITLE_ALIASES),
        coerced_fields,
    }
}

/// Read the normalized episode label of a document, if any.
pub fn document_episode(fields: &Map<String, Value>) -> Option<String> {
    first_string(fields, EPISODE_ALIASES)
}

fn first_time(fields: &Map<String, Value>, aliases: &[&str]) -> Option<Seconds> {
    aliases
        .iter()
        .filter_map(|alias| fields.get(*alias))
        .find_map(parse_time_value)
}

fn first_string(fields: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| fields.get(*alias))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Parse a stored time value.
///
/// Accepts JSON numbers, decimal strings (`"12.5"`), and clock strings
/// (`"MM:SS"`, `"H:MM:SS"`, with optional fractional seconds). Returns
/// `None` for anything else, including non-finite and negative clock parts.
pub fn parse_time_value(value: &Value) -> Option<Seconds> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_time_str(s),
        _ => None,
    }
}

fn parse_time_str(raw: &str) -> Option<Seconds> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(seconds) = trimmed.parse::<Seconds>() {
        return seconds.is_finite().then_some(seconds);
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }

    let (last, leading) = parts.split_last()?;
    let secs: Seconds = last.parse().ok().filter(|s: &Seconds| s.is_finite() && *s >= 0.0)?;
    let mut total = secs;
    let mut multiplier = 1.0;
    for part in leading.iter().rev() {
        let unit: u64 = part.parse().ok()?;
        multiplier *= 60.0;
        total += unit as Seconds * multiplier;
    }
    Some(total)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Event log loader.
//!
//! Turns a raw record source into a validated, sorted sequence of [`Event`]s.
//! Bad records are skipped and counted; only an empty result is fatal.

use super::schema::Event;
use crate::utils::config::{
    CSS_FIELD_NAMES, EPOCH_MILLIS_THRESHOLD, EVENT_TIME_FIELD_NAMES, NAIVE_TIME_FORMATS,
    PATH_FIELD_NAMES, SESSION_ID_FIELD_NAMES, TEXT_FIELD_NAMES, USER_ID_FIELD_NAMES,
    VALUE_FIELD_NAMES,
};
use crate::utils::error::{LoadError, MalformedRecordError};
use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::path::Path;

/// Result of a load run
#[derive(Debug, Clone)]
pub struct LoadedEvents {
    /// Valid events sorted by user, time, then input order
    pub events: Vec<Event>,

    /// Number of records that were skipped
    pub skipped: usize,

    /// Why each skipped record was rejected
    pub rejected: Vec<MalformedRecordError>,
}

/// Load events from a file on disk
///
/// **Public** - main entry point for the CLI
///
/// # Errors
/// * `LoadError::Io` - File cannot be read
/// * `LoadError::Json` - A JSON array source is not valid JSON
/// * `LoadError::EmptyInput` - No record survived validation
pub fn load_file(path: impl AsRef<Path>) -> Result<LoadedEvents, LoadError> {
    let path = path.as_ref();
    info!("Loading events from: {}", path.display());

    let contents = std::fs::read_to_string(path)?;
    load_str(&contents)
}

/// Load events from source text
///
/// Accepts a JSON array of objects or JSON Lines (one object per line).
/// The format is picked from the first non-whitespace character.
/// A JSON Lines entry that is not valid JSON counts as a malformed record.
pub fn load_str(source: &str) -> Result<LoadedEvents, LoadError> {
    let trimmed = source.trim_start();

    if trimmed.starts_with('[') {
        debug!("Source is a JSON array");
        let records: Vec<Value> = serde_json::from_str(trimmed)?;
        return load(&records);
    }

    debug!("Source is JSON Lines");
    let raw: Vec<Result<Value, String>> = trimmed
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str::<Value>(line).map_err(|e| format!("invalid JSON: {}", e)))
        .collect();

    normalize_all(raw)
}

/// Load events from already-parsed records
///
/// **Public** - used when the caller owns the raw batch
///
/// # Returns
/// Valid events plus the count of skipped records
///
/// # Errors
/// * `LoadError::EmptyInput` - No record survived validation
pub fn load(records: &[Value]) -> Result<LoadedEvents, LoadError> {
    normalize_all(records.iter().cloned().map(Ok))
}

/// Validate every record, then sort the survivors
///
/// **Private** - shared by all load entry points
fn normalize_all(
    records: impl IntoIterator<Item = Result<Value, String>>,
) -> Result<LoadedEvents, LoadError> {
    let mut events = Vec::new();
    let mut rejected = Vec::new();

    for (index, record) in records.into_iter().enumerate() {
        let outcome = record
            .map_err(|reason| MalformedRecordError::new(index, reason))
            .and_then(|value| normalize_record(index, &value));

        match outcome {
            Ok(event) => events.push(event),
            Err(e) => {
                warn!("Skipping malformed {}", e);
                rejected.push(e);
            }
        }
    }

    let skipped = rejected.len();
    if events.is_empty() {
        return Err(LoadError::EmptyInput { skipped });
    }

    // Stable sort keeps ingestion order for equal (user, time) keys
    events.sort_by(|a, b| {
        a.user_id
            .cmp(&b.user_id)
            .then_with(|| a.event_time.cmp(&b.event_time))
    });

    info!("Loaded {} events ({} records skipped)", events.len(), skipped);

    Ok(LoadedEvents {
        events,
        skipped,
        rejected,
    })
}

/// Validate a single raw record
///
/// **Private** - internal validation logic
fn normalize_record(index: usize, record: &Value) -> Result<Event, MalformedRecordError> {
    let obj = record
        .as_object()
        .ok_or_else(|| MalformedRecordError::new(index, "record is not a JSON object"))?;

    let user_id = required_text(index, obj, USER_ID_FIELD_NAMES, "user_id")?;
    let path = required_text(index, obj, PATH_FIELD_NAMES, "path")?;

    let raw_time = find_field(obj, EVENT_TIME_FIELD_NAMES)
        .filter(|v| !v.is_null())
        .ok_or_else(|| MalformedRecordError::new(index, "missing event_time"))?;

    let event_time = parse_event_time(raw_time)
        .map_err(|reason| MalformedRecordError::new(index, reason))?;

    Ok(Event {
        user_id,
        session_id: optional_text(obj, SESSION_ID_FIELD_NAMES),
        path,
        css: optional_text(obj, CSS_FIELD_NAMES).unwrap_or_default(),
        text: optional_text(obj, TEXT_FIELD_NAMES).unwrap_or_default(),
        value: optional_text(obj, VALUE_FIELD_NAMES),
        event_time,
    })
}

/// Parse an event timestamp from a JSON value
///
/// **Public** - exposed for callers validating single values
///
/// Accepts RFC 3339 strings, naive `YYYY-MM-DD HH:MM:SS` strings (read as UTC),
/// and integer epoch seconds or milliseconds. Sub-second precision is dropped.
pub fn parse_event_time(value: &Value) -> Result<DateTime<Utc>, String> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64))
            .and_then(from_epoch),
        Value::String(s) => parse_time_str(s.trim()),
        _ => None,
    };

    parsed
        .map(|dt| dt.trunc_subsecs(0))
        .ok_or_else(|| format!("unparseable event_time: {}", value))
}

/// **Private** - string timestamp formats
fn parse_time_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(dt) = NAIVE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.and_utc());
    }

    s.parse::<i64>().ok().and_then(from_epoch)
}

/// **Private** - epoch seconds, or milliseconds for very large values
fn from_epoch(epoch: i64) -> Option<DateTime<Utc>> {
    if epoch.unsigned_abs() >= EPOCH_MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(epoch)
    } else {
        DateTime::from_timestamp(epoch, 0)
    }
}

/// **Private** - first present field among aliases
fn find_field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| obj.get(*name))
}

/// **Private** - scalar field rendered as text; empty strings count as absent
fn optional_text(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    let text = match find_field(obj, names)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// **Private** - required string or number field; whitespace-only is missing
fn required_text(
    index: usize,
    obj: &Map<String, Value>,
    names: &[&str],
    field: &str,
) -> Result<String, MalformedRecordError> {
    if let Some(Value::Bool(_)) = find_field(obj, names) {
        return Err(MalformedRecordError::new(
            index,
            format!("{} must be a string or number", field),
        ));
    }

    optional_text(obj, names)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| MalformedRecordError::new(index, format!("missing {}", field)))
}

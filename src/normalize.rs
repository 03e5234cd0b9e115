use crate::domain::Conference;
use serde_json::{Map, Value};
use tracing::debug;

/// A raw row as it arrives from a source: any string-keyed JSON mapping.
pub type RawRow = Map<String, Value>;

// Field resolution precedence, first non-empty value wins.
const NAME_KEYS: &[&str] = &["name", "title"];
const URL_KEYS: &[&str] = &["url", "link"];
const START_DATE_KEYS: &[&str] = &["start_date", "startDate", "date"];
const END_DATE_KEYS: &[&str] = &["end_date", "endDate"];
const CITY_KEYS: &[&str] = &["city", "location"];
const COUNTRY_KEYS: &[&str] = &["country", "countryCode"];
const TOPIC_KEYS: &[&str] = &["topics", "tags"];

/// Map one raw row onto the canonical [`Conference`] shape.
///
/// Returns `None` when the row has no resolvable name, url or start date.
/// A missing end date falls back to the start date.
pub fn normalize_row(row: &RawRow) -> Option<Conference> {
    let name = resolve_text(row, NAME_KEYS)?;
    let url = resolve_text(row, URL_KEYS)?;
    let start_date = resolve_text(row, START_DATE_KEYS)?;
    let end_date = resolve_text(row, END_DATE_KEYS).unwrap_or_else(|| start_date.clone());

    Some(Conference {
        name,
        start_date,
        end_date,
        city: resolve_text(row, CITY_KEYS).unwrap_or_default(),
        country: resolve_text(row, COUNTRY_KEYS).unwrap_or_default(),
        url,
        topics: resolve_first(row, TOPIC_KEYS)
            .map(normalize_topics)
            .unwrap_or_default(),
    })
}

/// Normalize a sequence of raw values, preserving order and silently
/// dropping rows that are not objects or fail [`normalize_row`].
pub fn normalize_rows(rows: &[Value]) -> Vec<Conference> {
    let normalized: Vec<Conference> = rows
        .iter()
        .filter_map(Value::as_object)
        .filter_map(normalize_row)
        .collect();

    let dropped = rows.len() - normalized.len();
    if dropped > 0 {
        debug!("Dropped {} of {} rows lacking name, url or start date", dropped, rows.len());
    }
    normalized
}

/// Split comma-separated strings into trimmed, non-empty tags; keep arrays
/// of strings as they are. Anything else carries no topics.
pub fn normalize_topics(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => split_topics(s),
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.to_string())
            .collect(),
        _ => Vec::new(),
    }
}

/// Comma-separated topic string to tag list, as typed on the command line.
pub fn split_topics(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

fn resolve_first<'a>(row: &'a RawRow, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .find(|value| is_present(value))
}

fn resolve_text(row: &RawRow, keys: &[&str]) -> Option<String> {
    resolve_first(row, keys).and_then(|value| match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Empty strings, empty collections, `null`, `false` and zero count as absent.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

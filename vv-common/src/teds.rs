//! TEDS (Transducer Electronic Data Sheet) normalization
//!
//! The automation interface hands back transducer metadata as rows of
//! `(name, value, unit)` in several shapes:
//!
//! 1. list of lists: `[[name, value, unit], ...]`
//! 2. list of tuples (arrives as arrays as well)
//! 3. a single-element wrapper: `[[(name, value, unit), ...]]`
//! 4. a bare single row: `(name, value, unit)`
//!
//! A failed read arrives as an object with an `Error` key. Nothing here
//! panics or propagates: every malformed channel degrades to an error
//! entry so one bad sensor never fails the whole response.
//!
//! The wrapper shape (3) is an upstream inconsistency; only the observed
//! shapes are unwrapped.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// First signed/unsigned decimal token in a value string
static NUMERIC_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-+]?\d*\.?\d+").expect("Invalid numeric token regex"));

const NO_TEDS_DATA: &str = "No TEDS data available";

/// One `(name, value, unit)` row after stringification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TedsRow {
    pub name: String,
    pub value: String,
    pub unit: String,
}

/// Value half of a field that carries a unit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MeasuredValue {
    Number(f64),
    Text(String),
}

/// Normalized field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// No unit: the raw string
    Text(String),
    /// Unit present: numeric when the value parses, raw text otherwise
    WithUnit { value: MeasuredValue, unit: String },
}

/// Normalized field name → value
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A successfully formatted transducer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transducer {
    /// 1-based channel, omitted for URN lookups and single-channel responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<usize>,
    #[serde(flatten)]
    pub fields: FieldMap,
}

/// A channel whose metadata could not be formatted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TedsError {
    pub error: String,
    /// 1-based channel, omitted for URN lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<usize>,
}

impl TedsError {
    fn new(error: impl Into<String>, channel_index: Option<usize>) -> Self {
        Self {
            error: error.into(),
            channel: channel_index.map(|i| i + 1),
        }
    }
}

/// Outcome for one channel: exactly one of transducer or error
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelTeds {
    Transducer(Transducer),
    Error(TedsError),
}

/// Formatted multi-channel document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TedsDocument {
    pub transducers: Vec<Transducer>,
    pub errors: Vec<TedsError>,
}

/// Looked-up field as raw strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TedsField {
    pub value: String,
    pub unit: String,
}

/// Extract the first numeric token from a value such as `"10.001 mV/G"`.
pub fn parse_numeric_value(value: &str) -> Option<f64> {
    if value.is_empty() {
        return None;
    }
    NUMERIC_TOKEN
        .find(value.trim())
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// `"Model Number (x)"` → `"model_number_x"`
pub fn normalize_field_name(field_name: &str) -> String {
    field_name
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | ',' | '.'))
        .collect()
}

/// Case-insensitive lookup of a single field; empty strings when absent.
pub fn extract_teds_field(rows: &[TedsRow], field_name: &str) -> TedsField {
    let wanted = field_name.to_lowercase();
    rows.iter()
        .find(|row| row.name.to_lowercase() == wanted)
        .map(|row| TedsField {
            value: row.value.clone(),
            unit: row.unit.clone(),
        })
        .unwrap_or_default()
}

/// Collect every named, non-empty row under its normalized field name.
pub fn extract_all_teds_fields(rows: &[TedsRow]) -> FieldMap {
    let mut fields = FieldMap::new();

    for row in rows {
        if row.name.is_empty() || row.value.is_empty() {
            continue;
        }

        let value = if row.unit.is_empty() {
            FieldValue::Text(row.value.clone())
        } else {
            let value = match parse_numeric_value(&row.value) {
                Some(number) => MeasuredValue::Number(number),
                None => MeasuredValue::Text(row.value.clone()),
            };
            FieldValue::WithUnit {
                value,
                unit: row.unit.clone(),
            }
        };

        fields.insert(normalize_field_name(&row.name), value);
    }

    fields
}

/// Unwrap the observed payload shapes into stringified rows.
///
/// Fails for payloads that are not arrays at all.
pub fn normalize_rows(payload: &Value) -> Result<Vec<TedsRow>, String> {
    let Value::Array(items) = payload else {
        return Err(format!(
            "Expected list or tuple for TEDS data, got {}",
            value_kind(payload)
        ));
    };

    // Bare single row: (name, value, unit) with no nested arrays
    if items.len() >= 2 && items.iter().all(|item| !item.is_array()) {
        return Ok(row_from_items(items).into_iter().collect());
    }

    // Single-element wrapper around the real row list
    let items = match items.as_slice() {
        [Value::Array(inner)] if inner.first().is_some_and(Value::is_array) => inner,
        _ => items,
    };

    Ok(items
        .iter()
        .filter_map(|item| match item {
            Value::Array(fields) => row_from_items(fields),
            _ => None,
        })
        .collect())
}

fn row_from_items(fields: &[Value]) -> Option<TedsRow> {
    if fields.len() < 2 {
        return None;
    }
    let at = |i: usize| fields.get(i).map(stringify).unwrap_or_default();
    Some(TedsRow {
        name: at(0),
        value: at(1),
        unit: at(2),
    })
}

/// Format one transducer's rows.
///
/// `channel_index` is 0-based; `None` marks a URN lookup.
pub fn format_single_transducer_teds(
    payload: &Value,
    channel_index: Option<usize>,
    include_channel: bool,
) -> Result<Transducer, String> {
    let rows = normalize_rows(payload)?;
    if rows.is_empty() {
        return Err(format!("{} after normalization", NO_TEDS_DATA));
    }

    Ok(Transducer {
        channel: if include_channel {
            channel_index.map(|i| i + 1)
        } else {
            None
        },
        fields: extract_all_teds_fields(&rows),
    })
}

fn format_channel(payload: &Value, channel_index: Option<usize>, include_channel: bool) -> ChannelTeds {
    match payload {
        Value::Object(map) if map.contains_key("Error") => {
            let message = map.get("Error").map(stringify).unwrap_or_default();
            ChannelTeds::Error(TedsError::new(message, channel_index))
        }
        Value::Null => ChannelTeds::Error(TedsError::new(NO_TEDS_DATA, channel_index)),
        Value::Array(items) if items.is_empty() => {
            ChannelTeds::Error(TedsError::new(NO_TEDS_DATA, channel_index))
        }
        Value::Array(_) => {
            match format_single_transducer_teds(payload, channel_index, include_channel) {
                Ok(transducer) => ChannelTeds::Transducer(transducer),
                Err(e) => ChannelTeds::Error(TedsError::new(
                    format!("Failed to format TEDS data: {}", e),
                    channel_index,
                )),
            }
        }
        other => ChannelTeds::Error(TedsError::new(
            format!("Unknown TEDS data format: {}", value_kind(other)),
            channel_index,
        )),
    }
}

/// Format a single channel's payload.
///
/// The transducer carries no channel field: single-channel responses
/// report the channel at the response level.
pub fn format_single_channel_teds(payload: &Value, channel_index: Option<usize>) -> ChannelTeds {
    format_channel(payload, channel_index, false)
}

/// Format every channel's payload into `{transducers, errors}`.
pub fn format_teds_data(all_teds: &[Value]) -> TedsDocument {
    let mut document = TedsDocument::default();

    for (index, payload) in all_teds.iter().enumerate() {
        match format_channel(payload, Some(index), true) {
            ChannelTeds::Transducer(t) => document.transducers.push(t),
            ChannelTeds::Error(e) => document.errors.push(e),
        }
    }

    document
}

/// What a raw, unformatted per-channel read contains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTedsStatus {
    Data,
    Error,
    Empty,
}

/// Classify a raw read for the per-channel summary counts.
pub fn classify_raw_teds(payload: &Value) -> RawTedsStatus {
    match payload {
        Value::Object(map) if map.contains_key("Error") => RawTedsStatus::Error,
        Value::Object(map) if !map.is_empty() => RawTedsStatus::Data,
        Value::Array(items) => {
            for entry in items {
                match entry {
                    Value::Object(map) if map.contains_key("Error") => return RawTedsStatus::Error,
                    Value::Object(map) => {
                        if let Some(rows) = map.get("Teds") {
                            if rows.as_array().is_some_and(|r| !r.is_empty()) {
                                return RawTedsStatus::Data;
                            }
                        } else if !map.is_empty() {
                            return RawTedsStatus::Data;
                        }
                    }
                    Value::Array(fields) if !fields.is_empty() => return RawTedsStatus::Data,
                    _ => {}
                }
            }
            RawTedsStatus::Empty
        }
        _ => RawTedsStatus::Empty,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

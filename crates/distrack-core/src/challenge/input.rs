//! Input normalization for challenges and log entries.
//!
//! Payloads coming from the presentation layer are loosely typed: every
//! field may be missing and distances may arrive as strings, numbers or
//! nulls. Nothing in here fails. Bad values collapse to defaults and the
//! result is a well-typed draft or patch the store can apply as-is.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_NAME: &str = "Untitled";
pub const DEFAULT_SPORT: &str = "general";

/// Coerce an arbitrary JSON value to a finite number.
///
/// Numbers pass through, numeric strings are parsed, booleans map to
/// 1/0. Anything else (including NaN and infinities) becomes 0.
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(0.0)
            }
        }
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Parse a calendar date.
///
/// Accepts `YYYY-MM-DD` and full timestamps (RFC 3339 or naive
/// `YYYY-MM-DDTHH:MM:SS`), keeping only the date part.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

pub(crate) fn deserialize_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_number(&value))
}

/// Lenient date field: anything [`parse_date`] rejects (blank strings,
/// nulls, numbers) reads as `None`.
pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().and_then(parse_date))
}

pub(crate) fn text_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s,
        _ => default.to_string(),
    }
}

fn non_negative(n: f64) -> f64 {
    n.max(0.0)
}

/// Loosely typed challenge payload, used for both create and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChallengeInput {
    pub name: Option<String>,
    pub sport: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub target_distance_km: Option<Value>,
    pub notes: Option<String>,
}

/// Fully defaulted fields for a new challenge.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeDraft {
    pub name: String,
    pub sport: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub target_distance_km: f64,
    pub notes: String,
}

/// Fields to merge onto an existing challenge. `None` means "keep".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChallengePatch {
    pub name: Option<String>,
    pub sport: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub target_distance_km: Option<f64>,
    pub notes: Option<String>,
}

impl ChallengePatch {
    pub fn is_empty(&self) -> bool {
        *self == ChallengePatch::default()
    }
}

impl ChallengeInput {
    /// Normalize into a create draft. Missing dates fall back to `today`
    /// (start) and to the start date (end).
    pub fn into_draft(self, today: NaiveDate) -> ChallengeDraft {
        let start_date = self
            .start_date
            .as_deref()
            .and_then(parse_date)
            .unwrap_or(today);
        let end_date = self
            .end_date
            .as_deref()
            .and_then(parse_date)
            .unwrap_or(start_date);

        ChallengeDraft {
            name: text_or(self.name, DEFAULT_NAME),
            sport: text_or(self.sport, DEFAULT_SPORT),
            start_date,
            end_date,
            target_distance_km: self
                .target_distance_km
                .as_ref()
                .map(coerce_number)
                .map(non_negative)
                .unwrap_or(0.0),
            notes: self.notes.unwrap_or_default(),
        }
    }

    /// Normalize into a patch. Present fields get the create defaults,
    /// dates that do not parse are dropped.
    pub fn into_patch(self) -> ChallengePatch {
        ChallengePatch {
            name: self.name.map(|n| text_or(Some(n), DEFAULT_NAME)),
            sport: self.sport.map(|s| text_or(Some(s), DEFAULT_SPORT)),
            start_date: self.start_date.as_deref().and_then(parse_date),
            end_date: self.end_date.as_deref().and_then(parse_date),
            target_distance_km: self
                .target_distance_km
                .as_ref()
                .map(coerce_number)
                .map(non_negative),
            notes: self.notes,
        }
    }
}

/// Loosely typed log payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogInput {
    #[serde(rename = "dateISO")]
    pub date_iso: Option<String>,
    pub km: Option<Value>,
    pub note: Option<String>,
}

/// Normalized fields for a new log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogDraft {
    pub date: NaiveDate,
    pub km: f64,
    pub note: String,
}

impl LogDraft {
    pub fn new(date: NaiveDate, km: f64, note: impl Into<String>) -> Self {
        Self {
            date,
            km: if km.is_finite() { km } else { 0.0 },
            note: note.into(),
        }
    }
}

impl LogInput {
    pub fn into_draft(self, today: NaiveDate) -> LogDraft {
        let date = self
            .date_iso
            .as_deref()
            .and_then(parse_date)
            .unwrap_or(today);
        let km = self.km.as_ref().map(coerce_number).unwrap_or(0.0);
        LogDraft::new(date, km, self.note.unwrap_or_default())
    }
}

//! Challenge and log entry types.
//!
//! Field names follow the persisted document (`startDate`, `distanceLog`,
//! `dateISO`, ...) so files written by earlier releases keep loading.

mod input;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use input::{
    coerce_number, parse_date, ChallengeDraft, ChallengeInput, ChallengePatch, LogDraft, LogInput,
    DEFAULT_NAME, DEFAULT_SPORT,
};

/// One recorded distance contribution toward a challenge.
///
/// Only read back as part of a [`Challenge`], which supplies the fallback
/// for an unreadable `dateISO`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub id: String,
    #[serde(rename = "dateISO")]
    pub date: NaiveDate,
    pub km: f64,
    pub note: String,
}

/// A goal of covering a target distance within an inclusive date window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredChallenge")]
pub struct Challenge {
    pub id: String,
    pub name: String,
    pub sport: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub target_distance_km: f64,
    pub distance_log: Vec<LogEntry>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// On-disk shape of a log entry. Earlier releases stored the raw form
/// input, so the date may be blank or missing.
#[derive(Deserialize)]
struct StoredLogEntry {
    id: String,
    #[serde(rename = "dateISO", default, deserialize_with = "input::deserialize_date")]
    date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "input::deserialize_number")]
    km: f64,
    #[serde(default)]
    note: String,
}

/// On-disk shape of a challenge, resolved into a [`Challenge`] with these
/// fallbacks: start date to the creation day, end date to the start date,
/// log dates to the start date.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredChallenge {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    sport: Option<String>,
    #[serde(default, deserialize_with = "input::deserialize_date")]
    start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "input::deserialize_date")]
    end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "input::deserialize_number")]
    target_distance_km: f64,
    #[serde(default)]
    distance_log: Vec<StoredLogEntry>,
    #[serde(default)]
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StoredChallenge> for Challenge {
    fn from(raw: StoredChallenge) -> Self {
        let start_date = raw.start_date.unwrap_or_else(|| raw.created_at.date_naive());
        let end_date = raw.end_date.unwrap_or(start_date);
        let distance_log = raw
            .distance_log
            .into_iter()
            .map(|l| LogEntry {
                id: l.id,
                date: l.date.unwrap_or(start_date),
                km: l.km,
                note: l.note,
            })
            .collect();
        Self {
            id: raw.id,
            name: input::text_or(raw.name, DEFAULT_NAME),
            sport: input::text_or(raw.sport, DEFAULT_SPORT),
            start_date,
            end_date,
            target_distance_km: raw.target_distance_km,
            distance_log,
            notes: raw.notes,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        }
    }
}

impl Challenge {
    /// Sum of all logged distances. Non-finite values count as zero.
    pub fn total_km(&self) -> f64 {
        self.distance_log
            .iter()
            .map(|l| if l.km.is_finite() { l.km } else { 0.0 })
            .sum()
    }

    pub fn log(&self, log_id: &str) -> Option<&LogEntry> {
        self.distance_log.iter().find(|l| l.id == log_id)
    }

    /// Log entries newest first, truncated to `limit`.
    ///
    /// Entries sharing a date keep their insertion order.
    pub fn recent_logs(&self, limit: usize) -> Vec<&LogEntry> {
        let mut logs: Vec<&LogEntry> = self.distance_log.iter().collect();
        logs.sort_by(|a, b| b.date.cmp(&a.date));
        logs.truncate(limit);
        logs
    }

    /// Apply a patch field by field. Absent fields are preserved.
    pub(crate) fn apply(&mut self, patch: ChallengePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(sport) = patch.sport {
            self.sport = sport;
        }
        if let Some(start) = patch.start_date {
            self.start_date = start;
        }
        if let Some(end) = patch.end_date {
            self.end_date = end;
        }
        if let Some(target) = patch.target_distance_km {
            self.target_distance_km = target;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
    }

    /// Refresh `updated_at`, never moving it before `created_at`.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}

/// The single persisted document: `{ "challenges": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub challenges: Vec<Challenge>,
}

impl StoreDocument {
    pub fn position(&self, id: &str) -> Option<usize> {
        self.challenges.iter().position(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }
}

//! Progress projection for a challenge.
//!
//! [`calculate`] derives time, pace and projection metrics from a
//! challenge snapshot and a reference instant. It is pure and never
//! fails: divisions by zero and degenerate date ranges collapse to 0 or
//! to an absent projection.
//!
//! Dates are taken at midnight on the same wall-clock timeline as `now`,
//! so a challenge starting today has `elapsed == 1` for the whole day.

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::challenge::Challenge;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Derived display metrics for one challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Inclusive day count of the challenge window.
    pub total_days: i64,
    /// Days from the start through `now`, inclusive. 0 before the start.
    pub elapsed: i64,
    /// Days left in the window.
    pub remaining: i64,
    /// Kilometres logged so far.
    pub done: f64,
    pub remaining_km: f64,
    /// Average daily distance the whole window requires.
    pub avg_needed_whole: f64,
    /// Average logged distance per elapsed day.
    pub current_pace: f64,
    /// Average daily distance still required. Equals `remaining_km` once
    /// no days are left.
    pub avg_needed_from_now: f64,
    /// Date the target is reached if `current_pace` holds.
    pub projected_finish: Option<NaiveDate>,
    /// Fraction of the target covered, in `[0, 1]`.
    pub pct: f64,
}

/// Coarse classification used by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStatus {
    NotStarted,
    Completed,
    OnTrack,
    Behind,
    Overdue,
}

impl ProgressStatus {
    pub fn label(self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => "not started",
            ProgressStatus::Completed => "completed",
            ProgressStatus::OnTrack => "on track",
            ProgressStatus::Behind => "behind",
            ProgressStatus::Overdue => "overdue",
        }
    }
}

impl Progress {
    pub fn status(&self) -> ProgressStatus {
        if self.remaining_km <= 0.0 && self.done > 0.0 {
            ProgressStatus::Completed
        } else if self.elapsed == 0 {
            ProgressStatus::NotStarted
        } else if self.remaining == 0 && self.remaining_km > 0.0 {
            ProgressStatus::Overdue
        } else if self.current_pace >= self.avg_needed_whole {
            ProgressStatus::OnTrack
        } else {
            ProgressStatus::Behind
        }
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

/// Inclusive day count from `start` through `end`, floored at 0.
pub fn total_days(start: NaiveDate, end: NaiveDate) -> i64 {
    ((end - start).num_days() + 1).max(0)
}

/// Whole days from `start` through `now`, inclusive. 0 if `now` precedes `start`.
pub fn elapsed_days(start: NaiveDate, now: NaiveDateTime) -> i64 {
    let secs = (now - midnight(start)).num_seconds();
    if secs < 0 {
        0
    } else {
        (secs as f64 / SECONDS_PER_DAY).floor() as i64 + 1
    }
}

fn projected_finish(
    target: f64,
    current_pace: f64,
    elapsed: i64,
    now: NaiveDateTime,
) -> Option<NaiveDate> {
    if current_pace <= 0.0 {
        return None;
    }
    let days_needed_total = target / current_pace;
    let extra = (days_needed_total - elapsed as f64).ceil().max(0.0);
    if !extra.is_finite() {
        return None;
    }
    now.date().checked_add_days(Days::new(extra as u64))
}

/// Compute progress metrics for `challenge` as of `now`.
pub fn calculate(challenge: &Challenge, now: NaiveDateTime) -> Progress {
    let target = if challenge.target_distance_km.is_finite() {
        challenge.target_distance_km
    } else {
        0.0
    };

    let total_days = total_days(challenge.start_date, challenge.end_date);
    let elapsed = elapsed_days(challenge.start_date, now);
    let remaining = (total_days - elapsed).max(0);

    let done = challenge.total_km();
    let remaining_km = (target - done).max(0.0);

    let avg_needed_whole = if total_days > 0 {
        target / total_days as f64
    } else {
        0.0
    };
    let current_pace = if elapsed > 0 {
        done / elapsed as f64
    } else {
        0.0
    };
    let avg_needed_from_now = if remaining > 0 {
        remaining_km / remaining as f64
    } else {
        remaining_km
    };

    let pct = if target == 0.0 {
        0.0
    } else {
        (done / target).clamp(0.0, 1.0)
    };

    Progress {
        total_days,
        elapsed,
        remaining,
        done,
        remaining_km,
        avg_needed_whole,
        current_pace,
        avg_needed_from_now,
        projected_finish: projected_finish(target, current_pace, elapsed, now),
        pct,
    }
}

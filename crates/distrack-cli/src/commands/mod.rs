pub mod challenge;
pub mod config;
pub mod log;
pub mod progress;
pub mod update;

use chrono::{Local, NaiveDate};
use distrack_core::storage::{open_backend, DocumentStore};
use distrack_core::{ChallengeStore, Config};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the challenge store on the configured backend.
pub fn open_store(config: &Config) -> Result<ChallengeStore<Box<dyn DocumentStore>>, Box<dyn std::error::Error>> {
    Ok(ChallengeStore::new(open_backend(config)?))
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a `--date`-style argument, reporting bad input instead of
/// silently falling back.
pub fn parse_date_arg(raw: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    distrack_core::challenge::parse_date(raw)
        .ok_or_else(|| format!("invalid date '{raw}', expected YYYY-MM-DD").into())
}

/// Format a distance with at most two fraction digits.
pub fn format_km(n: f64) -> String {
    let s = format!("{n:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

use clap::Subcommand;
use distrack_core::{Config, LogInput};
use serde_json::Value;

use super::{open_store, today, CliResult};

#[derive(Subcommand)]
pub enum LogAction {
    /// Record distance covered on a day
    Add {
        /// Challenge ID
        id: String,
        /// Distance in km
        km: String,
        /// Day of the activity (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Optional note
        #[arg(long)]
        note: Option<String>,
    },
    /// Remove a log entry
    Delete {
        /// Challenge ID
        id: String,
        /// Log entry ID
        log_id: String,
    },
    /// Show the most recent entries, newest first
    List {
        /// Challenge ID
        id: String,
        /// Maximum entries (defaults to display.recent_logs)
        #[arg(long)]
        limit: Option<usize>,
    },
}

pub fn run(action: LogAction) -> CliResult {
    let config = Config::load_or_default();
    let mut store = open_store(&config)?;

    match action {
        LogAction::Add { id, km, date, note } => {
            let draft = LogInput {
                date_iso: date,
                km: Some(Value::String(km)),
                note,
            }
            .into_draft(today());
            let entry = store.add_log(&id, draft)?;
            eprintln!("Logged {} km on {}", super::format_km(entry.km), entry.date);
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        LogAction::Delete { id, log_id } => {
            if store.delete_log(&id, &log_id)? {
                eprintln!("Log entry deleted: {log_id}");
            } else {
                eprintln!("No log entry with id {log_id}; nothing to delete");
            }
        }
        LogAction::List { id, limit } => {
            let challenge = store.get(&id)?;
            let limit = limit.unwrap_or(config.display.recent_logs as usize);
            let recent = challenge.recent_logs(limit);
            println!("{}", serde_json::to_string_pretty(&recent)?);
        }
    }
    Ok(())
}

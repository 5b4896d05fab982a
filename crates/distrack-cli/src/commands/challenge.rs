use chrono::Local;
use clap::Subcommand;
use distrack_core::progress::calculate;
use distrack_core::{ChallengeInput, Config};
use serde_json::{json, Value};

use super::{open_store, today, CliResult};

#[derive(Subcommand)]
pub enum ChallengeAction {
    /// List all challenges
    List,
    /// Show one challenge with its progress
    Show {
        /// Challenge ID
        id: String,
    },
    /// Create a new challenge
    Create {
        /// Challenge name
        #[arg(long)]
        name: Option<String>,
        /// Sport label (defaults to display.default_sport)
        #[arg(long)]
        sport: Option<String>,
        /// First day (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        start: Option<String>,
        /// Last day (YYYY-MM-DD, defaults to the start date)
        #[arg(long)]
        end: Option<String>,
        /// Target distance in km
        #[arg(long)]
        target: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Update fields of an existing challenge
    Update {
        /// Challenge ID
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        sport: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a challenge and its log
    Delete {
        /// Challenge ID
        id: String,
    },
}

fn input(
    name: Option<String>,
    sport: Option<String>,
    start: Option<String>,
    end: Option<String>,
    target: Option<String>,
    notes: Option<String>,
) -> ChallengeInput {
    ChallengeInput {
        name,
        sport,
        start_date: start,
        end_date: end,
        target_distance_km: target.map(Value::String),
        notes,
    }
}

pub fn run(action: ChallengeAction) -> CliResult {
    let config = Config::load_or_default();
    let mut store = open_store(&config)?;

    match action {
        ChallengeAction::List => {
            let challenges = store.list()?;
            if challenges.is_empty() {
                eprintln!("No challenges yet. Create one with `distrack challenge create`.");
            }
            println!("{}", serde_json::to_string_pretty(&challenges)?);
        }
        ChallengeAction::Show { id } => {
            let challenge = store.get(&id)?;
            let progress = calculate(&challenge, Local::now().naive_local());
            let out = json!({ "challenge": challenge, "progress": progress });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        ChallengeAction::Create {
            name,
            sport,
            start,
            end,
            target,
            notes,
        } => {
            let sport = sport.or_else(|| Some(config.display.default_sport.clone()));
            let draft = input(name, sport, start, end, target, notes).into_draft(today());
            let challenge = store.create(draft)?;
            eprintln!("Challenge created: {}", challenge.id);
            println!("{}", serde_json::to_string_pretty(&challenge)?);
        }
        ChallengeAction::Update {
            id,
            name,
            sport,
            start,
            end,
            target,
            notes,
        } => {
            let patch = input(name, sport, start, end, target, notes).into_patch();
            if patch.is_empty() {
                return Err("nothing to update; pass at least one field such as --name".into());
            }
            let challenge = store.update(&id, patch)?;
            eprintln!("Challenge updated: {}", challenge.id);
            println!("{}", serde_json::to_string_pretty(&challenge)?);
        }
        ChallengeAction::Delete { id } => {
            if store.delete(&id)? {
                eprintln!("Challenge deleted: {id}");
            } else {
                eprintln!("No challenge with id {id}; nothing to delete");
            }
        }
    }
    Ok(())
}

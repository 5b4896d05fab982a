use chrono::{Local, NaiveDateTime, NaiveTime};
use clap::Args;
use distrack_core::progress::calculate;
use distrack_core::{Challenge, Config, Progress};
use serde_json::json;

use super::{format_km, open_store, parse_date_arg, CliResult};

const BAR_WIDTH: usize = 20;

#[derive(Args)]
pub struct ProgressArgs {
    /// Challenge ID (all challenges when omitted)
    id: Option<String>,
    /// Evaluate as of this day (YYYY-MM-DD) instead of now
    #[arg(long)]
    on: Option<String>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

fn reference_instant(on: Option<&str>) -> Result<NaiveDateTime, Box<dyn std::error::Error>> {
    match on {
        Some(raw) => {
            let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN);
            Ok(parse_date_arg(raw)?.and_time(noon))
        }
        None => Ok(Local::now().naive_local()),
    }
}

fn bar(pct: f64) -> String {
    let filled = ((pct * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn line(label: &str, value: impl std::fmt::Display) -> String {
    format!("  {label:<18}{value}\n")
}

fn render(challenge: &Challenge, p: &Progress, recent: usize) -> String {
    let projected = p
        .projected_finish
        .map(|d| d.to_string())
        .unwrap_or_else(|| "—".to_string());

    let mut out = format!(
        "{} ({})  {} → {}\n",
        challenge.name, challenge.sport, challenge.start_date, challenge.end_date
    );
    out.push_str(&line("Target:", format!("{} km", format_km(challenge.target_distance_km))));
    out.push_str(&line("Done:", format!("{} km", format_km(p.done))));
    out.push_str(&line("Remaining:", format!("{} km", format_km(p.remaining_km))));
    out.push_str(&line(
        "Progress:",
        format!("{} {}%", bar(p.pct), format_km(p.pct * 100.0)),
    ));
    out.push_str(&line("Total days:", p.total_days));
    out.push_str(&line("Days left:", p.remaining));
    out.push_str(&line("Avg/day overall:", format!("{} km", format_km(p.avg_needed_whole))));
    out.push_str(&line("Avg/day from now:", format!("{} km", format_km(p.avg_needed_from_now))));
    out.push_str(&line("Current pace:", format!("{} km/day", format_km(p.current_pace))));
    out.push_str(&line("Projected finish:", projected));
    out.push_str(&line("Status:", p.status().label()));

    let logs = challenge.recent_logs(recent);
    if !logs.is_empty() {
        out.push_str("  Recent:\n");
        for log in logs {
            if log.note.is_empty() {
                out.push_str(&format!("    {}  {} km\n", log.date, format_km(log.km)));
            } else {
                out.push_str(&format!(
                    "    {}  {} km  {}\n",
                    log.date,
                    format_km(log.km),
                    log.note
                ));
            }
        }
    }
    out
}

pub fn run(args: ProgressArgs) -> CliResult {
    let config = Config::load_or_default();
    let store = open_store(&config)?;
    let now = reference_instant(args.on.as_deref())?;

    let challenges = match &args.id {
        Some(id) => vec![store.get(id)?],
        None => store.list()?,
    };

    if challenges.is_empty() {
        println!("No challenges yet. Create one with `distrack challenge create`.");
        return Ok(());
    }

    if args.json {
        let rows: Vec<_> = challenges
            .iter()
            .map(|c| json!({ "id": c.id, "name": c.name, "progress": calculate(c, now) }))
            .collect();
        let out = match (&args.id, rows.as_slice()) {
            (Some(_), [row]) => row.clone(),
            _ => serde_json::Value::Array(rows),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let recent = config.display.recent_logs as usize;
    let cards: Vec<String> = challenges
        .iter()
        .map(|c| render(c, &calculate(c, now), recent))
        .collect();
    print!("{}", cards.join("\n"));
    Ok(())
}

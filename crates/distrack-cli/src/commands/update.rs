use clap::Subcommand;
use distrack_core::events::UpdateStatusReceiver;
use distrack_core::storage::data_dir;
use distrack_core::{
    status_channel, Config, HttpUpdateChecker, RunMode, UpdateCheckResult, UpdateStatus, Updater,
};

use super::{format_km, CliResult};

#[derive(Subcommand)]
pub enum UpdateAction {
    /// Ask the release feed for a newer version
    Check,
    /// Download the newest release and launch its installer
    Install,
}

fn describe(status: &UpdateStatus) -> String {
    match status {
        UpdateStatus::Checking => "Checking for updates...".to_string(),
        UpdateStatus::Available { info } => format!("Update available: {}", info.version),
        UpdateStatus::Downloading {
            percent,
            transferred,
            total,
        } => format!("Downloading... {}% ({transferred}/{total} bytes)", format_km(*percent)),
        UpdateStatus::Downloaded { info } => format!("Downloaded {}", info.version),
        UpdateStatus::NotAvailable => "You are on the latest version".to_string(),
        UpdateStatus::Error { message } => format!("Update failed: {message}"),
        UpdateStatus::Restarting => "Launching installer...".to_string(),
    }
}

async fn print_statuses(mut rx: UpdateStatusReceiver) {
    while let Some(status) = rx.recv().await {
        eprintln!("{}", describe(&status));
    }
}

pub fn run(action: UpdateAction) -> CliResult {
    let config = Config::load_or_default();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(execute(action, config))
}

async fn execute(action: UpdateAction, config: Config) -> CliResult {
    let (tx, rx) = status_channel();
    let printer = tokio::spawn(print_statuses(rx));
    let updater = Updater::from_config(&config, RunMode::from_env(), env!("CARGO_PKG_VERSION"))?
        .with_status_sender(tx);

    let result = updater.check().await;
    let outcome = match action {
        UpdateAction::Check => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        UpdateAction::Install => install(&updater, result).await,
    };

    // Closing the sender lets the printer drain and finish.
    drop(updater);
    let _ = printer.await;
    outcome
}

async fn install(updater: &Updater<HttpUpdateChecker>, result: UpdateCheckResult) -> CliResult {
    if let Some(error) = result.error {
        return Err(error.into());
    }
    if let Some(reason) = result.reason {
        eprintln!("Update skipped: {reason}");
        return Ok(());
    }
    match result.info {
        Some(info) if updater.is_newer(&info)? => {
            let dir = data_dir()?.join("updates");
            let installer = updater.download(&info, &dir).await?;
            updater.restart(&installer)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

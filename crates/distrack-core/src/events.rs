//! Update status events and the channel that carries them.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::updater::UpdateInfo;

/// Every step of an update check or download produces a status.
/// The updater is the only producer; the presentation layer consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum UpdateStatus {
    Checking,
    Available {
        info: UpdateInfo,
    },
    Downloading {
        percent: f64,
        transferred: u64,
        total: u64,
    },
    Downloaded {
        info: UpdateInfo,
    },
    /// Already on the latest release.
    #[serde(rename = "none")]
    NotAvailable,
    Error {
        message: String,
    },
    Restarting,
}

pub type UpdateStatusSender = mpsc::UnboundedSender<UpdateStatus>;
pub type UpdateStatusReceiver = mpsc::UnboundedReceiver<UpdateStatus>;

/// Create the status channel between the updater and its consumer.
pub fn status_channel() -> (UpdateStatusSender, UpdateStatusReceiver) {
    mpsc::unbounded_channel()
}

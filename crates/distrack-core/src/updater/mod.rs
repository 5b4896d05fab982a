//! Update checks and installer downloads.
//!
//! [`Updater`] wraps an [`UpdateChecker`] (normally [`HttpUpdateChecker`])
//! and reports every step on an optional [`UpdateStatusSender`]. In
//! development mode it never touches the network.

mod http;

use std::future::Future;
use std::path::{Path, PathBuf};

use reqwest::Client;
use semver::Version;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use url::Url;

pub use http::HttpUpdateChecker;

use crate::error::UpdateError;
use crate::events::{UpdateStatus, UpdateStatusSender};
use crate::storage::{Config, RunMode};

/// A published release as described by the release manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    pub version: String,
    /// Installer download URL.
    pub url: String,
    /// Hex SHA-256 of the installer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

impl UpdateInfo {
    pub fn parsed_version(&self) -> Result<Version, UpdateError> {
        Version::parse(self.version.trim_start_matches('v')).map_err(|source| {
            UpdateError::Version {
                version: self.version.clone(),
                source,
            }
        })
    }

    pub(crate) fn validate(&self) -> Result<(), UpdateError> {
        self.parsed_version()?;
        if self.url.trim().is_empty() {
            return Err(UpdateError::Manifest("missing installer url".into()));
        }
        Ok(())
    }
}

/// Outcome of [`Updater::check`], shaped for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateCheckResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<UpdateInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpdateCheckResult {
    fn found(info: UpdateInfo) -> Self {
        Self {
            ok: true,
            info: Some(info),
            ..Default::default()
        }
    }

    fn skipped(reason: &str) -> Self {
        Self {
            ok: false,
            reason: Some(reason.to_string()),
            ..Default::default()
        }
    }

    fn failed(error: String) -> Self {
        Self {
            ok: false,
            error: Some(error),
            ..Default::default()
        }
    }
}

/// Source of the latest published release.
pub trait UpdateChecker {
    fn latest(&self) -> impl Future<Output = Result<UpdateInfo, UpdateError>> + Send;
}

/// Drives update checks and downloads, reporting progress as [`UpdateStatus`].
pub struct Updater<C: UpdateChecker> {
    checker: Option<C>,
    mode: RunMode,
    current: Version,
    status: Option<UpdateStatusSender>,
    client: Client,
}

impl Updater<HttpUpdateChecker> {
    /// Build an updater from the `[updates]` config section.
    ///
    /// A blank feed or `enabled = false` yields an updater whose checks
    /// report `not-configured`.
    ///
    /// # Errors
    /// Returns an error if the feed URL or `current_version` is malformed.
    pub fn from_config(
        config: &Config,
        mode: RunMode,
        current_version: &str,
    ) -> Result<Self, UpdateError> {
        let checker = if config.updates.enabled && !config.updates.feed_url.trim().is_empty() {
            Some(HttpUpdateChecker::new(&config.updates.feed_url)?)
        } else {
            None
        };
        Self::new(checker, mode, current_version)
    }
}

impl<C: UpdateChecker> Updater<C> {
    /// # Errors
    /// Returns an error if `current_version` is not semver.
    pub fn new(checker: Option<C>, mode: RunMode, current_version: &str) -> Result<Self, UpdateError> {
        let current = Version::parse(current_version).map_err(|source| UpdateError::Version {
            version: current_version.to_string(),
            source,
        })?;
        Ok(Self {
            checker,
            mode,
            current,
            status: None,
            client: Client::new(),
        })
    }

    /// Report statuses on `tx`.
    pub fn with_status_sender(mut self, tx: UpdateStatusSender) -> Self {
        self.status = Some(tx);
        self
    }

    fn emit(&self, status: UpdateStatus) {
        tracing::debug!(?status, "update status");
        if let Some(tx) = &self.status {
            // A consumer that went away is not an error.
            let _ = tx.send(status);
        }
    }

    /// Whether `info` is strictly newer than the running version.
    pub fn is_newer(&self, info: &UpdateInfo) -> Result<bool, UpdateError> {
        Ok(info.parsed_version()? > self.current)
    }

    /// Ask the checker for the latest release.
    ///
    /// Never fails: problems are reported in the result and as an
    /// [`UpdateStatus::Error`].
    pub async fn check(&self) -> UpdateCheckResult {
        if self.mode.is_dev() {
            tracing::info!("skipping update check in development mode");
            return UpdateCheckResult::skipped("dev");
        }
        let Some(checker) = &self.checker else {
            return UpdateCheckResult::skipped("not-configured");
        };

        self.emit(UpdateStatus::Checking);
        let outcome = match checker.latest().await {
            Ok(info) => self.is_newer(&info).map(|newer| (info, newer)),
            Err(e) => Err(e),
        };

        match outcome {
            Ok((info, true)) => {
                tracing::info!(version = %info.version, "update available");
                self.emit(UpdateStatus::Available { info: info.clone() });
                UpdateCheckResult::found(info)
            }
            Ok((info, false)) => {
                tracing::info!(current = %self.current, "no update available");
                self.emit(UpdateStatus::NotAvailable);
                UpdateCheckResult::found(info)
            }
            Err(e) => {
                tracing::error!(error = %e, "update check failed");
                self.emit(UpdateStatus::Error {
                    message: e.to_string(),
                });
                UpdateCheckResult::failed(e.to_string())
            }
        }
    }

    /// Download the installer for `info` into `dir`.
    ///
    /// Reports [`UpdateStatus::Downloading`] per received chunk and
    /// [`UpdateStatus::Downloaded`] once the file is complete and, when the
    /// manifest carries one, its SHA-256 matches. A mismatching file is
    /// removed.
    pub async fn download(&self, info: &UpdateInfo, dir: &Path) -> Result<PathBuf, UpdateError> {
        match self.fetch_installer(info, dir).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), "update downloaded");
                self.emit(UpdateStatus::Downloaded { info: info.clone() });
                Ok(path)
            }
            Err(e) => {
                tracing::error!(error = %e, "update download failed");
                self.emit(UpdateStatus::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn fetch_installer(&self, info: &UpdateInfo, dir: &Path) -> Result<PathBuf, UpdateError> {
        let url = Url::parse(&info.url).map_err(|source| UpdateError::InvalidUrl {
            url: info.url.clone(),
            source,
        })?;
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("distrack-{}", info.version));

        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(UpdateError::Status {
                status: resp.status().as_u16(),
            });
        }
        let total = resp.content_length().unwrap_or(0);

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(file_name);
        let file = tokio::fs::File::create(&path).await?;

        match self.stream_to(resp, file, total, info.sha256.as_deref()).await {
            Ok(()) => Ok(path),
            Err(e) => {
                // Never leave a partial or unverified installer behind.
                let _ = tokio::fs::remove_file(&path).await;
                Err(e)
            }
        }
    }

    async fn stream_to(
        &self,
        mut resp: reqwest::Response,
        mut file: tokio::fs::File,
        total: u64,
        expected: Option<&str>,
    ) -> Result<(), UpdateError> {
        let mut hasher = Sha256::new();
        let mut transferred: u64 = 0;

        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk).await?;
            hasher.update(&chunk);
            transferred += chunk.len() as u64;
            let percent = if total > 0 {
                (transferred as f64 / total as f64 * 100.0).min(100.0)
            } else {
                0.0
            };
            self.emit(UpdateStatus::Downloading {
                percent,
                transferred,
                total,
            });
        }
        file.sync_all().await?;

        let actual = hex::encode(hasher.finalize());
        if let Some(expected) = expected {
            if !expected.trim().eq_ignore_ascii_case(&actual) {
                return Err(UpdateError::Checksum {
                    expected: expected.to_string(),
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Announce the restart and hand the installer to the OS.
    ///
    /// # Errors
    /// Returns an error if the installer cannot be launched.
    pub fn restart(&self, installer: &Path) -> Result<(), UpdateError> {
        self.emit(UpdateStatus::Restarting);
        tracing::info!(installer = %installer.display(), "launching installer");
        open::that(installer)?;
        Ok(())
    }
}

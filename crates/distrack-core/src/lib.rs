//! # Distrack Core Library
//!
//! This library provides the core logic for Distrack, a tracker for
//! distance goals ("ride 1315 km in 96 days"). The CLI binary and any GUI
//! shell are thin layers over the same core library.
//!
//! ## Architecture
//!
//! - **Challenges**: challenge and log entry types plus the normalization
//!   step that turns loose user input into well-typed drafts
//! - **Progress**: pure projection of pace, daily targets and finish date
//! - **Store**: CRUD over the challenge collection, persisted as one
//!   document through a pluggable [`DocumentStore`]
//! - **Updater**: release checks with status reporting over a channel
//!
//! ## Key Components
//!
//! - [`ChallengeStore`]: challenge and log mutations
//! - [`progress::calculate`]: derived display metrics
//! - [`Config`]: application configuration management
//! - [`Updater`]: update checks and installer downloads

pub mod challenge;
pub mod error;
pub mod events;
pub mod progress;
pub mod storage;
pub mod store;
pub mod updater;

pub use challenge::{
    Challenge, ChallengeDraft, ChallengeInput, ChallengePatch, LogDraft, LogEntry, LogInput,
    StoreDocument,
};
pub use error::{ConfigError, StorageError, StoreError, UpdateError};
pub use events::{status_channel, UpdateStatus};
pub use progress::{Progress, ProgressStatus};
pub use storage::{Config, DocumentStore, JsonFileStore, MemoryStore, RunMode};
pub use store::ChallengeStore;
pub use updater::{HttpUpdateChecker, UpdateCheckResult, UpdateChecker, UpdateInfo, Updater};

//! Persistence for the challenge document.
//!
//! The whole collection lives in one serialized document that is read and
//! written in full. [`DocumentStore`] is the seam: the store never knows
//! whether the bytes end up in a JSON file, a SQLite kv row or memory.

mod config;
pub mod database;
pub mod json_file;

pub use config::{Config, DisplayConfig, RunMode, StorageBackend, StorageConfig, UpdatesConfig};
pub use database::Database;
pub use json_file::JsonFileStore;

use std::path::PathBuf;

use crate::challenge::StoreDocument;
use crate::error::StorageError;

/// Default name of the persisted document.
pub const DOCUMENT_NAME: &str = "challenges";

/// Read/write access to the single persisted document.
pub trait DocumentStore {
    /// Load the document, or the empty default when none was saved yet.
    fn load(&self) -> Result<StoreDocument, StorageError>;

    /// Replace the persisted document.
    fn save(&mut self, doc: &StoreDocument) -> Result<(), StorageError>;
}

/// In-memory document, for tests and throwaway sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    doc: Option<StoreDocument>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: StoreDocument) -> Self {
        Self {
            doc: Some(doc),
            saves: 0,
        }
    }

    /// Number of times the document was written.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self) -> Result<StoreDocument, StorageError> {
        Ok(self.doc.clone().unwrap_or_default())
    }

    fn save(&mut self, doc: &StoreDocument) -> Result<(), StorageError> {
        self.doc = Some(doc.clone());
        self.saves += 1;
        Ok(())
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for Box<S> {
    fn load(&self) -> Result<StoreDocument, StorageError> {
        (**self).load()
    }

    fn save(&mut self, doc: &StoreDocument) -> Result<(), StorageError> {
        (**self).save(doc)
    }
}

/// Returns the data directory, creating it if needed.
///
/// `DISTRACK_DATA_DIR` wins when set. Otherwise `~/.config/distrack/`, or
/// `~/.config/distrack-dev/` when `DISTRACK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("DISTRACK_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            match RunMode::from_env() {
                RunMode::Development => base_dir.join("distrack-dev"),
                RunMode::Production => base_dir.join("distrack"),
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Open the backend selected in `config`.
///
/// # Errors
/// Returns an error if the data directory or database cannot be opened.
pub fn open_backend(config: &Config) -> Result<Box<dyn DocumentStore>, StorageError> {
    let dir = data_dir()?;
    let name = config.storage.document_name.as_str();
    let store: Box<dyn DocumentStore> = match config.storage.backend {
        StorageBackend::Json => Box::new(JsonFileStore::in_dir(&dir, name)),
        StorageBackend::Sqlite => Box::new(Database::open_at(&dir.join("distrack.db"), name)?),
    };
    tracing::debug!(backend = ?config.storage.backend, dir = %dir.display(), "opened document store");
    Ok(store)
}

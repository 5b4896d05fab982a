//! SQLite document backend.
//!
//! Each named document is one row of the `documents` table holding the
//! serialized JSON body. Saving replaces the row and bumps its revision,
//! so several document names can share one database file.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::DocumentStore;
use crate::challenge::StoreDocument;
use crate::error::StorageError;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    name       TEXT PRIMARY KEY,
    body       TEXT NOT NULL,
    revision   INTEGER NOT NULL DEFAULT 0,
    saved_at   TEXT NOT NULL
);";

/// SQLite database holding one named challenge document.
pub struct Database {
    conn: Connection,
    name: String,
}

impl Database {
    /// Open (or create) the database file at `path` and bind it to the
    /// document called `name`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or its schema
    /// cannot be created.
    pub fn open_at(path: &Path, name: &str) -> Result<Self, StorageError> {
        Self::with_connection(Connection::open(path)?, name)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory(name: &str) -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?, name)
    }

    fn with_connection(conn: Connection, name: &str) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            name: name.to_string(),
        })
    }

    /// Number of saves recorded for the bound document. 0 if it was never saved.
    pub fn revision(&self) -> Result<i64, StorageError> {
        let rev = self
            .conn
            .query_row(
                "SELECT revision FROM documents WHERE name = ?1",
                params![self.name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(rev.unwrap_or(0))
    }

    fn read_body(&self) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT body FROM documents WHERE name = ?1",
                params![self.name],
                |row| row.get(0),
            )
            .optional()
    }

    fn write_body(&self, body: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO documents (name, body, revision, saved_at) VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(name) DO UPDATE SET
                body = excluded.body,
                revision = documents.revision + 1,
                saved_at = excluded.saved_at",
            params![self.name, body, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

impl DocumentStore for Database {
    fn load(&self) -> Result<StoreDocument, StorageError> {
        match self.read_body()? {
            Some(body) => serde_json::from_str(&body).map_err(|source| StorageError::Corrupt {
                location: format!("sqlite:documents/{}", self.name),
                source,
            }),
            None => Ok(StoreDocument::default()),
        }
    }

    fn save(&mut self, doc: &StoreDocument) -> Result<(), StorageError> {
        let body = serde_json::to_string(doc)?;
        self.write_body(&body)?;
        tracing::trace!(name = %self.name, "saved document to sqlite");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_database_loads_default_document() {
        let db = Database::open_memory("challenges").unwrap();
        assert!(db.load().unwrap().challenges.is_empty());
        assert_eq!(db.revision().unwrap(), 0);
    }

    #[test]
    fn saves_bump_revision() {
        let mut db = Database::open_memory("challenges").unwrap();
        db.save(&StoreDocument::default()).unwrap();
        db.save(&StoreDocument::default()).unwrap();
        assert_eq!(db.revision().unwrap(), 2);
    }

    #[test]
    fn documents_are_isolated_by_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("distrack.db");
        {
            let mut db = Database::open_at(&path, "challenges").unwrap();
            db.save(&StoreDocument::default()).unwrap();
        }
        let other = Database::open_at(&path, "archive").unwrap();
        assert_eq!(other.revision().unwrap(), 0);
        let db = Database::open_at(&path, "challenges").unwrap();
        assert_eq!(db.load().unwrap(), StoreDocument::default());
        assert_eq!(db.revision().unwrap(), 1);
    }

    #[test]
    fn corrupt_row_is_an_error() {
        let db = Database::open_memory("challenges").unwrap();
        db.write_body("[oops").unwrap();
        assert!(matches!(db.load(), Err(StorageError::Corrupt { .. })));
    }
}

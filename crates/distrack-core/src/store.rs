//! Challenge collection with CRUD operations.
//!
//! Every mutating call is a full load → modify → save cycle against the
//! backing [`DocumentStore`]. A failed lookup returns before anything is
//! written, so the persisted document is only touched on success.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::challenge::{Challenge, ChallengeDraft, ChallengePatch, LogDraft, LogEntry, StoreDocument};
use crate::error::StoreError;
use crate::storage::DocumentStore;

/// Source of the current instant.
pub type Clock = fn() -> DateTime<Utc>;

/// Owns the challenge collection and its persistence.
pub struct ChallengeStore<S: DocumentStore> {
    backend: S,
    clock: Clock,
}

fn fresh_id(taken: impl Fn(&str) -> bool) -> String {
    loop {
        let id = Uuid::new_v4().to_string();
        if !taken(&id) {
            return id;
        }
    }
}

impl<S: DocumentStore> ChallengeStore<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            clock: Utc::now,
        }
    }

    /// Replace the clock used for timestamps.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Run `f` on the challenge `id` and persist the document.
    ///
    /// The challenge is touched before `f` runs, so `f` sees the new
    /// `updated_at`.
    fn modify<T>(
        &mut self,
        id: &str,
        f: impl FnOnce(&mut Challenge) -> T,
    ) -> Result<T, StoreError> {
        let mut doc = self.backend.load()?;
        let idx = doc.position(id).ok_or_else(|| StoreError::not_found(id))?;
        let challenge = &mut doc.challenges[idx];
        challenge.touch(self.now());
        let out = f(challenge);
        self.backend.save(&doc)?;
        Ok(out)
    }

    /// Return the full collection.
    pub fn list(&self) -> Result<Vec<Challenge>, StoreError> {
        Ok(self.backend.load()?.challenges)
    }

    /// Return a single challenge.
    pub fn get(&self, id: &str) -> Result<Challenge, StoreError> {
        self.backend
            .load()?
            .challenges
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found(id))
    }

    /// Create a challenge from a normalized draft.
    pub fn create(&mut self, draft: ChallengeDraft) -> Result<Challenge, StoreError> {
        let mut doc: StoreDocument = self.backend.load()?;
        let now = self.now();
        let challenge = Challenge {
            id: fresh_id(|id| doc.contains(id)),
            name: draft.name,
            sport: draft.sport,
            start_date: draft.start_date,
            end_date: draft.end_date,
            target_distance_km: draft.target_distance_km,
            distance_log: Vec::new(),
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        };
        doc.challenges.push(challenge.clone());
        self.backend.save(&doc)?;
        tracing::info!(id = %challenge.id, name = %challenge.name, "challenge created");
        Ok(challenge)
    }

    /// Merge `patch` onto challenge `id`.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if no challenge has that id.
    pub fn update(&mut self, id: &str, patch: ChallengePatch) -> Result<Challenge, StoreError> {
        let challenge = self.modify(id, |ch| {
            ch.apply(patch);
            ch.clone()
        })?;
        tracing::debug!(id, "challenge updated");
        Ok(challenge)
    }

    /// Remove challenge `id` together with its log.
    ///
    /// Deleting an unknown id is a no-op. Returns whether anything was removed.
    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut doc = self.backend.load()?;
        let before = doc.challenges.len();
        doc.challenges.retain(|c| c.id != id);
        let removed = doc.challenges.len() != before;
        self.backend.save(&doc)?;
        if removed {
            tracing::info!(id, "challenge deleted");
        }
        Ok(removed)
    }

    /// Append a log entry to challenge `id`.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if no challenge has that id.
    pub fn add_log(&mut self, id: &str, draft: LogDraft) -> Result<LogEntry, StoreError> {
        let entry = self.modify(id, |ch| {
            let entry = LogEntry {
                id: fresh_id(|log_id| ch.log(log_id).is_some()),
                date: draft.date,
                km: draft.km,
                note: draft.note,
            };
            ch.distance_log.push(entry.clone());
            entry
        })?;
        tracing::debug!(challenge = id, log = %entry.id, km = entry.km, "log entry added");
        Ok(entry)
    }

    /// Remove log entry `log_id` from challenge `id`.
    ///
    /// An unknown `log_id` is a no-op, but `updated_at` is still refreshed.
    /// Returns whether an entry was removed.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if no challenge has that id.
    pub fn delete_log(&mut self, id: &str, log_id: &str) -> Result<bool, StoreError> {
        let removed = self.modify(id, |ch| {
            let before = ch.distance_log.len();
            ch.distance_log.retain(|l| l.id != log_id);
            ch.distance_log.len() != before
        })?;
        tracing::debug!(challenge = id, log = log_id, removed, "log entry deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::ChallengeInput;
    use crate::storage::MemoryStore;
    use chrono::{NaiveDate, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn later_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, 7, 30, 0).unwrap()
    }

    fn draft(name: &str) -> ChallengeDraft {
        ChallengeInput {
            name: Some(name.into()),
            start_date: Some("2024-03-01".into()),
            end_date: Some("2024-06-04".into()),
            target_distance_km: Some(serde_json::json!(1315)),
            ..Default::default()
        }
        .into_draft(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    fn store() -> ChallengeStore<MemoryStore> {
        ChallengeStore::new(MemoryStore::new()).with_clock(fixed_now)
    }

    #[test]
    fn create_assigns_id_and_timestamps() {
        let mut store = store();
        let ch = store.create(draft("Spring")).unwrap();
        assert!(!ch.id.is_empty());
        assert_eq!(ch.created_at, fixed_now());
        assert_eq!(ch.updated_at, ch.created_at);
        assert!(ch.distance_log.is_empty());
        assert_eq!(store.list().unwrap(), vec![ch]);
        assert_eq!(store.backend().saves(), 1);
    }

    #[test]
    fn ids_are_unique() {
        let mut store = store();
        let a = store.create(draft("a")).unwrap();
        let b = store.create(draft("b")).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn update_refreshes_updated_at() {
        let mut store = store();
        let ch = store.create(draft("Spring")).unwrap();
        let mut store = store.with_clock(later_now);
        let patch = ChallengePatch {
            notes: Some("hilly".into()),
            ..Default::default()
        };
        let updated = store.update(&ch.id, patch).unwrap();
        assert_eq!(updated.notes, "hilly");
        assert_eq!(updated.name, "Spring");
        assert_eq!(updated.created_at, fixed_now());
        assert_eq!(updated.updated_at, later_now());
    }

    #[test]
    fn backwards_clock_keeps_updated_after_created() {
        let mut store = ChallengeStore::new(MemoryStore::new()).with_clock(later_now);
        let ch = store.create(draft("x")).unwrap();
        let mut store = store.with_clock(fixed_now);
        let entry = store
            .add_log(&ch.id, LogDraft::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 5.0, ""))
            .unwrap();
        let ch = store.get(&ch.id).unwrap();
        assert!(ch.updated_at >= ch.created_at);
        assert_eq!(ch.log(&entry.id), Some(&entry));
    }

    #[test]
    fn not_found_leaves_document_unwritten() {
        let mut store = store();
        store.create(draft("a")).unwrap();
        let saves = store.backend().saves();

        assert!(store.update("nope", ChallengePatch::default()).unwrap_err().is_not_found());
        assert!(store
            .add_log("nope", LogDraft::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 1.0, ""))
            .unwrap_err()
            .is_not_found());
        assert!(store.delete_log("nope", "x").unwrap_err().is_not_found());
        assert!(store.get("nope").unwrap_err().is_not_found());
        assert_eq!(store.backend().saves(), saves);
    }

    #[test]
    fn delete_is_idempotent() {
        let mut store = store();
        let ch = store.create(draft("a")).unwrap();
        assert!(store.delete(&ch.id).unwrap());
        assert!(!store.delete(&ch.id).unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn delete_unknown_log_is_noop_but_touches() {
        let mut store = store();
        let ch = store.create(draft("a")).unwrap();
        let mut store = store.with_clock(later_now);
        assert!(!store.delete_log(&ch.id, "missing").unwrap());
        assert_eq!(store.get(&ch.id).unwrap().updated_at, later_now());
    }

    #[test]
    fn operates_on_previously_saved_document() {
        let mut seed = ChallengeStore::new(MemoryStore::new()).with_clock(fixed_now);
        let ch = seed.create(draft("Imported")).unwrap();
        let doc = seed.backend().load().unwrap();

        let mut store = ChallengeStore::new(MemoryStore::with_document(doc)).with_clock(later_now);
        assert_eq!(store.get(&ch.id).unwrap().name, "Imported");
        assert_eq!(store.backend().saves(), 0);

        store
            .add_log(&ch.id, LogDraft::new(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(), 42.0, ""))
            .unwrap();
        assert_eq!(store.get(&ch.id).unwrap().total_km(), 42.0);
        assert_eq!(store.backend().saves(), 1);
    }
}

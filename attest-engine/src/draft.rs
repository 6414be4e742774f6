use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use attest_api::types::Phase;

use crate::error::DraftError;
use crate::response::{PhaseStatus, ResponseSet};

/// Composite key scoping one persisted draft
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DraftKey {
    pub system_id: i64,
    pub user_id: i64,
    pub diagnosis_round: u32,
    pub phase: Phase,
}

impl DraftKey {
    pub fn new(system_id: i64, user_id: i64, diagnosis_round: u32, phase: Phase) -> Self {
        DraftKey {
            system_id,
            user_id,
            diagnosis_round,
            phase,
        }
    }

    /// String form shared with the browser build:
    /// `<phase>_responses_<systemId>_<userId>_<round>`
    pub fn storage_key(&self) -> String {
        format!(
            "{}_responses_{}_{}_{}",
            self.phase.as_str(),
            self.system_id,
            self.user_id,
            self.diagnosis_round
        )
    }
}

/// Raw persisted draft: the serialized response map plus its save time
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDraft {
    pub payload: String,
    pub saved_at: DateTime<Utc>,
}

impl StoredDraft {
    /// Serialize a response map for storage
    pub fn encode<S: PhaseStatus>(
        responses: &ResponseSet<S>,
        saved_at: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        Ok(StoredDraft {
            payload: serde_json::to_string(responses)?,
            saved_at,
        })
    }

    /// Decode the stored payload, treating a corrupt payload as absent
    pub fn decode<S: PhaseStatus>(&self, key: &DraftKey) -> Option<ResponseSet<S>> {
        match serde_json::from_str(&self.payload) {
            Ok(responses) => Some(responses),
            Err(err) => {
                tracing::warn!(
                    key = %key.storage_key(),
                    error = %err,
                    "stored draft is corrupt, treating as empty"
                );
                None
            }
        }
    }
}

/// Key-value persistence port for in-progress drafts
///
/// One slot per (system, user, round, phase). Saves are full overwrites,
/// one per edit. A failing store never fails a session: callers treat
/// every error here as loss of reload survival, nothing more.
pub trait DraftStore: Send + Sync {
    fn load(&self, key: &DraftKey) -> Result<Option<StoredDraft>, DraftError>;
    fn save(&self, key: &DraftKey, draft: &StoredDraft) -> Result<(), DraftError>;
    fn clear(&self, key: &DraftKey) -> Result<(), DraftError>;
}

/// In-memory store used by tests and dry runs
#[derive(Default)]
pub struct MemoryDraftStore {
    drafts: Mutex<HashMap<String, StoredDraft>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for MemoryDraftStore {
    fn load(&self, key: &DraftKey) -> Result<Option<StoredDraft>, DraftError> {
        let drafts = self
            .drafts
            .lock()
            .map_err(|e| DraftError::storage(format!("Failed to acquire draft lock: {e}")))?;
        Ok(drafts.get(&key.storage_key()).cloned())
    }

    fn save(&self, key: &DraftKey, draft: &StoredDraft) -> Result<(), DraftError> {
        let mut drafts = self
            .drafts
            .lock()
            .map_err(|e| DraftError::storage(format!("Failed to acquire draft lock: {e}")))?;
        drafts.insert(key.storage_key(), draft.clone());
        Ok(())
    }

    fn clear(&self, key: &DraftKey) -> Result<(), DraftError> {
        let mut drafts = self
            .drafts
            .lock()
            .map_err(|e| DraftError::storage(format!("Failed to acquire draft lock: {e}")))?;
        drafts.remove(&key.storage_key());
        Ok(())
    }
}

/// On-disk store backed by SQLite
///
/// Fills the role browser storage fills for the web build: drafts survive
/// process restarts and are addressed by the same string key form.
pub struct SqliteDraftStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteDraftStore {
    /// Open (or create) the draft database at the given path
    pub fn open(db_path: &Path) -> Result<Self, DraftError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DraftError::storage(format!("Failed to create draft directory: {e}"))
            })?;
        }

        let conn = Connection::open(db_path)?;
        let store = SqliteDraftStore {
            connection: Arc::new(Mutex::new(conn)),
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// Volatile store, handy for tests
    pub fn in_memory() -> Result<Self, DraftError> {
        let conn = Connection::open_in_memory()?;
        let store = SqliteDraftStore {
            connection: Arc::new(Mutex::new(conn)),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<(), DraftError> {
        let conn = self.lock()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS drafts (
                storage_key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                saved_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DraftError> {
        self.connection
            .lock()
            .map_err(|e| DraftError::storage(format!("Failed to acquire database lock: {e}")))
    }
}

impl DraftStore for SqliteDraftStore {
    fn load(&self, key: &DraftKey) -> Result<Option<StoredDraft>, DraftError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT payload, saved_at FROM drafts WHERE storage_key = ?",
                params![key.storage_key()],
                |row| {
                    let payload: String = row.get(0)?;
                    let saved_at: String = row.get(1)?;
                    Ok((payload, saved_at))
                },
            )
            .optional()?;

        match row {
            Some((payload, saved_at)) => match DateTime::parse_from_rfc3339(&saved_at) {
                Ok(saved_at) => Ok(Some(StoredDraft {
                    payload,
                    saved_at: saved_at.with_timezone(&Utc),
                })),
                Err(err) => {
                    tracing::warn!(
                        key = %key.storage_key(),
                        error = %err,
                        "draft timestamp is corrupt, treating draft as empty"
                    );
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    fn save(&self, key: &DraftKey, draft: &StoredDraft) -> Result<(), DraftError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO drafts (storage_key, payload, saved_at) VALUES (?, ?, ?)",
            params![
                key.storage_key(),
                draft.payload,
                draft.saved_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn clear(&self, key: &DraftKey) -> Result<(), DraftError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM drafts WHERE storage_key = ?",
            params![key.storage_key()],
        )?;
        Ok(())
    }
}

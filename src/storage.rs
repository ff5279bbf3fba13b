//! Session persistence seam and the in-memory reference store.
//!
//! All mutations are whole-record upserts apart from [`SessionStore::touch`];
//! the store's per-key atomicity is the only coordination primitive the
//! guard relies on.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Persisted shape of a session. The field names are the wire contract
/// other tooling may inspect in the backing store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRecord {
    pub access_token: String,
    pub refresh_token: String,
    /// Epoch milliseconds of the last successful validation or issuance.
    /// Monotonically non-decreasing while the record exists.
    pub last_active: i64,
}

/// Key-value persistence of session records keyed by session id, with
/// per-key expiry.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Upsert the whole record and reset its absolute expiry to `ttl` from
    /// now.
    async fn write(&self, session_id: &str, record: &SessionRecord, ttl: Duration) -> Result<()>;

    /// Read the record; `None` when absent or expired.
    async fn read(&self, session_id: &str) -> Result<Option<SessionRecord>>;

    /// Update `last_active` in place without extending the record expiry.
    /// A missing record is left missing.
    async fn touch(&self, session_id: &str, last_active: i64) -> Result<()>;

    /// Remove the record immediately; deleting a missing key is not an
    /// error.
    async fn delete(&self, session_id: &str) -> Result<()>;
}

struct MemoryEntry {
    record: SessionRecord,
    expires_at: Instant,
}

/// In-memory store for tests and single-process deployments. Expiry is
/// enforced lazily on read.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn write(&self, session_id: &str, record: &SessionRecord, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            session_id.to_string(),
            MemoryEntry {
                record: record.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn read(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let mut entries = self.entries.lock().await;
        let expired = entries
            .get(session_id)
            .is_some_and(|entry| entry.expires_at <= Instant::now());
        if expired {
            entries.remove(session_id);
            return Ok(None);
        }
        Ok(entries.get(session_id).map(|entry| entry.record.clone()))
    }

    async fn touch(&self, session_id: &str, last_active: i64) -> Result<()> {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(session_id) {
            entry.record.last_active = last_active;
        }
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.remove(session_id);
        Ok(())
    }
}

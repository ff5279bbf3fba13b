//! Redis-backed session store: one hash per session id, record expiry
//! enforced by the server's own TTL sweep.

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::collections::HashMap;
use std::time::Duration;

use crate::storage::{SessionRecord, SessionStore};

const FIELD_ACCESS_TOKEN: &str = "access_token";
const FIELD_REFRESH_TOKEN: &str = "refresh_token";
const FIELD_LAST_ACTIVE: &str = "last_active";

/// Session store over Redis with connection pooling via
/// [`ConnectionManager`].
#[derive(Clone)]
pub struct RedisSessionStore {
    connection: ConnectionManager,
}

impl RedisSessionStore {
    /// Connect to Redis, e.g. `redis://127.0.0.1:6379`.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).context("failed to create redis client")?;
        let connection = ConnectionManager::new(client)
            .await
            .context("failed to connect to redis")?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn write(&self, session_id: &str, record: &SessionRecord, ttl: Duration) -> Result<()> {
        let mut connection = self.connection.clone();
        let ttl_seconds = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        // Record fields and expiry land together or not at all.
        let _: () = redis::pipe()
            .atomic()
            .hset(session_id, FIELD_ACCESS_TOKEN, &record.access_token)
            .hset(session_id, FIELD_REFRESH_TOKEN, &record.refresh_token)
            .hset(session_id, FIELD_LAST_ACTIVE, record.last_active)
            .expire(session_id, ttl_seconds)
            .query_async(&mut connection)
            .await
            .context("failed to write session record")?;
        Ok(())
    }

    async fn read(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let mut connection = self.connection.clone();
        let fields: HashMap<String, String> = connection
            .hgetall(session_id)
            .await
            .context("failed to read session record")?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(SessionRecord {
            access_token: fields.get(FIELD_ACCESS_TOKEN).cloned().unwrap_or_default(),
            refresh_token: fields.get(FIELD_REFRESH_TOKEN).cloned().unwrap_or_default(),
            last_active: fields
                .get(FIELD_LAST_ACTIVE)
                .and_then(|value| value.parse().ok())
                .unwrap_or_default(),
        }))
    }

    async fn touch(&self, session_id: &str, last_active: i64) -> Result<()> {
        let mut connection = self.connection.clone();
        // A bare HSET would resurrect an evicted key without a TTL; only
        // refresh activity on a still-live record. The check-then-set race
        // is tolerated, matching the store's last-writer-wins contract.
        let exists: bool = connection
            .exists(session_id)
            .await
            .context("failed to check session record")?;
        if exists {
            let _: () = connection
                .hset(session_id, FIELD_LAST_ACTIVE, last_active)
                .await
                .context("failed to update session activity")?;
        }
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let mut connection = self.connection.clone();
        // Deleting a missing key is a no-op.
        let _: () = connection
            .del(session_id)
            .await
            .context("failed to delete session record")?;
        Ok(())
    }
}

use super::{SessionError, SessionRecord, SessionResult, SessionStore};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory session store with lazy expiry.
///
/// Each entry carries its own expiry timestamp; expired entries are removed
/// when read. Keyed per session id, so concurrent requests from different
/// sessions never contend on the same record.
pub struct MemorySessionStore {
    ttl: Duration,
    store: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of live (non-expired) sessions.
    pub async fn len(&self) -> usize {
        let store = self.store.read().await;
        store.values().filter(|s| !s.is_expired()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self) -> SessionResult<SessionRecord> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| SessionError::Store(format!("invalid session TTL: {e}")))?;

        let now = Utc::now();
        let record = SessionRecord {
            id: Uuid::new_v4().to_string(),
            user_id: None,
            return_to: None,
            oauth_state: None,
            created_at: now,
            expires_at: now + ttl,
        };

        let mut store = self.store.write().await;
        store.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get(&self, id: &str) -> SessionResult<Option<SessionRecord>> {
        let store = self.store.read().await;

        if let Some(record) = store.get(id) {
            if record.is_expired() {
                drop(store);
                // Clean up expired entry
                let mut store = self.store.write().await;
                store.remove(id);
                return Ok(None);
            }
            Ok(Some(record.clone()))
        } else {
            Ok(None)
        }
    }

    async fn save(&self, record: &SessionRecord) -> SessionResult<()> {
        let mut store = self.store.write().await;
        store.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> SessionResult<()> {
        let mut store = self.store.write().await;
        store.remove(id);
        Ok(())
    }
}

use crate::models::ChatSession;
use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};
use std::collections::HashMap;
use std::sync::Mutex;

/// Hot storage for sessions that are still in progress.
#[async_trait]
pub trait ActiveSessionStore: Send + Sync {
    /// Writes the session and refreshes its TTL.
    async fn set_session(&self, session: &ChatSession) -> Result<(), anyhow::Error>;
    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>, anyhow::Error>;
    async fn delete_session(&self, session_id: &str) -> Result<(), anyhow::Error>;
    async fn exists(&self, session_id: &str) -> Result<bool, anyhow::Error>;
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

pub fn session_key(session_id: &str) -> String {
    format!("session:{}", session_id)
}

#[derive(Clone)]
pub struct RedisSessionStore {
    _client: Client,
    manager: ConnectionManager,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    pub async fn connect(url: &str, ttl_seconds: u64) -> Result<Self, anyhow::Error> {
        tracing::info!(url = %url, "Connecting to Redis");
        let client = Client::open(url)?;

        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis");

        Ok(Self {
            _client: client,
            manager,
            ttl_seconds,
        })
    }
}

#[async_trait]
impl ActiveSessionStore for RedisSessionStore {
    async fn set_session(&self, session: &ChatSession) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        let payload = serde_json::to_string(session)?;

        redis::cmd("SETEX")
            .arg(session_key(&session.session_id))
            .arg(self.ttl_seconds)
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to store session: {}", e))
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>, anyhow::Error> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(session_key(session_id))
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to load session: {}", e))?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        let _: i64 = redis::cmd("DEL")
            .arg(session_key(session_id))
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to delete session: {}", e))?;
        Ok(())
    }

    async fn exists(&self, session_id: &str) -> Result<bool, anyhow::Error> {
        let mut conn = self.manager.clone();
        let count: i64 = redis::cmd("EXISTS")
            .arg(session_key(session_id))
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to check session: {}", e))?;
        Ok(count > 0)
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))
    }
}

/// In-memory store for tests. Entries never expire.
pub struct MockSessionStore {
    pub sessions: Mutex<HashMap<String, ChatSession>>,
    pub healthy: bool,
}

impl Default for MockSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            healthy: true,
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, ChatSession>>, anyhow::Error> {
        self.sessions
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock session store mutex poisoned: {}", e))
    }
}

#[async_trait]
impl ActiveSessionStore for MockSessionStore {
    async fn set_session(&self, session: &ChatSession) -> Result<(), anyhow::Error> {
        self.lock()?
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>, anyhow::Error> {
        Ok(self.lock()?.get(session_id).cloned())
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), anyhow::Error> {
        self.lock()?.remove(session_id);
        Ok(())
    }

    async fn exists(&self, session_id: &str) -> Result<bool, anyhow::Error> {
        Ok(self.lock()?.contains_key(session_id))
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        if self.healthy {
            Ok(())
        } else {
            Err(anyhow::anyhow!("Mock Redis is down"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        assert_eq!(session_key("abc"), "session:abc");
    }

    #[tokio::test]
    async fn mock_store_round_trips_sessions() {
        let store = MockSessionStore::new();
        let session = ChatSession::new("user-1", None);

        store.set_session(&session).await.unwrap();
        assert!(store.exists(&session.session_id).await.unwrap());
        assert_eq!(
            store.get_session(&session.session_id).await.unwrap(),
            Some(session.clone())
        );

        store.delete_session(&session.session_id).await.unwrap();
        assert!(store.get_session(&session.session_id).await.unwrap().is_none());
    }
}

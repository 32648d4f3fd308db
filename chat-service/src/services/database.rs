//! MongoDB archive for ended sessions.

use crate::models::{ArchivedSession, ChatSession, SessionStatus};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Document},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;
use std::sync::Mutex;

pub const SESSIONS_COLLECTION: &str = "chat_sessions";

/// Durable storage for sessions once they end.
#[async_trait]
pub trait SessionArchive: Send + Sync {
    async fn archive(&self, session: &ChatSession) -> Result<(), AppError>;
    /// Sessions for `user_id`, newest `started_at` first.
    async fn find_by_user(
        &self,
        user_id: &str,
        status: Option<&str>,
    ) -> Result<Vec<ArchivedSession>, AppError>;
    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct ChatDb {
    client: MongoClient,
    db: Database,
}

impl ChatDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for chat-service");

        let indexes = [
            ("session_id_idx", doc! { "session_id": 1 }, true),
            ("user_id_idx", doc! { "user_id": 1 }, false),
            ("started_at_idx", doc! { "started_at": -1 }, false),
        ];

        for (name, keys, unique) in indexes {
            let index = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(name.to_string())
                        .unique(unique)
                        .build(),
                )
                .build();

            self.documents()
                .create_index(index, None)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to create {} index: {}", name, e);
                    AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
                })?;
        }

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    fn sessions(&self) -> Collection<ChatSession> {
        self.db.collection(SESSIONS_COLLECTION)
    }

    fn documents(&self) -> Collection<Document> {
        self.db.collection(SESSIONS_COLLECTION)
    }
}

/// Converts a raw archive document, replacing the ObjectId with its hex form.
pub fn archived_from_document(mut document: Document) -> Result<ArchivedSession, AppError> {
    let id = match document.remove("_id") {
        Some(bson::Bson::ObjectId(oid)) => oid.to_hex(),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    let session: ChatSession = bson::from_document(document).map_err(|e| {
        tracing::error!("Failed to decode archived session {}: {}", id, e);
        AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
    })?;

    Ok(ArchivedSession { id, session })
}

#[async_trait]
impl SessionArchive for ChatDb {
    async fn archive(&self, session: &ChatSession) -> Result<(), AppError> {
        self.sessions()
            .insert_one(session, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to archive session: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        status: Option<&str>,
    ) -> Result<Vec<ArchivedSession>, AppError> {
        let mut filter = doc! { "user_id": user_id };
        if let Some(status) = status {
            filter.insert("status", status);
        }

        let options = FindOptions::builder()
            .sort(doc! { "started_at": -1 })
            .build();

        let mut cursor = self
            .documents()
            .find(filter, options)
            .await
            .map_err(|e| {
                tracing::error!("Failed to query sessions: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let mut sessions = Vec::new();
        while let Some(document) = cursor.try_next().await.map_err(|e| {
            tracing::error!("Failed to read session cursor: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })? {
            sessions.push(archived_from_document(document)?);
        }

        Ok(sessions)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }
}

/// In-memory archive for tests.
pub struct MockSessionArchive {
    pub sessions: Mutex<Vec<ArchivedSession>>,
    pub healthy: bool,
    pub fail_inserts: bool,
}

impl Default for MockSessionArchive {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSessionArchive {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
            healthy: true,
            fail_inserts: false,
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    pub fn failing_inserts() -> Self {
        Self {
            fail_inserts: true,
            ..Self::new()
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<ArchivedSession>>, AppError> {
        self.sessions.lock().map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Mock archive mutex poisoned: {}", e))
        })
    }
}

#[async_trait]
impl SessionArchive for MockSessionArchive {
    async fn archive(&self, session: &ChatSession) -> Result<(), AppError> {
        if self.fail_inserts {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "Mock archive rejected insert"
            )));
        }

        let mut sessions = self.lock()?;
        if sessions
            .iter()
            .any(|s| s.session.session_id == session.session_id)
        {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "Duplicate session_id {}",
                session.session_id
            )));
        }

        sessions.push(ArchivedSession {
            id: ObjectId::new().to_hex(),
            session: session.clone(),
        });
        Ok(())
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        status: Option<&str>,
    ) -> Result<Vec<ArchivedSession>, AppError> {
        let mut found: Vec<ArchivedSession> = self
            .lock()?
            .iter()
            .filter(|s| s.session.user_id == user_id)
            .filter(|s| status.map_or(true, |st| s.session.status.as_str() == st))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.session.started_at.cmp(&a.session.started_at));
        Ok(found)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        if self.healthy {
            Ok(())
        } else {
            Err(AppError::DatabaseError(anyhow::anyhow!("Mock MongoDB is down")))
        }
    }
}

//! Session lifecycle: live in Redis while active, moved to MongoDB on end.

use super::database::SessionArchive;
use super::redis::ActiveSessionStore;
use crate::models::{ArchivedSession, ChatMessage, ChatSession, MessageRole, SessionStatus, UserInfo};
use chrono::Utc;
use service_core::error::AppError;
use std::sync::Arc;

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn ActiveSessionStore>,
    archive: Arc<dyn SessionArchive>,
}

impl SessionService {
    pub fn new(store: Arc<dyn ActiveSessionStore>, archive: Arc<dyn SessionArchive>) -> Self {
        Self { store, archive }
    }

    pub async fn create_session(
        &self,
        user_id: &str,
        user_info: Option<UserInfo>,
    ) -> Result<String, AppError> {
        let session = ChatSession::new(user_id, user_info);
        self.store.set_session(&session).await?;

        tracing::info!(session_id = %session.session_id, user_id = %user_id, "Session created");
        Ok(session.session_id)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>, AppError> {
        Ok(self.store.get_session(session_id).await?)
    }

    /// Appends a message and writes the session back, refreshing its TTL.
    /// `user_info` is only kept for user messages.
    pub async fn add_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
        user_info: Option<UserInfo>,
    ) -> Result<Option<ChatSession>, AppError> {
        let Some(mut session) = self.store.get_session(session_id).await? else {
            return Ok(None);
        };

        let user_info = match role {
            MessageRole::User => user_info,
            MessageRole::Assistant => None,
        };

        session.messages.push(ChatMessage {
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
            user: user_info.clone(),
        });

        if user_info.is_some() {
            session.user = user_info;
        }

        self.store.set_session(&session).await?;
        Ok(Some(session))
    }

    /// Archives the session and then drops it from Redis. A failed archive
    /// insert leaves the session active.
    pub async fn end_session(&self, session_id: &str) -> Result<bool, AppError> {
        let Some(mut session) = self.store.get_session(session_id).await? else {
            return Ok(false);
        };

        session.ended_at = Some(Utc::now());
        session.status = SessionStatus::Ended;

        self.archive.archive(&session).await?;
        self.store.delete_session(session_id).await?;

        tracing::info!(
            session_id = %session_id,
            messages = session.messages.len(),
            "Session ended and archived"
        );
        Ok(true)
    }

    pub async fn get_conversation_history(
        &self,
        session_id: &str,
    ) -> Result<Vec<(MessageRole, String)>, AppError> {
        Ok(self
            .store
            .get_session(session_id)
            .await?
            .map(|session| {
                session
                    .messages
                    .into_iter()
                    .map(|m| (m.role, m.content))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Archived sessions for a user. `status` filters by its stored value,
    /// so an unknown status matches nothing.
    pub async fn get_user_sessions(
        &self,
        user_id: &str,
        status: Option<&str>,
    ) -> Result<Vec<ArchivedSession>, AppError> {
        self.archive.find_by_user(user_id, status).await
    }

    pub async fn store_health(&self) -> bool {
        self.store.health_check().await.is_ok()
    }

    pub async fn archive_health(&self) -> bool {
        self.archive.health_check().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::database::MockSessionArchive;
    use crate::services::redis::MockSessionStore;

    fn service() -> (SessionService, Arc<MockSessionStore>, Arc<MockSessionArchive>) {
        let store = Arc::new(MockSessionStore::new());
        let archive = Arc::new(MockSessionArchive::new());
        (
            SessionService::new(store.clone(), archive.clone()),
            store,
            archive,
        )
    }

    fn info(name: &str) -> UserInfo {
        UserInfo {
            first_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn created_session_is_active_and_empty() {
        let (service, _, _) = service();
        let id = service.create_session("user-1", Some(info("Ann"))).await.unwrap();

        let session = service.get_session(&id).await.unwrap().unwrap();
        assert_eq!(session.user_id, "user-1");
        assert_eq!(session.status, SessionStatus::Active);
        assert!(session.messages.is_empty());
        assert_eq!(session.user, Some(info("Ann")));
    }

    #[tokio::test]
    async fn add_message_to_missing_session_returns_none() {
        let (service, _, _) = service();
        let result = service
            .add_message("nope", MessageRole::User, "hi", None)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn user_info_only_sticks_to_user_messages() {
        let (service, _, _) = service();
        let id = service.create_session("user-1", None).await.unwrap();

        service
            .add_message(&id, MessageRole::User, "hi", Some(info("Ann")))
            .await
            .unwrap();
        let session = service
            .add_message(&id, MessageRole::Assistant, "hello", Some(info("Bot")))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].user, Some(info("Ann")));
        assert_eq!(session.messages[1].user, None);
        assert_eq!(session.user, Some(info("Ann")));
    }

    #[tokio::test]
    async fn history_lists_roles_and_content() {
        let (service, _, _) = service();
        let id = service.create_session("user-1", None).await.unwrap();
        service.add_message(&id, MessageRole::User, "q", None).await.unwrap();
        service
            .add_message(&id, MessageRole::Assistant, "a", None)
            .await
            .unwrap();

        let history = service.get_conversation_history(&id).await.unwrap();
        assert_eq!(
            history,
            vec![
                (MessageRole::User, "q".to_string()),
                (MessageRole::Assistant, "a".to_string())
            ]
        );
        assert!(service
            .get_conversation_history("missing")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn ending_moves_session_to_archive() {
        let (service, store, _) = service();
        let id = service.create_session("user-1", None).await.unwrap();

        assert!(service.end_session(&id).await.unwrap());
        assert!(!store.exists(&id).await.unwrap());

        let archived = service.get_user_sessions("user-1", None).await.unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].session.status, SessionStatus::Ended);
        assert!(archived[0].session.ended_at.is_some());
    }

    #[tokio::test]
    async fn ending_missing_session_returns_false() {
        let (service, _, _) = service();
        assert!(!service.end_session("missing").await.unwrap());
    }

    #[tokio::test]
    async fn failed_archive_keeps_session_live() {
        let store = Arc::new(MockSessionStore::new());
        let service = SessionService::new(
            store.clone(),
            Arc::new(MockSessionArchive::failing_inserts()),
        );
        let id = service.create_session("user-1", None).await.unwrap();

        assert!(service.end_session(&id).await.is_err());
        let session = service.get_session(&id).await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Active);
    }
}

//! Test harness: the real router on a random port, backed by in-memory mocks.

#![allow(dead_code)]

use chat_service::config::{ChatConfig, GeminiConfig, JwtConfig, MongoConfig, RedisConfig};
use chat_service::services::providers::MockTextProvider;
use chat_service::services::{MockSessionArchive, MockSessionStore};
use chat_service::startup::{AppState, Application};
use reqwest::Client;
use service_core::auth::JwtService;
use std::sync::Arc;
use std::time::Duration;

pub const TEST_SECRET: &str = "test-secret-key";
pub const TEST_USER_ID: &str = "test_user_123";
pub const MOCK_REPLY: &str = "Start with three full-body sessions a week.";

pub struct TestOptions {
    pub debug: bool,
    pub store: MockSessionStore,
    pub archive: MockSessionArchive,
    pub provider: MockTextProvider,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            debug: true,
            store: MockSessionStore::new(),
            archive: MockSessionArchive::new(),
            provider: MockTextProvider::with_reply(MOCK_REPLY),
        }
    }
}

pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub store: Arc<MockSessionStore>,
    pub archive: Arc<MockSessionArchive>,
    pub provider: Arc<MockTextProvider>,
    pub jwt: JwtService,
}

pub fn test_config(debug: bool) -> ChatConfig {
    ChatConfig {
        common: service_core::config::Config { port: 0 },
        project_name: "Chat Microservice".to_string(),
        version: "1.0.0".to_string(),
        debug,
        log_level: "info".to_string(),
        otlp_endpoint: None,
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "chat_test".to_string(),
        },
        redis: RedisConfig {
            url: "redis://localhost:6379".to_string(),
            session_ttl_seconds: 3600,
        },
        jwt: JwtConfig {
            secret_key: TEST_SECRET.to_string(),
            access_token_expire_minutes: 30,
        },
        gemini: GeminiConfig {
            api_key: "test-gemini-key".to_string(),
            model: "gemini-2.0-flash".to_string(),
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(TestOptions::default()).await
    }

    pub async fn spawn_with(options: TestOptions) -> Self {
        let store = Arc::new(options.store);
        let archive = Arc::new(options.archive);
        let provider = Arc::new(options.provider);

        let state = AppState::new(
            test_config(options.debug),
            store.clone(),
            archive.clone(),
            provider.clone(),
        );
        let jwt = state.jwt.clone();

        let app = Application::build_with_state(state)
            .await
            .expect("Failed to build application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            let _ = app.run_until_stopped().await;
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to build client");

        let test_app = Self {
            address,
            client,
            store,
            archive,
            provider,
            jwt,
        };
        test_app.wait_until_live().await;
        test_app
    }

    async fn wait_until_live(&self) {
        for _ in 0..50 {
            if let Ok(res) = self.client.get(self.url("/health")).send().await {
                if res.status().is_success() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("Test server did not become ready");
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn token(&self) -> String {
        self.jwt
            .issue_token("test_user", Some(TEST_USER_ID), None)
            .expect("Failed to issue token")
    }

    pub async fn post_message(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url("/chat/message"))
            .bearer_auth(self.token())
            .json(&body)
            .send()
            .await
            .expect("Failed to send message")
    }

    pub async fn end_session(&self, session_id: &str) -> reqwest::Response {
        self.client
            .post(self.url("/chat/end"))
            .bearer_auth(self.token())
            .json(&serde_json::json!({ "session_id": session_id }))
            .send()
            .await
            .expect("Failed to end session")
    }

    /// Starts a session for [`TEST_USER_ID`] and returns its id.
    pub async fn start_session(&self, message: &str) -> String {
        let res = self
            .post_message(serde_json::json!({ "message": message, "user_id": TEST_USER_ID }))
            .await;
        assert_eq!(res.status().as_u16(), 200);
        let body: serde_json::Value = res.json().await.expect("Invalid JSON");
        body["session_id"]
            .as_str()
            .expect("session_id missing")
            .to_string()
    }
}

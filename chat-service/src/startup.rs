use crate::config::ChatConfig;
use crate::handlers;
use crate::middleware::auth_middleware;
use crate::services::providers::{GeminiTextProvider, TextProvider};
use crate::services::{
    ActiveSessionStore, AssistantService, ChatDb, RedisSessionStore, SessionArchive,
    SessionService,
};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::auth::JwtService;
use service_core::error::AppError;
use service_core::middleware::{init_metrics, metrics_middleware, request_id_middleware};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: ChatConfig,
    pub sessions: SessionService,
    pub assistant: AssistantService,
    pub jwt: JwtService,
}

impl AppState {
    /// Wires state from already-constructed backends.
    pub fn new(
        config: ChatConfig,
        store: Arc<dyn ActiveSessionStore>,
        archive: Arc<dyn SessionArchive>,
        provider: Arc<dyn TextProvider>,
    ) -> Self {
        let jwt = JwtService::new(
            &config.jwt.secret_key,
            config.jwt.access_token_expire_minutes,
        );
        Self {
            sessions: SessionService::new(store, archive),
            assistant: AssistantService::new(provider),
            jwt,
            config,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let chat_routes = Router::new()
        .route("/message", post(handlers::send_message))
        .route("/end", post(handlers::end_session))
        .route("/sessions/:user_id", get(handlers::get_user_sessions))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let mut app = Router::new()
        .route("/", get(handlers::root))
        .route("/ping", get(handlers::ping))
        .route("/api/health", get(handlers::api_health))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .nest("/chat", chat_routes);

    if state.config.debug {
        app = app.route("/auth/generate-test-token", post(handlers::generate_test_token));
    }

    app.with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    /// Connects Redis, MongoDB and Gemini, then binds the listener. Any
    /// backend failure aborts startup.
    pub async fn build(config: ChatConfig) -> Result<Self, AppError> {
        let store = RedisSessionStore::connect(&config.redis.url, config.redis.session_ttl_seconds)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to Redis: {}", e);
                AppError::InternalError(e)
            })?;

        let db = ChatDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let provider = GeminiTextProvider::new(&config.gemini.api_key, &config.gemini.model)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;
        tracing::info!(model = %config.gemini.model, "Initialized Gemini text provider");

        let state = AppState::new(
            config,
            Arc::new(store),
            Arc::new(db),
            Arc::new(provider),
        );

        Self::build_with_state(state).await
    }

    pub async fn build_with_state(state: AppState) -> Result<Self, AppError> {
        init_metrics();

        let app = router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], state.config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            debug = state.config.debug,
            "{} listening on {}",
            state.config.project_name,
            port
        );

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

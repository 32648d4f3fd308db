pub mod auth;
pub mod chat;
pub mod health;
pub mod root;

pub use auth::generate_test_token;
pub use chat::{end_session, get_user_sessions, send_message};
pub use health::{api_health, health_check, metrics, readiness_check};
pub use root::{ping, root};

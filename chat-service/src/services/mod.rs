pub mod assistant;
pub mod database;
pub mod providers;
pub mod redis;
pub mod session;

pub use assistant::AssistantService;
pub use database::{ChatDb, MockSessionArchive, SessionArchive};
pub use self::redis::{ActiveSessionStore, MockSessionStore, RedisSessionStore};
pub use session::SessionService;

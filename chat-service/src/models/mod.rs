pub mod session;

pub use session::{
    ArchivedSession, ChatMessage, ChatSession, MessageRole, SessionStatus, UserInfo,
};

pub mod jwt;

pub use jwt::{Claims, JwtService, bearer_token};

pub mod auth;
pub mod csrf;

pub use auth::{session_auth_middleware, SessionUser};
pub use csrf::csrf_middleware;

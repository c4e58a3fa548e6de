pub mod session_store;

pub use session_store::{SessionError, SessionRecord, SessionStore};

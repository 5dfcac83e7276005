//! Chat session: identity, connection lifecycle and event dispatch.

mod manager;
mod notice;
mod state;
mod validation;

pub use manager::{Dispatched, SessionManager};
pub use notice::{Notice, NoticeKind};
pub use state::{ConnectionState, SessionState};
pub use validation::{validate_nickname, NicknameError, MAX_NICKNAME_LENGTH, MIN_NICKNAME_LENGTH};

pub mod auth_attempt;
pub mod auth_log;
pub mod bookmark;

pub use auth_attempt::{AuthAttempt, EmailOtpType};
pub use auth_log::{AuthEventKind, AuthLogEntry};
pub use bookmark::{Bookmark, NewBookmark};

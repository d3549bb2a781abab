pub mod session;

pub use session::{require_user, CurrentUser};

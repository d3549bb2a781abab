pub mod bookmarks;
pub mod confirm;
pub mod health;
pub mod metrics;
pub mod session;

pub use bookmarks::{create_bookmark, list_bookmarks};
pub use confirm::confirm;
pub use health::health_check;
pub use session::{google_login, login, logout, signup};

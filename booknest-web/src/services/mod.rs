//! Services layer for booknest-web.
//!
//! Identity provider access, persistence and the sign-in completion flow.

mod auth_events;
mod auth_flow;
mod database;
pub mod error;
mod gotrue;
pub mod identity;
mod memory;
mod repository;

pub use auth_events::AuthEventLogger;
pub use auth_flow::{AuthCompletion, AuthOutcome};
pub use database::Database;
pub use error::ProviderError;
pub use gotrue::GoTrueClient;
pub use identity::{
    AuthResponse, IdentityProvider, MockIdentityProvider, ProviderCall, ProviderSession,
    ProviderUser, SignUpRequest,
};
pub use memory::InMemoryStore;
pub use repository::{AuthLogRepository, BookmarkRepository};

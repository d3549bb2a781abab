//! Audit rows written after a successful sign-in.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::identity::ProviderUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEventKind {
    GoogleLogin,
    EmailVerified,
}

impl AuthEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthEventKind::GoogleLogin => "google_login",
            AuthEventKind::EmailVerified => "email_verified",
        }
    }
}

/// One row of the `auth_logs` table. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthLogEntry {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub event: AuthEventKind,
}

impl AuthLogEntry {
    pub fn for_user(user: &ProviderUser, event: AuthEventKind) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            event,
        }
    }
}

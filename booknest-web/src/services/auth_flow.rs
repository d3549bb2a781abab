//! Completion of an email-link or OAuth sign-in callback.
//!
//! Exactly one verification runs per callback, chosen by [`AuthAttempt`]:
//!
//! | attempt     | provider call   | audit event      | success target |
//! |-------------|-----------------|------------------|----------------|
//! | `Code`      | `exchange_code` | `google_login`   | `/dashboard`   |
//! | `Otp`       | `verify_otp`    | `email_verified` | `next`         |
//! | `Malformed` | none            | none             | `/error`       |
//!
//! A provider error, or a success that names no user, ends at `/error`
//! with nothing recorded. A rejected code never falls back to the OTP
//! parameters of the same request.

use std::sync::Arc;

use super::auth_events::AuthEventLogger;
use super::identity::{AuthResponse, IdentityProvider, ProviderSession};
use crate::models::{AuthAttempt, AuthEventKind, AuthLogEntry};

/// Where the callback should send the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Dashboard { session: Option<ProviderSession> },
    Next { session: Option<ProviderSession> },
    Error,
}

impl AuthOutcome {
    fn label(&self) -> &'static str {
        match self {
            AuthOutcome::Dashboard { .. } | AuthOutcome::Next { .. } => "success",
            AuthOutcome::Error => "error",
        }
    }
}

#[derive(Clone)]
pub struct AuthCompletion {
    identity: Arc<dyn IdentityProvider>,
    events: AuthEventLogger,
}

impl AuthCompletion {
    pub fn new(identity: Arc<dyn IdentityProvider>, events: AuthEventLogger) -> Self {
        Self { identity, events }
    }

    pub async fn complete(&self, attempt: &AuthAttempt, code_verifier: Option<&str>) -> AuthOutcome {
        let branch = attempt.branch();

        let outcome = match attempt {
            AuthAttempt::Code { code } => {
                let result = self.identity.exchange_code(code, code_verifier).await;
                self.resolve(branch, result, AuthEventKind::GoogleLogin).await
            }
            AuthAttempt::Otp {
                token_hash,
                otp_type,
            } => {
                let result = self.identity.verify_otp(token_hash, *otp_type).await;
                self.resolve(branch, result, AuthEventKind::EmailVerified).await
            }
            AuthAttempt::Malformed => {
                tracing::info!(branch, "Auth callback without usable credentials");
                AuthOutcome::Error
            }
        };

        metrics::counter!(
            "auth_confirm_total",
            "branch" => branch,
            "outcome" => outcome.label()
        )
        .increment(1);

        outcome
    }

    async fn resolve<E: std::fmt::Display>(
        &self,
        branch: &'static str,
        result: Result<AuthResponse, E>,
        event: AuthEventKind,
    ) -> AuthOutcome {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(branch, error = %e, "Auth verification failed");
                return AuthOutcome::Error;
            }
        };

        let Some(user) = response.user else {
            tracing::warn!(branch, "Auth verification succeeded without a user");
            return AuthOutcome::Error;
        };

        tracing::info!(branch, user_id = %user.id, event = event.as_str(), "Auth verification succeeded");
        self.events.record(AuthLogEntry::for_user(&user, event)).await;

        let session = response.session;
        match event {
            AuthEventKind::GoogleLogin => AuthOutcome::Dashboard { session },
            AuthEventKind::EmailVerified => AuthOutcome::Next { session },
        }
    }
}

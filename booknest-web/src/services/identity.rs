//! Identity provider capabilities consumed by the service.
//!
//! The provider owns users and sessions. This service only reads the user's
//! id and email from a successful exchange and forwards session tokens to the
//! browser.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use url::Url;
use uuid::Uuid;

use super::error::ProviderError;
use crate::models::EmailOtpType;

/// The slice of the provider's user record this service relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_expires_in() -> i64 {
    3600
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Result of a successful provider call. Either part may be missing: a
/// sign-up awaiting email confirmation yields a user without a session, and
/// a provider may report success without identifying anyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthResponse {
    pub user: Option<ProviderUser>,
    pub session: Option<ProviderSession>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub email_redirect_to: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange a one-time OAuth authorization code for a session.
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<AuthResponse, ProviderError>;

    /// Verify an emailed token hash of the given purpose.
    async fn verify_otp(
        &self,
        token_hash: &str,
        otp_type: EmailOtpType,
    ) -> Result<AuthResponse, ProviderError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ProviderError>;

    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthResponse, ProviderError>;

    /// Resolve an access token to its user.
    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, ProviderError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError>;

    /// URL that starts a third-party OAuth sign-in using PKCE.
    fn authorize_url(
        &self,
        provider: &str,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<Url, ProviderError>;
}

/// A provider call observed by [`MockIdentityProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    ExchangeCode(String, Option<String>),
    VerifyOtp(String, EmailOtpType),
    SignInWithPassword(String),
    SignUp(String),
    GetUser,
    SignOut,
}

#[derive(Default)]
struct MockState {
    // `None` simulates a provider that reports success without a user.
    codes: HashMap<String, Option<ProviderUser>>,
    otps: HashMap<(String, EmailOtpType), ProviderUser>,
    passwords: HashMap<String, (String, ProviderUser)>,
    sessions: HashMap<String, ProviderUser>,
    calls: Vec<ProviderCall>,
}

/// In-memory provider for tests. Codes and token hashes are single-use.
#[derive(Default)]
pub struct MockIdentityProvider {
    state: Mutex<MockState>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MockState>, ProviderError> {
        self.state.lock().map_err(|e| {
            ProviderError::InvalidResponse(format!("Mock identity mutex poisoned: {}", e))
        })
    }

    pub fn add_code(&self, code: &str, user: ProviderUser) {
        if let Ok(mut state) = self.state() {
            state.codes.insert(code.to_string(), Some(user));
        }
    }

    /// Register a code the provider accepts but answers without a user.
    pub fn add_code_without_user(&self, code: &str) {
        if let Ok(mut state) = self.state() {
            state.codes.insert(code.to_string(), None);
        }
    }

    pub fn add_otp(&self, token_hash: &str, otp_type: EmailOtpType, user: ProviderUser) {
        if let Ok(mut state) = self.state() {
            state.otps.insert((token_hash.to_string(), otp_type), user);
        }
    }

    pub fn add_password_user(&self, email: &str, password: &str, user: ProviderUser) {
        if let Ok(mut state) = self.state() {
            state
                .passwords
                .insert(email.to_string(), (password.to_string(), user));
        }
    }

    /// Issue a session for `user` directly, returning its access token.
    pub fn issue_session(&self, user: ProviderUser) -> String {
        let token = format!("mock-access-{}", Uuid::new_v4());
        if let Ok(mut state) = self.state() {
            state.sessions.insert(token.clone(), user);
        }
        token
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.state().map(|s| s.calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: ProviderCall) -> Result<MutexGuard<'_, MockState>, ProviderError> {
        let mut state = self.state()?;
        state.calls.push(call);
        Ok(state)
    }

    fn signed_in(state: &mut MockState, user: ProviderUser) -> AuthResponse {
        let access_token = format!("mock-access-{}", Uuid::new_v4());
        state.sessions.insert(access_token.clone(), user.clone());
        AuthResponse {
            session: Some(ProviderSession {
                access_token,
                refresh_token: format!("mock-refresh-{}", Uuid::new_v4()),
                expires_in: default_expires_in(),
                token_type: default_token_type(),
            }),
            user: Some(user),
        }
    }

    fn rejected(message: &str) -> ProviderError {
        ProviderError::Rejected {
            status: 400,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<AuthResponse, ProviderError> {
        let mut state = self.record(ProviderCall::ExchangeCode(
            code.to_string(),
            code_verifier.map(str::to_string),
        ))?;
        match state.codes.remove(code) {
            Some(Some(user)) => Ok(Self::signed_in(&mut state, user)),
            Some(None) => Ok(AuthResponse::default()),
            None => Err(Self::rejected("invalid or consumed authorization code")),
        }
    }

    async fn verify_otp(
        &self,
        token_hash: &str,
        otp_type: EmailOtpType,
    ) -> Result<AuthResponse, ProviderError> {
        let mut state = self.record(ProviderCall::VerifyOtp(token_hash.to_string(), otp_type))?;
        match state.otps.remove(&(token_hash.to_string(), otp_type)) {
            Some(user) => Ok(Self::signed_in(&mut state, user)),
            None => Err(Self::rejected("Email link is invalid or has expired")),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ProviderError> {
        let mut state = self.record(ProviderCall::SignInWithPassword(email.to_string()))?;
        let user = match state.passwords.get(email) {
            Some((expected, user)) if expected == password => user.clone(),
            _ => return Err(Self::rejected("Invalid login credentials")),
        };
        Ok(Self::signed_in(&mut state, user))
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthResponse, ProviderError> {
        let mut state = self.record(ProviderCall::SignUp(request.email.clone()))?;
        if state.passwords.contains_key(&request.email) {
            return Err(Self::rejected("User already registered"));
        }
        let user = ProviderUser {
            id: Uuid::new_v4(),
            email: Some(request.email.clone()),
        };
        state.passwords.insert(
            request.email.clone(),
            (request.password.clone(), user.clone()),
        );
        Ok(AuthResponse {
            user: Some(user),
            session: None,
        })
    }

    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, ProviderError> {
        let state = self.record(ProviderCall::GetUser)?;
        state
            .sessions
            .get(access_token)
            .cloned()
            .ok_or_else(|| ProviderError::Rejected {
                status: 401,
                message: "invalid JWT".to_string(),
            })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        let mut state = self.record(ProviderCall::SignOut)?;
        state.sessions.remove(access_token);
        Ok(())
    }

    fn authorize_url(
        &self,
        provider: &str,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<Url, ProviderError> {
        let mut url = Url::parse("https://identity.test/auth/v1/authorize")
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "s256");
        Ok(url)
    }
}

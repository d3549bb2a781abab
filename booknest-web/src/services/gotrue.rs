//! HTTP client for a GoTrue-compatible auth API (`{base}/auth/v1`).

use async_trait::async_trait;
use booknest_core::error::AppError;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use std::time::Duration;
use url::Url;

use super::error::ProviderError;
use super::identity::{AuthResponse, IdentityProvider, ProviderSession, ProviderUser, SignUpRequest};
use crate::config::IdentityConfig;
use crate::models::EmailOtpType;

#[derive(Clone)]
pub struct GoTrueClient {
    client: Client,
    auth_base: String,
    api_key: SecretString,
}

/// Body of token-issuing endpoints.
#[derive(Debug, Deserialize)]
struct SessionBody {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    user: Option<ProviderUser>,
}

/// `/signup` answers with a session when auto-confirm is on and with the bare
/// user while the email address still awaits confirmation.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SessionOrUser {
    Session(SessionBody),
    User(ProviderUser),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self, status: StatusCode) -> String {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
            .unwrap_or_else(|| status.to_string())
    }
}

impl From<SessionBody> for AuthResponse {
    fn from(body: SessionBody) -> Self {
        AuthResponse {
            user: body.user,
            session: Some(ProviderSession {
                access_token: body.access_token,
                refresh_token: body.refresh_token,
                expires_in: body.expires_in.unwrap_or(3600),
                token_type: body.token_type.unwrap_or_else(|| "bearer".to_string()),
            }),
        }
    }
}

impl GoTrueClient {
    pub fn new(config: &IdentityConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Failed to build HTTP client: {}", e))
            })?;

        let auth_base = format!("{}/auth/v1", config.url.as_str().trim_end_matches('/'));
        tracing::info!(auth_base = %auth_base, "Identity provider client initialized");

        Ok(Self {
            client,
            auth_base,
            api_key: config.anon_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.auth_base, path)
    }

    /// Request carrying the project key, optionally acting as a user.
    fn request(&self, builder: RequestBuilder, user_token: Option<&str>) -> RequestBuilder {
        let key = self.api_key.expose_secret();
        builder
            .header("apikey", key)
            .header(header::AUTHORIZATION, format!("Bearer {}", user_token.unwrap_or(key)))
    }

    async fn send(&self, builder: RequestBuilder, op: &'static str) -> Result<Response, ProviderError> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, op, "Identity provider request failed");
            ProviderError::Transport(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .unwrap_or_default()
            .into_message(status);
        tracing::warn!(status = %status, op, message = %message, "Identity provider rejected request");

        Err(ProviderError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    async fn session_call(
        &self,
        builder: RequestBuilder,
        op: &'static str,
    ) -> Result<AuthResponse, ProviderError> {
        let response = self.send(self.request(builder, None), op).await?;
        let body: SessionBody = Self::decode(response).await?;
        Ok(body.into())
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<AuthResponse, ProviderError> {
        let builder = self
            .client
            .post(self.endpoint("token"))
            .query(&[("grant_type", "pkce")])
            .json(&json!({
                "auth_code": code,
                "code_verifier": code_verifier.unwrap_or_default(),
            }));
        self.session_call(builder, "exchange_code").await
    }

    async fn verify_otp(
        &self,
        token_hash: &str,
        otp_type: EmailOtpType,
    ) -> Result<AuthResponse, ProviderError> {
        let builder = self.client.post(self.endpoint("verify")).json(&json!({
            "type": otp_type,
            "token_hash": token_hash,
        }));
        self.session_call(builder, "verify_otp").await
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ProviderError> {
        let builder = self
            .client
            .post(self.endpoint("token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        self.session_call(builder, "sign_in_with_password").await
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthResponse, ProviderError> {
        let builder = self
            .client
            .post(self.endpoint("signup"))
            .query(&[("redirect_to", request.email_redirect_to.as_str())])
            .json(&json!({
                "email": request.email,
                "password": request.password,
                "data": { "full_name": request.full_name },
            }));
        let response = self.send(self.request(builder, None), "sign_up").await?;

        match Self::decode::<SessionOrUser>(response).await? {
            SessionOrUser::Session(body) => Ok(body.into()),
            SessionOrUser::User(user) => Ok(AuthResponse {
                user: Some(user),
                session: None,
            }),
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, ProviderError> {
        let builder = self.request(self.client.get(self.endpoint("user")), Some(access_token));
        let response = self.send(builder, "get_user").await?;
        Self::decode(response).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        let builder = self.request(self.client.post(self.endpoint("logout")), Some(access_token));
        self.send(builder, "sign_out").await?;
        Ok(())
    }

    fn authorize_url(
        &self,
        provider: &str,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.endpoint("authorize"))
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "s256");
        Ok(url)
    }
}

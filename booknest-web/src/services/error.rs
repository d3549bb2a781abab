use booknest_core::error::AppError;
use thiserror::Error;

/// Failure talking to the identity provider.
///
/// Callers that only need pass/fail (the sign-in callback) collapse every
/// variant into the same outcome; the variant is kept for logs.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Identity provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected identity provider response: {0}")]
    InvalidResponse(String),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Rejected { status, message } if (400..500).contains(&status) => {
                AppError::Unauthorized(anyhow::anyhow!(message))
            }
            other => AppError::BadGateway(other.to_string()),
        }
    }
}

//! Credentials carried by an inbound sign-in callback.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Purpose of an emailed one-time token, as named by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmailOtpType {
    #[serde(rename = "signup")]
    Signup,
    #[serde(rename = "invite")]
    Invite,
    #[serde(rename = "magiclink")]
    MagicLink,
    #[serde(rename = "recovery")]
    Recovery,
    #[serde(rename = "email_change")]
    EmailChange,
    #[serde(rename = "email")]
    Email,
}

impl EmailOtpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailOtpType::Signup => "signup",
            EmailOtpType::Invite => "invite",
            EmailOtpType::MagicLink => "magiclink",
            EmailOtpType::Recovery => "recovery",
            EmailOtpType::EmailChange => "email_change",
            EmailOtpType::Email => "email",
        }
    }
}

impl fmt::Display for EmailOtpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EmailOtpType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signup" => Ok(EmailOtpType::Signup),
            "invite" => Ok(EmailOtpType::Invite),
            "magiclink" => Ok(EmailOtpType::MagicLink),
            "recovery" => Ok(EmailOtpType::Recovery),
            "email_change" => Ok(EmailOtpType::EmailChange),
            "email" => Ok(EmailOtpType::Email),
            _ => Err(format!("Unknown OTP type: {}", s)),
        }
    }
}

/// Which verification a callback asks for.
///
/// Built once from the query string. An authorization code always wins over
/// OTP parameters; anything else is `Malformed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAttempt {
    Code {
        code: String,
    },
    Otp {
        token_hash: String,
        otp_type: EmailOtpType,
    },
    Malformed,
}

impl AuthAttempt {
    /// Classify raw callback parameters. Empty strings count as absent.
    pub fn classify(code: Option<&str>, token_hash: Option<&str>, otp_type: Option<&str>) -> Self {
        fn present(v: Option<&str>) -> Option<&str> {
            v.filter(|s| !s.is_empty())
        }

        if let Some(code) = present(code) {
            return AuthAttempt::Code {
                code: code.to_string(),
            };
        }

        match (present(token_hash), present(otp_type)) {
            (Some(token_hash), Some(otp_type)) => match otp_type.parse() {
                Ok(otp_type) => AuthAttempt::Otp {
                    token_hash: token_hash.to_string(),
                    otp_type,
                },
                Err(_) => AuthAttempt::Malformed,
            },
            _ => AuthAttempt::Malformed,
        }
    }

    /// Label used in logs and metrics.
    pub fn branch(&self) -> &'static str {
        match self {
            AuthAttempt::Code { .. } => "code",
            AuthAttempt::Otp { .. } => "otp",
            AuthAttempt::Malformed => "malformed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_takes_precedence_over_otp() {
        let attempt = AuthAttempt::classify(Some("abc"), Some("hash"), Some("email"));
        assert_eq!(
            attempt,
            AuthAttempt::Code {
                code: "abc".to_string()
            }
        );
    }

    #[test]
    fn otp_requires_both_hash_and_type() {
        assert_eq!(
            AuthAttempt::classify(None, Some("hash"), None),
            AuthAttempt::Malformed
        );
        assert_eq!(
            AuthAttempt::classify(None, None, Some("signup")),
            AuthAttempt::Malformed
        );
        assert_eq!(
            AuthAttempt::classify(None, Some("hash"), Some("signup")),
            AuthAttempt::Otp {
                token_hash: "hash".to_string(),
                otp_type: EmailOtpType::Signup,
            }
        );
    }

    #[test]
    fn empty_values_are_absent() {
        assert_eq!(
            AuthAttempt::classify(Some(""), Some("hash"), Some("recovery")),
            AuthAttempt::Otp {
                token_hash: "hash".to_string(),
                otp_type: EmailOtpType::Recovery,
            }
        );
        assert_eq!(
            AuthAttempt::classify(Some(""), Some(""), Some("email")),
            AuthAttempt::Malformed
        );
    }

    #[test]
    fn unknown_otp_type_is_malformed() {
        assert_eq!(
            AuthAttempt::classify(None, Some("hash"), Some("sms")),
            AuthAttempt::Malformed
        );
    }

    #[test]
    fn otp_type_wire_names() {
        for name in ["signup", "invite", "magiclink", "recovery", "email_change", "email"] {
            let parsed: EmailOtpType = name.parse().unwrap();
            assert_eq!(parsed.as_str(), name);
            assert_eq!(serde_json::to_value(parsed).unwrap(), name);
        }
    }
}

use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Registration form as posted by the sign-up page.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupForm {
    #[serde(rename = "first-name")]
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,

    #[serde(rename = "last-name")]
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl SignupForm {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

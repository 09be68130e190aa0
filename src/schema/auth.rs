use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Usernames end up in URLs, so keep them to a plain charset.
fn validate_username(username: &str) -> Result<(), ValidationError> {
    let is_valid = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !is_valid {
        return Err(ValidationError::new("username").with_message(Cow::Borrowed(
            "Only letters, digits, '_', '-' and '.' are allowed",
        )));
    }
    // "." and ".." would be collapsed out of the profile path
    if username.chars().all(|c| c == '.') {
        return Err(ValidationError::new("username").with_message(Cow::Borrowed(
            "Username must contain a letter, digit, '_' or '-'",
        )));
    }
    Ok(())
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 20, message = "Username must be between 1 and 20 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[serde(default, skip_serializing)]
    #[validate(length(min = 1, max = 100, message = "Password is required"))]
    pub password: String,
    #[serde(default)]
    #[validate(
        email(message = "Invalid email address"),
        length(max = 50, message = "Email must be at most 50 characters")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 30, message = "First name must be between 1 and 30 characters"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 30, message = "Last name must be between 1 and 30 characters"))]
    pub last_name: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[serde(default, skip_serializing)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

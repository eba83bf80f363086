use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use shared_models::error::AppError;

pub const MIN_PASSWORD_LENGTH: usize = 6;
const STRONG_PASSWORD_LENGTH: usize = 8;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

fn contact_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{10}$").expect("valid contact regex"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

pub fn is_valid_contact(contact: &str) -> bool {
    contact_pattern().is_match(contact)
}

pub fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::ValidationError("Name is required".to_string()));
    }
    Ok(())
}

pub fn validate_contact(contact: &str) -> Result<(), AppError> {
    if !is_valid_contact(contact) {
        return Err(AppError::ValidationError(
            "Enter valid 10-digit contact number".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    if !is_valid_email(email) {
        return Err(AppError::ValidationError(
            "Enter a valid email address".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::ValidationError(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Login form checks, in the order the form reports them.
pub fn validate_login(email: &str, password: &str) -> Result<(), AppError> {
    validate_email(email)?;
    validate_password(password)?;
    debug!("Login form passed validation");
    Ok(())
}

/// Signup form checks, in the order the form reports them.
pub fn validate_signup(name: &str, contact: &str, email: &str, password: &str) -> Result<(), AppError> {
    validate_name(name)?;
    validate_contact(contact)?;
    validate_email(email)?;
    validate_password(password)?;
    debug!("Signup form passed validation");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

/// `None` for an empty password.
pub fn password_strength(password: &str) -> Option<PasswordStrength> {
    if password.is_empty() {
        return None;
    }

    let length = password.chars().count();
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if length < MIN_PASSWORD_LENGTH {
        Some(PasswordStrength::Weak)
    } else if length >= STRONG_PASSWORD_LENGTH && has_upper && has_lower && has_digit {
        Some(PasswordStrength::Strong)
    } else {
        Some(PasswordStrength::Medium)
    }
}

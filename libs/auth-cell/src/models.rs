use serde::{Deserialize, Serialize};

use shared_models::auth::{LoginRequest, SessionFallback, SignupRequest};
use shared_models::error::AppError;
use shared_utils::validation::{validate_login, validate_signup};

pub const LOGIN_PATH: &str = "/login";
pub const SIGNUP_PATH: &str = "/signup";

pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";
pub const SIGNUP_FAILED_MESSAGE: &str = "Signup failed";

/// Which top-level screen the application should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    Auth,
    Dashboard,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validate_login(self.email.trim(), &self.password)
    }

    pub fn to_request(&self) -> LoginRequest {
        LoginRequest {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignupForm {
    pub name: String,
    pub contact: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
}

impl SignupForm {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_signup(
            self.name.trim(),
            self.contact.trim(),
            self.email.trim(),
            &self.password,
        )
    }

    pub fn to_request(&self) -> SignupRequest {
        SignupRequest {
            name: self.name.trim().to_string(),
            contact: self.contact.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            age: self.age,
            gender: self.gender.clone(),
        }
    }

    pub fn login_form(&self) -> LoginForm {
        LoginForm::new(self.email.trim(), self.password.clone())
    }

    /// Values used for any session field the login response leaves empty.
    pub fn fallback(&self) -> SessionFallback<'_> {
        SessionFallback {
            name: self.name.trim(),
            email: self.email.trim(),
            contact: self.contact.trim(),
            age: self.age,
            gender: self.gender.as_deref(),
        }
    }
}

use reqwest::StatusCode;
use tracing::{debug, info, warn};

use shared_api_client::BackendClient;
use shared_config::AppConfig;
use shared_models::auth::{LoginResponse, Session, SessionFallback, SignupResponse};
use shared_models::error::AppError;

use crate::models::{
    LoginForm, SignupForm, LOGIN_FAILED_MESSAGE, LOGIN_PATH, SIGNUP_FAILED_MESSAGE, SIGNUP_PATH,
};

pub struct AuthService {
    backend: BackendClient,
}

impl AuthService {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            backend: BackendClient::new(config)?,
        })
    }

    pub fn with_backend(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// Validates the form, then exchanges the credentials for a session.
    pub async fn login(&self, form: &LoginForm) -> Result<Session, AppError> {
        form.validate()?;
        let request = form.to_request();
        debug!("Logging in {}", request.email);

        let response: LoginResponse = self
            .backend
            .post(LOGIN_PATH, &request)
            .await
            .map_err(|e| with_fallback_message(e, LOGIN_FAILED_MESSAGE))?;

        let fallback = SessionFallback {
            email: &request.email,
            ..Default::default()
        };
        let session = response.into_session(&fallback);
        info!("Login succeeded for {}", session.email);
        Ok(session)
    }

    pub async fn signup(&self, form: &SignupForm) -> Result<SignupResponse, AppError> {
        form.validate()?;
        let request = form.to_request();
        debug!("Registering {}", request.email);

        let response: SignupResponse = self
            .backend
            .post(SIGNUP_PATH, &request)
            .await
            .map_err(|e| with_fallback_message(e, SIGNUP_FAILED_MESSAGE))?;

        info!("Signup succeeded for {}", request.email);
        Ok(response)
    }

    /// Registers and immediately logs in with the same credentials. Fields
    /// the login response leaves empty are taken from the form.
    pub async fn signup_and_login(&self, form: &SignupForm) -> Result<Session, AppError> {
        self.signup(form).await?;

        let login = form.login_form();
        let response: LoginResponse = self
            .backend
            .post(LOGIN_PATH, &login.to_request())
            .await
            .map_err(|e| with_fallback_message(e, LOGIN_FAILED_MESSAGE))?;

        Ok(response.into_session(&form.fallback()))
    }
}

/// Replaces a bare status reason with the form's generic failure text; a
/// message supplied by the backend is kept verbatim.
fn with_fallback_message(err: AppError, fallback: &str) -> AppError {
    match err {
        AppError::Server { status, message } => {
            let reason = StatusCode::from_u16(status)
                .ok()
                .and_then(|code| code.canonical_reason());
            let message = if message.trim().is_empty() || reason == Some(message.as_str()) {
                warn!("Backend returned {} without a message", status);
                fallback.to_string()
            } else {
                message
            };
            AppError::Server { status, message }
        }
        other => other,
    }
}

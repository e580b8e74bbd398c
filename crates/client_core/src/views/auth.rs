use shared::error::ApiError;
use tracing::debug;

use super::Navigation;
use crate::session::SessionStore;

#[derive(Debug, Clone, Default)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
    is_submitting: bool,
    error: Option<ApiError>,
}

impl SignInForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|error| error.message.as_str())
    }

    /// The error line with the code of the failure behind it.
    pub fn failure(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    pub async fn submit(&mut self, session: &SessionStore) -> Option<Navigation> {
        self.is_submitting = true;
        self.error = None;

        let outcome = session.login(self.email.trim(), &self.password).await;
        self.is_submitting = false;
        match outcome {
            Ok(_) => Some(Navigation::Dashboard),
            Err(err) => {
                debug!("auth: sign in failed: {err}");
                self.error = Some(err.to_view_error("Login failed"));
                None
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub full_name: String,
    is_submitting: bool,
    error: Option<ApiError>,
}

impl SignUpForm {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            full_name: full_name.into(),
            ..Self::default()
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|error| error.message.as_str())
    }

    /// The error line with the code of the failure behind it.
    pub fn failure(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    pub async fn submit(&mut self, session: &SessionStore) -> Option<Navigation> {
        self.is_submitting = true;
        self.error = None;

        let full_name = Some(self.full_name.trim()).filter(|name| !name.is_empty());
        let outcome = session
            .register(self.email.trim(), &self.password, full_name)
            .await;
        self.is_submitting = false;
        match outcome {
            Ok(_) => Some(Navigation::Dashboard),
            Err(err) => {
                debug!("auth: sign up failed: {err}");
                self.error = Some(err.to_view_error("Registration failed"));
                None
            }
        }
    }
}

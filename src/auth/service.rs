use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::credentials::{CredentialStore, Variant};
use crate::error::{AppError, AuthError, ValidationError};

/// Body of the signup and login forms.
///
/// Fields are optional so that a missing field reaches validation instead
/// of failing extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl CredentialsForm {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }

    /// Username first, then password: each must be non-blank after trimming.
    /// The untrimmed values are returned.
    pub fn validate(&self) -> Result<(&str, &str), ValidationError> {
        let username = match self.username.as_deref() {
            Some(u) if !u.trim().is_empty() => u,
            _ => return Err(ValidationError::MissingUsername),
        };
        let password = match self.password.as_deref() {
            Some(p) if !p.trim().is_empty() => p,
            _ => return Err(ValidationError::MissingPassword),
        };
        Ok((username, password))
    }
}

pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
}

impl AuthService {
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self { credentials }
    }

    pub fn variant(&self) -> Variant {
        self.credentials.variant()
    }

    /// Create the account and return the username to sign in as.
    pub async fn signup(&self, form: &CredentialsForm) -> Result<String, AppError> {
        let (username, password) = form.validate()?;

        self.credentials.create_user(username, password).await?;
        info!("Created user {:?}", username);

        Ok(username.to_string())
    }

    /// Check the credentials and return the username to sign in as.
    pub async fn login(&self, form: &CredentialsForm) -> Result<String, AppError> {
        let (username, password) = form.validate()?;

        match self.credentials.authenticate(username, password).await? {
            Some(authenticated) => {
                info!("Login accepted for {:?}", authenticated);
                Ok(authenticated)
            }
            None => {
                warn!("Login refused for {:?}", username);
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }
}

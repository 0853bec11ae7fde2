//! Environment variable credentials provider.

use super::{Credentials, ProvideCredentials};
use crate::error::{CredentialsError, S3Error};
use std::env;

/// Default variable name for the access key id.
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
/// Default variable name for the secret access key.
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
/// Default variable name for the session token.
pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

/// Credentials provider that reads from environment variables.
///
/// This provider looks for the following environment variables:
/// - `AWS_ACCESS_KEY_ID`: The access key ID
/// - `AWS_SECRET_ACCESS_KEY`: The secret access key
/// - `AWS_SESSION_TOKEN`: Optional session token for temporary credentials
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialsProvider {
    /// Custom access key ID variable name.
    access_key_var: Option<String>,
    /// Custom secret key variable name.
    secret_key_var: Option<String>,
    /// Custom session token variable name.
    session_token_var: Option<String>,
}

impl EnvCredentialsProvider {
    /// Create a provider with the default variable names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider with custom variable names.
    pub fn with_vars(
        access_key_var: impl Into<String>,
        secret_key_var: impl Into<String>,
        session_token_var: Option<String>,
    ) -> Self {
        Self {
            access_key_var: Some(access_key_var.into()),
            secret_key_var: Some(secret_key_var.into()),
            session_token_var,
        }
    }

    fn access_key_var(&self) -> &str {
        self.access_key_var.as_deref().unwrap_or(AWS_ACCESS_KEY_ID)
    }

    fn secret_key_var(&self) -> &str {
        self.secret_key_var
            .as_deref()
            .unwrap_or(AWS_SECRET_ACCESS_KEY)
    }

    fn session_token_var(&self) -> &str {
        self.session_token_var
            .as_deref()
            .unwrap_or(AWS_SESSION_TOKEN)
    }
}

impl ProvideCredentials for EnvCredentialsProvider {
    fn credentials(&self) -> Result<Credentials, S3Error> {
        let access_key_id = env::var(self.access_key_var())
            .map_err(|_| S3Error::Credentials(CredentialsError::NotFound))?;

        if access_key_id.is_empty() {
            return Err(S3Error::Credentials(CredentialsError::Invalid {
                message: format!("{} is empty", self.access_key_var()),
            }));
        }

        let secret_access_key = env::var(self.secret_key_var())
            .map_err(|_| S3Error::Credentials(CredentialsError::NotFound))?;

        if secret_access_key.is_empty() {
            return Err(S3Error::Credentials(CredentialsError::Invalid {
                message: format!("{} is empty", self.secret_key_var()),
            }));
        }

        // Session token is optional
        let session_token = env::var(self.session_token_var())
            .ok()
            .filter(|s| !s.is_empty());

        let credentials = if let Some(token) = session_token {
            Credentials::with_session_token(access_key_id, secret_access_key, token)
        } else {
            Credentials::new(access_key_id, secret_access_key)
        };

        Ok(credentials)
    }

    fn name(&self) -> &'static str {
        "environment"
    }
}

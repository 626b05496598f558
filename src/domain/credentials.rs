//! Login credentials

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Email/password pair submitted by a login form
///
/// The password is checked at struct level so validation errors never carry
/// its value.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_password"))]
pub struct Credentials {
    #[validate(email, length(max = 255))]
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::new(password.into()),
        }
    }
}

fn validate_password(credentials: &Credentials) -> Result<(), ValidationError> {
    if credentials.password.expose_secret().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

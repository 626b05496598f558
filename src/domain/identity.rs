//! Authenticated principal

use secrecy::SecretString;

/// Accessors a session guard needs from an authenticated principal
pub trait Authenticatable {
    /// Name of the field that identifies the principal
    fn auth_identifier_name(&self) -> &'static str;

    /// Value of that field
    fn auth_identifier(&self) -> &str;

    fn auth_password(&self) -> &SecretString;

    /// "Remember me" tokens are not supported.
    fn remember_token(&self) -> Option<&str> {
        None
    }

    fn set_remember_token(&mut self, _value: String) {}

    fn remember_token_name(&self) -> Option<&'static str> {
        None
    }
}

/// A user whose credentials Zendesk has just accepted.
///
/// Built fresh on every successful authentication and never persisted.
#[derive(Debug, Clone)]
pub struct Identity {
    pub email: String,
    pub display_name: String,
    secret: SecretString,
}

impl Identity {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>, secret: SecretString) -> Self {
        Self {
            email: email.into(),
            display_name: display_name.into(),
            secret,
        }
    }
}

impl Authenticatable for Identity {
    fn auth_identifier_name(&self) -> &'static str {
        "email"
    }

    fn auth_identifier(&self) -> &str {
        &self.email
    }

    fn auth_password(&self) -> &SecretString {
        &self.secret
    }
}

//! Session guard
//!
//! Remembers which principal is logged into a session and resolves it again
//! on later requests through a [`UserProvider`].

use crate::domain::{Authenticatable, Credentials};
use crate::error::{AppError, Result};
use crate::provider::UserProvider;
use crate::session::{keys, SessionStore};
use std::sync::Arc;

pub struct SessionGuard<P: UserProvider, S: SessionStore> {
    provider: Arc<P>,
    session: Arc<S>,
}

impl<P: UserProvider, S: SessionStore> SessionGuard<P, S> {
    pub fn new(provider: Arc<P>, session: Arc<S>) -> Self {
        Self { provider, session }
    }

    /// Check `credentials` and, if they hold, log the principal into the
    /// session.
    pub async fn attempt(&self, credentials: &Credentials) -> Result<P::User> {
        let user = self.provider.retrieve_by_credentials(credentials).await?;

        if !self.provider.validate_credentials(&user, credentials) {
            tracing::warn!(email = %credentials.email, "Credentials do not match the resolved user");
            return Err(AppError::AuthenticationRejected { status: 401 });
        }

        // A different principal replacing the login takes the old profile with it
        if let Some(previous) = self.id().await? {
            if keys::profile_key(&previous) != keys::profile_key(user.auth_identifier()) {
                self.provider.forget(&previous).await?;
                tracing::info!(previous = %previous, "Replaced previous login");
            }
        }

        self.session
            .put(keys::LOGIN, user.auth_identifier().to_string())
            .await?;

        tracing::info!(identifier = %user.auth_identifier(), "User logged in");
        Ok(user)
    }

    /// Identifier of the logged-in principal, if any
    pub async fn id(&self) -> Result<Option<String>> {
        self.session.get(keys::LOGIN).await
    }

    /// The logged-in principal's record. A login whose record has vanished
    /// from the session counts as logged out.
    pub async fn user(&self) -> Result<Option<P::Record>> {
        let Some(identifier) = self.id().await? else {
            return Ok(None);
        };

        match self.provider.retrieve_by_id(&identifier).await {
            Ok(record) => Ok(Some(record)),
            Err(AppError::NotFound(_)) => {
                tracing::debug!(identifier = %identifier, "Login present but profile missing");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn check(&self) -> Result<bool> {
        Ok(self.user().await?.is_some())
    }

    pub async fn logout(&self) -> Result<()> {
        if let Some(identifier) = self.id().await? {
            self.provider.forget(&identifier).await?;
            tracing::info!(identifier = %identifier, "User logged out");
        }
        self.session.forget(keys::LOGIN).await
    }
}

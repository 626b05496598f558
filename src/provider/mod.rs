//! User providers: turn credentials or a session identifier into a user

pub mod zendesk;

pub use zendesk::ZendeskUserProvider;

use crate::domain::{Authenticatable, Credentials};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UserProvider: Send + Sync {
    /// Principal produced by a successful credential check
    type User: Authenticatable + Send + Sync;
    /// What a session identifier resolves to on later requests
    type Record: Send;

    async fn retrieve_by_credentials(&self, credentials: &Credentials) -> Result<Self::User>;

    async fn retrieve_by_id(&self, identifier: &str) -> Result<Self::Record>;

    fn validate_credentials(&self, user: &Self::User, credentials: &Credentials) -> bool;

    /// Forget whatever `retrieve_by_credentials` stored for `identifier`
    async fn forget(&self, identifier: &str) -> Result<()>;
}

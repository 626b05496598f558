//! Session storage capability

pub mod memory;
pub mod redis_store;

pub use memory::MemorySessionStore;
pub use redis_store::RedisSessionStore;

use crate::error::Result;
use async_trait::async_trait;

/// Session keys owned by this crate. Everything else in the session belongs
/// to the host application.
pub mod keys {
    /// Identifier of the logged-in principal
    pub const LOGIN: &str = "login_zendesk";

    const PROFILE_PREFIX: &str = "zendesk_profile:";

    /// Key holding the raw Zendesk profile body of one identity
    pub fn profile_key(identifier: &str) -> String {
        format!("{}{}", PROFILE_PREFIX, identifier.trim().to_lowercase())
    }
}

/// Key-value storage scoped to one user session
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn put(&self, key: &str, value: String) -> Result<()>;
    async fn forget(&self, key: &str) -> Result<()>;
}

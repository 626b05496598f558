//! zendesk-auth - Zendesk-backed authentication
//!
//! A user provider that verifies email/password credentials against the
//! Zendesk "current user" endpoint, and a session guard that keeps the
//! resulting principal logged in across requests.

pub mod config;
pub mod domain;
pub mod error;
pub mod guard;
pub mod http;
pub mod provider;
pub mod session;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use domain::{Authenticatable, Credentials, Identity, ZendeskUser};
pub use error::{AppError, Result};
pub use guard::SessionGuard;
pub use provider::{UserProvider, ZendeskUserProvider};

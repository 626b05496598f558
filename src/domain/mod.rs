//! Domain models

pub mod credentials;
pub mod identity;
pub mod profile;

pub use credentials::Credentials;
pub use identity::{Authenticatable, Identity};
pub use profile::{ProfileEnvelope, ZendeskUser};

//! Zendesk profile payloads

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `GET /api/v2/users/me.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEnvelope {
    pub user: ZendeskUser,
}

/// The `user` object of a Zendesk profile response.
///
/// Only `name` is required and typed. Every other field is kept verbatim in
/// `extra`, so a value of an unexpected shape never fails the login; the
/// accessors below read the common ones when they have the usual type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZendeskUser {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProfileEnvelope {
    pub fn parse(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }
}

impl ZendeskUser {
    pub fn id(&self) -> Option<u64> {
        self.extra.get("id").and_then(Value::as_u64)
    }

    pub fn email(&self) -> Option<&str> {
        self.extra.get("email").and_then(Value::as_str)
    }

    pub fn role(&self) -> Option<&str> {
        self.extra.get("role").and_then(Value::as_str)
    }
}

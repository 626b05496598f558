//! Outbound HTTP capability
//!
//! The identity provider never talks to reqwest directly. It depends on the
//! [`HttpClient`] trait so the transport can be swapped (or mocked) without
//! touching the authentication logic.

pub mod client;

pub use client::ReqwestHttpClient;

use async_trait::async_trait;
use reqwest::Method;
use secrecy::SecretString;
use std::time::Duration;
use thiserror::Error;

pub type HttpResult<T> = std::result::Result<T, HttpError>;

/// Failures of a single HTTP call
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    /// The server answered, but not with a 2xx
    #[error("Unexpected status {status}")]
    Status { status: u16, body: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// HTTP Basic credentials
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: SecretString,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// Per-call options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub auth: Option<BasicAuth>,
    /// Overrides the client's default timeout
    pub timeout: Option<Duration>,
    pub json: Option<serde_json::Value>,
}

impl RequestOptions {
    pub fn with_basic_auth(auth: BasicAuth) -> Self {
        Self {
            auth: Some(auth),
            ..Default::default()
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.json = Some(body);
        self
    }
}

/// A successful (2xx) response with its body fully read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform one request. Non-2xx responses come back as
    /// [`HttpError::Status`], never as `Ok`.
    async fn request(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> HttpResult<HttpResponse>;
}

/// Method-fixing shorthands over [`HttpClient::request`]
#[async_trait]
pub trait HttpClientExt: HttpClient {
    async fn get(&self, url: &str, options: RequestOptions) -> HttpResult<HttpResponse> {
        self.request(Method::GET, url, options).await
    }

    async fn post(&self, url: &str, options: RequestOptions) -> HttpResult<HttpResponse> {
        self.request(Method::POST, url, options).await
    }

    async fn put(&self, url: &str, options: RequestOptions) -> HttpResult<HttpResponse> {
        self.request(Method::PUT, url, options).await
    }
}

impl<T: HttpClient + ?Sized> HttpClientExt for T {}

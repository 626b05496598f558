//! reqwest-backed [`HttpClient`]

use super::{HttpClient, HttpError, HttpResponse, HttpResult, RequestOptions};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, Method};
use secrecy::ExposeSecret;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct ReqwestHttpClient {
    http_client: Client,
    default_timeout: Duration,
}

impl ReqwestHttpClient {
    /// Create a client whose calls are bounded by `default_timeout` unless a
    /// request overrides it.
    pub fn new(default_timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(default_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            default_timeout,
        })
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}

fn classify(err: reqwest::Error) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout
    } else if err.is_builder() {
        HttpError::InvalidRequest(err.to_string())
    } else {
        HttpError::Network(err.to_string())
    }
}

fn outcome_label(result: &HttpResult<HttpResponse>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(HttpError::Timeout) => "timeout",
        Err(HttpError::Network(_)) => "network_error",
        Err(HttpError::Status { .. }) => "rejected",
        Err(HttpError::InvalidRequest(_)) => "invalid_request",
    }
}

async fn send(builder: reqwest::RequestBuilder) -> HttpResult<HttpResponse> {
    let response = builder.send().await.map_err(classify)?;
    let status = response.status();
    let body = response.text().await.map_err(classify)?;

    if !status.is_success() {
        return Err(HttpError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(HttpResponse {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn request(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> HttpResult<HttpResponse> {
        let timeout = options.timeout.unwrap_or(self.default_timeout);
        let mut builder = self
            .http_client
            .request(method.clone(), url)
            .timeout(timeout)
            .header(ACCEPT, "application/json");

        if let Some(auth) = &options.auth {
            builder = builder.basic_auth(&auth.username, Some(auth.password.expose_secret()));
        }
        if let Some(body) = &options.json {
            builder = builder.json(body);
        }

        tracing::debug!(method = %method, url = %url, "Sending Zendesk API request");
        let started = Instant::now();

        let result = send(builder).await;

        metrics::counter!(
            "zendesk_api_requests_total",
            "method" => method.to_string(),
            "outcome" => outcome_label(&result)
        )
        .increment(1);
        metrics::histogram!(
            "zendesk_api_request_duration_seconds",
            "method" => method.to_string()
        )
        .record(started.elapsed().as_secs_f64());

        result
    }
}

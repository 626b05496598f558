//! Zendesk-backed user provider
//!
//! Credentials are checked by calling `GET /api/v2/users/me.json` on the
//! tenant's Zendesk instance with HTTP Basic auth. A 2xx answer is taken as
//! proof of identity; the raw profile body is then kept in the session so
//! later requests can resolve the user without calling Zendesk again.

use super::UserProvider;
use crate::config::ZendeskConfig;
use crate::domain::{Authenticatable, Credentials, Identity, ProfileEnvelope, ZendeskUser};
use crate::error::{AppError, Result};
use crate::http::{
    BasicAuth, HttpClient, HttpClientExt, HttpError, ReqwestHttpClient, RequestOptions,
};
use crate::session::{keys, SessionStore};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use url::Url;
use validator::Validate;

const PROFILE_PATH: &str = "/api/v2/users/me.json";

// Single DNS label: Zendesk subdomains are interpolated into the URL authority
lazy_static::lazy_static! {
    pub static ref SUBDOMAIN_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$").unwrap();
}

/// Build the profile endpoint for `config`, rejecting anything that is not a
/// plain subdomain label and a zero request timeout.
pub fn profile_url(config: &ZendeskConfig) -> Result<Url> {
    if config.timeout_secs == 0 {
        return Err(AppError::Config(
            "Zendesk request timeout must be at least one second".to_string(),
        ));
    }

    let subdomain = config.subdomain.trim().to_lowercase();
    if !SUBDOMAIN_REGEX.is_match(&subdomain) {
        return Err(AppError::Config(format!(
            "Invalid Zendesk subdomain: {:?}",
            config.subdomain
        )));
    }

    let base = match &config.api_base_url {
        Some(base) => Url::parse(base)
            .map_err(|e| AppError::Config(format!("Invalid Zendesk API base URL: {}", e)))?,
        None => Url::parse(&format!("https://{}.zendesk.com", subdomain))
            .map_err(|e| AppError::Config(format!("Invalid Zendesk subdomain: {}", e)))?,
    };

    if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
        return Err(AppError::Config(format!(
            "Zendesk API base URL must be http(s): {}",
            base
        )));
    }

    base.join(PROFILE_PATH)
        .map_err(|e| AppError::Config(format!("Invalid Zendesk profile URL: {}", e)))
}

pub struct ZendeskUserProvider<H: HttpClient, S: SessionStore> {
    http: Arc<H>,
    session: Arc<S>,
    config: ZendeskConfig,
    profile_url: Url,
}

impl<H: HttpClient, S: SessionStore> ZendeskUserProvider<H, S> {
    pub fn new(config: ZendeskConfig, http: Arc<H>, session: Arc<S>) -> Result<Self> {
        let profile_url = profile_url(&config)?;
        Ok(Self {
            http,
            session,
            config,
            profile_url,
        })
    }

    pub fn profile_url(&self) -> &Url {
        &self.profile_url
    }

    /// Verify `credentials` against Zendesk and store the returned profile in
    /// the session.
    ///
    /// Nothing is written to the session unless the whole exchange succeeds.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Identity> {
        let result = self.try_authenticate(credentials).await;

        let label = match &result {
            Ok(_) => "success",
            Err(AppError::AuthenticationRejected { .. }) => "rejected",
            Err(AppError::Network(_)) => "network_error",
            Err(AppError::MalformedResponse(_)) => "malformed_response",
            Err(AppError::Validation(_)) => "invalid_input",
            Err(_) => "error",
        };
        metrics::counter!("zendesk_auth_attempts_total", "result" => label).increment(1);

        result
    }

    async fn try_authenticate(&self, credentials: &Credentials) -> Result<Identity> {
        credentials.validate()?;

        let body = self.fetch_profile(credentials).await?;

        let envelope = ProfileEnvelope::parse(&body).map_err(|e| {
            tracing::error!(
                email = %credentials.email,
                error = %e,
                "Zendesk accepted credentials but returned an unexpected profile body"
            );
            AppError::MalformedResponse(e.to_string())
        })?;

        self.session
            .put(&keys::profile_key(&credentials.email), body)
            .await?;

        tracing::info!(email = %credentials.email, "Authenticated against Zendesk");

        Ok(Identity::new(
            credentials.email.clone(),
            envelope.user.name,
            credentials.password.clone(),
        ))
    }

    async fn fetch_profile(&self, credentials: &Credentials) -> Result<String> {
        let mut attempt: u32 = 0;

        loop {
            let options = RequestOptions::with_basic_auth(BasicAuth::new(
                credentials.email.clone(),
                credentials.password.clone(),
            ))
            .timeout(self.config.timeout());

            match self.http.get(self.profile_url.as_str(), options).await {
                Ok(response) => return Ok(response.body),
                Err(HttpError::Status { status, .. }) => {
                    tracing::info!(email = %credentials.email, status, "Zendesk rejected credentials");
                    return Err(AppError::AuthenticationRejected { status });
                }
                Err(HttpError::InvalidRequest(msg)) => {
                    return Err(AppError::Config(format!("Invalid Zendesk request: {}", msg)));
                }
                Err(err @ (HttpError::Timeout | HttpError::Network(_))) => {
                    if attempt < self.config.network_retries {
                        let backoff = self
                            .config
                            .retry_backoff()
                            .saturating_mul(2u32.saturating_pow(attempt));
                        tracing::warn!(
                            attempt = attempt + 1,
                            backoff_ms = backoff.as_millis() as u64,
                            error = %err,
                            "Zendesk request failed, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempt += 1;
                        continue;
                    }

                    tracing::warn!(error = %err, "Zendesk unreachable");
                    return Err(AppError::Network(err.to_string()));
                }
            }
        }
    }

    /// Resolve the profile stored for `identifier` by a previous
    /// [`authenticate`](Self::authenticate).
    pub async fn lookup_by_session_key(&self, identifier: &str) -> Result<ZendeskUser> {
        let raw = self
            .session
            .get(&keys::profile_key(identifier))
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No Zendesk profile in session for {}", identifier))
            })?;

        let envelope = ProfileEnvelope::parse(&raw)
            .map_err(|e| AppError::SessionRead(format!("Stored Zendesk profile is invalid: {}", e)))?;

        Ok(envelope.user)
    }
}

impl<S: SessionStore> ZendeskUserProvider<ReqwestHttpClient, S> {
    /// Provider backed by a reqwest client whose default timeout matches
    /// `config`.
    pub fn with_default_client(config: ZendeskConfig, session: Arc<S>) -> Result<Self> {
        let http = ReqwestHttpClient::new(config.timeout())?;
        Self::new(config, Arc::new(http), session)
    }
}

#[async_trait]
impl<H: HttpClient, S: SessionStore> UserProvider for ZendeskUserProvider<H, S> {
    type User = Identity;
    type Record = ZendeskUser;

    async fn retrieve_by_credentials(&self, credentials: &Credentials) -> Result<Identity> {
        self.authenticate(credentials).await
    }

    async fn retrieve_by_id(&self, identifier: &str) -> Result<ZendeskUser> {
        self.lookup_by_session_key(identifier).await
    }

    fn validate_credentials(&self, user: &Identity, credentials: &Credentials) -> bool {
        let password_matches: bool = user
            .auth_password()
            .expose_secret()
            .as_bytes()
            .ct_eq(credentials.password.expose_secret().as_bytes())
            .into();
        user.email.eq_ignore_ascii_case(credentials.email.trim()) && password_matches
    }

    async fn forget(&self, identifier: &str) -> Result<()> {
        self.session.forget(&keys::profile_key(identifier)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpResponse, MockHttpClient};
    use crate::session::{MemorySessionStore, MockSessionStore};
    use pretty_assertions::assert_eq;
    use reqwest::Method;
    use rstest::rstest;
    use std::sync::atomic::{AtomicU32, Ordering};

    const ACME_BODY: &str = r#"{"user":{"name":"Acme Admin"}}"#;

    fn ok(body: &str) -> crate::http::HttpResult<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            body: body.to_string(),
        })
    }

    fn provider<H: HttpClient, S: SessionStore>(
        http: H,
        session: Arc<S>,
    ) -> ZendeskUserProvider<H, S> {
        ZendeskUserProvider::new(ZendeskConfig::new("acme"), Arc::new(http), session).unwrap()
    }

    #[test]
    fn test_profile_url_for_subdomain() {
        let url = profile_url(&ZendeskConfig::new("acme")).unwrap();
        assert_eq!(url.as_str(), "https://acme.zendesk.com/api/v2/users/me.json");
    }

    #[test]
    fn test_profile_url_lowercases_subdomain() {
        let url = profile_url(&ZendeskConfig::new(" Acme-Support ")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://acme-support.zendesk.com/api/v2/users/me.json"
        );
    }

    #[rstest]
    #[case("")]
    #[case("-acme")]
    #[case("acme-")]
    #[case("acme.evil.com")]
    #[case("evil.com/x?")]
    #[case("user@evil")]
    #[case("acme:8080")]
    #[case("a_b")]
    fn test_profile_url_rejects_invalid_subdomain(#[case] subdomain: &str) {
        let result = profile_url(&ZendeskConfig::new(subdomain));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_profile_url_with_base_override_keeps_fixed_path() {
        let mut config = ZendeskConfig::new("acme");
        config.api_base_url = Some("http://127.0.0.1:9000/ignored/prefix".to_string());
        let url = profile_url(&config).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/api/v2/users/me.json");
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut config = ZendeskConfig::new("acme");
        config.timeout_secs = 0;
        assert!(matches!(profile_url(&config), Err(AppError::Config(_))));

        let result = ZendeskUserProvider::new(
            config,
            Arc::new(MockHttpClient::new()),
            Arc::new(MemorySessionStore::new()),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_profile_url_rejects_non_http_base() {
        let mut config = ZendeskConfig::new("acme");
        config.api_base_url = Some("file:///etc/passwd".to_string());
        assert!(matches!(profile_url(&config), Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let mut http = MockHttpClient::new();
        http.expect_request()
            .withf(|method, url, options| {
                let auth = options.auth.as_ref().unwrap();
                *method == Method::GET
                    && url == "https://acme.zendesk.com/api/v2/users/me.json"
                    && auth.username == "a@acme.com"
                    && auth.password.expose_secret() == "p"
                    && options.timeout == Some(std::time::Duration::from_secs(10))
            })
            .times(1)
            .returning(|_, _, _| ok(ACME_BODY));

        let session = Arc::new(MemorySessionStore::new());
        let provider = provider(http, session.clone());

        let identity = provider
            .authenticate(&Credentials::new("a@acme.com", "p"))
            .await
            .unwrap();

        assert_eq!(identity.display_name, "Acme Admin");
        assert_eq!(identity.auth_identifier(), "a@acme.com");
        assert_eq!(identity.auth_password().expose_secret(), "p");
        assert_eq!(
            session
                .get(&keys::profile_key("a@acme.com"))
                .await
                .unwrap()
                .as_deref(),
            Some(ACME_BODY)
        );
    }

    #[tokio::test]
    async fn test_authenticate_rejected_does_not_touch_session() {
        let mut http = MockHttpClient::new();
        http.expect_request().times(1).returning(|_, _, _| {
            Err(HttpError::Status {
                status: 401,
                body: r#"{"error":"Couldn't authenticate you"}"#.to_string(),
            })
        });

        let mut session = MockSessionStore::new();
        session.expect_put().never();

        let provider = provider(http, Arc::new(session));
        let result = provider
            .authenticate(&Credentials::new("a@acme.com", "wrong"))
            .await;

        assert!(matches!(
            result,
            Err(AppError::AuthenticationRejected { status: 401 })
        ));
    }

    #[rstest]
    #[case(r#"{"foo":1}"#)]
    #[case(r#"{"user":{"email":"a@acme.com"}}"#)]
    #[case("not json")]
    #[tokio::test]
    async fn test_authenticate_malformed_response(#[case] body: &'static str) {
        let mut http = MockHttpClient::new();
        http.expect_request()
            .times(1)
            .returning(move |_, _, _| ok(body));

        let mut session = MockSessionStore::new();
        session.expect_put().never();

        let provider = provider(http, Arc::new(session));
        let result = provider
            .authenticate(&Credentials::new("a@acme.com", "p"))
            .await;

        assert!(matches!(result, Err(AppError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_authenticate_invalid_credentials_skip_network() {
        let mut http = MockHttpClient::new();
        http.expect_request().never();

        let provider = provider(http, Arc::new(MemorySessionStore::new()));
        let result = provider.authenticate(&Credentials::new("a@acme.com", "")).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_validation_error_does_not_leak_password() {
        let mut http = MockHttpClient::new();
        http.expect_request().never();

        let provider = provider(http, Arc::new(MemorySessionStore::new()));
        let err = provider
            .authenticate(&Credentials::new("not-an-email", "hunter2"))
            .await
            .unwrap_err();

        let AppError::Validation(message) = &err else {
            panic!("expected validation error, got {:?}", err);
        };
        assert!(!message.contains("hunter2"));
        assert!(!format!("{:?}", err).contains("hunter2"));
    }

    #[rstest]
    #[case(r#"{"user":{"name":"Alice","id":"abc"}}"#)]
    #[case(r#"{"user":{"name":"Alice","id":-1,"role":7,"email":false}}"#)]
    #[tokio::test]
    async fn test_authenticate_accepts_unusual_profile_fields(#[case] body: &'static str) {
        let mut http = MockHttpClient::new();
        http.expect_request()
            .times(1)
            .returning(move |_, _, _| ok(body));

        let session = Arc::new(MemorySessionStore::new());
        let provider = provider(http, session.clone());
        let identity = provider
            .authenticate(&Credentials::new("a@acme.com", "p"))
            .await
            .unwrap();

        assert_eq!(identity.display_name, "Alice");
        let stored = provider.lookup_by_session_key("a@acme.com").await.unwrap();
        assert_eq!(stored.name, "Alice");
        assert!(stored.id().is_none());
    }

    #[tokio::test]
    async fn test_authenticate_timeout_is_network_error() {
        let mut http = MockHttpClient::new();
        http.expect_request()
            .times(1)
            .returning(|_, _, _| Err(HttpError::Timeout));

        let provider = provider(http, Arc::new(MemorySessionStore::new()));
        let result = provider
            .authenticate(&Credentials::new("a@acme.com", "p"))
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
        assert!(err.is_authentication_failure());
    }

    #[tokio::test]
    async fn test_network_retries_are_bounded() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let mut http = MockHttpClient::new();
        http.expect_request().returning(move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(HttpError::Network("connection refused".to_string()))
        });

        let mut config = ZendeskConfig::new("acme");
        config.network_retries = 2;
        config.retry_backoff_ms = 1;
        let provider = ZendeskUserProvider::new(
            config,
            Arc::new(http),
            Arc::new(MemorySessionStore::new()),
        )
        .unwrap();

        let result = provider
            .authenticate(&Credentials::new("a@acme.com", "p"))
            .await;

        assert!(matches!(result, Err(AppError::Network(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let mut http = MockHttpClient::new();
        http.expect_request().returning(move |_, _, _| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(HttpError::Timeout)
            } else {
                ok(ACME_BODY)
            }
        });

        let mut config = ZendeskConfig::new("acme");
        config.network_retries = 1;
        config.retry_backoff_ms = 1;
        let provider = ZendeskUserProvider::new(
            config,
            Arc::new(http),
            Arc::new(MemorySessionStore::new()),
        )
        .unwrap();

        let identity = provider
            .authenticate(&Credentials::new("a@acme.com", "p"))
            .await
            .unwrap();
        assert_eq!(identity.display_name, "Acme Admin");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejection_is_never_retried() {
        let mut http = MockHttpClient::new();
        http.expect_request().times(1).returning(|_, _, _| {
            Err(HttpError::Status {
                status: 403,
                body: String::new(),
            })
        });

        let mut config = ZendeskConfig::new("acme");
        config.network_retries = 3;
        let provider = ZendeskUserProvider::new(
            config,
            Arc::new(http),
            Arc::new(MemorySessionStore::new()),
        )
        .unwrap();

        let result = provider
            .authenticate(&Credentials::new("a@acme.com", "p"))
            .await;
        assert!(matches!(
            result,
            Err(AppError::AuthenticationRejected { status: 403 })
        ));
    }

    #[tokio::test]
    async fn test_authenticate_twice_overwrites_session_entry() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let mut http = MockHttpClient::new();
        http.expect_request().times(2).returning(move |_, _, _| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            ok(&format!(r#"{{"user":{{"name":"Admin {}"}}}}"#, n))
        });

        let session = Arc::new(MemorySessionStore::new());
        let provider = provider(http, session.clone());
        let credentials = Credentials::new("a@acme.com", "p");

        provider.authenticate(&credentials).await.unwrap();
        let second = provider.authenticate(&credentials).await.unwrap();

        assert_eq!(second.display_name, "Admin 1");
        assert_eq!(session.len().await, 1);
        let stored = provider.lookup_by_session_key("a@acme.com").await.unwrap();
        assert_eq!(stored.name, "Admin 1");
    }

    #[tokio::test]
    async fn test_sessions_of_different_users_do_not_collide() {
        let mut http = MockHttpClient::new();
        http.expect_request().returning(|_, _, options| {
            let name = match options.auth.as_ref().map(|a| a.username.as_str()) {
                Some("a@acme.com") => "Alice",
                _ => "Bob",
            };
            ok(&format!(r#"{{"user":{{"name":"{}"}}}}"#, name))
        });

        let provider = provider(http, Arc::new(MemorySessionStore::new()));
        provider
            .authenticate(&Credentials::new("a@acme.com", "p"))
            .await
            .unwrap();
        provider
            .authenticate(&Credentials::new("b@acme.com", "q"))
            .await
            .unwrap();

        assert_eq!(
            provider.lookup_by_session_key("a@acme.com").await.unwrap().name,
            "Alice"
        );
        assert_eq!(
            provider.lookup_by_session_key("b@acme.com").await.unwrap().name,
            "Bob"
        );
    }

    #[tokio::test]
    async fn test_lookup_missing_key_is_not_found() {
        let provider = provider(MockHttpClient::new(), Arc::new(MemorySessionStore::new()));
        let result = provider.lookup_by_session_key("nobody@acme.com").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_lookup_corrupt_record_is_session_read_error() {
        let session = Arc::new(MemorySessionStore::new());
        session
            .put(&keys::profile_key("a@acme.com"), "{not json".to_string())
            .await
            .unwrap();

        let provider = provider(MockHttpClient::new(), session);
        let result = provider.lookup_by_session_key("a@acme.com").await;
        assert!(matches!(result, Err(AppError::SessionRead(_))));
    }

    #[tokio::test]
    async fn test_validate_credentials() {
        let provider = provider(MockHttpClient::new(), Arc::new(MemorySessionStore::new()));
        let identity = Identity::new(
            "a@acme.com",
            "Acme Admin",
            secrecy::SecretString::new("p".to_string()),
        );

        assert!(provider.validate_credentials(&identity, &Credentials::new("A@Acme.com", "p")));
        assert!(!provider.validate_credentials(&identity, &Credentials::new("a@acme.com", "q")));
        assert!(!provider.validate_credentials(&identity, &Credentials::new("b@acme.com", "p")));
        assert!(!provider.validate_credentials(&identity, &Credentials::new("a@acme.com", "pp")));
        assert!(!provider.validate_credentials(&identity, &Credentials::new("a@acme.com", "")));
    }

    #[tokio::test]
    async fn test_forget_removes_profile() {
        let session = Arc::new(MemorySessionStore::new());
        session
            .put(&keys::profile_key("a@acme.com"), ACME_BODY.to_string())
            .await
            .unwrap();

        let provider = provider(MockHttpClient::new(), session.clone());
        provider.forget("a@acme.com").await.unwrap();
        assert!(session.is_empty().await);
    }
}

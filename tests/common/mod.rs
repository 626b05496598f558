//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;
use zendesk_auth::config::ZendeskConfig;
use zendesk_auth::http::ReqwestHttpClient;
use zendesk_auth::session::MemorySessionStore;
use zendesk_auth::ZendeskUserProvider;

pub const PROFILE_PATH: &str = "/api/v2/users/me.json";

pub type TestProvider = ZendeskUserProvider<ReqwestHttpClient, MemorySessionStore>;

/// Zendesk config for the `acme` tenant, routed to the mock server
pub fn zendesk_config(mock_server: &MockServer) -> ZendeskConfig {
    let mut config = ZendeskConfig::new("acme");
    config.api_base_url = Some(mock_server.uri());
    config.timeout_secs = 2;
    config
}

pub fn create_provider(config: ZendeskConfig) -> (TestProvider, Arc<MemorySessionStore>) {
    let session = Arc::new(MemorySessionStore::new());
    let provider = ZendeskUserProvider::with_default_client(config, session.clone())
        .expect("valid zendesk config");
    (provider, session)
}

pub fn http_client(timeout: Duration) -> ReqwestHttpClient {
    ReqwestHttpClient::new(timeout).expect("http client")
}

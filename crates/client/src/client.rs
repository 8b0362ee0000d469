//! API client and service accessors.

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::services::{AuthService, BankService, SimulationService};
use crate::tokens::{TokenStore, TokenStoreProvider};
use riskdash_cache::DomainCaches;
use riskdash_realtime::RealtimeClient;
use riskdash_realtime::transport::Connector;
use std::sync::Arc;
use tracing::info;

/// Entry point to the backend.
///
/// Cloning is cheap; clones share the HTTP connection pool, token store and
/// caches.
#[derive(Clone)]
pub struct ApiClient {
    config: ClientConfig,
    http: HttpClient,
    caches: Arc<DomainCaches>,
}

impl ApiClient {
    /// Creates a new client with fresh caches built from `config`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let caches = Arc::new(DomainCaches::new(config.cache));
        Self::with_caches(config, tokens, caches)
    }

    /// Creates a new client sharing existing `caches`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_caches(
        config: ClientConfig,
        tokens: Arc<dyn TokenStore>,
        caches: Arc<DomainCaches>,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {e}")))?;
        info!(base_url = %config.base_url, "API client ready");
        Ok(Self {
            http: HttpClient::new(client, &config.base_url, tokens),
            config,
            caches,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the shared caches.
    #[must_use]
    pub fn caches(&self) -> &Arc<DomainCaches> {
        &self.caches
    }

    /// Returns the token store.
    #[must_use]
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        self.http.tokens()
    }

    /// Whether an access token is stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.http.tokens().access_token().is_some()
    }

    /// Creates an AuthService instance.
    #[must_use]
    pub fn auth(&self) -> AuthService {
        AuthService::new(self.http.clone(), self.caches.clone())
    }

    /// Creates a BankService instance.
    #[must_use]
    pub fn banks(&self) -> BankService {
        BankService::new(self.http.clone(), self.caches.clone())
    }

    /// Creates a SimulationService instance.
    #[must_use]
    pub fn simulations(&self) -> SimulationService {
        SimulationService::new(self.http.clone(), self.caches.clone())
    }

    /// Creates a realtime client for the same backend, authenticated from
    /// this client's token store.
    #[must_use]
    pub fn realtime(&self, connector: Arc<dyn Connector>) -> RealtimeClient {
        RealtimeClient::new(
            self.config.realtime_config(),
            connector,
            Arc::new(TokenStoreProvider::new(self.http.tokens().clone())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::MemoryTokenStore;
    use riskdash_realtime::transport::TungsteniteConnector;

    #[tokio::test]
    async fn test_services_share_caches_and_tokens() {
        let tokens = Arc::new(MemoryTokenStore::new());
        let client = ApiClient::new(ClientConfig::new("https://risk.example.com"), tokens.clone())
            .unwrap();
        assert!(!client.is_authenticated());
        tokens.store("jwt", None).unwrap();
        assert!(client.clone().is_authenticated());

        let realtime = client.realtime(Arc::new(TungsteniteConnector));
        assert_eq!(realtime.config().ws_url, "wss://risk.example.com/ws");
        assert!(!realtime.is_connected());
        assert!(Arc::ptr_eq(client.caches(), client.clone().caches()));
    }
}

//! Shared request plumbing for the services.

use crate::error::ApiError;
use crate::tokens::TokenStore;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

/// Which token, if any, a request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    None,
    Access,
    Refresh,
}

/// HTTP transport bound to one backend and one token store.
#[derive(Clone)]
pub(crate) struct HttpClient {
    client: reqwest::Client,
    base_url: Arc<str>,
    tokens: Arc<dyn TokenStore>,
}

impl HttpClient {
    pub(crate) fn new(client: reqwest::Client, base_url: &str, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            tokens,
        }
    }

    pub(crate) fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// The base URL followed by `segments`, each escaped as a single path segment.
    ///
    /// # Errors
    /// Returns [`ApiError::Network`] when the base URL cannot carry a path.
    pub(crate) fn segments_url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::Network(format!("Invalid base URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Network(format!("Base URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Starts a request with the bearer token for `auth` attached.
    pub(crate) fn request(&self, method: Method, path: &str, auth: Auth) -> RequestBuilder {
        self.authorize(self.client.request(method, self.url(path)), auth)
    }

    /// Like [`request`](Self::request) for a path holding caller-supplied
    /// values, such as tokens, that must not be read as URL syntax.
    pub(crate) fn request_segments(
        &self,
        method: Method,
        segments: &[&str],
        auth: Auth,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.segments_url(segments)?;
        Ok(self.authorize(self.client.request(method, url), auth))
    }

    fn authorize(&self, builder: RequestBuilder, auth: Auth) -> RequestBuilder {
        let token = match auth {
            Auth::None => None,
            Auth::Access => self.tokens.access_token(),
            Auth::Refresh => self.tokens.refresh_token(),
        };
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path, Auth::Access)
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path, Auth::Access)
    }

    pub(crate) fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path, Auth::Access)
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path, Auth::Access)
    }
}

/// Sends `request` and decodes a JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
    let bytes = send_bytes(request).await?;
    serde_json::from_slice(&bytes).map_err(ApiError::from)
}

/// Sends `request` and returns the raw body of a successful response.
pub(crate) async fn send_bytes(request: RequestBuilder) -> Result<Vec<u8>, ApiError> {
    let response = request.send().await?;
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
}

/// Sends `request`, discarding a successful body.
pub(crate) async fn send_empty(request: RequestBuilder) -> Result<(), ApiError> {
    send_bytes(request).await.map(|_| ())
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        debug!(status = status.as_u16(), url = %response.url(), "Request succeeded");
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.bytes().await.unwrap_or_default();
    let err = ApiError::from_response(status.as_u16(), &body);
    warn!(status = status.as_u16(), url = %url, error = %err, "Request failed");
    Err(err)
}

use crate::reconnect::ReconnectPolicy;
use std::time::Duration;

/// Configuration for [`crate::RealtimeClient`].
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// WebSocket endpoint, without the token query parameter.
    pub ws_url: String,
    /// Reconnect attempts after an abnormal close before giving up.
    pub max_reconnect_attempts: u32,
    /// Delay before the first reconnect; doubled per attempt.
    pub base_reconnect_delay: Duration,
    /// Upper bound on a single connection handshake.
    pub connect_timeout: Duration,
    /// Capacity of each [`crate::EventStream`] buffer.
    pub event_buffer: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:5000/ws".to_string(),
            max_reconnect_attempts: 5,
            base_reconnect_delay: Duration::from_millis(1000),
            connect_timeout: Duration::from_secs(10),
            event_buffer: 64,
        }
    }
}

impl RealtimeConfig {
    /// Config pointing at the `/ws` endpoint of the API at `api_base_url`.
    #[must_use]
    pub fn for_api(api_base_url: &str) -> Self {
        Self {
            ws_url: ws_url_from_api(api_base_url),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(self.base_reconnect_delay, self.max_reconnect_attempts)
    }

    /// Endpoint with `token` appended as a query parameter.
    #[must_use]
    pub fn url_with_token(&self, token: Option<&str>) -> String {
        match token {
            Some(token) if !token.is_empty() => {
                let sep = if self.ws_url.contains('?') { '&' } else { '?' };
                format!("{}{sep}token={token}", self.ws_url)
            }
            _ => self.ws_url.clone(),
        }
    }
}

/// Maps an HTTP(S) API base URL to its same-origin WebSocket endpoint.
#[must_use]
pub fn ws_url_from_api(api_base_url: &str) -> String {
    let base = api_base_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{base}/ws")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url_from_api() {
        assert_eq!(ws_url_from_api("http://localhost:5000"), "ws://localhost:5000/ws");
        assert_eq!(
            ws_url_from_api("https://risk.example.com/"),
            "wss://risk.example.com/ws"
        );
    }

    #[test]
    fn test_url_with_token() {
        let config = RealtimeConfig::default();
        assert_eq!(
            config.url_with_token(Some("abc")),
            "ws://localhost:5000/ws?token=abc"
        );
        assert_eq!(config.url_with_token(None), "ws://localhost:5000/ws");
        assert_eq!(config.url_with_token(Some("")), "ws://localhost:5000/ws");
    }
}

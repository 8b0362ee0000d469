use thiserror::Error;

/// Errors raised by the realtime client.
#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("WebSocket connection failed: {0}")]
    Connection(String),

    #[error("WebSocket error: {0}")]
    Transport(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("Connection closed")]
    Closed,

    #[error("Client has been shut down")]
    ShutDown,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

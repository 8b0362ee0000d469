//! WebSocket client for live simulation updates.
//!
//! This crate provides:
//! - A reconnecting WebSocket client with bounded exponential backoff
//! - Publish/subscribe dispatch of server events by type
//! - Typed payloads for simulation progress, status and notifications
//! - A transport seam so the socket can be replaced in tests

/// Prelude module for convenient imports.
pub mod prelude;

/// Reconnecting client.
pub mod client;
/// Client configuration.
pub mod config;
/// Realtime errors.
pub mod error;
/// Event listener registry.
pub mod listeners;
/// Wire protocol.
pub mod protocol;
/// Reconnect backoff policy.
pub mod reconnect;
/// Socket transport abstraction.
pub mod transport;

pub use client::{ConnectionState, RealtimeClient, StaticToken, TokenProvider};
pub use config::RealtimeConfig;
pub use error::RealtimeError;
pub use listeners::{EventStream, Subscription};

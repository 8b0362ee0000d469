//! REST client for the systemic-risk simulation backend.
//!
//! This crate provides:
//! - Typed services for authentication, banks and simulations
//! - Response caching through the domain caches, with invalidation on writes
//! - Pluggable token storage shared with the realtime client
//! - A typed error taxonomy decoded from the backend's error bodies

/// Prelude module for convenient imports.
pub mod prelude;

/// API client and service accessors.
pub mod client;
/// Client configuration.
pub mod config;
/// API errors.
pub mod error;
/// Resource services.
pub mod services;
/// Access and refresh token storage.
pub mod tokens;

mod http;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use tokens::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreProvider};

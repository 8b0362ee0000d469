//! In-memory TTL caches for API responses.
//!
//! This crate provides:
//! - A generic [`TtlCache`] with per-entry expiry and an injectable clock
//! - Domain-scoped caches for simulations, users and banks
//! - Key builders shared by every service that reads or invalidates entries
//! - A background sweeper that evicts expired entries on a fixed period
//!
//! Nothing is persisted. Memory is bounded only by expiry and invalidation.

/// Prelude module for convenient imports.
pub mod prelude;

/// Time sources.
pub mod clock;
/// Domain-scoped caches.
pub mod domain;
/// Cache key builders.
pub mod keys;
/// Periodic expiry sweeper.
pub mod sweeper;
/// Generic TTL cache.
pub mod ttl;

pub use domain::{BankEntry, CacheConfig, DomainCaches, SimulationEntry};
pub use sweeper::CacheSweeper;
pub use ttl::{CacheStats, TtlCache};

//! Domain types for the systemic-risk dashboard.
//!
//! Everything in this crate is a plain data-transfer object owned by the
//! simulation backend. The client only reads, validates, caches and renders
//! these values:
//! - Simulations, their parameters and lifecycle status
//! - Monte Carlo results (traditional vs blockchain scenario summaries)
//! - Banks and the interbank exposure matrix
//! - Users, sessions and share links

/// Prelude module for convenient imports.
pub mod prelude;

/// Entity types received from the API.
pub mod entities;
/// Enumerations shared across the workspace.
pub mod enums;
/// Validation errors.
pub mod error;
/// Value objects (parameters, paging, comparison metrics).
pub mod value_objects;

pub use error::ValidationError;

//! Services for the backend's resource families.
//!
//! Each service wraps the shared HTTP transport and domain caches. Reads go
//! through the cache; writes invalidate the keys they could have staled.

mod auth;
mod banks;
mod simulations;

pub use auth::AuthService;
pub use banks::BankService;
pub use simulations::SimulationService;

use serde::Deserialize;

/// `{"message": ...}` acknowledgement.
#[derive(Debug, Deserialize)]
pub(crate) struct MessageBody {
    #[serde(default)]
    pub message: String,
}

//! Prelude module for convenient imports.

pub use crate::client::ApiClient;
pub use crate::config::ClientConfig;
pub use crate::error::ApiError;
pub use crate::services::{AuthService, BankService, SimulationService};
pub use crate::tokens::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreProvider};

//! Prelude module for convenient imports.
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::domain::{BankEntry, CacheConfig, DomainCaches, SimulationEntry, SweepReport};
pub use crate::keys;
pub use crate::sweeper::CacheSweeper;
pub use crate::ttl::{CacheStats, TtlCache};

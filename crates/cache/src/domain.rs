//! Caches scoped to the three API resource families.

use crate::clock::{Clock, SystemClock};
use crate::ttl::TtlCache;
use riskdash_domain::entities::{Bank, Simulation, SimulationResults, User};
use riskdash_domain::value_objects::{BankPage, ExposureMatrix, SimulationPage};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Expiry settings for [`DomainCaches`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL for simulations, simulation pages and results.
    pub simulations_ttl: Duration,
    /// TTL for the current user profile.
    pub users_ttl: Duration,
    /// TTL for banks, bank pages and the exposure matrix.
    pub banks_ttl: Duration,
    /// Period of the background sweep.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            simulations_ttl: Duration::from_secs(10 * 60),
            users_ttl: Duration::from_secs(30 * 60),
            banks_ttl: Duration::from_secs(60 * 60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Values stored in the simulations cache.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationEntry {
    Simulation(Simulation),
    Page(SimulationPage),
    Results(Box<SimulationResults>),
}

/// Values stored in the banks cache.
#[derive(Debug, Clone, PartialEq)]
pub enum BankEntry {
    Bank(Bank),
    Page(BankPage),
    Exposure(ExposureMatrix),
}

/// Number of entries each cache dropped in one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub simulations: usize,
    pub users: usize,
    pub banks: usize,
}

impl SweepReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.simulations + self.users + self.banks
    }
}

/// Independent caches for simulations, users and banks.
///
/// The three caches share an implementation and a clock but never storage.
#[derive(Debug)]
pub struct DomainCaches {
    /// Simulations, simulation list pages and results.
    pub simulations: TtlCache<SimulationEntry>,
    /// Current user profile.
    pub users: TtlCache<User>,
    /// Banks, bank list pages and the exposure matrix.
    pub banks: TtlCache<BankEntry>,
    /// Expiry settings.
    config: CacheConfig,
}

impl DomainCaches {
    /// Creates new domain caches on the system clock.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates new domain caches reading time from `clock`.
    #[must_use]
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            simulations: TtlCache::with_clock(clock.clone()),
            users: TtlCache::with_clock(clock.clone()),
            banks: TtlCache::with_clock(clock),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    #[must_use]
    pub fn simulations_ttl(&self) -> Duration {
        self.config.simulations_ttl
    }

    #[must_use]
    pub fn users_ttl(&self) -> Duration {
        self.config.users_ttl
    }

    #[must_use]
    pub fn banks_ttl(&self) -> Duration {
        self.config.banks_ttl
    }

    /// Evicts expired entries from all three caches.
    pub fn cleanup_all(&self) -> SweepReport {
        let report = SweepReport {
            simulations: self.simulations.cleanup(),
            users: self.users.cleanup(),
            banks: self.banks.cleanup(),
        };
        if report.total() > 0 {
            debug!(
                simulations = report.simulations,
                users = report.users,
                banks = report.banks,
                "Swept expired cache entries"
            );
        }
        report
    }

    /// Drops everything, e.g. on logout.
    pub fn clear_all(&self) {
        self.simulations.clear();
        self.users.clear();
        self.banks.clear();
    }
}

impl Default for DomainCaches {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

//! Registry timing configuration.

use std::time::Duration;

/// How often the sweeper runs by default.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Default expiry, as a multiple of the sweep interval.
pub const EXPIRY_FACTOR: u32 = 7;

/// Timing of the background sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Period between sweeps.
    pub sweep_interval: Duration,
    /// Entries untouched for at least this long are removed by a sweep.
    pub expiry: Duration,
}

impl RegistryConfig {
    /// Sweeps every `sweep_interval`, expiring after `EXPIRY_FACTOR` intervals.
    pub fn new(sweep_interval: Duration) -> Self {
        Self { sweep_interval, expiry: sweep_interval * EXPIRY_FACTOR }
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SWEEP_INTERVAL)
    }
}

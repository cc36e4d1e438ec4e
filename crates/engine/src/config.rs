//! Ledger configuration: a builder over the policy constants a `Ledger` opens
//! with, following the same `with_*`-setter/`validate()` shape the rest of
//! this workspace uses for its configuration types.

use ledger_core::account::pack_currency;
use ledger_core::{
    LedgerResult, DEFAULT_CHECKPOINT_INTERVAL, DEFAULT_CURRENCY, INITIAL_TABLE_CAPACITY,
    MAX_TABLE_CAPACITY,
};
use ledger_core::LedgerError;

/// Tunable policy for a [`crate::ledger::Ledger`]: checkpoint cadence, account
/// table sizing, and the default currency assigned to newly created accounts.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Number of committing operations between automatic checkpoints.
    pub checkpoint_interval: u64,
    /// Initial capacity of the account table.
    pub initial_capacity: u32,
    /// Capacity ceiling the account table will not grow past.
    pub max_capacity: u32,
    /// Default currency assigned when a caller doesn't specify one.
    pub default_currency: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            initial_capacity: INITIAL_TABLE_CAPACITY,
            max_capacity: MAX_TABLE_CAPACITY,
            default_currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl LedgerConfig {
    /// Override the checkpoint interval.
    pub fn with_checkpoint_interval(mut self, interval: u64) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    /// Override the account table's initial capacity.
    pub fn with_initial_capacity(mut self, capacity: u32) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Override the account table's growth ceiling.
    pub fn with_max_capacity(mut self, capacity: u32) -> Self {
        self.max_capacity = capacity;
        self
    }

    /// Override the default currency code.
    pub fn with_default_currency(mut self, currency: impl Into<String>) -> Self {
        self.default_currency = currency.into();
        self
    }

    /// Validate internal consistency. Called by [`crate::ledger::Ledger::open_with_config`]
    /// before anything is opened on disk.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.checkpoint_interval == 0 {
            return Err(LedgerError::Invalid(
                "checkpoint_interval must be nonzero".to_string(),
            ));
        }
        if self.initial_capacity == 0 {
            return Err(LedgerError::Invalid(
                "initial_capacity must be nonzero".to_string(),
            ));
        }
        if self.max_capacity < self.initial_capacity {
            return Err(LedgerError::Invalid(
                "max_capacity must be at least initial_capacity".to_string(),
            ));
        }
        pack_currency(&self.default_currency)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_constants() {
        let config = LedgerConfig::default();
        assert_eq!(config.checkpoint_interval, 100);
        assert_eq!(config.initial_capacity, 4096);
        assert_eq!(config.max_capacity, 1 << 20);
        assert_eq!(config.default_currency, "USD");
        config.validate().unwrap();
    }

    #[test]
    fn rejects_zero_checkpoint_interval() {
        let config = LedgerConfig::default().with_checkpoint_interval(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_max_below_initial() {
        let config = LedgerConfig::default()
            .with_initial_capacity(1000)
            .with_max_capacity(500);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_currency() {
        let config = LedgerConfig::default().with_default_currency("TOOLONG");
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_chains() {
        let config = LedgerConfig::default()
            .with_checkpoint_interval(10)
            .with_initial_capacity(16)
            .with_max_capacity(256)
            .with_default_currency("EUR");
        assert_eq!(config.checkpoint_interval, 10);
        assert_eq!(config.initial_capacity, 16);
        assert_eq!(config.max_capacity, 256);
        assert_eq!(config.default_currency, "EUR");
    }
}

//! Ledger configuration.
//!
//! Built explicitly and handed to each [`crate::Ledger`]; nothing here is
//! global.

use crate::error::{LedgerError, Result};
use crate::money::Cents;
use std::env;
use std::str::FromStr;

/// Environment variable overriding [`LedgerConfig::max_amount`].
pub const MAX_AMOUNT_ENV: &str = "LEDGER_MAX_AMOUNT";

/// Tunables for a ledger instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Largest raw amount accepted for a single movement.
    pub max_amount: Cents,
}

impl LedgerConfig {
    /// 1,000,000,000.00
    pub const DEFAULT_MAX_AMOUNT: Cents = Cents::new(100_000_000_000);

    pub fn new(max_amount: Cents) -> Self {
        LedgerConfig { max_amount }
    }

    /// Reads overrides from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        match env::var(MAX_AMOUNT_ENV) {
            Ok(raw) => Self::from_max_amount_str(&raw),
            Err(env::VarError::NotPresent) => Ok(Self::default()),
            Err(e) => Err(LedgerError::Config(format!("{}: {}", MAX_AMOUNT_ENV, e))),
        }
    }

    fn from_max_amount_str(raw: &str) -> Result<Self> {
        let max_amount = Cents::from_str(raw)?;
        if !max_amount.is_positive() {
            return Err(LedgerError::AmountInvalid {
                amount: raw.trim().to_string(),
                reason: "maximum amount must be positive",
            });
        }
        Ok(Self::new(max_amount))
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_AMOUNT)
    }
}

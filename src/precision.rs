//! Rounding and tolerance policy shared by the ledger and the solver.

use crate::error::{LedgerError, Result};
use crate::money::Money;
use std::env;
use std::str::FromStr;

/// Environment variable overriding [`Precision::scale`].
pub const SCALE_ENV: &str = "TRIP_SETTLE_SCALE";

/// Environment variable overriding [`Precision::epsilon`].
pub const EPSILON_ENV: &str = "TRIP_SETTLE_EPSILON";

/// Currency precision used when comparing and rounding balances.
///
/// Balances within `epsilon` of zero are treated as settled, and every
/// intermediate settlement balance is rounded to `scale` decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    /// Number of decimal places kept after each settlement step.
    pub scale: u32,

    /// Inclusive tolerance around zero.
    pub epsilon: Money,
}

impl Precision {
    /// Creates a policy, rejecting scales finer than the storage scale and
    /// negative tolerances.
    pub fn new(scale: u32, epsilon: Money) -> Result<Self> {
        if scale > Money::SCALE {
            return Err(LedgerError::InvalidPrecision(format!(
                "scale {} exceeds storage scale {}",
                scale,
                Money::SCALE
            )));
        }
        if epsilon.is_negative() {
            return Err(LedgerError::InvalidPrecision(format!(
                "epsilon {} is negative",
                epsilon.format(Money::SCALE)
            )));
        }
        Ok(Precision { scale, epsilon })
    }

    /// Reads `TRIP_SETTLE_SCALE` and `TRIP_SETTLE_EPSILON`, falling back to
    /// the defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Precision::default();

        let scale = match lookup(SCALE_ENV) {
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| {
                LedgerError::InvalidPrecision(format!("{}={:?}: {}", SCALE_ENV, raw, e))
            })?,
            None => defaults.scale,
        };

        let epsilon = match lookup(EPSILON_ENV) {
            Some(raw) => Money::from_str(&raw).map_err(|e| {
                LedgerError::InvalidPrecision(format!("{}={:?}: {}", EPSILON_ENV, raw, e))
            })?,
            None => defaults.epsilon,
        };

        Precision::new(scale, epsilon)
    }

    /// Rounds `amount` to this policy's scale.
    pub fn round(&self, amount: Money) -> Money {
        amount.round(self.scale)
    }

    /// Returns `true` if `amount` lies within the epsilon band around zero.
    pub fn is_settled(&self, amount: Money) -> bool {
        amount.abs() <= self.epsilon
    }
}

impl Default for Precision {
    fn default() -> Self {
        Precision {
            scale: 2,
            epsilon: Money::from_cents(1),
        }
    }
}

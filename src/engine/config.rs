use std::time::Duration;

use tracing::warn;

use crate::types::Monetary;
use crate::workflows::MINIMUM_WITHDRAWAL;

pub const MINIMUM_WITHDRAWAL_VAR: &str = "WALLET_MINIMUM_WITHDRAWAL";
pub const OPERATION_TIMEOUT_VAR: &str = "WALLET_OPERATION_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Smallest amount a withdrawal may request.
    pub minimum_withdrawal: Monetary,
    /// How long a caller waits on a wallet actor before reporting a timeout.
    pub operation_timeout: Duration,
    /// Bound of the channel between the CSV reader and the engine.
    pub backpressure: usize
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            minimum_withdrawal: Monetary::from(MINIMUM_WITHDRAWAL),
            operation_timeout: Duration::from_secs(5),
            backpressure: 256
        }
    }
}

impl EngineConfig {
    pub fn with_minimum_withdrawal(mut self, minimum: Monetary) -> Self {
        self.minimum_withdrawal = minimum;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn with_backpressure(mut self, backpressure: usize) -> Self {
        self.backpressure = backpressure.max(1);
        self
    }

    /// Applies `WALLET_MINIMUM_WITHDRAWAL` and `WALLET_OPERATION_TIMEOUT_MS` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key lookup. Invalid values are logged and the current value kept.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>
    {
        if let Some(value) = lookup(MINIMUM_WITHDRAWAL_VAR) {
            match value.parse::<Monetary>() {
                Ok(minimum) if minimum.is_positive() => self.minimum_withdrawal = minimum,
                Ok(minimum) => warn!("Ignoring {MINIMUM_WITHDRAWAL_VAR}={minimum}, it must be positive"),
                Err(error) => warn!("Ignoring {MINIMUM_WITHDRAWAL_VAR}={value}: {error}")
            }
        }

        if let Some(value) = lookup(OPERATION_TIMEOUT_VAR) {
            match value.trim().parse::<u64>() {
                Ok(millis) if millis > 0 => self.operation_timeout = Duration::from_millis(millis),
                Ok(_) => warn!("Ignoring {OPERATION_TIMEOUT_VAR}=0, it must be positive"),
                Err(error) => warn!("Ignoring {OPERATION_TIMEOUT_VAR}={value}: {error}")
            }
        }

        self
    }
}

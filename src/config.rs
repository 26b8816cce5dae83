//! Broker-wide configuration and defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Validated defaults handed to queues and the MPSC consumer worker.
///
/// A [`crate::manager::MpscManager`] does not require a `BrokerConfig` to
/// function — queues are still constructed and handed to `add_queue`
/// directly — but the lock-free consumer worker's poll interval and the
/// drain-size logging threshold are sourced from it when one is supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Capacity used when a caller asks the broker to size a queue for them.
    pub default_queue_capacity: usize,

    /// How long the MPSC worker sleeps between empty polls of a lock-free
    /// queue. See [`crate::queue::LockFreeQueue`] for why polling is
    /// unavoidable there.
    pub lockfree_poll_interval: Duration,

    /// Warn when a single drain (`remove_queue`/`unsubscribe`) discards
    /// more buffered values than this.
    pub drain_log_threshold: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            default_queue_capacity: 1024,
            lockfree_poll_interval: Duration::from_micros(50),
            drain_log_threshold: 10_000,
        }
    }
}

impl BrokerConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.default_queue_capacity == 0 {
            return Err(Error::Config(
                "default_queue_capacity must be non-zero".to_string(),
            ));
        }

        if self.lockfree_poll_interval.is_zero() {
            return Err(Error::Config(
                "lockfree_poll_interval must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

//! Registry-transition and queue-traffic counters.
//!
//! These are independent of the [`crate::queue::State`] return values:
//! `State` tells one caller what happened to one call, `BrokerMetrics`
//! accumulates what happened across the lifetime of a manager.

use serde::{Deserialize, Serialize};

/// Monotonic counters over manager and queue activity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrokerMetrics {
    queues_added: u64,
    queues_removed: u64,
    producers_registered: u64,
    producers_unregistered: u64,
    consumers_subscribed: u64,
    consumers_unsubscribed: u64,
    values_enqueued: u64,
    enqueue_full: u64,
    enqueue_disabled: u64,
    values_consumed: u64,
}

impl BrokerMetrics {
    /// Create a fresh, zeroed set of counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_queue_added(&mut self) {
        self.queues_added += 1;
    }

    pub(crate) fn record_queue_removed(&mut self) {
        self.queues_removed += 1;
    }

    pub(crate) fn record_producer_registered(&mut self) {
        self.producers_registered += 1;
    }

    pub(crate) fn record_producer_unregistered(&mut self) {
        self.producers_unregistered += 1;
    }

    pub(crate) fn record_consumer_subscribed(&mut self) {
        self.consumers_subscribed += 1;
    }

    pub(crate) fn record_consumer_unsubscribed(&mut self) {
        self.consumers_unsubscribed += 1;
    }

    pub(crate) fn record_enqueue_ok(&mut self) {
        self.values_enqueued += 1;
    }

    pub(crate) fn record_enqueue_full(&mut self) {
        self.enqueue_full += 1;
    }

    pub(crate) fn record_enqueue_disabled(&mut self) {
        self.enqueue_disabled += 1;
    }

    pub(crate) fn record_consumed(&mut self) {
        self.values_consumed += 1;
    }

    /// Render a point-in-time summary.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            queues_added: self.queues_added,
            queues_removed: self.queues_removed,
            producers_registered: self.producers_registered,
            producers_unregistered: self.producers_unregistered,
            consumers_subscribed: self.consumers_subscribed,
            consumers_unsubscribed: self.consumers_unsubscribed,
            values_enqueued: self.values_enqueued,
            enqueue_full: self.enqueue_full,
            enqueue_disabled: self.enqueue_disabled,
            values_consumed: self.values_consumed,
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// A rendered, displayable snapshot of [`BrokerMetrics`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub queues_added: u64,
    pub queues_removed: u64,
    pub producers_registered: u64,
    pub producers_unregistered: u64,
    pub consumers_subscribed: u64,
    pub consumers_unsubscribed: u64,
    pub values_enqueued: u64,
    pub enqueue_full: u64,
    pub enqueue_disabled: u64,
    pub values_consumed: u64,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Broker Metrics:")?;
        writeln!(
            f,
            "  Queues:     {} added, {} removed",
            self.queues_added, self.queues_removed
        )?;
        writeln!(
            f,
            "  Producers:  {} registered, {} unregistered",
            self.producers_registered, self.producers_unregistered
        )?;
        writeln!(
            f,
            "  Consumers:  {} subscribed, {} unsubscribed",
            self.consumers_subscribed, self.consumers_unsubscribed
        )?;
        writeln!(
            f,
            "  Traffic:    {} enqueued ({} full, {} disabled), {} consumed",
            self.values_enqueued, self.enqueue_full, self.enqueue_disabled, self.values_consumed
        )?;
        Ok(())
    }
}

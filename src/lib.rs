//! # mqueue-broker
//!
//! In-process multi-queue message broker with MPSC semantics.
//!
//! ## Features
//!
//! - Blocking (condvar-based) and lock-free (CAS-based) bounded queues
//!   behind one `Queue` trait
//! - A registry manager binding opaque keys to queues, producers, and a
//!   single consumer each
//! - Cooperative start/stop of the whole broker
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use mqueue_broker::*;
//!
//! struct Printer;
//! impl Consumer<i32> for Printer {
//!     fn consume(&self, value: i32) {
//!         println!("got {value}");
//!     }
//!     fn enabled(&self) -> bool { true }
//!     fn set_enabled(&self, _enabled: bool) {}
//! }
//!
//! let mgr: MpscManager<&str, i32> = MpscManager::new();
//! let queue: QueueHandle<i32> = Arc::new(BlockingQueue::new(16).unwrap());
//! mgr.add_queue("ticks", queue);
//! mgr.subscribe("ticks", Arc::new(Printer));
//! mgr.enqueue(&"ticks", 42);
//! ```

pub mod config;
pub mod consumer;
pub mod error;
pub mod manager;
pub mod metrics;
pub mod producer;
pub mod queue;

// Re-exports
pub use config::BrokerConfig;
pub use consumer::{Consumer, ConsumerFlag, ConsumerHandle};
pub use error::{Error, Result};
pub use manager::{BaseManager, MpscManager};
pub use metrics::{BrokerMetrics, MetricsSummary};
pub use producer::{Producer, ProducerFlags, ProducerHandle};
pub use queue::{BlockingQueue, LockFreeQueue, Queue, QueueHandle, State};

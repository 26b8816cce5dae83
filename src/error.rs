//! Construction-time error type.
//!
//! This is deliberately narrow: almost everything in this crate reports
//! failure through [`crate::queue::State`] instead, because almost every
//! operation here happens against a live registry where a typed error
//! would just duplicate `State`. `Error` only covers the handful of things
//! that can go wrong *before* a `State` exists to report, e.g. building a
//! queue or a [`crate::config::BrokerConfig`].

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Construction/configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A [`crate::config::BrokerConfig`] failed validation.
    #[error("configuration error: {0}")]
    Config(String),

    /// A queue was constructed with a capacity of zero.
    #[error("queue capacity must be non-zero, got {0}")]
    InvalidCapacity(usize),
}

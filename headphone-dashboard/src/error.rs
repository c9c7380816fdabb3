//! Error types for the headphone-dashboard crate.

use headphone_broker::BrokerError;
use thiserror::Error;

/// Errors that can occur while running the dashboard
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The broker refused a subscribe or unsubscribe
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    /// Invalid dashboard configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// `start` was called outside a tokio runtime
    #[error("No async runtime available: {0}")]
    Runtime(String),
}

/// Convenience type alias for Results using DashboardError.
pub type Result<T> = std::result::Result<T, DashboardError>;

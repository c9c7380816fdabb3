//! Error types for the headphone-broker crate.

use crate::client::ClientError;

/// Broker operation that a backend rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Connect,
    Disconnect,
    Publish,
    Subscribe,
    Unsubscribe,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Connect => "connect",
            Operation::Disconnect => "disconnect",
            Operation::Publish => "publish",
            Operation::Subscribe => "subscribe",
            Operation::Unsubscribe => "unsubscribe",
        };
        f.write_str(name)
    }
}

/// Errors surfaced through the broker contract.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// An operation was attempted before a successful `connect`
    #[error("{backend} broker not connected")]
    NotConnected {
        /// Backend name
        backend: &'static str,
    },

    /// The backend was unreachable, misconfigured or refused the connection
    #[error("Failed to connect to {backend} broker: {reason}")]
    ConnectionFailure {
        /// Backend name
        backend: &'static str,
        /// What went wrong
        reason: String,
    },

    /// The backend rejected an operation on an established connection
    #[error("{backend} broker {operation} failed: {source}")]
    BackendOperation {
        /// Backend name
        backend: &'static str,
        /// The rejected operation
        operation: Operation,
        /// Error reported by the client library
        #[source]
        source: ClientError,
    },

    /// Invalid configuration or backend selection
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl BrokerError {
    pub(crate) fn not_connected(backend: &'static str) -> Self {
        BrokerError::NotConnected { backend }
    }

    pub(crate) fn connection_failure(backend: &'static str, reason: impl Into<String>) -> Self {
        BrokerError::ConnectionFailure {
            backend,
            reason: reason.into(),
        }
    }

    pub(crate) fn backend(backend: &'static str, operation: Operation, source: ClientError) -> Self {
        BrokerError::BackendOperation {
            backend,
            operation,
            source,
        }
    }

    /// Whether this is a `NotConnected` error.
    pub fn is_not_connected(&self) -> bool {
        matches!(self, BrokerError::NotConnected { .. })
    }

    /// Whether this is a `ConnectionFailure` error.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, BrokerError::ConnectionFailure { .. })
    }
}

/// Convenience type alias for Results using BrokerError.
pub type Result<T> = std::result::Result<T, BrokerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_error_display() {
        let error = BrokerError::not_connected("memory");
        assert_eq!(error.to_string(), "memory broker not connected");
        assert!(error.is_not_connected());

        let error = BrokerError::connection_failure("mqtt", "connection refused");
        assert_eq!(
            error.to_string(),
            "Failed to connect to mqtt broker: connection refused"
        );
        assert!(error.is_connection_failure());

        let error = BrokerError::backend("redis", Operation::Publish, "socket closed".into());
        assert_eq!(error.to_string(), "redis broker publish failed: socket closed");

        let error = BrokerError::Configuration("unknown broker kind".to_string());
        assert_eq!(error.to_string(), "Configuration error: unknown broker kind");
    }

    #[test]
    fn test_backend_operation_keeps_source() {
        let error = BrokerError::backend("mqtt", Operation::Subscribe, "not authorized".into());
        let source = std::error::Error::source(&error).expect("source");
        assert_eq!(source.to_string(), "not authorized");
    }
}

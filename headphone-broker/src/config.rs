//! Connection options for external brokers
//!
//! The options are opaque to the contract: they are handed as-is to the
//! [`ClientConnector`](crate::ClientConnector) of the selected backend.

use std::time::Duration;

use crate::error::BrokerError;

/// Delivery guarantee requested from a backend that supports levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Qos {
    /// Fire and forget
    #[default]
    AtMostOnce,
    /// Acknowledged, may duplicate
    AtLeastOnce,
    /// Acknowledged, never duplicated
    ExactlyOnce,
}

impl Qos {
    /// Numeric level as used by MQTT.
    pub fn level(&self) -> u8 {
        match self {
            Qos::AtMostOnce => 0,
            Qos::AtLeastOnce => 1,
            Qos::ExactlyOnce => 2,
        }
    }
}

/// How to reach an external broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Host name or address
    /// Default: "localhost"
    pub host: String,

    /// TCP port
    /// Default: 1883
    pub port: u16,

    /// Client identifier presented to the backend
    /// Default: "headphone_client_{epoch millis}"
    pub client_id: String,

    /// Upper bound on `connect`; elapsing it is a connection failure
    /// Default: 5 seconds
    pub connect_timeout: Duration,

    /// Keep-alive interval negotiated with the backend
    /// Default: 60 seconds
    pub keep_alive: Duration,

    /// Start without any session state left over on the backend
    /// Default: true
    pub clean_session: bool,

    /// Guarantee requested for publishes
    /// Default: at most once
    pub publish_qos: Qos,

    /// Guarantee requested for subscriptions
    /// Default: at least once
    pub subscribe_qos: Qos,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self::mqtt()
    }
}

impl ConnectionOptions {
    /// Defaults for an MQTT-style at-least-once backend.
    pub fn mqtt() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: format!("headphone_client_{}", chrono::Utc::now().timestamp_millis()),
            connect_timeout: Duration::from_secs(5),
            keep_alive: Duration::from_secs(60),
            clean_session: true,
            publish_qos: Qos::AtMostOnce,
            subscribe_qos: Qos::AtLeastOnce,
        }
    }

    /// Defaults for a Redis-style fire-and-forget backend.
    pub fn redis() -> Self {
        Self {
            port: 6379,
            subscribe_qos: Qos::AtMostOnce,
            ..Self::mqtt()
        }
    }

    /// `scheme://host:port`
    pub fn url(&self, scheme: &str) -> String {
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Validate the options and return any issues
    pub fn validate(&self) -> Result<(), BrokerError> {
        if self.host.trim().is_empty() {
            return Err(BrokerError::Configuration("Host must not be empty".to_string()));
        }

        if self.port == 0 {
            return Err(BrokerError::Configuration("Port must be greater than 0".to_string()));
        }

        if self.client_id.trim().is_empty() {
            return Err(BrokerError::Configuration(
                "Client id must not be empty".to_string(),
            ));
        }

        if self.connect_timeout == Duration::ZERO {
            return Err(BrokerError::Configuration(
                "Connect timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn with_clean_session(mut self, clean: bool) -> Self {
        self.clean_session = clean;
        self
    }

    pub fn with_qos(mut self, publish: Qos, subscribe: Qos) -> Self {
        self.publish_qos = publish;
        self.subscribe_qos = subscribe;
        self
    }
}

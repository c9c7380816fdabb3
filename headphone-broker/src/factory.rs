//! Backend selection

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::broker::MessageBroker;
use crate::client::ClientConnector;
use crate::config::ConnectionOptions;
use crate::error::{BrokerError, Result};
use crate::memory::MemoryBroker;
use crate::reliable::ReliableBroker;
use crate::split::SplitBroker;

/// The interchangeable backend families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BrokerKind {
    /// In-process delivery
    #[default]
    Memory,
    /// MQTT-style at-least-once external broker
    Reliable,
    /// Redis-style low-latency external broker
    Split,
}

impl BrokerKind {
    pub const ALL: [BrokerKind; 3] = [BrokerKind::Memory, BrokerKind::Reliable, BrokerKind::Split];

    pub fn as_str(&self) -> &'static str {
        match self {
            BrokerKind::Memory => "memory",
            BrokerKind::Reliable => "mqtt",
            BrokerKind::Split => "redis",
        }
    }

    /// Parse a backend name, falling back to [`BrokerKind::Memory`] for names
    /// nobody recognises.
    pub fn parse_lenient(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown broker type '{}', using in-memory broker", name);
            BrokerKind::Memory
        })
    }

    /// Connection defaults suited to the family.
    pub fn default_options(&self) -> ConnectionOptions {
        match self {
            BrokerKind::Memory | BrokerKind::Reliable => ConnectionOptions::mqtt(),
            BrokerKind::Split => ConnectionOptions::redis(),
        }
    }
}

impl fmt::Display for BrokerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrokerKind {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-process" => Ok(BrokerKind::Memory),
            "mqtt" | "reliable" | "at-least-once" => Ok(BrokerKind::Reliable),
            "redis" | "split" | "low-latency" => Ok(BrokerKind::Split),
            other => Err(BrokerError::Configuration(format!(
                "Unknown broker type '{}'",
                other
            ))),
        }
    }
}

/// Builds brokers by kind.
///
/// External families need a [`ClientConnector`]; without one, building that
/// kind is a configuration error.
#[derive(Default, Clone)]
pub struct BrokerFactory {
    options: Option<ConnectionOptions>,
    reliable: Option<Arc<dyn ClientConnector>>,
    split: Option<Arc<dyn ClientConnector>>,
}

impl BrokerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options used for every external broker built. Without this each kind
    /// uses [`BrokerKind::default_options`].
    pub fn with_options(mut self, options: ConnectionOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_reliable_connector(mut self, connector: Arc<dyn ClientConnector>) -> Self {
        self.reliable = Some(connector);
        self
    }

    pub fn with_split_connector(mut self, connector: Arc<dyn ClientConnector>) -> Self {
        self.split = Some(connector);
        self
    }

    /// Whether `kind` can be built with the registered connectors.
    pub fn supports(&self, kind: BrokerKind) -> bool {
        match kind {
            BrokerKind::Memory => true,
            BrokerKind::Reliable => self.reliable.is_some(),
            BrokerKind::Split => self.split.is_some(),
        }
    }

    /// Construct a disconnected broker of `kind`.
    pub fn build(&self, kind: BrokerKind) -> Result<Arc<dyn MessageBroker>> {
        let options = || self.options.clone().unwrap_or_else(|| kind.default_options());

        let broker: Arc<dyn MessageBroker> = match kind {
            BrokerKind::Memory => Arc::new(MemoryBroker::new()),
            BrokerKind::Reliable => {
                let connector = self.connector(kind, self.reliable.as_ref())?;
                Arc::new(ReliableBroker::new(connector, options()))
            }
            BrokerKind::Split => {
                let connector = self.connector(kind, self.split.as_ref())?;
                Arc::new(SplitBroker::new(connector, options()))
            }
        };

        tracing::debug!("Built {} broker", kind);
        Ok(broker)
    }

    /// Parse `name` and build that kind.
    pub fn build_named(&self, name: &str) -> Result<Arc<dyn MessageBroker>> {
        self.build(name.parse()?)
    }

    fn connector(
        &self,
        kind: BrokerKind,
        connector: Option<&Arc<dyn ClientConnector>>,
    ) -> Result<Arc<dyn ClientConnector>> {
        connector.cloned().ok_or_else(|| {
            BrokerError::Configuration(format!("No client connector registered for {} broker", kind))
        })
    }
}

impl fmt::Debug for BrokerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerFactory")
            .field("options", &self.options)
            .field("reliable", &self.reliable.is_some())
            .field("split", &self.split.is_some())
            .finish()
    }
}

//! # headphone-broker
//!
//! One publish/subscribe contract, several interchangeable backends.
//!
//! Every backend implements [`MessageBroker`]: a connect/disconnect lifecycle,
//! `publish`, and a single-slot `subscribe`/`unsubscribe` per topic. Callers
//! pick a backend with [`BrokerKind`] and [`BrokerFactory`] and never look at
//! the concrete type again.
//!
//! ## Backends
//!
//! | Adapter | Family | Delivery |
//! |---|---|---|
//! | [`MemoryBroker`] | in-process | async, at-most-once, dropped when nobody is subscribed |
//! | [`ReliableBroker`] | at-least-once external (MQTT-like) | whatever the backend retains; duplicates pass through |
//! | [`SplitBroker`] | low-latency external (Redis-like) | fire-and-forget over separate publish/subscribe connections |
//!
//! External client libraries stay behind the [`ClientConnector`] /
//! [`PubSubClient`] seam; the adapters only map their semantics onto the
//! contract.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use headphone_broker::{handler, MemoryBroker, MessageBroker};
//!
//! # async fn run() -> headphone_broker::Result<()> {
//! let broker: Arc<dyn MessageBroker> = Arc::new(MemoryBroker::new());
//! broker.connect().await?;
//!
//! broker
//!     .subscribe("headphone/1", handler(|payload| println!("got {payload}")))
//!     .await?;
//! broker.publish("headphone/1", r#"{"deviceId":1}"#).await?;
//!
//! broker.disconnect().await?;
//! # Ok(())
//! # }
//! ```

mod broker;
mod client;
mod config;
mod error;
mod external;
mod factory;
mod memory;
pub mod perf;
mod registry;
mod reliable;
mod router;
mod split;

pub use broker::{handler, MessageBroker, MessageHandler};
pub use client::{ClientConnector, ClientError, ClientSession, InboundMessage, InboundStream, PubSubClient};
pub use config::{ConnectionOptions, Qos};
pub use error::{BrokerError, Operation, Result};
pub use factory::{BrokerFactory, BrokerKind};
pub use memory::MemoryBroker;
pub use registry::SubscriptionRegistry;
pub use reliable::ReliableBroker;
pub use split::SplitBroker;

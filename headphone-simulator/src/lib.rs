//! # headphone-simulator
//!
//! A fleet of simulated headphones publishing randomized control events
//! (`VOLUMEUP`, `VOLUMEDOWN`, `PLAY`, `PAUSE`, `STOP`) through any
//! [`MessageBroker`](headphone_broker::MessageBroker).
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use headphone_broker::{MemoryBroker, MessageBroker};
//! use headphone_simulator::{EventGenerator, GeneratorConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let broker: Arc<dyn MessageBroker> = Arc::new(MemoryBroker::new());
//! broker.connect().await?;
//!
//! let generator = EventGenerator::new(Arc::clone(&broker), GeneratorConfig::default())?;
//! generator.start().await?;
//! // ...
//! generator.stop().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod generator;

pub use config::GeneratorConfig;
pub use error::{GeneratorError, Result};
pub use generator::{EventGenerator, GeneratorStats};

//! # headphone-dashboard
//!
//! Live per-stereo view built from headphone control events.
//!
//! [`StereoDashboard`] subscribes to `headphone/1` .. `headphone/N` on any
//! [`MessageBroker`](headphone_broker::MessageBroker), applies each event to
//! the state of the device it names and renders a snapshot once per tick.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use headphone_broker::{MemoryBroker, MessageBroker};
//! use headphone_dashboard::{DashboardConfig, StereoDashboard};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let broker: Arc<dyn MessageBroker> = Arc::new(MemoryBroker::new());
//! broker.connect().await?;
//!
//! let dashboard = StereoDashboard::new(Arc::clone(&broker), DashboardConfig::default())?;
//! dashboard.start().await?;
//!
//! let mut renders = dashboard.renders();
//! renders.changed().await?;
//! println!("{}", *renders.borrow());
//!
//! dashboard.stop().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod dashboard;
mod error;
pub mod logging;
mod snapshot;

pub use config::DashboardConfig;
pub use dashboard::{DashboardStats, StereoDashboard};
pub use error::{DashboardError, Result};
pub use snapshot::{volume_bar, DashboardSnapshot};

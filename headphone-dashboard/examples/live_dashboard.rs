//! Live Dashboard - simulated headphones driving a terminal stereo dashboard
//!
//! Run with: cargo run -p headphone-sim-dashboard --example live_dashboard
//!
//! `BROKER_TYPE` selects the backend (only the in-process broker is wired
//! here; external backends need a client connector). `DEVICE_COUNT` sets the
//! fleet size. `HEADPHONE_LOG_MODE=development` enables logs on stderr.

use std::sync::Arc;

use headphone_broker::{BrokerFactory, BrokerKind, MessageBroker};
use headphone_dashboard::{logging, DashboardConfig, StereoDashboard};
use headphone_simulator::{EventGenerator, GeneratorConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging_from_env()?;

    let kind = BrokerKind::parse_lenient(
        &std::env::var("BROKER_TYPE").unwrap_or_else(|_| "memory".to_string()),
    );
    let device_count = std::env::var("DEVICE_COUNT")
        .ok()
        .and_then(|count| count.parse().ok())
        .unwrap_or(10);

    let broker: Arc<dyn MessageBroker> = BrokerFactory::new().build(kind)?;
    broker.connect().await?;

    let dashboard = StereoDashboard::new(
        Arc::clone(&broker),
        DashboardConfig::default().with_device_count(device_count),
    )?;
    let generator = EventGenerator::new(
        Arc::clone(&broker),
        GeneratorConfig::default().with_device_count(device_count),
    )?;

    dashboard.start().await?;
    generator.start().await?;

    let mut renders = dashboard.renders();
    loop {
        tokio::select! {
            changed = renders.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = renders.borrow_and_update().clone();

                // Clear screen
                print!("\x1B[2J\x1B[1;1H");
                println!("Broker: {}    {}", broker.name(), chrono::Local::now().format("%H:%M:%S"));
                println!("{}", snapshot);
                println!("Press Ctrl+C to exit");
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nShutting down...");
                break;
            }
        }
    }

    generator.stop().await;
    dashboard.stop().await?;
    broker.disconnect().await?;

    let stats = dashboard.stats();
    println!(
        "Applied {} events ({} malformed, {} ignored)",
        stats.applied, stats.malformed, stats.ignored
    );
    Ok(())
}

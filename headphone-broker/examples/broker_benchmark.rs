//! Broker benchmark - runs the perf suite against every backend that can be built
//!
//! Run with: cargo run -p headphone-sim-broker --example broker_benchmark --release
//!
//! Only the in-process broker is available without a client connector; the
//! external families are reported as unavailable.

use headphone_broker::perf::{PerfSettings, PerformanceReport, PerformanceTester};
use headphone_broker::{BrokerFactory, BrokerKind};

#[tokio::main]
async fn main() {
    let quick = std::env::args().any(|arg| arg == "--quick");
    let settings = if quick {
        PerfSettings::quick()
    } else {
        PerfSettings::default()
    };

    let factory = BrokerFactory::new();
    let tester = PerformanceTester::new(settings);
    let mut report = PerformanceReport::new();

    for kind in BrokerKind::ALL {
        let broker = match factory.build(kind) {
            Ok(broker) => broker,
            Err(e) => {
                println!("{} broker not available: {}", kind, e);
                continue;
            }
        };

        match tester.run(broker, kind.as_str()).await {
            Ok(metrics) => report.add(metrics),
            Err(e) => println!("{} broker benchmark failed: {}", kind, e),
        }
    }

    println!("\n{}", report);
}

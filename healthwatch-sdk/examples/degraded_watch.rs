//! Example: Following degraded components as they change
//!
//! Components report from a background task while the main task waits on
//! table commits and prints whatever is degraded at each revision.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --example degraded_watch
//! ```

use std::time::Duration;

use healthwatch_sdk::{FullModuleId, Level, Provider};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let provider = Provider::new();
    let mut changes = provider.changes();

    let module = FullModuleId::new(["agent", "datapath"]).expect("valid module id");
    let reporter = provider.for_module(&module);
    let loader = reporter.new_scope("loader").expect("valid scope");
    let sync = reporter.new_scope("sync").expect("valid scope");

    // Simulate a component that flaps between ok and degraded
    let worker = tokio::spawn(async move {
        for tick in 0..6u32 {
            loader.ok(format!("tick {}", tick)).expect("report");
            if tick % 3 == 2 {
                sync.degraded("peer unreachable", "connection refused").expect("report");
            } else {
                sync.ok("in sync").expect("report");
            }
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        loader.stopped("shutdown").expect("report");
        sync.stopped("shutdown").expect("report");
    });

    let table = provider.table();
    while changes.changed().await.is_ok() {
        let txn = table.read_txn();
        let counts = table.level_counts(&txn).expect("own transaction");
        println!(
            "revision {}: {} ok, {} degraded, {} stopped",
            txn.revision(),
            counts.ok,
            counts.degraded,
            counts.stopped
        );
        for status in table.by_level(&txn, Level::Degraded).expect("own transaction") {
            println!(
                "  {} degraded x{}: {} ({})",
                status.id,
                status.count,
                status.message,
                status.error.as_deref().unwrap_or("-")
            );
        }
        if counts.total() > 0 && counts.stopped == counts.total() {
            break;
        }
    }

    worker.await.expect("worker task");
}

use market_overview_sdk::{EngineConfig, MarketDataEvent, MarketSyncEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Build the engine from MARKET_DATA_* env vars (defaults: top 10 in USD every 30s)
    let engine = MarketSyncEngine::new(EngineConfig::from_env()?)?;
    let mut events = engine.subscribe_events();

    println!(
        "Market Overview (Top {}, {}, provider: {})",
        engine.config().limit,
        engine.config().currency,
        engine.fetcher_name()
    );
    println!("-------------------------------------------");

    // 2. Start syncing and print the table after each of the next three cycles
    engine.start()?;

    let mut cycles = 0;
    while cycles < 3 {
        match events.recv().await? {
            MarketDataEvent::SnapshotPublished { .. } | MarketDataEvent::RefreshFailed { .. } => {
                cycles += 1;
                print_table(&engine);
            }
            MarketDataEvent::EngineStateChanged { state, .. } => {
                println!("Engine is now {}", state);
            }
        }
    }

    // 3. Report how the cycles went
    let metrics = engine.cycle_metrics().await;
    println!("-------------------------------------------");
    println!(
        "Cycles: {} ({} failed), p50={:.0}ms, p99={:.0}ms",
        metrics.total_cycles, metrics.failed_cycles, metrics.latency_p50_ms, metrics.latency_p99_ms
    );

    engine.stop();
    Ok(())
}

fn print_table(engine: &MarketSyncEngine) {
    let snapshot = engine.current_snapshot();

    println!();
    println!("{:<5} {:<20} {:>14} {:>10}", "Rank", "Name", "Price", "24h");
    for entry in &snapshot.entries {
        println!(
            "{:<5} {:<20} {:>14.2} {:>+9.2}%",
            entry.rank,
            format!("{} ({})", entry.name, entry.symbol),
            entry.price,
            entry.change_percent
        );
    }

    if let Some(error) = snapshot.error() {
        println!("(stale since {}: {})", snapshot.produced_at, error);
    }
}

//! Per-station fan-out through one shared rate gate.
//!
//! The json-api adapter issues one sub-request per configured station;
//! all of them draw from the source's token bucket, so the wall-clock
//! time of the run shows the quota being respected.
//!
//! ```bash
//! cargo run --example stations_fanout
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use aerofetch_core::{
    AdapterRegistry, NoopHttpClient, RateQuota, Scheduler, SchedulerConfig, Source,
};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let stations: Vec<String> = (1..=12).map(|id| format!("station-{id:02}")).collect();

    let source = Source::named("fanout-demo", "json-api")
        .with_url("https://air.example.test/api/latest")
        .with_extra("stations", json!(stations));

    let config = SchedulerConfig {
        rate: Some(RateQuota::new(4, Duration::from_secs(1))),
        ..SchedulerConfig::default()
    };

    // NoopHttpClient keeps the demo offline; swap it out for the default
    // reqwest transport to hit a real endpoint.
    let scheduler = Scheduler::new(AdapterRegistry::with_builtins(), config)
        .with_http_client(Arc::new(NoopHttpClient));

    let started = Instant::now();
    let summary = scheduler.run(&[source]).await?;
    let elapsed = started.elapsed();

    for outcome in &summary.outcomes {
        println!("{} (attempts: {})", outcome.message(), outcome.attempts);
    }
    println!("12 gated sub-requests took {elapsed:?} at 4 requests/second");
    Ok(())
}

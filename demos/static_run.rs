//! Run the pipeline end to end against inline fixture data.
//!
//! ```bash
//! cargo run --example static_run
//! ```

use std::sync::Arc;

use aerofetch_core::{AdapterRegistry, NoopHttpClient, Scheduler, SchedulerConfig, Source};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sources = vec![
        Source::named("krakow-fixture", "static")
            .with_country("PL")
            .with_city("Kraków")
            .with_organization("GIOS", "http://powietrze.gios.gov.pl/")
            .with_extra(
                "data",
                json!([
                    {
                        "parameter": "PM2.5",
                        "value": "61.2",
                        "unit": "ug/m3",
                        "date": {
                            "utc": "2024-03-01T07:00:00Z",
                            "local": "2024-03-01T08:00:00+01:00"
                        },
                        "location": "Kraków, Aleja Krasińskiego",
                        "averagingPeriod": { "value": 1.0, "unit": "hours" }
                    },
                    {
                        "parameter": "o3",
                        "value": 32,
                        "unit": "ppb",
                        "date": {
                            "local": "2024-03-01T08:00:00+01:00"
                        },
                        "location": "Kraków, Nowa Huta",
                        "averagingPeriod": { "value": 8.0, "unit": "hours" }
                    },
                    {
                        "parameter": "relativehumidity",
                        "value": 71,
                        "unit": "%",
                        "date": {
                            "utc": "2024-03-01T07:00:00Z",
                            "local": "2024-03-01T08:00:00+01:00"
                        },
                        "location": "Kraków, Nowa Huta",
                        "averagingPeriod": { "value": 1.0, "unit": "hours" }
                    }
                ]),
            ),
        Source::named("empty-cycle", "static").with_extra("data", json!([])),
    ];

    let scheduler = Scheduler::new(AdapterRegistry::with_builtins(), SchedulerConfig::default())
        .with_http_client(Arc::new(NoopHttpClient));
    let summary = scheduler.run(&sources).await?;

    for outcome in &summary.outcomes {
        println!("{}", outcome.message());
        if let Some(result) = &outcome.result {
            for measurement in &result.measurements {
                println!("  {}", serde_json::to_string(measurement)?);
            }
            for (reason, count) in result.failures.iter() {
                println!("  pruned {count}x: {reason}");
            }
        }
    }

    println!(
        "\n{} measurement(s) across {} source(s) in {:?}",
        summary.total_measurements(),
        summary.outcomes.len(),
        summary.duration
    );
    Ok(())
}

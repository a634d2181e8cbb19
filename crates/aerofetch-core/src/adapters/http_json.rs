use futures::stream::FuturesUnordered;
use futures::StreamExt;
use serde_json::Value;

use crate::adapter::{BatchAdapter, BatchFuture};
use crate::domain::RawRecord;
use crate::error::FetchError;
use crate::http_client::FetchContext;
use crate::source::Source;

/// Generic batch adapter for providers that expose measurements as JSON.
///
/// Fetches `source.url` and accepts either a bare array or an object
/// wrapping one under `measurements`/`results`/`data`. When the source
/// configuration lists station ids under `stations`, one sub-request per
/// station is issued concurrently; all of them draw from the source's
/// shared rate gate, so the fan-out respects the provider's quota.
pub struct JsonApiAdapter;

impl BatchAdapter for JsonApiAdapter {
    fn name(&self) -> &str {
        "json-api"
    }

    fn fetch_batch<'a>(&'a self, source: &'a Source, cx: &'a FetchContext) -> BatchFuture<'a> {
        Box::pin(async move {
            let base = source.url.as_deref().ok_or_else(|| {
                FetchError::validation_setup(format!("source '{}' has no url", source.name))
            })?;

            let stations = station_ids(source);
            if stations.is_empty() {
                return unwrap_records(cx.get_json(base).await?);
            }

            tracing::debug!(
                source = %source.name,
                stations = stations.len(),
                "fanning out per-station requests"
            );

            let mut tasks: FuturesUnordered<_> = stations
                .iter()
                .map(|station| fetch_station(cx, base, station))
                .collect();

            let mut records = Vec::new();
            while let Some(result) = tasks.next().await {
                records.extend(result?);
            }
            Ok(records)
        })
    }
}

async fn fetch_station(
    cx: &FetchContext,
    base: &str,
    station: &str,
) -> Result<Vec<RawRecord>, FetchError> {
    let separator = if base.contains('?') { '&' } else { '?' };
    let url = format!("{base}{separator}station={}", urlencoding::encode(station));
    unwrap_records(cx.get_json(&url).await?)
}

fn station_ids(source: &Source) -> Vec<String> {
    let Some(Value::Array(stations)) = source.extra.get("stations") else {
        return Vec::new();
    };

    stations
        .iter()
        .filter_map(|station| match station {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        })
        .collect()
}

fn unwrap_records(body: Value) -> Result<Vec<RawRecord>, FetchError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(map) => {
            for key in ["measurements", "results", "data"] {
                if let Some(Value::Array(items)) = map.get(key) {
                    return Ok(items.clone());
                }
            }
            Err(FetchError::parse(
                "response JSON contains no measurement array",
            ))
        }
        _ => Err(FetchError::parse("response JSON is not an array or object")),
    }
}

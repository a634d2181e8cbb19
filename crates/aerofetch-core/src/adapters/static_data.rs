use futures::stream;
use futures::StreamExt;
use serde_json::Value;

use crate::adapter::{BatchAdapter, BatchFuture, RecordStream, StreamAdapter};
use crate::domain::RawRecord;
use crate::error::FetchError;
use crate::http_client::FetchContext;
use crate::source::Source;

/// Replays records embedded in the source configuration under `data`.
///
/// Entries shaped `{"__error": "...", ...}` are turned into item errors,
/// which lets test fixtures script any failure sequence from plain JSON.
/// The batch variant fails the whole source on the first scripted error;
/// the stream variant surfaces each one as a failable item.
pub struct StaticBatchAdapter;

impl BatchAdapter for StaticBatchAdapter {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch_batch<'a>(&'a self, source: &'a Source, _cx: &'a FetchContext) -> BatchFuture<'a> {
        Box::pin(async move {
            let mut records = Vec::new();
            for item in configured_items(source)? {
                records.push(item?);
            }
            Ok(records)
        })
    }
}

pub struct StaticStreamAdapter;

impl StreamAdapter for StaticStreamAdapter {
    fn name(&self) -> &str {
        "static-stream"
    }

    fn fetch_stream<'a>(&'a self, source: &'a Source, _cx: &'a FetchContext) -> RecordStream<'a> {
        match configured_items(source) {
            Ok(items) => stream::iter(items).boxed(),
            Err(error) => stream::iter([Err(error)]).boxed(),
        }
    }
}

fn configured_items(source: &Source) -> Result<Vec<Result<RawRecord, FetchError>>, FetchError> {
    let Some(Value::Array(data)) = source.extra.get("data") else {
        return Err(FetchError::validation_setup(format!(
            "source '{}' has no inline data configured",
            source.name
        )));
    };

    Ok(data.iter().map(|item| scripted_item(item.clone())).collect())
}

fn scripted_item(item: Value) -> Result<RawRecord, FetchError> {
    let Some(message) = item.get("__error").and_then(Value::as_str) else {
        return Ok(item);
    };

    let fatal = item
        .get("__fatal")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let error = match item.get("__kind").and_then(Value::as_str) {
        Some("timeout") => FetchError::timeout(message),
        Some("parse") => FetchError::parse(message),
        _ => FetchError::network(message),
    };

    if fatal {
        Err(error.as_fatal())
    } else {
        Err(error)
    }
}

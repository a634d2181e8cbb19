//! Source adapter contract.
//!
//! An adapter is the pluggable fetch logic for one provider. It declares
//! exactly one of two capabilities, encoded as a closed enum so the
//! scheduler dispatches without reflection and a wrong-capability call is
//! unrepresentable:
//!
//! - **Batch**: one call produces the whole record list or fails once.
//! - **Stream**: records arrive lazily, each item independently failable.
//!
//! Stream item errors carry a `fatal` flag: fatal means the whole source
//! is unavailable (for example the very first connection failed), which
//! the scheduler treats like a batch failure. Non-fatal item errors are
//! counted and skipped while consumption continues.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::stream::BoxStream;

use crate::domain::RawRecord;
use crate::error::FetchError;
use crate::http_client::FetchContext;
use crate::source::Source;

pub type BatchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<RawRecord>, FetchError>> + Send + 'a>>;

pub type RecordStream<'a> = BoxStream<'a, Result<RawRecord, FetchError>>;

/// Batch capability: single completion per source.
pub trait BatchAdapter: Send + Sync {
    /// Adapter identity for logging and attribution.
    fn name(&self) -> &str;

    fn fetch_batch<'a>(&'a self, source: &'a Source, cx: &'a FetchContext) -> BatchFuture<'a>;
}

/// Stream capability: lazy, finite record sequence.
///
/// The returned stream MUST terminate. Items are pulled one at a time by
/// the scheduler, so a slow consumer never forces the adapter to buffer
/// unbounded in-flight records.
pub trait StreamAdapter: Send + Sync {
    fn name(&self) -> &str;

    fn fetch_stream<'a>(&'a self, source: &'a Source, cx: &'a FetchContext) -> RecordStream<'a>;
}

/// A named adapter with exactly one capability.
#[derive(Clone)]
pub enum Adapter {
    Batch(Arc<dyn BatchAdapter>),
    Stream(Arc<dyn StreamAdapter>),
}

impl Adapter {
    pub fn batch(adapter: impl BatchAdapter + 'static) -> Self {
        Self::Batch(Arc::new(adapter))
    }

    pub fn stream(adapter: impl StreamAdapter + 'static) -> Self {
        Self::Stream(Arc::new(adapter))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Batch(adapter) => adapter.name(),
            Self::Stream(adapter) => adapter.name(),
        }
    }
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::Batch(_) => "Batch",
            Self::Stream(_) => "Stream",
        };
        f.debug_struct("Adapter")
            .field("kind", &kind)
            .field("name", &self.name())
            .finish()
    }
}

/// Name-keyed adapter lookup used by the scheduler.
///
/// A source whose `adapter` field resolves to nothing is a configuration
/// error caught before any fetch starts.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Adapter>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in reference adapters registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Adapter::batch(crate::adapters::StaticBatchAdapter));
        registry.register(Adapter::stream(crate::adapters::StaticStreamAdapter));
        registry.register(Adapter::batch(crate::adapters::JsonApiAdapter));
        registry
    }

    /// Register under the adapter's own name; the last registration for a
    /// name wins.
    pub fn register(&mut self, adapter: Adapter) {
        self.adapters.insert(adapter.name().to_owned(), adapter);
    }

    pub fn get(&self, name: &str) -> Option<&Adapter> {
        self.adapters.get(name)
    }

    pub fn resolve(&self, source: &Source) -> Result<Adapter, FetchError> {
        self.get(&source.adapter).cloned().ok_or_else(|| {
            FetchError::adapter_not_registered(&source.adapter).for_source(&source.name)
        })
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

//! # Aerofetch Core
//!
//! Adapter execution and normalization pipeline for air quality data
//! sources.
//!
//! ## Overview
//!
//! Dozens of independent, uncooperative providers publish sensor
//! readings in incompatible shapes. This crate is the part of the system
//! with real cross-cutting concerns: it runs pluggable source adapters
//! under bounded concurrency, rate, timeout and retry policy, normalizes
//! units and parameter names to one canonical form, validates and prunes
//! records while counting failure reasons, and aggregates per-source
//! results so one broken provider cannot abort the run.
//!
//! Provider-specific scraping, the CLI entry point and persistence live
//! outside this crate and talk to it through [`Source`], the adapter
//! traits and [`RunResult`].
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapter`] | Adapter contract (batch or stream capability) and registry |
//! | [`adapters`] | Built-in reference adapters |
//! | [`domain`] | Canonical measurement model and the draft boundary |
//! | [`error`] | Typed fetch errors and validation failure reasons |
//! | [`http_client`] | Transport abstraction and the per-source fetch context |
//! | [`normalize`] | Unit, parameter and date normalization |
//! | [`report`] | Run results, outcomes and the fetch summary |
//! | [`retry`] | Retry policy with fixed or exponential backoff |
//! | [`scheduler`] | Orchestration: concurrency, timeouts, retries, isolation |
//! | [`source`] | Provider configuration |
//! | [`throttling`] | Per-source token-bucket rate gate |
//! | [`validate`] | Schema validation and pruning |
//!
//! ## Data flow
//!
//! ```text
//! ┌───────────┐     ┌──────────────────┐
//! │ Scheduler │────▶│ Adapter          │  batch or stream
//! └─────┬─────┘     │ (FetchContext:   │
//!       │           │  gate + timeout) │
//!       │           └──────────────────┘
//!       ▼ raw records, FIFO per source
//! ┌────────────┐   ┌───────────────────┐   ┌────────────────────┐
//! │ Normalizer │──▶│ Validator/Pruner  │──▶│ RunResult          │
//! │ (pure)     │   │ (counts failures) │   │ {name,             │
//! └────────────┘   └───────────────────┘   │  measurements,     │
//!                                          │  failures}         │
//!                                          └────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use aerofetch_core::{AdapterRegistry, Scheduler, SchedulerConfig, Source};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sources: Vec<Source> = serde_json::from_str(include_str!("sources.json"))?;
//!     let scheduler = Scheduler::new(AdapterRegistry::with_builtins(), SchedulerConfig::default());
//!
//!     let summary = scheduler.run(&sources).await?;
//!     for outcome in &summary.outcomes {
//!         println!("{}", outcome.message());
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod adapters;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod normalize;
pub mod report;
pub mod retry;
pub mod scheduler;
pub mod source;
pub mod throttling;
pub mod validate;

// Re-export commonly used types at crate root for convenience

// Adapter contract and built-ins
pub use adapter::{Adapter, AdapterRegistry, BatchAdapter, BatchFuture, RecordStream, StreamAdapter};
pub use adapters::{JsonApiAdapter, StaticBatchAdapter, StaticStreamAdapter};

// Domain model
pub use domain::{
    Attribution, AveragingPeriod, Coordinates, DateStamp, DraftMeasurement, LocalStamp,
    Measurement, Parameter, RawRecord, Unit, UtcStamp,
};

// Errors
pub use error::{FetchError, FetchErrorKind, ValidationFailure};

// Transport
pub use http_client::{
    FetchContext, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, NoopHttpClient,
    ReqwestHttpClient,
};

// Normalization
pub use normalize::{apply_source_defaults, normalize, normalize_date, unify_parameter, unify_units};

// Reporting
pub use report::{FetchSummary, RunResult, RunState, SourceOutcome};

// Retry policy
pub use retry::{Backoff, RetryConfig};

// Scheduling
pub use scheduler::{Scheduler, SchedulerConfig};

// Source configuration
pub use source::Source;

// Throttling
pub use throttling::{RateGate, RateQuota};

// Validation
pub use validate::{prune, validate_record, FailureCounts, Pruner};

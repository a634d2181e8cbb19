//! Execution scheduler: runs Source+Adapter pairs with isolation and
//! resource discipline.
//!
//! Each source run walks the state machine
//! `PENDING → FETCHING → (RETRYING ⇄ FETCHING)* → {FETCHED | FAILED} →
//! NORMALIZING → VALIDATING → DONE`. `FAILED` is terminal and never
//! reaches normalization; `DONE` always carries a [`RunResult`], possibly
//! with zero measurements. Every per-source error is caught here and
//! folded into the source's outcome; the only error that escapes
//! [`Scheduler::run`] is a configuration/contract violation detected
//! before any fetch starts.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::adapter::{Adapter, AdapterRegistry, BatchAdapter, StreamAdapter};
use crate::domain::{DraftMeasurement, Measurement, RawRecord};
use crate::error::FetchError;
use crate::http_client::{FetchContext, HttpClient, ReqwestHttpClient};
use crate::normalize::normalize;
use crate::report::{FetchSummary, RunResult, RunState, SourceOutcome};
use crate::retry::RetryConfig;
use crate::source::Source;
use crate::throttling::{RateGate, RateQuota};
use crate::validate::Pruner;

/// Resource policy for one scheduler invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Global cap on sources fetched concurrently.
    pub max_parallel_sources: usize,
    /// Budget for one network request.
    pub request_timeout: Duration,
    /// Budget for one whole source fetch, fan-out included. Bounds a
    /// hanging adapter so it cannot starve other sources.
    pub source_timeout: Duration,
    pub retry: RetryConfig,
    /// Per-source request quota; `None` leaves sources ungated.
    pub rate: Option<RateQuota>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_parallel_sources: 8,
            request_timeout: Duration::from_secs(30),
            source_timeout: Duration::from_secs(300),
            retry: RetryConfig::default(),
            rate: None,
        }
    }
}

/// Runs adapters against their sources and aggregates the outcomes.
pub struct Scheduler {
    registry: AdapterRegistry,
    http: Arc<dyn HttpClient>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(registry: AdapterRegistry, config: SchedulerConfig) -> Self {
        Self {
            registry,
            http: Arc::new(ReqwestHttpClient::new()),
            config,
        }
    }

    /// Substitute the transport, mainly for tests and offline runs.
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = http;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run every source to completion and report per-source outcomes.
    ///
    /// Fails fast only on contract violations (a source naming an
    /// unregistered adapter); anything that happens after the run starts
    /// is isolated to its source. Partial success is the expected steady
    /// state.
    pub async fn run(&self, sources: &[Source]) -> Result<FetchSummary, FetchError> {
        let started = std::time::Instant::now();

        let mut pairs = Vec::with_capacity(sources.len());
        for source in sources {
            pairs.push((source, self.registry.resolve(source)?));
        }

        info!(
            sources = pairs.len(),
            parallel = self.config.max_parallel_sources,
            "starting fetch run"
        );

        let mut outcomes: Vec<SourceOutcome> = stream::iter(pairs)
            .map(|(source, adapter)| self.run_source(source, adapter))
            .buffer_unordered(self.config.max_parallel_sources.max(1))
            .collect()
            .await;
        outcomes.sort_by(|left, right| left.source.cmp(&right.source));

        let summary = FetchSummary::new(outcomes, started.elapsed());
        info!(
            succeeded = summary.succeeded().count(),
            failed = summary.failed().count(),
            measurements = summary.total_measurements(),
            "fetch run complete"
        );
        Ok(summary)
    }

    /// Run one source. Never returns an error: every failure becomes a
    /// FAILED outcome so sibling sources are unaffected.
    pub async fn run_source(&self, source: &Source, adapter: Adapter) -> SourceOutcome {
        let started = std::time::Instant::now();
        debug!(source = %source.name, adapter = adapter.name(), state = %RunState::Fetching, "source run starting");

        let gate = match self.config.rate {
            Some(quota) => match RateGate::new(quota) {
                Ok(gate) => gate,
                Err(error) => {
                    return SourceOutcome::failed(
                        &source.name,
                        0,
                        started.elapsed(),
                        error.for_source(&source.name),
                    );
                }
            },
            None => RateGate::unlimited(),
        };
        let cx = FetchContext::new(self.http.clone(), gate, self.config.request_timeout);

        match &adapter {
            Adapter::Batch(batch) => {
                self.run_batch_source(source, batch.as_ref(), &cx, started)
                    .await
            }
            Adapter::Stream(streaming) => {
                self.run_stream_source(source, streaming.as_ref(), &cx, started)
                    .await
            }
        }
    }

    async fn run_batch_source(
        &self,
        source: &Source,
        adapter: &dyn BatchAdapter,
        cx: &FetchContext,
        started: std::time::Instant,
    ) -> SourceOutcome {
        let mut attempts = 0;
        let records = loop {
            attempts += 1;
            let outcome = timeout(self.config.source_timeout, adapter.fetch_batch(source, cx)).await;
            let error = match outcome {
                Ok(Ok(records)) => break records,
                Ok(Err(error)) => error,
                Err(_) => FetchError::timeout(format!(
                    "source fetch exceeded {:?}",
                    self.config.source_timeout
                )),
            };

            if error.retryable() && attempts < self.config.retry.attempts() {
                let delay = self.config.retry.delay_for_attempt(attempts - 1);
                warn!(
                    source = %source.name,
                    attempt = attempts,
                    error = %error,
                    delay_ms = delay.as_millis() as u64,
                    state = %RunState::Retrying,
                    "fetch attempt failed"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            warn!(source = %source.name, attempts, error = %error, state = %RunState::Failed, "source failed");
            return SourceOutcome::failed(
                &source.name,
                attempts,
                started.elapsed(),
                error.for_source(&source.name),
            );
        };

        debug!(source = %source.name, records = records.len(), state = %RunState::Fetched, "batch fetched");
        let result = self.process_batch(source, records);
        info!(source = %source.name, measurements = result.measurements.len(), state = %RunState::Done, "source done");
        SourceOutcome::done(&source.name, attempts, started.elapsed(), result)
    }

    fn process_batch(&self, source: &Source, records: Vec<RawRecord>) -> RunResult {
        let mut pruner = Pruner::new();

        debug!(source = %source.name, state = %RunState::Normalizing, "normalizing records");
        let mut drafts = Vec::with_capacity(records.len());
        for raw in &records {
            match DraftMeasurement::from_raw(raw) {
                Ok(draft) => drafts.push(normalize(draft, source)),
                Err(failure) => pruner.reject(&failure),
            }
        }

        debug!(source = %source.name, state = %RunState::Validating, "validating records");
        let mut measurements: Vec<Measurement> = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            if let Some(measurement) = pruner.admit(draft) {
                measurements.push(measurement);
            }
        }

        RunResult::new(&source.name, measurements, pruner.finish())
    }

    async fn run_stream_source(
        &self,
        source: &Source,
        adapter: &dyn StreamAdapter,
        cx: &FetchContext,
        started: std::time::Instant,
    ) -> SourceOutcome {
        let mut attempts = 0;
        'attempt: loop {
            attempts += 1;
            let mut records = adapter.fetch_stream(source, cx);
            let deadline = Instant::now() + self.config.source_timeout;
            let mut pruner = Pruner::new();
            let mut measurements: Vec<Measurement> = Vec::new();
            let mut yielded: u64 = 0;

            loop {
                let item_deadline = (Instant::now() + self.config.request_timeout).min(deadline);
                let item = match timeout_at(item_deadline, records.next()).await {
                    Ok(item) => item,
                    Err(_) => {
                        let error = FetchError::timeout(
                            "stream item exceeded the configured timeout",
                        );
                        if yielded == 0 && attempts < self.config.retry.attempts() {
                            let delay = self.config.retry.delay_for_attempt(attempts - 1);
                            warn!(
                                source = %source.name,
                                attempt = attempts,
                                state = %RunState::Retrying,
                                "stream produced nothing before timing out"
                            );
                            drop(records);
                            tokio::time::sleep(delay).await;
                            continue 'attempt;
                        }
                        warn!(source = %source.name, attempts, state = %RunState::Failed, "stream timed out");
                        return SourceOutcome::failed(
                            &source.name,
                            attempts,
                            started.elapsed(),
                            error.for_source(&source.name),
                        );
                    }
                };

                match item {
                    None => break,
                    Some(Ok(raw)) => {
                        yielded += 1;
                        match DraftMeasurement::from_raw(&raw) {
                            Ok(draft) => {
                                let draft = normalize(draft, source);
                                if let Some(measurement) = pruner.admit(&draft) {
                                    measurements.push(measurement);
                                }
                            }
                            Err(failure) => pruner.reject(&failure),
                        }
                    }
                    Some(Err(error)) if error.fatal() => {
                        if yielded == 0
                            && error.retryable()
                            && attempts < self.config.retry.attempts()
                        {
                            let delay = self.config.retry.delay_for_attempt(attempts - 1);
                            warn!(
                                source = %source.name,
                                attempt = attempts,
                                error = %error,
                                state = %RunState::Retrying,
                                "stream failed before the first record"
                            );
                            drop(records);
                            tokio::time::sleep(delay).await;
                            continue 'attempt;
                        }
                        warn!(source = %source.name, attempts, error = %error, state = %RunState::Failed, "stream failed");
                        return SourceOutcome::failed(
                            &source.name,
                            attempts,
                            started.elapsed(),
                            error.for_source(&source.name),
                        );
                    }
                    Some(Err(error)) => {
                        pruner.reject_item_error(&error);
                    }
                }
            }

            let result = RunResult::new(&source.name, measurements, pruner.finish());
            info!(source = %source.name, measurements = result.measurements.len(), state = %RunState::Done, "source done");
            return SourceOutcome::done(&source.name, attempts, started.elapsed(), result);
        }
    }
}

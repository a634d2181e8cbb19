//! Per-source run results and the cross-source fetch summary.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::Serialize;

use crate::domain::Measurement;
use crate::error::FetchError;
use crate::validate::FailureCounts;

/// Lifecycle of one source run. `Failed` is terminal and skips
/// normalization; `Done` always carries a [`RunResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Fetching,
    Retrying,
    Fetched,
    Failed,
    Normalizing,
    Validating,
    Done,
}

impl RunState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Retrying => "retrying",
            Self::Fetched => "fetched",
            Self::Failed => "failed",
            Self::Normalizing => "normalizing",
            Self::Validating => "validating",
            Self::Done => "done",
        }
    }
}

impl Display for RunState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal output of one successful source run. Zero measurements is a
/// valid result (no fresh data this cycle), not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub name: String,
    pub measurements: Vec<Measurement>,
    pub failures: FailureCounts,
}

impl RunResult {
    pub fn new(
        name: impl Into<String>,
        measurements: Vec<Measurement>,
        failures: FailureCounts,
    ) -> Self {
        Self {
            name: name.into(),
            measurements,
            failures,
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new(), FailureCounts::new())
    }
}

/// How one source run ended: a result, or a typed error.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOutcome {
    pub source: String,
    pub state: RunState,
    pub attempts: u32,
    pub duration: Duration,
    pub result: Option<RunResult>,
    pub error: Option<FetchError>,
}

impl SourceOutcome {
    pub fn done(source: impl Into<String>, attempts: u32, duration: Duration, result: RunResult) -> Self {
        Self {
            source: source.into(),
            state: RunState::Done,
            attempts,
            duration,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(
        source: impl Into<String>,
        attempts: u32,
        duration: Duration,
        error: FetchError,
    ) -> Self {
        Self {
            source: source.into(),
            state: RunState::Failed,
            attempts,
            duration,
            result: None,
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.state == RunState::Done
    }

    pub fn measurement_count(&self) -> usize {
        self.result
            .as_ref()
            .map(|result| result.measurements.len())
            .unwrap_or(0)
    }

    pub fn message(&self) -> String {
        match (&self.result, &self.error) {
            (Some(result), _) if result.measurements.is_empty() => {
                format!("No new measurements found for {}", self.source)
            }
            (Some(result), _) => format!(
                "New measurements found for {}: {}",
                self.source,
                result.measurements.len()
            ),
            (None, Some(error)) => format!("Fetch failed for {}: {}", self.source, error),
            (None, None) => format!("Fetch produced no result for {}", self.source),
        }
    }
}

/// Everything one scheduler invocation produced, across all sources.
///
/// Partial success is the steady state: failed sources sit next to
/// successful ones, and neither blocks the other's report.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSummary {
    pub outcomes: Vec<SourceOutcome>,
    pub duration: Duration,
}

impl FetchSummary {
    pub fn new(outcomes: Vec<SourceOutcome>, duration: Duration) -> Self {
        Self { outcomes, duration }
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.succeeded())
    }

    pub fn failed(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.succeeded())
    }

    pub fn results(&self) -> impl Iterator<Item = &RunResult> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref())
    }

    pub fn outcome_for(&self, source: &str) -> Option<&SourceOutcome> {
        self.outcomes.iter().find(|outcome| outcome.source == source)
    }

    pub fn total_measurements(&self) -> usize {
        self.results().map(|result| result.measurements.len()).sum()
    }

    /// Failure counts merged across every source that produced a result.
    pub fn merged_failures(&self) -> FailureCounts {
        let mut merged = FailureCounts::new();
        for result in self.results() {
            merged.merge(&result.failures);
        }
        merged
    }

    pub fn is_partial(&self) -> bool {
        self.failed().next().is_some() && self.succeeded().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_reads_as_no_new_measurements() {
        let outcome = SourceOutcome::done(
            "tasmania",
            1,
            Duration::from_millis(120),
            RunResult::empty("tasmania"),
        );
        assert!(outcome.succeeded());
        assert_eq!(outcome.message(), "No new measurements found for tasmania");
    }

    #[test]
    fn failed_outcome_carries_the_typed_error() {
        let outcome = SourceOutcome::failed(
            "beijing",
            3,
            Duration::from_secs(2),
            FetchError::timeout("request exceeded 30s").for_source("beijing"),
        );
        assert!(!outcome.succeeded());
        assert_eq!(outcome.state, RunState::Failed);
        assert!(outcome.message().contains("fetch.timeout"));
    }

    #[test]
    fn summary_separates_failures_from_successes() {
        let summary = FetchSummary::new(
            vec![
                SourceOutcome::done(
                    "b",
                    1,
                    Duration::from_millis(10),
                    RunResult::empty("b"),
                ),
                SourceOutcome::failed(
                    "a",
                    3,
                    Duration::from_millis(20),
                    FetchError::network("connection refused"),
                ),
            ],
            Duration::from_millis(30),
        );

        assert_eq!(summary.succeeded().count(), 1);
        assert_eq!(summary.failed().count(), 1);
        assert!(summary.is_partial());
        assert_eq!(summary.total_measurements(), 0);
    }
}

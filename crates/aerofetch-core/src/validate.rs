//! Schema validation and pruning.
//!
//! The validator is the only producer of canonical [`Measurement`]s. It
//! runs as a filter: records that fail come back as itemized reasons and
//! are excluded from output, never as an exception that aborts the batch.
//! Aggregated counts are keyed by reason signature so memory stays
//! bounded on large batches.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{
    AveragingPeriod, Coordinates, DateStamp, DraftMeasurement, Measurement, Parameter, Unit,
};
use crate::error::{FetchError, ValidationFailure};
use crate::normalize::is_error_sentinel;

/// Failure tallies keyed by reason signature.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailureCounts(BTreeMap<String, u64>);

impl FailureCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tally(&mut self, signature: impl Into<String>) {
        *self.0.entry(signature.into()).or_insert(0) += 1;
    }

    pub fn record(&mut self, failure: &ValidationFailure) {
        self.tally(failure.signature());
    }

    pub fn get(&self, signature: &str) -> u64 {
        self.0.get(signature).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn merge(&mut self, other: &FailureCounts) {
        for (signature, count) in &other.0 {
            *self.0.entry(signature.clone()).or_insert(0) += count;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(signature, count)| (signature.as_str(), *count))
    }
}

/// Check one normalized draft against the canonical schema.
///
/// Returns the canonical record, or every reason it fails. Reasons are
/// collected rather than short-circuited so one pass reports the full
/// shape of a broken feed.
pub fn validate_record(draft: &DraftMeasurement) -> Result<Measurement, Vec<ValidationFailure>> {
    let mut failures = Vec::new();

    let parameter = match draft.parameter.as_deref() {
        None => {
            failures.push(ValidationFailure::MissingField { field: "parameter" });
            None
        }
        Some(text) => match Parameter::parse(text) {
            Ok(parameter) => Some(parameter),
            Err(failure) => {
                failures.push(failure);
                None
            }
        },
    };

    let value = match draft.value {
        None => {
            failures.push(ValidationFailure::MissingField { field: "value" });
            None
        }
        Some(value) if !value.is_finite() => {
            failures.push(ValidationFailure::NonFiniteValue);
            None
        }
        Some(value) if is_error_sentinel(value) => {
            failures.push(ValidationFailure::SentinelValue { value });
            None
        }
        Some(value) => Some(value),
    };

    let unit = match draft.unit.as_deref() {
        None => {
            failures.push(ValidationFailure::MissingField { field: "unit" });
            None
        }
        Some(text) => match Unit::parse(text) {
            Ok(unit) => Some(unit),
            Err(failure) => {
                failures.push(failure);
                None
            }
        },
    };

    let date = match &draft.date {
        None => {
            failures.push(ValidationFailure::MissingField { field: "date" });
            None
        }
        Some(date) => {
            let utc = date.utc.as_deref();
            let local = date.local.as_deref();
            if utc.is_none() {
                failures.push(ValidationFailure::MissingField { field: "date.utc" });
            }
            if local.is_none() {
                failures.push(ValidationFailure::MissingField { field: "date.local" });
            }
            match (utc, local) {
                (Some(utc), Some(local)) => match DateStamp::from_parts(utc, local) {
                    Ok(stamp) => Some(stamp),
                    Err(failure) => {
                        failures.push(failure);
                        None
                    }
                },
                _ => None,
            }
        }
    };

    let coordinates = match &draft.coordinates {
        None => None,
        Some(coordinates) => {
            let latitude = coordinates.latitude;
            let longitude = coordinates.longitude;
            if latitude.is_none() {
                failures.push(ValidationFailure::MissingField {
                    field: "coordinates.latitude",
                });
            }
            if longitude.is_none() {
                failures.push(ValidationFailure::MissingField {
                    field: "coordinates.longitude",
                });
            }
            match (latitude, longitude) {
                (Some(latitude), Some(longitude)) => {
                    match Coordinates::new(latitude, longitude) {
                        Ok(coordinates) => Some(coordinates),
                        Err(failure) => {
                            failures.push(failure);
                            None
                        }
                    }
                }
                _ => None,
            }
        }
    };

    let location = match draft.location.as_deref() {
        None => {
            failures.push(ValidationFailure::MissingField { field: "location" });
            None
        }
        Some(text) if text.trim().is_empty() => {
            failures.push(ValidationFailure::EmptyField { field: "location" });
            None
        }
        Some(text) => Some(text.to_owned()),
    };

    let attribution = match &draft.attribution {
        None => {
            failures.push(ValidationFailure::EmptyAttribution);
            None
        }
        Some(entries) if entries.is_empty() => {
            failures.push(ValidationFailure::EmptyAttribution);
            None
        }
        Some(entries) => {
            if entries.iter().any(|entry| entry.name.trim().is_empty()) {
                failures.push(ValidationFailure::EmptyField {
                    field: "attribution.name",
                });
                None
            } else {
                Some(entries.clone())
            }
        }
    };

    let averaging_period = match &draft.averaging_period {
        None => {
            failures.push(ValidationFailure::MissingField {
                field: "averagingPeriod",
            });
            None
        }
        Some(period) => {
            let value = period.value.unwrap_or(f64::NAN);
            match AveragingPeriod::new(value, period.unit.clone().unwrap_or_default()) {
                Ok(period) => Some(period),
                Err(failure) => {
                    failures.push(failure);
                    None
                }
            }
        }
    };

    if !failures.is_empty() {
        return Err(failures);
    }

    // All parts are present when no failure was recorded above.
    Measurement::new(
        parameter.expect("parameter validated"),
        value.expect("value validated"),
        unit.expect("unit validated"),
        date.expect("date validated"),
        coordinates,
        location.expect("location validated"),
        draft.city.clone(),
        draft.country.clone(),
        attribution.expect("attribution validated"),
        averaging_period.expect("averaging period validated"),
    )
    .map_err(|failure| vec![failure])
}

/// Incremental filter over a record sequence.
///
/// Feeds one draft at a time; invalid records are dropped and their
/// reasons tallied. Used by the scheduler so streaming sources never
/// buffer more than the record in flight.
#[derive(Debug, Default)]
pub struct Pruner {
    counts: FailureCounts,
}

impl Pruner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&mut self, draft: &DraftMeasurement) -> Option<Measurement> {
        match validate_record(draft) {
            Ok(measurement) => Some(measurement),
            Err(failures) => {
                for failure in &failures {
                    tracing::debug!(reason = %failure, "pruning invalid record");
                    self.counts.record(failure);
                }
                None
            }
        }
    }

    /// Count a record that never reached validation (unparseable raw).
    pub fn reject(&mut self, failure: &ValidationFailure) {
        tracing::debug!(reason = %failure, "rejecting malformed record");
        self.counts.record(failure);
    }

    /// Count a non-fatal stream item error under its error code.
    pub fn reject_item_error(&mut self, error: &FetchError) {
        tracing::debug!(reason = %error, "skipping failed stream item");
        self.counts.tally(error.code());
    }

    pub fn counts(&self) -> &FailureCounts {
        &self.counts
    }

    pub fn finish(self) -> FailureCounts {
        self.counts
    }
}

/// Prune a whole batch of normalized drafts.
pub fn prune(
    drafts: impl IntoIterator<Item = DraftMeasurement>,
) -> (Vec<Measurement>, FailureCounts) {
    let mut pruner = Pruner::new();
    let measurements = drafts
        .into_iter()
        .filter_map(|draft| pruner.admit(&draft))
        .collect();
    (measurements, pruner.finish())
}

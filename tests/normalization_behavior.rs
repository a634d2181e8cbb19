//! Behavior-driven tests for normalization and pruning, exercised the
//! way the scheduler uses them: raw provider JSON through the draft
//! boundary, the normalizer, then the validator.

use aerofetch_core::{
    normalize, prune, DraftMeasurement, Parameter, Source, Unit, ValidationFailure,
};
use serde_json::{json, Value};

fn source() -> Source {
    Source::named("arpalazio", "json-api")
        .with_country("IT")
        .with_city("Roma")
        .with_organization("ARPA Lazio", "http://www.arpalazio.gov.it/")
}

fn raw_record(parameter: &str, value: Value, unit: &str) -> Value {
    json!({
        "parameter": parameter,
        "value": value,
        "unit": unit,
        "date": { "utc": "2024-03-01T10:00:00Z", "local": "2024-03-01T11:00:00+01:00" },
        "location": "Villa Ada",
        "attribution": [{ "name": "ARPA Lazio" }],
        "averagingPeriod": { "value": 1.0, "unit": "hours" }
    })
}

fn normalized_draft(raw: &Value) -> DraftMeasurement {
    let draft = DraftMeasurement::from_raw(raw).expect("raw record deserializes");
    normalize(draft, &source())
}

// =============================================================================
// Unit conversion exactness
// =============================================================================

#[test]
fn pphm_converts_exactly_to_ppm() {
    let draft = normalized_draft(&raw_record("o3", json!(1000), "pphm"));
    assert_eq!(draft.value, Some(10.0));
    assert_eq!(draft.unit.as_deref(), Some("ppm"));
}

#[test]
fn mg_per_cubic_meter_converts_exactly_to_ug() {
    let draft = normalized_draft(&raw_record("co", json!(1), "mg/m³"));
    assert_eq!(draft.value, Some(1000.0));
    assert_eq!(draft.unit.as_deref(), Some("µg/m³"));
}

#[test]
fn converted_records_pass_validation_end_to_end() {
    let drafts = vec![
        normalized_draft(&raw_record("no2", json!(400), "ppb")),
        normalized_draft(&raw_record("PM2.5", json!("17.5"), "UG/M3")),
    ];

    let (measurements, failures) = prune(drafts);
    assert!(failures.is_empty());
    assert_eq!(measurements.len(), 2);
    assert_eq!(measurements[0].parameter, Parameter::No2);
    assert_eq!(measurements[0].unit, Unit::PartsPerMillion);
    assert_eq!(measurements[0].value, 0.4);
    assert_eq!(measurements[1].parameter, Parameter::Pm25);
    assert_eq!(measurements[1].value, 17.5);
}

// =============================================================================
// Idempotence
// =============================================================================

#[test]
fn running_a_record_through_normalization_twice_changes_nothing() {
    for (parameter, value, unit) in [
        ("Ozone", json!(80), "ppb"),
        ("pm10", json!(44.0), "µg/m³"),
        ("SO2", json!(3), "pphm"),
        ("humidity", json!(60), "%"),
    ] {
        let once = normalized_draft(&raw_record(parameter, value, unit));
        let twice = normalize(once.clone(), &source());
        assert_eq!(once, twice, "parameter {parameter} unit {unit}");
    }
}

// =============================================================================
// Pruning
// =============================================================================

#[test]
fn unrecognized_parameter_is_pruned_and_counted_once() {
    let drafts = vec![
        normalized_draft(&raw_record("pm25", json!(10), "µg/m³")),
        normalized_draft(&raw_record("temperature", json!(21), "µg/m³")),
        normalized_draft(&raw_record("pm10", json!(20), "µg/m³")),
    ];

    let (measurements, failures) = prune(drafts);
    assert_eq!(measurements.len(), 2);
    assert_eq!(failures.get("unknown parameter"), 1);
    assert_eq!(failures.total(), 1);
}

#[test]
fn unconverted_units_are_rejected_downstream_not_invented() {
    // The normalizer leaves an unknown unit untouched; the validator
    // prunes the record instead of guessing a conversion.
    let draft = normalized_draft(&raw_record("pm25", json!(40), "grains/ft³"));
    assert_eq!(draft.unit.as_deref(), Some("grains/ft³"));
    assert_eq!(draft.value, Some(40.0));

    let (measurements, failures) = prune(vec![draft]);
    assert!(measurements.is_empty());
    assert_eq!(failures.get("unknown unit"), 1);
}

#[test]
fn mismatched_date_pair_is_pruned() {
    let raw = json!({
        "parameter": "pm25",
        "value": 10,
        "unit": "µg/m³",
        "date": { "utc": "2024-03-01T10:00:00Z", "local": "2024-03-01T10:00:00+05:00" },
        "location": "Villa Ada",
        "attribution": [{ "name": "ARPA Lazio" }],
        "averagingPeriod": { "value": 1.0, "unit": "hours" }
    });

    let (measurements, failures) = prune(vec![normalized_draft(&raw)]);
    assert!(measurements.is_empty());
    assert_eq!(
        failures.get(&ValidationFailure::InconsistentDate.signature()),
        1
    );
}

// =============================================================================
// Date and source-default normalization
// =============================================================================

#[test]
fn utc_is_derived_from_a_local_only_record() {
    let raw = json!({
        "parameter": "pm25",
        "value": 8,
        "unit": "µg/m³",
        "date": { "local": "2024-03-01T11:00:00+01:00" },
        "location": "Villa Ada",
        "attribution": [{ "name": "ARPA Lazio" }],
        "averagingPeriod": { "value": 1.0, "unit": "hours" }
    });

    let (measurements, failures) = prune(vec![normalized_draft(&raw)]);
    assert!(failures.is_empty());
    assert_eq!(
        measurements[0].date.utc().format_rfc3339(),
        "2024-03-01T10:00:00Z"
    );
}

#[test]
fn missing_descriptive_fields_fall_back_to_the_source() {
    let raw = json!({
        "parameter": "pm10",
        "value": 25,
        "unit": "µg/m³",
        "date": { "utc": "2024-03-01T10:00:00Z", "local": "2024-03-01T11:00:00+01:00" },
        "averagingPeriod": { "value": 24.0, "unit": "hours" }
    });

    let (measurements, failures) = prune(vec![normalized_draft(&raw)]);
    assert!(failures.is_empty(), "failures: {failures:?}");

    let measurement = &measurements[0];
    assert_eq!(measurement.location, "arpalazio");
    assert_eq!(measurement.city.as_deref(), Some("Roma"));
    assert_eq!(measurement.country.as_deref(), Some("IT"));
    assert_eq!(measurement.attribution[0].name, "ARPA Lazio");
    assert_eq!(
        measurement.attribution[0].url.as_deref(),
        Some("http://www.arpalazio.gov.it/")
    );
}

// =============================================================================
// Failure reporting shape
// =============================================================================

#[test]
fn a_record_broken_in_several_ways_reports_each_reason() {
    let raw = json!({
        "parameter": "pm25",
        "value": "not-a-number",
        "unit": "bananas",
        "date": { "utc": "2024-03-01T10:00:00Z", "local": "2024-03-01T11:00:00+01:00" },
        "location": "Villa Ada",
        "attribution": [],
        "averagingPeriod": { "value": 1.0, "unit": "hours" }
    });

    let (measurements, failures) = prune(vec![normalized_draft(&raw)]);
    assert!(measurements.is_empty());
    assert_eq!(failures.get("missing required field 'value'"), 1);
    assert_eq!(failures.get("unknown unit"), 1);
    assert_eq!(failures.get("attribution must contain at least one entry"), 1);
    assert_eq!(failures.total(), 3);
}

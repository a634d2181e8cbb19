use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ValidationFailure;

/// Provider-native record as the adapter produced it. No canonical
/// guarantees; consumed immediately by the draft/normalize stage.
pub type RawRecord = Value;

/// Provenance entry attached to every canonical measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Attribution {
    pub fn new(name: impl Into<String>, url: Option<String>) -> Self {
        Self {
            name: name.into(),
            url,
        }
    }
}

/// Loose measurement shape sitting between a [`RawRecord`] and a
/// validated `Measurement`.
///
/// Every field is optional and leniently typed; this is the schema
/// boundary that keeps duck-typed provider data from leaking into the
/// canonical model. The normalizer rewrites drafts in place, the
/// validator either promotes them or prunes them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DraftMeasurement {
    pub parameter: Option<String>,
    #[serde(deserialize_with = "lenient_value")]
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub date: Option<DraftDate>,
    pub coordinates: Option<DraftCoordinates>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub attribution: Option<Vec<Attribution>>,
    pub averaging_period: Option<DraftAveragingPeriod>,
}

impl DraftMeasurement {
    /// Deserialize a raw provider record into the draft shape.
    pub fn from_raw(raw: &RawRecord) -> Result<Self, ValidationFailure> {
        if !raw.is_object() {
            return Err(ValidationFailure::NotAnObject);
        }
        serde_json::from_value(raw.clone()).map_err(|error| ValidationFailure::Malformed {
            reason: error.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftDate {
    pub utc: Option<String>,
    pub local: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftCoordinates {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftAveragingPeriod {
    pub value: Option<f64>,
    pub unit: Option<String>,
}

// Providers report numbers as JSON numbers or as quoted strings; anything
// else (including unparseable strings) becomes None and is reported by
// the validator as a missing value.
fn lenient_value<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn draft_accepts_string_values() {
        let raw = json!({ "parameter": "pm25", "value": "12.5", "unit": "µg/m³" });
        let draft = DraftMeasurement::from_raw(&raw).expect("must deserialize");
        assert_eq!(draft.value, Some(12.5));
    }

    #[test]
    fn draft_ignores_unknown_provider_fields() {
        let raw = json!({ "parameter": "o3", "stationCode": "XK0021A", "qcFlag": 3 });
        let draft = DraftMeasurement::from_raw(&raw).expect("must deserialize");
        assert_eq!(draft.parameter.as_deref(), Some("o3"));
    }

    #[test]
    fn non_object_records_are_rejected() {
        let err = DraftMeasurement::from_raw(&json!([1, 2, 3])).expect_err("must fail");
        assert_eq!(err, ValidationFailure::NotAnObject);
    }

    #[test]
    fn unparseable_value_becomes_none() {
        let raw = json!({ "parameter": "pm10", "value": "n/a" });
        let draft = DraftMeasurement::from_raw(&raw).expect("must deserialize");
        assert_eq!(draft.value, None);
    }
}

use serde::{Deserialize, Serialize};

use crate::domain::{Attribution, DateStamp, Parameter, Unit};
use crate::ValidationFailure;

/// Validated geographic position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationFailure> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationFailure::LatitudeOutOfRange { value: latitude });
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationFailure::LongitudeOutOfRange { value: longitude });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Sampling window the reported value represents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragingPeriod {
    pub value: f64,
    pub unit: String,
}

impl AveragingPeriod {
    pub fn new(value: f64, unit: impl Into<String>) -> Result<Self, ValidationFailure> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ValidationFailure::InvalidAveragingPeriod);
        }
        let unit = unit.into();
        if unit.trim().is_empty() {
            return Err(ValidationFailure::MissingField {
                field: "averagingPeriod.unit",
            });
        }
        Ok(Self { value, unit })
    }
}

/// Canonical measurement record, the pipeline's unit of output.
///
/// A value of this type only exists after unit normalization and schema
/// validation have both passed; the validator is the sole producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub parameter: Parameter,
    pub value: f64,
    pub unit: Unit,
    pub date: DateStamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub attribution: Vec<Attribution>,
    pub averaging_period: AveragingPeriod,
}

impl Measurement {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        parameter: Parameter,
        value: f64,
        unit: Unit,
        date: DateStamp,
        coordinates: Option<Coordinates>,
        location: impl Into<String>,
        city: Option<String>,
        country: Option<String>,
        attribution: Vec<Attribution>,
        averaging_period: AveragingPeriod,
    ) -> Result<Self, ValidationFailure> {
        if !value.is_finite() {
            return Err(ValidationFailure::NonFiniteValue);
        }
        let location = location.into();
        if location.trim().is_empty() {
            return Err(ValidationFailure::EmptyField { field: "location" });
        }
        if attribution.is_empty() {
            return Err(ValidationFailure::EmptyAttribution);
        }
        Ok(Self {
            parameter,
            value,
            unit,
            date,
            coordinates,
            location,
            city,
            country,
            attribution,
            averaging_period,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_date() -> DateStamp {
        DateStamp::from_parts("2024-03-01T10:00:00Z", "2024-03-01T12:00:00+02:00")
            .expect("valid pair")
    }

    #[test]
    fn serializes_to_the_wire_shape() {
        let measurement = Measurement::new(
            Parameter::Pm25,
            18.2,
            Unit::MicrogramsPerCubicMeter,
            sample_date(),
            Some(Coordinates::new(52.2297, 21.0122).expect("valid coordinates")),
            "Warszawa-Targówek",
            Some(String::from("Warszawa")),
            Some(String::from("PL")),
            vec![Attribution::new("GIOS", Some(String::from("http://powietrze.gios.gov.pl/")))],
            AveragingPeriod::new(1.0, "hours").expect("valid period"),
        )
        .expect("valid measurement");

        let json = serde_json::to_value(&measurement).expect("serializes");
        assert_eq!(json["parameter"], "pm25");
        assert_eq!(json["unit"], "µg/m³");
        assert_eq!(json["date"]["utc"], "2024-03-01T10:00:00Z");
        assert_eq!(json["date"]["local"], "2024-03-01T12:00:00+02:00");
        assert_eq!(json["averagingPeriod"]["value"], 1.0);
    }

    #[test]
    fn rejects_empty_attribution() {
        let err = Measurement::new(
            Parameter::O3,
            0.03,
            Unit::PartsPerMillion,
            sample_date(),
            None,
            "somewhere",
            None,
            None,
            Vec::new(),
            AveragingPeriod::new(8.0, "hours").expect("valid period"),
        )
        .expect_err("must fail");
        assert_eq!(err, ValidationFailure::EmptyAttribution);
    }

    #[test]
    fn coordinates_are_range_checked() {
        assert!(Coordinates::new(91.0, 0.0).is_err());
        assert!(Coordinates::new(0.0, -181.0).is_err());
        assert!(Coordinates::new(-33.45, -70.66).is_ok());
    }
}

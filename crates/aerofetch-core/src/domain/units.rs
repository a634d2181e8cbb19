use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationFailure;

/// Canonical measurement units.
///
/// Mass concentrations are reported in µg/m³, volumetric concentrations
/// in ppm. The normalizer converts everything else it recognizes into one
/// of these; units it does not recognize reach the validator unchanged
/// and the record is pruned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Unit {
    MicrogramsPerCubicMeter,
    PartsPerMillion,
}

impl Unit {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MicrogramsPerCubicMeter => "µg/m³",
            Self::PartsPerMillion => "ppm",
        }
    }

    pub fn parse(input: &str) -> Result<Self, ValidationFailure> {
        match input {
            "µg/m³" => Ok(Self::MicrogramsPerCubicMeter),
            "ppm" => Ok(Self::PartsPerMillion),
            other => Err(ValidationFailure::UnknownUnit {
                unit: other.to_owned(),
            }),
        }
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Unit {
    type Error = ValidationFailure;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Unit> for String {
    fn from(value: Unit) -> Self {
        value.as_str().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_units_round_trip_through_serde() {
        let json = serde_json::to_string(&Unit::MicrogramsPerCubicMeter).expect("serializes");
        assert_eq!(json, "\"µg/m³\"");
        let back: Unit = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, Unit::MicrogramsPerCubicMeter);
    }

    #[test]
    fn rejects_unconverted_provider_unit() {
        let err = Unit::parse("ppb").expect_err("must fail");
        assert!(matches!(err, ValidationFailure::UnknownUnit { .. }));
    }
}

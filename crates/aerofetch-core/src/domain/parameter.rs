use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationFailure;

/// Canonical pollutant parameters the platform accepts.
///
/// Everything else a provider reports (humidity, wind speed, station
/// diagnostics) is pruned during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    Pm25,
    Pm10,
    O3,
    No2,
    So2,
    Co,
    Bc,
}

impl Parameter {
    pub const ALL: [Self; 7] = [
        Self::Pm25,
        Self::Pm10,
        Self::O3,
        Self::No2,
        Self::So2,
        Self::Co,
        Self::Bc,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pm25 => "pm25",
            Self::Pm10 => "pm10",
            Self::O3 => "o3",
            Self::No2 => "no2",
            Self::So2 => "so2",
            Self::Co => "co",
            Self::Bc => "bc",
        }
    }

    /// Collapse a provider spelling to its canonical text form: lowercase,
    /// dots/underscores/spaces stripped, well-known long names aliased.
    ///
    /// Unrecognized spellings come back stripped but otherwise untouched so
    /// the validator can report them.
    pub fn unify(input: &str) -> String {
        let stripped: String = input
            .trim()
            .to_lowercase()
            .chars()
            .filter(|ch| !matches!(ch, '.' | '_' | ' '))
            .collect();

        match stripped.as_str() {
            "ozone" => String::from("o3"),
            "nitrogendioxide" => String::from("no2"),
            "sulfurdioxide" | "sulphurdioxide" => String::from("so2"),
            "carbonmonoxide" => String::from("co"),
            "blackcarbon" => String::from("bc"),
            "particulatematter25" => String::from("pm25"),
            "particulatematter10" => String::from("pm10"),
            _ => stripped,
        }
    }

    /// Parse a provider spelling into the canonical enum.
    pub fn parse(input: &str) -> Result<Self, ValidationFailure> {
        match Self::unify(input).as_str() {
            "pm25" => Ok(Self::Pm25),
            "pm10" => Ok(Self::Pm10),
            "o3" => Ok(Self::O3),
            "no2" => Ok(Self::No2),
            "so2" => Ok(Self::So2),
            "co" => Ok(Self::Co),
            "bc" => Ok(Self::Bc),
            _ => Err(ValidationFailure::UnknownParameter {
                name: input.to_owned(),
            }),
        }
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Parameter {
    type Err = ValidationFailure;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

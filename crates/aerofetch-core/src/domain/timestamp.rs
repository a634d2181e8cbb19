use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::ValidationFailure;

/// RFC3339 instant normalized to UTC (suffix `Z`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcStamp(OffsetDateTime);

impl UtcStamp {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Parse any RFC3339 timestamp and convert it to UTC.
    pub fn parse(input: &str) -> Result<Self, ValidationFailure> {
        let parsed = OffsetDateTime::parse(input, &Rfc3339).map_err(|_| {
            ValidationFailure::InvalidUtcDate {
                value: input.to_owned(),
            }
        })?;
        Ok(Self::from_offset(parsed))
    }

    pub fn from_offset(value: OffsetDateTime) -> Self {
        Self(value.to_offset(UtcOffset::UTC))
    }

    pub fn unix_timestamp(self) -> i64 {
        self.0.unix_timestamp()
    }

    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }

    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .expect("UTC instant must be RFC3339 formattable")
    }
}

/// RFC3339 instant that keeps the source-local offset it was reported with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalStamp(OffsetDateTime);

impl LocalStamp {
    pub fn parse(input: &str) -> Result<Self, ValidationFailure> {
        let parsed = OffsetDateTime::parse(input, &Rfc3339).map_err(|_| {
            ValidationFailure::InvalidLocalDate {
                value: input.to_owned(),
            }
        })?;
        Ok(Self(parsed))
    }

    pub fn unix_timestamp(self) -> i64 {
        self.0.unix_timestamp()
    }

    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }

    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .expect("local instant must be RFC3339 formattable")
    }
}

/// Paired UTC and source-local timestamps of one measurement.
///
/// Both components are required and must describe the same instant;
/// [`DateStamp::from_parts`] is the only way to build one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateStamp {
    utc: UtcStamp,
    local: LocalStamp,
}

impl DateStamp {
    pub fn from_parts(utc: &str, local: &str) -> Result<Self, ValidationFailure> {
        let utc = UtcStamp::parse(utc)?;
        let local = LocalStamp::parse(local)?;
        if utc.unix_timestamp() != local.unix_timestamp() {
            return Err(ValidationFailure::InconsistentDate);
        }
        Ok(Self { utc, local })
    }

    pub fn utc(&self) -> UtcStamp {
        self.utc
    }

    pub fn local(&self) -> LocalStamp {
        self.local
    }
}

impl Display for UtcStamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Display for LocalStamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for UtcStamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}

impl<'de> Deserialize<'de> for UtcStamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

impl Serialize for LocalStamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}

impl<'de> Deserialize<'de> for LocalStamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

impl Serialize for DateStamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("DateStamp", 2)?;
        state.serialize_field("utc", &self.utc)?;
        state.serialize_field("local", &self.local)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for DateStamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            utc: String,
            local: String,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::from_parts(&raw.utc, &raw.local).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_converts_offset_to_utc() {
        let stamp = UtcStamp::parse("2024-03-01T12:00:00+02:00").expect("must parse");
        assert_eq!(stamp.format_rfc3339(), "2024-03-01T10:00:00Z");
    }

    #[test]
    fn local_keeps_its_offset() {
        let stamp = LocalStamp::parse("2024-03-01T12:00:00+02:00").expect("must parse");
        assert_eq!(stamp.format_rfc3339(), "2024-03-01T12:00:00+02:00");
    }

    #[test]
    fn consistent_pair_builds_a_date_stamp() {
        let date = DateStamp::from_parts("2024-03-01T10:00:00Z", "2024-03-01T12:00:00+02:00")
            .expect("must build");
        assert_eq!(date.utc().format_rfc3339(), "2024-03-01T10:00:00Z");
    }

    #[test]
    fn rejects_mismatched_instants() {
        let err = DateStamp::from_parts("2024-03-01T10:00:00Z", "2024-03-01T12:00:00+01:00")
            .expect_err("must fail");
        assert_eq!(err, ValidationFailure::InconsistentDate);
    }

    #[test]
    fn rejects_unparseable_local() {
        let err = DateStamp::from_parts("2024-03-01T10:00:00Z", "01/03/2024 12:00")
            .expect_err("must fail");
        assert!(matches!(err, ValidationFailure::InvalidLocalDate { .. }));
    }
}

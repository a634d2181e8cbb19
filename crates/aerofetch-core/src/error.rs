use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Source-level error classification used by the scheduler retry policy
/// and by per-source run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    Network,
    Parse,
    ValidationSetup,
    AdapterNotRegistered,
    Internal,
}

/// Structured error for a source fetch or one item of a record stream.
///
/// `retryable` drives the scheduler retry loop; `fatal` marks a stream
/// item error that means the whole source is unavailable rather than a
/// single record being broken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
    source_name: Option<String>,
    retryable: bool,
    fatal: bool,
}

impl FetchError {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Timeout,
            message: message.into(),
            source_name: None,
            retryable: true,
            fatal: false,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Network,
            message: message.into(),
            source_name: None,
            retryable: true,
            fatal: false,
        }
    }

    /// Malformed upstream payload. Never retried: the provider will keep
    /// returning the same broken body.
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Parse,
            message: message.into(),
            source_name: None,
            retryable: false,
            fatal: true,
        }
    }

    pub fn validation_setup(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::ValidationSetup,
            message: message.into(),
            source_name: None,
            retryable: false,
            fatal: true,
        }
    }

    pub fn adapter_not_registered(adapter: &str) -> Self {
        Self {
            kind: FetchErrorKind::AdapterNotRegistered,
            message: format!("source adapter '{adapter}' is not registered"),
            source_name: None,
            retryable: false,
            fatal: true,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Internal,
            message: message.into(),
            source_name: None,
            retryable: false,
            fatal: false,
        }
    }

    /// Attach the name of the source the error belongs to.
    pub fn for_source(mut self, name: &str) -> Self {
        self.source_name = Some(name.to_owned());
        self
    }

    /// Mark a stream item error as meaning the whole source is down.
    pub fn as_fatal(mut self) -> Self {
        self.fatal = true;
        self
    }

    pub const fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn fatal(&self) -> bool {
        self.fatal
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FetchErrorKind::Timeout => "fetch.timeout",
            FetchErrorKind::Network => "fetch.network",
            FetchErrorKind::Parse => "fetch.parse",
            FetchErrorKind::ValidationSetup => "fetch.validation_setup",
            FetchErrorKind::AdapterNotRegistered => "fetch.adapter_not_registered",
            FetchErrorKind::Internal => "fetch.internal",
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.source_name {
            Some(source) => write!(f, "{} [{}] ({})", self.message, source, self.code()),
            None => write!(f, "{} ({})", self.message, self.code()),
        }
    }
}

impl std::error::Error for FetchError {}

/// Per-record schema violation found while validating a draft measurement.
///
/// `Display` carries the record-specific detail; [`ValidationFailure::signature`]
/// is the stable grouping key used by failure counting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationFailure {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("malformed record: {reason}")]
    Malformed { reason: String },
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },
    #[error("field '{field}' must not be empty")]
    EmptyField { field: &'static str },
    #[error("value must be a finite number")]
    NonFiniteValue,
    #[error("value {value} is a provider error sentinel")]
    SentinelValue { value: f64 },
    #[error("unknown parameter '{name}'")]
    UnknownParameter { name: String },
    #[error("unknown unit '{unit}'")]
    UnknownUnit { unit: String },
    #[error("date.utc is not a valid RFC3339 timestamp: '{value}'")]
    InvalidUtcDate { value: String },
    #[error("date.local is not a valid RFC3339 timestamp with offset: '{value}'")]
    InvalidLocalDate { value: String },
    #[error("date.utc and date.local refer to different instants")]
    InconsistentDate,
    #[error("latitude {value} is out of range")]
    LatitudeOutOfRange { value: f64 },
    #[error("longitude {value} is out of range")]
    LongitudeOutOfRange { value: f64 },
    #[error("attribution must contain at least one entry")]
    EmptyAttribution,
    #[error("averaging period value must be a positive finite number")]
    InvalidAveragingPeriod,
}

impl ValidationFailure {
    /// Stable grouping key: drops record-specific detail so counts stay
    /// bounded by the number of distinct reasons, not records.
    pub fn signature(&self) -> String {
        match self {
            Self::NotAnObject => String::from("record is not a JSON object"),
            Self::Malformed { .. } => String::from("malformed record"),
            Self::MissingField { field } => format!("missing required field '{field}'"),
            Self::EmptyField { field } => format!("field '{field}' must not be empty"),
            Self::NonFiniteValue => String::from("value must be a finite number"),
            Self::SentinelValue { .. } => String::from("value is a provider error sentinel"),
            Self::UnknownParameter { .. } => String::from("unknown parameter"),
            Self::UnknownUnit { .. } => String::from("unknown unit"),
            Self::InvalidUtcDate { .. } => String::from("date.utc is not a valid timestamp"),
            Self::InvalidLocalDate { .. } => String::from("date.local is not a valid timestamp"),
            Self::InconsistentDate => {
                String::from("date.utc and date.local refer to different instants")
            }
            Self::LatitudeOutOfRange { .. } => String::from("latitude is out of range"),
            Self::LongitudeOutOfRange { .. } => String::from("longitude is out of range"),
            Self::EmptyAttribution => String::from("attribution must contain at least one entry"),
            Self::InvalidAveragingPeriod => {
                String::from("averaging period value must be a positive finite number")
            }
        }
    }
}

//! Shared error type across metermock crates.

use thiserror::Error;

/// Stable error codes for assertions in harness code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Instrument name already registered with an incompatible descriptor.
    KindMismatch,
    /// Malformed or invalid configuration.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal failure (I/O and the like).
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::KindMismatch => "KIND_MISMATCH",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricError>;

/// Unified error type used by core and SDK.
///
/// The raw meter never produces one of these; only the layers wrapped
/// around it (uniqueness checking, config loading) do.
#[derive(Debug, Error)]
pub enum MetricError {
    #[error("metric {name} ({library}) was already registered as {existing}")]
    KindMismatch {
        name: String,
        library: String,
        existing: String,
    },
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl MetricError {
    pub fn code(&self) -> ErrorCode {
        match self {
            MetricError::KindMismatch { .. } => ErrorCode::KindMismatch,
            MetricError::BadConfig(_) => ErrorCode::BadConfig,
            MetricError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            MetricError::Internal(_) => ErrorCode::Internal,
        }
    }
}

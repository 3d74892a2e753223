use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the gamigrate workspace.
///
/// Every variant is fatal to a migration run except where a caller chooses to
/// recover. Data-quality problems that have a local repair (an unusable
/// referrer, for instance) never surface as errors at all.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MigrateError {
    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Run configuration is missing or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// A group key could not be parsed into a timestamp.
    #[error("malformed group key {value:?}: {reason}")]
    Parse {
        /// The raw value that failed to parse.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Issues with the returned or expected data (missing fields, etc.).
    #[error("data issue: {0}")]
    Data(String),

    /// An individual connector returned an error.
    #[error("{connector} failed: {msg}")]
    Connector {
        /// Connector name that failed.
        connector: String,
        /// Human-readable error message.
        msg: String,
    },

    /// Reading or writing a local file failed.
    #[error("i/o error on {path}: {msg}")]
    Io {
        /// Path of the file involved.
        path: String,
        /// Human-readable error message.
        msg: String,
    },

    /// Unknown/opaque error.
    #[error("unknown error: {0}")]
    Other(String),
}

impl MigrateError {
    /// Helper: build a `Connector` error with the connector name and message.
    pub fn connector(connector: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Connector {
            connector: connector.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `Parse` error for a rejected raw value.
    pub fn parse(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Helper: build an `Io` error from a path and the underlying error.
    pub fn io(path: impl std::fmt::Display, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            msg: err.to_string(),
        }
    }

    /// Name of the pipeline stage this error belongs to.
    ///
    /// Used by front-ends to tell the operator where a run halted.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::InvalidArg(_) | Self::Config(_) => "config",
            Self::Data(_) | Self::Connector { .. } => "fetch",
            Self::Parse { .. } => "expand",
            Self::Io { .. } => "write",
            Self::Other(_) => "run",
        }
    }
}

//! Error types for Streamgate topology resolution
//!
//! Errors are structured with fields so the provisioning layer can report
//! exactly which part of a profile was rejected. Resolution is pure, so none
//! of these errors are retryable: each one requires a change to the input.

use thiserror::Error;

/// Default context value when no specific field is available
pub const UNKNOWN_FIELD: &str = "unknown";

/// Main error type for Streamgate operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The ingestion profile violates one of its invariants
    #[error("invalid profile [{}]: {message}", .field.as_deref().unwrap_or(UNKNOWN_FIELD))]
    InvalidProfile {
        /// Description of what's invalid
        message: String,
        /// The offending profile field (e.g., "endpointPath")
        field: Option<String>,
    },

    /// A security edge was constructed in violation of its contract
    #[error("invalid security edge {source_principal} -> {destination}: {message}")]
    InvalidEdge {
        /// Principal initiating the connection
        source_principal: String,
        /// Principal accepting the connection
        destination: String,
        /// Description of the violation
        message: String,
    },

    /// A profile document could not be parsed or deserialized
    #[error("config error: {message}")]
    Config {
        /// Description of what failed
        message: String,
        /// Input format being read (yaml, json)
        format: Option<String>,
    },
}

impl Error {
    /// Create an invalid profile error without field context
    pub fn invalid_profile(msg: impl Into<String>) -> Self {
        Self::InvalidProfile {
            message: msg.into(),
            field: None,
        }
    }

    /// Create an invalid profile error naming the offending field
    pub fn invalid_profile_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidProfile {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create an invalid edge error
    pub fn invalid_edge(
        source_principal: impl std::fmt::Display,
        destination: impl std::fmt::Display,
        msg: impl Into<String>,
    ) -> Self {
        Self::InvalidEdge {
            source_principal: source_principal.to_string(),
            destination: destination.to_string(),
            message: msg.into(),
        }
    }

    /// Create a config error for a specific input format
    pub fn config_for_format(format: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            format: Some(format.into()),
        }
    }

    /// Get the offending field if this is a profile error that names one
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::InvalidProfile { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    /// Returns true if this error was caused by the caller's profile
    ///
    /// Config and profile errors are caller mistakes. Edge errors indicate a
    /// defect in the graph builder itself.
    pub fn is_input_error(&self) -> bool {
        match self {
            Error::InvalidProfile { .. } | Error::Config { .. } => true,
            Error::InvalidEdge { .. } => false,
        }
    }
}

//! Error types for miq-bootstrap
//!
//! `BootstrapError` is the typed error every procedure returns. The persistence
//! layer works in `anyhow::Result` and is folded into `BootstrapError::Persistence`
//! at the procedure boundary.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum BootstrapError {
    #[error("alert profile set '{0}' not found")]
    AlertProfileNotFound(String),

    #[error("enterprise {0} not found")]
    EnterpriseNotFound(String),

    #[error("server '{0}' not found")]
    ServerNotFound(String),

    #[error("malformed server configuration: {0}")]
    MalformedConfig(String),

    #[error("invalid guid '{0}'")]
    InvalidGuid(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl BootstrapError {
    /// Stable machine-readable code, printed in run reports
    pub fn code(&self) -> ErrorCode<'static> {
        match self {
            BootstrapError::AlertProfileNotFound(_) => ALERT_PROFILE_NOT_FOUND,
            BootstrapError::EnterpriseNotFound(_) => ENTERPRISE_NOT_FOUND,
            BootstrapError::ServerNotFound(_) => SERVER_NOT_FOUND,
            BootstrapError::MalformedConfig(_) => MALFORMED_CONFIG,
            BootstrapError::InvalidGuid(_) => INVALID_GUID,
            BootstrapError::ConfigError(_) => CONFIG_ERROR,
            BootstrapError::Persistence(_) => DATA_ACCESS_ERROR,
        }
    }
}

/// Error code structure for run reports
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

impl Display for ErrorCode<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code, self.message)
    }
}

pub const DATA_ACCESS_ERROR: ErrorCode<'static> = ErrorCode {
    code: 10002,
    message: "data access error",
};

pub const CONFIG_ERROR: ErrorCode<'static> = ErrorCode {
    code: 10003,
    message: "configuration error",
};

pub const ALERT_PROFILE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20004,
    message: "alert profile set not found",
};

pub const ENTERPRISE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20005,
    message: "enterprise not found",
};

pub const SERVER_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20006,
    message: "server not found",
};

pub const MALFORMED_CONFIG: ErrorCode<'static> = ErrorCode {
    code: 20007,
    message: "malformed server configuration",
};

pub const INVALID_GUID: ErrorCode<'static> = ErrorCode {
    code: 20008,
    message: "invalid guid",
};

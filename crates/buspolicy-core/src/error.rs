//! Shared error type across buspolicy crates.

use std::collections::TryReserveError;

use thiserror::Error;

/// Bus-facing error names (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Out of memory while growing a rule container.
    NoMemory,
    /// Generic failure (identity could not be determined, internal errors).
    Failed,
    /// Security policy rejected the peer.
    AccessDenied,
    /// Invalid configuration or argument.
    InvalidArgs,
}

impl ErrorCode {
    /// Error name as reported on the bus.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NoMemory => "org.freedesktop.DBus.Error.NoMemory",
            ErrorCode::Failed => "org.freedesktop.DBus.Error.Failed",
            ErrorCode::AccessDenied => "org.freedesktop.DBus.Error.AccessDenied",
            ErrorCode::InvalidArgs => "org.freedesktop.DBus.Error.InvalidArgs",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, BusPolicyError>;

/// Unified error type used by core and engine.
#[derive(Debug, Error)]
pub enum BusPolicyError {
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
    #[error("identity unavailable: {0}")]
    IdentityUnavailable(String),
    #[error("group resolution failed: {0}")]
    GroupResolution(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("unknown connection: {0}")]
    UnknownConnection(u64),
    #[error("internal: {0}")]
    Internal(String),
}

impl BusPolicyError {
    /// Map internal error to a stable bus error name.
    pub fn code(&self) -> ErrorCode {
        match self {
            BusPolicyError::ResourceExhausted(_) => ErrorCode::NoMemory,
            BusPolicyError::IdentityUnavailable(_)
            | BusPolicyError::GroupResolution(_)
            | BusPolicyError::UnknownConnection(_)
            | BusPolicyError::Internal(_) => ErrorCode::Failed,
            BusPolicyError::AccessDenied(_) => ErrorCode::AccessDenied,
            BusPolicyError::BadConfig(_) | BusPolicyError::UnsupportedVersion => {
                ErrorCode::InvalidArgs
            }
        }
    }

    /// Wrap a failed reservation with the container it was growing.
    pub fn oom(what: &str, e: TryReserveError) -> Self {
        BusPolicyError::ResourceExhausted(format!("{what}: {e}"))
    }
}

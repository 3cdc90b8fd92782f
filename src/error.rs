//! Error types and handling for the Shopping samples CLI
//!
//! Provides structured error types for all CLI operations with proper context
//! and error chains for debugging.

use std::path::PathBuf;
use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for Shopping samples operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Comprehensive error types for Shopping samples operations
#[derive(Error, Debug)]
pub enum CliError {
    // ═══════════════════════════════════════════════════════════════
    // Network & HTTP Errors
    // ═══════════════════════════════════════════════════════════════
    /// The transport failed to perform the exchange
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// API error response from server
    #[error("Content API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Invalid API response format
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Failed to open or write the exchange log
    #[error("Exchange log error for {path}: {reason}")]
    LogFile { path: PathBuf, reason: String },

    // ═══════════════════════════════════════════════════════════════
    // Authentication & Authorization
    // ═══════════════════════════════════════════════════════════════
    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Token expired or invalid
    #[error("Token expired or invalid: {0}")]
    TokenExpired(String),

    /// The authenticated user cannot see any Merchant Center account
    #[error("The authenticated user does not have access to any Merchant Center accounts")]
    NoMerchantAccess,

    // ═══════════════════════════════════════════════════════════════
    // Configuration & File Errors
    // ═══════════════════════════════════════════════════════════════
    /// Failed to read configuration file
    #[error("Failed to read config from {path}: {reason}")]
    ConfigRead { path: PathBuf, reason: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration directory not found
    #[error("Configuration directory {path} does not exist")]
    NoConfig { path: PathBuf },

    /// Failed to write configuration file
    #[error("Failed to write config to {path}: {reason}")]
    ConfigWrite { path: PathBuf, reason: String },

    // ═══════════════════════════════════════════════════════════════
    // Serialization & Encoding Errors
    // ═══════════════════════════════════════════════════════════════
    /// Failed to serialize data
    #[error("Serialization failed: {0}")]
    SerializationError(String),

    // ═══════════════════════════════════════════════════════════════
    // I/O Errors
    // ═══════════════════════════════════════════════════════════════
    /// File operation failed
    #[error("File operation failed: {path}: {reason}")]
    FileError { path: PathBuf, reason: String },

    /// Permission denied
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    // ═══════════════════════════════════════════════════════════════
    // Validation & Input Errors
    // ═══════════════════════════════════════════════════════════════
    /// Invalid input argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing required argument
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    // ═══════════════════════════════════════════════════════════════
    // Other Errors
    // ═══════════════════════════════════════════════════════════════
    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Get the exit code for this error
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoConfig { .. } | Self::InvalidConfig(_) => 1,
            Self::InvalidArgument(_) | Self::MissingArgument(_) => 2,
            Self::AuthFailed(_) | Self::TokenExpired(_) | Self::NoMerchantAccess => 3,
            Self::Transport(err) if err.is_timeout() => 124,
            Self::Transport(_) => 4,
            Self::ApiError { .. } | Self::InvalidResponse(_) => 5,
            Self::PermissionDenied { .. } => 13,
            _ => 1,
        }
    }

    /// Whether the error is retryable
    ///
    /// Server-side errors and transport failures may clear up on their own;
    /// `404` is included because freshly created resources are only
    /// eventually visible.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_retryable(),
            Self::ApiError { status, .. } => *status == 404 || *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileError {
                path: PathBuf::from("<unknown>"),
                reason: "Not found".to_string(),
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: PathBuf::from("<unknown>"),
            },
            _ => Self::FileError {
                path: PathBuf::from("<unknown>"),
                reason: err.to_string(),
            },
        }
    }
}

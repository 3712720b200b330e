//! Error types for the pan_share crate.

use thiserror::Error;

/// Provider code: the target already holds a file with this name.
pub const ERRNO_FILE_EXISTS: i64 = 12;

/// Provider code: not enough free space left in my storage.
pub const ERRNO_NO_SPACE: i64 = -32;

/// Provider code: a single transfer may touch at most 999 items.
pub const ERRNO_TOO_MANY_ITEMS: i64 = -33;

/// Provider code: the path does not exist.
pub const ERRNO_NOT_FOUND: i64 = -9;

/// Provider codes asking for a verification code before the password is checked.
pub const ERRNO_VCODE_REQUIRED: i64 = -62;
pub const ERRNO_VCODE_INVALID: i64 = -19;

/// Errors that can occur when talking to the netdisk.
#[derive(Error, Debug)]
pub enum PanError {
    #[error("The shared url is not a valid url: {0}")]
    InvalidUrl(String),

    #[error("Remote directory must be an absolute path: {0}")]
    InvalidRemoteDir(String),

    #[error("Provider error ({code}): {message}")]
    Provider { code: i64, message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP error ({status}): {message}")]
    StatusError { status: u16, message: String },

    #[error("Failed to parse response JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

impl PanError {
    /// Build a provider error from an `errno`, falling back to a known description.
    pub fn provider(code: i64, message: Option<&str>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| describe_errno(code).to_string());
        PanError::Provider { code, message }
    }

    /// The provider `errno`, if this error came from the provider.
    pub fn code(&self) -> Option<i64> {
        match self {
            PanError::Provider { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Human-readable description of the provider codes this crate runs into.
pub fn describe_errno(code: i64) -> &'static str {
    match code {
        ERRNO_FILE_EXISTS => "file already exists",
        ERRNO_NO_SPACE => "insufficient space left, cannot transfer",
        ERRNO_TOO_MANY_ITEMS => "at most 999 items per operation, try fewer",
        ERRNO_NOT_FOUND => "path does not exist",
        ERRNO_VCODE_REQUIRED => "verification code required",
        ERRNO_VCODE_INVALID => "verification code is wrong",
        -6 => "identity verification failed, login again",
        -7 => "share link is invalid or was cancelled",
        -8 => "file already exists in the target directory",
        -12 => "wrong share password",
        2 => "invalid parameters",
        4 => "duplicated operation",
        105 => "share link does not exist",
        _ => "unknown error",
    }
}

/// Result type alias for PanError.
pub type Result<T> = std::result::Result<T, PanError>;

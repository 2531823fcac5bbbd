//! Unified error types for the enrichment pipeline.
//!
//! Error codes:
//! - FETCH_001-003: Source API errors
//! - WRITE_001-003: Bronze write errors
//! - TRANSFORM_001-002: Bronze → gold transform errors

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Fetch error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorCode {
    /// FETCH_001: Request never produced a response (connect, timeout, TLS)
    Transport,
    /// FETCH_002: Source answered with a non-2xx status
    HttpStatus,
    /// FETCH_003: Response body could not be decoded
    Decode,
}

impl FetchErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport => "FETCH_001",
            Self::HttpStatus => "FETCH_002",
            Self::Decode => "FETCH_003",
        }
    }
}

/// Bronze write error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteErrorCode {
    /// WRITE_001: Record could not be mapped to a bronze row
    MalformedRecord,
    /// WRITE_002: Store rejected a single row
    InsertFailed,
    /// WRITE_003: Store unreachable or batch could not be committed
    StoreUnavailable,
}

impl WriteErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedRecord => "WRITE_001",
            Self::InsertFailed => "WRITE_002",
            Self::StoreUnavailable => "WRITE_003",
        }
    }
}

/// Transform error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformErrorCode {
    /// TRANSFORM_001: Store unreachable or transaction could not be committed
    StoreUnavailable,
    /// TRANSFORM_002: Select or upsert statement failed
    QueryFailed,
}

impl TransformErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StoreUnavailable => "TRANSFORM_001",
            Self::QueryFailed => "TRANSFORM_002",
        }
    }
}

/// Unified error type for the enrichment pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Source API error with code.
    #[error("[{code}] {message}")]
    Fetch {
        code: &'static str,
        message: String,
        status: Option<u16>,
    },

    /// Bronze write error with code.
    #[error("[{code}] {message}")]
    Write { code: &'static str, message: String },

    /// Transform error with code.
    #[error("[{code}] {message}")]
    Transform { code: &'static str, message: String },

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a fetch error.
    pub fn fetch(code: FetchErrorCode, msg: impl Into<String>) -> Self {
        Self::Fetch {
            code: code.code(),
            message: msg.into(),
            status: None,
        }
    }

    /// Create a fetch error for a non-2xx response.
    pub fn http_status(status: u16, msg: impl Into<String>) -> Self {
        Self::Fetch {
            code: FetchErrorCode::HttpStatus.code(),
            message: msg.into(),
            status: Some(status),
        }
    }

    /// Create a bronze write error.
    pub fn write(code: WriteErrorCode, msg: impl Into<String>) -> Self {
        Self::Write {
            code: code.code(),
            message: msg.into(),
        }
    }

    /// Create a transform error.
    pub fn transform(code: TransformErrorCode, msg: impl Into<String>) -> Self {
        Self::Transform {
            code: code.code(),
            message: msg.into(),
        }
    }

    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a later attempt of the same call may succeed.
    ///
    /// Transport failures, 429 and 5xx responses are transient; anything
    /// else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch { code, status, .. } => {
                if *code == FetchErrorCode::Transport.code() {
                    return true;
                }
                matches!(status, Some(s) if *s == 429 || (500..600).contains(s))
            }
            _ => false,
        }
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::Fetch { code, .. } => Some(code),
            Self::Write { code, .. } => Some(code),
            Self::Transform { code, .. } => Some(code),
            _ => None,
        }
    }
}

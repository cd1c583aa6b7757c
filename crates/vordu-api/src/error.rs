//! Error types for the Vörðu API
//!
//! Every failure leaving a handler becomes a JSON `{"detail": ...}` body.
//! Store internals are logged, never sent to the caller.

use std::convert::Infallible;
use vordu_core::CoreError;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

/// Errors from the matrix store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored cell details could not be encoded or decoded
    #[error("details encoding error: {0}")]
    Details(#[from] serde_json::Error),

    /// A persisted value no longer parses as its domain type
    #[error("corrupt row in {table}: {message}")]
    Corrupt { table: &'static str, message: String },

    #[error("task join error: {0}")]
    Join(String),
}

impl StoreError {
    /// Create corrupt-row error
    pub fn corrupt(table: &'static str, message: impl Into<String>) -> Self {
        Self::Corrupt {
            table,
            message: message.into(),
        }
    }
}

/// Errors surfaced by HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No credential supplied where one is configured
    #[error("missing API key")]
    MissingApiKey,

    /// Credential does not match the configured secret
    #[error("could not validate credentials")]
    InvalidApiKey,

    /// Payload violates an ingress invariant
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Request body is not the expected JSON shape
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("not found")]
    NotFound,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidPayload(message) => Self::InvalidPayload(message),
            other => Self::InvalidPayload(other.to_string()),
        }
    }
}

impl warp::reject::Reject for ApiError {}

impl ApiError {
    /// HTTP status for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingApiKey => StatusCode::UNAUTHORIZED,
            Self::InvalidApiKey => StatusCode::FORBIDDEN,
            Self::InvalidPayload(_) | Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Store(_) => "internal storage error".to_string(),
            Self::NotFound => "Not Found".to_string(),
            other => other.to_string(),
        }
    }

    /// Check if this is an auth rejection
    #[inline]
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::MissingApiKey | Self::InvalidApiKey)
    }
}

/// Render a rejection as `{"detail": ...}`
///
/// # Errors
/// Never fails; the signature matches `Filter::recover`.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, detail) = if let Some(api) = err.find::<ApiError>() {
        if let ApiError::Store(source) = api {
            tracing::error!(error = %source, "Store failure");
        }
        (api.status_code(), api.detail())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            ApiError::MalformedBody(e.to_string()).detail(),
        )
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "expected application/json".to_string(),
        )
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload too large".to_string(),
        )
    } else if let Some(e) = err.find::<warp::cors::CorsForbidden>() {
        (StatusCode::FORBIDDEN, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed".to_string(),
        )
    } else {
        tracing::error!(rejection = ?err, "Unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal error".to_string(),
        )
    };

    let body = warp::reply::json(&serde_json::json!({ "detail": detail }));
    Ok(warp::reply::with_status(body, status))
}

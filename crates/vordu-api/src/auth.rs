//! API key check for mutating endpoints

use crate::error::ApiError;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use warp::{Filter, Rejection};

/// Header carrying the caller's credential
pub const API_KEY_HEADER: &str = "x-api-key";

/// Compare a supplied key against the configured one in constant time
#[must_use]
pub fn key_matches(expected: &str, provided: &str) -> bool {
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// Decide whether a request may proceed
///
/// # Errors
/// - `ApiError::MissingApiKey` when a key is configured but none was sent
/// - `ApiError::InvalidApiKey` when the sent key does not match
pub fn authorize(expected: Option<&str>, provided: Option<&str>) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    match provided {
        None => Err(ApiError::MissingApiKey),
        Some(key) if key_matches(expected, key) => Ok(()),
        Some(_) => Err(ApiError::InvalidApiKey),
    }
}

/// Filter rejecting requests without the configured key
pub fn require_api_key(
    expected: Option<Arc<str>>,
) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::header::optional::<String>(API_KEY_HEADER)
        .and_then(move |provided: Option<String>| {
            let expected = expected.clone();
            async move {
                authorize(expected.as_deref(), provided.as_deref()).map_err(|e| {
                    tracing::warn!("Rejected request: {}", e);
                    warp::reject::custom(e)
                })
            }
        })
        .untuple_one()
}

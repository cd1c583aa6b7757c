//! Error types for Vörðu Core
//!
//! Covers:
//! - Scenario records whose row or phase cannot be resolved
//! - Matrix cells that violate their counter invariants
//! - Unknown categorical values read back from storage

/// Main core error type
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Ingestion data that cannot be placed in the matrix
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Cell status string outside {pass, fail, pending, empty}
    #[error("unknown cell status: '{0}'")]
    UnknownStatus(String),
}

impl CoreError {
    /// Create invalid payload error
    #[inline]
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload(message.into())
    }

    /// Check if error was caused by caller-supplied data
    #[inline]
    #[must_use]
    pub fn is_invalid_payload(&self) -> bool {
        matches!(self, Self::InvalidPayload(_))
    }
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_payload_display() {
        let err = CoreError::invalid_payload("scenario 'S' has no row");
        assert_eq!(err.to_string(), "invalid payload: scenario 'S' has no row");
        assert!(err.is_invalid_payload());
    }

    #[test]
    fn unknown_status_display() {
        let err = CoreError::UnknownStatus("green".to_string());
        assert_eq!(err.to_string(), "unknown cell status: 'green'");
        assert!(!err.is_invalid_payload());
    }
}

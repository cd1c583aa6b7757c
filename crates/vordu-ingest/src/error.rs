//! Error types for Vörðu ingestion
//!
//! Provides error handling for:
//! - Parse operations (catalog, report and feature files)
//! - Posting payloads to the API
//! - Assembling a run (project resolution, payload validation)

use std::path::PathBuf;
use vordu_core::CoreError;

/// Errors while reading or parsing an input file
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Syntax error in source file
    #[error("syntax error in {path}: {message}")]
    SyntaxError { path: PathBuf, message: String },

    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catalog holds no System or Component entity
    #[error("no valid entities found in {0}")]
    NoEntities(PathBuf),

    /// Directory walk failed
    #[error("cannot walk {path}: {message}")]
    Walk { path: PathBuf, message: String },
}

impl ParseError {
    /// Create syntax error for path
    pub fn syntax_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SyntaxError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Replace the placeholder path of a syntax error
    #[must_use]
    pub fn at(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::SyntaxError { message, .. } => Self::SyntaxError {
                path: path.into(),
                message,
            },
            other => other,
        }
    }
}

/// Errors talking to the Vörðu API
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure (connect, timeout, body decode)
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// API answered with a non-success status
    #[error("{url} rejected the request with {status}: {body}")]
    Rejected { url: String, status: u16, body: String },

    /// Client could not be built
    #[error("cannot build http client: {0}")]
    Build(#[source] reqwest::Error),
}

impl ClientError {
    /// Check if the API refused the credential
    #[inline]
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Rejected { status: 401 | 403, .. })
    }
}

/// Combined ingestion error
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// No System entity and no component names an owning system
    #[error("cannot determine project name: catalog has no System entity and no component names a system")]
    NoProject,
}

/// Result type alias for ingestion operations
pub type IngestResult<T> = Result<T, IngestError>;

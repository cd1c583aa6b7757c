//! Vörðu API - matrix store and HTTP surface
//!
//! Persists matrix cells, systems and rows in SQLite and serves them over
//! warp, alongside the built dashboard.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vordu_api::{routes, ServerConfig, SqliteStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::default();
//! let store = Arc::new(SqliteStore::open(&config.database_url)?);
//! warp::serve(routes(store, &config)).run(config.bind).await;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod store;

pub use auth::{authorize, key_matches, require_api_key, API_KEY_HEADER};
pub use config::{ConfigError, ConfigOverrides, ServerConfig};
pub use error::{handle_rejection, ApiError, StoreError};
pub use routes::{api, routes, spa, SharedStore, HEALTH_MESSAGE, UI_NOT_BUILT_MESSAGE};
pub use store::{MatrixStore, RowView, SqliteStore, SystemView};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for serving the API
    pub use crate::{routes, ApiError, MatrixStore, ServerConfig, SqliteStore, StoreError};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

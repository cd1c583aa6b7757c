//! Vörðu Ingest - turns a repository's catalog, feature files and test
//! reports into API payloads
//!
//! - Catalog extraction (System/Component entities and `vordu.io/*` annotations)
//! - Feature scanning for planned scenarios
//! - Cucumber JSON report parsing for executed scenarios
//! - A pipeline that merges, resolves and aggregates them
//! - An HTTP client posting the config and status payloads

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod client;
pub mod error;
pub mod parsers;
pub mod pipeline;

pub use client::{VorduClient, API_KEY_HEADER, DEFAULT_TIMEOUT};
pub use error::{ClientError, IngestError, IngestResult, ParseError};
pub use parsers::{
    deduce_component, scan_features, summarize_steps, Catalog, CatalogParser, FeatureParser,
    ReportParser, SourceParser,
};
pub use pipeline::{IngestionOutput, IngestionRun, RunInputs};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for ingestion
    pub use crate::{
        Catalog, IngestError, IngestionOutput, IngestionRun, RunInputs, SourceParser,
        VorduClient,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

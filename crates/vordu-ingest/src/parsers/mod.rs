//! Input parsers for the ingestion pipeline
//!
//! - Catalog files (multi-document YAML) via serde_yaml
//! - Test reports (cucumber JSON) via serde_json
//! - Feature files (Gherkin) via a line state machine

use crate::error::ParseError;
use std::path::Path;

mod catalog;
mod feature;
mod report;

pub use catalog::{Catalog, CatalogParser};
pub use feature::{deduce_component, scan_features, FeatureParser};
pub use report::{summarize_steps, ReportParser};

/// Parser trait for converting file content into ingestion input
pub trait SourceParser {
    /// What a parsed file yields
    type Output;

    /// Parse content string
    fn parse(&self, content: &str) -> Result<Self::Output, ParseError>;

    /// Supported file extensions (without dot)
    fn extensions(&self) -> &[&str];

    /// Check if this parser can handle the given path
    fn can_parse(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions().contains(&ext))
            .unwrap_or(false)
    }

    /// Read and parse a file
    ///
    /// # Errors
    /// - `ParseError::Io` if the file cannot be read
    /// - `ParseError::SyntaxError` carrying the file path
    fn parse_file(&self, path: &Path) -> Result<Self::Output, ParseError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ParseError::io_error(path, e))?;
        self.parse(&content).map_err(|e| e.at(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_parse_by_extension() {
        assert!(CatalogParser.can_parse(Path::new("catalog-info.yaml")));
        assert!(CatalogParser.can_parse(Path::new("/repo/catalog-info.yml")));
        assert!(ReportParser.can_parse(Path::new("reports/cucumber.json")));
        assert!(FeatureParser::new(None).can_parse(Path::new("features/api/login.feature")));
        assert!(!ReportParser.can_parse(Path::new("cucumber")));
    }

    #[test]
    fn parse_file_reports_missing_file() {
        let err = ReportParser
            .parse_file(Path::new("/definitely/not/here.json"))
            .unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}

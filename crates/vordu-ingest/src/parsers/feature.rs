//! Feature file scanning (planned work)
//!
//! Every scenario declared in a `.feature` file becomes a pending record with
//! zero passed steps. When a scenario carries no explicit row tag, the owning
//! component is deduced from the file's location:
//!
//! ```text
//! .../features/<dir>/.../x.feature   → <system>-<dir>
//! .../features/x.feature             → <system>-x
//! anything else                      → no convention
//! ```

use crate::error::ParseError;
use crate::parsers::SourceParser;
use std::path::{Component as PathComponent, Path, PathBuf};
use vordu_core::{ScenarioRecord, ScenarioStatus, StepDetail, TagSet};
use walkdir::WalkDir;

const STEP_KEYWORDS: [&str; 5] = ["Given", "When", "Then", "And", "But"];
const SCENARIO_KEYWORDS: [&str; 2] = ["Scenario Outline:", "Scenario:"];

/// Deduce the convention-based component for a feature file
#[must_use]
pub fn deduce_component(path: &Path, system: &str) -> Option<String> {
    let segments: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            PathComponent::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    let at = segments.iter().position(|s| *s == "features")?;
    let rest = &segments[at + 1..];
    match rest {
        [] => None,
        [file] => Path::new(file)
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|stem| format!("{system}-{stem}")),
        [dir, ..] => Some(format!("{system}-{dir}")),
    }
}

/// `path` as seen from the scan root, keeping the root's own name
///
/// Directories above the root never take part in component deduction.
fn scoped_path(root: &Path, path: &Path) -> PathBuf {
    let relative = path.strip_prefix(root).unwrap_or(path);
    match root.file_name() {
        Some(name) => Path::new(name).join(relative),
        None => relative.to_path_buf(),
    }
}

enum ScanState {
    OutsideScenario,
    InScenario(ScenarioRecord),
}

/// Line-oriented Gherkin parser producing planned scenarios
#[derive(Debug, Clone, Default)]
pub struct FeatureParser {
    deduced: Option<String>,
}

impl FeatureParser {
    /// Create parser with an optional convention-derived component
    #[inline]
    #[must_use]
    pub fn new(deduced: Option<String>) -> Self {
        Self { deduced }
    }

    /// Create parser for a file, deducing its component by path convention
    #[must_use]
    pub fn for_path(path: &Path, system: &str) -> Self {
        Self::new(deduce_component(path, system))
    }

    fn open_scenario(
        &self,
        feature: &str,
        name: &str,
        feature_tags: &[String],
        pending: &[String],
    ) -> ScenarioRecord {
        let synthesized;
        let mut tags: Vec<&str> = Vec::with_capacity(feature_tags.len() + pending.len() + 1);
        for tag in feature_tags.iter().chain(pending) {
            if !tags.contains(&tag.as_str()) {
                tags.push(tag);
            }
        }

        if !TagSet::has_row_tag(tags.iter().copied()) {
            if let Some(component) = &self.deduced {
                synthesized = format!("@component:{component}");
                tags.push(&synthesized);
            }
        }

        let mut record = ScenarioRecord::new(feature, name);
        record.tags = tags.join(" ");
        record.status = ScenarioStatus::Pending;
        record
    }
}

fn step_keyword(line: &str) -> Option<(&str, &str)> {
    STEP_KEYWORDS.iter().find_map(|kw| {
        let rest = line.strip_prefix(kw)?;
        (rest.is_empty() || rest.starts_with(char::is_whitespace)).then(|| (*kw, rest.trim()))
    })
}

impl SourceParser for FeatureParser {
    type Output = Vec<ScenarioRecord>;

    fn parse(&self, content: &str) -> Result<Vec<ScenarioRecord>, ParseError> {
        let mut records = Vec::new();
        let mut state = ScanState::OutsideScenario;
        let mut feature = String::new();
        let mut feature_tags: Vec<String> = Vec::new();
        let mut pending_tags: Vec<String> = Vec::new();

        for line in content.lines().map(str::trim) {
            if line.starts_with('@') {
                pending_tags.extend(line.split_whitespace().map(str::to_string));
            } else if let Some(name) = line.strip_prefix("Feature:") {
                feature = name.trim().to_string();
                feature_tags = std::mem::take(&mut pending_tags);
            } else if let Some(name) = SCENARIO_KEYWORDS
                .iter()
                .find_map(|kw| line.strip_prefix(kw))
            {
                if let ScanState::InScenario(done) =
                    std::mem::replace(&mut state, ScanState::OutsideScenario)
                {
                    records.push(done);
                }
                let record =
                    self.open_scenario(&feature, name.trim(), &feature_tags, &pending_tags);
                pending_tags.clear();
                state = ScanState::InScenario(record);
            } else if let ScanState::InScenario(record) = &mut state {
                if let Some((keyword, text)) = step_keyword(line) {
                    record.steps.push(StepDetail {
                        keyword: keyword.to_string(),
                        name: text.to_string(),
                        status: "pending".to_string(),
                    });
                    record.total_steps += 1;
                }
            }
        }

        if let ScanState::InScenario(done) = state {
            records.push(done);
        }
        Ok(records)
    }

    fn extensions(&self) -> &[&str] {
        &["feature"]
    }
}

/// Walk a directory tree and collect planned scenarios from every feature file
///
/// Files are visited in file-name order so repeated scans are stable.
///
/// # Errors
/// - `ParseError::Walk` if the tree cannot be traversed
/// - `ParseError::Io` if a feature file cannot be read
pub fn scan_features(root: &Path, system: &str) -> Result<Vec<ScenarioRecord>, ParseError> {
    let probe = FeatureParser::default();
    let mut records = Vec::new();
    let mut files = 0usize;

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| ParseError::Walk {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() || !probe.can_parse(entry.path()) {
            continue;
        }

        let parser = FeatureParser::for_path(&scoped_path(root, entry.path()), system);
        let scenarios = parser.parse_file(entry.path())?;
        tracing::debug!(
            path = %entry.path().display(),
            component = ?parser.deduced,
            scenarios = scenarios.len(),
            "Scanned feature file"
        );
        records.extend(scenarios);
        files += 1;
    }

    tracing::info!(
        "Scanned {} feature files under {}: {} planned scenarios",
        files,
        root.display(),
        records.len()
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduce_from_subdirectory() {
        assert_eq!(
            deduce_component(Path::new("repo/features/api/auth/login.feature"), "vordu"),
            Some("vordu-api".to_string())
        );
    }

    #[test]
    fn deduce_from_direct_child() {
        assert_eq!(
            deduce_component(Path::new("repo/features/dashboard.feature"), "vordu"),
            Some("vordu-dashboard".to_string())
        );
    }

    #[test]
    fn ancestors_above_scan_root_are_ignored() {
        let root = Path::new("/builds/features/repo/tests");
        let file = root.join("features/api/login.feature");
        let scoped = scoped_path(root, &file);
        assert_eq!(scoped, Path::new("tests/features/api/login.feature"));
        assert_eq!(deduce_component(&scoped, "vordu"), Some("vordu-api".to_string()));

        let root = Path::new("/builds/features/repo/tests/features");
        let scoped = scoped_path(root, &root.join("dashboard.feature"));
        assert_eq!(deduce_component(&scoped, "vordu"), Some("vordu-dashboard".to_string()));

        let root = Path::new("/builds/features/repo/specs");
        let scoped = scoped_path(root, &root.join("login.feature"));
        assert_eq!(deduce_component(&scoped, "vordu"), None);
    }

    #[test]
    fn scan_ignores_features_directory_above_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("features/repo/tests");
        std::fs::create_dir_all(root.join("features/api")).unwrap();
        std::fs::write(
            root.join("features/api/login.feature"),
            "Feature: Login\n  @phase:1\n  Scenario: S\n    Given x\n",
        )
        .unwrap();

        let records = scan_features(&root, "vordu").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tags, "@phase:1 @component:vordu-api");
    }

    #[test]
    fn deduce_without_features_segment() {
        assert_eq!(deduce_component(Path::new("repo/specs/login.feature"), "vordu"), None);
        assert_eq!(deduce_component(Path::new("repo/features"), "vordu"), None);
    }

    #[test]
    fn scenarios_inherit_feature_tags_and_get_deduced_component() {
        let parser = FeatureParser::new(Some("vordu-api".to_string()));
        let records = parser
            .parse(
                "@phase:1\nFeature: Login\n\n  @smoke\n  Scenario: Good password\n    Given a user\n    When they log in\n    Then they see the dashboard\n",
            )
            .unwrap();

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.feature, "Login");
        assert_eq!(r.scenario, "Good password");
        assert_eq!(r.tags, "@phase:1 @smoke @component:vordu-api");
        assert_eq!(r.status, ScenarioStatus::Pending);
        assert_eq!(r.total_steps, 3);
        assert_eq!(r.passed_steps, 0);
        assert!(r.steps.iter().all(|s| s.status == "pending"));
    }

    #[test]
    fn explicit_row_tag_suppresses_convention() {
        let parser = FeatureParser::new(Some("vordu-api".to_string()));
        let records = parser
            .parse("Feature: F\n  @vordu:row=identity @phase:0\n  Scenario: S\n    Given x\n")
            .unwrap();
        assert_eq!(records[0].tags, "@vordu:row=identity @phase:0");
    }

    #[test]
    fn scenario_tags_reset_between_scenarios() {
        let parser = FeatureParser::new(None);
        let records = parser
            .parse(
                "@feat\nFeature: F\n@a\nScenario: One\n  Given x\n@b\nScenario Outline: Two\n  Given y\n  And z\n  Examples:\n    | v |\n    | 1 |\n",
            )
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tags, "@feat @a");
        assert_eq!(records[0].total_steps, 1);
        assert_eq!(records[1].scenario, "Two");
        assert_eq!(records[1].tags, "@feat @b");
        assert_eq!(records[1].total_steps, 2);
    }

    #[test]
    fn steps_outside_scenarios_are_ignored() {
        let parser = FeatureParser::new(None);
        let records = parser
            .parse("Feature: F\n  Background:\n    Given setup\n  Scenario: S\n    Then done\n    Andrew is not a step\n")
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_steps, 1);
    }
}

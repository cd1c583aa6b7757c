//! Tag parsing and scenario resolution
//!
//! A scenario is placed in the matrix by its tags:
//! - `component:<name>` / `vordu:row=<name>` select the row
//! - `phase:<int>` / `vordu:phase=<int>` select the phase
//! - `wip` (or any tag ending in `wip`) hides the scenario's results
//!
//! Tokens may carry a leading `@`. Matching is case-sensitive and a later
//! token of the same kind overrides an earlier one.

use crate::error::{CoreError, CoreResult};
use crate::types::{ScenarioRecord, ScenarioStatus};

const ROW_PREFIXES: [&str; 2] = ["component:", "vordu:row="];
const PHASE_PREFIXES: [&str; 2] = ["phase:", "vordu:phase="];

/// Row/phase identity extracted from a tag string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    /// Row override
    pub row: Option<String>,
    /// Phase identity
    pub phase: Option<u32>,
    /// Work-in-progress marker
    pub wip: bool,
}

impl TagSet {
    /// Parse a whitespace-joined tag string
    #[must_use]
    pub fn parse(tag_string: &str) -> Self {
        let mut set = TagSet::default();
        for raw in tag_string.split_whitespace() {
            if raw.ends_with("wip") {
                set.wip = true;
            }
            let token = raw.strip_prefix('@').unwrap_or(raw);
            if let Some(row) = strip_any(token, &ROW_PREFIXES) {
                if !row.is_empty() {
                    set.row = Some(row.to_string());
                }
            } else if let Some(phase) = strip_any(token, &PHASE_PREFIXES) {
                // non-integer phases drop the token
                if let Ok(phase) = phase.parse::<u32>() {
                    set.phase = Some(phase);
                }
            }
        }
        set
    }

    /// Check whether a tag string names a row explicitly
    #[must_use]
    pub fn has_row_tag<'a>(tags: impl IntoIterator<Item = &'a str>) -> bool {
        tags.into_iter().any(|raw| {
            let token = raw.strip_prefix('@').unwrap_or(raw);
            ROW_PREFIXES.iter().any(|p| token.starts_with(p))
        })
    }
}

fn strip_any<'a>(token: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|p| token.strip_prefix(p))
}

/// A scenario placed at a row and phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScenario {
    /// Row key taken from tags (a component name before rollup)
    pub row: String,
    /// Phase taken from tags
    pub phase: u32,
    /// The record, with `wip` results already zeroed
    pub record: ScenarioRecord,
}

/// Resolve a scenario's row and phase from its tags
///
/// Work-in-progress scenarios come back as pending with 0/0 steps.
///
/// # Errors
/// `CoreError::InvalidPayload` when the row or the phase is missing.
pub fn resolve(mut record: ScenarioRecord) -> CoreResult<ResolvedScenario> {
    let tags = TagSet::parse(&record.tags);
    let (Some(row), Some(phase)) = (tags.row, tags.phase) else {
        return Err(CoreError::invalid_payload(format!(
            "scenario '{}' in feature '{}' has no resolvable row and phase (tags: '{}')",
            record.scenario, record.feature, record.tags
        )));
    };
    if tags.wip {
        record.status = ScenarioStatus::Pending;
        record.passed_steps = 0;
        record.total_steps = 0;
    }
    Ok(ResolvedScenario { row, phase, record })
}

/// Resolve every record, dropping the ones without row and phase
#[must_use]
pub fn resolve_all(records: impl IntoIterator<Item = ScenarioRecord>) -> Vec<ResolvedScenario> {
    records
        .into_iter()
        .filter_map(|record| match resolve(record) {
            Ok(resolved) => Some(resolved),
            Err(e) => {
                tracing::debug!("Dropping scenario: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tags: &str) -> ScenarioRecord {
        let mut r = ScenarioRecord::new("F", "S");
        r.tags = tags.to_string();
        r.status = ScenarioStatus::Passed;
        r.total_steps = 4;
        r.passed_steps = 4;
        r
    }

    #[test]
    fn parses_component_and_phase() {
        let tags = TagSet::parse("@component:api @phase:2");
        assert_eq!(tags.row.as_deref(), Some("api"));
        assert_eq!(tags.phase, Some(2));
        assert!(!tags.wip);
    }

    #[test]
    fn parses_vordu_namespace_without_at() {
        let tags = TagSet::parse("vordu:row=identity vordu:phase=0");
        assert_eq!(tags.row.as_deref(), Some("identity"));
        assert_eq!(tags.phase, Some(0));
    }

    #[test]
    fn later_tokens_override_earlier() {
        let tags = TagSet::parse("@component:a @phase:1 @vordu:row=b @phase:3");
        assert_eq!(tags.row.as_deref(), Some("b"));
        assert_eq!(tags.phase, Some(3));
    }

    #[test]
    fn non_integer_phase_is_ignored() {
        let tags = TagSet::parse("@component:a @phase:one");
        assert_eq!(tags.phase, None);

        let tags = TagSet::parse("@phase:2 @phase:later");
        assert_eq!(tags.phase, Some(2));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let tags = TagSet::parse("@Component:a @PHASE:1");
        assert_eq!(tags, TagSet::default());
    }

    #[test]
    fn wip_variants() {
        assert!(TagSet::parse("wip").wip);
        assert!(TagSet::parse("@wip").wip);
        assert!(TagSet::parse("@feature-wip").wip);
        assert!(!TagSet::parse("@wipe").wip);
    }

    #[test]
    fn has_row_tag_detects_either_form() {
        assert!(TagSet::has_row_tag(["@smoke", "@component:x"]));
        assert!(TagSet::has_row_tag(["vordu:row=x"]));
        assert!(!TagSet::has_row_tag(["@phase:1", "@smoke"]));
    }

    #[test]
    fn resolve_requires_row_and_phase() {
        assert!(resolve(record("@component:x")).is_err());
        assert!(resolve(record("@phase:1")).is_err());
        assert!(resolve(record("")).unwrap_err().is_invalid_payload());
    }

    #[test]
    fn resolve_zeroes_wip() {
        let resolved = resolve(record("@wip @component:x @phase:2")).unwrap();
        assert_eq!(resolved.row, "x");
        assert_eq!(resolved.phase, 2);
        assert_eq!(resolved.record.status, ScenarioStatus::Pending);
        assert_eq!(resolved.record.total_steps, 0);
        assert_eq!(resolved.record.passed_steps, 0);
    }

    #[test]
    fn resolve_all_drops_unplaced() {
        let resolved = resolve_all(vec![
            record("@component:x @phase:0"),
            record("@smoke"),
            record("@component:y @phase:1"),
        ]);
        let rows: Vec<_> = resolved.iter().map(|r| r.row.as_str()).collect();
        assert_eq!(rows, vec!["x", "y"]);
    }
}

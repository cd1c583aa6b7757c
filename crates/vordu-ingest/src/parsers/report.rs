//! Cucumber JSON report parser
//!
//! Each scenario element becomes a [`ScenarioRecord`]. Status derivation, in
//! priority order:
//! 1. no steps → pending
//! 2. any `failed` step → failed
//! 3. any `undefined` or `skipped` step → pending
//! 4. all steps `passed` → passed
//! 5. otherwise → pending
//!
//! Pending scenarios report 0/0 steps so incomplete runs stay out of the
//! completion denominators.

use crate::error::ParseError;
use crate::parsers::SourceParser;
use serde::Deserialize;
use vordu_core::{ScenarioRecord, ScenarioStatus, StepDetail};

#[derive(Debug, Deserialize)]
struct ReportFeature {
    #[serde(default)]
    name: String,
    #[serde(default)]
    tags: Vec<ReportTag>,
    #[serde(default)]
    elements: Vec<ReportElement>,
}

/// Tags show up as bare strings or as `{"name": ...}` objects
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReportTag {
    Bare(String),
    Named { name: String },
}

impl ReportTag {
    fn name(&self) -> &str {
        match self {
            ReportTag::Bare(name) | ReportTag::Named { name } => name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReportElement {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    tags: Vec<ReportTag>,
    #[serde(default)]
    steps: Vec<ReportStep>,
}

#[derive(Debug, Deserialize)]
struct ReportStep {
    #[serde(default)]
    keyword: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    result: Option<StepResult>,
}

#[derive(Debug, Deserialize)]
struct StepResult {
    #[serde(default)]
    status: Option<String>,
}

/// Derive status and counted steps from step results
///
/// Returns `(status, passed_steps, total_steps)`.
#[must_use]
pub fn summarize_steps(steps: &[StepDetail]) -> (ScenarioStatus, u32, u32) {
    let total = u32::try_from(steps.len()).unwrap_or(u32::MAX);
    let passed = u32::try_from(steps.iter().filter(|s| s.status == "passed").count())
        .unwrap_or(u32::MAX);

    if steps.is_empty() {
        (ScenarioStatus::Pending, 0, 0)
    } else if steps.iter().any(|s| s.status == "failed") {
        (ScenarioStatus::Failed, passed, total)
    } else if steps
        .iter()
        .any(|s| s.status == "undefined" || s.status == "skipped")
    {
        (ScenarioStatus::Pending, 0, 0)
    } else if passed == total {
        (ScenarioStatus::Passed, passed, total)
    } else {
        (ScenarioStatus::Pending, 0, 0)
    }
}

/// Feature tags first, then scenario tags, without duplicates
fn join_tags(feature: &[ReportTag], scenario: &[ReportTag]) -> String {
    let mut seen: Vec<&str> = Vec::with_capacity(feature.len() + scenario.len());
    for tag in feature.iter().chain(scenario) {
        let name = tag.name().trim();
        if !name.is_empty() && !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen.join(" ")
}

/// Parser for cucumber JSON reports
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportParser;

impl SourceParser for ReportParser {
    type Output = Vec<ScenarioRecord>;

    fn parse(&self, content: &str) -> Result<Vec<ScenarioRecord>, ParseError> {
        let features: Vec<ReportFeature> = serde_json::from_str(content).map_err(|e| {
            ParseError::syntax_error("cucumber.json", format!("JSON parse error: {e}"))
        })?;

        let mut records = Vec::new();
        for feature in &features {
            for element in &feature.elements {
                if element.kind.as_deref().is_some_and(|k| k != "scenario") {
                    continue;
                }

                let steps: Vec<StepDetail> = element
                    .steps
                    .iter()
                    .map(|s| StepDetail {
                        keyword: s.keyword.trim().to_string(),
                        name: s.name.clone(),
                        status: s
                            .result
                            .as_ref()
                            .and_then(|r| r.status.clone())
                            .unwrap_or_else(|| "undefined".to_string()),
                    })
                    .collect();
                let (status, passed_steps, total_steps) = summarize_steps(&steps);

                records.push(ScenarioRecord {
                    feature: feature.name.clone(),
                    scenario: element.name.clone(),
                    tags: join_tags(&feature.tags, &element.tags),
                    status,
                    total_steps,
                    passed_steps,
                    steps,
                });
            }
        }

        tracing::debug!(
            features = features.len(),
            scenarios = records.len(),
            "Parsed test report"
        );
        Ok(records)
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }
}

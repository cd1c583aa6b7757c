//! Testing utilities for the Vörðu workspace
//!
//! Shared fixtures: catalog/report/feature samples and record builders.

#![allow(missing_docs)]

use serde_json::json;
use vordu_core::{
    derive_status, CellStatus, Component, Granularity, MatrixCell, PhaseTally, ScenarioRecord,
    ScenarioStatus, SystemDescriptor,
};

/// Multi-document catalog with one system, a parent and a child component
pub const SAMPLE_CATALOG_YAML: &str = r#"
apiVersion: backstage.io/v1alpha1
kind: System
metadata:
  name: mimir
  description: Data platform
  annotations:
    vordu.io/row-label: Mimir
spec:
  owner: platform
  domain: data
---
apiVersion: backstage.io/v1alpha1
kind: Component
metadata:
  name: mimir-db
  annotations:
    vordu.io/row-label: Databases
spec:
  type: service
  system: mimir
---
apiVersion: backstage.io/v1alpha1
kind: Component
metadata:
  name: mimir-db-driver
  annotations:
    vordu.io/parent-component: mimir-db
spec:
  type: library
  partOf: mimir
---
apiVersion: backstage.io/v1alpha1
kind: Location
spec:
  targets: []
"#;

/// Feature file for the `mimir-db` component
pub const SAMPLE_FEATURE: &str = "\
@phase:1
Feature: Database provisioning

  @smoke
  Scenario: Create a database
    Given a running operator
    When I request a database
    Then the database is reachable

  @wip
  Scenario: Rotate credentials
    Given a provisioned database
    When credentials expire
";

pub fn descriptor(name: &str, granularity: Granularity) -> SystemDescriptor {
    SystemDescriptor::new(name).with_granularity(granularity)
}

pub fn component(name: &str) -> Component {
    Component::new(name)
}

pub fn child_component(name: &str, parent: &str) -> Component {
    Component::new(name).with_parent(parent)
}

pub fn scenario(
    scenario: &str,
    tags: &str,
    status: ScenarioStatus,
    passed_steps: u32,
    total_steps: u32,
) -> ScenarioRecord {
    let mut record = ScenarioRecord::new("Feature", scenario);
    record.tags = tags.to_string();
    record.status = status;
    record.passed_steps = passed_steps;
    record.total_steps = total_steps;
    record
}

pub fn passed(scenario_name: &str, tags: &str, steps: u32) -> ScenarioRecord {
    scenario(scenario_name, tags, ScenarioStatus::Passed, steps, steps)
}

/// Cell with consistent status/completion for the given counters
pub fn cell(
    project: &str,
    row: &str,
    phase: u8,
    scenarios: (u32, u32),
    steps: (u32, u32),
) -> MatrixCell {
    let tally = PhaseTally {
        scenarios_passed: scenarios.0,
        scenarios_total: scenarios.1,
        steps_passed: steps.0,
        steps_total: steps.1,
    };
    MatrixCell {
        project_name: project.to_string(),
        row_id: row.to_string(),
        phase_id: phase,
        status: derive_status(&tally),
        completion: tally.completion(),
        scenarios_total: tally.scenarios_total,
        scenarios_passed: tally.scenarios_passed,
        steps_total: tally.steps_total,
        steps_passed: tally.steps_passed,
        details: Vec::new(),
    }
}

pub fn pass_cell(project: &str, row: &str, phase: u8) -> MatrixCell {
    let c = cell(project, row, phase, (1, 1), (5, 5));
    debug_assert_eq!(c.status, CellStatus::Pass);
    c
}

/// Cucumber JSON report covering every status rule
pub fn sample_report_json() -> String {
    let step = |status: &str| json!({"keyword": "Given ", "name": "a step", "result": {"status": status}});
    json!([
        {
            "name": "Database provisioning",
            "uri": "features/db/provisioning.feature",
            "tags": [{"name": "@phase:1"}],
            "elements": [
                {
                    "type": "background",
                    "name": "",
                    "steps": [step("passed")]
                },
                {
                    "type": "scenario",
                    "name": "Create a database",
                    "tags": [{"name": "@smoke"}],
                    "steps": [step("passed"), step("passed"), step("passed")]
                },
                {
                    "type": "scenario",
                    "name": "Drop a database",
                    "tags": ["@component:mimir-db"],
                    "steps": [step("passed"), step("failed"), step("skipped")]
                },
                {
                    "type": "scenario",
                    "name": "Resize a database",
                    "tags": [],
                    "steps": [step("passed"), step("undefined")]
                },
                {
                    "type": "scenario",
                    "name": "Empty scenario",
                    "steps": []
                }
            ]
        }
    ])
    .to_string()
}

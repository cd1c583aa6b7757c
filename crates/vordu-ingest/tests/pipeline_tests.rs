//! End-to-end ingestion over files on disk

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use vordu_core::{CellStatus, Granularity, ScenarioStatus};
use vordu_ingest::{IngestError, ParseError, RunInputs};
use vordu_test_utils::{sample_report_json, SAMPLE_CATALOG_YAML, SAMPLE_FEATURE};

fn write(root: &Path, rel: &str, content: &str) -> std::path::PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn repo() -> (TempDir, RunInputs) {
    let dir = TempDir::new().unwrap();
    let catalog = write(dir.path(), "catalog-info.yaml", SAMPLE_CATALOG_YAML);
    write(dir.path(), "features/db/provisioning.feature", SAMPLE_FEATURE);
    let report = write(dir.path(), "reports/cucumber.json", &sample_report_json());

    let inputs = RunInputs {
        catalog,
        reports: vec![report],
        features: Some(dir.path().join("features")),
    };
    (dir, inputs)
}

#[test]
fn full_run_produces_config_and_one_cell() {
    let (_dir, inputs) = repo();
    let output = inputs.execute().unwrap();

    let config = output.config.expect("catalog has a System entity");
    assert_eq!(config.system.name, "mimir");
    assert_eq!(config.system.label.as_deref(), Some("Mimir"));
    assert_eq!(config.system.domain.as_deref(), Some("data"));
    assert_eq!(config.system.granularity, Some(Granularity::Component));
    assert_eq!(config.components.len(), 2);
    assert_eq!(config.components[1].parent.as_deref(), Some("mimir-db"));

    // Planned "Create a database" merged with its passing result, planned
    // wip scenario at 0/0, report-only "Drop a database" failed at 1/3.
    // Untagged report scenarios resolve to no row and are left out.
    assert_eq!(output.cells.len(), 1);
    let cell = &output.cells[0];
    assert_eq!(cell.project_name, "mimir");
    assert_eq!(cell.row_id, "mimir-db");
    assert_eq!(cell.phase_id, 1);
    assert_eq!((cell.scenarios_passed, cell.scenarios_total), (1, 3));
    assert_eq!((cell.steps_passed, cell.steps_total), (4, 6));
    assert_eq!(cell.completion, 66);
    assert_eq!(cell.status, CellStatus::Pending);

    let names: Vec<&str> = cell.details.iter().map(|d| d.scenario.as_str()).collect();
    assert_eq!(names, vec!["Create a database", "Rotate credentials", "Drop a database"]);
    assert_eq!(
        cell.details[0].tags,
        "@phase:1 @smoke @component:mimir-db"
    );
    assert_eq!(cell.details[1].status, ScenarioStatus::Pending);
    assert_eq!(cell.details[1].total_steps, 0);
}

#[test]
fn features_only_run_reads_as_planned() {
    let (_dir, mut inputs) = repo();
    inputs.reports.clear();
    let output = inputs.execute().unwrap();

    let cell = &output.cells[0];
    assert_eq!(cell.row_id, "mimir-db");
    assert_eq!((cell.steps_passed, cell.steps_total), (0, 3));
    assert_eq!(cell.completion, 0);
    assert_eq!(cell.status, CellStatus::Pending);
}

#[test]
fn catalog_without_system_uses_component_system() {
    let dir = TempDir::new().unwrap();
    let catalog = write(
        dir.path(),
        "catalog-info.yaml",
        "kind: Component\nmetadata:\n  name: mimir-db\nspec:\n  system: mimir\n",
    );
    write(dir.path(), "features/db.feature", SAMPLE_FEATURE);

    let output = RunInputs {
        catalog,
        reports: Vec::new(),
        features: Some(dir.path().join("features")),
    }
    .execute()
    .unwrap();

    assert!(output.config.is_none());
    assert_eq!(output.cells.len(), 1);
    assert_eq!(output.cells[0].project_name, "mimir");
    assert_eq!(output.cells[0].row_id, "mimir-db");
}

#[test]
fn malformed_report_aborts_run() {
    let (dir, mut inputs) = repo();
    let broken = write(dir.path(), "reports/broken.json", "{\"elements\": ");
    inputs.reports.push(broken.clone());

    let err = inputs.execute().unwrap_err();
    match err {
        IngestError::Parse(ParseError::SyntaxError { path, .. }) => assert_eq!(path, broken),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_catalog_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = RunInputs {
        catalog: dir.path().join("nope.yaml"),
        ..RunInputs::default()
    }
    .execute()
    .unwrap_err();
    assert!(matches!(err, IngestError::Parse(ParseError::Io { .. })));
}

#[test]
fn scan_is_stable_across_runs() {
    let (_dir, inputs) = repo();
    let first = inputs.execute().unwrap();
    let second = inputs.execute().unwrap();
    assert_eq!(first, second);
}

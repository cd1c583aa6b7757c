//! Rollup tests
//!
//! Exercise the full core path: merge → resolve → aggregate, under each
//! granularity policy.

use pretty_assertions::assert_eq;
use vordu_core::prelude::*;
use vordu_core::{merge_scenarios, resolve_all};
use vordu_test_utils::{child_component, component, descriptor, passed, scenario};

fn aggregate(system: &SystemDescriptor, components: &[Component], records: Vec<ScenarioRecord>) -> Vec<MatrixCell> {
    let resolved = resolve_all(records);
    Aggregator::new(system, components).aggregate(&resolved)
}

/// Children roll into the parent row and sum with the parent's own scenarios.
#[test]
fn component_granularity_rolls_child_into_parent() {
    let system = descriptor("mimir", Granularity::Component);
    let components = [child_component("db-driver", "db"), component("db")];

    let cells = aggregate(
        &system,
        &components,
        vec![
            passed("driver connects", "@component:db-driver @phase:1", 4),
            scenario("db boots", "@component:db @phase:1", ScenarioStatus::Failed, 1, 2),
        ],
    );

    assert_eq!(cells.len(), 1);
    let cell = &cells[0];
    assert_eq!(cell.row_id, "db");
    assert_eq!(cell.phase_id, 1);
    assert_eq!(cell.scenarios_total, 2);
    assert_eq!(cell.scenarios_passed, 1);
    assert_eq!(cell.steps_total, 6);
    assert_eq!(cell.steps_passed, 5);
    assert_eq!(cell.completion, 83);
    assert_eq!(cell.status, CellStatus::Pending);
    assert_eq!(cell.details.len(), 2);
}

#[test]
fn subcomponent_granularity_keeps_rows_apart() {
    let system = descriptor("mimir", Granularity::Subcomponent);
    let components = [child_component("db-driver", "db"), component("db")];

    let cells = aggregate(
        &system,
        &components,
        vec![
            passed("driver connects", "@component:db-driver @phase:1", 4),
            passed("db boots", "@component:db @phase:1", 2),
        ],
    );

    let rows: Vec<_> = cells.iter().map(|c| c.row_id.as_str()).collect();
    assert_eq!(rows, vec!["db-driver", "db"]);
}

#[test]
fn system_granularity_collapses_everything() {
    let system = descriptor("mimir", Granularity::System);
    let components = [component("kafka"), component("valkey"), child_component("mysql", "percona")];

    let cells = aggregate(
        &system,
        &components,
        vec![
            passed("a", "@component:kafka @phase:0", 1),
            passed("b", "@component:kafka @phase:2", 1),
            passed("c", "@component:valkey @phase:0", 1),
            passed("d", "@component:mysql @phase:3", 1),
        ],
    );

    assert!(cells.iter().all(|c| c.row_id == "mimir" && c.project_name == "mimir"));
    let phases: Vec<_> = cells.iter().map(|c| c.phase_id).collect();
    assert_eq!(phases, vec![0, 2, 3]);
    assert_eq!(cells[0].scenarios_total, 2);
}

#[test]
fn domain_granularity_uses_domain_row() {
    let system = descriptor("mimir", Granularity::Domain).with_domain("data");
    let components = [component("kafka"), component("valkey")];

    let cells = aggregate(
        &system,
        &components,
        vec![passed("a", "@component:kafka @phase:0", 1), passed("b", "@component:valkey @phase:0", 3)],
    );

    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].row_id, "data");
    assert_eq!(cells[0].project_name, "mimir");
    assert_eq!(cells[0].steps_total, 4);
}

/// A wip scenario occupies the bucket with 0/0 and leaves the others' math alone.
#[test]
fn wip_scenario_does_not_dilute_completion() {
    let system = descriptor("demo", Granularity::Component);
    let components = [component("x")];

    let cells = aggregate(
        &system,
        &components,
        vec![
            passed("done", "@component:x @phase:2", 4),
            scenario("half", "@wip @component:x @phase:2", ScenarioStatus::Failed, 1, 6),
        ],
    );

    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].scenarios_total, 2);
    assert_eq!(cells[0].steps_total, 4);
    assert_eq!(cells[0].steps_passed, 4);
    assert_eq!(cells[0].completion, 100);
    assert_eq!(cells[0].status, CellStatus::Pass);
    assert_eq!(cells[0].details[1].status, ScenarioStatus::Pending);
}

#[test]
fn wip_only_bucket_reads_pending_at_zero() {
    let system = descriptor("demo", Granularity::Component);
    let components = [component("x")];

    let cells = aggregate(
        &system,
        &components,
        vec![scenario("soon", "@wip @component:x @phase:2", ScenarioStatus::Passed, 3, 3)],
    );

    assert_eq!(cells[0].completion, 0);
    assert_eq!(cells[0].steps_total, 0);
    assert_eq!(cells[0].scenarios_total, 1);
    assert_eq!(cells[0].status, CellStatus::Pending);
}

/// Planned tags survive the merge, so convention-assigned rows still aggregate.
#[test]
fn merged_planned_scenario_aggregates_under_planned_row() {
    let system = descriptor("demo", Granularity::Component);
    let components = [component("x")];

    let planned = scenario("S", "@component:x @phase:0", ScenarioStatus::Pending, 0, 5);
    let mut executed = passed("S", "@smoke", 5);
    executed.feature = planned.feature.clone();

    let merged = merge_scenarios(vec![planned], vec![executed]);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].status, ScenarioStatus::Passed);
    assert_eq!(merged[0].tags, "@component:x @phase:0");

    let cells = Aggregator::new(&system, &components).aggregate(&resolve_all(merged));
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].status, CellStatus::Pass);
    assert_eq!((cells[0].steps_passed, cells[0].steps_total), (5, 5));
}

#[test]
fn untagged_scenarios_contribute_nothing() {
    let system = descriptor("demo", Granularity::Component);
    let components = [component("x")];

    let cells = aggregate(&system, &components, vec![passed("loose", "@smoke", 3)]);
    assert!(cells.is_empty());
}

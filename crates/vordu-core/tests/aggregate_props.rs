//! Property tests for the completion and status rules.

use proptest::prelude::*;
use vordu_core::prelude::*;
use vordu_core::resolve_all;
use vordu_test_utils::{component, descriptor, scenario};

fn arb_status() -> impl Strategy<Value = ScenarioStatus> {
    prop_oneof![
        Just(ScenarioStatus::Passed),
        Just(ScenarioStatus::Failed),
        Just(ScenarioStatus::Pending),
    ]
}

fn arb_scenario() -> impl Strategy<Value = ScenarioRecord> {
    (0usize..3, 0u32..4, arb_status(), 0u32..10, 0u32..10, any::<bool>()).prop_map(
        |(comp, phase, status, a, b, wip)| {
            let (passed, total) = if a <= b { (a, b) } else { (b, a) };
            let wip = if wip { "@wip " } else { "" };
            let tags = format!("{wip}@component:c{comp} @phase:{phase}");
            scenario("s", &tags, status, passed, total)
        },
    )
}

fn arb_granularity() -> impl Strategy<Value = Granularity> {
    prop_oneof![
        Just(Granularity::Component),
        Just(Granularity::Subcomponent),
        Just(Granularity::Domain),
        Just(Granularity::System),
    ]
}

proptest! {
    #[test]
    fn cells_obey_completion_and_status_rules(
        records in prop::collection::vec(arb_scenario(), 0..40),
        granularity in arb_granularity(),
    ) {
        let system = descriptor("p", granularity).with_domain("d");
        let components = [component("c0"), component("c1").with_parent("c0"), component("c2")];
        let cells = Aggregator::new(&system, &components).aggregate(&resolve_all(records));

        let mut keys = std::collections::HashSet::new();
        for cell in &cells {
            prop_assert!(keys.insert((cell.row_id.clone(), cell.phase_id)));
            prop_assert!(cell.validate().is_ok());
            prop_assert!(cell.scenarios_total > 0);

            if cell.steps_total > 0 {
                let expected = (u64::from(cell.steps_passed) * 100 / u64::from(cell.steps_total)) as u8;
                prop_assert_eq!(cell.completion, expected);
            } else {
                prop_assert_eq!(cell.completion, 0);
            }
            if cell.steps_total == 0 && cell.scenarios_total == 0 {
                prop_assert_eq!(cell.status, CellStatus::Empty);
            }
            if cell.completion == 100 {
                prop_assert_eq!(cell.status, CellStatus::Pass);
            } else {
                prop_assert_eq!(cell.status, CellStatus::Pending);
            }
        }
    }

    #[test]
    fn rollup_preserves_scenario_count(records in prop::collection::vec(arb_scenario(), 0..40)) {
        let components = [component("c0"), component("c1").with_parent("c0"), component("c2")];
        let resolved = resolve_all(records);

        let flat = Aggregator::new(&descriptor("p", Granularity::Subcomponent), &components).aggregate(&resolved);
        let rolled = Aggregator::new(&descriptor("p", Granularity::System), &components).aggregate(&resolved);

        let sum = |cells: &[MatrixCell]| cells.iter().map(|c| c.scenarios_total).sum::<u32>();
        prop_assert_eq!(sum(&flat), sum(&rolled));
        prop_assert_eq!(sum(&flat) as usize, resolved.len());
    }
}

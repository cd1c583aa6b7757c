//! Planned/executed scenario reconciliation
//!
//! Planned scenarios come from static feature scanning and carry the
//! convention-derived tags; executed scenarios come from test reports and
//! carry the real outcome. Pairing is by `(feature, scenario)`.

use crate::types::ScenarioRecord;
use std::collections::{HashMap, VecDeque};

/// Merge planned scenarios with executed results
///
/// Output order: planned scenarios in scan order (merged where a result
/// exists), then unmatched executed results in report order. Duplicate keys
/// pair up in order.
#[must_use]
pub fn merge_scenarios(
    planned: Vec<ScenarioRecord>,
    executed: Vec<ScenarioRecord>,
) -> Vec<ScenarioRecord> {
    let assigned: Vec<Option<usize>> = {
        let mut index: HashMap<(&str, &str), VecDeque<usize>> = HashMap::new();
        for (i, record) in executed.iter().enumerate() {
            index.entry(record.key()).or_default().push_back(i);
        }
        planned
            .iter()
            .map(|plan| index.get_mut(&plan.key()).and_then(VecDeque::pop_front))
            .collect()
    };

    let mut executed: Vec<Option<ScenarioRecord>> = executed.into_iter().map(Some).collect();
    let mut merged = Vec::with_capacity(planned.len() + executed.len());
    let mut matched = 0usize;

    for (plan, slot) in planned.into_iter().zip(assigned) {
        match slot.and_then(|i| executed[i].take()) {
            Some(result) => {
                matched += 1;
                merged.push(ScenarioRecord {
                    tags: plan.tags,
                    ..result
                });
            }
            None => merged.push(plan),
        }
    }

    let leftovers = executed.into_iter().flatten();
    let before = merged.len();
    merged.extend(leftovers);

    tracing::debug!(
        matched,
        planned_only = before - matched,
        executed_only = merged.len() - before,
        "Merged planned and executed scenarios"
    );

    merged
}

//! Matrix aggregation
//!
//! Rolls resolved scenarios up into one cell per (row, phase):
//!
//! ```text
//! scenarios ──group by (component, phase)──▶ per-component tallies
//!                                               │
//!            granularity policy (target row) ◀──┘
//!                                               │
//!                  sum per (row, phase) ────────▶ MatrixCell
//! ```
//!
//! Scenarios are matched to components by the component's own name; the
//! granularity policy only decides which row that component's tally lands in.
//! Explicit failures are not retained once counters are summed, so a bucket
//! is either `pass`, `pending` or `empty`.

use crate::tags::ResolvedScenario;
use crate::types::{
    CellStatus, Component, Granularity, MatrixCell, ScenarioRecord, ScenarioStatus,
    SystemDescriptor, PHASES,
};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Summed scenario/step counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTally {
    /// Scenarios with status `passed`
    pub scenarios_passed: u32,
    /// All scenarios
    pub scenarios_total: u32,
    /// Passed steps
    pub steps_passed: u32,
    /// Counted steps
    pub steps_total: u32,
}

impl PhaseTally {
    /// Count one scenario
    pub fn record(&mut self, record: &ScenarioRecord) {
        self.scenarios_total = self.scenarios_total.saturating_add(1);
        if record.status == ScenarioStatus::Passed {
            self.scenarios_passed = self.scenarios_passed.saturating_add(1);
        }
        self.steps_passed = self.steps_passed.saturating_add(record.passed_steps);
        self.steps_total = self.steps_total.saturating_add(record.total_steps);
    }

    /// Add another tally
    pub fn absorb(&mut self, other: PhaseTally) {
        self.scenarios_passed = self.scenarios_passed.saturating_add(other.scenarios_passed);
        self.scenarios_total = self.scenarios_total.saturating_add(other.scenarios_total);
        self.steps_passed = self.steps_passed.saturating_add(other.steps_passed);
        self.steps_total = self.steps_total.saturating_add(other.steps_total);
    }

    /// Step completion, truncated
    #[inline]
    #[must_use]
    pub fn completion(&self) -> u8 {
        completion(self.steps_passed, self.steps_total)
    }

    /// Categorical status
    #[inline]
    #[must_use]
    pub fn status(&self) -> CellStatus {
        derive_status(self)
    }
}

/// `floor(100 * passed / total)`, 0 when there are no steps
#[must_use]
pub fn completion(steps_passed: u32, steps_total: u32) -> u8 {
    if steps_total == 0 {
        return 0;
    }
    let pct = u64::from(steps_passed) * 100 / u64::from(steps_total);
    u8::try_from(pct.min(100)).unwrap_or(100)
}

/// Status from summed counters
#[must_use]
pub fn derive_status(tally: &PhaseTally) -> CellStatus {
    if tally.steps_total == 0 && tally.scenarios_total == 0 {
        CellStatus::Empty
    } else if tally.completion() == 100 {
        CellStatus::Pass
    } else {
        CellStatus::Pending
    }
}

#[derive(Debug, Default)]
struct Bucket {
    tally: PhaseTally,
    details: Vec<ScenarioRecord>,
}

/// Aggregates scenarios for one system under its granularity policy
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
    descriptor: &'a SystemDescriptor,
    components: &'a [Component],
}

impl<'a> Aggregator<'a> {
    /// Create aggregator over a system and its components
    #[inline]
    #[must_use]
    pub fn new(descriptor: &'a SystemDescriptor, components: &'a [Component]) -> Self {
        Self {
            descriptor,
            components,
        }
    }

    /// Row a component's results land in
    #[must_use]
    pub fn target_row(&self, component: &'a Component) -> &'a str {
        let descriptor: &'a SystemDescriptor = self.descriptor;
        match descriptor.granularity {
            Granularity::Domain => descriptor.domain.as_deref().unwrap_or(&descriptor.name),
            Granularity::System => &descriptor.name,
            Granularity::Component => component.parent.as_deref().unwrap_or(&component.name),
            Granularity::Subcomponent => &component.name,
        }
    }

    /// Produce one cell per (row, phase) that received at least one scenario
    ///
    /// Cells come out in component order, phases ascending within a row's
    /// first appearance.
    #[must_use]
    pub fn aggregate(&self, scenarios: &[ResolvedScenario]) -> Vec<MatrixCell> {
        let mut by_component: HashMap<(&str, u32), Vec<&ScenarioRecord>> = HashMap::new();
        for s in scenarios {
            by_component
                .entry((s.row.as_str(), s.phase))
                .or_default()
                .push(&s.record);
        }

        let mut buckets: IndexMap<(&str, u8), Bucket> = IndexMap::new();
        for component in self.components {
            let row = self.target_row(component);
            for phase in PHASES {
                let Some(records) = by_component.get(&(component.name.as_str(), u32::from(phase)))
                else {
                    continue;
                };

                let mut tally = PhaseTally::default();
                for record in records {
                    tally.record(record);
                }

                let bucket = buckets.entry((row, phase)).or_default();
                bucket.tally.absorb(tally);
                bucket.details.extend(records.iter().map(|r| (*r).clone()));
            }
        }

        tracing::debug!(
            system = %self.descriptor.name,
            granularity = %self.descriptor.granularity,
            scenarios = scenarios.len(),
            cells = buckets.len(),
            "Aggregated matrix cells"
        );

        buckets
            .into_iter()
            .map(|((row, phase), bucket)| MatrixCell {
                project_name: self.descriptor.name.clone(),
                row_id: row.to_string(),
                phase_id: phase,
                status: bucket.tally.status(),
                completion: bucket.tally.completion(),
                scenarios_total: bucket.tally.scenarios_total,
                scenarios_passed: bucket.tally.scenarios_passed,
                steps_total: bucket.tally.steps_total,
                steps_passed: bucket.tally.steps_passed,
                details: bucket.details,
            })
            .collect()
    }
}

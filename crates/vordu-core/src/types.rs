//! Core types for Vörðu
//!
//! Defines the data model shared by the ingestion pipeline and the API:
//! - System descriptors and their components (catalog side)
//! - Scenario records (ephemeral, one per executed or planned scenario)
//! - Matrix cells (the persisted aggregate per project/row/phase)

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed lifecycle phases tracked for every row
pub const PHASES: [u8; 4] = [0, 1, 2, 3];

/// Highest valid phase id
pub const MAX_PHASE: u8 = 3;

/// Policy mapping components onto matrix rows
///
/// Unrecognized values behave like [`Granularity::Subcomponent`]: every
/// component keeps its own row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Granularity {
    /// Children roll up into their parent's row
    #[default]
    Component,
    /// Every component gets its own row
    Subcomponent,
    /// All components collapse into the domain's row
    Domain,
    /// All components collapse into the system's row
    System,
}

impl Granularity {
    /// Wire representation
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Component => "component",
            Granularity::Subcomponent => "subcomponent",
            Granularity::Domain => "domain",
            Granularity::System => "system",
        }
    }

    /// Lenient parse; anything unknown means no rollup
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "component" => Granularity::Component,
            "domain" => Granularity::Domain,
            "system" => Granularity::System,
            _ => Granularity::Subcomponent,
        }
    }
}

impl From<String> for Granularity {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Granularity> for String {
    fn from(value: Granularity) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A system (project) as described by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemDescriptor {
    /// Unique key; becomes the matrix project name
    pub name: String,
    /// Display label
    pub label: String,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Owning domain
    #[serde(default)]
    pub domain: Option<String>,
    /// Row mapping policy
    #[serde(default)]
    pub granularity: Granularity,
}

impl SystemDescriptor {
    /// Create descriptor labelled with its own name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            description: None,
            domain: None,
            granularity: Granularity::default(),
        }
    }

    /// With domain
    #[inline]
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// With granularity
    #[inline]
    #[must_use]
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }
}

/// A component of a system; one candidate matrix row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Unique within the owning system
    pub name: String,
    /// Display label
    pub label: String,
    /// Owning system name
    #[serde(default)]
    pub system: Option<String>,
    /// Parent component name, enables rollup
    #[serde(default)]
    pub parent: Option<String>,
}

impl Component {
    /// Create parentless component labelled with its own name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            system: None,
            parent: None,
        }
    }

    /// With parent component
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// With owning system
    #[inline]
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Outcome of one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    /// Every step passed
    Passed,
    /// At least one step failed
    Failed,
    /// Not run, incomplete, or work in progress
    Pending,
}

impl ScenarioStatus {
    /// Wire representation
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioStatus::Passed => "passed",
            ScenarioStatus::Failed => "failed",
            ScenarioStatus::Pending => "pending",
        }
    }
}

/// One step of a scenario as reported or planned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDetail {
    /// Gherkin keyword (`Given`, `When`, ...)
    pub keyword: String,
    /// Step text
    pub name: String,
    /// Raw result status (`passed`, `failed`, `skipped`, `undefined`, `pending`, ...)
    pub status: String,
}

/// A single scenario with its tags and step counts
///
/// Serializes in the shape used for cell details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    /// Feature name
    pub feature: String,
    /// Scenario name
    pub scenario: String,
    /// Whitespace-joined tag string
    #[serde(rename = "tag", default)]
    pub tags: String,
    /// Scenario outcome
    pub status: ScenarioStatus,
    /// Counted steps
    pub total_steps: u32,
    /// Steps whose result was `passed`; never above `total_steps`
    pub passed_steps: u32,
    /// Step detail in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepDetail>,
}

impl ScenarioRecord {
    /// Create a pending record with no steps
    #[must_use]
    pub fn new(feature: impl Into<String>, scenario: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            scenario: scenario.into(),
            tags: String::new(),
            status: ScenarioStatus::Pending,
            total_steps: 0,
            passed_steps: 0,
            steps: Vec::new(),
        }
    }

    /// Identity used to pair planned and executed scenarios
    #[inline]
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        (&self.feature, &self.scenario)
    }
}

/// Categorical status of a matrix cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellStatus {
    /// Fully complete
    Pass,
    /// Explicit failure (only ever set by callers, never by aggregation)
    Fail,
    /// Partially complete or not started
    Pending,
    /// Data exists but all totals are zero
    Empty,
}

impl CellStatus {
    /// Wire representation
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CellStatus::Pass => "pass",
            CellStatus::Fail => "fail",
            CellStatus::Pending => "pending",
            CellStatus::Empty => "empty",
        }
    }
}

impl FromStr for CellStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass" => Ok(CellStatus::Pass),
            "fail" => Ok(CellStatus::Fail),
            "pending" => Ok(CellStatus::Pending),
            "empty" => Ok(CellStatus::Empty),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for CellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persisted aggregate for one (project, row, phase) triple
///
/// Also the ingest item shape posted to and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixCell {
    /// Project (system descriptor name)
    pub project_name: String,
    /// Row id resolved by the granularity policy
    pub row_id: String,
    /// Phase 0..=3
    pub phase_id: u8,
    /// Categorical status
    pub status: CellStatus,
    /// Percentage 0..=100
    pub completion: u8,
    /// Contributing scenarios
    pub scenarios_total: u32,
    /// Contributing scenarios that passed
    pub scenarios_passed: u32,
    /// Counted steps
    pub steps_total: u32,
    /// Passed steps
    pub steps_passed: u32,
    /// Contributing scenarios, for drill-down
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ScenarioRecord>,
}

impl MatrixCell {
    /// Uniqueness key
    #[inline]
    #[must_use]
    pub fn key(&self) -> (&str, &str, u8) {
        (&self.project_name, &self.row_id, self.phase_id)
    }

    /// Check the cell invariants
    ///
    /// # Errors
    /// `CoreError::InvalidPayload` naming the first violated invariant.
    pub fn validate(&self) -> CoreResult<()> {
        let (project, row, phase) = self.key();
        if project.trim().is_empty() {
            return Err(CoreError::invalid_payload("project_name must not be empty"));
        }
        if row.trim().is_empty() {
            return Err(CoreError::invalid_payload(format!(
                "row_id must not be empty (project '{project}')"
            )));
        }
        if phase > MAX_PHASE {
            return Err(CoreError::invalid_payload(format!(
                "phase_id {phase} out of range 0..={MAX_PHASE} ({project}/{row})"
            )));
        }
        if self.completion > 100 {
            return Err(CoreError::invalid_payload(format!(
                "completion {} exceeds 100 ({project}/{row}/{phase})",
                self.completion
            )));
        }
        if self.scenarios_passed > self.scenarios_total {
            return Err(CoreError::invalid_payload(format!(
                "scenarios_passed {} exceeds scenarios_total {} ({project}/{row}/{phase})",
                self.scenarios_passed, self.scenarios_total
            )));
        }
        if self.steps_passed > self.steps_total {
            return Err(CoreError::invalid_payload(format!(
                "steps_passed {} exceeds steps_total {} ({project}/{row}/{phase})",
                self.steps_passed, self.steps_total
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell() -> MatrixCell {
        MatrixCell {
            project_name: "demo".to_string(),
            row_id: "api".to_string(),
            phase_id: 1,
            status: CellStatus::Pass,
            completion: 100,
            scenarios_total: 1,
            scenarios_passed: 1,
            steps_total: 5,
            steps_passed: 5,
            details: Vec::new(),
        }
    }

    #[test]
    fn granularity_parse_is_lenient() {
        assert_eq!(Granularity::parse("component"), Granularity::Component);
        assert_eq!(Granularity::parse(""), Granularity::Component);
        assert_eq!(Granularity::parse("domain"), Granularity::Domain);
        assert_eq!(Granularity::parse("system"), Granularity::System);
        assert_eq!(Granularity::parse("subcomponent"), Granularity::Subcomponent);
        assert_eq!(Granularity::parse("team"), Granularity::Subcomponent);
    }

    #[test]
    fn granularity_serde_as_string() {
        let g: Granularity = serde_json::from_str("\"system\"").unwrap();
        assert_eq!(g, Granularity::System);
        assert_eq!(serde_json::to_string(&Granularity::Domain).unwrap(), "\"domain\"");
    }

    #[test]
    fn cell_status_from_str() {
        assert_eq!("pass".parse::<CellStatus>().unwrap(), CellStatus::Pass);
        assert_eq!("empty".parse::<CellStatus>().unwrap(), CellStatus::Empty);
        assert!("PASS".parse::<CellStatus>().is_err());
    }

    #[test]
    fn cell_without_details_omits_field() {
        let json = serde_json::to_value(cell()).unwrap();
        assert!(json.get("details").is_none());
        assert_eq!(json["status"], "pass");
        assert_eq!(json["phase_id"], 1);
    }

    #[test]
    fn validate_accepts_consistent_cell() {
        assert!(cell().validate().is_ok());
    }

    #[test]
    fn validate_rejects_broken_invariants() {
        let mut c = cell();
        c.phase_id = 4;
        assert!(c.validate().unwrap_err().is_invalid_payload());

        let mut c = cell();
        c.steps_passed = 6;
        assert!(c.validate().is_err());

        let mut c = cell();
        c.scenarios_passed = 2;
        assert!(c.validate().is_err());

        let mut c = cell();
        c.completion = 101;
        assert!(c.validate().is_err());

        let mut c = cell();
        c.row_id = "  ".to_string();
        assert!(c.validate().is_err());
    }

    #[test]
    fn scenario_record_detail_shape() {
        let mut record = ScenarioRecord::new("F", "S");
        record.tags = "@component:x @phase:0".to_string();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["tag"], "@component:x @phase:0");
        assert_eq!(json["status"], "pending");
        assert!(json.get("steps").is_none());
    }
}

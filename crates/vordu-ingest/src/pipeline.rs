//! Ingestion pipeline
//!
//! catalog → (planned ∪ executed) → merge → resolve → aggregate → payloads

use crate::error::{IngestError, IngestResult};
use crate::parsers::{scan_features, Catalog, CatalogParser, ReportParser, SourceParser};
use std::path::{Path, PathBuf};
use vordu_core::{
    merge_scenarios, resolve_all, Aggregator, ConfigPayload, MatrixCell, ScenarioRecord,
    SystemDescriptor,
};

/// Inputs gathered for one ingestion run
#[derive(Debug, Clone)]
pub struct IngestionRun {
    catalog: Catalog,
    project: SystemDescriptor,
    planned: Vec<ScenarioRecord>,
    executed: Vec<ScenarioRecord>,
}

/// Payloads produced by a run
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionOutput {
    /// Config payload; `None` when the catalog has no System entity
    pub config: Option<ConfigPayload>,
    /// Status payload, one item per non-empty (row, phase) bucket
    pub cells: Vec<MatrixCell>,
}

impl IngestionRun {
    /// Start a run from an extracted catalog
    ///
    /// # Errors
    /// `IngestError::NoProject` when no project name can be determined.
    pub fn new(catalog: Catalog) -> IngestResult<Self> {
        if catalog.system.is_none() {
            tracing::warn!(
                "Catalog has no System entity; proceeding with components only and skipping config ingest"
            );
        }
        let project = catalog.project_descriptor()?;
        Ok(Self {
            catalog,
            project,
            planned: Vec::new(),
            executed: Vec::new(),
        })
    }

    /// Start a run from a catalog file on disk
    ///
    /// # Errors
    /// Parse failures abort the run, as does a missing project name.
    pub fn from_catalog_file(path: &Path) -> IngestResult<Self> {
        let catalog = CatalogParser.parse_file(path)?;
        tracing::info!(
            path = %path.display(),
            components = catalog.components.len(),
            "Loaded catalog"
        );
        Self::new(catalog)
    }

    /// Add planned scenarios
    #[must_use]
    pub fn with_planned(mut self, planned: impl IntoIterator<Item = ScenarioRecord>) -> Self {
        self.planned.extend(planned);
        self
    }

    /// Add executed scenarios
    #[must_use]
    pub fn with_executed(mut self, executed: impl IntoIterator<Item = ScenarioRecord>) -> Self {
        self.executed.extend(executed);
        self
    }

    /// Scan a feature tree for planned scenarios
    ///
    /// # Errors
    /// Propagates walk and read failures.
    pub fn scan(mut self, features: &Path) -> IngestResult<Self> {
        let planned = scan_features(features, &self.project.name)?;
        self.planned.extend(planned);
        Ok(self)
    }

    /// Parse test reports for executed scenarios
    ///
    /// # Errors
    /// The first malformed or unreadable report aborts the run.
    pub fn load_reports<P: AsRef<Path>>(mut self, reports: &[P]) -> IngestResult<Self> {
        for report in reports {
            let report = report.as_ref();
            let records = ReportParser.parse_file(report)?;
            tracing::info!(
                path = %report.display(),
                scenarios = records.len(),
                "Loaded test report"
            );
            self.executed.extend(records);
        }
        Ok(self)
    }

    /// Project the status items are filed under
    #[must_use]
    pub fn project(&self) -> &SystemDescriptor {
        &self.project
    }

    /// Extracted catalog
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Merge, resolve and aggregate into API payloads
    ///
    /// # Errors
    /// `IngestError::Core` if an aggregated cell fails ingress validation.
    pub fn compute(self) -> IngestResult<IngestionOutput> {
        let Self {
            catalog,
            project,
            planned,
            executed,
        } = self;

        let merged = merge_scenarios(planned, executed);
        let total = merged.len();
        let resolved = resolve_all(merged);
        if resolved.len() < total {
            tracing::info!(
                "{} of {} scenarios carry no row or phase and were left out",
                total - resolved.len(),
                total
            );
        }

        let cells = Aggregator::new(&project, &catalog.components).aggregate(&resolved);
        for cell in &cells {
            cell.validate()?;
        }
        tracing::info!(
            project = %project.name,
            granularity = %project.granularity,
            cells = cells.len(),
            "Aggregated matrix cells"
        );

        Ok(IngestionOutput {
            config: catalog.config_payload(),
            cells,
        })
    }
}

/// File inputs for a full run
#[derive(Debug, Clone, Default)]
pub struct RunInputs {
    /// Catalog file
    pub catalog: PathBuf,
    /// Cucumber JSON reports
    pub reports: Vec<PathBuf>,
    /// Feature tree root
    pub features: Option<PathBuf>,
}

impl RunInputs {
    /// Load every input and compute the payloads
    ///
    /// # Errors
    /// Any parse failure aborts the run before payloads are produced.
    pub fn execute(&self) -> Result<IngestionOutput, IngestError> {
        let mut run = IngestionRun::from_catalog_file(&self.catalog)?;
        if let Some(features) = &self.features {
            run = run.scan(features)?;
        }
        run.load_reports(&self.reports)?.compute()
    }
}

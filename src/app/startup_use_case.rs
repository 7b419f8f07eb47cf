use std::sync::Arc;
use tracing::{info, warn};

use crate::app::data_access::{CoreDatasets, DataAccess};
use crate::domain::{ScoredTable, Table};
use crate::error::Result;
use crate::pipeline::processing::quality_gate::{
    DefaultQualityGate, GateInputs, QualityGate, QualityGateConfig, QualityGateReport,
};

/// Datasets that passed every blocking gate, with the full gate report.
#[derive(Debug, Clone)]
pub struct ValidatedDatasets {
    pub companies: Arc<Table>,
    pub buildings: Arc<Table>,
    pub scored: Arc<ScoredTable>,
    pub report: QualityGateReport,
}

/// Use case for validating the datasets before anything is displayed
pub struct StartupUseCase {
    quality_gate: Box<dyn QualityGate + Send + Sync>,
}

impl StartupUseCase {
    pub fn new(quality_gate: Box<dyn QualityGate + Send + Sync>) -> Self {
        Self { quality_gate }
    }

    /// Create a use case with the default quality gate and the given thresholds
    pub fn with_config(config: QualityGateConfig) -> Self {
        Self::new(Box::new(DefaultQualityGate::with_config(config)))
    }

    /// Load the core datasets and run every gate. Fails on the first blocking gate.
    pub fn run(&self, access: &mut DataAccess) -> Result<ValidatedDatasets> {
        info!(root = %access.root().path().display(), "Running startup validation");

        let CoreDatasets {
            companies,
            buildings,
            scored,
        } = access.core_datasets()?;

        let report = self.quality_gate.assess(&GateInputs {
            scored: &scored,
            companies: &companies,
            buildings: &buildings,
            root: access.root(),
        })?;

        let warnings = report.warnings().count();
        if warnings > 0 {
            warn!(warnings = warnings, "Startup validation passed with warnings");
        } else {
            info!("Startup validation passed");
        }

        Ok(ValidatedDatasets {
            companies,
            buildings,
            scored,
            report,
        })
    }
}

impl Default for StartupUseCase {
    fn default() -> Self {
        Self::with_config(QualityGateConfig::default())
    }
}

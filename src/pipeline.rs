use anyhow::{Context, Result};
use tracing::info;

use crate::config::PipelineConfig;
use crate::ingest::descriptor::DescriptorTable;
use crate::ingest::subjects::SubjectTable;
use crate::ingest::FeatureIngestor;
use crate::types::FeatureSet;

/// Everything loaded by one ingestion run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub subjects: SubjectTable,
    pub features: FeatureSet,
    pub descriptors: Option<DescriptorTable>,
}

/// Load the subject table, ingest feature files, and read descriptors if configured.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineOutput> {
    let config = config.resolved().context("invalid pipeline configuration")?;
    info!(
        feature_dir = %config.feature_dir.display(),
        subject_table = %config.subject_table.display(),
        scan_order = ?config.ingest.scan_order,
        "starting ingestion run"
    );

    let subjects = SubjectTable::from_csv_path(&config.subject_table)?;
    let features = FeatureIngestor::new(&subjects)
        .with_config(config.ingest)
        .ingest_dir(&config.feature_dir)?;
    let descriptors = config
        .descriptor_dir
        .as_deref()
        .map(|dir| DescriptorTable::load_dir(dir, config.ingest.scan_order))
        .transpose()?;

    Ok(PipelineOutput {
        subjects,
        features,
        descriptors,
    })
}

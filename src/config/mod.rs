use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::ingest::IngestConfig;

/// Locations of the inputs for one ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory of per-recording JSON feature files
    pub feature_dir: PathBuf,
    /// Optional directory of GeMaps `.arff` descriptor files
    #[serde(default)]
    pub descriptor_dir: Option<PathBuf>,
    /// CSV subject table with health codes and diagnoses
    pub subject_table: PathBuf,
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl PipelineConfig {
    pub fn new(feature_dir: impl Into<PathBuf>, subject_table: impl Into<PathBuf>) -> Self {
        Self {
            feature_dir: feature_dir.into(),
            descriptor_dir: None,
            subject_table: subject_table.into(),
            ingest: IngestConfig::default(),
        }
    }

    pub fn with_descriptor_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.descriptor_dir = Some(dir.into());
        self
    }

    pub fn with_ingest(mut self, ingest: IngestConfig) -> Self {
        self.ingest = ingest;
        self
    }

    /// Load a JSON config file; relative paths resolve against the file's directory.
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read pipeline config {:?}", path))?;
        let mut config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse pipeline config {:?}", path))?;
        if let Some(base) = path.parent() {
            config.feature_dir = base.join(&config.feature_dir);
            config.subject_table = base.join(&config.subject_table);
            config.descriptor_dir = config.descriptor_dir.map(|dir| base.join(dir));
        }
        Ok(config)
    }

    /// Canonicalize every input path and check each is the kind of entry expected.
    pub fn resolved(&self) -> Result<Self> {
        Ok(Self {
            feature_dir: resolve_input(&self.feature_dir, InputKind::FeatureDir)?,
            descriptor_dir: self
                .descriptor_dir
                .as_deref()
                .map(|dir| resolve_input(dir, InputKind::DescriptorDir))
                .transpose()?,
            subject_table: resolve_input(&self.subject_table, InputKind::SubjectTable)?,
            ingest: self.ingest,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum InputKind {
    FeatureDir,
    DescriptorDir,
    SubjectTable,
}

impl InputKind {
    fn label(self) -> &'static str {
        match self {
            Self::FeatureDir => "feature directory",
            Self::DescriptorDir => "descriptor directory",
            Self::SubjectTable => "subject table",
        }
    }
}

fn resolve_input(path: &Path, kind: InputKind) -> Result<PathBuf> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("failed to resolve {} at {:?}", kind.label(), path))?;
    let expected_dir = !matches!(kind, InputKind::SubjectTable);
    if canonical.is_dir() == expected_dir {
        Ok(canonical)
    } else if expected_dir {
        Err(anyhow!("{} {:?} is not a directory", kind.label(), canonical))
    } else {
        Err(anyhow!("{} {:?} is not a file", kind.label(), canonical))
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_input, InputKind, PipelineConfig};
    use crate::ingest::ScanOrder;
    use std::fs;

    #[test]
    fn rejects_file_where_directory_expected() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("subjects.csv");
        fs::write(&file, "healthCode,diag\n").unwrap();
        assert!(resolve_input(&file, InputKind::FeatureDir).is_err());
        assert!(resolve_input(temp.path(), InputKind::FeatureDir).is_ok());
        assert!(resolve_input(&file, InputKind::SubjectTable).is_ok());
    }

    #[test]
    fn rejects_directory_as_subject_table() {
        let temp = tempfile::tempdir().unwrap();
        let err = resolve_input(temp.path(), InputKind::SubjectTable).unwrap_err();
        assert!(err.to_string().contains("subject table"));
    }

    #[test]
    fn resolve_errors_name_the_input() {
        let temp = tempfile::tempdir().unwrap();
        let err = resolve_input(&temp.path().join("gone"), InputKind::DescriptorDir).unwrap_err();
        assert!(err.to_string().contains("descriptor directory"));
    }

    #[test]
    fn json_config_resolves_relative_paths() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("pipeline.json");
        fs::write(
            &path,
            r#"{
                "feature_dir": "features",
                "subject_table": "subjects.csv",
                "ingest": { "scan_order": "listing" }
            }"#,
        )
        .unwrap();
        let config = PipelineConfig::from_json_path(&path).unwrap();
        assert_eq!(config.feature_dir, temp.path().join("features"));
        assert_eq!(config.subject_table, temp.path().join("subjects.csv"));
        assert!(config.descriptor_dir.is_none());
        assert_eq!(config.ingest.scan_order, ScanOrder::Listing);
    }

    #[test]
    fn resolved_fails_for_missing_feature_dir() {
        let temp = tempfile::tempdir().unwrap();
        let table = temp.path().join("subjects.csv");
        fs::write(&table, "healthCode,diag\n").unwrap();
        let config = PipelineConfig::new(temp.path().join("missing"), table);
        assert!(config.resolved().is_err());
    }
}

//! Subject table: health codes and their diagnosis labels.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::types::{Diagnosis, Subject};

#[derive(Debug, Deserialize)]
struct SubjectRow {
    #[serde(rename = "healthCode", alias = "health_code", alias = "healthcode")]
    health_code: String,
    #[serde(rename = "diag", alias = "diagnosis", alias = "professional-diagnosis")]
    diagnosis: Diagnosis,
}

/// Health code to diagnosis lookup used to admit recordings during ingestion.
#[derive(Debug, Clone, Default)]
pub struct SubjectTable {
    diagnoses: HashMap<String, Diagnosis>,
}

impl SubjectTable {
    pub fn from_subjects(subjects: impl IntoIterator<Item = Subject>) -> Self {
        let mut table = Self::default();
        for subject in subjects {
            table.insert(subject.health_code, subject.diagnosis);
        }
        table
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open subject table {:?}", path))?;
        let table = Self::from_reader(file)
            .with_context(|| format!("failed to read subject table {:?}", path))?;
        info!(
            path = %path.display(),
            subjects = table.len(),
            "loaded subject table"
        );
        Ok(table)
    }

    /// Read a headed CSV; columns other than health code and diagnosis are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rows = csv::Reader::from_reader(reader);
        let mut table = Self::default();
        for (line, row) in rows.deserialize::<SubjectRow>().enumerate() {
            let row = row.with_context(|| format!("invalid subject row {}", line + 1))?;
            table.insert(row.health_code, row.diagnosis);
        }
        Ok(table)
    }

    fn insert(&mut self, health_code: String, diagnosis: Diagnosis) {
        if let Some(previous) = self.diagnoses.insert(health_code.clone(), diagnosis) {
            if previous != diagnosis {
                warn!(
                    health_code = %health_code,
                    %previous,
                    %diagnosis,
                    "conflicting diagnosis for subject; keeping the later row"
                );
            }
        }
    }

    pub fn diagnosis(&self, health_code: &str) -> Option<Diagnosis> {
        self.diagnoses.get(health_code).copied()
    }

    pub fn contains(&self, health_code: &str) -> bool {
        self.diagnoses.contains_key(health_code)
    }

    pub fn len(&self) -> usize {
        self.diagnoses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnoses.is_empty()
    }
}

//! Builds the parallel tall feature matrices from a directory of per-recording files.

pub mod arff;
pub mod descriptor;
pub mod record;
pub mod subjects;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::types::{FeatureSet, Recording, TallMatrix, Uid};

use record::{FeatureFile, ScalarFeature, CHROMA_BINS, MFCC_COEFFICIENTS};
use subjects::SubjectTable;

const FEATURE_EXTENSION: &str = ".json";
const RETRY_MARKER_SUFFIX: &str = "NLX-1.json";
const PROGRESS_INTERVAL: usize = 5000;

/// Order in which directory entries are visited; uids follow this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOrder {
    /// Sorted by file name, reproducible across platforms.
    #[default]
    ByName,
    /// Whatever order the filesystem reports.
    Listing,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub scan_order: ScanOrder,
}

/// List directory entries in `order`. Every entry is returned, files or not.
pub(crate) fn scan_dir(dir: &Path, order: ScanOrder) -> Result<Vec<(String, PathBuf)>> {
    let mut entries = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to list directory {:?}", dir))?
    {
        let entry = entry.with_context(|| format!("failed to read entry in {:?}", dir))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push((name, entry.path()));
    }
    if order == ScanOrder::ByName {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
    }
    Ok(entries)
}

/// Growable row-major buffers, one per output matrix.
#[derive(Debug, Default)]
struct TallBuffers {
    mfcc: Vec<f64>,
    chroma: Vec<f64>,
    other: Vec<f64>,
    rows: usize,
}

impl TallBuffers {
    fn into_matrices(self) -> Result<(TallMatrix, TallMatrix, TallMatrix)> {
        let rows = self.rows;
        let build = |data: Vec<f64>, width: usize| -> Result<TallMatrix> {
            let array = Array2::from_shape_vec((rows, width + 1), data)
                .context("tall buffer does not match its row count")?;
            TallMatrix::new(array)
        };
        Ok((
            build(self.mfcc, MFCC_COEFFICIENTS)?,
            build(self.chroma, CHROMA_BINS)?,
            build(self.other, ScalarFeature::ALL.len())?,
        ))
    }
}

/// Turns feature files into tall matrices for the subjects in a [`SubjectTable`].
#[derive(Debug)]
pub struct FeatureIngestor<'a> {
    subjects: &'a SubjectTable,
    config: IngestConfig,
}

impl<'a> FeatureIngestor<'a> {
    pub fn new(subjects: &'a SubjectTable) -> Self {
        Self {
            subjects,
            config: IngestConfig::default(),
        }
    }

    pub fn with_config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    /// Scan `dir` and build the MFCC, chroma and other tall matrices.
    ///
    /// Every directory entry advances the uid counter, so the n-th entry in scan
    /// order gets uid n whether or not it is accepted. Foreign files, retry
    /// markers, unparseable files and unknown health codes are skipped; I/O
    /// errors abort the scan.
    pub fn ingest_dir(&self, dir: &Path) -> Result<FeatureSet> {
        let entries = scan_dir(dir, self.config.scan_order)?;
        let total = entries.len();
        info!(dir = %dir.display(), entries = total, "scanning feature directory");

        let mut buffers = TallBuffers::default();
        let mut recordings = Vec::new();

        for (index, (name, path)) in entries.iter().enumerate() {
            let scanned = index + 1;
            if scanned % PROGRESS_INTERVAL == 0 {
                let percent = (scanned as f64 / total as f64 * 10_000.0).round() / 100.0;
                info!(scanned, total, percent, "ingestion progress");
            }
            let uid = Uid::try_from(scanned).context("uid counter overflow")?;
            if let Some(recording) = self.ingest_file(name, path, uid, &mut buffers)? {
                recordings.push(recording);
            }
        }

        let (mfcc, chroma, other) = buffers.into_matrices()?;
        info!(
            recordings = recordings.len(),
            frames = mfcc.nrows(),
            "feature ingestion complete"
        );
        Ok(FeatureSet {
            mfcc,
            chroma,
            other,
            recordings,
        })
    }

    fn ingest_file(
        &self,
        name: &str,
        path: &Path,
        uid: Uid,
        buffers: &mut TallBuffers,
    ) -> Result<Option<Recording>> {
        if !name.ends_with(FEATURE_EXTENSION) || !path.is_file() {
            debug!(file = name, "skipping non-feature entry");
            return Ok(None);
        }
        if name.ends_with(RETRY_MARKER_SUFFIX) {
            debug!(file = name, "skipping retry marker file");
            return Ok(None);
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read feature file {:?}", path))?;
        let parsed: FeatureFile = match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(file = name, error = %err, "skipping unparseable feature file");
                return Ok(None);
            }
        };

        let Some(diagnosis) = self.subjects.diagnosis(&parsed.healthcode) else {
            debug!(file = name, "skipping file for unknown health code");
            return Ok(None);
        };

        let audio = &parsed.features.audio;
        let frames = match audio.validate() {
            Ok(frames) => frames,
            Err(err) => {
                warn!(file = name, error = %err, "skipping inconsistent feature file");
                return Ok(None);
            }
        };

        let uid_value = f64::from(uid);
        audio.push_mfcc_rows(uid_value, &mut buffers.mfcc);
        audio.push_chroma_rows(uid_value, &mut buffers.chroma);
        audio.push_other_rows(uid_value, &mut buffers.other);
        buffers.rows += frames;

        let file_id = name.split('.').next().unwrap_or(name).to_string();
        debug!(file = name, uid, frames, "ingested feature file");
        Ok(Some(Recording {
            file_id,
            uid,
            health_code: parsed.healthcode,
            phone_info: parsed.phoneinfo.unwrap_or_default(),
            app_version: parsed.appversion.unwrap_or_default(),
            med_timepoint: parsed.medtimepoint.unwrap_or_default(),
            sample_len: frames,
            diagnosis,
        }))
    }
}

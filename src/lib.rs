//! Data preparation for voice-based Parkinson's disease feature corpora.
//!
//! Per-recording feature files are ingested into three parallel tall matrices
//! (MFCC, chroma, other acoustic series) whose last column is a per-run uid,
//! recordings are filtered on clinical metadata, and the tall matrices are
//! collapsed into fixed-size rows per uid.

pub mod aggregate;
pub mod config;
pub mod ingest;
pub mod pipeline;
pub mod selection;
pub mod types;

pub use aggregate::{collapse, filter_by_uids, invert, Statistic};
pub use config::PipelineConfig;
pub use ingest::{FeatureIngestor, IngestConfig, ScanOrder};
pub use pipeline::{run_pipeline, PipelineOutput};
pub use selection::{filter_by_medication, filter_by_sample_len, keep_uids};
pub use types::{Diagnosis, FeatureSet, Recording, Subject, TallMatrix, Uid};

//! Core types for the voiceprep data-preparation pipeline

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use anyhow::{anyhow, ensure, Result};
use ndarray::{s, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Deserializer, Serialize};

/// Synthetic per-recording identifier assigned during one ingestion run
pub type Uid = u32;

/// Binary diagnosis label attached to a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Diagnosis {
    /// Parkinson's disease
    Case,
    Control,
}

impl FromStr for Diagnosis {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "1.0" | "true" | "case" | "pd" | "parkinson" => Ok(Self::Case),
            "0" | "0.0" | "false" | "control" => Ok(Self::Control),
            other => Err(anyhow!("unrecognized diagnosis label '{}'", other)),
        }
    }
}

impl<'de> Deserialize<'de> for Diagnosis {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Display for Diagnosis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Case => write!(f, "case"),
            Self::Control => write!(f, "control"),
        }
    }
}

/// A study participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub health_code: String,
    pub diagnosis: Diagnosis,
}

/// Metadata for one ingested voice recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    /// Source file name up to the first '.'
    pub file_id: String,
    pub uid: Uid,
    pub health_code: String,
    pub phone_info: String,
    pub app_version: String,
    /// Medication state label, e.g. "Immediately before Parkinson medication"
    pub med_timepoint: String,
    /// Number of frames captured for the recording
    pub sample_len: usize,
    pub diagnosis: Diagnosis,
}

/// Numeric table with one row per (recording, frame) and the uid in the last column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TallMatrix {
    data: Array2<f64>,
}

impl TallMatrix {
    pub fn new(data: Array2<f64>) -> Result<Self> {
        ensure!(
            data.ncols() >= 1,
            "tall matrix needs at least the trailing uid column"
        );
        let uid_col = data.ncols() - 1;
        for (row, value) in data.column(uid_col).iter().enumerate() {
            ensure!(
                value.is_finite()
                    && value.fract() == 0.0
                    && (0.0..=f64::from(Uid::MAX)).contains(value),
                "row {} has uid {} which is not a non-negative integer id",
                row,
                value
            );
        }
        Ok(Self { data })
    }

    /// Empty matrix with `feature_count` feature columns plus the uid column
    pub fn empty(feature_count: usize) -> Self {
        Self {
            data: Array2::zeros((0, feature_count + 1)),
        }
    }

    pub(crate) fn from_array_unchecked(data: Array2<f64>) -> Self {
        debug_assert!(data.ncols() >= 1);
        Self { data }
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn into_array(self) -> Array2<f64> {
        self.data
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns excluding the trailing uid
    pub fn feature_count(&self) -> usize {
        self.data.ncols() - 1
    }

    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.data.slice(s![.., ..-1])
    }

    pub fn uid_column(&self) -> ArrayView1<'_, f64> {
        self.data.index_axis(Axis(1), self.data.ncols() - 1)
    }

    /// Uid of row `row`
    pub fn uid_at(&self, row: usize) -> Uid {
        self.data[[row, self.data.ncols() - 1]] as Uid
    }

    /// Distinct uids in ascending order
    pub fn uids(&self) -> BTreeSet<Uid> {
        self.uid_column().iter().map(|v| *v as Uid).collect()
    }
}

/// The three parallel tall matrices and recording metadata from one ingestion run
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub mfcc: TallMatrix,
    pub chroma: TallMatrix,
    pub other: TallMatrix,
    pub recordings: Vec<Recording>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn diagnosis_accepts_numeric_and_named_labels() {
        assert_eq!("1".parse::<Diagnosis>().unwrap(), Diagnosis::Case);
        assert_eq!("True".parse::<Diagnosis>().unwrap(), Diagnosis::Case);
        assert_eq!("0".parse::<Diagnosis>().unwrap(), Diagnosis::Control);
        assert_eq!(" control ".parse::<Diagnosis>().unwrap(), Diagnosis::Control);
        assert!("maybe".parse::<Diagnosis>().is_err());
    }

    #[test]
    fn tall_matrix_splits_features_and_uids() {
        let tall = TallMatrix::new(array![[0.5, 1.0, 3.0], [1.5, 2.0, 1.0]]).unwrap();
        assert_eq!(tall.feature_count(), 2);
        assert_eq!(tall.features(), array![[0.5, 1.0], [1.5, 2.0]]);
        assert_eq!(tall.uid_at(0), 3);
        assert_eq!(tall.uids().into_iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn tall_matrix_rejects_zero_columns() {
        assert!(TallMatrix::new(Array2::zeros((2, 0))).is_err());
    }

    #[test]
    fn tall_matrix_rejects_non_integer_uids() {
        for bad in [1.5, -2.0, f64::NAN, f64::INFINITY, 5e9] {
            let data = array![[1.0, 1.0], [3.0, bad]];
            assert!(TallMatrix::new(data).is_err(), "uid {} accepted", bad);
        }
        assert!(TallMatrix::new(array![[1.0, 0.0], [3.0, 4_294_967_295.0]]).is_ok());
    }
}

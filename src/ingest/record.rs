//! Schema of one per-recording feature file.

use anyhow::{ensure, Result};
use serde::Deserialize;

pub const MFCC_COEFFICIENTS: usize = 13;
pub const CHROMA_BINS: usize = 12;

/// Scalar-per-frame series stacked into the "other" matrix, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarFeature {
    ZeroCrossingRate,
    Energy,
    EnergyEntropy,
    SpectralCentroid,
    SpectralSpread,
    SpectralEntropy,
    SpectralFlux,
    SpectralRolloff,
    ChromaDeviation,
}

impl ScalarFeature {
    pub const ALL: [ScalarFeature; 9] = [
        Self::ZeroCrossingRate,
        Self::Energy,
        Self::EnergyEntropy,
        Self::SpectralCentroid,
        Self::SpectralSpread,
        Self::SpectralEntropy,
        Self::SpectralFlux,
        Self::SpectralRolloff,
        Self::ChromaDeviation,
    ];

    /// Key used in the feature file.
    pub fn key(self) -> &'static str {
        match self {
            Self::ZeroCrossingRate => "ZCR",
            Self::Energy => "energy",
            Self::EnergyEntropy => "energy_entropy",
            Self::SpectralCentroid => "spectral_centroid",
            Self::SpectralSpread => "spectral_spread",
            Self::SpectralEntropy => "spectral_entropy",
            Self::SpectralFlux => "spectral_flux",
            Self::SpectralRolloff => "spectral_rolloff",
            Self::ChromaDeviation => "chroma_deviation",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFile {
    pub healthcode: String,
    #[serde(default)]
    pub phoneinfo: Option<String>,
    #[serde(default)]
    pub appversion: Option<String>,
    #[serde(default)]
    pub medtimepoint: Option<String>,
    pub features: FeatureBlock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureBlock {
    pub audio: AudioFeatures,
}

/// Frame-indexed acoustic features; coefficient-major as stored on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeatures {
    #[serde(rename = "MFCC")]
    pub mfcc: Vec<Vec<f64>>,
    pub chroma_vector: Vec<Vec<f64>>,
    #[serde(rename = "ZCR")]
    pub zcr: Vec<f64>,
    pub energy: Vec<f64>,
    pub energy_entropy: Vec<f64>,
    pub spectral_centroid: Vec<f64>,
    pub spectral_spread: Vec<f64>,
    pub spectral_entropy: Vec<f64>,
    pub spectral_flux: Vec<f64>,
    pub spectral_rolloff: Vec<f64>,
    pub chroma_deviation: Vec<f64>,
}

impl AudioFeatures {
    pub fn scalar(&self, feature: ScalarFeature) -> &[f64] {
        match feature {
            ScalarFeature::ZeroCrossingRate => &self.zcr,
            ScalarFeature::Energy => &self.energy,
            ScalarFeature::EnergyEntropy => &self.energy_entropy,
            ScalarFeature::SpectralCentroid => &self.spectral_centroid,
            ScalarFeature::SpectralSpread => &self.spectral_spread,
            ScalarFeature::SpectralEntropy => &self.spectral_entropy,
            ScalarFeature::SpectralFlux => &self.spectral_flux,
            ScalarFeature::SpectralRolloff => &self.spectral_rolloff,
            ScalarFeature::ChromaDeviation => &self.chroma_deviation,
        }
    }

    /// Frame count, taken from the first MFCC coefficient.
    pub fn frame_count(&self) -> usize {
        self.mfcc.first().map_or(0, Vec::len)
    }

    /// Check that every block covers the same frames and has the expected width.
    pub fn validate(&self) -> Result<usize> {
        let frames = self.frame_count();
        ensure!(
            self.mfcc.len() == MFCC_COEFFICIENTS,
            "expected {} MFCC coefficients, found {}",
            MFCC_COEFFICIENTS,
            self.mfcc.len()
        );
        ensure!(
            self.chroma_vector.len() == CHROMA_BINS,
            "expected {} chroma bins, found {}",
            CHROMA_BINS,
            self.chroma_vector.len()
        );
        for (idx, coefficient) in self.mfcc.iter().enumerate() {
            ensure!(
                coefficient.len() == frames,
                "MFCC coefficient {} has {} frames, expected {}",
                idx,
                coefficient.len(),
                frames
            );
        }
        for (idx, bin) in self.chroma_vector.iter().enumerate() {
            ensure!(
                bin.len() == frames,
                "chroma bin {} has {} frames, expected {}",
                idx,
                bin.len(),
                frames
            );
        }
        for feature in ScalarFeature::ALL {
            let series = self.scalar(feature);
            ensure!(
                series.len() == frames,
                "{} has {} frames, expected {}",
                feature.key(),
                series.len(),
                frames
            );
        }
        Ok(frames)
    }

    /// Append frame rows (MFCC coefficients then uid) to a row-major buffer.
    pub fn push_mfcc_rows(&self, uid: f64, out: &mut Vec<f64>) {
        push_transposed(&self.mfcc, uid, out);
    }

    pub fn push_chroma_rows(&self, uid: f64, out: &mut Vec<f64>) {
        push_transposed(&self.chroma_vector, uid, out);
    }

    /// Append frame rows of all scalar series (schema order) then uid.
    pub fn push_other_rows(&self, uid: f64, out: &mut Vec<f64>) {
        for frame in 0..self.frame_count() {
            out.extend(ScalarFeature::ALL.iter().map(|f| self.scalar(*f)[frame]));
            out.push(uid);
        }
    }
}

fn push_transposed(block: &[Vec<f64>], uid: f64, out: &mut Vec<f64>) {
    let frames = block.first().map_or(0, Vec::len);
    for frame in 0..frames {
        out.extend(block.iter().map(|coefficient| coefficient[frame]));
        out.push(uid);
    }
}

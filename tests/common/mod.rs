use std::fs;
use std::path::Path;

use anyhow::Result;
use serde_json::{json, Value};

pub const SUBJECTS_CSV: &str = "healthCode,diag\nhc-case,1\nhc-control,0\n";

/// Feature file with `frames` frames; every value is derived from `base`.
pub fn feature_json(health_code: &str, timepoint: Option<&str>, frames: usize, base: f64) -> Value {
    let series = |offset: f64| -> Vec<f64> {
        (0..frames)
            .map(|t| base + offset + t as f64 * 0.5)
            .collect()
    };
    let mfcc: Vec<Vec<f64>> = (0..13).map(|k| series(k as f64)).collect();
    let chroma: Vec<Vec<f64>> = (0..12).map(|k| series(100.0 + k as f64)).collect();
    json!({
        "healthcode": health_code,
        "phoneinfo": "iPhone 6",
        "appversion": "version 1.0.5, build 12",
        "medtimepoint": timepoint,
        "features": {
            "audio": {
                "ZCR": series(200.0),
                "energy": series(201.0),
                "energy_entropy": series(202.0),
                "spectral_centroid": series(203.0),
                "spectral_spread": series(204.0),
                "spectral_entropy": series(205.0),
                "spectral_flux": series(206.0),
                "spectral_rolloff": series(207.0),
                "MFCC": mfcc,
                "chroma_vector": chroma,
                "chroma_deviation": series(208.0),
            }
        }
    })
}

pub fn write_json(dir: &Path, name: &str, value: &Value) -> Result<()> {
    fs::write(dir.join(name), serde_json::to_string(value)?)?;
    Ok(())
}

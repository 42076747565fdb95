use std::fmt::{Display, Formatter};
use std::str::FromStr;

use anyhow::{anyhow, Result};
use ndarray::{Array1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Per-column reduction applied to each uid group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    Mean,
    /// Sample variance (n - 1 denominator)
    #[serde(alias = "var")]
    Variance,
    /// Sample standard deviation (n - 1 denominator)
    #[serde(alias = "std")]
    StdDev,
}

impl FromStr for Statistic {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "var" | "variance" => Ok(Self::Variance),
            "std" | "stddev" | "std_dev" => Ok(Self::StdDev),
            other => Err(anyhow!("unknown statistic '{}'", other)),
        }
    }
}

impl Display for Statistic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mean => write!(f, "mean"),
            Self::Variance => write!(f, "var"),
            Self::StdDev => write!(f, "std"),
        }
    }
}

impl Statistic {
    /// Reduce every column of `group` (rows = frames) to one value.
    pub(super) fn reduce(self, group: ArrayView2<'_, f64>) -> Array1<f64> {
        group
            .axis_iter(Axis(1))
            .map(|column| {
                let values = column.to_vec();
                match self {
                    Self::Mean => mean(&values),
                    Self::Variance => sample_variance(&values),
                    Self::StdDev => sample_variance(&values).sqrt(),
                }
            })
            .collect()
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let center = mean(values);
    let squared: f64 = values.iter().map(|v| (v - center).powi(2)).sum();
    squared / (values.len() - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn parses_statistic_names() {
        assert_eq!("mean".parse::<Statistic>().unwrap(), Statistic::Mean);
        assert_eq!("VAR".parse::<Statistic>().unwrap(), Statistic::Variance);
        assert_eq!("std".parse::<Statistic>().unwrap(), Statistic::StdDev);
        assert!("median".parse::<Statistic>().is_err());
    }

    #[test]
    fn variance_uses_unbiased_denominator() {
        let group = array![[1.0], [2.0], [3.0], [4.0]];
        let var = Statistic::Variance.reduce(group.view());
        let std = Statistic::StdDev.reduce(group.view());
        assert_abs_diff_eq!(var[0], 5.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(std[0], (5.0_f64 / 3.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn singleton_spread_is_nan() {
        let group = array![[7.0, 8.0]];
        assert!(Statistic::Variance.reduce(group.view()).iter().all(|v| v.is_nan()));
        assert!(Statistic::StdDev.reduce(group.view()).iter().all(|v| v.is_nan()));
        assert_eq!(Statistic::Mean.reduce(group.view()), array![7.0, 8.0]);
    }

    #[test]
    fn empty_group_mean_is_nan() {
        let group = ndarray::Array2::<f64>::zeros((0, 2));
        assert!(Statistic::Mean.reduce(group.view()).iter().all(|v| v.is_nan()));
    }
}

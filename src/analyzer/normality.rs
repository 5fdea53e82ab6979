// Moment-based normality heuristic
//
// This is not Shapiro-Wilk. It scores how far skewness and excess kurtosis
// sit from zero and calls a sample "approximately normal" when both are
// within +/- 1. Good enough to decide whether a mean/stddev summary is
// trustworthy; not a hypothesis test.

use serde::{Deserialize, Serialize};

use super::descriptive::{kurtosis, skewness};

const MIN_SAMPLES: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalityCheck {
    /// 1 - (|skewness| + |excess kurtosis|) / 4, clamped to [0, 1]
    pub statistic: f64,
    pub approximately_normal: bool,
    pub skewness: f64,
    pub excess_kurtosis: f64,
}

/// Score a sample's closeness to normal
///
/// Fewer than three values cannot be judged and return the default
/// (statistic 0, not normal).
pub fn check_normality(values: &[f64]) -> NormalityCheck {
    if values.len() < MIN_SAMPLES {
        return NormalityCheck::default();
    }

    let skew = skewness(values);
    let exkurt = kurtosis(values);
    let statistic = (1.0 - (skew.abs() + exkurt.abs()) / 4.0).clamp(0.0, 1.0);

    NormalityCheck {
        statistic,
        approximately_normal: skew.abs() < 1.0 && exkurt.abs() < 1.0,
        skewness: skew,
        excess_kurtosis: exkurt,
    }
}

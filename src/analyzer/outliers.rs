// IQR outlier detection with z-score severity grading
//
// Fences are Q1 - 1.5*IQR and Q3 + 1.5*IQR, with quartiles taken by the
// nearest-rank percentile. Values outside the fences are outliers; their
// severity comes from the z-score against the whole sample.

use serde::{Deserialize, Serialize};

use super::descriptive::{mean, nearest_rank, sorted_copy, std_dev};

/// Outlier severity by |z-score|
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierSeverity {
    /// |z| < 3
    Mild,
    /// 3 <= |z| < 5
    Moderate,
    /// |z| >= 5
    Severe,
}

impl OutlierSeverity {
    pub fn from_z_score(z: f64) -> Self {
        let z = z.abs();
        if z >= 5.0 {
            OutlierSeverity::Severe
        } else if z >= 3.0 {
            OutlierSeverity::Moderate
        } else {
            OutlierSeverity::Mild
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    /// Position in the input sequence
    pub index: usize,
    pub value: f64,
    pub z_score: f64,
    pub severity: OutlierSeverity,
}

/// Fences and the values that fall outside them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    pub outliers: Vec<Outlier>,
}

impl OutlierReport {
    pub fn has_outliers(&self) -> bool {
        !self.outliers.is_empty()
    }
}

/// Detect outliers with the IQR method
///
/// # Example
/// ```
/// use benchguard::analyzer::detect_outliers;
///
/// let report = detect_outliers(&[10.0, 10.0, 10.0, 10.0, 100.0]);
/// assert_eq!(report.outliers.len(), 1);
/// assert_eq!(report.outliers[0].value, 100.0);
///
/// assert!(!detect_outliers(&[10.0; 5]).has_outliers());
/// ```
pub fn detect_outliers(values: &[f64]) -> OutlierReport {
    if values.is_empty() {
        return OutlierReport::default();
    }

    let sorted = sorted_copy(values);
    let q1 = nearest_rank(&sorted, 25.0);
    let q3 = nearest_rank(&sorted, 75.0);
    let iqr = q3 - q1;
    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    let m = mean(values);
    let sd = std_dev(values);

    let outliers = values
        .iter()
        .enumerate()
        .filter(|(_, &v)| v < lower_fence || v > upper_fence)
        .map(|(index, &value)| {
            let z_score = if sd > 0.0 { (value - m) / sd } else { 0.0 };
            Outlier {
                index,
                value,
                z_score,
                severity: OutlierSeverity::from_z_score(z_score),
            }
        })
        .collect();

    OutlierReport {
        q1,
        q3,
        iqr,
        lower_fence,
        upper_fence,
        outliers,
    }
}

// Statistics library for benchmark series
//
// Pure functions over f64 sequences used standalone and by the detector:
// descriptive statistics, IQR outlier detection, Pearson correlation,
// least-squares trends, autocorrelation seasonality and linear forecasting.
//
// Conventions:
// - Population moments (divide by n) everywhere
// - Nearest-rank percentiles: index = ceil(p/100 * n) - 1
// - Empty or degenerate input returns a neutral value (0, no trend, no
//   outliers) instead of an error
//
// Everything here is O(n log n) or better except seasonality, which scans
// n/2 lags.

mod correlation;
mod descriptive;
mod forecast;
mod normality;
mod outliers;
mod trend;

pub use correlation::{autocorrelation, detect_seasonality, pearson, Seasonality};
pub use descriptive::{
    coefficient_of_variation, kurtosis, mean, median, percentile, skewness, std_dev, summarize,
    variance, variation_ratio, StatisticalSummary,
};
pub use forecast::{backtest, forecast, Forecast, ForecastAccuracy, ForecastPoint};
pub use normality::{check_normality, NormalityCheck};
pub use outliers::{detect_outliers, Outlier, OutlierReport, OutlierSeverity};
pub use trend::LinearTrend;

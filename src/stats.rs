//! Descriptive statistics over meter columns.

use crate::error::TableError;
use crate::table::TimeSeriesTable;

/// Central-moment sums smaller than this are treated as floating-point noise.
const FP_NOISE: f64 = 1e-14;

/// Mean and sample standard deviation of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Description {
    pub mean: f64,
    pub std: f64,
}

/// Describes the first numeric column of the table, in file order.
///
/// Timestamp and text columns are skipped, so this is not necessarily `E`.
pub fn describe(table: &TimeSeriesTable) -> Result<Description, TableError> {
    let column = table
        .numeric_columns()
        .next()
        .ok_or(TableError::NoNumericColumns)?;
    let values = table.numeric(&column.name)?;

    let mean = mean(&values);
    Ok(Description {
        mean,
        std: sample_stddev(&values, mean),
    })
}

/// Computes the arithmetic mean of a slice of values. Returns NaN for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the sample (n - 1) standard deviation given a pre-computed mean.
/// Returns NaN for fewer than two values.
pub fn sample_stddev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    variance.sqrt()
}

/// Adjusted Fisher-Pearson skewness (G1).
///
/// NaN for fewer than three values, zero when every value is equal.
pub fn skew(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 3 {
        return f64::NAN;
    }

    let mean = mean(values);
    let (m2, m3) = values.iter().fold((0.0, 0.0), |(m2, m3), v| {
        let d = v - mean;
        (m2 + d * d, m3 + d * d * d)
    });
    let m2 = zero_noise(m2);
    let m3 = zero_noise(m3);

    if m2 == 0.0 {
        return 0.0;
    }
    (n * (n - 1.0).sqrt() / (n - 2.0)) * (m3 / m2.powf(1.5))
}

fn zero_noise(v: f64) -> f64 {
    if v.abs() < FP_NOISE { 0.0 } else { v }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_and_sample_stddev() {
        let values = [10.0, 20.0, 30.0, 40.0];
        let m = mean(&values);
        assert_eq!(m, 25.0);
        // sqrt(500 / 3)
        assert!(close(sample_stddev(&values, m), 12.909944487358056));
    }

    #[test]
    fn test_degenerate_inputs_are_nan() {
        assert!(mean(&[]).is_nan());
        assert!(sample_stddev(&[1.0], 1.0).is_nan());
        assert!(skew(&[1.0, 2.0]).is_nan());
    }

    #[test]
    fn test_skew_of_symmetric_data_is_zero() {
        assert!(close(skew(&[1.0, 2.0, 3.0, 4.0, 5.0]), 0.0));
    }

    #[test]
    fn test_skew_of_constant_data_is_zero() {
        assert_eq!(skew(&[7.0, 7.0, 7.0, 7.0]), 0.0);
    }

    #[test]
    fn test_skew_matches_adjusted_estimator() {
        // mean 2.5, m2 = 27, m3 = 81: G1 = 4 * sqrt(3) / 2 * 81 / 27^1.5 = 2
        let values = [1.0, 1.0, 1.0, 7.0];
        assert!(close(skew(&values), 2.0));
    }

    #[test]
    fn test_describe_uses_first_numeric_column() {
        let csv = "Site,AESTTime,Q,E\nx,2021-01-01 00:00,1,10\nx,2021-01-01 00:30,3,20\n";
        let table = TimeSeriesTable::from_bytes(csv.as_bytes()).unwrap();
        let d = describe(&table).unwrap();

        assert_eq!(d.mean, 2.0);
        assert!(close(d.std, 2.0_f64.sqrt()));
    }

    #[test]
    fn test_describe_without_numeric_columns() {
        let csv = "AESTTime,Site\n2021-01-01 00:00,x\n";
        let table = TimeSeriesTable::from_bytes(csv.as_bytes()).unwrap();
        assert!(matches!(describe(&table), Err(TableError::NoNumericColumns)));
    }
}

//! Summary statistics and column profiles.
//!
//! Everything in here is a pure function of the loaded table and the
//! current widget selections. Results are recomputed on every render and
//! never cached across interactions.

use rayon::prelude::*;
use std::collections::HashMap;
use tracing::trace;

use crate::domain::{ColumnKind, DexError};
use crate::table::Table;

/// Dataset-level counts, shown in the statistics panel.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStatistics {
    pub rows: usize,
    pub columns: usize,
    /// Dtype label -> number of columns of that dtype, ordered by
    /// descending count (ties keep first-encountered dtype order).
    pub dtype_counts: Vec<(String, usize)>,
    pub categorical: usize,
    pub numerical: usize,
    pub boolean: usize,
}

/// Five-number summary of one numeric column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Equal-width histogram over the finite values of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Bin edges, length `counts.len() + 1`.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    pub bin_width: f64,
}

/// Pairwise Pearson correlation over the numeric columns of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub names: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// Row/column counts and per-dtype counts of the whole table.
/// An empty table yields zero counts, not an error.
pub fn dataset_statistics(table: &Table) -> DatasetStatistics {
    let dtype_counts = value_counts(table.columns.iter().map(|c| c.dtype.to_string()));
    DatasetStatistics {
        rows: table.nrows(),
        columns: table.ncols(),
        dtype_counts,
        categorical: table.columns_of(ColumnKind::Categorical).len(),
        numerical: table.columns_of(ColumnKind::Numerical).len(),
        boolean: table.columns_of(ColumnKind::Boolean).len(),
    }
}

/// Min, Q1, median, Q3 and max of a numeric sample. Percentiles use
/// linear interpolation between order statistics. Non-finite values are
/// dropped; an empty sample has no meaningful percentile and is an error
/// the caller must guard.
pub fn five_number_summary(values: &[f64]) -> Result<FiveNumberSummary, DexError> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return Err(DexError::EmptyColumn);
    }
    sorted.sort_unstable_by(f64::total_cmp);

    Ok(FiveNumberSummary {
        min: sorted[0],
        q1: percentile(&sorted, 25.0),
        median: percentile(&sorted, 50.0),
        q3: percentile(&sorted, 75.0),
        max: sorted[sorted.len() - 1],
    })
}

/// Percentile of an already sorted, non-empty sample, with linear
/// interpolation for ranks that do not land exactly on an index.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty(), "percentile of empty sample");
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let weight = rank - lo as f64;
        sorted[lo] * (1.0 - weight) + sorted[hi] * weight
    }
}

/// Occurrence count per distinct value, ordered by descending count.
/// Ties keep the first-encountered order; the stable sort makes that hold.
pub fn value_counts<I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for value in values {
        match counts.get_mut(&value) {
            Some(c) => *c += 1,
            None => {
                counts.insert(value.clone(), 1);
                order.push(value);
            }
        }
    }

    let mut out: Vec<(String, usize)> = order
        .into_iter()
        .map(|v| {
            let c = counts[&v];
            (v, c)
        })
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

/// Equal-width histogram over `[min, max]` of the finite values.
/// A constant column gets a single unit-width bin holding everything.
pub fn histogram(values: &[f64], bins: usize) -> Result<Histogram, DexError> {
    let data: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if data.is_empty() || bins == 0 {
        return Err(DexError::EmptyColumn);
    }

    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    let bin_width = if span > 0.0 { span / bins as f64 } else { 1.0 };

    let mut counts = vec![0usize; bins];
    for v in data.iter() {
        let mut idx = ((v - min) / bin_width) as usize;
        if idx >= bins {
            idx = bins - 1;
        }
        counts[idx] += 1;
    }
    let edges = (0..=bins).map(|i| min + i as f64 * bin_width).collect();

    Ok(Histogram {
        edges,
        counts,
        bin_width,
    })
}

/// Gaussian kernel density estimate on an even grid over the data range,
/// with Scott's-rule bandwidth `std * n^(-1/5)`. Returns an empty curve
/// when there is no spread to estimate from.
pub fn density_curve(values: &[f64], grid: usize) -> Vec<(f64, f64)> {
    let data: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if data.len() < 2 || grid < 2 {
        return Vec::new();
    }
    let n = data.len() as f64;

    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = variance.sqrt();

    let bandwidth = std * n.powf(-0.2);
    if !(bandwidth > 0.0) {
        return Vec::new();
    }
    trace!("Density: n {}, bandwidth {}", data.len(), bandwidth);

    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * n * bandwidth);
    (0..grid)
        .map(|i| {
            let x = min + (max - min) * i as f64 / (grid - 1) as f64;
            let y = data
                .iter()
                .map(|xi| (-0.5 * ((x - xi) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                * norm;
            (x, y)
        })
        .collect()
}

/// Pairwise Pearson correlation over all numeric columns. Each pair is
/// computed over the rows where both values are present; pairs with fewer
/// than two complete rows or zero variance yield NaN. Rows of the matrix
/// are computed in parallel.
pub fn correlation_matrix(table: &Table) -> CorrelationMatrix {
    let ids = table.columns_of(ColumnKind::Numerical);
    let names: Vec<String> = ids.iter().map(|&i| table.columns[i].name.clone()).collect();
    let cols: Vec<&[Option<f64>]> = ids
        .iter()
        .filter_map(|&i| table.columns[i].numeric_options())
        .collect();

    let values: Vec<Vec<f64>> = (0..cols.len())
        .into_par_iter()
        .map(|i| (0..cols.len()).map(|j| pearson(cols[i], cols[j])).collect())
        .collect();

    CorrelationMatrix { names, values }
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b.iter())
        .filter_map(|(x, y)| x.zip(*y))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in pairs.iter() {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }
    let denom = (var_a * var_b).sqrt();
    if denom > 0.0 { cov / denom } else { f64::NAN }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, ColumnValues, Table};
    use polars::prelude::DataType;

    fn numeric_column(name: &str, values: Vec<Option<f64>>) -> Column {
        Column {
            name: name.to_string(),
            dtype: DataType::Float64,
            values: ColumnValues::Numeric(values),
        }
    }

    fn sample_table() -> Table {
        let age = numeric_column(
            "age",
            vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0), Some(50.0)],
        );
        let color = Column {
            name: "color".to_string(),
            dtype: DataType::String,
            values: ColumnValues::Text(
                ["red", "blue", "red", "green"]
                    .iter()
                    .map(|s| Some(s.to_string()))
                    .chain(std::iter::once(None))
                    .collect(),
            ),
        };
        let member = Column {
            name: "member".to_string(),
            dtype: DataType::Boolean,
            values: ColumnValues::Boolean(vec![
                Some(true),
                Some(false),
                Some(true),
                None,
                Some(true),
            ]),
        };
        Table {
            name: "sample".to_string(),
            nrows: 5,
            columns: vec![age, color, member],
        }
    }

    #[test]
    fn dataset_statistics_counts_columns_by_kind() {
        let stats = dataset_statistics(&sample_table());
        assert_eq!(stats.rows, 5);
        assert_eq!(stats.columns, 3);
        assert_eq!(stats.numerical, 1);
        assert_eq!(stats.categorical, 1);
        assert_eq!(stats.boolean, 1);
        assert!(stats.categorical + stats.numerical + stats.boolean <= stats.columns);
        let total: usize = stats.dtype_counts.iter().map(|(_, c)| c).sum();
        assert_eq!(total, stats.columns);
    }

    #[test]
    fn empty_table_yields_zero_counts() {
        let table = Table {
            name: "empty".to_string(),
            nrows: 0,
            columns: Vec::new(),
        };
        let stats = dataset_statistics(&table);
        assert_eq!(stats.rows, 0);
        assert_eq!(stats.columns, 0);
        assert!(stats.dtype_counts.is_empty());
    }

    #[test]
    fn five_number_summary_on_exact_quartiles() {
        let summary = five_number_summary(&[10.0, 20.0, 30.0, 40.0, 50.0]).unwrap();
        assert_eq!(summary.min, 10.0);
        assert_eq!(summary.q1, 20.0);
        assert_eq!(summary.median, 30.0);
        assert_eq!(summary.q3, 40.0);
        assert_eq!(summary.max, 50.0);
    }

    #[test]
    fn five_number_summary_interpolates() {
        let summary = five_number_summary(&[4.0, 2.0, 1.0, 3.0]).unwrap();
        assert!((summary.q1 - 1.75).abs() < 1e-12);
        assert!((summary.median - 2.5).abs() < 1e-12);
        assert!((summary.q3 - 3.25).abs() < 1e-12);
    }

    #[test]
    fn five_number_summary_is_ordered() {
        let summary = five_number_summary(&[3.5, -1.0, 7.2, 0.0, 3.5, 12.0, -4.4]).unwrap();
        assert!(summary.min <= summary.q1);
        assert!(summary.q1 <= summary.median);
        assert!(summary.median <= summary.q3);
        assert!(summary.q3 <= summary.max);
    }

    #[test]
    fn five_number_summary_of_empty_column_fails() {
        assert!(matches!(
            five_number_summary(&[]),
            Err(DexError::EmptyColumn)
        ));
        assert!(matches!(
            five_number_summary(&[f64::NAN]),
            Err(DexError::EmptyColumn)
        ));
    }

    #[test]
    fn value_counts_sorts_by_descending_count() {
        let counts = value_counts(
            ["red", "blue", "red", "green"]
                .iter()
                .map(|s| s.to_string()),
        );
        assert_eq!(
            counts,
            vec![
                ("red".to_string(), 2),
                ("blue".to_string(), 1),
                ("green".to_string(), 1),
            ]
        );
    }

    #[test]
    fn value_counts_ties_keep_first_encountered_order() {
        let counts = value_counts(["b", "a", "c", "a", "b", "c"].iter().map(|s| s.to_string()));
        assert_eq!(
            counts,
            vec![
                ("b".to_string(), 2),
                ("a".to_string(), 2),
                ("c".to_string(), 2),
            ]
        );
    }

    #[test]
    fn value_counts_sum_to_non_missing_entries() {
        let table = sample_table();
        let values = table.columns[1].text_values();
        let counts = value_counts(values.iter().cloned());
        let total: usize = counts.iter().map(|(_, c)| c).sum();
        assert_eq!(total, values.len());
        for w in counts.windows(2) {
            assert!(w[0].1 >= w[1].1);
        }
    }

    #[test]
    fn histogram_counts_cover_every_value() {
        let values = vec![1.0, 2.0, 2.5, 3.0, 3.5, 4.0, 9.9, 10.0];
        let hist = histogram(&values, 3).unwrap();
        assert_eq!(hist.counts.len(), 3);
        assert_eq!(hist.edges.len(), 4);
        assert_eq!(hist.counts.iter().sum::<usize>(), values.len());
        assert_eq!(hist.edges[0], 1.0);
        assert_eq!(hist.edges[3], 10.0);
    }

    #[test]
    fn histogram_of_constant_column_uses_one_bin_span() {
        let hist = histogram(&[2.0, 2.0, 2.0], 10).unwrap();
        assert_eq!(hist.counts.iter().sum::<usize>(), 3);
        assert_eq!(hist.counts[0], 3);
        assert_eq!(hist.bin_width, 1.0);
    }

    #[test]
    fn density_curve_is_finite_and_positive() {
        let values = vec![1.0, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0];
        let curve = density_curve(&values, 50);
        assert_eq!(curve.len(), 50);
        for (x, y) in curve.iter() {
            assert!(x.is_finite());
            assert!(y.is_finite());
            assert!(*y >= 0.0);
        }
        assert_eq!(curve[0].0, 1.0);
        assert_eq!(curve[49].0, 5.0);
    }

    #[test]
    fn density_bandwidth_follows_scotts_rule() {
        // Heavy tails: a robust bandwidth (IQR-based) would differ a lot
        // from the plain sample std here, so this pins the rule.
        let values = vec![-100.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 100.0];
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std =
            (values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
        let bandwidth = std * n.powf(-0.2);
        let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * n * bandwidth);

        let curve = density_curve(&values, 11);
        assert_eq!(curve.len(), 11);
        for (x, y) in curve {
            let expected = values
                .iter()
                .map(|xi| (-0.5 * ((x - xi) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                * norm;
            assert!((y - expected).abs() < 1e-12);
        }
    }

    #[test]
    #[should_panic(expected = "percentile of empty sample")]
    fn percentile_rejects_empty_sample() {
        percentile(&[], 50.0);
    }

    #[test]
    fn density_curve_of_constant_data_is_empty() {
        assert!(density_curve(&[3.0, 3.0, 3.0], 50).is_empty());
        assert!(density_curve(&[1.0], 50).is_empty());
    }

    #[test]
    fn correlation_of_column_with_itself_is_one() {
        let x = numeric_column("x", (0..10).map(|i| Some(i as f64)).collect());
        let y = numeric_column("y", (0..10).map(|i| Some(10.0 - i as f64)).collect());
        let table = Table {
            name: "corr".to_string(),
            nrows: 10,
            columns: vec![x, y],
        };
        let corr = correlation_matrix(&table);
        assert_eq!(corr.names, vec!["x", "y"]);
        assert!((corr.values[0][0] - 1.0).abs() < 1e-12);
        assert!((corr.values[1][1] - 1.0).abs() < 1e-12);
        assert!((corr.values[0][1] + 1.0).abs() < 1e-12);
        assert!((corr.values[0][1] - corr.values[1][0]).abs() < 1e-12);
    }

    #[test]
    fn correlation_skips_rows_with_missing_values() {
        let x = numeric_column("x", vec![Some(1.0), Some(2.0), None, Some(4.0)]);
        let y = numeric_column("y", vec![Some(2.0), Some(4.0), Some(100.0), Some(8.0)]);
        let table = Table {
            name: "corr".to_string(),
            nrows: 4,
            columns: vec![x, y],
        };
        let corr = correlation_matrix(&table);
        assert!((corr.values[0][1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn correlation_of_constant_column_is_nan() {
        let x = numeric_column("x", vec![Some(1.0), Some(2.0), Some(3.0)]);
        let c = numeric_column("c", vec![Some(5.0), Some(5.0), Some(5.0)]);
        let table = Table {
            name: "corr".to_string(),
            nrows: 3,
            columns: vec![x, c],
        };
        let corr = correlation_matrix(&table);
        assert!(corr.values[0][1].is_nan());
        assert!(corr.values[1][1].is_nan());
    }
}

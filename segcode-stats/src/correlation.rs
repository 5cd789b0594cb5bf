use rayon::prelude::*;

use segcode_core::models::{FeatureColumn, SegmentSet};

use crate::models::CorrelationMatrix;

///
/// Pearson product-moment correlation between `x` and `y`.
///
/// `NaN` when the series differ in length, have fewer than two observations
/// or either has zero variance.
///
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }

    let n = x.len() as f64;
    let mean_x: f64 = x.iter().sum::<f64>() / n;
    let mean_y: f64 = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    (cov / denom).clamp(-1.0, 1.0)
}

/// A column has a defined correlation with anything only if it varies.
fn is_degenerate(column: &[Option<f64>]) -> bool {
    let mut present = column.iter().flatten();
    match present.next() {
        None => true,
        Some(first) => present.clone().count() == 0 || present.all(|v| v == first),
    }
}

fn paired(x: &[Option<f64>], y: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y.iter())
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip()
}

///
/// Correlation matrix over the long segments of `set`.
///
/// Rows are computed in parallel; each row only fills its upper triangle
/// and the matrix is mirrored once all rows are done.
///
pub(crate) fn correlation_matrix(set: &SegmentSet, columns: &[FeatureColumn]) -> CorrelationMatrix {
    let observations: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|c| set.iter_long().map(|s| s.feature(&c.key)).collect())
        .collect();
    let degenerate: Vec<bool> = observations.iter().map(|o| is_degenerate(o)).collect();
    let n = columns.len();

    let upper: Vec<Vec<(usize, f64)>> = (0..n)
        .into_par_iter()
        .map(|i| {
            ((i + 1)..n)
                .map(|j| {
                    if degenerate[i] || degenerate[j] {
                        return (j, f64::NAN);
                    }
                    let (x, y) = paired(&observations[i], &observations[j]);
                    (j, pearson(&x, &y))
                })
                .collect()
        })
        .collect();

    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        if !degenerate[i] {
            values[i][i] = 1.0;
        }
        for &(j, r) in &upper[i] {
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    let degenerate_count = degenerate.iter().filter(|d| **d).count();
    if degenerate_count > 0 {
        log::debug!("{} constant feature columns in correlation", degenerate_count);
    }

    CorrelationMatrix {
        keys: columns.iter().map(|c| c.key.clone()).collect(),
        labels: columns.iter().map(|c| c.label.clone()).collect(),
        observations: set.iter_long().count(),
        values,
    }
}

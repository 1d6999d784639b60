//! Numerical utility functions

use nalgebra::DMatrix;

use super::EPS;

/// Euclidean norm of a vector
#[inline]
pub fn norm(x: &[f64]) -> f64 {
    x.iter().map(|&v| v * v).sum::<f64>().sqrt()
}

/// Squared Euclidean distance
#[inline]
pub fn squared_euclidean(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y.iter()).map(|(&a, &b)| (a - b).powi(2)).sum()
}

/// Normalize vector in place; near-zero vectors are left untouched
pub fn normalize_mut(x: &mut [f64]) {
    let n = norm(x);
    if n >= EPS {
        for v in x.iter_mut() {
            *v /= n;
        }
    }
}

/// Arithmetic mean, 0 for an empty slice
#[inline]
pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        0.0
    } else {
        x.iter().sum::<f64>() / x.len() as f64
    }
}

/// Peak-to-peak range `max − min`, 0 for an empty slice
pub fn value_range(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let (lo, hi) = x
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    hi - lo
}

/// Subtract the mean from every entry
pub fn center(x: &[f64]) -> Vec<f64> {
    let m = mean(x);
    x.iter().map(|&v| v - m).collect()
}

/// Scale each column of `m` to unit L2 norm in place.
/// All-zero columns stay zero.
pub fn normalize_columns_mut(m: &mut DMatrix<f64>) {
    for mut col in m.column_iter_mut() {
        let n = col.norm();
        if n >= EPS {
            col /= n;
        }
    }
}

/// Largest per-column range of `m`
pub fn max_column_range(m: &DMatrix<f64>) -> f64 {
    m.column_iter()
        .map(|col| col.max() - col.min())
        .fold(0.0, f64::max)
}

/// Integer power of a square matrix by repeated squaring; `A^0 = I`
pub fn matrix_power(a: &DMatrix<f64>, exponent: u32) -> DMatrix<f64> {
    let n = a.nrows();
    let mut result = DMatrix::identity(n, n);
    let mut base = a.clone();
    let mut e = exponent;

    while e > 0 {
        if e & 1 == 1 {
            result = &result * &base;
        }
        e >>= 1;
        if e > 0 {
            base = &base * &base;
        }
    }

    result
}

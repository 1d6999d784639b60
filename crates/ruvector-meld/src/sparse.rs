//! Compressed sparse row matrices for the sparse window representation.

use nalgebra::DMatrix;

use crate::utils::EPS;

/// Compressed Sparse Row matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    /// Offsets into `col_indices`/`values`, length `rows + 1`
    pub row_ptr: Vec<usize>,
    /// Column of each stored entry
    pub col_indices: Vec<usize>,
    /// Stored values
    pub values: Vec<f64>,
    /// Row count
    pub rows: usize,
    /// Column count
    pub cols: usize,
}

impl CsrMatrix {
    /// Build from `(row, col, value)` triplets. Duplicates are summed and
    /// explicit zeros dropped.
    pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, f64)]) -> Self {
        let mut entries: Vec<(usize, usize, f64)> = triplets
            .iter()
            .copied()
            .filter(|&(r, c, _)| r < rows && c < cols)
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut merged: Vec<(usize, usize, f64)> = Vec::with_capacity(entries.len());
        for (r, c, v) in entries {
            match merged.last_mut() {
                Some(last) if last.0 == r && last.1 == c => last.2 += v,
                _ => merged.push((r, c, v)),
            }
        }
        merged.retain(|&(_, _, v)| v != 0.0);

        Self::from_sorted_entries(rows, cols, &merged)
    }

    /// Keep the nonzero entries of a dense matrix.
    pub fn from_dense(m: &DMatrix<f64>) -> Self {
        let mut entries = Vec::new();
        for i in 0..m.nrows() {
            for j in 0..m.ncols() {
                let v = m[(i, j)];
                if v != 0.0 {
                    entries.push((i, j, v));
                }
            }
        }
        Self::from_sorted_entries(m.nrows(), m.ncols(), &entries)
    }

    fn from_sorted_entries(rows: usize, cols: usize, entries: &[(usize, usize, f64)]) -> Self {
        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_indices = Vec::with_capacity(entries.len());
        let mut values = Vec::with_capacity(entries.len());
        for &(r, c, v) in entries {
            row_ptr[r + 1] += 1;
            col_indices.push(c);
            values.push(v);
        }
        for i in 0..rows {
            row_ptr[i + 1] += row_ptr[i];
        }
        Self {
            row_ptr,
            col_indices,
            values,
            rows,
            cols,
        }
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate stored entries as `(row, col, value)`
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.rows).flat_map(move |i| {
            (self.row_ptr[i]..self.row_ptr[i + 1])
                .map(move |k| (i, self.col_indices[k], self.values[k]))
        })
    }

    /// Sparse matrix-vector product: y = A * x.
    pub fn spmv(&self, x: &[f64]) -> Vec<f64> {
        let mut y = vec![0.0; self.rows];
        for i in 0..self.rows {
            let (start, end) = (self.row_ptr[i], self.row_ptr[i + 1]);
            y[i] = (start..end)
                .map(|j| self.values[j] * x[self.col_indices[j]])
                .sum();
        }
        y
    }

    /// Sparse-dense product: Y = A * X.
    pub fn mul_dense(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let mut y = DMatrix::zeros(self.rows, x.ncols());
        for (i, j, v) in self.triplets() {
            for k in 0..x.ncols() {
                y[(i, k)] += v * x[(j, k)];
            }
        }
        y
    }

    /// Transpose, returned in CSR form.
    pub fn transpose(&self) -> Self {
        let mut entries: Vec<(usize, usize, f64)> =
            self.triplets().map(|(i, j, v)| (j, i, v)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        Self::from_sorted_entries(self.cols, self.rows, &entries)
    }

    /// Raise every stored entry to `exponent`; the sparsity pattern is kept.
    pub fn elementwise_powi(&self, exponent: i32) -> Self {
        Self {
            values: self.values.iter().map(|v| v.powi(exponent)).collect(),
            ..self.clone()
        }
    }

    /// Scale every row `i` by `scale[i]`.
    pub fn scale_rows(&self, scale: &[f64]) -> Self {
        let mut values = self.values.clone();
        for i in 0..self.rows {
            for k in self.row_ptr[i]..self.row_ptr[i + 1] {
                values[k] *= scale[i];
            }
        }
        Self {
            values,
            ..self.clone()
        }
    }

    /// L2 norm of each column.
    pub fn column_norms(&self) -> Vec<f64> {
        let mut sq = vec![0.0; self.cols];
        for (_, j, v) in self.triplets() {
            sq[j] += v * v;
        }
        sq.into_iter().map(f64::sqrt).collect()
    }

    /// Scale columns to unit L2 norm; empty columns stay empty.
    pub fn normalize_columns(&self) -> Self {
        let norms = self.column_norms();
        let values = self
            .col_indices
            .iter()
            .zip(self.values.iter())
            .map(|(&j, &v)| if norms[j] >= EPS { v / norms[j] } else { v })
            .collect();
        Self {
            values,
            ..self.clone()
        }
    }

    /// Dense copy.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut m = DMatrix::zeros(self.rows, self.cols);
        for (i, j, v) in self.triplets() {
            m[(i, j)] += v;
        }
        m
    }
}

//! Row-major dense matrix and the handful of operations cross interpolation needs

use crate::error::{MatrixCIError, Result};
use std::ops::{Index, IndexMut};

/// Simple 2D `f64` matrix backed by a row-major `Vec`
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    nrows: usize,
    ncols: usize,
}

impl Matrix {
    /// Create a zeros matrix
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![0.0; nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Create a matrix from row-major data
    pub fn from_row_major(nrows: usize, ncols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != nrows * ncols {
            return Err(MatrixCIError::DimensionMismatch {
                expected_rows: nrows,
                expected_cols: ncols,
                actual_rows: data.len() / ncols.max(1),
                actual_cols: ncols,
            });
        }
        Ok(Self { data, nrows, ncols })
    }

    /// Create a matrix whose entries are produced by `f(i, j)`
    pub fn from_fn(nrows: usize, ncols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(nrows * ncols);
        for i in 0..nrows {
            for j in 0..ncols {
                data.push(f(i, j));
            }
        }
        Self { data, nrows, ncols }
    }

    /// Number of rows
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Consume the matrix and return its row-major storage
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Largest absolute entry (0 for an empty matrix)
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |acc, v| acc.max(v.abs()))
    }

    /// Whether every entry is finite
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// Swap two rows in place
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for j in 0..self.ncols {
            self.data.swap(a * self.ncols + j, b * self.ncols + j);
        }
    }

    /// Swap two columns in place
    pub fn swap_cols(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for i in 0..self.nrows {
            self.data.swap(i * self.ncols + a, i * self.ncols + b);
        }
    }
}

impl Index<[usize; 2]> for Matrix {
    type Output = f64;

    fn index(&self, idx: [usize; 2]) -> &Self::Output {
        &self.data[idx[0] * self.ncols + idx[1]]
    }
}

impl IndexMut<[usize; 2]> for Matrix {
    fn index_mut(&mut self, idx: [usize; 2]) -> &mut Self::Output {
        &mut self.data[idx[0] * self.ncols + idx[1]]
    }
}

/// Create a zeros matrix with given dimensions
pub fn zeros(nrows: usize, ncols: usize) -> Matrix {
    Matrix::zeros(nrows, ncols)
}

/// Create a matrix from a 2D vector (row-major)
pub fn from_vec2d(rows: Vec<Vec<f64>>) -> Matrix {
    let nrows = rows.len();
    let ncols = rows.first().map_or(0, |r| r.len());
    Matrix::from_fn(nrows, ncols, |i, j| rows[i][j])
}

/// Transpose the matrix
pub fn transpose(m: &Matrix) -> Matrix {
    Matrix::from_fn(m.ncols, m.nrows, |i, j| m[[j, i]])
}

/// Position and value of the largest absolute entry in `a[k.., k..]`
pub fn submatrix_argmax(a: &Matrix, k: usize) -> (usize, usize, f64) {
    let mut best = (k, k, 0.0f64);
    for i in k..a.nrows {
        for j in k..a.ncols {
            let v = a[[i, j]];
            if v.abs() > best.2.abs() {
                best = (i, j, v);
            }
        }
    }
    best
}

/// Calculates A * B^{-1} by solving X B = A with partial pivoting
pub fn a_times_b_inv(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    if b.nrows != b.ncols || a.ncols != b.nrows {
        return Err(MatrixCIError::DimensionMismatch {
            expected_rows: a.ncols,
            expected_cols: a.ncols,
            actual_rows: b.nrows,
            actual_cols: b.ncols,
        });
    }
    // X B = A  <=>  B^T X^T = A^T
    let xt = solve_linear_system(&transpose(b), &transpose(a))?;
    Ok(transpose(&xt))
}

/// Solve AX = B using Gaussian elimination with partial pivoting
fn solve_linear_system(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    let n = a.nrows;
    let m = b.ncols;
    let scale = a.max_abs();

    let mut lhs = a.clone();
    let mut rhs = b.clone();

    for k in 0..n {
        let mut max_idx = k;
        for i in (k + 1)..n {
            if lhs[[i, k]].abs() > lhs[[max_idx, k]].abs() {
                max_idx = i;
            }
        }
        lhs.swap_rows(k, max_idx);
        rhs.swap_rows(k, max_idx);

        let pivot = lhs[[k, k]];
        if pivot == 0.0 || pivot.abs() <= f64::EPSILON * scale {
            return Err(MatrixCIError::SingularMatrix { step: k, pivot });
        }

        for i in (k + 1)..n {
            let factor = lhs[[i, k]] / pivot;
            if factor == 0.0 {
                continue;
            }
            for j in k..n {
                lhs[[i, j]] -= factor * lhs[[k, j]];
            }
            for j in 0..m {
                rhs[[i, j]] -= factor * rhs[[k, j]];
            }
        }
    }

    let mut x = zeros(n, m);
    for i in (0..n).rev() {
        for j in 0..m {
            let mut sum = rhs[[i, j]];
            for k in (i + 1)..n {
                sum -= lhs[[i, k]] * x[[k, j]];
            }
            x[[i, j]] = sum / lhs[[i, i]];
        }
    }
    Ok(x)
}

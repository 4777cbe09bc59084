//! Rank-Revealing LU decomposition (rrLU) with full pivoting

use crate::error::{MatrixCIError, Result};
use crate::matrix::{submatrix_argmax, Matrix};

/// Rank-Revealing LU decomposition
///
/// Represents a matrix A as:
/// P_row * A * P_col ≈ L * U
///
/// where P_row and P_col are permutation matrices and L has a unit
/// diagonal. Cross interpolation only needs the permutations: the first
/// `npivots` rows and columns they select span the approximation.
#[derive(Debug, Clone)]
pub struct RrLU {
    row_permutation: Vec<usize>,
    col_permutation: Vec<usize>,
    n_pivot: usize,
    /// Magnitude of the first rejected pivot, 0 when the factorization is exact
    error: f64,
}

impl RrLU {
    /// Number of pivots
    pub fn npivots(&self) -> usize {
        self.n_pivot
    }

    /// Selected pivot rows, in selection order
    pub fn row_indices(&self) -> Vec<usize> {
        self.row_permutation[..self.n_pivot].to_vec()
    }

    /// Selected pivot columns, in selection order
    pub fn col_indices(&self) -> Vec<usize> {
        self.col_permutation[..self.n_pivot].to_vec()
    }

    /// Magnitude of the largest entry left out of the factorization
    pub fn last_pivot_error(&self) -> f64 {
        self.error
    }
}

/// Options for rank-revealing LU decomposition
#[derive(Debug, Clone)]
pub struct RrLUOptions {
    /// Maximum rank
    pub max_rank: usize,
    /// Stop when the next pivot falls below `rel_tol` times the largest pivot
    pub rel_tol: f64,
    /// Stop when the next pivot falls below `abs_tol`
    pub abs_tol: f64,
}

impl Default for RrLUOptions {
    fn default() -> Self {
        Self {
            max_rank: usize::MAX,
            rel_tol: 1e-14,
            abs_tol: 0.0,
        }
    }
}

/// In-place rank-revealing LU decomposition
///
/// `a` is overwritten with the partially eliminated, permuted matrix.
fn rrlu_inplace(a: &mut Matrix, options: Option<RrLUOptions>) -> Result<RrLU> {
    let opts = options.unwrap_or_default();
    let nr = a.nrows();
    let nc = a.ncols();

    if !a.is_finite() {
        return Err(MatrixCIError::NonFinite {
            matrix: format!("{nr}x{nc} input"),
        });
    }

    let mut row_permutation: Vec<usize> = (0..nr).collect();
    let mut col_permutation: Vec<usize> = (0..nc).collect();
    let max_rank = opts.max_rank.min(nr).min(nc);
    let mut max_pivot = 0.0f64;
    let mut error = 0.0f64;

    let mut k = 0;
    while k < nr.min(nc) {
        let (pivot_row, pivot_col, pivot_val) = submatrix_argmax(a, k);
        let pivot_abs = pivot_val.abs();

        if k >= max_rank
            || pivot_abs == 0.0
            || (k > 0 && (pivot_abs < opts.rel_tol * max_pivot || pivot_abs < opts.abs_tol))
        {
            error = pivot_abs;
            break;
        }
        max_pivot = max_pivot.max(pivot_abs);

        a.swap_rows(k, pivot_row);
        row_permutation.swap(k, pivot_row);
        a.swap_cols(k, pivot_col);
        col_permutation.swap(k, pivot_col);

        let pivot = a[[k, k]];
        for i in (k + 1)..nr {
            a[[i, k]] /= pivot;
        }
        for i in (k + 1)..nr {
            let x = a[[i, k]];
            if x == 0.0 {
                continue;
            }
            for j in (k + 1)..nc {
                let y = a[[k, j]];
                a[[i, j]] -= x * y;
            }
        }

        k += 1;
    }

    if !a.is_finite() {
        return Err(MatrixCIError::NonFinite {
            matrix: "LU factors".to_string(),
        });
    }

    Ok(RrLU {
        row_permutation,
        col_permutation,
        n_pivot: k,
        error,
    })
}

/// Perform rank-revealing LU decomposition (non-destructive)
pub fn rrlu(a: &Matrix, options: Option<RrLUOptions>) -> Result<RrLU> {
    let mut a_copy = a.clone();
    rrlu_inplace(&mut a_copy, options)
}

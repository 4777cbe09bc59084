//! Error types for ttsobol-matrixci

use thiserror::Error;

/// Errors that can occur in the matrix kernels
#[derive(Debug, Error)]
pub enum MatrixCIError {
    /// Operand shapes do not agree
    #[error("Dimension mismatch: expected ({expected_rows}, {expected_cols}), got ({actual_rows}, {actual_cols})")]
    DimensionMismatch {
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    /// Pivot matrix is numerically singular
    #[error("Singular pivot matrix: |pivot| = {pivot:e} at step {step}")]
    SingularMatrix { step: usize, pivot: f64 },

    /// NaN or infinite values encountered
    #[error("Non-finite values encountered in {matrix}")]
    NonFinite { matrix: String },
}

/// Result type for matrix operations
pub type Result<T> = std::result::Result<T, MatrixCIError>;

//! Error types for tensor cross interpolation operations

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use ttsobol_tensortrain::{MultiIndex, TensorTrain};

use crate::crossinterp::CrossDiagnostics;

/// Result type for TCI operations
pub type Result<T> = std::result::Result<T, TCIError>;

/// The budget limit that stopped a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BudgetLimit {
    /// Cap on distinct function evaluations
    Evaluations(usize),
    /// Cap on wall-clock time
    Duration(Duration),
}

impl fmt::Display for BudgetLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetLimit::Evaluations(n) => write!(f, "{n} evaluations"),
            BudgetLimit::Duration(d) => write!(f, "{:.3}s wall-clock", d.as_secs_f64()),
        }
    }
}

/// Errors that can occur during tensor cross interpolation operations
#[derive(Error, Debug)]
pub enum TCIError {
    /// Dimension mismatch
    #[error("Dimension mismatch: {message}")]
    DimensionMismatch { message: String },

    /// A site has fewer than two local indices
    #[error("Site {site} has fewer than two grid points")]
    DegenerateAxis { site: usize },

    /// Sweeps exhausted before the tolerance was met
    #[error(
        "Failed to converge after {} sweeps (error {:.3e})",
        .diagnostics.sweeps,
        .diagnostics.error
    )]
    Convergence {
        diagnostics: Box<CrossDiagnostics>,
        partial: Box<TensorTrain>,
    },

    /// The evaluation or time budget ran out
    #[error("Budget exceeded: {limit}")]
    BudgetExceeded {
        limit: BudgetLimit,
        diagnostics: Box<CrossDiagnostics>,
        partial: Box<TensorTrain>,
    },

    /// The function returned NaN or an infinity
    #[error("Non-finite function value at {index:?}")]
    NonFiniteValue { index: MultiIndex },

    /// Matrix CI error
    #[error("Matrix CI error: {0}")]
    MatrixCIError(#[from] ttsobol_matrixci::MatrixCIError),

    /// Tensor train error
    #[error("Tensor train error: {0}")]
    TensorTrainError(#[from] ttsobol_tensortrain::TensorTrainError),
}

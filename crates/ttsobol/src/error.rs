//! Error types for sensitivity analysis

use thiserror::Error;
use ttsobol_grids::GridError;
use ttsobol_tensorci::{BudgetLimit, CrossDiagnostics, TCIError};
use ttsobol_tensortrain::{TensorTrain, TensorTrainError};

/// Result type for sensitivity analysis
pub type Result<T> = std::result::Result<T, SensitivityError>;

/// Errors surfaced by `build_metrics`, `query` and friends
#[derive(Error, Debug)]
pub enum SensitivityError {
    /// Malformed axis or catalog
    #[error("Invalid axis: {message}")]
    InvalidAxis { message: String },

    /// Sweeps ran out before the tolerance was met
    #[error(
        "Cross approximation did not converge after {} sweeps (error {:.3e})",
        .diagnostics.sweeps,
        .diagnostics.error
    )]
    Convergence {
        diagnostics: Box<CrossDiagnostics>,
        partial: Box<TensorTrain>,
    },

    /// An axis carries no variation
    #[error("Axis '{axis}' has no variation over its grid")]
    DegenerateAxis { axis: String },

    /// Variance is not positive, or an index left [0, 1] by more than the tolerance
    #[error("Numeric instability: {message}")]
    NumericInstability { message: String },

    /// Malformed query
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    /// Evaluation or time budget spent; the partial surrogate is kept
    #[error(
        "Budget exceeded ({limit}) after {} evaluations",
        .diagnostics.evaluations
    )]
    BudgetExceeded {
        limit: BudgetLimit,
        diagnostics: Box<CrossDiagnostics>,
        partial: Box<TensorTrain>,
    },

    /// Malformed configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl SensitivityError {
    pub(crate) fn invalid_query(message: impl Into<String>) -> Self {
        SensitivityError::InvalidQuery {
            message: message.into(),
        }
    }

    pub(crate) fn numeric(message: impl Into<String>) -> Self {
        SensitivityError::NumericInstability {
            message: message.into(),
        }
    }

    /// Lift a cross interpolation error, naming axes by `names`
    pub(crate) fn from_cross(err: TCIError, names: &[String]) -> Self {
        match err {
            TCIError::DegenerateAxis { site } => SensitivityError::DegenerateAxis {
                axis: names.get(site).cloned().unwrap_or_else(|| format!("#{site}")),
            },
            TCIError::Convergence {
                diagnostics,
                partial,
            } => SensitivityError::Convergence {
                diagnostics,
                partial,
            },
            TCIError::BudgetExceeded {
                limit,
                diagnostics,
                partial,
            } => SensitivityError::BudgetExceeded {
                limit,
                diagnostics,
                partial,
            },
            TCIError::NonFiniteValue { index } => {
                Self::numeric(format!("model returned a non-finite value at grid point {index:?}"))
            }
            other => Self::numeric(other.to_string()),
        }
    }
}

impl From<GridError> for SensitivityError {
    fn from(err: GridError) -> Self {
        match err {
            GridError::DegenerateAxis { axis } => SensitivityError::DegenerateAxis { axis },
            other => SensitivityError::InvalidAxis {
                message: other.to_string(),
            },
        }
    }
}

impl From<TCIError> for SensitivityError {
    fn from(err: TCIError) -> Self {
        Self::from_cross(err, &[])
    }
}

impl From<TensorTrainError> for SensitivityError {
    fn from(err: TensorTrainError) -> Self {
        Self::numeric(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_errors_map_to_axis_errors() {
        let e: SensitivityError = GridError::DuplicateAxisName("x".into()).into();
        assert!(matches!(e, SensitivityError::InvalidAxis { .. }));
        assert!(e.to_string().contains("duplicate: x"));

        let e: SensitivityError = GridError::DegenerateAxis { axis: "y".into() }.into();
        assert!(matches!(e, SensitivityError::DegenerateAxis { axis } if axis == "y"));
    }

    #[test]
    fn test_cross_errors_use_axis_names() {
        let names = vec!["a".to_string(), "b".to_string()];
        let e = SensitivityError::from_cross(TCIError::DegenerateAxis { site: 1 }, &names);
        assert!(matches!(e, SensitivityError::DegenerateAxis { axis } if axis == "b"));

        let e = SensitivityError::from_cross(TCIError::NonFiniteValue { index: vec![0, 3] }, &names);
        assert!(matches!(e, SensitivityError::NumericInstability { .. }));
    }
}

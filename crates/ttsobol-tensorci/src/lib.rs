//! Tensor Cross Interpolation (TCI) library
//!
//! This crate builds tensor train surrogates of functions defined on a
//! discrete grid by adaptive two-site cross interpolation.
//!
//! # Main pieces
//!
//! - `crossinterpolate`: sweep pivots until the surrogate stops changing
//! - `CrossOptions`: tolerance, sweep and rank limits, seed, budget
//! - `CachedFunction`: evaluation cache counting distinct function calls
//!
//! # Example
//!
//! ```
//! use ttsobol_tensorci::{crossinterpolate, CrossOptions, MultiIndex};
//!
//! // f(i, j) = (i + 1) * (j + 1) has rank one
//! let f = |idx: &MultiIndex| ((idx[0] + 1) * (idx[1] + 1)) as f64;
//! let options = CrossOptions::default().with_seed(0);
//!
//! let (tt, diagnostics) =
//!     crossinterpolate(f, None::<fn(&[MultiIndex]) -> Vec<f64>>, &[5, 5], &options).unwrap();
//! assert_eq!(tt.rank(), 1);
//! println!("evaluations: {}", diagnostics.evaluations);
//! ```

pub mod cached_function;
pub mod crossinterp;
pub mod error;
pub mod options;

pub use cached_function::CachedFunction;
pub use crossinterp::{crossinterpolate, CrossDiagnostics};
pub use error::{BudgetLimit, Result, TCIError};
pub use options::{CrossOptions, EvaluationBudget, NonConvergencePolicy};
pub use ttsobol_tensortrain::{LocalIndex, MultiIndex};

//! Variance-based global sensitivity analysis
//!
//! A model of continuous inputs is discretized on a grid, compressed into a
//! tensor train by cross interpolation, and the variance of that surrogate
//! is split into Sobol indices of every variable subset up to a chosen
//! interaction order.
//!
//! # Main pieces
//!
//! - `build_metrics`: surrogate plus closed, total and superset indices
//! - `query`: filter and rank one index family
//! - `tabulate`: text reports of a metrics collection
//!
//! # Example
//!
//! ```
//! use ttsobol::{build_metrics, query, IndexFamily, SensitivityConfig, SobolQuery};
//! use ttsobol_grids::{Axis, AxisCatalog};
//!
//! let catalog = AxisCatalog::new(vec![
//!     Axis::interval("x", -1.0, 1.0),
//!     Axis::interval("y", -1.0, 1.0),
//! ])
//! .unwrap();
//! let config = SensitivityConfig::default().with_bins(10).with_seed(0);
//! let metrics = build_metrics(|v: &[f64]| v[0] + 0.1 * v[0] * v[1], &catalog, &config).unwrap();
//!
//! let top = query(&metrics, &SobolQuery::new(IndexFamily::Closed).with_max_order(1)).unwrap();
//! assert_eq!(top[0].0.indices(), &[0]);
//! ```

pub mod config;
pub mod decomposition;
pub mod error;
pub mod metrics;
pub mod oracle;
pub mod query;
pub mod subset;
pub mod tabulate;

pub use config::SensitivityConfig;
pub use decomposition::{decompose, SobolIndices};
pub use error::{Result, SensitivityError};
pub use metrics::{build_metrics, SensitivityMetrics};
pub use oracle::{DiscretizedOracle, EvaluationCounter};
pub use query::{query, IndexFamily, QueryResult, SelectionMode, SobolQuery, VariableRef};
pub use subset::VariableSubset;
pub use tabulate::{tabulate, TableFormat};
pub use ttsobol_tensorci::{BudgetLimit, CrossDiagnostics, NonConvergencePolicy};

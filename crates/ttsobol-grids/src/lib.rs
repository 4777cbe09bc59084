//! Input axes and their discretization
//!
//! An [`AxisCatalog`] describes the independent inputs of a model: bounded
//! intervals, named marginal distributions, or explicit probability mass
//! functions. [`AxisCatalog::discretize`] reduces every axis to a small set
//! of representative coordinates ("ticks") with probabilities, giving a
//! [`DiscreteGrid`] whose product measure stands in for the joint input
//! distribution.

pub mod axis;
pub mod catalog;
pub mod discrete_grid;
pub mod error;

pub use axis::{Axis, Domain, Marginal, Sampling, PMF_TOLERANCE};
pub use catalog::AxisCatalog;
pub use discrete_grid::DiscreteGrid;
pub use error::{GridError, Result};

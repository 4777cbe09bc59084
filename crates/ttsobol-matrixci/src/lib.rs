//! Matrix kernels for tensor cross interpolation
//!
//! This crate provides the dense building blocks used by the cross
//! approximation engine:
//! - `Matrix`: a small row-major `f64` matrix
//! - `rrlu`: rank-revealing LU decomposition with full pivoting, used to
//!   select pivot rows and columns of a sampled matrix
//! - `a_times_b_inv`: the pivot-matrix solve used when a tensor train is
//!   assembled from its pivots
//!
//! # Example
//!
//! ```
//! use ttsobol_matrixci::{from_vec2d, rrlu, RrLUOptions};
//!
//! let m = from_vec2d(vec![
//!     vec![1.0, 2.0, 3.0],
//!     vec![2.0, 4.0, 6.0],
//!     vec![3.0, 6.0, 9.0],
//! ]);
//!
//! let lu = rrlu(&m, Some(RrLUOptions::default())).unwrap();
//! assert_eq!(lu.npivots(), 1);
//! ```

pub mod error;
pub mod matrix;
pub mod matrixlu;

pub use error::{MatrixCIError, Result};
pub use matrix::{a_times_b_inv, from_vec2d, zeros, Matrix};
pub use matrixlu::{rrlu, RrLU, RrLUOptions};

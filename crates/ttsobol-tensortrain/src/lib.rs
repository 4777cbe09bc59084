//! Tensor Train library
//!
//! This crate provides the surrogate representation used throughout ttsobol:
//! - `TensorTrain`: d three-leg cores stored in one contiguous arena, with the
//!   bond ranks kept alongside
//! - `Tensor3`: an owned three-leg tensor used while building cores
//! - `WeightedContraction`: mean, second moment and conditional second
//!   moments of a tensor train under a product probability measure
//!
//! # Example
//!
//! ```
//! use ttsobol_tensortrain::{TensorTrain, WeightedContraction};
//!
//! // Constant tensor train on a 2 x 3 grid
//! let tt = TensorTrain::constant(&[2, 3], 4.0);
//! assert_eq!(tt.evaluate(&[1, 2]).unwrap(), 4.0);
//! assert_eq!(tt.rank(), 1);
//!
//! let weights = vec![vec![0.5, 0.5], vec![0.2, 0.3, 0.5]];
//! let measured = WeightedContraction::new(&tt, &weights).unwrap();
//! assert!((measured.mean() - 4.0).abs() < 1e-12);
//! ```

pub mod contraction;
pub mod error;
pub mod tensortrain;
pub mod types;

pub use contraction::WeightedContraction;
pub use error::{Result, TensorTrainError};
pub use tensortrain::{CoreView, TensorTrain};
pub use types::{LocalIndex, MultiIndex, Tensor3};

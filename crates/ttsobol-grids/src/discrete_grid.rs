//! Discretized product grid with per-axis coordinates and probabilities

use std::fmt;

use crate::error::{GridError, Result};

/// A discretized input space
///
/// Axis `k` has `local_dimensions()[k]` ticks. Tick `i` stands for the
/// coordinate `ticks(k)[i]` and carries probability `weights(k)[i]`; the
/// joint measure is the product of the per-axis weights.
///
/// # Example
/// ```
/// use ttsobol_grids::{Axis, AxisCatalog};
///
/// let catalog = AxisCatalog::new(vec![
///     Axis::interval("x", 0.0, 1.0),
///     Axis::interval("y", -1.0, 1.0).with_bins(4),
/// ])
/// .unwrap();
/// let grid = catalog.discretize(2, 0, 16).unwrap();
///
/// assert_eq!(grid.local_dimensions(), vec![2, 4]);
/// assert_eq!(grid.coordinate(&[1, 0]).unwrap(), vec![0.75, -0.75]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteGrid {
    names: Vec<String>,
    ticks: Vec<Vec<f64>>,
    weights: Vec<Vec<f64>>,
}

impl DiscreteGrid {
    pub(crate) fn new(names: Vec<String>, ticks: Vec<Vec<f64>>, weights: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(names.len(), ticks.len());
        debug_assert_eq!(ticks.len(), weights.len());
        Self {
            names,
            ticks,
            weights,
        }
    }

    /// Number of axes
    pub fn ndims(&self) -> usize {
        self.ticks.len()
    }

    /// Axis names in variable order
    pub fn variable_names(&self) -> &[String] {
        &self.names
    }

    /// Number of ticks per axis
    pub fn local_dimensions(&self) -> Vec<usize> {
        self.ticks.iter().map(|t| t.len()).collect()
    }

    /// Coordinates of axis `dim`
    pub fn ticks(&self, dim: usize) -> &[f64] {
        &self.ticks[dim]
    }

    /// Probabilities of axis `dim`
    pub fn weights(&self, dim: usize) -> &[f64] {
        &self.weights[dim]
    }

    /// Probabilities of every axis
    pub fn all_weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    /// Number of grid points, as a float since it overflows quickly
    pub fn num_points(&self) -> f64 {
        self.ticks.iter().map(|t| t.len() as f64).product()
    }

    /// Check a grid point against the grid shape
    pub fn validate_index(&self, index: &[usize]) -> Result<()> {
        if index.len() != self.ndims() {
            return Err(GridError::DimensionMismatch {
                expected: self.ndims(),
                actual: index.len(),
            });
        }
        for (dim, (&i, ticks)) in index.iter().zip(&self.ticks).enumerate() {
            if i >= ticks.len() {
                return Err(GridError::GridIndexOutOfBounds {
                    dim,
                    value: i,
                    max: ticks.len(),
                });
            }
        }
        Ok(())
    }

    /// Continuous coordinates of a grid point
    pub fn coordinate(&self, index: &[usize]) -> Result<Vec<f64>> {
        self.validate_index(index)?;
        Ok(index
            .iter()
            .zip(&self.ticks)
            .map(|(&i, ticks)| ticks[i])
            .collect())
    }

    /// Write the coordinates of an already validated grid point into `out`
    pub fn coordinate_into(&self, index: &[usize], out: &mut Vec<f64>) {
        out.clear();
        out.extend(index.iter().zip(&self.ticks).map(|(&i, ticks)| ticks[i]));
    }
}

impl fmt::Display for DiscreteGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DiscreteGrid with {} axes:", self.ndims())?;
        for (name, ticks) in self.names.iter().zip(&self.ticks) {
            let (lo, hi) = ticks
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| (lo.min(t), hi.max(t)));
            writeln!(f, "  {name}: {} ticks in [{lo:.6e}, {hi:.6e}]", ticks.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> DiscreteGrid {
        DiscreteGrid::new(
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 2.0], vec![10.0, 20.0, 30.0]],
            vec![vec![0.5, 0.5], vec![0.2, 0.3, 0.5]],
        )
    }

    #[test]
    fn test_coordinate_mapping() {
        let g = grid();
        assert_eq!(g.coordinate(&[1, 2]).unwrap(), vec![2.0, 30.0]);
        let mut out = Vec::new();
        g.coordinate_into(&[0, 1], &mut out);
        assert_eq!(out, vec![1.0, 20.0]);
        assert_eq!(g.num_points(), 6.0);
    }

    #[test]
    fn test_coordinate_errors() {
        let g = grid();
        assert_eq!(
            g.coordinate(&[0, 3]),
            Err(GridError::GridIndexOutOfBounds {
                dim: 1,
                value: 3,
                max: 3
            })
        );
        assert_eq!(
            g.coordinate(&[0]),
            Err(GridError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_display() {
        let s = format!("{}", grid());
        assert!(s.contains("2 axes"));
        assert!(s.contains("b: 3 ticks"));
    }
}

//! Grid-index view of a model of continuous inputs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use ttsobol_grids::{DiscreteGrid, GridError};
use ttsobol_tensortrain::MultiIndex;

/// Read-only handle on an oracle's evaluation count
#[derive(Debug, Clone)]
pub struct EvaluationCounter(Arc<AtomicUsize>);

impl EvaluationCounter {
    /// Evaluations so far
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

/// A model `f(&[f64]) -> f64` evaluated on the points of a [`DiscreteGrid`]
///
/// Each grid index is mapped to its axis tick, so a fixed grid (and thus a
/// fixed seed) always sends the same coordinates to the model.
pub struct DiscretizedOracle<'a, F> {
    function: F,
    grid: &'a DiscreteGrid,
    evaluations: Arc<AtomicUsize>,
    first_error: Mutex<Option<GridError>>,
}

impl<'a, F> DiscretizedOracle<'a, F>
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    /// Wrap `function` over `grid`
    pub fn new(function: F, grid: &'a DiscreteGrid) -> Self {
        Self {
            function,
            grid,
            evaluations: Arc::new(AtomicUsize::new(0)),
            first_error: Mutex::new(None),
        }
    }

    /// The grid the oracle maps indices through
    pub fn grid(&self) -> &DiscreteGrid {
        self.grid
    }

    /// Evaluate the model at one grid point
    pub fn evaluate(&self, index: &[usize]) -> Result<f64, GridError> {
        self.grid.validate_index(index)?;
        Ok(self.evaluate_valid(index))
    }

    /// Evaluate the model at many grid points, preserving order
    ///
    /// All points are checked before the first model call.
    pub fn evaluate_batch(&self, indices: &[MultiIndex]) -> Result<Vec<f64>, GridError> {
        for index in indices {
            self.grid.validate_index(index)?;
        }

        #[cfg(feature = "parallel")]
        let values = indices
            .par_iter()
            .map(|index| self.evaluate_valid(index))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let values = indices
            .iter()
            .map(|index| self.evaluate_valid(index))
            .collect();

        Ok(values)
    }

    /// Like [`evaluate`](Self::evaluate), for callers that need a plain
    /// value: an off-grid point yields NaN and its error is kept for
    /// [`take_error`](Self::take_error)
    pub fn evaluate_or_record(&self, index: &[usize]) -> f64 {
        self.evaluate(index).unwrap_or_else(|err| self.record(err))
    }

    /// Batch form of [`evaluate_or_record`](Self::evaluate_or_record)
    pub fn evaluate_batch_or_record(&self, indices: &[MultiIndex]) -> Vec<f64> {
        self.evaluate_batch(indices).unwrap_or_else(|err| {
            self.record(err);
            vec![f64::NAN; indices.len()]
        })
    }

    /// The first error recorded since the last call
    pub fn take_error(&self) -> Option<GridError> {
        self.first_error.lock().ok().and_then(|mut slot| slot.take())
    }

    fn record(&self, err: GridError) -> f64 {
        if let Ok(mut slot) = self.first_error.lock() {
            slot.get_or_insert(err);
        }
        f64::NAN
    }

    fn evaluate_valid(&self, index: &[usize]) -> f64 {
        let mut coord = Vec::with_capacity(index.len());
        self.grid.coordinate_into(index, &mut coord);
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        (self.function)(&coord)
    }

    /// Model evaluations so far
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Handle that keeps reporting the count after the oracle is gone
    pub fn counter(&self) -> EvaluationCounter {
        EvaluationCounter(Arc::clone(&self.evaluations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttsobol_grids::{Axis, AxisCatalog};

    fn grid() -> DiscreteGrid {
        AxisCatalog::new(vec![
            Axis::interval("x", 0.0, 1.0).with_bins(2),
            Axis::interval("y", 0.0, 10.0).with_bins(5),
        ])
        .unwrap()
        .discretize(2, 0, 1)
        .unwrap()
    }

    #[test]
    fn test_maps_indices_to_ticks() {
        let g = grid();
        let oracle = DiscretizedOracle::new(|x: &[f64]| x[0] + x[1], &g);
        assert_eq!(oracle.evaluate(&[1, 4]).unwrap(), 0.75 + 9.0);
        assert_eq!(oracle.evaluations(), 1);
    }

    #[test]
    fn test_batch_preserves_order_and_counts() {
        let g = grid();
        let oracle = DiscretizedOracle::new(|x: &[f64]| x[1], &g);
        let counter = oracle.counter();
        let values = oracle
            .evaluate_batch(&[vec![0, 4], vec![1, 0], vec![0, 2]])
            .unwrap();
        assert_eq!(values, vec![9.0, 1.0, 5.0]);
        assert_eq!(counter.get(), 3);
    }

    #[test]
    fn test_rejects_points_off_the_grid() {
        let g = grid();
        let oracle = DiscretizedOracle::new(|x: &[f64]| x[0], &g);
        assert!(oracle.evaluate(&[2, 0]).is_err());
        assert!(oracle.evaluate_batch(&[vec![0, 0], vec![0]]).is_err());
        assert_eq!(oracle.evaluations(), 0);
    }

    #[test]
    fn test_off_grid_error_is_kept() {
        let g = grid();
        let oracle = DiscretizedOracle::new(|x: &[f64]| x[0], &g);
        assert_eq!(oracle.evaluate_or_record(&[1, 1]), 0.75);
        assert!(oracle.take_error().is_none());

        assert!(oracle.evaluate_or_record(&[0, 7]).is_nan());
        let values = oracle.evaluate_batch_or_record(&[vec![0, 0], vec![3, 0]]);
        assert!(values.iter().all(|v| v.is_nan()));

        // the first error wins
        assert!(matches!(
            oracle.take_error(),
            Some(GridError::GridIndexOutOfBounds { dim: 1, value: 7, .. })
        ));
        assert!(oracle.take_error().is_none());
    }
}

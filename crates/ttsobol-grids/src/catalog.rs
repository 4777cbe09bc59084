//! Ordered collection of input axes

use std::collections::HashSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::axis::Axis;
use crate::discrete_grid::DiscreteGrid;
use crate::error::{GridError, Result};

/// Per-axis stream seed, so axis k's ticks do not depend on the other axes
fn axis_seed(seed: u64, axis: usize) -> u64 {
    seed ^ (axis as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Validated, ordered list of axes; the order defines variable indices
#[derive(Debug, Clone, PartialEq)]
pub struct AxisCatalog {
    axes: Vec<Axis>,
}

impl AxisCatalog {
    /// Validate and wrap `axes`
    pub fn new(axes: Vec<Axis>) -> Result<Self> {
        if axes.is_empty() {
            return Err(GridError::EmptyCatalog);
        }
        let mut seen = HashSet::new();
        for axis in &axes {
            if !seen.insert(axis.name()) {
                return Err(GridError::DuplicateAxisName(axis.name().to_string()));
            }
            axis.validate()?;
        }
        Ok(Self { axes })
    }

    /// Number of axes
    pub fn len(&self) -> usize {
        self.axes.len()
    }

    /// Always false; construction rejects empty catalogs
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Axes in variable order
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Axis names in variable order
    pub fn names(&self) -> Vec<String> {
        self.axes.iter().map(|a| a.name().to_string()).collect()
    }

    /// Variable index of the axis called `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.axes.iter().position(|a| a.name() == name)
    }

    /// Reduce every axis to ticks and probabilities
    ///
    /// Axes without an explicit bin count use `default_bins`. Stochastic
    /// axes draw `samples_per_bin` samples per bin from a `ChaCha8Rng`
    /// seeded by `seed` and the axis position, so a given seed always maps
    /// a grid point to the same coordinates.
    pub fn discretize(
        &self,
        default_bins: usize,
        seed: u64,
        samples_per_bin: usize,
    ) -> Result<DiscreteGrid> {
        let mut ticks = Vec::with_capacity(self.len());
        let mut weights = Vec::with_capacity(self.len());
        for (k, axis) in self.axes.iter().enumerate() {
            let mut rng = ChaCha8Rng::seed_from_u64(axis_seed(seed, k));
            let t = axis.discretize(default_bins, &mut rng, samples_per_bin)?;
            ticks.push(t.ticks);
            weights.push(t.weights);
        }
        Ok(DiscreteGrid::new(self.names(), ticks, weights))
    }
}

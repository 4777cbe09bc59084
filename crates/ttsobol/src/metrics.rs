//! Building the metrics collection of a model

use std::collections::BTreeMap;

use rand::Rng;
use tracing::{debug, info};
use ttsobol_grids::{AxisCatalog, DiscreteGrid};
use ttsobol_tensorci::{crossinterpolate, CrossDiagnostics, MultiIndex};
use ttsobol_tensortrain::TensorTrain;

use crate::config::SensitivityConfig;
use crate::decomposition::{decompose, SobolIndices};
use crate::error::{Result, SensitivityError};
use crate::oracle::DiscretizedOracle;
use crate::query::IndexFamily;
use crate::subset::VariableSubset;

/// Sobol indices of a model together with the surrogate they came from
///
/// Immutable once built. Equality ignores the wall-clock time recorded in
/// the diagnostics, so two runs with the same seed compare equal.
#[derive(Debug, Clone)]
pub struct SensitivityMetrics {
    variables: Vec<String>,
    surrogate: TensorTrain,
    grid: DiscreteGrid,
    indices: SobolIndices,
    zero_tolerance: f64,
    diagnostics: CrossDiagnostics,
    evaluations: usize,
    seed: u64,
}

impl SensitivityMetrics {
    /// Variable names in axis order
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Number of input variables
    pub fn ndims(&self) -> usize {
        self.variables.len()
    }

    /// Tensor train surrogate of the model on the grid
    pub fn surrogate(&self) -> &TensorTrain {
        &self.surrogate
    }

    /// Grid the surrogate is defined on
    pub fn grid(&self) -> &DiscreteGrid {
        &self.grid
    }

    /// All three index families
    pub fn indices(&self) -> &SobolIndices {
        &self.indices
    }

    pub fn closed(&self) -> &BTreeMap<VariableSubset, f64> {
        self.indices.closed()
    }

    pub fn total(&self) -> &BTreeMap<VariableSubset, f64> {
        self.indices.total()
    }

    pub fn superset(&self) -> &BTreeMap<VariableSubset, f64> {
        self.indices.superset()
    }

    /// The mapping of one family
    pub fn index(&self, family: IndexFamily) -> &BTreeMap<VariableSubset, f64> {
        match family {
            IndexFamily::Closed => self.closed(),
            IndexFamily::Total => self.total(),
            IndexFamily::Superset => self.superset(),
        }
    }

    /// Position of a variable by name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v == name)
    }

    pub fn mean(&self) -> f64 {
        self.indices.mean()
    }

    pub fn variance(&self) -> f64 {
        self.indices.variance()
    }

    pub fn std_dev(&self) -> f64 {
        self.indices.variance().sqrt()
    }

    /// Largest subset size with explicit indices
    pub fn max_order(&self) -> usize {
        self.indices.max_order()
    }

    /// Values closer than this to zero were reported as zero
    pub fn zero_tolerance(&self) -> f64 {
        self.zero_tolerance
    }

    /// Variance share of interactions above `max_order`
    pub fn residual(&self) -> f64 {
        let explained: f64 = self.closed().values().sum();
        let r = 1.0 - explained;
        if r < self.zero_tolerance {
            0.0
        } else {
            r.min(1.0)
        }
    }

    /// Variance share per interaction order, indexed `0..=max_order`
    ///
    /// Entry 0 is always zero. The remainder is [`Self::residual`].
    pub fn dimension_distribution(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.max_order() + 1];
        for (s, v) in self.closed() {
            out[s.len()] += v;
        }
        out
    }

    /// Mean superposition dimension, the sum of first-order total indices
    pub fn mean_dimension(&self) -> f64 {
        self.indices.mean_dimension()
    }

    /// Model evaluations spent building the surrogate
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Seed actually used, also when none was configured
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn diagnostics(&self) -> &CrossDiagnostics {
        &self.diagnostics
    }
}

impl PartialEq for SensitivityMetrics {
    fn eq(&self, other: &Self) -> bool {
        let timeless = |d: &CrossDiagnostics| CrossDiagnostics {
            elapsed: Default::default(),
            ..d.clone()
        };
        self.variables == other.variables
            && self.surrogate == other.surrogate
            && self.grid == other.grid
            && self.indices == other.indices
            && self.zero_tolerance == other.zero_tolerance
            && self.evaluations == other.evaluations
            && self.seed == other.seed
            && timeless(&self.diagnostics) == timeless(&other.diagnostics)
    }
}

/// Build a surrogate of `function` over `catalog` and decompose its variance
///
/// `function` receives one coordinate per axis, in catalog order. With
/// `random_seed` set the result is reproducible bit for bit.
pub fn build_metrics<F>(
    function: F,
    catalog: &AxisCatalog,
    config: &SensitivityConfig,
) -> Result<SensitivityMetrics>
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    config.validate()?;
    let seed = config.random_seed.unwrap_or_else(|| rand::rng().random());

    let grid = catalog.discretize(config.bins, seed, config.mc_samples_per_bin)?;
    let variables = grid.variable_names().to_vec();
    let local_dims = grid.local_dimensions();
    debug!(seed, dims = ?local_dims, "discretized axis catalog");

    let options = config.cross_options(seed);
    let (surrogate, diagnostics, evaluations) = {
        let oracle = DiscretizedOracle::new(function, &grid);
        let result = crossinterpolate(
            |idx: &MultiIndex| oracle.evaluate_or_record(idx),
            Some(|idxs: &[MultiIndex]| oracle.evaluate_batch_or_record(idxs)),
            &local_dims,
            &options,
        );
        if let Some(err) = oracle.take_error() {
            return Err(err.into());
        }
        let (surrogate, diagnostics) =
            result.map_err(|e| SensitivityError::from_cross(e, &variables))?;
        (surrogate, diagnostics, oracle.evaluations())
    };

    info!(
        sweeps = diagnostics.sweeps,
        rank = surrogate.rank(),
        error = diagnostics.error,
        evaluations,
        converged = diagnostics.converged,
        "surrogate built"
    );

    let indices = decompose(
        &surrogate,
        grid.all_weights(),
        config.max_order,
        config.zero_tolerance,
    )?;
    debug!(
        mean = indices.mean(),
        variance = indices.variance(),
        mean_dimension = indices.mean_dimension(),
        "variance decomposed"
    );

    Ok(SensitivityMetrics {
        variables,
        surrogate,
        grid,
        indices,
        zero_tolerance: config.zero_tolerance,
        diagnostics,
        evaluations,
        seed,
    })
}

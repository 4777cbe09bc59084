//! Configuration of a sensitivity analysis run

use std::time::Duration;

use ttsobol_tensorci::{CrossOptions, EvaluationBudget, NonConvergencePolicy};

use crate::error::{Result, SensitivityError};

/// Named, validated options for `build_metrics`
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityConfig {
    /// Grid resolution for axes without their own bin count
    pub bins: usize,
    /// Largest subset size whose indices are computed explicitly
    pub max_order: usize,
    /// Cross approximation tolerance
    pub eps: f64,
    /// Seed for Monte Carlo ticks and pivot search (None = random, recorded in the metrics)
    pub random_seed: Option<u64>,
    /// Maximum number of sweeps
    pub max_sweeps: usize,
    /// Log progress at info level
    pub verbose: bool,
    /// Maximum bond dimension of the surrogate
    pub max_rank: usize,
    /// Random grid points tried when picking the first pivot
    pub n_initial_pivots: usize,
    /// Monte Carlo samples per bin for stochastic axes
    pub mc_samples_per_bin: usize,
    /// Indices closer than this to zero are reported as zero
    pub zero_tolerance: f64,
    /// Oracle evaluation and wall-clock caps
    pub budget: EvaluationBudget,
    /// Behavior when sweeps run out
    pub nonconvergence: NonConvergencePolicy,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            bins: 100,
            max_order: 2,
            eps: 1e-5,
            random_seed: None,
            max_sweeps: 20,
            verbose: false,
            max_rank: 100,
            n_initial_pivots: 16,
            mc_samples_per_bin: 64,
            zero_tolerance: 1e-9,
            budget: EvaluationBudget::unlimited(),
            nonconvergence: NonConvergencePolicy::Fail,
        }
    }
}

impl SensitivityConfig {
    /// Set default bin count.
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    /// Set maximum interaction order.
    pub fn with_max_order(mut self, max_order: usize) -> Self {
        self.max_order = max_order;
        self
    }

    /// Set cross approximation tolerance.
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Set maximum number of sweeps.
    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    /// Set verbose logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set maximum bond dimension.
    pub fn with_max_rank(mut self, max_rank: usize) -> Self {
        self.max_rank = max_rank;
        self
    }

    /// Set number of first-pivot candidates.
    pub fn with_n_initial_pivots(mut self, n: usize) -> Self {
        self.n_initial_pivots = n;
        self
    }

    /// Set Monte Carlo samples per bin.
    pub fn with_mc_samples_per_bin(mut self, n: usize) -> Self {
        self.mc_samples_per_bin = n;
        self
    }

    /// Set the zero tolerance for indices.
    pub fn with_zero_tolerance(mut self, tolerance: f64) -> Self {
        self.zero_tolerance = tolerance;
        self
    }

    /// Cap the number of oracle evaluations.
    pub fn with_max_evaluations(mut self, n: usize) -> Self {
        self.budget = self.budget.with_max_evaluations(n);
        self
    }

    /// Cap the wall-clock time of the approximation.
    pub fn with_max_duration(mut self, duration: Duration) -> Self {
        self.budget = self.budget.with_max_duration(duration);
        self
    }

    /// Set non-convergence policy.
    pub fn with_nonconvergence(mut self, policy: NonConvergencePolicy) -> Self {
        self.nonconvergence = policy;
        self
    }

    /// Reject settings no run can use
    ///
    /// Bin counts below two are reported per axis as `InvalidAxis` when the
    /// catalog is discretized.
    pub fn validate(&self) -> Result<()> {
        let fail = |message: String| Err(SensitivityError::InvalidConfig { message });
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return fail(format!("eps must be positive and finite, got {}", self.eps));
        }
        if self.max_sweeps == 0 {
            return fail("max_sweeps must be at least 1".to_string());
        }
        if self.max_rank == 0 {
            return fail("max_rank must be at least 1".to_string());
        }
        if self.n_initial_pivots == 0 {
            return fail("n_initial_pivots must be at least 1".to_string());
        }
        if self.mc_samples_per_bin == 0 {
            return fail("mc_samples_per_bin must be at least 1".to_string());
        }
        if !(self.zero_tolerance.is_finite() && self.zero_tolerance >= 0.0) {
            return fail(format!(
                "zero_tolerance must be non-negative and finite, got {}",
                self.zero_tolerance
            ));
        }
        if self.budget.max_evaluations == Some(0) {
            return fail("max_evaluations must be at least 1".to_string());
        }
        Ok(())
    }

    /// Cross approximation options for a resolved seed
    pub(crate) fn cross_options(&self, seed: u64) -> CrossOptions {
        CrossOptions::default()
            .with_tolerance(self.eps)
            .with_max_sweeps(self.max_sweeps)
            .with_max_bond_dim(self.max_rank)
            .with_n_initial_pivots(self.n_initial_pivots)
            .with_seed(seed)
            .with_verbosity(usize::from(self.verbose))
            .with_budget(self.budget)
            .with_nonconvergence(self.nonconvergence)
    }
}

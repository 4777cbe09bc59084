//! Options for the cross interpolation engine

use std::time::Duration;

/// What to do when `max_sweeps` is reached before convergence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonConvergencePolicy {
    /// Return `TCIError::Convergence` with the partial surrogate
    #[default]
    Fail,
    /// Log a warning and return the last surrogate
    Warn,
}

/// Resource caps checked before every bond update
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EvaluationBudget {
    /// Maximum number of distinct function evaluations (None = unlimited)
    pub max_evaluations: Option<usize>,
    /// Maximum wall-clock time (None = unlimited)
    pub max_duration: Option<Duration>,
}

impl EvaluationBudget {
    /// No limits
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Set the evaluation cap
    pub fn with_max_evaluations(mut self, n: usize) -> Self {
        self.max_evaluations = Some(n);
        self
    }

    /// Set the wall-clock cap
    pub fn with_max_duration(mut self, duration: Duration) -> Self {
        self.max_duration = Some(duration);
        self
    }
}

/// Options for `crossinterpolate`
#[derive(Debug, Clone)]
pub struct CrossOptions {
    /// Tolerance for convergence (relative when `normalize_error` is set)
    pub tolerance: f64,
    /// Maximum number of sweeps (one sweep = forward + backward half-sweep)
    pub max_sweeps: usize,
    /// Maximum bond dimension
    pub max_bond_dim: usize,
    /// Whether to normalize errors by the largest sampled magnitude
    pub normalize_error: bool,
    /// Verbosity level; above 0 each sweep is logged at info level
    pub verbosity: usize,
    /// Number of random grid points tried when choosing the first pivot
    pub n_initial_pivots: usize,
    /// Maximum number of global pivots added after each sweep
    pub max_nglobal_pivot: usize,
    /// Number of random grid points checked against the surrogate after
    /// each sweep
    pub nsearch: usize,
    /// Seed for the first-pivot search (None = drawn from the thread rng)
    pub seed: Option<u64>,
    /// Evaluation and time caps
    pub budget: EvaluationBudget,
    /// Behavior when sweeps run out
    pub on_nonconvergence: NonConvergencePolicy,
}

impl Default for CrossOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-5,
            max_sweeps: 20,
            max_bond_dim: 100,
            normalize_error: true,
            verbosity: 0,
            n_initial_pivots: 16,
            max_nglobal_pivot: 5,
            nsearch: 100,
            seed: None,
            budget: EvaluationBudget::unlimited(),
            on_nonconvergence: NonConvergencePolicy::Fail,
        }
    }
}

impl CrossOptions {
    /// Set tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set maximum number of sweeps.
    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    /// Set maximum bond dimension.
    pub fn with_max_bond_dim(mut self, max_bond_dim: usize) -> Self {
        self.max_bond_dim = max_bond_dim;
        self
    }

    /// Set error normalization.
    pub fn with_normalize_error(mut self, normalize: bool) -> Self {
        self.normalize_error = normalize;
        self
    }

    /// Set verbosity level.
    pub fn with_verbosity(mut self, verbosity: usize) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set number of random initial pivot candidates.
    pub fn with_n_initial_pivots(mut self, n: usize) -> Self {
        self.n_initial_pivots = n;
        self
    }

    /// Set maximum number of global pivots per sweep.
    pub fn with_max_nglobal_pivot(mut self, n: usize) -> Self {
        self.max_nglobal_pivot = n;
        self
    }

    /// Set number of random points for the global pivot search.
    pub fn with_nsearch(mut self, n: usize) -> Self {
        self.nsearch = n;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set evaluation budget.
    pub fn with_budget(mut self, budget: EvaluationBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Set non-convergence policy.
    pub fn with_nonconvergence(mut self, policy: NonConvergencePolicy) -> Self {
        self.on_nonconvergence = policy;
        self
    }
}

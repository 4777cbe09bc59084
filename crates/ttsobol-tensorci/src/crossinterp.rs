//! Two-site tensor cross interpolation
//!
//! The engine keeps, for every site k, a set of left pivots `I_k` (prefixes
//! of length k) and right pivots `J_k` (suffixes covering sites k+1..L).
//! Visiting bond b samples the function on `(I_b x n_b) x (n_{b+1} x J_{b+1})`,
//! factorizes that matrix with rank-revealing LU and keeps the selected rows
//! and columns as the new `I_{b+1}` and `J_b`. The surrogate is assembled as
//! `C_k = T_k P_k^{-1}` with `T_k = F(I_k x n_k, J_k)` and
//! `P_k = F(I_{k+1}, J_k)`; the last core is `T_{L-1}` itself.
//!
//! Every `P_k` is the pivot block of the most recent factorization at bond k,
//! so the pivot state can be assembled into a surrogate at any bond
//! boundary. Budget errors rely on this.
//!
//! Pivot errors only cover the sampled blocks. After each sweep the
//! surrogate is also compared with the function at random grid points; the
//! worst of them are added to the pivot sets as global pivots and the run
//! cannot converge while any of them exceeds the tolerance. Global pivots
//! leave the sets unassembled until the next forward half-sweep has
//! refactorized every bond.

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};
use ttsobol_matrixci::{a_times_b_inv, rrlu, Matrix, RrLUOptions};
use ttsobol_tensortrain::{MultiIndex, Tensor3, TensorTrain};

use crate::cached_function::CachedFunction;
use crate::error::{BudgetLimit, Result, TCIError};
use crate::options::{CrossOptions, NonConvergencePolicy};

/// What a cross interpolation run did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossDiagnostics {
    /// Completed sweeps (forward + backward)
    pub sweeps: usize,
    /// Maximum bond dimension after each half-sweep
    pub ranks: Vec<usize>,
    /// Error estimate after each half-sweep (normalized if requested)
    pub errors: Vec<f64>,
    /// Frobenius norm of the surrogate after each sweep
    pub norms: Vec<f64>,
    /// Largest error at the random check points after each sweep
    /// (normalized if requested)
    pub global_errors: Vec<f64>,
    /// Last error estimate, pivot and global errors combined
    pub error: f64,
    /// Bond dimensions of the returned surrogate
    pub link_dims: Vec<usize>,
    /// Distinct function evaluations
    pub evaluations: usize,
    /// Whether the convergence criterion was met
    pub converged: bool,
    /// Wall-clock time spent
    pub elapsed: Duration,
    /// Seed used for the first-pivot search
    pub seed: u64,
}

/// Pivot sets and per-bond errors
#[derive(Debug, Clone)]
struct PivotState {
    local_dims: Vec<usize>,
    i_set: Vec<Vec<MultiIndex>>,
    j_set: Vec<Vec<MultiIndex>>,
    bond_errors: Vec<f64>,
    /// Global pivots were added since the last forward half-sweep
    stale: bool,
}

impl PivotState {
    fn from_pivot(local_dims: &[usize], pivot: &[usize]) -> Self {
        let n = local_dims.len();
        Self {
            local_dims: local_dims.to_vec(),
            i_set: (0..n).map(|k| vec![pivot[..k].to_vec()]).collect(),
            j_set: (0..n).map(|k| vec![pivot[k + 1..].to_vec()]).collect(),
            bond_errors: vec![0.0; n.saturating_sub(1)],
            stale: false,
        }
    }

    /// Add every prefix and suffix of `pivots` to the pivot sets
    fn add_global_pivots(&mut self, pivots: &[MultiIndex]) {
        for pivot in pivots {
            for p in 0..self.local_dims.len() {
                let prefix = pivot[..p].to_vec();
                let suffix = pivot[p + 1..].to_vec();
                if !self.i_set[p].contains(&prefix) {
                    self.i_set[p].push(prefix);
                    self.stale = true;
                }
                if !self.j_set[p].contains(&suffix) {
                    self.j_set[p].push(suffix);
                    self.stale = true;
                }
            }
        }
    }

    fn link_dims(&self) -> Vec<usize> {
        self.i_set.iter().skip(1).map(|s| s.len()).collect()
    }

    fn rank(&self) -> usize {
        self.link_dims().into_iter().max().unwrap_or(1)
    }

    fn max_bond_error(&self) -> f64 {
        self.bond_errors.iter().copied().fold(0.0, f64::max)
    }
}

/// `I x range(n)`: every left pivot extended by every local index
fn kronecker_left(i_set: &[MultiIndex], n: usize) -> Vec<MultiIndex> {
    let mut out = Vec::with_capacity(i_set.len() * n);
    for prefix in i_set {
        for s in 0..n {
            let mut idx = prefix.clone();
            idx.push(s);
            out.push(idx);
        }
    }
    out
}

/// `range(n) x J`: every local index followed by every right pivot
fn kronecker_right(n: usize, j_set: &[MultiIndex]) -> Vec<MultiIndex> {
    let mut out = Vec::with_capacity(n * j_set.len());
    for s in 0..n {
        for suffix in j_set {
            let mut idx = Vec::with_capacity(suffix.len() + 1);
            idx.push(s);
            idx.extend_from_slice(suffix);
            out.push(idx);
        }
    }
    out
}

/// Row-major list of `row ++ col` for every pair
fn outer_keys(rows: &[MultiIndex], cols: &[MultiIndex]) -> Vec<MultiIndex> {
    let mut keys = Vec::with_capacity(rows.len() * cols.len());
    for row in rows {
        for col in cols {
            let mut idx = Vec::with_capacity(row.len() + col.len());
            idx.extend_from_slice(row);
            idx.extend_from_slice(col);
            keys.push(idx);
        }
    }
    keys
}

/// Cached, budgeted access to the function being interpolated
struct Sampler<F, B>
where
    F: Fn(&MultiIndex) -> f64,
    B: Fn(&[MultiIndex]) -> Vec<f64>,
{
    cache: CachedFunction<MultiIndex, f64, F>,
    batched_f: Option<B>,
    max_sample_value: f64,
    start: Instant,
}

impl<F, B> Sampler<F, B>
where
    F: Fn(&MultiIndex) -> f64,
    B: Fn(&[MultiIndex]) -> Vec<f64>,
{
    fn evaluations(&self) -> usize {
        self.cache.num_evals()
    }

    /// The limit that evaluating `keys` would break, if any
    fn exceeded_limit(&self, keys: &[MultiIndex], options: &CrossOptions) -> Option<BudgetLimit> {
        if let Some(cap) = options.budget.max_evaluations {
            if self.evaluations() + self.cache.count_uncached(keys) > cap {
                return Some(BudgetLimit::Evaluations(cap));
            }
        }
        if let Some(max) = options.budget.max_duration {
            if self.start.elapsed() >= max {
                return Some(BudgetLimit::Duration(max));
            }
        }
        None
    }

    fn sample(&mut self, keys: &[MultiIndex]) -> Result<Vec<f64>> {
        let values = self.cache.eval_many(keys, self.batched_f.as_ref());
        if values.len() != keys.len() {
            return Err(TCIError::DimensionMismatch {
                message: format!(
                    "batch function returned {} values for {} indices",
                    values.len(),
                    keys.len()
                ),
            });
        }
        for (key, &v) in keys.iter().zip(&values) {
            if !v.is_finite() {
                return Err(TCIError::NonFiniteValue { index: key.clone() });
            }
            self.max_sample_value = self.max_sample_value.max(v.abs());
        }
        Ok(values)
    }

    fn sample_matrix(&mut self, rows: &[MultiIndex], cols: &[MultiIndex]) -> Result<Matrix> {
        let values = self.sample(&outer_keys(rows, cols))?;
        Ok(Matrix::from_row_major(rows.len(), cols.len(), values)?)
    }
}

/// Error scale used for pivot truncation and convergence
fn error_scale(options: &CrossOptions, max_sample_value: f64) -> f64 {
    if options.normalize_error && max_sample_value > 0.0 {
        max_sample_value
    } else {
        1.0
    }
}

/// Build a tensor train approximation of `f` over a grid of `local_dims`
///
/// `f` maps a grid point to a value. If `batched_f` is given, all
/// uncached points of a bond update are sent to it in one call instead.
///
/// # Example
///
/// ```
/// use ttsobol_tensorci::{crossinterpolate, CrossOptions, MultiIndex};
///
/// let f = |idx: &MultiIndex| (idx[0] + idx[1] + idx[2]) as f64;
/// let (tt, diagnostics) = crossinterpolate(
///     f,
///     None::<fn(&[MultiIndex]) -> Vec<f64>>,
///     &[4, 4, 4],
///     &CrossOptions::default().with_seed(1),
/// )
/// .unwrap();
///
/// assert!(diagnostics.converged);
/// assert!((tt.evaluate(&[1, 2, 3]).unwrap() - 6.0).abs() < 1e-10);
/// ```
pub fn crossinterpolate<F, B>(
    f: F,
    batched_f: Option<B>,
    local_dims: &[usize],
    options: &CrossOptions,
) -> Result<(TensorTrain, CrossDiagnostics)>
where
    F: Fn(&MultiIndex) -> f64,
    B: Fn(&[MultiIndex]) -> Vec<f64>,
{
    if local_dims.is_empty() {
        return Err(TCIError::DimensionMismatch {
            message: "local_dims must not be empty".to_string(),
        });
    }
    if let Some(site) = local_dims.iter().position(|&n| n < 2) {
        return Err(TCIError::DegenerateAxis { site });
    }

    let seed = options.seed.unwrap_or_else(|| rand::rng().random());
    let mut sampler = Sampler {
        cache: CachedFunction::new(f),
        batched_f,
        max_sample_value: 0.0,
        start: Instant::now(),
    };
    let mut diagnostics = CrossDiagnostics {
        seed,
        ..CrossDiagnostics::default()
    };

    if local_dims.len() == 1 {
        return interpolate_single_site(&mut sampler, local_dims[0], options, diagnostics);
    }

    // First pivot: the largest |f| among random candidates
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let candidates: Vec<MultiIndex> = (0..options.n_initial_pivots.max(1))
        .map(|_| local_dims.iter().map(|&n| rng.random_range(0..n)).collect())
        .collect();
    if let Some(limit) = sampler.exceeded_limit(&candidates, options) {
        let partial = TensorTrain::constant(local_dims, 0.0);
        finish(&mut diagnostics, &sampler, &partial);
        return Err(TCIError::BudgetExceeded {
            limit,
            diagnostics: Box::new(diagnostics),
            partial: Box::new(partial),
        });
    }
    let values = sampler.sample(&candidates)?;
    let (best, best_value) = values
        .iter()
        .enumerate()
        .fold((0, 0.0f64), |acc, (i, &v)| if v.abs() > acc.1.abs() { (i, v) } else { acc });
    if best_value == 0.0 {
        warn!(
            candidates = candidates.len(),
            "all initial samples are zero; returning the zero tensor train"
        );
        let tt = TensorTrain::constant(local_dims, 0.0);
        diagnostics.converged = true;
        finish(&mut diagnostics, &sampler, &tt);
        return Ok((tt, diagnostics));
    }
    let mut state = PivotState::from_pivot(local_dims, &candidates[best]);
    debug!(pivot = ?candidates[best], value = best_value, "initial pivot");

    let n_bonds = local_dims.len() - 1;
    let mut last_tt: Option<TensorTrain> = None;

    for sweep in 1..=options.max_sweeps {
        for forward in [true, false] {
            for step in 0..n_bonds {
                let b = if forward { step } else { n_bonds - 1 - step };
                if let Err(limit) = update_bond(&mut state, b, &mut sampler, options)? {
                    let partial = match &last_tt {
                        Some(tt) if state.stale => tt.clone(),
                        _ => assemble(&state, &mut sampler)?,
                    };
                    finish(&mut diagnostics, &sampler, &partial);
                    return Err(TCIError::BudgetExceeded {
                        limit,
                        diagnostics: Box::new(diagnostics),
                        partial: Box::new(partial),
                    });
                }
            }
            if forward {
                state.stale = false;
            }

            let error = state.max_bond_error() / error_scale(options, sampler.max_sample_value);
            diagnostics.ranks.push(state.rank());
            diagnostics.errors.push(error);
            diagnostics.error = error;
            debug!(
                sweep,
                direction = if forward { "forward" } else { "backward" },
                rank = state.rank(),
                error,
                evaluations = sampler.evaluations(),
                "half-sweep done"
            );
        }

        let tt = assemble(&state, &mut sampler)?;
        let (global_error, global_pivots) =
            match search_global_pivots(&tt, &state.local_dims, &mut sampler, &mut rng, options)? {
                Ok(found) => found,
                Err(limit) => {
                    finish(&mut diagnostics, &sampler, &tt);
                    return Err(TCIError::BudgetExceeded {
                        limit,
                        diagnostics: Box::new(diagnostics),
                        partial: Box::new(tt),
                    });
                }
            };
        diagnostics.global_errors.push(global_error);
        diagnostics.error = diagnostics.error.max(global_error);

        let norm = tt.norm();
        let previous = diagnostics.norms.last().copied();
        diagnostics.norms.push(norm);
        diagnostics.sweeps = sweep;

        let norm_change = previous.map_or(f64::INFINITY, |p| {
            let change = (norm - p).abs();
            if norm > 0.0 {
                change / norm
            } else {
                change
            }
        });
        if options.verbosity > 0 {
            info!(
                sweep,
                rank = state.rank(),
                error = diagnostics.error,
                norm,
                norm_change,
                evaluations = sampler.evaluations(),
                "sweep done"
            );
        }

        let converged = sweep >= 2
            && norm_change < options.tolerance
            && diagnostics.error < options.tolerance
            && global_pivots.is_empty();
        last_tt = Some(tt);
        if converged {
            diagnostics.converged = true;
            break;
        }
        if !global_pivots.is_empty() {
            debug!(
                sweep,
                count = global_pivots.len(),
                error = global_error,
                "adding global pivots"
            );
            state.add_global_pivots(&global_pivots);
        }
    }

    let tt = match last_tt {
        Some(tt) => tt,
        None => assemble(&state, &mut sampler)?,
    };
    finish(&mut diagnostics, &sampler, &tt);

    if diagnostics.converged {
        return Ok((tt, diagnostics));
    }
    match options.on_nonconvergence {
        NonConvergencePolicy::Fail => Err(TCIError::Convergence {
            diagnostics: Box::new(diagnostics),
            partial: Box::new(tt),
        }),
        NonConvergencePolicy::Warn => {
            warn!(
                sweeps = diagnostics.sweeps,
                error = diagnostics.error,
                tolerance = options.tolerance,
                "cross interpolation did not converge; returning the last surrogate"
            );
            Ok((tt, diagnostics))
        }
    }
}

fn finish<F, B>(diagnostics: &mut CrossDiagnostics, sampler: &Sampler<F, B>, tt: &TensorTrain)
where
    F: Fn(&MultiIndex) -> f64,
    B: Fn(&[MultiIndex]) -> Vec<f64>,
{
    diagnostics.link_dims = tt.link_dims();
    diagnostics.evaluations = sampler.evaluations();
    diagnostics.elapsed = sampler.start.elapsed();
}

/// A single site is sampled in full, which is exact
fn interpolate_single_site<F, B>(
    sampler: &mut Sampler<F, B>,
    n: usize,
    options: &CrossOptions,
    mut diagnostics: CrossDiagnostics,
) -> Result<(TensorTrain, CrossDiagnostics)>
where
    F: Fn(&MultiIndex) -> f64,
    B: Fn(&[MultiIndex]) -> Vec<f64>,
{
    let keys: Vec<MultiIndex> = (0..n).map(|s| vec![s]).collect();
    if let Some(limit) = sampler.exceeded_limit(&keys, options) {
        let partial = TensorTrain::constant(&[n], 0.0);
        finish(&mut diagnostics, sampler, &partial);
        return Err(TCIError::BudgetExceeded {
            limit,
            diagnostics: Box::new(diagnostics),
            partial: Box::new(partial),
        });
    }
    let values = sampler.sample(&keys)?;
    let core = Tensor3::from_data(values, 1, n, 1).ok_or_else(|| TCIError::DimensionMismatch {
        message: format!("expected {n} values for a single site"),
    })?;
    let tt = TensorTrain::new(vec![core])?;

    diagnostics.converged = true;
    diagnostics.norms.push(tt.norm());
    finish(&mut diagnostics, sampler, &tt);
    Ok((tt, diagnostics))
}

/// Compare `tt` with the function at `options.nsearch` random grid points
///
/// Returns the largest error (normalized if requested) and the points whose
/// error exceeds the tolerance, worst first, at most
/// `options.max_nglobal_pivot` of them. The inner `Err` carries the budget
/// limit that stopped the search before any evaluation.
fn search_global_pivots<F, B>(
    tt: &TensorTrain,
    local_dims: &[usize],
    sampler: &mut Sampler<F, B>,
    rng: &mut ChaCha8Rng,
    options: &CrossOptions,
) -> Result<std::result::Result<(f64, Vec<MultiIndex>), BudgetLimit>>
where
    F: Fn(&MultiIndex) -> f64,
    B: Fn(&[MultiIndex]) -> Vec<f64>,
{
    if options.nsearch == 0 || options.max_nglobal_pivot == 0 {
        return Ok(Ok((0.0, Vec::new())));
    }

    let points: Vec<MultiIndex> = (0..options.nsearch)
        .map(|_| local_dims.iter().map(|&n| rng.random_range(0..n)).collect())
        .collect();
    if let Some(limit) = sampler.exceeded_limit(&points, options) {
        return Ok(Err(limit));
    }
    let values = sampler.sample(&points)?;
    let scale = error_scale(options, sampler.max_sample_value);

    let mut misfits: Vec<(f64, MultiIndex)> = Vec::new();
    let mut max_error = 0.0f64;
    for (point, value) in points.into_iter().zip(values) {
        let error = (value - tt.evaluate(&point)?).abs() / scale;
        max_error = max_error.max(error);
        if error > options.tolerance && !misfits.iter().any(|(_, p)| *p == point) {
            misfits.push((error, point));
        }
    }
    misfits.sort_by(|a, b| b.0.total_cmp(&a.0));
    misfits.truncate(options.max_nglobal_pivot);

    Ok(Ok((max_error, misfits.into_iter().map(|(_, p)| p).collect())))
}

/// Update the pivots at bond `b`
///
/// The inner `Err` carries the budget limit that stopped the update before
/// any new evaluation happened.
fn update_bond<F, B>(
    state: &mut PivotState,
    b: usize,
    sampler: &mut Sampler<F, B>,
    options: &CrossOptions,
) -> Result<std::result::Result<(), BudgetLimit>>
where
    F: Fn(&MultiIndex) -> f64,
    B: Fn(&[MultiIndex]) -> Vec<f64>,
{
    let rows = kronecker_left(&state.i_set[b], state.local_dims[b]);
    let cols = kronecker_right(state.local_dims[b + 1], &state.j_set[b + 1]);
    let keys = outer_keys(&rows, &cols);
    if let Some(limit) = sampler.exceeded_limit(&keys, options) {
        return Ok(Err(limit));
    }

    let values = sampler.sample(&keys)?;
    let pi = Matrix::from_row_major(rows.len(), cols.len(), values)?;
    let lu = rrlu(
        &pi,
        Some(RrLUOptions {
            max_rank: options.max_bond_dim.max(1),
            rel_tol: 0.0,
            abs_tol: options.tolerance * error_scale(options, sampler.max_sample_value),
        }),
    )?;

    // An all-zero block carries no pivot; the previous sets stay valid
    if lu.npivots() == 0 {
        state.bond_errors[b] = 0.0;
        return Ok(Ok(()));
    }

    state.i_set[b + 1] = lu.row_indices().into_iter().map(|r| rows[r].clone()).collect();
    state.j_set[b] = lu.col_indices().into_iter().map(|c| cols[c].clone()).collect();
    state.bond_errors[b] = lu.last_pivot_error();
    Ok(Ok(()))
}

/// Assemble the surrogate from the current pivot sets
fn assemble<F, B>(state: &PivotState, sampler: &mut Sampler<F, B>) -> Result<TensorTrain>
where
    F: Fn(&MultiIndex) -> f64,
    B: Fn(&[MultiIndex]) -> Vec<f64>,
{
    let n_sites = state.local_dims.len();
    let mut cores = Vec::with_capacity(n_sites);
    for k in 0..n_sites {
        let n = state.local_dims[k];
        let left = state.i_set[k].len();
        let rows = kronecker_left(&state.i_set[k], n);
        let t = sampler.sample_matrix(&rows, &state.j_set[k])?;

        let (data, right) = if k + 1 < n_sites {
            let p = sampler.sample_matrix(&state.i_set[k + 1], &state.j_set[k])?;
            let c = a_times_b_inv(&t, &p)?;
            let right = c.ncols();
            (c.into_vec(), right)
        } else {
            let right = t.ncols();
            (t.into_vec(), right)
        };

        let core = Tensor3::from_left_matrix(data, left, n, right).ok_or_else(|| {
            TCIError::DimensionMismatch {
                message: format!("core {k} does not match its pivot sets"),
            }
        })?;
        cores.push(core);
    }
    Ok(TensorTrain::new(cores)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::EvaluationBudget;
    use approx::assert_abs_diff_eq;
    use std::cell::Cell;

    type NoBatch = fn(&[MultiIndex]) -> Vec<f64>;

    fn all_indices(dims: &[usize]) -> Vec<MultiIndex> {
        let mut out = vec![Vec::new()];
        for &n in dims {
            out = out
                .into_iter()
                .flat_map(|prefix: MultiIndex| {
                    (0..n).map(move |s| {
                        let mut idx = prefix.clone();
                        idx.push(s);
                        idx
                    })
                })
                .collect();
        }
        out
    }

    #[test]
    fn test_rank_one_product() {
        let f = |idx: &MultiIndex| idx.iter().map(|&i| (i + 1) as f64).product::<f64>();
        let dims = [4, 5, 3];
        let (tt, diag) =
            crossinterpolate(f, None::<NoBatch>, &dims, &CrossOptions::default().with_seed(3))
                .unwrap();

        assert!(diag.converged);
        assert_eq!(diag.link_dims, vec![1, 1]);
        for idx in all_indices(&dims) {
            assert_abs_diff_eq!(tt.evaluate(&idx).unwrap(), f(&idx), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rank_two_sum() {
        let f = |idx: &MultiIndex| idx.iter().sum::<usize>() as f64 + 1.0;
        let dims = [8, 8, 8, 8];
        let (tt, diag) =
            crossinterpolate(f, None::<NoBatch>, &dims, &CrossOptions::default().with_seed(11))
                .unwrap();

        assert!(diag.converged);
        assert!(diag.link_dims.iter().all(|&r| r == 2));
        assert!(diag.evaluations < 8 * 8 * 8 * 8);
        for idx in all_indices(&dims) {
            assert_abs_diff_eq!(tt.evaluate(&idx).unwrap(), f(&idx), epsilon = 1e-8);
        }
    }

    #[test]
    fn test_smooth_function_within_tolerance() {
        let f = |idx: &MultiIndex| {
            let s: f64 = idx.iter().map(|&i| i as f64 / 7.0).sum();
            1.0 / (1.0 + s)
        };
        let dims = [8, 8, 8];
        let opts = CrossOptions::default()
            .with_tolerance(1e-8)
            .with_seed(5)
            .with_nonconvergence(NonConvergencePolicy::Warn);
        let (tt, _) = crossinterpolate(f, None::<NoBatch>, &dims, &opts).unwrap();

        for idx in all_indices(&dims) {
            assert_abs_diff_eq!(tt.evaluate(&idx).unwrap(), f(&idx), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_batch_function_is_used() {
        let calls = Cell::new(0);
        let f = |idx: &MultiIndex| (idx[0] * idx[1]) as f64 + 2.0;
        let batch = |idxs: &[MultiIndex]| {
            calls.set(calls.get() + 1);
            idxs.iter().map(f).collect::<Vec<f64>>()
        };
        let (tt, diag) =
            crossinterpolate(f, Some(batch), &[5, 5], &CrossOptions::default().with_seed(2))
                .unwrap();

        assert!(calls.get() > 0);
        assert!(diag.evaluations <= 25);
        assert_abs_diff_eq!(tt.evaluate(&[3, 4]).unwrap(), 14.0, epsilon = 1e-10);
    }

    #[test]
    fn test_single_site_is_exact() {
        let f = |idx: &MultiIndex| (idx[0] as f64).powi(2);
        let (tt, diag) =
            crossinterpolate(f, None::<NoBatch>, &[6], &CrossOptions::default()).unwrap();

        assert!(diag.converged);
        assert_eq!(diag.evaluations, 6);
        assert_eq!(tt.evaluate(&[5]).unwrap(), 25.0);
    }

    #[test]
    fn test_same_seed_same_result() {
        let f = |idx: &MultiIndex| {
            (idx[0] as f64 * 0.3).sin() + (idx[1] as f64 * idx[2] as f64 * 0.1).cos()
        };
        let opts = CrossOptions::default()
            .with_seed(42)
            .with_nonconvergence(NonConvergencePolicy::Warn);
        let (tt1, d1) = crossinterpolate(f, None::<NoBatch>, &[7, 7, 7], &opts).unwrap();
        let (tt2, d2) = crossinterpolate(f, None::<NoBatch>, &[7, 7, 7], &opts).unwrap();

        assert_eq!(d1.seed, 42);
        assert_eq!(d1.link_dims, d2.link_dims);
        assert_eq!(d1.evaluations, d2.evaluations);
        assert_eq!(tt1, tt2);
    }

    #[test]
    fn test_degenerate_and_empty_dims() {
        let f = |_: &MultiIndex| 1.0;
        assert!(matches!(
            crossinterpolate(f, None::<NoBatch>, &[3, 1, 4], &CrossOptions::default()),
            Err(TCIError::DegenerateAxis { site: 1 })
        ));
        assert!(matches!(
            crossinterpolate(f, None::<NoBatch>, &[], &CrossOptions::default()),
            Err(TCIError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_non_finite_value() {
        let f = |idx: &MultiIndex| if idx[0] == 1 && idx[1] == 1 { f64::NAN } else { 1.0 };
        let opts = CrossOptions::default().with_seed(0);
        let result = crossinterpolate(f, None::<NoBatch>, &[3, 3], &opts);
        assert!(matches!(result, Err(TCIError::NonFiniteValue { .. })));
    }

    #[test]
    fn test_budget_exceeded_returns_partial() {
        let f = |idx: &MultiIndex| idx.iter().map(|&i| 1.0 + i as f64).sum::<f64>();
        let opts = CrossOptions::default()
            .with_seed(9)
            .with_n_initial_pivots(4)
            .with_budget(EvaluationBudget::unlimited().with_max_evaluations(10));
        let result = crossinterpolate(f, None::<NoBatch>, &[8, 8, 8], &opts);

        match result {
            Err(TCIError::BudgetExceeded {
                limit,
                diagnostics,
                partial,
            }) => {
                assert_eq!(limit, BudgetLimit::Evaluations(10));
                assert_eq!(partial.len(), 3);
                assert_eq!(diagnostics.link_dims, vec![1, 1]);
                assert!(!diagnostics.converged);
            }
            other => panic!("expected BudgetExceeded, got {other:?}"),
        }
    }

    /// x0 + 5 [x1 > 0.7 and x2 > 0.7] + sin(x3 x0) / 2 on a midpoint grid of [0, 1]^4
    fn corner_step(idx: &MultiIndex) -> f64 {
        let x: Vec<f64> = idx.iter().map(|&i| (i as f64 + 0.5) / 10.0).collect();
        let corner = if x[1] > 0.7 && x[2] > 0.7 { 5.0 } else { 0.0 };
        x[0] + corner + 0.5 * (x[3] * x[0]).sin()
    }

    #[test]
    fn test_global_search_catches_missed_corner() {
        let dims = [10, 10, 10, 10];
        let opts = CrossOptions::default().with_seed(0);
        let (tt, diag) = crossinterpolate(corner_step, None::<NoBatch>, &dims, &opts).unwrap();

        assert!(diag.converged);
        assert!(diag.error < opts.tolerance);
        assert_eq!(diag.global_errors.len(), diag.sweeps);
        assert!(diag.link_dims.iter().all(|&r| r >= 2));

        let max_error = all_indices(&dims)
            .iter()
            .map(|idx| (tt.evaluate(idx).unwrap() - corner_step(idx)).abs())
            .fold(0.0, f64::max);
        assert!(max_error < 1e-3, "max error {max_error}");
    }

    #[test]
    fn test_global_pivots_extend_every_bond() {
        let mut state = PivotState::from_pivot(&[3, 3, 3], &[0, 0, 0]);
        state.add_global_pivots(&[vec![2, 1, 2], vec![0, 0, 0]]);

        assert!(state.stale);
        assert_eq!(state.i_set[1], vec![vec![0], vec![2]]);
        assert_eq!(state.i_set[2], vec![vec![0, 0], vec![2, 1]]);
        assert_eq!(state.j_set[0], vec![vec![0, 0], vec![1, 2]]);
        assert_eq!(state.j_set[1], vec![vec![0], vec![2]]);
        assert_eq!(state.i_set[0], vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_nonconvergence_policies() {
        let f = |idx: &MultiIndex| (idx[0] + 2 * idx[1]) as f64 + 1.0;
        let fail = CrossOptions::default().with_seed(1).with_max_sweeps(1);
        match crossinterpolate(f, None::<NoBatch>, &[4, 4], &fail) {
            Err(TCIError::Convergence { diagnostics, partial }) => {
                assert_eq!(diagnostics.sweeps, 1);
                assert_abs_diff_eq!(partial.evaluate(&[2, 3]).unwrap(), 9.0, epsilon = 1e-10);
            }
            other => panic!("expected Convergence, got {other:?}"),
        }

        let warn = fail.with_nonconvergence(NonConvergencePolicy::Warn);
        let (tt, diag) = crossinterpolate(f, None::<NoBatch>, &[4, 4], &warn).unwrap();
        assert!(!diag.converged);
        assert_abs_diff_eq!(tt.evaluate(&[2, 3]).unwrap(), 9.0, epsilon = 1e-10);
    }
}

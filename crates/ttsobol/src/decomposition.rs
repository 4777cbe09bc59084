//! Sobol decomposition of a tensor train surrogate
//!
//! For a kept set K let `V_K = Var(E[f | X_K])` under the product input
//! measure, and `D = V_{0..d}` the total variance. Then
//!
//! - closed(S)   = (V_S - sum over proper subsets b of S of closed_var(b)) / D
//! - total(S)    = 1 - V_{not S} / D
//! - superset(S) = sum over b subset of S of (-1)^|b| V_{not b} / D
//!
//! Only subsets with at most `max_order` variables are visited, so the cost
//! is polynomial in the number of axes.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;
use ttsobol_tensortrain::{TensorTrain, WeightedContraction};

use crate::error::{Result, SensitivityError};
use crate::subset::VariableSubset;

/// Variance below this share of the second moment counts as zero
const RELATIVE_VARIANCE_FLOOR: f64 = 64.0 * f64::EPSILON;

/// Normalized Sobol indices of one surrogate
#[derive(Debug, Clone, PartialEq)]
pub struct SobolIndices {
    pub(crate) max_order: usize,
    pub(crate) mean: f64,
    pub(crate) variance: f64,
    pub(crate) closed: BTreeMap<VariableSubset, f64>,
    pub(crate) total: BTreeMap<VariableSubset, f64>,
    pub(crate) superset: BTreeMap<VariableSubset, f64>,
    pub(crate) mean_dimension: f64,
}

impl SobolIndices {
    /// Largest subset size present in the maps
    pub fn max_order(&self) -> usize {
        self.max_order
    }

    /// Surrogate mean
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Surrogate variance
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Closed indices
    pub fn closed(&self) -> &BTreeMap<VariableSubset, f64> {
        &self.closed
    }

    /// Total indices
    pub fn total(&self) -> &BTreeMap<VariableSubset, f64> {
        &self.total
    }

    /// Superset indices
    pub fn superset(&self) -> &BTreeMap<VariableSubset, f64> {
        &self.superset
    }

    /// Sum of the first-order total indices
    pub fn mean_dimension(&self) -> f64 {
        self.mean_dimension
    }
}

/// Memoized conditional variances `V_K`
struct ConditionalVariances<'a> {
    contraction: WeightedContraction<'a>,
    n: usize,
    mean: f64,
    variance: f64,
    cache: HashMap<VariableSubset, f64>,
}

impl ConditionalVariances<'_> {
    fn get(&mut self, kept: &VariableSubset) -> f64 {
        if kept.is_empty() {
            return 0.0;
        }
        if kept.len() == self.n {
            return self.variance;
        }
        if let Some(&v) = self.cache.get(kept) {
            return v;
        }
        let second = self.contraction.conditional_second_moment(&kept.mask(self.n));
        let v = second - self.mean * self.mean;
        self.cache.insert(kept.clone(), v);
        v
    }
}

/// Snap near-zero values, reject values outside `[-tol, 1 + tol]`, clamp
fn finalize(value: f64, tol: f64, family: &str, subset: &VariableSubset) -> Result<f64> {
    if !value.is_finite() || value < -tol || value > 1.0 + tol {
        return Err(SensitivityError::numeric(format!(
            "{family} index of {subset} is {value:.6e}, outside [0, 1] by more than {tol:e}"
        )));
    }
    if value.abs() < tol {
        return Ok(0.0);
    }
    Ok(value.clamp(0.0, 1.0))
}

/// Compute closed, total and superset indices up to `max_order`
///
/// `weights[k]` are the probabilities of the local indices of site k.
pub fn decompose(
    surrogate: &TensorTrain,
    weights: &[Vec<f64>],
    max_order: usize,
    zero_tolerance: f64,
) -> Result<SobolIndices> {
    let contraction = WeightedContraction::new(surrogate, weights)?;
    let n = surrogate.len();
    let max_order = max_order.min(n);

    let mean = contraction.mean();
    let second_moment = contraction.second_moment();
    let variance = second_moment - mean * mean;
    if !variance.is_finite() || variance <= RELATIVE_VARIANCE_FLOOR * second_moment.abs() {
        return Err(SensitivityError::numeric(format!(
            "total variance {variance:.6e} is not positive (mean {mean:.6e})"
        )));
    }

    let mut v = ConditionalVariances {
        contraction,
        n,
        mean,
        variance,
        cache: HashMap::new(),
    };

    let subsets = VariableSubset::all_up_to(n, max_order);
    let mut closed_var: BTreeMap<VariableSubset, f64> = BTreeMap::new();
    let mut closed = BTreeMap::new();
    let mut total = BTreeMap::new();
    let mut superset = BTreeMap::new();

    // Sizes are non-decreasing, so every proper subset is already in closed_var
    for s in &subsets {
        let proper: f64 = s
            .subsets()
            .iter()
            .filter(|b| b.len() < s.len())
            .map(|b| closed_var.get(b).copied().unwrap_or(0.0))
            .sum();
        let cv = if s.is_empty() { 0.0 } else { v.get(s) - proper };
        closed_var.insert(s.clone(), cv);

        let not_s = s.complement(n);
        let t = 1.0 - v.get(&not_s) / variance;

        let mut sup = 0.0;
        for b in s.subsets() {
            let sign = if b.len() % 2 == 0 { 1.0 } else { -1.0 };
            sup += sign * v.get(&b.complement(n));
        }
        let sup = sup / variance;

        closed.insert(s.clone(), finalize(cv / variance, zero_tolerance, "closed", s)?);
        total.insert(s.clone(), finalize(t, zero_tolerance, "total", s)?);
        superset.insert(s.clone(), finalize(sup, zero_tolerance, "superset", s)?);
    }

    let mut mean_dimension = 0.0;
    for i in 0..n {
        let s = VariableSubset::singleton(i);
        let t = match total.get(&s) {
            Some(&t) => t,
            None => finalize(1.0 - v.get(&s.complement(n)) / variance, zero_tolerance, "total", &s)?,
        };
        mean_dimension += t;
    }

    debug!(
        subsets = subsets.len(),
        contractions = v.cache.len(),
        mean,
        variance,
        "sobol decomposition done"
    );

    Ok(SobolIndices {
        max_order,
        mean,
        variance,
        closed,
        total,
        superset,
        mean_dimension,
    })
}

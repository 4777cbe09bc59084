//! Contractions of a tensor train against a product probability measure
//!
//! With per-site weights `w_k` (one probability per local index) the tensor
//! train defines a random variable `f(X_1, ..., X_L)` with independent
//! discrete inputs. This module computes its mean, its second moment and,
//! for any set K of kept sites, the second moment of the conditional
//! expectation `E[f | X_K]`:
//!
//! - for k in K the left environment is updated as `E <- sum_i w_i A(i)^T E A(i)`
//! - for k not in K the site is averaged first: `E <- M^T E M`, `M = sum_i w_i A(i)`
//!
//! Each contraction costs `O(L * n * r^3)`, independent of the grid size.

use crate::error::{Result, TensorTrainError};
use crate::tensortrain::{accumulate_sandwich, vec_times_block, TensorTrain};

/// A tensor train paired with a product measure over its sites
#[derive(Debug, Clone)]
pub struct WeightedContraction<'a> {
    tt: &'a TensorTrain,
    weights: &'a [Vec<f64>],
    /// Weighted site means `M_k` (r_k x r_{k+1}, row-major)
    site_means: Vec<Vec<f64>>,
}

impl<'a> WeightedContraction<'a> {
    /// Pair `tt` with per-site weights
    ///
    /// Weights are used as given; callers pass probabilities summing to 1
    /// per site.
    pub fn new(tt: &'a TensorTrain, weights: &'a [Vec<f64>]) -> Result<Self> {
        if tt.is_empty() {
            return Err(TensorTrainError::Empty);
        }
        if weights.len() != tt.len() {
            return Err(TensorTrainError::IndexLengthMismatch {
                expected: tt.len(),
                got: weights.len(),
            });
        }

        let mut site_means = Vec::with_capacity(tt.len());
        for (site, (core, w)) in tt.cores().zip(weights).enumerate() {
            if w.len() != core.site_dim() {
                return Err(TensorTrainError::WeightLengthMismatch {
                    site,
                    expected: core.site_dim(),
                    got: w.len(),
                });
            }
            let mut mean = vec![0.0; core.left_dim() * core.right_dim()];
            for (s, &ws) in w.iter().enumerate() {
                for (m, &a) in mean.iter_mut().zip(core.block(s)) {
                    *m += ws * a;
                }
            }
            site_means.push(mean);
        }

        Ok(Self {
            tt,
            weights,
            site_means,
        })
    }

    /// Number of sites
    pub fn len(&self) -> usize {
        self.tt.len()
    }

    /// Always false; construction rejects empty trains
    pub fn is_empty(&self) -> bool {
        self.tt.is_empty()
    }

    /// Expected value `E[f]`
    pub fn mean(&self) -> f64 {
        let mut current = vec![1.0];
        for (core, m) in self.tt.cores().zip(&self.site_means) {
            current = vec_times_block(&current, m, core.right_dim());
        }
        current.first().copied().unwrap_or(0.0)
    }

    /// Second moment `E[f^2]`
    pub fn second_moment(&self) -> f64 {
        self.conditional_second_moment(&vec![true; self.len()])
    }

    /// Second moment of the conditional expectation, `E[E[f | X_K]^2]`
    ///
    /// `kept[k]` marks site k as part of K. With K empty this is `E[f]^2`,
    /// with K the full set it is `E[f^2]`.
    pub fn conditional_second_moment(&self, kept: &[bool]) -> f64 {
        debug_assert_eq!(kept.len(), self.len());

        let mut env = vec![1.0];
        let mut dim = 1;
        for (k, core) in self.tt.cores().enumerate() {
            let r = core.right_dim();
            let mut next = vec![0.0; r * r];
            if kept[k] {
                for (s, &ws) in self.weights[k].iter().enumerate() {
                    if ws == 0.0 {
                        continue;
                    }
                    let block = core.block(s);
                    accumulate_sandwich(&mut next, &env, dim, block, block, r, ws);
                }
            } else {
                let m = &self.site_means[k];
                accumulate_sandwich(&mut next, &env, dim, m, m, r, 1.0);
            }
            env = next;
            dim = r;
        }
        env.first().copied().unwrap_or(0.0)
    }
}

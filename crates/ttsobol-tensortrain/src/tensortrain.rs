//! TensorTrain implementation

use crate::error::{Result, TensorTrainError};
use crate::types::{LocalIndex, Tensor3};

/// Tensor Train representation
///
/// A tensor train represents a high-dimensional tensor as a product of
/// three-leg cores:
///
/// T[i1, i2, ..., iL] = A1[i1] * A2[i2] * ... * AL[iL]
///
/// where each Ak[ik] is a matrix of shape (r_{k-1}, r_k).
///
/// All cores live in a single arena. Core k occupies
/// `data[offsets[k]..offsets[k + 1]]` and is laid out site-major: for each
/// local index `s` a contiguous `ranks[k] x ranks[k + 1]` row-major block.
/// The rank vector has `len() + 1` entries with `ranks[0] == ranks[len()] == 1`;
/// interior ranks may be zero, in which case the train is identically zero.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorTrain {
    data: Vec<f64>,
    offsets: Vec<usize>,
    site_dims: Vec<usize>,
    ranks: Vec<usize>,
}

/// Borrowed view of one core inside the arena
#[derive(Debug, Clone, Copy)]
pub struct CoreView<'a> {
    data: &'a [f64],
    left_dim: usize,
    site_dim: usize,
    right_dim: usize,
}

impl<'a> CoreView<'a> {
    /// Left (bond) dimension
    pub fn left_dim(&self) -> usize {
        self.left_dim
    }

    /// Site (physical) dimension
    pub fn site_dim(&self) -> usize {
        self.site_dim
    }

    /// Right (bond) dimension
    pub fn right_dim(&self) -> usize {
        self.right_dim
    }

    /// The `left_dim x right_dim` row-major block for local index `s`
    pub fn block(&self, s: usize) -> &'a [f64] {
        let size = self.left_dim * self.right_dim;
        &self.data[s * size..(s + 1) * size]
    }
}

impl TensorTrain {
    /// Create a new tensor train from a list of 3D tensors
    ///
    /// Each tensor should have shape (left_bond, site_dim, right_bond)
    /// where the right_bond of tensor i equals the left_bond of tensor i+1,
    /// the first left bond is 1 and the last right bond is 1.
    pub fn new(tensors: Vec<Tensor3>) -> Result<Self> {
        let (first, last) = match (tensors.first(), tensors.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(TensorTrainError::Empty),
        };
        if first.left_dim() != 1 {
            return Err(TensorTrainError::InvalidOperation {
                message: "First tensor must have left dimension 1".to_string(),
            });
        }
        if last.right_dim() != 1 {
            return Err(TensorTrainError::InvalidOperation {
                message: "Last tensor must have right dimension 1".to_string(),
            });
        }
        for i in 0..tensors.len() - 1 {
            if tensors[i].right_dim() != tensors[i + 1].left_dim() {
                return Err(TensorTrainError::DimensionMismatch { site: i });
            }
        }

        let mut ranks = Vec::with_capacity(tensors.len() + 1);
        ranks.push(1);
        ranks.extend(tensors.iter().map(|t| t.right_dim()));

        let total: usize = tensors
            .iter()
            .map(|t| t.left_dim() * t.site_dim() * t.right_dim())
            .sum();
        let mut data = Vec::with_capacity(total);
        let mut offsets = Vec::with_capacity(tensors.len() + 1);
        offsets.push(0);
        for t in &tensors {
            for s in 0..t.site_dim() {
                data.extend(t.slice_site(s));
            }
            offsets.push(data.len());
        }

        Ok(Self {
            data,
            offsets,
            site_dims: tensors.iter().map(|t| t.site_dim()).collect(),
            ranks,
        })
    }

    /// Create a tensor train representing a constant function
    pub fn constant(site_dims: &[usize], value: f64) -> Self {
        let n = site_dims.len();
        let mut data = Vec::with_capacity(site_dims.iter().sum());
        let mut offsets = vec![0];
        for (k, &d) in site_dims.iter().enumerate() {
            // The value rides on the last core, every other core is all ones
            let fill = if k + 1 == n { value } else { 1.0 };
            data.extend(std::iter::repeat(fill).take(d));
            offsets.push(data.len());
        }
        Self {
            data,
            offsets,
            site_dims: site_dims.to_vec(),
            ranks: vec![1; n + 1],
        }
    }

    /// Number of sites (cores)
    pub fn len(&self) -> usize {
        self.site_dims.len()
    }

    /// Check if the tensor train has no sites
    pub fn is_empty(&self) -> bool {
        self.site_dims.is_empty()
    }

    /// Site dimensions (physical dimensions) for each core
    pub fn site_dims(&self) -> &[usize] {
        &self.site_dims
    }

    /// Bond dimensions along the links between cores (length L-1)
    pub fn link_dims(&self) -> Vec<usize> {
        if self.len() <= 1 {
            return Vec::new();
        }
        self.ranks[1..self.len()].to_vec()
    }

    /// Maximum bond dimension
    pub fn rank(&self) -> usize {
        self.link_dims().into_iter().max().unwrap_or(1)
    }

    /// Borrow core `k`
    pub fn core(&self, k: usize) -> CoreView<'_> {
        CoreView {
            data: &self.data[self.offsets[k]..self.offsets[k + 1]],
            left_dim: self.ranks[k],
            site_dim: self.site_dims[k],
            right_dim: self.ranks[k + 1],
        }
    }

    /// Iterate over all cores
    pub fn cores(&self) -> impl Iterator<Item = CoreView<'_>> {
        (0..self.len()).map(move |k| self.core(k))
    }

    /// Evaluate the tensor train at a given index set
    pub fn evaluate(&self, indices: &[LocalIndex]) -> Result<f64> {
        if self.is_empty() {
            return Err(TensorTrainError::Empty);
        }
        if indices.len() != self.len() {
            return Err(TensorTrainError::IndexLengthMismatch {
                expected: self.len(),
                got: indices.len(),
            });
        }

        let mut current = vec![1.0];
        for (site, (&idx, core)) in indices.iter().zip(self.cores()).enumerate() {
            if idx >= core.site_dim() {
                return Err(TensorTrainError::IndexOutOfBounds {
                    site,
                    index: idx,
                    max: core.site_dim(),
                });
            }
            current = vec_times_block(&current, core.block(idx), core.right_dim());
        }
        Ok(current.first().copied().unwrap_or(0.0))
    }

    /// Squared Frobenius norm, contracted core by core
    pub fn norm2(&self) -> f64 {
        // Left environment E (r x r), E' = sum_s A(s)^T E A(s)
        let mut env = vec![1.0];
        let mut dim = 1;
        for core in self.cores() {
            let r = core.right_dim();
            let mut next = vec![0.0; r * r];
            for s in 0..core.site_dim() {
                accumulate_sandwich(&mut next, &env, dim, core.block(s), core.block(s), r, 1.0);
            }
            env = next;
            dim = r;
        }
        env.first().copied().unwrap_or(0.0).max(0.0)
    }

    /// Frobenius norm
    pub fn norm(&self) -> f64 {
        self.norm2().sqrt()
    }
}

/// Row vector (length l) times an (l x r) row-major block
pub(crate) fn vec_times_block(v: &[f64], block: &[f64], r: usize) -> Vec<f64> {
    let mut out = vec![0.0; r];
    for (l, &vl) in v.iter().enumerate() {
        if vl == 0.0 {
            continue;
        }
        let row = &block[l * r..(l + 1) * r];
        for (o, &b) in out.iter_mut().zip(row) {
            *o += vl * b;
        }
    }
    out
}

/// out (r x r) += w * A^T E B, with E (l x l), A and B (l x r)
pub(crate) fn accumulate_sandwich(
    out: &mut [f64],
    env: &[f64],
    l: usize,
    a: &[f64],
    b: &[f64],
    r: usize,
    w: f64,
) {
    // tmp = E B  (l x r)
    let mut tmp = vec![0.0; l * r];
    for i in 0..l {
        for k in 0..l {
            let e = env[i * l + k];
            if e == 0.0 {
                continue;
            }
            for j in 0..r {
                tmp[i * r + j] += e * b[k * r + j];
            }
        }
    }
    // out += w * A^T tmp
    for i in 0..l {
        for p in 0..r {
            let a_ip = w * a[i * r + p];
            if a_ip == 0.0 {
                continue;
            }
            for q in 0..r {
                out[p * r + q] += a_ip * tmp[i * r + q];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force_sum(tt: &TensorTrain) -> f64 {
        let dims = tt.site_dims();
        let mut total = 0.0;
        let mut idx = vec![0; dims.len()];
        loop {
            total += tt.evaluate(&idx).unwrap();
            let Some(k) = (0..dims.len()).rev().find(|&k| idx[k] + 1 < dims[k]) else {
                return total;
            };
            idx[k] += 1;
            idx[k + 1..].iter_mut().for_each(|i| *i = 0);
        }
    }

    fn product_train() -> TensorTrain {
        // T[i, j] = (i + 1) * (j + 1)
        let t0 = Tensor3::from_data(vec![1.0, 2.0], 1, 2, 1).unwrap();
        let t1 = Tensor3::from_data(vec![1.0, 2.0, 3.0], 1, 3, 1).unwrap();
        TensorTrain::new(vec![t0, t1]).unwrap()
    }

    #[test]
    fn test_tensortrain_constant() {
        let tt = TensorTrain::constant(&[2, 2], 5.0);
        assert_eq!(tt.len(), 2);
        assert_eq!(tt.link_dims(), vec![1]);
        assert!((brute_force_sum(&tt) - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_tensortrain_evaluate() {
        let tt = product_train();
        assert!((tt.evaluate(&[0, 0]).unwrap() - 1.0).abs() < 1e-10);
        assert!((tt.evaluate(&[1, 2]).unwrap() - 6.0).abs() < 1e-10);
        assert!(matches!(
            tt.evaluate(&[2, 0]),
            Err(TensorTrainError::IndexOutOfBounds { site: 0, .. })
        ));
        assert!(matches!(
            tt.evaluate(&[0]),
            Err(TensorTrainError::IndexLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_tensortrain_norm() {
        let tt = product_train();
        // sum_i sum_j (i+1)^2 (j+1)^2 = 5 * 14
        assert!((tt.norm2() - 70.0).abs() < 1e-10);
    }

    #[test]
    fn test_tensortrain_rank_two_bond() {
        // T[i, j] = i + j via [1, i] x [j, 1]^T
        let mut t0 = Tensor3::zeros(1, 3, 2);
        let mut t1 = Tensor3::zeros(2, 3, 1);
        for i in 0..3 {
            t0.set(0, i, 0, 1.0);
            t0.set(0, i, 1, i as f64);
            t1.set(0, i, 0, i as f64);
            t1.set(1, i, 0, 1.0);
        }
        let tt = TensorTrain::new(vec![t0, t1]).unwrap();

        assert_eq!(tt.link_dims(), vec![2]);
        assert_eq!(tt.rank(), 2);
        assert_eq!(tt.core(1).block(2), &[2.0, 1.0]);
        for i in 0..3 {
            for j in 0..3 {
                assert!((tt.evaluate(&[i, j]).unwrap() - (i + j) as f64).abs() < 1e-12);
            }
        }
        assert!((brute_force_sum(&tt) - 18.0).abs() < 1e-12);
    }

    #[test]
    fn test_tensortrain_zero_rank_bond() {
        let t0 = Tensor3::zeros(1, 2, 0);
        let t1 = Tensor3::zeros(0, 2, 1);
        let tt = TensorTrain::new(vec![t0, t1]).unwrap();

        assert_eq!(tt.evaluate(&[1, 1]).unwrap(), 0.0);
        assert_eq!(brute_force_sum(&tt), 0.0);
        assert_eq!(tt.norm2(), 0.0);
    }

    #[test]
    fn test_tensortrain_new_validates_bonds() {
        let t0 = Tensor3::zeros(1, 2, 2);
        let t1 = Tensor3::zeros(3, 2, 1);
        assert!(matches!(
            TensorTrain::new(vec![t0, t1]),
            Err(TensorTrainError::DimensionMismatch { site: 0 })
        ));
        assert!(matches!(TensorTrain::new(Vec::new()), Err(TensorTrainError::Empty)));
    }
}

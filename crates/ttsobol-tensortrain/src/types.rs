//! Core types for tensor train operations

/// Local index type (index within a single tensor site)
pub type LocalIndex = usize;

/// Multi-index type (indices across all sites)
pub type MultiIndex = Vec<LocalIndex>;

/// A 3D tensor represented as a flat Vec with shape information
/// Shape is (left_dim, site_dim, right_dim)
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor3 {
    data: Vec<f64>,
    left_dim: usize,
    site_dim: usize,
    right_dim: usize,
}

impl Tensor3 {
    /// Create a new tensor filled with zeros
    pub fn zeros(left_dim: usize, site_dim: usize, right_dim: usize) -> Self {
        Self {
            data: vec![0.0; left_dim * site_dim * right_dim],
            left_dim,
            site_dim,
            right_dim,
        }
    }

    /// Create from flat (left, site, right) row-major data
    ///
    /// Returns `None` if the data length does not match the shape.
    pub fn from_data(
        data: Vec<f64>,
        left_dim: usize,
        site_dim: usize,
        right_dim: usize,
    ) -> Option<Self> {
        (data.len() == left_dim * site_dim * right_dim).then_some(Self {
            data,
            left_dim,
            site_dim,
            right_dim,
        })
    }

    /// Create from a `(left_dim * site_dim) x right_dim` row-major matrix
    pub fn from_left_matrix(
        data: Vec<f64>,
        left_dim: usize,
        site_dim: usize,
        right_dim: usize,
    ) -> Option<Self> {
        // (l, s) fused rows with l slowest is exactly the (l, s, r) layout
        Self::from_data(data, left_dim, site_dim, right_dim)
    }

    /// Get the left (bond) dimension
    pub fn left_dim(&self) -> usize {
        self.left_dim
    }

    /// Get the site (physical) dimension
    pub fn site_dim(&self) -> usize {
        self.site_dim
    }

    /// Get the right (bond) dimension
    pub fn right_dim(&self) -> usize {
        self.right_dim
    }

    /// Get element at (left, site, right)
    pub fn get(&self, l: usize, s: usize, r: usize) -> f64 {
        self.data[(l * self.site_dim + s) * self.right_dim + r]
    }

    /// Set element at (left, site, right)
    pub fn set(&mut self, l: usize, s: usize, r: usize, value: f64) {
        self.data[(l * self.site_dim + s) * self.right_dim + r] = value;
    }

    /// Slice for fixed site index: returns a (left_dim, right_dim) row-major block
    pub fn slice_site(&self, s: usize) -> Vec<f64> {
        let mut result = Vec::with_capacity(self.left_dim * self.right_dim);
        for l in 0..self.left_dim {
            for r in 0..self.right_dim {
                result.push(self.get(l, s, r));
            }
        }
        result
    }
}

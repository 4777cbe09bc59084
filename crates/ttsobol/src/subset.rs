//! Sets of input variables

use std::fmt;

/// A sorted, duplicate-free set of variable indices
///
/// Ordering is lexicographic on the sorted indices, so `{0} < {0, 1} < {1}`.
/// The empty set stands for the mean.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VariableSubset(Vec<usize>);

impl VariableSubset {
    /// Build from any indices; duplicates are dropped
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Self {
        let mut v: Vec<usize> = indices.into_iter().collect();
        v.sort_unstable();
        v.dedup();
        Self(v)
    }

    /// The empty set
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// `{i}`
    pub fn singleton(i: usize) -> Self {
        Self(vec![i])
    }

    /// Number of variables (the interaction order)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the empty set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sorted variable indices
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Whether `i` is in the set
    pub fn contains(&self, i: usize) -> bool {
        self.0.binary_search(&i).is_ok()
    }

    /// Whether every variable of `self` is in `other`
    pub fn is_subset_of(&self, other: &VariableSubset) -> bool {
        self.0.iter().all(|&i| other.contains(i))
    }

    /// Whether `self` and `other` share a variable
    pub fn intersects(&self, other: &VariableSubset) -> bool {
        self.0.iter().any(|&i| other.contains(i))
    }

    /// Variables of `0..n` not in the set
    pub fn complement(&self, n: usize) -> VariableSubset {
        Self((0..n).filter(|&i| !self.contains(i)).collect())
    }

    /// Membership mask over `0..n`
    pub fn mask(&self, n: usize) -> Vec<bool> {
        (0..n).map(|i| self.contains(i)).collect()
    }

    /// Every subset of `self`, including `self` and the empty set
    pub fn subsets(&self) -> Vec<VariableSubset> {
        let k = self.0.len();
        (0u64..1 << k)
            .map(|bits| {
                Self(
                    (0..k)
                        .filter(|&j| bits & (1 << j) != 0)
                        .map(|j| self.0[j])
                        .collect(),
                )
            })
            .collect()
    }

    /// All subsets of `0..n` with at most `max_order` variables,
    /// by size and then lexicographically
    pub fn all_up_to(n: usize, max_order: usize) -> Vec<VariableSubset> {
        let mut out = vec![VariableSubset::empty()];
        let mut layer = vec![VariableSubset::empty()];
        for _ in 0..max_order.min(n) {
            let mut next = Vec::new();
            for s in &layer {
                let start = s.0.last().map_or(0, |&last| last + 1);
                for i in start..n {
                    let mut v = s.0.clone();
                    v.push(i);
                    next.push(Self(v));
                }
            }
            out.extend(next.iter().cloned());
            layer = next;
        }
        out
    }

    /// Render with variable names, e.g. `(M, S)`
    pub fn display_names(&self, names: &[String]) -> String {
        let parts: Vec<&str> = self
            .0
            .iter()
            .map(|&i| names.get(i).map_or("?", String::as_str))
            .collect();
        format!("({})", parts.join(", "))
    }
}

impl fmt::Display for VariableSubset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<Vec<usize>> for VariableSubset {
    fn from(v: Vec<usize>) -> Self {
        Self::new(v)
    }
}

impl<const N: usize> From<[usize; N]> for VariableSubset {
    fn from(v: [usize; N]) -> Self {
        Self::new(v)
    }
}

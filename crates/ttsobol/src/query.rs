//! Filtering and ranking of Sobol indices

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SensitivityError};
use crate::metrics::SensitivityMetrics;
use crate::subset::VariableSubset;

/// Which index mapping a query reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFamily {
    Closed,
    Total,
    Superset,
}

impl IndexFamily {
    /// All families, in report order
    pub const ALL: [IndexFamily; 3] = [
        IndexFamily::Closed,
        IndexFamily::Total,
        IndexFamily::Superset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexFamily::Closed => "closed",
            IndexFamily::Total => "total",
            IndexFamily::Superset => "superset",
        }
    }
}

impl fmt::Display for IndexFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexFamily {
    type Err = SensitivityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "closed" => Ok(IndexFamily::Closed),
            "total" => Ok(IndexFamily::Total),
            "superset" => Ok(IndexFamily::Superset),
            _ => Err(SensitivityError::invalid_query(format!(
                "unknown index family '{s}', expected closed, total or superset"
            ))),
        }
    }
}

/// How many matches a query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Every match, largest value first
    All,
    /// The single smallest value
    Lowest,
    /// The single largest value
    #[default]
    Highest,
}

impl FromStr for SelectionMode {
    type Err = SensitivityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(SelectionMode::All),
            "lowest" => Ok(SelectionMode::Lowest),
            "highest" => Ok(SelectionMode::Highest),
            _ => Err(SensitivityError::invalid_query(format!(
                "unknown selection mode '{s}', expected all, lowest or highest"
            ))),
        }
    }
}

/// A variable named either by its axis name or its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableRef {
    Name(String),
    Index(usize),
}

impl From<&str> for VariableRef {
    fn from(name: &str) -> Self {
        VariableRef::Name(name.to_string())
    }
}

impl From<String> for VariableRef {
    fn from(name: String) -> Self {
        VariableRef::Name(name)
    }
}

impl From<usize> for VariableRef {
    fn from(index: usize) -> Self {
        VariableRef::Index(index)
    }
}

impl VariableRef {
    fn resolve(&self, metrics: &SensitivityMetrics) -> Result<usize> {
        match self {
            VariableRef::Name(name) => metrics.position(name).ok_or_else(|| {
                SensitivityError::invalid_query(format!("unknown variable '{name}'"))
            }),
            VariableRef::Index(i) if *i < metrics.ndims() => Ok(*i),
            VariableRef::Index(i) => Err(SensitivityError::invalid_query(format!(
                "variable index {i} out of range for {} variables",
                metrics.ndims()
            ))),
        }
    }
}

/// Filter over one index family
///
/// # Example
///
/// ```
/// use ttsobol::{IndexFamily, SelectionMode, SobolQuery};
///
/// let q = SobolQuery::new(IndexFamily::Superset)
///     .with_max_order(2)
///     .exclude("T_a")
///     .with_mode(SelectionMode::Highest);
/// assert_eq!(q.max_order, Some(2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SobolQuery {
    pub family: IndexFamily,
    /// Smallest subset size, inclusive (default 1, which leaves out the
    /// empty subset and its fixed index)
    pub min_order: usize,
    /// Largest subset size, inclusive (None = number of variables)
    pub max_order: Option<usize>,
    /// Variables every match must contain
    pub include: Vec<VariableRef>,
    /// Variables no match may contain
    pub exclude: Vec<VariableRef>,
    pub mode: SelectionMode,
}

impl SobolQuery {
    pub fn new(family: IndexFamily) -> Self {
        Self {
            family,
            min_order: 1,
            max_order: None,
            include: Vec::new(),
            exclude: Vec::new(),
            mode: SelectionMode::default(),
        }
    }

    pub fn with_min_order(mut self, min_order: usize) -> Self {
        self.min_order = min_order;
        self
    }

    pub fn with_max_order(mut self, max_order: usize) -> Self {
        self.max_order = Some(max_order);
        self
    }

    /// Require a variable in every match
    pub fn include(mut self, variable: impl Into<VariableRef>) -> Self {
        self.include.push(variable.into());
        self
    }

    /// Forbid a variable in every match
    pub fn exclude(mut self, variable: impl Into<VariableRef>) -> Self {
        self.exclude.push(variable.into());
        self
    }

    pub fn with_mode(mut self, mode: SelectionMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Matching subsets with their index values
pub type QueryResult = Vec<(VariableSubset, f64)>;

/// Select indices of `metrics` matching `q`
///
/// Subsets larger than the metrics' `max_order` were never computed and
/// never match. An unsatisfiable filter gives an empty result.
pub fn query(metrics: &SensitivityMetrics, q: &SobolQuery) -> Result<QueryResult> {
    if let Some(max_order) = q.max_order.filter(|&m| q.min_order > m) {
        return Err(SensitivityError::invalid_query(format!(
            "min_order {} exceeds max_order {max_order}",
            q.min_order
        )));
    }
    let max_order = q.max_order.unwrap_or(metrics.ndims());
    let resolve = |refs: &[VariableRef]| -> Result<VariableSubset> {
        refs.iter()
            .map(|r| r.resolve(metrics))
            .collect::<Result<Vec<_>>>()
            .map(VariableSubset::from)
    };
    let include = resolve(&q.include)?;
    let exclude = resolve(&q.exclude)?;

    let mut matches: QueryResult = metrics
        .index(q.family)
        .iter()
        .filter(|(s, _)| (q.min_order..=max_order).contains(&s.len()))
        .filter(|(s, _)| include.is_subset_of(s) && !exclude.intersects(s))
        .map(|(s, &v)| (s.clone(), v))
        .collect();

    let tolerance = metrics.zero_tolerance();
    let result = match q.mode {
        SelectionMode::All => {
            matches.sort_by(|(sa, va), (sb, vb)| vb.total_cmp(va).then_with(|| sa.cmp(sb)));
            matches
        }
        SelectionMode::Highest => extreme(matches, tolerance, |a, b| a.total_cmp(&b)),
        SelectionMode::Lowest => extreme(matches, tolerance, |a, b| b.total_cmp(&a)),
    };
    Ok(result)
}

/// The best entry under `order`; entries within `tolerance` of the best
/// value tie and the smallest subset among them wins
fn extreme(
    matches: QueryResult,
    tolerance: f64,
    order: impl Fn(f64, f64) -> Ordering,
) -> QueryResult {
    let Some(best) = matches
        .iter()
        .map(|(_, v)| *v)
        .reduce(|a, b| if order(b, a) == Ordering::Greater { b } else { a })
    else {
        return Vec::new();
    };
    // matches come from a BTreeMap, so the first tie is the smallest subset
    matches
        .into_iter()
        .find(|(_, v)| (v - best).abs() <= tolerance)
        .into_iter()
        .collect()
}

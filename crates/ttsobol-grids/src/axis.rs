//! Input axes: a name, a domain, and an optional bin count

use rand::Rng;
use rand_distr::{Distribution, LogNormal, Normal, Triangular, Uniform};

use crate::error::{GridError, Result};

/// Tolerance on the total mass of a discrete distribution
pub const PMF_TOLERANCE: f64 = 1e-9;

/// How an interval is reduced to one representative per bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sampling {
    /// Bin centers of `bins` equal-width bins
    #[default]
    Midpoint,
    /// `bins` equally spaced points including both bounds
    Endpoints,
    /// Seeded uniform samples, sorted and averaged per equal-probability bin
    MonteCarlo,
}

/// A named probability distribution for one input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Marginal {
    /// Uniform on `[lower, upper)`
    Uniform { lower: f64, upper: f64 },
    /// Gaussian with the given mean and standard deviation
    Normal { mean: f64, std_dev: f64 },
    /// `exp(N(mu, sigma))`
    LogNormal { mu: f64, sigma: f64 },
    /// Triangular on `[lower, upper]` with peak at `mode`
    Triangular { lower: f64, mode: f64, upper: f64 },
}

impl Marginal {
    /// Reject parameters no sampler accepts
    fn check(&self) -> std::result::Result<(), &'static str> {
        match *self {
            Marginal::Uniform { lower, upper } => {
                if !lower.is_finite() || !upper.is_finite() {
                    Err("uniform bounds must be finite")
                } else if lower > upper {
                    Err("uniform lower bound exceeds upper bound")
                } else {
                    Ok(())
                }
            }
            Marginal::Normal { mean, std_dev } => {
                if !mean.is_finite() || !std_dev.is_finite() || std_dev < 0.0 {
                    Err("std_dev must be non-negative and finite")
                } else {
                    Ok(())
                }
            }
            Marginal::LogNormal { mu, sigma } => {
                if !mu.is_finite() || !sigma.is_finite() || sigma < 0.0 {
                    Err("sigma must be non-negative and finite")
                } else {
                    Ok(())
                }
            }
            Marginal::Triangular { lower, mode, upper } => {
                if !lower.is_finite() || !mode.is_finite() || !upper.is_finite() {
                    Err("triangular parameters must be finite")
                } else if !(lower <= mode && mode <= upper) {
                    Err("triangular mode must lie within [lower, upper]")
                } else {
                    Ok(())
                }
            }
        }
    }

    /// True when every draw is the same value
    fn is_point_mass(&self) -> bool {
        match *self {
            Marginal::Uniform { lower, upper } => lower == upper,
            Marginal::Normal { std_dev, .. } => std_dev == 0.0,
            Marginal::LogNormal { sigma, .. } => sigma == 0.0,
            Marginal::Triangular { lower, upper, .. } => lower == upper,
        }
    }

    /// Draw `n` samples
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        n: usize,
    ) -> std::result::Result<Vec<f64>, &'static str> {
        match *self {
            Marginal::Uniform { lower, upper } => Uniform::new(lower, upper)
                .map(|d| (0..n).map(|_| d.sample(rng)).collect())
                .map_err(|_| "uniform range must be non-empty and finite"),
            Marginal::Normal { mean, std_dev } => Normal::new(mean, std_dev)
                .map(|d| (0..n).map(|_| d.sample(rng)).collect())
                .map_err(|_| "std_dev must be non-negative and finite"),
            Marginal::LogNormal { mu, sigma } => LogNormal::new(mu, sigma)
                .map(|d| (0..n).map(|_| d.sample(rng)).collect())
                .map_err(|_| "sigma must be non-negative and finite"),
            Marginal::Triangular { lower, mode, upper } => Triangular::new(lower, upper, mode)
                .map(|d| (0..n).map(|_| d.sample(rng)).collect())
                .map_err(|_| "triangular mode must lie within [lower, upper]"),
        }
    }
}

/// The set of values an input can take
#[derive(Debug, Clone, PartialEq)]
pub enum Domain {
    /// A bounded interval, reduced to representatives by `sampling`
    Interval {
        lower: f64,
        upper: f64,
        sampling: Sampling,
    },
    /// A probability distribution, reduced by seeded Monte Carlo
    Distribution(Marginal),
    /// An explicit probability mass function
    Discrete {
        values: Vec<f64>,
        probabilities: Vec<f64>,
    },
}

/// One input variable
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    name: String,
    domain: Domain,
    bins: Option<usize>,
}

/// Ticks and their probabilities for one axis
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AxisTicks {
    pub ticks: Vec<f64>,
    pub weights: Vec<f64>,
}

impl Axis {
    /// Interval axis with midpoint sampling
    pub fn interval(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            domain: Domain::Interval {
                lower,
                upper,
                sampling: Sampling::Midpoint,
            },
            bins: None,
        }
    }

    /// Axis following a probability distribution
    pub fn distribution(name: impl Into<String>, marginal: Marginal) -> Self {
        Self {
            name: name.into(),
            domain: Domain::Distribution(marginal),
            bins: None,
        }
    }

    /// Axis with an explicit probability mass function
    pub fn discrete(name: impl Into<String>, values: Vec<f64>, probabilities: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            domain: Domain::Discrete {
                values,
                probabilities,
            },
            bins: None,
        }
    }

    /// Set the sampling rule (interval axes only)
    pub fn with_sampling(mut self, rule: Sampling) -> Self {
        if let Domain::Interval { sampling, .. } = &mut self.domain {
            *sampling = rule;
        }
        self
    }

    /// Override the default bin count
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = Some(bins);
        self
    }

    /// Axis name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Axis domain
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Explicit bin count, if any
    pub fn bins(&self) -> Option<usize> {
        self.bins
    }

    fn invalid(&self, message: impl Into<String>) -> GridError {
        GridError::InvalidAxis {
            axis: self.name.clone(),
            message: message.into(),
        }
    }

    fn degenerate(&self) -> GridError {
        GridError::DegenerateAxis {
            axis: self.name.clone(),
        }
    }

    /// Check the domain description, independent of the bin count
    pub fn validate(&self) -> Result<()> {
        if let Some(bins) = self.bins {
            if bins < 2 {
                return Err(self.invalid(format!("bin count must be at least 2, got {bins}")));
            }
        }

        match &self.domain {
            Domain::Interval { lower, upper, .. } => {
                if !lower.is_finite() || !upper.is_finite() {
                    return Err(self.invalid("bounds must be finite"));
                }
                if lower > upper {
                    return Err(self.invalid(format!("lower bound {lower} exceeds upper bound {upper}")));
                }
                if lower == upper {
                    return Err(self.degenerate());
                }
            }
            Domain::Distribution(marginal) => {
                marginal.check().map_err(|m| self.invalid(m))?;
                if marginal.is_point_mass() {
                    return Err(self.degenerate());
                }
            }
            Domain::Discrete {
                values,
                probabilities,
            } => {
                if values.len() != probabilities.len() {
                    return Err(self.invalid(format!(
                        "{} values but {} probabilities",
                        values.len(),
                        probabilities.len()
                    )));
                }
                if values.len() < 2 {
                    return Err(self.invalid("a discrete axis needs at least 2 values"));
                }
                if let Some(bins) = self.bins {
                    if bins != values.len() {
                        return Err(self.invalid(format!(
                            "bin count {bins} disagrees with {} values",
                            values.len()
                        )));
                    }
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(self.invalid("values must be finite"));
                }
                if probabilities.iter().any(|p| !p.is_finite() || *p < 0.0) {
                    return Err(self.invalid("probabilities must be finite and non-negative"));
                }
                let total: f64 = probabilities.iter().sum();
                if (total - 1.0).abs() > PMF_TOLERANCE {
                    return Err(self.invalid(format!("probabilities sum to {total}, not 1")));
                }
            }
        }
        Ok(())
    }

    /// Effective bin count given the catalog default
    pub fn resolved_bins(&self, default_bins: usize) -> usize {
        match &self.domain {
            Domain::Discrete { values, .. } => values.len(),
            _ => self.bins.unwrap_or(default_bins),
        }
    }

    /// Reduce the domain to `resolved_bins` ticks with probabilities
    pub(crate) fn discretize<R: Rng + ?Sized>(
        &self,
        default_bins: usize,
        rng: &mut R,
        samples_per_bin: usize,
    ) -> Result<AxisTicks> {
        self.validate()?;
        let n = self.resolved_bins(default_bins);
        if n < 2 {
            return Err(self.invalid(format!("bin count must be at least 2, got {n}")));
        }
        let uniform = vec![1.0 / n as f64; n];
        let spb = samples_per_bin.max(1);

        let axis_ticks = match &self.domain {
            Domain::Interval {
                lower,
                upper,
                sampling,
            } => {
                let width = upper - lower;
                let ticks = match sampling {
                    Sampling::Midpoint => {
                        let step = width / n as f64;
                        (0..n).map(|i| lower + (i as f64 + 0.5) * step).collect()
                    }
                    Sampling::Endpoints => {
                        let step = width / (n - 1) as f64;
                        (0..n).map(|i| lower + i as f64 * step).collect()
                    }
                    Sampling::MonteCarlo => {
                        let marginal = Marginal::Uniform {
                            lower: *lower,
                            upper: *upper,
                        };
                        let samples = marginal.sample(rng, n * spb).map_err(|m| self.invalid(m))?;
                        chunk_means(samples, n)
                    }
                };
                AxisTicks {
                    ticks,
                    weights: uniform,
                }
            }
            Domain::Distribution(marginal) => {
                let samples = marginal.sample(rng, n * spb).map_err(|m| self.invalid(m))?;
                AxisTicks {
                    ticks: chunk_means(samples, n),
                    weights: uniform,
                }
            }
            Domain::Discrete {
                values,
                probabilities,
            } => AxisTicks {
                ticks: values.clone(),
                weights: probabilities.clone(),
            },
        };

        if has_zero_variance(&axis_ticks) {
            return Err(self.degenerate());
        }
        Ok(axis_ticks)
    }
}

/// Sort samples and average them in `n` equal chunks
fn chunk_means(mut samples: Vec<f64>, n: usize) -> Vec<f64> {
    samples.sort_by(f64::total_cmp);
    let per_bin = samples.len() / n;
    samples
        .chunks(per_bin)
        .take(n)
        .map(|chunk| chunk.iter().sum::<f64>() / chunk.len() as f64)
        .collect()
}

/// All weight sits on a single tick value
fn has_zero_variance(axis: &AxisTicks) -> bool {
    let mut support = axis
        .ticks
        .iter()
        .zip(&axis.weights)
        .filter(|(_, w)| **w > 0.0)
        .map(|(&t, _)| t);
    match support.next() {
        Some(first) => support.all(|t| t == first),
        None => true,
    }
}

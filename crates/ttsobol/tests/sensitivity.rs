//! Integration tests for ttsobol
//!
//! Tests cover:
//! - Index values of models with known decompositions
//! - Lattice properties (bounds, monotonicity, variance conservation)
//! - Reproducibility with a fixed seed
//! - Error reporting for bad axes, budgets and degenerate models

use std::f64::consts::PI;
use std::time::Duration;

use approx::assert_abs_diff_eq;
use ttsobol::{
    build_metrics, tabulate, BudgetLimit, NonConvergencePolicy, SensitivityConfig,
    SensitivityError, SensitivityMetrics, TableFormat, VariableSubset,
};
use ttsobol_grids::{Axis, AxisCatalog, Marginal, Sampling};

fn unit_catalog(names: &[&str]) -> AxisCatalog {
    AxisCatalog::new(
        names
            .iter()
            .map(|n| Axis::interval(*n, -1.0, 1.0))
            .collect(),
    )
    .unwrap()
}

fn ishigami_like(x: &[f64]) -> f64 {
    x[0].sin() * (1.0 + 0.1 * x[2].powi(4)) + 7.0 * x[1].sin().powi(2)
}

fn ishigami_catalog() -> AxisCatalog {
    AxisCatalog::new(
        ["x1", "x2", "x3"]
            .iter()
            .map(|n| Axis::interval(*n, -PI, PI))
            .collect(),
    )
    .unwrap()
}

fn s(indices: &[usize]) -> VariableSubset {
    VariableSubset::new(indices.iter().copied())
}

#[test]
fn test_non_influential_variable() {
    let config = SensitivityConfig::default().with_bins(10).with_seed(7);
    let m = build_metrics(|x: &[f64]| x[0], &unit_catalog(&["x", "y"]), &config).unwrap();

    assert_abs_diff_eq!(m.closed()[&s(&[0])], 1.0, epsilon = 1e-8);
    assert_abs_diff_eq!(m.closed()[&s(&[1])], 0.0, epsilon = 1e-8);
    assert_abs_diff_eq!(m.closed()[&s(&[0, 1])], 0.0, epsilon = 1e-8);
    assert_abs_diff_eq!(m.total()[&s(&[1])], 0.0, epsilon = 1e-8);
}

#[test]
fn test_additive_closed_indices_follow_squared_coefficients() {
    let config = SensitivityConfig::default().with_bins(12).with_seed(2);
    let catalog = unit_catalog(&["a", "b", "c"]);
    let m = build_metrics(|x: &[f64]| 3.0 * x[0] + 2.0 * x[1] + x[2], &catalog, &config).unwrap();

    assert_abs_diff_eq!(m.closed()[&s(&[0])], 9.0 / 14.0, epsilon = 1e-8);
    assert_abs_diff_eq!(m.closed()[&s(&[1])], 4.0 / 14.0, epsilon = 1e-8);
    assert_abs_diff_eq!(m.closed()[&s(&[2])], 1.0 / 14.0, epsilon = 1e-8);
    for pair in [[0, 1], [0, 2], [1, 2]] {
        assert_eq!(m.closed()[&s(&pair)], 0.0);
    }
    assert_abs_diff_eq!(m.mean_dimension(), 1.0, epsilon = 1e-8);
}

#[test]
fn test_product_term_shows_in_pair_index() {
    let config = SensitivityConfig::default()
        .with_bins(16)
        .with_seed(11)
        .with_max_order(3);
    let m = build_metrics(ishigami_like, &ishigami_catalog(), &config).unwrap();

    // x2 only acts through its product with x1
    assert_eq!(m.closed()[&s(&[2])], 0.0);
    assert!(m.closed()[&s(&[0, 2])] > 0.01);
    assert_abs_diff_eq!(m.closed()[&s(&[0, 1])], 0.0, epsilon = 1e-8);
    assert_abs_diff_eq!(m.closed()[&s(&[1, 2])], 0.0, epsilon = 1e-8);
    assert_abs_diff_eq!(m.total()[&s(&[2])], m.closed()[&s(&[0, 2])], epsilon = 1e-8);
    assert!(m.mean_dimension() > 1.0);
}

#[test]
fn test_boundary_indices() {
    let config = SensitivityConfig::default()
        .with_bins(16)
        .with_seed(5)
        .with_max_order(3);
    let m = build_metrics(ishigami_like, &ishigami_catalog(), &config).unwrap();

    assert_eq!(m.closed()[&VariableSubset::empty()], 0.0);
    assert_eq!(m.superset()[&VariableSubset::empty()], 1.0);
    assert_abs_diff_eq!(m.total()[&s(&[0, 1, 2])], 1.0, epsilon = 1e-9);
}

#[test]
fn test_index_lattice_is_monotone() {
    let config = SensitivityConfig::default()
        .with_bins(16)
        .with_seed(8)
        .with_max_order(3);
    let m = build_metrics(ishigami_like, &ishigami_catalog(), &config).unwrap();
    let tol = 1e-9;

    for (subset, &closed) in m.closed() {
        let total = m.total()[subset];
        let superset = m.superset()[subset];
        assert!((0.0..=1.0).contains(&closed));
        assert!(total + tol >= closed, "{subset}: total {total} < closed {closed}");
        assert!(superset + tol >= closed, "{subset}: superset {superset} < closed {closed}");
        if subset.len() == 1 {
            assert!(superset + tol >= total);
        }
    }
}

#[test]
fn test_variance_is_conserved_at_full_order() {
    let config = SensitivityConfig::default()
        .with_bins(16)
        .with_seed(3)
        .with_max_order(3);
    let m = build_metrics(ishigami_like, &ishigami_catalog(), &config).unwrap();

    let sum: f64 = m.closed().values().sum();
    assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-8);
    assert_eq!(m.residual(), 0.0);
    assert_eq!(m.closed().len(), 8);
}

#[test]
fn test_same_seed_gives_identical_metrics() {
    let catalog = AxisCatalog::new(vec![
        Axis::interval("u", 0.0, 2.0).with_sampling(Sampling::MonteCarlo),
        Axis::distribution(
            "n",
            Marginal::Normal {
                mean: 1.0,
                std_dev: 0.3,
            },
        ),
        Axis::interval("w", -1.0, 1.0),
    ])
    .unwrap();
    let model = |x: &[f64]| x[0] * x[1] + x[2].exp();
    let config = SensitivityConfig::default().with_bins(8).with_seed(42);

    let a = build_metrics(model, &catalog, &config).unwrap();
    let b = build_metrics(model, &catalog, &config).unwrap();

    assert_eq!(a.closed(), b.closed());
    assert_eq!(a.total(), b.total());
    assert_eq!(a.superset(), b.superset());
    assert_eq!(a.surrogate(), b.surrogate());
    assert_eq!(a.mean().to_bits(), b.mean().to_bits());
    assert_eq!(a.variance().to_bits(), b.variance().to_bits());
    assert_eq!(a, b);
}

#[test]
fn test_max_order_zero_keeps_only_the_empty_subset() {
    let config = SensitivityConfig::default()
        .with_bins(8)
        .with_seed(1)
        .with_max_order(0);
    let m = build_metrics(|x: &[f64]| x[0] + x[1], &unit_catalog(&["x", "y"]), &config).unwrap();

    assert_eq!(m.closed().len(), 1);
    assert_eq!(m.closed()[&VariableSubset::empty()], 0.0);
    assert_eq!(m.total().len(), 1);
    assert_eq!(m.dimension_distribution(), vec![0.0]);
    assert_abs_diff_eq!(m.residual(), 1.0, epsilon = 1e-12);
}

#[test]
fn test_invalid_axes() {
    let err: SensitivityError = AxisCatalog::new(vec![Axis::interval("x", 1.0, 0.0)])
        .unwrap_err()
        .into();
    assert!(matches!(err, SensitivityError::InvalidAxis { .. }));

    let err: SensitivityError = AxisCatalog::new(vec![
        Axis::interval("x", 0.0, 1.0),
        Axis::interval("x", 0.0, 2.0),
    ])
    .unwrap_err()
    .into();
    assert!(matches!(err, SensitivityError::InvalidAxis { .. }));

    let config = SensitivityConfig::default().with_bins(1).with_seed(0);
    let err = build_metrics(|x: &[f64]| x[0], &unit_catalog(&["x", "y"]), &config).unwrap_err();
    assert!(matches!(err, SensitivityError::InvalidAxis { .. }));
}

#[test]
fn test_degenerate_axis() {
    let err: SensitivityError = AxisCatalog::new(vec![
        Axis::interval("x", 0.0, 1.0),
        Axis::distribution(
            "flat",
            Marginal::Normal {
                mean: 2.0,
                std_dev: 0.0,
            },
        ),
    ])
    .unwrap_err()
    .into();
    assert!(matches!(err, SensitivityError::DegenerateAxis { axis } if axis == "flat"));
}

#[test]
fn test_constant_model_is_numerically_unstable() {
    let config = SensitivityConfig::default().with_bins(6).with_seed(0);
    let catalog = unit_catalog(&["x", "y"]);

    let err = build_metrics(|_: &[f64]| 4.0, &catalog, &config).unwrap_err();
    assert!(matches!(err, SensitivityError::NumericInstability { .. }));

    let err = build_metrics(|_: &[f64]| 0.0, &catalog, &config).unwrap_err();
    assert!(matches!(err, SensitivityError::NumericInstability { .. }));
}

#[test]
fn test_non_finite_model_values() {
    let config = SensitivityConfig::default().with_bins(6).with_seed(0);
    let err = build_metrics(|x: &[f64]| x[0].ln(), &unit_catalog(&["x", "y"]), &config).unwrap_err();
    assert!(matches!(err, SensitivityError::NumericInstability { .. }));
}

#[test]
fn test_evaluation_budget_keeps_partial_surrogate() {
    let config = SensitivityConfig::default()
        .with_bins(10)
        .with_seed(4)
        .with_max_evaluations(10);
    let err = build_metrics(
        |x: &[f64]| x[0] * x[1] + x[2],
        &unit_catalog(&["a", "b", "c"]),
        &config,
    )
    .unwrap_err();

    match err {
        SensitivityError::BudgetExceeded {
            limit,
            diagnostics,
            partial,
        } => {
            assert_eq!(limit, BudgetLimit::Evaluations(10));
            assert!(diagnostics.evaluations <= 10);
            assert_eq!(partial.site_dims(), &[10, 10, 10]);
        }
        other => panic!("expected a budget error, got {other}"),
    }
}

#[test]
fn test_wall_clock_budget_keeps_partial_surrogate() {
    let config = SensitivityConfig::default()
        .with_bins(10)
        .with_seed(4)
        .with_max_duration(Duration::ZERO);
    let err = build_metrics(
        |x: &[f64]| x[0] * x[1] + x[2],
        &unit_catalog(&["a", "b", "c"]),
        &config,
    )
    .unwrap_err();

    match err {
        SensitivityError::BudgetExceeded {
            limit,
            diagnostics,
            partial,
        } => {
            assert_eq!(limit, BudgetLimit::Duration(Duration::ZERO));
            assert_eq!(diagnostics.evaluations, 0);
            assert!(!diagnostics.converged);
            assert_eq!(partial.site_dims(), &[10, 10, 10]);
        }
        other => panic!("expected a budget error, got {other}"),
    }
}

fn bilinear_plus(x: &[f64]) -> f64 {
    x[0] * x[1] + x[2]
}

#[test]
fn test_unconverged_run_fails_with_diagnostics() {
    let config = SensitivityConfig::default()
        .with_bins(8)
        .with_seed(6)
        .with_max_sweeps(1);
    let err = build_metrics(bilinear_plus, &unit_catalog(&["a", "b", "c"]), &config).unwrap_err();

    assert!(err.to_string().contains("did not converge after 1 sweeps"));
    match err {
        SensitivityError::Convergence {
            diagnostics,
            partial,
        } => {
            assert_eq!(diagnostics.sweeps, 1);
            assert!(!diagnostics.converged);
            assert!(diagnostics.evaluations > 0);
            assert_eq!(partial.site_dims(), &[8, 8, 8]);
            assert_eq!(partial.link_dims(), diagnostics.link_dims);
        }
        other => panic!("expected a convergence error, got {other}"),
    }
}

#[test]
fn test_unconverged_run_warns_and_returns_metrics() {
    let config = SensitivityConfig::default()
        .with_bins(8)
        .with_seed(6)
        .with_max_sweeps(1)
        .with_max_order(3)
        .with_nonconvergence(NonConvergencePolicy::Warn);
    let m = build_metrics(bilinear_plus, &unit_catalog(&["a", "b", "c"]), &config).unwrap();

    assert!(!m.diagnostics().converged);
    assert_eq!(m.diagnostics().sweeps, 1);
    let sum: f64 = m.closed().values().sum();
    assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-8);

    // Var over 8 midpoints of [-1, 1]
    let v = 0.328125;
    assert_abs_diff_eq!(m.closed()[&s(&[2])], 1.0 / (1.0 + v), epsilon = 1e-6);
    assert_abs_diff_eq!(m.closed()[&s(&[0, 1])], v / (1.0 + v), epsilon = 1e-6);
}

fn corner_step(x: &[f64]) -> f64 {
    let corner = if x[1] > 0.7 && x[2] > 0.7 { 5.0 } else { 0.0 };
    x[0] + corner + 0.5 * (x[3] * x[0]).sin()
}

/// `Var(E[f | x_k]) / Var(f)` by summing over every grid point
fn first_order_by_enumeration(m: &SensitivityMetrics, f: fn(&[f64]) -> f64, k: usize) -> f64 {
    let grid = m.grid();
    let dims = grid.local_dimensions();
    let total: usize = dims.iter().product();
    let mut values = Vec::with_capacity(total);
    let mut idx = vec![0; dims.len()];
    for _ in 0..total {
        values.push((idx[k], f(&grid.coordinate(&idx).unwrap())));
        for d in (0..dims.len()).rev() {
            idx[d] += 1;
            if idx[d] < dims[d] {
                break;
            }
            idx[d] = 0;
        }
    }

    let n = total as f64;
    let mean = values.iter().map(|(_, v)| v).sum::<f64>() / n;
    let variance = values.iter().map(|(_, v)| (v - mean).powi(2)).sum::<f64>() / n;
    let mut conditional = vec![0.0; dims[k]];
    for (i, v) in &values {
        conditional[*i] += v * dims[k] as f64 / n;
    }
    let explained = conditional.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / dims[k] as f64;
    explained / variance
}

#[test]
fn test_localized_step_is_resolved_for_every_seed() {
    let catalog = AxisCatalog::new(
        ["x0", "x1", "x2", "x3"]
            .iter()
            .map(|n| Axis::interval(*n, 0.0, 1.0))
            .collect(),
    )
    .unwrap();

    for seed in 0..5 {
        let config = SensitivityConfig::default().with_bins(10).with_seed(seed);
        let m = build_metrics(corner_step, &catalog, &config).unwrap();

        assert!(m.diagnostics().converged, "seed {seed}");
        for k in [0, 1] {
            let expected = first_order_by_enumeration(&m, corner_step, k);
            assert_abs_diff_eq!(m.closed()[&s(&[k])], expected, epsilon = 1e-3);
        }
    }
}

#[test]
fn test_tabulate_reports() {
    let config = SensitivityConfig::default().with_bins(12).with_seed(2);
    let catalog = unit_catalog(&["a", "b", "c"]);
    let m = build_metrics(|x: &[f64]| 3.0 * x[0] + 2.0 * x[1] + x[2], &catalog, &config).unwrap();

    let reports = tabulate(&m, 2, TableFormat::Tsv);
    let keys: Vec<&str> = reports.keys().map(String::as_str).collect();
    assert_eq!(keys, ["closed", "dimension", "superset", "total", "variables"]);

    let variables: Vec<&str> = reports["variables"].lines().collect();
    assert_eq!(variables[0], "variable\tclosed\ttotal\tsuperset");
    assert_eq!(variables.len(), 4);
    assert!(variables[1].starts_with("a\t0.642857\t0.642857"));

    let closed: Vec<&str> = reports["closed"].lines().collect();
    assert_eq!(closed[0], "subset\torder\tclosed");
    // three singletons and three pairs
    assert_eq!(closed.len(), 7);
    assert_eq!(closed[1], "(a)\t1\t0.642857");

    let csv = tabulate(&m, 2, TableFormat::Csv);
    assert!(csv["total"].contains("\"(a, b)\",2,"));

    let dimension = &reports["dimension"];
    assert!(dimension.contains("1\t1.000000"));
    assert!(dimension.contains(">2\t0.000000"));
    assert!(dimension.contains("mean dimension\t1.000000"));

    let first_order = tabulate(&m, 1, TableFormat::Plain);
    assert_eq!(first_order["closed"].lines().count(), 2 + 3);
}

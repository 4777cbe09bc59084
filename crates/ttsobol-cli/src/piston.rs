//! Cycle time of a piston moving inside a cylinder
//!
//! Seven uniform inputs, in order: piston weight `M` (kg), surface area `S`
//! (m^2), initial gas volume `V_0` (m^3), spring coefficient `k` (N/m),
//! atmospheric pressure `P_0` (N/m^2), ambient temperature `T_a` (K) and
//! filling gas temperature `T_0` (K). The output is the cycle time in
//! seconds.

use std::f64::consts::PI;

use ttsobol_grids::{Axis, AxisCatalog, Result};

/// Names and bounds of the seven inputs
const INPUTS: [(&str, f64, f64); 7] = [
    ("M", 30.0, 60.0),
    ("S", 0.005, 0.020),
    ("V_0", 0.002, 0.010),
    ("k", 1000.0, 5000.0),
    ("P_0", 90000.0, 110000.0),
    ("T_a", 290.0, 296.0),
    ("T_0", 340.0, 360.0),
];

/// Cycle time for one input point
pub fn cycle_time(x: &[f64]) -> f64 {
    let [m, s, v0, k, p0, ta, t0] = [x[0], x[1], x[2], x[3], x[4], x[5], x[6]];
    let a = p0 * s + 19.62 * m - k * v0 / s;
    let v = s / (2.0 * k) * ((a * a + 4.0 * k * p0 * v0 * ta / t0).sqrt() - a);
    2.0 * PI * (m / (k + s * s * p0 * v0 * ta / (t0 * v * v))).sqrt()
}

/// Axis catalog of the model, midpoint sampled
pub fn catalog() -> Result<AxisCatalog> {
    AxisCatalog::new(
        INPUTS
            .iter()
            .map(|&(name, lower, upper)| Axis::interval(name, lower, upper))
            .collect(),
    )
}

//! Newton-Raphson solver for the third tripod leg.
//!
//! Legs 1 and 2 are fixed. The unknown is the unit direction `d` of leg 3
//! through its ground point. Each fixed leg must pass leg 3 at exactly the
//! summed radii, which gives three equations in the three components of `d`:
//!
//! ```text
//! F(d) = [ |s1(d)| - R1, |s2(d)| - R2, |d|^2 - 1 ]
//! ```
//!
//! where `s_i` is the signed distance between the infinite lines of leg `i`
//! and leg 3.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::geometry::signed_distance_between_lines;

fn default_tolerance() -> f64 {
    1e-4
}

fn default_max_iterations() -> usize {
    1000
}

fn default_singular_threshold() -> f64 {
    1e-9
}

/// Convergence parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Largest residual component accepted as converged
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Jacobian determinant under which a step is abandoned
    #[serde(default = "default_singular_threshold")]
    pub singular_threshold: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
            singular_threshold: default_singular_threshold(),
        }
    }
}

impl SolverSettings {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_singular_threshold(mut self, threshold: f64) -> Self {
        self.singular_threshold = threshold;
        self
    }
}

/// An already placed leg, as an infinite line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedLeg {
    pub point: DVec3,
    pub direction: DVec3,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripodProblem {
    pub legs: [FixedLeg; 2],
    /// Ground point of the third leg
    pub ground: DVec3,
    /// Radius of the third leg
    pub radius: f64,
}

impl TripodProblem {
    /// Residual vector at `direction`, `None` if leg 3 is parallel to a fixed leg
    pub fn residuals(&self, direction: DVec3) -> Option<[f64; 3]> {
        let s1 = self.signed_distance(0, direction)?;
        let s2 = self.signed_distance(1, direction)?;
        Some([
            s1.abs() - (self.legs[0].radius + self.radius),
            s2.abs() - (self.legs[1].radius + self.radius),
            direction.length_squared() - 1.0,
        ])
    }

    fn signed_distance(&self, leg: usize, direction: DVec3) -> Option<f64> {
        let fixed = &self.legs[leg];
        signed_distance_between_lines(fixed.point, fixed.direction, self.ground, direction)
    }

    /// Gradient of `|s_i|` with respect to the third leg's direction
    fn distance_gradient(&self, leg: usize, direction: DVec3) -> Option<DVec3> {
        let fixed = &self.legs[leg];
        let c = fixed.direction.cross(direction);
        let norm = c.length();
        if norm < 1e-12 {
            return None;
        }
        let w = self.ground - fixed.point;
        let s = w.dot(c) / norm;
        let gradient = (w.cross(fixed.direction) * norm - c.cross(fixed.direction) * (w.dot(c) / norm))
            / (norm * norm);
        Some(gradient * s.signum())
    }

    fn jacobian(&self, direction: DVec3) -> Option<[DVec3; 3]> {
        Some([
            self.distance_gradient(0, direction)?,
            self.distance_gradient(1, direction)?,
            direction * 2.0,
        ])
    }
}

/// Result of a solve. When `converged` is false, `direction` is the last
/// iterate, still unit length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveOutcome {
    pub direction: DVec3,
    pub iterations: usize,
    /// Largest absolute residual component at `direction`
    pub residual: f64,
    pub converged: bool,
}

fn det3(rows: &[DVec3; 3]) -> f64 {
    rows[0].dot(rows[1].cross(rows[2]))
}

/// Solve `rows * x = rhs` by Cramer's rule
fn cramer(rows: &[DVec3; 3], rhs: [f64; 3], det: f64) -> DVec3 {
    let columns = [
        DVec3::new(rows[0].x, rows[1].x, rows[2].x),
        DVec3::new(rows[0].y, rows[1].y, rows[2].y),
        DVec3::new(rows[0].z, rows[1].z, rows[2].z),
    ];
    let b = DVec3::from_array(rhs);
    let solve_for = |i: usize| {
        let mut replaced = columns;
        replaced[i] = b;
        // det of a matrix equals det of its transpose
        replaced[0].dot(replaced[1].cross(replaced[2])) / det
    };
    DVec3::new(solve_for(0), solve_for(1), solve_for(2))
}

fn max_abs(values: [f64; 3]) -> f64 {
    values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

/// Newton-Raphson from `initial`, renormalizing after every step.
///
/// Stops early when leg 3 turns parallel to a fixed leg or the Jacobian
/// goes singular; the outcome then reports the best iterate so far.
pub fn solve_third_leg(problem: &TripodProblem, initial: DVec3, settings: &SolverSettings) -> SolveOutcome {
    let mut direction = initial.normalize_or_zero();
    if direction == DVec3::ZERO {
        direction = DVec3::Y;
    }
    let mut residual = f64::INFINITY;

    for iteration in 0..settings.max_iterations {
        let Some(f) = problem.residuals(direction) else {
            tracing::warn!(iteration, "third leg parallel to a fixed leg, stopping");
            return SolveOutcome {
                direction,
                iterations: iteration,
                residual,
                converged: false,
            };
        };
        residual = max_abs(f);
        if residual < settings.tolerance {
            tracing::trace!(iteration, residual, "tripod solve converged");
            return SolveOutcome {
                direction,
                iterations: iteration,
                residual,
                converged: true,
            };
        }

        let step = problem.jacobian(direction).and_then(|rows| {
            let det = det3(&rows);
            (det.abs() >= settings.singular_threshold).then(|| cramer(&rows, [-f[0], -f[1], -f[2]], det))
        });
        let Some(step) = step else {
            tracing::warn!(iteration, residual, "singular jacobian, stopping");
            return SolveOutcome {
                direction,
                iterations: iteration,
                residual,
                converged: false,
            };
        };

        let next = (direction + step).normalize_or_zero();
        if next == DVec3::ZERO || !next.is_finite() {
            tracing::warn!(iteration, "degenerate newton step, stopping");
            return SolveOutcome {
                direction,
                iterations: iteration,
                residual,
                converged: false,
            };
        }
        direction = next;
    }

    if let Some(f) = problem.residuals(direction) {
        residual = max_abs(f);
    }
    let converged = residual < settings.tolerance;
    if !converged {
        tracing::warn!(
            iterations = settings.max_iterations,
            residual,
            "tripod solve did not converge, keeping best effort"
        );
    }
    SolveOutcome {
        direction,
        iterations: settings.max_iterations,
        residual,
        converged,
    }
}

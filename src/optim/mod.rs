//! Box-constrained minimisation of smooth scalar functions.
//!
//! [`minimize_bounded`] is a projected limited-memory BFGS: iterates are
//! kept inside the box by projection, variables pinned at a bound with the
//! gradient pushing outward are frozen for the step, and the remaining free
//! variables follow the usual two-loop L-BFGS direction. Gradients are
//! estimated by forward differences (backward at an upper bound), so only
//! function values are required from the caller.

mod lbfgs;

pub use lbfgs::minimize_bounded;

use serde::{Deserialize, Serialize};

/// Closed interval for one variable.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub lower: f64,
    pub upper: f64,
}

impl Bound {
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn clamp(&self, v: f64) -> f64 {
        v.max(self.lower).min(self.upper)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimizeOptions {
    pub max_iterations: usize,
    /// Number of curvature pairs kept.
    pub memory: usize,
    pub fd_step: f64,
    /// Stop when the infinity norm of the projected gradient falls below this.
    pub pgtol: f64,
    /// Stop when the relative energy reduction falls below this.
    pub ftol: f64,
    pub max_line_search: usize,
}

impl Default for MinimizeOptions {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            memory: 10,
            fd_step: 1e-8,
            pgtol: 1e-5,
            ftol: 2.220_446_049_250_313e-9,
            max_line_search: 20,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    ProjectedGradient,
    RelativeReduction,
    MaxIterations,
    LineSearchFailed,
}

#[derive(Clone, Debug)]
pub struct MinimizeResult {
    pub x: nalgebra::DVector<f64>,
    pub fun: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub termination: Termination,
}

impl MinimizeResult {
    pub fn converged(&self) -> bool {
        matches!(
            self.termination,
            Termination::ProjectedGradient | Termination::RelativeReduction
        )
    }
}

//! Tolerance defaults and solver settings.
//!
//! Policy
//! - Geometric tolerances are fixed constants. Call sites do not juggle them;
//!   if one ever needs tuning it moves into `SolverCfg`.
//! - `SolverCfg` is the only runtime-configurable piece and maps one-to-one
//!   onto Clarabel settings.

/// Default sample cap for `calc_volume_via_sampling`.
pub const DEFAULT_MAX_SAMPLES: usize = 10_000;

/// Interior-point solver settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverCfg {
    pub verbose: bool,
    pub max_iter: u32,
    pub tol_feas: f64,
    pub tol_gap_abs: f64,
    pub tol_gap_rel: f64,
}

impl Default for SolverCfg {
    fn default() -> Self {
        Self {
            verbose: false,
            max_iter: 200,
            tol_feas: 1e-8,
            tol_gap_abs: 1e-8,
            tol_gap_rel: 1e-8,
        }
    }
}

/// Slack added to the tolerance when comparing a solver-computed distance,
/// so points exactly on the boundary are not rejected by interior-point noise.
pub(crate) const SOLVE_DIST_EPS: f64 = 1e-7;

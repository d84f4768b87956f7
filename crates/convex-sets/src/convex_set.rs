//! The convex-set capability interface.
//!
//! Purpose
//! - One trait (`ConvexSet`) that every variant implements, leaves and
//!   combinators alike, so a hull can recurse into members without knowing
//!   what they are.
//! - One checked surface (`ConvexSetExt`) that callers use. It validates
//!   dimensions and tolerances, keeps emission all-or-nothing, and owns the
//!   volume policy. Variants only implement the `do_*` hooks.
//!
//! Defaults
//! - `do_maybe_get_point`: zero-objective solve of the set's own
//!   point-in-set constraints.
//! - `do_is_empty`: no witness point.
//! - `do_maybe_calc_axis_aligned_bounding_box`: one LP per coordinate and
//!   direction; infeasible or unbounded LPs mean "no box".
//! - `do_is_bounded`: a box exists.

use std::fmt;

use nalgebra::{DMatrix, DVector};
use rand::Rng;

use crate::error::{Result, SetError};
use crate::program::{affine_rows, Binding, LinExpr, Program, SolutionStatus, Variable};
use crate::sets::Hyperrectangle;

/// Samples between two stopping-rule checks in `calc_volume_via_sampling`.
const SAMPLE_CHECK_EVERY: usize = 100;

/// Capability hooks implemented by every convex set.
///
/// Callers should go through `ConvexSetExt`; hooks may assume their inputs
/// were validated (dimensions match, tolerance is a non-negative number).
pub trait ConvexSet: fmt::Debug + Send + Sync {
    fn ambient_dimension(&self) -> usize;

    /// Whether `do_calc_volume` is implemented exactly.
    fn has_exact_volume(&self) -> bool;

    /// Deep, independent copy.
    fn clone_box(&self) -> Box<dyn ConvexSet>;

    /// Short type name used in error messages.
    fn type_name(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// `true` iff `x` lies within `tol` of the set.
    ///
    /// Each variant states its slack metric: Euclidean distance for `Point`
    /// and `ConvexHull`, per coordinate for `Hyperrectangle`, per row of
    /// `A x <= b` for `HPolyhedron`. Any of them is monotone in `tol`.
    fn do_point_in_set(&self, x: &DVector<f64>, tol: f64) -> Result<bool>;

    /// Constrain `x ∈ S`; returns the variables and constraints it introduced.
    fn do_add_point_in_set_constraints(
        &self,
        prog: &mut Program,
        x: &[Variable],
    ) -> Result<(Vec<Variable>, Vec<Binding>)>;

    /// Constrain `x ∈ t·S` with `t >= 0`; `t = 0` forces `x = 0`.
    fn do_add_point_in_nonnegative_scaling_constraints(
        &self,
        prog: &mut Program,
        x: &[Variable],
        t: Variable,
    ) -> Result<Vec<Binding>>;

    /// Constrain `A x + b ∈ (cᵀt + d)·S` with `cᵀt + d >= 0`.
    fn do_add_point_in_nonnegative_scaling_constraints_affine(
        &self,
        prog: &mut Program,
        scaling: &AffineScaling,
        x: &[Variable],
        t: &[Variable],
    ) -> Result<Vec<Binding>>;

    fn do_is_empty(&self) -> Result<bool> {
        Ok(witness_point(self)?.is_none())
    }

    fn do_is_bounded(&self) -> Result<bool> {
        Ok(bounding_box_via_lps(self)?.is_some())
    }

    fn do_maybe_get_point(&self) -> Result<Option<DVector<f64>>> {
        witness_point(self)
    }

    /// Exact volume; only consulted when `has_exact_volume()` is true.
    fn do_calc_volume(&self) -> Option<f64> {
        None
    }

    fn do_maybe_calc_axis_aligned_bounding_box(&self) -> Result<Option<Hyperrectangle>> {
        bounding_box_via_lps(self)
    }
}

/// Data of the affine scaling form `A x + b ∈ (cᵀt + d)·S`.
#[derive(Clone, Debug, PartialEq)]
pub struct AffineScaling {
    pub a: DMatrix<f64>,
    pub b: DVector<f64>,
    pub c: DVector<f64>,
    pub d: f64,
}

impl AffineScaling {
    pub fn new(a: DMatrix<f64>, b: DVector<f64>, c: DVector<f64>, d: f64) -> Self {
        Self { a, b, c, d }
    }

    /// Rows of `A x + b`.
    pub fn point_rows(&self, x: &[Variable]) -> Vec<LinExpr> {
        affine_rows(&self.a, &self.b, x)
    }

    /// The scalar `cᵀt + d`.
    pub fn scale_expr(&self, t: &[Variable]) -> LinExpr {
        LinExpr::dot(&self.c, t) + self.d
    }

    fn validate(&self, dim: usize, x: &[Variable], t: &[Variable]) -> Result<()> {
        SetError::check_dim(dim, self.a.nrows())?;
        SetError::check_dim(self.a.nrows(), self.b.len())?;
        SetError::check_dim(self.a.ncols(), x.len())?;
        SetError::check_dim(self.c.len(), t.len())?;
        if !self.d.is_finite() {
            return Err(SetError::invalid("affine scaling offset d must be finite"));
        }
        Ok(())
    }
}

/// Monte Carlo volume estimate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampledVolume {
    pub volume: f64,
    /// Relative standard error of the estimate.
    pub rel_accuracy: f64,
    pub num_samples: usize,
}

/// Checked public surface of every `ConvexSet` (including `dyn ConvexSet`).
pub trait ConvexSetExt: ConvexSet {
    fn point_in_set(&self, x: &DVector<f64>, tol: f64) -> Result<bool> {
        SetError::check_dim(self.ambient_dimension(), x.len())?;
        check_tolerance(tol)?;
        self.do_point_in_set(x, tol)
    }

    fn add_point_in_set_constraints(
        &self,
        prog: &mut Program,
        x: &[Variable],
    ) -> Result<(Vec<Variable>, Vec<Binding>)> {
        SetError::check_dim(self.ambient_dimension(), x.len())?;
        all_or_nothing(prog, |prog| self.do_add_point_in_set_constraints(prog, x))
    }

    fn add_point_in_nonnegative_scaling_constraints(
        &self,
        prog: &mut Program,
        x: &[Variable],
        t: Variable,
    ) -> Result<Vec<Binding>> {
        SetError::check_dim(self.ambient_dimension(), x.len())?;
        all_or_nothing(prog, |prog| {
            self.do_add_point_in_nonnegative_scaling_constraints(prog, x, t)
        })
    }

    fn add_point_in_nonnegative_scaling_constraints_affine(
        &self,
        prog: &mut Program,
        scaling: &AffineScaling,
        x: &[Variable],
        t: &[Variable],
    ) -> Result<Vec<Binding>> {
        scaling.validate(self.ambient_dimension(), x, t)?;
        all_or_nothing(prog, |prog| {
            self.do_add_point_in_nonnegative_scaling_constraints_affine(prog, scaling, x, t)
        })
    }

    fn is_empty(&self) -> Result<bool> {
        self.do_is_empty()
    }

    fn is_bounded(&self) -> Result<bool> {
        self.do_is_bounded()
    }

    fn maybe_get_point(&self) -> Result<Option<DVector<f64>>> {
        self.do_maybe_get_point()
    }

    fn maybe_calc_axis_aligned_bounding_box(&self) -> Result<Option<Hyperrectangle>> {
        self.do_maybe_calc_axis_aligned_bounding_box()
    }

    /// Exact volume.
    ///
    /// Errors
    /// - `VolumeUnsupported` if the set does not claim an exact volume.
    /// - `VolumeDefect` if it claims one but yields nothing, a negative or a
    ///   non-finite value.
    fn calc_volume(&self) -> Result<f64> {
        if !self.has_exact_volume() {
            return Err(SetError::VolumeUnsupported {
                set: self.type_name(),
            });
        }
        match self.do_calc_volume() {
            Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
            _ => Err(SetError::VolumeDefect {
                set: self.type_name(),
            }),
        }
    }

    /// Hit-or-miss volume estimate inside the axis-aligned bounding box.
    ///
    /// Stops once the relative standard error `sqrt((1-p)/(p·N))` is below
    /// `desired_rel_accuracy` (checked every `SAMPLE_CHECK_EVERY` samples) or
    /// `max_num_samples` is reached.
    fn calc_volume_via_sampling<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        desired_rel_accuracy: f64,
        max_num_samples: usize,
    ) -> Result<SampledVolume> {
        if !(desired_rel_accuracy > 0.0 && desired_rel_accuracy.is_finite()) {
            return Err(SetError::invalid(format!(
                "desired_rel_accuracy must be positive and finite, got {desired_rel_accuracy}"
            )));
        }
        if max_num_samples == 0 {
            return Err(SetError::invalid("max_num_samples must be positive"));
        }
        let bbox = self
            .maybe_calc_axis_aligned_bounding_box()?
            .ok_or(SetError::Unbounded {
                set: self.type_name(),
            })?;
        let box_volume = bbox.volume();
        if box_volume <= 0.0 {
            return Ok(SampledVolume {
                volume: 0.0,
                rel_accuracy: 0.0,
                num_samples: 0,
            });
        }

        let mut inside = 0usize;
        let mut n = 0usize;
        let mut rel = f64::INFINITY;
        while n < max_num_samples {
            let p = bbox.uniform_sample(rng);
            if self.do_point_in_set(&p, 0.0)? {
                inside += 1;
            }
            n += 1;
            if n % SAMPLE_CHECK_EVERY == 0 || n == max_num_samples {
                rel = relative_std_error(inside, n);
                if rel < desired_rel_accuracy {
                    break;
                }
            }
        }
        if rel >= desired_rel_accuracy {
            tracing::warn!(
                set = self.type_name(),
                samples = n,
                rel_accuracy = rel,
                desired = desired_rel_accuracy,
                "volume sampling hit the sample cap"
            );
        }
        Ok(SampledVolume {
            volume: box_volume * inside as f64 / n as f64,
            rel_accuracy: rel,
            num_samples: n,
        })
    }
}

impl<S: ConvexSet + ?Sized> ConvexSetExt for S {}

/// Relative standard error of a binomial acceptance ratio; infinite without hits.
fn relative_std_error(inside: usize, n: usize) -> f64 {
    if inside == 0 || n == 0 {
        return f64::INFINITY;
    }
    let p = inside as f64 / n as f64;
    ((1.0 - p) / (p * n as f64)).sqrt()
}

fn check_tolerance(tol: f64) -> Result<()> {
    if tol >= 0.0 {
        Ok(())
    } else {
        Err(SetError::invalid(format!(
            "tolerance must be non-negative, got {tol}"
        )))
    }
}

/// Run an emission; on error the program is restored to its prior state.
fn all_or_nothing<T>(
    prog: &mut Program,
    emit: impl FnOnce(&mut Program) -> Result<T>,
) -> Result<T> {
    let cp = prog.checkpoint();
    let out = emit(prog);
    if out.is_err() {
        prog.rollback(cp);
    }
    out
}

/// Zero-objective feasibility solve over the set's own constraints.
pub(crate) fn witness_point<S: ConvexSet + ?Sized>(set: &S) -> Result<Option<DVector<f64>>> {
    let mut prog = Program::new();
    let x = prog.new_continuous_variables(set.ambient_dimension(), "x");
    set.do_add_point_in_set_constraints(&mut prog, &x)?;
    let res = prog.solve()?;
    match res.status {
        SolutionStatus::Solved => Ok(Some(res.values(&x))),
        SolutionStatus::Infeasible => Ok(None),
        status => Err(SetError::Solver(format!(
            "feasibility solve for {} ended with {status:?}",
            set.type_name()
        ))),
    }
}

/// Tight box from `2·dim` LPs; `None` when the set is empty or unbounded.
pub(crate) fn bounding_box_via_lps<S: ConvexSet + ?Sized>(
    set: &S,
) -> Result<Option<Hyperrectangle>> {
    let n = set.ambient_dimension();
    let mut prog = Program::new();
    let x = prog.new_continuous_variables(n, "x");
    set.do_add_point_in_set_constraints(&mut prog, &x)?;

    let mut lb = DVector::zeros(n);
    let mut ub = DVector::zeros(n);
    for i in 0..n {
        for dir in [1.0, -1.0] {
            let cp = prog.checkpoint();
            prog.add_linear_cost(LinExpr::term(x[i], dir))?;
            let res = prog.solve()?;
            prog.rollback(cp);
            match res.status {
                SolutionStatus::Solved if dir > 0.0 => lb[i] = res.value(x[i]),
                SolutionStatus::Solved => ub[i] = res.value(x[i]),
                SolutionStatus::Infeasible | SolutionStatus::Unbounded => return Ok(None),
                SolutionStatus::Failed => {
                    return Err(SetError::Solver(format!(
                        "bounding-box LP for {} (coordinate {i}) failed",
                        set.type_name()
                    )))
                }
            }
        }
        // Flat directions can come back crossed by solver noise.
        if lb[i] > ub[i] {
            let mid = 0.5 * (lb[i] + ub[i]);
            lb[i] = mid;
            ub[i] = mid;
        }
    }
    Hyperrectangle::new(lb, ub).map(Some)
}

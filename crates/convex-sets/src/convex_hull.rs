//! Convex hull of a list of convex sets.
//!
//! Formulation
//! - `x ∈ conv(S₁ ∪ .. ∪ Sₖ)` iff `x = Σ yᵢ`, `yᵢ ∈ wᵢ·Sᵢ`, `wᵢ >= 0`,
//!   `Σ wᵢ = 1`. Each member writes its own `yᵢ ∈ wᵢ·Sᵢ` through the
//!   nonnegative-scaling hook, so nested hulls recurse without special cases.
//! - The scaling forms replace `Σ wᵢ = 1` by `Σ wᵢ = t` (or `cᵀt + d`) and `x`
//!   by `A x + b`, which scales the whole hull homogeneously.
//!
//! Emptiness convention
//! - The hull reports empty as soon as one member is empty, and then has no
//!   witness point and contains no point.
//! - Emitted constraints do not follow this convention. At `wᵢ = 0` a member
//!   contributes `{y : yᵢ ∈ 0·Sᵢ}`, which is `{0}` for bounded non-empty
//!   members but the recession cone `{y : A y <= 0}` for an unbounded or empty
//!   `HPolyhedron`. With such members the emitted system describes the closure
//!   of the hull plus those cones, not the set the queries answer for.
//!
//! Lifecycle
//! - Immutable after construction; every query recomputes (nothing cached).

use nalgebra::DVector;

use crate::cfg::SOLVE_DIST_EPS;
use crate::convex_set::{witness_point, AffineScaling, ConvexSet, ConvexSetExt};
use crate::convex_sets::ConvexSets;
use crate::error::{Result, SetError};
use crate::program::{offset_rows, var_rows, Binding, LinExpr, Program, SolutionStatus, Variable};
use crate::sets::Hyperrectangle;

/// Convex hull of its member sets (all of one ambient dimension).
#[derive(Clone, Debug)]
pub struct ConvexHull {
    sets: ConvexSets,
    dim: usize,
}

impl ConvexHull {
    /// Errors
    /// - `InvalidArgument` for an empty member list.
    /// - `DimensionMismatch` if members disagree on the ambient dimension.
    pub fn new(sets: ConvexSets) -> Result<Self> {
        let dim = sets
            .get(0)
            .ok_or_else(|| SetError::invalid("ConvexHull needs at least one member set"))?
            .ambient_dimension();
        for set in sets.iter() {
            SetError::check_dim(dim, set.ambient_dimension())?;
        }
        Ok(Self { sets, dim })
    }

    /// Members in construction order.
    #[inline]
    pub fn sets(&self) -> &ConvexSets {
        &self.sets
    }

    /// Emit `x_rows = Σ yᵢ`, `wᵢ >= 0`, `Σ wᵢ = scale`, `yᵢ ∈ wᵢ·Sᵢ`.
    ///
    /// New variables come back member by member: `yᵢ` then `wᵢ`.
    fn add_minkowski_combination(
        &self,
        prog: &mut Program,
        x_rows: Vec<LinExpr>,
        scale: LinExpr,
    ) -> Result<(Vec<Variable>, Vec<Binding>)> {
        let k = self.sets.len();
        let mut new_vars = Vec::with_capacity(k * (self.dim + 1));
        let mut ys = Vec::with_capacity(k);
        let mut ws = Vec::with_capacity(k);
        for i in 0..k {
            let y = prog.new_continuous_variables(self.dim, &format!("hull_y{i}"));
            let w = prog.new_continuous_variable(&format!("hull_w{i}"));
            new_vars.extend_from_slice(&y);
            new_vars.push(w);
            ys.push(y);
            ws.push(w);
        }

        let mut bindings = Vec::with_capacity(3 + 2 * k);
        let sum_rows = x_rows
            .into_iter()
            .enumerate()
            .map(|(j, row)| ys.iter().fold(row, |acc, y| acc - y[j]))
            .collect();
        bindings.push(prog.add_linear_equality(sum_rows)?);
        bindings.push(prog.add_linear_inequality(
            ws.iter().map(|&w| -LinExpr::from(w)).collect(),
        )?);
        bindings.push(prog.add_linear_equality(vec![LinExpr::sum(&ws) - scale])?);
        for (set, (y, &w)) in self.sets.iter().zip(ys.iter().zip(ws.iter())) {
            bindings.extend(set.add_point_in_nonnegative_scaling_constraints(prog, y, w)?);
        }
        tracing::trace!(
            members = k,
            dim = self.dim,
            constraints = bindings.len(),
            "convex hull emission"
        );
        Ok((new_vars, bindings))
    }
}

impl ConvexSet for ConvexHull {
    fn ambient_dimension(&self) -> usize {
        self.dim
    }

    fn has_exact_volume(&self) -> bool {
        false
    }

    fn clone_box(&self) -> Box<dyn ConvexSet> {
        Box::new(self.clone())
    }

    /// Euclidean distance from `x` to the hull (one SOCP), compared to `tol`.
    fn do_point_in_set(&self, x: &DVector<f64>, tol: f64) -> Result<bool> {
        if self.do_is_empty()? {
            return Ok(false);
        }
        let mut prog = Program::new();
        let z = prog.new_continuous_variables(self.dim, "z");
        self.do_add_point_in_set_constraints(&mut prog, &z)?;
        let dist = prog.add_l2_norm_cost(offset_rows(&z, x))?;
        let res = prog.solve()?;
        match res.status {
            SolutionStatus::Solved => Ok(res.value(dist) <= tol + SOLVE_DIST_EPS),
            SolutionStatus::Infeasible => Ok(false),
            status => Err(SetError::Solver(format!(
                "distance-to-hull solve ended with {status:?}"
            ))),
        }
    }

    fn do_add_point_in_set_constraints(
        &self,
        prog: &mut Program,
        x: &[Variable],
    ) -> Result<(Vec<Variable>, Vec<Binding>)> {
        self.add_minkowski_combination(prog, var_rows(x), LinExpr::constant(1.0))
    }

    fn do_add_point_in_nonnegative_scaling_constraints(
        &self,
        prog: &mut Program,
        x: &[Variable],
        t: Variable,
    ) -> Result<Vec<Binding>> {
        let (_, bindings) = self.add_minkowski_combination(prog, var_rows(x), t.into())?;
        Ok(bindings)
    }

    fn do_add_point_in_nonnegative_scaling_constraints_affine(
        &self,
        prog: &mut Program,
        scaling: &AffineScaling,
        x: &[Variable],
        t: &[Variable],
    ) -> Result<Vec<Binding>> {
        let (_, bindings) =
            self.add_minkowski_combination(prog, scaling.point_rows(x), scaling.scale_expr(t))?;
        Ok(bindings)
    }

    fn do_is_empty(&self) -> Result<bool> {
        for set in self.sets.iter() {
            if set.is_empty()? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn do_is_bounded(&self) -> Result<bool> {
        for set in self.sets.iter() {
            if !set.is_bounded()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn do_maybe_get_point(&self) -> Result<Option<DVector<f64>>> {
        if self.do_is_empty()? {
            return Ok(None);
        }
        witness_point(self)
    }

    /// Componentwise min/max over the members' boxes.
    fn do_maybe_calc_axis_aligned_bounding_box(&self) -> Result<Option<Hyperrectangle>> {
        let mut acc: Option<(DVector<f64>, DVector<f64>)> = None;
        for set in self.sets.iter() {
            let Some(bbox) = set.maybe_calc_axis_aligned_bounding_box()? else {
                return Ok(None);
            };
            acc = Some(match acc {
                None => (bbox.lb().clone(), bbox.ub().clone()),
                Some((lb, ub)) => (lb.inf(bbox.lb()), ub.sup(bbox.ub())),
            });
        }
        match acc {
            Some((lb, ub)) => Hyperrectangle::new(lb, ub).map(Some),
            None => Ok(None),
        }
    }
}

//! Axis-aligned box `{x : lb <= x <= ub}`.
//!
//! Membership slack is per coordinate (`lb - tol <= x <= ub + tol`), i.e. an
//! `∞`-norm distance, not a Euclidean one.

use nalgebra::DVector;
use rand::Rng;

use super::add_nonnegative;
use crate::convex_set::{AffineScaling, ConvexSet};
use crate::error::{Result, SetError};
use crate::program::{Binding, LinExpr, Program, Variable};

/// Closed axis-aligned box.
///
/// Invariants:
/// - `lb.len() == ub.len()`, all bounds finite, `lb <= ub` componentwise.
/// - Degenerate (flat) directions are allowed.
#[derive(Clone, Debug, PartialEq)]
pub struct Hyperrectangle {
    lb: DVector<f64>,
    ub: DVector<f64>,
}

impl Hyperrectangle {
    pub fn new(lb: DVector<f64>, ub: DVector<f64>) -> Result<Self> {
        SetError::check_dim(lb.len(), ub.len())?;
        for i in 0..lb.len() {
            if !(lb[i].is_finite() && ub[i].is_finite()) {
                return Err(SetError::invalid(format!(
                    "hyperrectangle bounds must be finite (coordinate {i})"
                )));
            }
            if lb[i] > ub[i] {
                return Err(SetError::invalid(format!(
                    "hyperrectangle needs lb <= ub, got {} > {} at coordinate {i}",
                    lb[i], ub[i]
                )));
            }
        }
        Ok(Self { lb, ub })
    }

    #[inline]
    pub fn lb(&self) -> &DVector<f64> {
        &self.lb
    }

    #[inline]
    pub fn ub(&self) -> &DVector<f64> {
        &self.ub
    }

    pub fn center(&self) -> DVector<f64> {
        (&self.lb + &self.ub) * 0.5
    }

    /// `Π (ubᵢ - lbᵢ)`.
    pub fn volume(&self) -> f64 {
        (&self.ub - &self.lb).iter().product()
    }

    /// Uniform draw from the box.
    pub fn uniform_sample<R: Rng + ?Sized>(&self, rng: &mut R) -> DVector<f64> {
        DVector::from_iterator(
            self.lb.len(),
            self.lb
                .iter()
                .zip(self.ub.iter())
                .map(|(&lo, &hi)| lo + (hi - lo) * rng.gen::<f64>()),
        )
    }

    /// Rows `z - s·ub <= 0`, `s·lb - z <= 0` for `z ∈ s·box`.
    fn scaled_rows(&self, z: Vec<LinExpr>, s: &LinExpr) -> Vec<LinExpr> {
        let mut rows = Vec::with_capacity(2 * z.len());
        for (i, zi) in z.into_iter().enumerate() {
            rows.push(zi.clone() - s.clone() * self.ub[i]);
            rows.push(s.clone() * self.lb[i] - zi);
        }
        rows
    }
}

impl ConvexSet for Hyperrectangle {
    fn ambient_dimension(&self) -> usize {
        self.lb.len()
    }

    fn has_exact_volume(&self) -> bool {
        true
    }

    fn clone_box(&self) -> Box<dyn ConvexSet> {
        Box::new(self.clone())
    }

    fn do_point_in_set(&self, x: &DVector<f64>, tol: f64) -> Result<bool> {
        Ok((0..x.len()).all(|i| x[i] >= self.lb[i] - tol && x[i] <= self.ub[i] + tol))
    }

    fn do_add_point_in_set_constraints(
        &self,
        prog: &mut Program,
        x: &[Variable],
    ) -> Result<(Vec<Variable>, Vec<Binding>)> {
        let mut rows = Vec::with_capacity(2 * x.len());
        for (i, &xi) in x.iter().enumerate() {
            rows.push(LinExpr::from(xi) - self.ub[i]);
            rows.push(LinExpr::constant(self.lb[i]) - xi);
        }
        let ineq = prog.add_linear_inequality(rows)?;
        Ok((Vec::new(), vec![ineq]))
    }

    fn do_add_point_in_nonnegative_scaling_constraints(
        &self,
        prog: &mut Program,
        x: &[Variable],
        t: Variable,
    ) -> Result<Vec<Binding>> {
        let z = x.iter().map(|&xi| LinExpr::from(xi)).collect();
        let s = LinExpr::from(t);
        let ineq = prog.add_linear_inequality(self.scaled_rows(z, &s))?;
        let nonneg = add_nonnegative(prog, s)?;
        Ok(vec![ineq, nonneg])
    }

    fn do_add_point_in_nonnegative_scaling_constraints_affine(
        &self,
        prog: &mut Program,
        scaling: &AffineScaling,
        x: &[Variable],
        t: &[Variable],
    ) -> Result<Vec<Binding>> {
        let s = scaling.scale_expr(t);
        let ineq = prog.add_linear_inequality(self.scaled_rows(scaling.point_rows(x), &s))?;
        let nonneg = add_nonnegative(prog, s)?;
        Ok(vec![ineq, nonneg])
    }

    fn do_is_empty(&self) -> Result<bool> {
        Ok(false)
    }

    fn do_is_bounded(&self) -> Result<bool> {
        Ok(true)
    }

    fn do_maybe_get_point(&self) -> Result<Option<DVector<f64>>> {
        Ok(Some(self.center()))
    }

    fn do_calc_volume(&self) -> Option<f64> {
        Some(self.volume())
    }

    fn do_maybe_calc_axis_aligned_bounding_box(&self) -> Result<Option<Hyperrectangle>> {
        Ok(Some(self.clone()))
    }
}

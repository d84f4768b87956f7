//! Singleton set `{p}`.

use nalgebra::DVector;

use super::{add_nonnegative, Hyperrectangle};
use crate::convex_set::{AffineScaling, ConvexSet};
use crate::error::{Result, SetError};
use crate::program::{offset_rows, Binding, LinExpr, Program, Variable};

/// A single point in `ℝⁿ`.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    x: DVector<f64>,
}

impl Point {
    /// Errors with `InvalidArgument` on non-finite coordinates.
    pub fn new(x: DVector<f64>) -> Result<Self> {
        check_finite(&x)?;
        Ok(Self { x })
    }

    #[inline]
    pub fn x(&self) -> &DVector<f64> {
        &self.x
    }

    /// Move the point; the dimension cannot change.
    pub fn set_x(&mut self, x: DVector<f64>) -> Result<()> {
        SetError::check_dim(self.x.len(), x.len())?;
        check_finite(&x)?;
        self.x = x;
        Ok(())
    }
}

fn check_finite(x: &DVector<f64>) -> Result<()> {
    if x.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(SetError::invalid("Point coordinates must be finite"))
    }
}

impl ConvexSet for Point {
    fn ambient_dimension(&self) -> usize {
        self.x.len()
    }

    fn has_exact_volume(&self) -> bool {
        true
    }

    fn clone_box(&self) -> Box<dyn ConvexSet> {
        Box::new(self.clone())
    }

    fn do_point_in_set(&self, x: &DVector<f64>, tol: f64) -> Result<bool> {
        Ok((x - &self.x).norm() <= tol)
    }

    fn do_add_point_in_set_constraints(
        &self,
        prog: &mut Program,
        x: &[Variable],
    ) -> Result<(Vec<Variable>, Vec<Binding>)> {
        let eq = prog.add_linear_equality(offset_rows(x, &self.x))?;
        Ok((Vec::new(), vec![eq]))
    }

    fn do_add_point_in_nonnegative_scaling_constraints(
        &self,
        prog: &mut Program,
        x: &[Variable],
        t: Variable,
    ) -> Result<Vec<Binding>> {
        // x - t·p == 0
        let rows = x
            .iter()
            .zip(self.x.iter())
            .map(|(&xi, &pi)| LinExpr::from(xi) - LinExpr::term(t, pi))
            .collect();
        let eq = prog.add_linear_equality(rows)?;
        let nonneg = add_nonnegative(prog, LinExpr::from(t))?;
        Ok(vec![eq, nonneg])
    }

    fn do_add_point_in_nonnegative_scaling_constraints_affine(
        &self,
        prog: &mut Program,
        scaling: &AffineScaling,
        x: &[Variable],
        t: &[Variable],
    ) -> Result<Vec<Binding>> {
        // A x + b - (cᵀt + d)·p == 0
        let s = scaling.scale_expr(t);
        let rows = scaling
            .point_rows(x)
            .into_iter()
            .zip(self.x.iter())
            .map(|(row, &pi)| row - s.clone() * pi)
            .collect();
        let eq = prog.add_linear_equality(rows)?;
        let nonneg = add_nonnegative(prog, s)?;
        Ok(vec![eq, nonneg])
    }

    fn do_is_empty(&self) -> Result<bool> {
        Ok(false)
    }

    fn do_is_bounded(&self) -> Result<bool> {
        Ok(true)
    }

    fn do_maybe_get_point(&self) -> Result<Option<DVector<f64>>> {
        Ok(Some(self.x.clone()))
    }

    fn do_calc_volume(&self) -> Option<f64> {
        Some(0.0)
    }

    fn do_maybe_calc_axis_aligned_bounding_box(&self) -> Result<Option<Hyperrectangle>> {
        Hyperrectangle::new(self.x.clone(), self.x.clone()).map(Some)
    }
}

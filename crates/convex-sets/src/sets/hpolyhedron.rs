//! Halfspace intersection `{x : A x <= b}`.
//!
//! No structural invariants beyond shapes: rows need not be normalized, the
//! set may be empty or unbounded. Emptiness, boundedness, witness points and
//! the bounding box all come from LPs over the defining rows.
//!
//! Membership slack is per row, `A x <= b + tol`, in the units of the rows as
//! given. Rows are not normalized, so `tol` is a Euclidean distance only for
//! unit-norm rows.

use nalgebra::{DMatrix, DVector};

use super::add_nonnegative;
use crate::convex_set::{AffineScaling, ConvexSet};
use crate::error::{Result, SetError};
use crate::program::{affine_rows, Binding, LinExpr, Program, Variable};

/// Polyhedron in H-representation.
#[derive(Clone, Debug, PartialEq)]
pub struct HPolyhedron {
    a: DMatrix<f64>,
    b: DVector<f64>,
}

impl HPolyhedron {
    pub fn new(a: DMatrix<f64>, b: DVector<f64>) -> Result<Self> {
        SetError::check_dim(a.nrows(), b.len())?;
        if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
            return Err(SetError::invalid("HPolyhedron data must be finite"));
        }
        Ok(Self { a, b })
    }

    /// Box `lb <= x <= ub` as `[I; -I] x <= [ub; -lb]`.
    pub fn make_box(lb: &DVector<f64>, ub: &DVector<f64>) -> Result<Self> {
        SetError::check_dim(lb.len(), ub.len())?;
        let n = lb.len();
        let mut a = DMatrix::zeros(2 * n, n);
        let mut b = DVector::zeros(2 * n);
        for i in 0..n {
            a[(i, i)] = 1.0;
            b[i] = ub[i];
            a[(n + i, i)] = -1.0;
            b[n + i] = -lb[i];
        }
        Self::new(a, b)
    }

    /// `[-1, 1]ⁿ`.
    pub fn make_unit_box(dim: usize) -> Self {
        let mut a = DMatrix::zeros(2 * dim, dim);
        for i in 0..dim {
            a[(i, i)] = 1.0;
            a[(dim + i, i)] = -1.0;
        }
        Self {
            a,
            b: DVector::from_element(2 * dim, 1.0),
        }
    }

    #[inline]
    pub fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    #[inline]
    pub fn b(&self) -> &DVector<f64> {
        &self.b
    }

    /// Rows `A z - s·b` for `z` given as `M x + v`.
    fn scaled_rows(
        &self,
        m: &DMatrix<f64>,
        v: &DVector<f64>,
        x: &[Variable],
        s: &LinExpr,
    ) -> Vec<LinExpr> {
        let am = &self.a * m;
        let av = &self.a * v;
        affine_rows(&am, &av, x)
            .into_iter()
            .zip(self.b.iter())
            .map(|(row, &bi)| row - s.clone() * bi)
            .collect()
    }
}

impl ConvexSet for HPolyhedron {
    fn ambient_dimension(&self) -> usize {
        self.a.ncols()
    }

    fn has_exact_volume(&self) -> bool {
        false
    }

    fn clone_box(&self) -> Box<dyn ConvexSet> {
        Box::new(self.clone())
    }

    fn do_point_in_set(&self, x: &DVector<f64>, tol: f64) -> Result<bool> {
        let ax = &self.a * x;
        Ok(ax.iter().zip(self.b.iter()).all(|(&l, &r)| l <= r + tol))
    }

    fn do_add_point_in_set_constraints(
        &self,
        prog: &mut Program,
        x: &[Variable],
    ) -> Result<(Vec<Variable>, Vec<Binding>)> {
        let ineq = prog.add_linear_inequality(affine_rows(&self.a, &(-&self.b), x))?;
        Ok((Vec::new(), vec![ineq]))
    }

    fn do_add_point_in_nonnegative_scaling_constraints(
        &self,
        prog: &mut Program,
        x: &[Variable],
        t: Variable,
    ) -> Result<Vec<Binding>> {
        let n = x.len();
        let s = LinExpr::from(t);
        let rows = self.scaled_rows(&DMatrix::identity(n, n), &DVector::zeros(n), x, &s);
        let ineq = prog.add_linear_inequality(rows)?;
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
        let rows = self.scaled_rows(&scaling.a, &scaling.b, x, &s);
        let ineq = prog.add_linear_inequality(rows)?;
        let nonneg = add_nonnegative(prog, s)?;
        Ok(vec![ineq, nonneg])
    }
}

//! Leaf convex sets.
//!
//! - `Point`: a single point (zero volume).
//! - `Hyperrectangle`: axis-aligned box `lb <= x <= ub`.
//! - `HPolyhedron`: halfspace intersection `A x <= b`, possibly empty or unbounded.
//!
//! All three write plain linear rows; nonnegative scaling multiplies the
//! right-hand data by the scale expression and pins the scale to `>= 0`.

mod hpolyhedron;
mod hyperrectangle;
mod point;

pub use hpolyhedron::HPolyhedron;
pub use hyperrectangle::Hyperrectangle;
pub use point::Point;

use crate::error::Result;
use crate::program::{Binding, LinExpr, Program};

/// `-s <= 0`.
pub(crate) fn add_nonnegative(prog: &mut Program, s: LinExpr) -> Result<Binding> {
    prog.add_linear_inequality(vec![-s])
}

//! Convex sets that can emit themselves as constraints into a conic program.
//!
//! Layout
//! - `program`: the conic program builder (variables, affine rows, costs) and
//!   its Clarabel backend. Sets write into it; callers add costs and solve.
//! - `convex_set`: the `ConvexSet` hooks every variant implements and the
//!   checked `ConvexSetExt` surface callers use.
//! - `sets`: leaf variants (`Point`, `Hyperrectangle`, `HPolyhedron`).
//! - `convex_sets`: owning container of boxed sets plus `make_convex_sets!`.
//! - `convex_hull`: `ConvexHull`, the recursive Minkowski-combination set.
//!
//! Conventions
//! - Points are `DVector<f64>`; matrices are `DMatrix<f64>`.
//! - Empty or unbounded geometry is a return value, never an error.
//! - Tolerance defaults live in `cfg` and are not tuned per call site.

pub mod cfg;
pub mod convex_hull;
pub mod convex_set;
pub mod convex_sets;
pub mod error;
pub mod program;
pub mod sets;

pub use cfg::SolverCfg;
pub use convex_hull::ConvexHull;
pub use convex_set::{AffineScaling, ConvexSet, ConvexSetExt, SampledVolume};
pub use convex_sets::{ConvexSets, IntoConvexSet};
pub use error::{Result, SetError};
pub use program::{
    Binding, Checkpoint, ConstraintKind, LinExpr, Program, SolutionStatus, SolveResult, Variable,
};
pub use sets::{HPolyhedron, Hyperrectangle, Point};

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::make_convex_sets;
    pub use crate::{
        AffineScaling, ConvexHull, ConvexSet, ConvexSetExt, ConvexSets, HPolyhedron,
        Hyperrectangle, LinExpr, Point, Program, SetError, Variable,
    };
    pub use nalgebra::{DMatrix, DVector};
}

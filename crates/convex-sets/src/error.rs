//! Error type shared by sets, the hull and the program builder.
//!
//! Empty and unbounded geometry are ordinary return values (`false`, `None`)
//! and never show up here.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SetError>;

#[derive(Debug, Error)]
pub enum SetError {
    /// A point, variable slice or member set has the wrong dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Malformed input that is not a dimension problem (bad bounds, NaN, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `calc_volume` on a set that never promised an exact volume.
    #[error(
        "{set} reports that it cannot report an exact volume; use calc_volume_via_sampling instead"
    )]
    VolumeUnsupported { set: &'static str },

    /// A set promised an exact volume but could not deliver a usable one.
    #[error(
        "{set} has a defect: has_exact_volume() is reporting true, but no usable volume was computed"
    )]
    VolumeDefect { set: &'static str },

    /// An operation that needs a bounding box was called on an unbounded set.
    #[error("{set} is unbounded (or empty); no axis-aligned bounding box exists")]
    Unbounded { set: &'static str },

    /// The underlying solver did not reach a usable status.
    #[error("solver failure: {0}")]
    Solver(String),
}

impl SetError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    pub(crate) fn check_dim(expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::DimensionMismatch { expected, actual })
        }
    }
}

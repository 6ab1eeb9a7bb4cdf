//! Variance and nullability markers.

use std::fmt;

/// Variance of a type parameter or type argument.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Variance {
    /// Invariant unless the use site says otherwise.
    #[default]
    Unspecified,
    /// Contravariant; values only flow in.
    In,
    /// Covariant; values only flow out.
    Out,
}

impl Variance {
    pub const fn is_specified(self) -> bool {
        !matches!(self, Variance::Unspecified)
    }
}

impl fmt::Display for Variance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variance::Unspecified => f.write_str("invariant"),
            Variance::In => f.write_str("in"),
            Variance::Out => f.write_str("out"),
        }
    }
}

/// Requested change to the nullability of a type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Nullability {
    /// Keep whatever the type says.
    #[default]
    Unspecified,
    Nullable,
    NotNullable,
}

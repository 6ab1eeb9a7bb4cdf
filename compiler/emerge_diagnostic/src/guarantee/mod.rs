//! Proof that an error has been reported.

use std::fmt;

/// Type-level proof that at least one error-level diagnostic was emitted.
///
/// Only obtainable from a sink that actually holds errors, so a caller that
/// receives one can stop (e.g. skip lowering) without re-checking.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ErrorGuaranteed(());

impl ErrorGuaranteed {
    /// `Some` iff `count` is non-zero.
    pub fn from_error_count(count: usize) -> Option<Self> {
        (count > 0).then_some(ErrorGuaranteed(()))
    }
}

impl fmt::Display for ErrorGuaranteed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error(s) emitted")
    }
}

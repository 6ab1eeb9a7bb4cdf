//! Fatal contract violations.
//!
//! These are bugs in the driver or the binding layer, never in the program
//! under analysis; user errors are always [`Diagnostic`](emerge_diagnostic::Diagnostic)s.

use thiserror::Error;

use crate::phase::Phase;

/// A broken invariant of the analysis protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InternalCompilerError {
    #[error("{entity}: phase {requested} requested before phase {missing} completed")]
    PhaseOrder {
        entity: String,
        requested: Phase,
        missing: Phase,
    },

    #[error("write beyond the purity boundary visited after a read in {function}")]
    WriteAfterRead { function: String },

    #[error("{entity} has not been analyzed far enough to {purpose}")]
    NotAnalyzed { entity: String, purpose: &'static str },

    #[error("{entity} cannot be lowered: its {part} has no valid type")]
    ErroneousSignature { entity: String, part: String },
}

//! Purity and effect tracking.
//!
//! A function's purity draws a boundary around it: state owned by the
//! function (parameters, locals) is inside, everything else (globals,
//! functions that read or write globals) is outside. The binding layer walks
//! a function body and reports every read and write that crosses the
//! boundary to an [`ImpurityVisitor`]; what happens with them is up to the
//! visitor.
//!
//! Walk order is part of the contract: all writes are visited before any
//! read. An assignment target is also visited as a read by the reads walk,
//! so [`PurityViolationVisitor`] suppresses reads at locations it already
//! reported as writes.

mod initialization;
mod lifetime;
mod prediction;

use rustc_hash::FxHashSet;

use emerge_diagnostic::{Diagnostic, ErrorCode};
use emerge_ir::Span;
use emerge_types::Purity;

use crate::binding::ExprId;
use crate::InternalCompilerError;

pub use initialization::VariableInitialization;
pub use lifetime::VariableLifetime;
pub use prediction::SideEffectPrediction;

/// The function whose boundary is being checked.
#[derive(Clone, Debug)]
pub struct Boundary {
    pub name: String,
    pub purity: Purity,
    pub span: Span,
}

/// A read or write of state outside the boundary.
#[derive(Clone, Debug)]
pub struct Impurity {
    /// The expression performing the access; one expression may be both
    /// written and read.
    pub site: ExprId,
    pub span: Span,
    /// What is accessed, for messages, e.g. "global variable `counter`".
    pub subject: String,
}

/// Receives the boundary crossings found in a function body.
pub trait ImpurityVisitor {
    fn visit_read_beyond_boundary(
        &mut self,
        boundary: &Boundary,
        impurity: &Impurity,
    ) -> Result<(), InternalCompilerError>;

    fn visit_write_beyond_boundary(
        &mut self,
        boundary: &Boundary,
        impurity: &Impurity,
    ) -> Result<(), InternalCompilerError>;
}

/// Turns crossings the boundary's purity forbids into `E4001` / `E4002`.
#[derive(Debug, Default)]
pub struct PurityViolationVisitor {
    written: FxHashSet<ExprId>,
    read_seen: bool,
    diagnostics: Vec<Diagnostic>,
}

impl PurityViolationVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl ImpurityVisitor for PurityViolationVisitor {
    fn visit_read_beyond_boundary(
        &mut self,
        boundary: &Boundary,
        impurity: &Impurity,
    ) -> Result<(), InternalCompilerError> {
        self.read_seen = true;
        if boundary.purity.contains(Purity::ReadOnly) || self.written.contains(&impurity.site) {
            return Ok(());
        }
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::E4001)
                .with_message(format!(
                    "`{}` is declared {} but reads {}",
                    boundary.name, boundary.purity, impurity.subject
                ))
                .with_label(impurity.span, "reads beyond the purity boundary")
                .with_secondary_label(boundary.span, format!("declared {}", boundary.purity)),
        );
        Ok(())
    }

    fn visit_write_beyond_boundary(
        &mut self,
        boundary: &Boundary,
        impurity: &Impurity,
    ) -> Result<(), InternalCompilerError> {
        if self.read_seen {
            return Err(InternalCompilerError::WriteAfterRead {
                function: boundary.name.clone(),
            });
        }
        if boundary.purity.contains(Purity::Modifying) {
            return Ok(());
        }
        self.written.insert(impurity.site);
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::E4002)
                .with_message(format!(
                    "`{}` is declared {} but modifies {}",
                    boundary.name, boundary.purity, impurity.subject
                ))
                .with_label(impurity.span, "writes beyond the purity boundary")
                .with_secondary_label(boundary.span, format!("declared {}", boundary.purity)),
        );
        Ok(())
    }
}

/// Finds out whether one particular expression crosses the boundary.
#[derive(Debug)]
pub struct DetectingVisitor {
    look_for: ExprId,
    found_as_reading: bool,
    found_as_writing: bool,
}

impl DetectingVisitor {
    pub fn new(look_for: ExprId) -> Self {
        DetectingVisitor {
            look_for,
            found_as_reading: false,
            found_as_writing: false,
        }
    }

    pub fn found_as_reading(&self) -> bool {
        self.found_as_reading
    }

    pub fn found_as_writing(&self) -> bool {
        self.found_as_writing
    }
}

impl ImpurityVisitor for DetectingVisitor {
    fn visit_read_beyond_boundary(
        &mut self,
        _boundary: &Boundary,
        impurity: &Impurity,
    ) -> Result<(), InternalCompilerError> {
        self.found_as_reading |= impurity.site == self.look_for;
        Ok(())
    }

    fn visit_write_beyond_boundary(
        &mut self,
        _boundary: &Boundary,
        impurity: &Impurity,
    ) -> Result<(), InternalCompilerError> {
        self.found_as_writing |= impurity.site == self.look_for;
        Ok(())
    }
}

#[cfg(test)]
mod tests;

//! The three-phase analysis protocol.
//!
//! Every bound entity is analyzed in three phases:
//!
//! 1. declaration-level resolution (signatures, supertypes, duplicates)
//! 2. bodies and inference
//! 3. effect and whole-program checks (purity, nothrow, overload disjointness)
//!
//! Each phase runs at most once per entity and memoizes its diagnostics, so
//! an entity reached from several places (a global read by two functions)
//! is analyzed and reported once. Requesting a phase before the previous one
//! completed is a driver bug and surfaces as
//! [`InternalCompilerError::PhaseOrder`].
//!
//! [`CycleGuard`] complements the tracker for queries that may recurse into
//! the entity currently being analyzed, e.g. type inference of `x = y; y = x`.

mod cycle;

use std::cell::{Cell, OnceCell};
use std::fmt;
use std::rc::Rc;

use emerge_diagnostic::Diagnostic;

use crate::InternalCompilerError;

pub use cycle::{CycleGuard, Guarded};

/// One of the three analysis phases.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Phase {
    One,
    Two,
    Three,
}

impl Phase {
    const fn index(self) -> usize {
        match self {
            Phase::One => 0,
            Phase::Two => 1,
            Phase::Three => 2,
        }
    }

    const fn previous(self) -> Option<Phase> {
        match self {
            Phase::One => None,
            Phase::Two => Some(Phase::One),
            Phase::Three => Some(Phase::Two),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index() + 1)
    }
}

#[derive(Clone, Debug)]
struct PhaseOutcome {
    diagnostics: Rc<[Diagnostic]>,
    had_errors: bool,
}

/// Memoized phase state of one entity.
#[derive(Debug)]
pub struct PhaseTracker {
    label: String,
    outcomes: [OnceCell<PhaseOutcome>; 3],
    running: [Cell<bool>; 3],
}

impl PhaseTracker {
    /// `label` names the entity in contract-violation errors.
    pub fn new(label: impl Into<String>) -> Self {
        PhaseTracker {
            label: label.into(),
            outcomes: Default::default(),
            running: Default::default(),
        }
    }

    pub fn phase1(
        &self,
        analyze: impl FnOnce() -> Result<Vec<Diagnostic>, InternalCompilerError>,
    ) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        self.run(Phase::One, analyze)
    }

    pub fn phase2(
        &self,
        analyze: impl FnOnce() -> Result<Vec<Diagnostic>, InternalCompilerError>,
    ) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        self.run(Phase::Two, analyze)
    }

    /// Phase 3 is skipped, and memoized as empty, when `run_if_errors` is
    /// false and phase 1 or 2 reported an error.
    pub fn phase3(
        &self,
        run_if_errors: bool,
        analyze: impl FnOnce() -> Result<Vec<Diagnostic>, InternalCompilerError>,
    ) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        self.require_completed(Phase::Three)?;
        if !run_if_errors && self.had_errors() {
            let outcome = self.outcomes[Phase::Three.index()].get_or_init(|| {
                tracing::debug!(entity = %self.label, "skipping phase 3 after errors");
                PhaseOutcome {
                    diagnostics: Rc::from([]),
                    had_errors: false,
                }
            });
            return Ok(Rc::clone(&outcome.diagnostics));
        }
        self.run(Phase::Three, analyze)
    }

    fn run(
        &self,
        phase: Phase,
        analyze: impl FnOnce() -> Result<Vec<Diagnostic>, InternalCompilerError>,
    ) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        self.require_completed(phase)?;
        if let Some(outcome) = self.outcomes[phase.index()].get() {
            return Ok(Rc::clone(&outcome.diagnostics));
        }
        let running = &self.running[phase.index()];
        if running.get() {
            // Re-entered from within the same phase; the outer call reports.
            tracing::trace!(entity = %self.label, %phase, "phase re-entered");
            return Ok(Rc::from([]));
        }

        running.set(true);
        let result = analyze();
        running.set(false);

        let diagnostics = result?;
        let outcome = PhaseOutcome {
            had_errors: diagnostics.iter().any(Diagnostic::is_error),
            diagnostics: diagnostics.into(),
        };
        tracing::trace!(
            entity = %self.label,
            %phase,
            count = outcome.diagnostics.len(),
            "phase completed"
        );
        let outcome = self.outcomes[phase.index()].get_or_init(|| outcome);
        Ok(Rc::clone(&outcome.diagnostics))
    }

    fn require_completed(&self, phase: Phase) -> Result<(), InternalCompilerError> {
        match phase.previous() {
            Some(missing) if !self.is_done(missing) => Err(InternalCompilerError::PhaseOrder {
                entity: self.label.clone(),
                requested: phase,
                missing,
            }),
            _ => Ok(()),
        }
    }

    pub fn is_done(&self, phase: Phase) -> bool {
        self.outcomes[phase.index()].get().is_some()
    }

    pub fn is_running(&self, phase: Phase) -> bool {
        self.running[phase.index()].get()
    }

    /// Whether phase 1 or 2 reported an error.
    pub fn had_errors(&self) -> bool {
        self.outcomes[..Phase::Three.index()]
            .iter()
            .filter_map(OnceCell::get)
            .any(|o| o.had_errors)
    }

    /// Memoized diagnostics of a completed phase.
    pub fn diagnostics(&self, phase: Phase) -> Option<Rc<[Diagnostic]>> {
        self.outcomes[phase.index()].get().map(|o| Rc::clone(&o.diagnostics))
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

//! The unification accumulator.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use emerge_diagnostic::Diagnostic;

use crate::{TypeParamId, TypeRef, TypeRegistry};

/// What is known about one type variable.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableState {
    /// The declared bound, with type variables substituted.
    pub static_upper: TypeRef,
    pub upper: TypeRef,
    /// `Nothing` until a value is assigned.
    pub lower: TypeRef,
    /// Pinned by an explicit type argument.
    pub exact: bool,
}

/// Rewrites diagnostics as they are added to a [`TypeUnification`].
pub type DiagnosticDecorator = Rc<dyn Fn(Diagnostic) -> Diagnostic>;

/// Immutable result of a sequence of unification steps.
///
/// Every step consumes the accumulator and returns the next one; clone to
/// try a step without committing to it. Diagnostics are append-only, so a
/// previous accumulator is always a prefix of its successors.
#[derive(Clone, Default)]
pub struct TypeUnification {
    states: Rc<FxHashMap<TypeParamId, VariableState>>,
    diagnostics: Rc<Vec<Diagnostic>>,
    decorator: Option<DiagnosticDecorator>,
}

impl TypeUnification {
    /// No variables, no diagnostics.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_states(states: FxHashMap<TypeParamId, VariableState>) -> Self {
        TypeUnification {
            states: Rc::new(states),
            diagnostics: Rc::default(),
            decorator: None,
        }
    }

    /// Add a diagnostic, passing it through the decorator if one is set.
    ///
    /// Repeats are kept so that [`errors_since`](Self::errors_since) sees
    /// every step; the diagnostics sink drops exact duplicates.
    pub fn plus_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        let diagnostic = match &self.decorator {
            Some(decorate) => decorate(diagnostic),
            None => diagnostic,
        };
        Rc::make_mut(&mut self.diagnostics).push(diagnostic);
        self
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Errors added since `previous`, which must be an ancestor of `self`.
    pub fn errors_since<'a>(&'a self, previous: &TypeUnification) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics
            .get(previous.diagnostics.len()..)
            .unwrap_or(&[])
            .iter()
            .filter(|d| d.is_error())
    }

    pub fn has_errors_since(&self, previous: &TypeUnification) -> bool {
        self.errors_since(previous).next().is_some()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn state(&self, param: TypeParamId) -> Option<&VariableState> {
        self.states.get(&param)
    }

    /// Whether `param` is under inference in this accumulator.
    pub fn is_inferring(&self, param: TypeParamId) -> bool {
        self.states.contains_key(&param)
    }

    #[must_use]
    pub fn with_state(mut self, param: TypeParamId, state: VariableState) -> Self {
        Rc::make_mut(&mut self.states).insert(param, state);
        self
    }

    /// Keep the variable states of `self`, but the diagnostics of `other`.
    #[must_use]
    pub(crate) fn with_diagnostics_of(mut self, other: &TypeUnification) -> Self {
        self.diagnostics = Rc::clone(&other.diagnostics);
        self
    }

    pub fn decorator(&self) -> Option<DiagnosticDecorator> {
        self.decorator.clone()
    }

    /// Replace the decorator; diagnostics already added are not touched.
    #[must_use]
    pub fn with_decorator(mut self, decorator: Option<DiagnosticDecorator>) -> Self {
        self.decorator = decorator;
        self
    }

    /// Combine the states and diagnostics of two accumulators.
    ///
    /// When both hold a different state for the same parameter,
    /// `on_conflict` picks the state to keep and may report a diagnostic.
    #[must_use]
    pub fn merged_with(
        mut self,
        other: &TypeUnification,
        mut on_conflict: impl FnMut(TypeParamId, &VariableState, &VariableState) -> (VariableState, Option<Diagnostic>),
    ) -> Self {
        let mut reported = Vec::new();
        for (param, theirs) in other.states.iter() {
            let merged = match self.states.get(param) {
                None => theirs.clone(),
                Some(ours) if ours == theirs => continue,
                Some(ours) => {
                    let (state, diagnostic) = on_conflict(*param, ours, theirs);
                    reported.extend(diagnostic);
                    state
                }
            };
            Rc::make_mut(&mut self.states).insert(*param, merged);
        }
        // Both sides usually share a prefix of diagnostics.
        for diagnostic in other.diagnostics.iter().cloned() {
            if !self.diagnostics.contains(&diagnostic) {
                self = self.plus_diagnostic(diagnostic);
            }
        }
        for diagnostic in reported {
            self = self.plus_diagnostic(diagnostic);
        }
        self
    }

    /// The inferred value of `param`.
    pub fn final_value_for(&self, reg: &TypeRegistry, param: TypeParamId) -> TypeRef {
        crate::instantiate::final_value_for(reg, self, param)
    }

    /// Every parameter under inference with its inferred value.
    pub fn bindings(&self, reg: &TypeRegistry) -> Vec<(TypeParamId, TypeRef)> {
        let mut params: Vec<TypeParamId> = self.states.keys().copied().collect();
        params.sort_unstable();
        params
            .into_iter()
            .map(|param| (param, self.final_value_for(reg, param)))
            .collect()
    }
}

impl fmt::Debug for TypeUnification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeUnification")
            .field("states", &self.states)
            .field("errors", &self.diagnostics.iter().filter(|d| d.is_error()).count())
            .field("decorated", &self.decorator.is_some())
            .finish()
    }
}

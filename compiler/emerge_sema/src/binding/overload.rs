//! Overload sets: functions sharing a name and parameter count.
//!
//! An invocation picks its overload from the argument types alone, so the
//! overloads of a set must be told apart by at least one parameter position
//! at which every pair of them is disjoint.

use std::rc::Rc;

use emerge_diagnostic::{Diagnostic, ErrorCode};
use emerge_ir::{Name, PackagePath};

use crate::phase::PhaseTracker;
use crate::InternalCompilerError;

use super::{FnId, OverloadSetId, Program};

#[derive(Debug)]
pub struct BoundOverloadSet {
    pub name: Name,
    pub parameter_count: usize,
    /// Package of top-level sets; member sets belong to their base type.
    pub package: Option<PackagePath>,
    pub overloads: Vec<FnId>,
    pub(crate) phases: PhaseTracker,
}

impl Program {
    pub fn overload_set_phase1(&self, id: OverloadSetId) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        let set = self.overload_set(id);
        set.phases.phase1(|| {
            let mut out = Vec::new();
            let Some((first, rest)) = set.overloads.split_first() else {
                return Ok(out);
            };
            let expected = self.declares_receiver(*first);
            for other in rest.iter().filter(|f| self.declares_receiver(**f) != expected) {
                out.push(
                    Diagnostic::error(ErrorCode::E1008)
                        .with_message(format!(
                            "overloads of `{}` disagree on whether they take a receiver",
                            self.text(set.name)
                        ))
                        .with_label(self.function(*other).span, "differs from the first overload")
                        .with_secondary_label(self.function(*first).span, "first overload"),
                );
            }
            Ok(out)
        })
    }

    pub fn overload_set_phase2(&self, id: OverloadSetId) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        self.overload_set(id).phases.phase2(|| Ok(Vec::new()))
    }

    pub fn overload_set_phase3(&self, id: OverloadSetId) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        let set = self.overload_set(id);
        set.phases.phase3(false, || {
            if set.overloads.len() < 2 || self.has_unknown_parameter_types(&set.overloads) {
                return Ok(Vec::new());
            }
            if !self.disjoint_parameter_indices(&set.overloads).is_empty() {
                return Ok(Vec::new());
            }
            let mut diagnostic = Diagnostic::error(ErrorCode::E3007)
                .with_message(format!(
                    "the overloads of `{}` with {} parameter(s) cannot be told apart",
                    self.text(set.name),
                    set.parameter_count
                ))
                .with_note("at least one parameter position must have disjoint types in every overload");
            for (i, overload) in set.overloads.iter().enumerate() {
                let span = self.function(*overload).span;
                diagnostic = if i == 0 {
                    diagnostic.with_label(span, "overload")
                } else {
                    diagnostic.with_secondary_label(span, "overlaps")
                };
            }
            Ok(vec![diagnostic])
        })
    }

    fn has_unknown_parameter_types(&self, functions: &[FnId]) -> bool {
        functions.iter().any(|f| {
            self.function(*f)
                .params
                .iter()
                .any(|p| self.declared_type(*p).map_or(true, |ty| ty.is_partially_erroneous()))
        })
    }

    /// Parameter positions at which every pair of `functions` has disjoint
    /// types.
    pub(crate) fn disjoint_parameter_indices(&self, functions: &[FnId]) -> Vec<usize> {
        let Some(arity) = functions.iter().map(|f| self.function(*f).params.len()).min() else {
            return Vec::new();
        };
        (0..arity)
            .filter(|index| {
                let types: Vec<_> = functions
                    .iter()
                    .map(|f| self.declared_type(self.function(*f).params[*index]))
                    .collect();
                types.iter().enumerate().all(|(i, a)| {
                    types[i + 1..].iter().all(|b| match (a, b) {
                        (Some(a), Some(b)) => self.reg.is_disjoint_with(a, b),
                        _ => false,
                    })
                })
            })
            .collect()
    }
}

//! Constraints on type variables.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use emerge_diagnostic::{Diagnostic, ErrorCode};
use emerge_ir::{Span, StringLookup};

use crate::ty::TypeArgument;
use crate::{TypeParamId, TypeRef, TypeRegistry};

use super::{DiagnosticDecorator, TypeUnification, Unifier, VariableState};

impl Unifier<'_> {
    /// `value(param)` must be assignable to `upper`.
    pub fn plus_subtype_constraint(
        &self,
        param: TypeParamId,
        upper: &TypeRef,
        span: Span,
        carry: TypeUnification,
    ) -> TypeUnification {
        let Some(state) = carry.state(param).cloned() else {
            tracing::warn!(?param, "type variable is not under inference; treating it as generic");
            return self.unify(upper, &TypeRef::generic(param, None, span), span, carry);
        };
        if state.exact {
            return self.unify(upper, &state.upper, span, carry);
        }

        let new_upper = self.reg.intersect(&state.upper, upper);
        if new_upper.is_nothing(self.reg) {
            // is the conflict with the declared bound or with other constraints?
            let with_declared = self.unify(&state.static_upper, upper, span, carry.clone());
            if with_declared.has_errors_since(&carry) {
                return with_declared;
            }
            return carry.plus_diagnostic(self.unsatisfiable(param, &state, upper, span));
        }

        let with_lower = self.unify(&new_upper, &state.lower, span, carry.clone());
        if with_lower.has_errors_since(&carry) {
            return carry.plus_diagnostic(self.unsatisfiable(param, &state, upper, span));
        }

        tracing::trace!(?param, upper = %self.reg.display(&new_upper), "narrowed upper bound");
        with_lower.with_diagnostics_of(&carry).with_state(
            param,
            VariableState {
                upper: new_upper,
                ..state
            },
        )
    }

    /// `lower` must be assignable to `value(param)`.
    pub fn plus_supertype_constraint(
        &self,
        param: TypeParamId,
        lower: &TypeRef,
        span: Span,
        carry: TypeUnification,
    ) -> TypeUnification {
        let Some(state) = carry.state(param).cloned() else {
            tracing::warn!(?param, "type variable is not under inference; treating it as generic");
            return self.unify(&TypeRef::generic(param, None, span), lower, span, carry);
        };
        if state.exact {
            return self.unify(&state.lower, lower, span, carry);
        }

        let new_lower = self.reg.closest_common_supertype(&state.lower, lower);
        if self.checking_upper.borrow().contains(&param) {
            return carry.with_state(
                param,
                VariableState {
                    lower: new_lower,
                    ..state
                },
            );
        }

        self.checking_upper.borrow_mut().push(param);
        let with_upper = self.unify(&state.upper, &new_lower, span, carry.clone());
        self.checking_upper.borrow_mut().retain(|p| *p != param);

        if with_upper.has_errors_since(&carry) {
            let with_declared = self.unify(&state.static_upper, lower, span, carry.clone());
            if with_declared.has_errors_since(&carry) {
                return with_declared;
            }
            return carry.plus_diagnostic(self.unsatisfiable(param, &state, lower, span));
        }

        tracing::trace!(?param, lower = %self.reg.display(&new_lower), "widened lower bound");
        with_upper.with_diagnostics_of(&carry).with_state(
            param,
            VariableState {
                lower: new_lower,
                ..state
            },
        )
    }

    /// Pin `param` to an explicit type argument.
    ///
    /// A bound violation is reported as an out-of-bounds type argument: the
    /// upper-bound check runs with a decorator that relabels not-assignable
    /// findings.
    pub fn plus_exact_binding(
        &self,
        param: TypeParamId,
        binding: &TypeArgument,
        span: Span,
        carry: TypeUnification,
    ) -> TypeUnification {
        let Some(state) = carry.state(param).cloned() else {
            tracing::warn!(?param, "explicit binding for a parameter that is not under inference");
            return carry;
        };
        let bound = TypeRef::Argument(Rc::new(binding.clone()));

        let outer = carry.decorator();
        let relabel = self.out_of_bounds_decorator(param, &bound, outer.clone());
        let with_upper = self
            .unify(&state.upper, &bound, span, carry.clone().with_decorator(Some(relabel)))
            .with_decorator(outer);
        if with_upper.has_errors_since(&carry) {
            return with_upper;
        }

        let with_lower = if state.lower.is_nothing(self.reg) {
            with_upper
        } else {
            self.unify(&bound, &state.lower, span, with_upper)
        };
        if with_lower.has_errors_since(&carry) {
            return with_lower;
        }

        with_lower.with_state(
            param,
            VariableState {
                upper: bound.clone(),
                lower: bound,
                exact: true,
                static_upper: state.static_upper,
            },
        )
    }

    fn out_of_bounds_decorator(
        &self,
        param: TypeParamId,
        binding: &TypeRef,
        outer: Option<DiagnosticDecorator>,
    ) -> DiagnosticDecorator {
        let param_name = self.reg.names().lookup(self.reg.param(param).name).to_owned();
        let binding_name = self.reg.render(binding);
        Rc::new(move |diagnostic: Diagnostic| {
            let diagnostic = if diagnostic.code == ErrorCode::E2001 {
                let mut relabelled = Diagnostic::error(ErrorCode::E2012).with_message(format!(
                    "type argument `{binding_name}` is out of bounds for `{param_name}`: {}",
                    diagnostic.message
                ));
                relabelled.labels = diagnostic.labels;
                relabelled.notes = diagnostic.notes;
                relabelled
            } else {
                diagnostic
            };
            match &outer {
                Some(decorate) => decorate(diagnostic),
                None => diagnostic,
            }
        })
    }

    fn unsatisfiable(&self, param: TypeParamId, state: &VariableState, constraint: &TypeRef, span: Span) -> Diagnostic {
        let name = self.reg.names().lookup(self.reg.param(param).name);
        let mut diagnostic = Diagnostic::error(ErrorCode::E2010)
            .with_message(format!(
                "the constraints on type variable `{name}` cannot be satisfied together with `{}`",
                self.reg.render(constraint)
            ))
            .with_label(span, "conflicting constraint")
            .with_note(format!("upper bound: {}", self.reg.render(&state.upper)));
        if !state.lower.is_nothing(self.reg) {
            diagnostic = diagnostic.with_note(format!("lower bound: {}", self.reg.render(&state.lower)));
        }
        diagnostic
    }
}

impl TypeUnification {
    /// Open all of `params` for inference, each bounded by its declared bound.
    pub fn for_inference_of(reg: &TypeRegistry, params: &[TypeParamId]) -> Self {
        let variables: Rc<[TypeParamId]> = params.into();
        let states: FxHashMap<TypeParamId, VariableState> = params
            .iter()
            .map(|param| {
                let upper = reg.bound(*param).with_type_variables(&variables);
                let state = VariableState {
                    static_upper: upper.clone(),
                    upper,
                    lower: reg.nothing(),
                    exact: false,
                };
                (*param, state)
            })
            .collect();
        Self::from_states(states)
    }

    /// Bind explicitly written type arguments to their parameters.
    ///
    /// `all_params` are opened for inference; `declared` are the parameters
    /// the arguments are written for. With `args == None` nothing was written,
    /// which is only fine where `allow_missing` (function invocations infer
    /// the rest).
    pub fn from_explicit(
        reg: &TypeRegistry,
        all_params: &[TypeParamId],
        declared: &[TypeParamId],
        args: Option<&[TypeArgument]>,
        span: Span,
        allow_missing: bool,
    ) -> Self {
        let mut unification = Self::for_inference_of(reg, all_params);
        let name_of = |param: TypeParamId| reg.names().lookup(reg.param(param).name).to_owned();

        let Some(args) = args else {
            if !allow_missing {
                for param in declared {
                    unification = unification.plus_diagnostic(missing_type_argument(&name_of(*param), span));
                }
            }
            return unification;
        };

        let unifier = Unifier::new(reg);
        for (param, arg) in declared.iter().zip(args) {
            let declared_variance = reg.param(*param).variance;
            if arg.variance.is_specified() && declared_variance.is_specified() {
                let diagnostic = if arg.variance == declared_variance {
                    Diagnostic::warning(ErrorCode::W3008)
                        .with_message(format!(
                            "`{}` is already declared `{declared_variance}`; the variance here is superfluous",
                            name_of(*param)
                        ))
                        .with_label(arg.span, "superfluous variance")
                } else {
                    Diagnostic::error(ErrorCode::E2008)
                        .with_message(format!(
                            "`{}` is declared `{declared_variance}`, the argument is `{}`",
                            name_of(*param),
                            arg.variance
                        ))
                        .with_label(arg.span, "variance contradicts the declaration")
                        .with_secondary_label(reg.param(*param).span, "declared here")
                };
                unification = unification.plus_diagnostic(diagnostic);
            }
            let at = if arg.span.is_dummy() { span } else { arg.span };
            unification = unifier.plus_exact_binding(*param, arg, at, unification);
        }

        let missing_at = args.last().map_or(span, |a| a.span);
        for param in declared.iter().skip(args.len()) {
            unification = unification.plus_diagnostic(missing_type_argument(&name_of(*param), missing_at));
        }
        if let Some(superfluous) = args.get(declared.len()) {
            unification = unification.plus_diagnostic(
                Diagnostic::error(ErrorCode::E2007)
                    .with_message(format!(
                        "expected {} type argument(s), found {}",
                        declared.len(),
                        args.len()
                    ))
                    .with_label(superfluous.span, "superfluous type argument"),
            );
        }
        unification
    }
}

fn missing_type_argument(param: &str, span: Span) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2004)
        .with_message(format!("missing type argument for `{param}`"))
        .with_label(span, "type argument required here")
}

//! Type unification.
//!
//! `unify(target, assignee)` decides whether a value of type `assignee` can
//! be assigned to a reference of type `target`, and, where either side holds
//! type variables, records what the assignment implies about them.
//!
//! # Design
//!
//! - Results are accumulated in an immutable [`TypeUnification`]; every step
//!   returns the next accumulator, alternatives are tried on clones
//! - Problems are diagnostics in the accumulator, never panics or `Err`s
//! - Erroneous types accept everything and are accepted everywhere, so an
//!   unresolved name is reported once, where it is written
//! - Recursion goes through [`ensure_sufficient_stack`]

mod constraints;
mod result;

pub use result::{DiagnosticDecorator, TypeUnification, VariableState};

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use emerge_diagnostic::{value_not_assignable, Diagnostic};
use emerge_ir::Span;
use emerge_stack::ensure_sufficient_stack;

use crate::ty::{FunctionTy, GenericTy, NominalTy, TypeArgument};
use crate::{BaseTypeId, TypeParamId, TypeRef, TypeRegistry, Variance};

/// Runs unification against one registry.
pub struct Unifier<'r> {
    reg: &'r TypeRegistry,
    /// Variables whose upper bound is being re-checked; an F-bounded
    /// parameter (`T : Comparable<T>`) would otherwise re-check forever.
    checking_upper: RefCell<SmallVec<[TypeParamId; 4]>>,
}

impl<'r> Unifier<'r> {
    pub fn new(reg: &'r TypeRegistry) -> Self {
        Unifier {
            reg,
            checking_upper: RefCell::new(SmallVec::new()),
        }
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.reg
    }

    /// Unify `assignee` into `target`, reporting at `span`.
    #[tracing::instrument(
        level = "trace",
        skip_all,
        fields(target = %self.reg.display(target), assignee = %self.reg.display(assignee))
    )]
    pub fn unify(&self, target: &TypeRef, assignee: &TypeRef, span: Span, carry: TypeUnification) -> TypeUnification {
        ensure_sufficient_stack(|| self.unify_inner(target, assignee, span, carry))
    }

    fn unify_inner(&self, target: &TypeRef, assignee: &TypeRef, span: Span, carry: TypeUnification) -> TypeUnification {
        match assignee {
            TypeRef::Erroneous(_) => return carry,
            TypeRef::Nominal(a) if a.base == BaseTypeId::NOTHING => return carry,
            _ => {}
        }

        match target {
            TypeRef::Erroneous(_) => carry,
            TypeRef::Variable(v) => self.unify_into_variable(v, target, assignee, span, carry),
            TypeRef::Argument(arg) => self.unify_into_argument(arg, target, assignee, span, carry),
            _ => match assignee {
                TypeRef::Variable(v) => self.plus_subtype_constraint(v.param, target, span, carry),
                TypeRef::Union(components) => components
                    .iter()
                    .fold(carry, |carry, component| self.unify(target, component, span, carry)),
                TypeRef::Argument(arg) => {
                    // reading through an `in` reference yields no guarantees at all
                    let effective = if arg.variance == Variance::In {
                        self.reg.top()
                    } else {
                        arg.ty.clone()
                    };
                    self.unify(target, &effective, span, carry)
                }
                TypeRef::Intersection(components) if !matches!(target, TypeRef::Intersection(_)) => {
                    self.unify_from_intersection(target, assignee, components, span, carry)
                }
                _ => self.unify_structural(target, assignee, span, carry),
            },
        }
    }

    /// Targets that are neither variables nor arguments; the assignee is not a
    /// variable, argument or union.
    fn unify_structural(&self, target: &TypeRef, assignee: &TypeRef, span: Span, carry: TypeUnification) -> TypeUnification {
        match target {
            TypeRef::Nominal(t) => match assignee {
                TypeRef::Nominal(a) => self.unify_nominal(target, t, assignee, a, span, carry),
                TypeRef::Generic(g) => self.unify(target, &self.reg.effective_bound(g), span, carry),
                TypeRef::Nullable(_) => self.not_assignable(target, assignee, span, "the value may be null", carry),
                TypeRef::Function(f) => {
                    if t.base != BaseTypeId::ANY {
                        return self.not_assignable(target, assignee, span, "a function is not a subtype of this type", carry);
                    }
                    if !f.mutability.is_assignable_to(t.mutability()) {
                        return self.not_assignable(target, assignee, span, "the mutability is not compatible", carry);
                    }
                    carry
                }
                _ => self.mismatch(target, assignee, span, carry),
            },
            TypeRef::Generic(t) => match assignee {
                TypeRef::Nominal(_) | TypeRef::Function(_) => self.not_assignable(
                    target,
                    assignee,
                    span,
                    "the value cannot be proven to be a subtype of the type parameter",
                    carry,
                ),
                TypeRef::Nullable(_) => self.not_assignable(target, assignee, span, "the value may be null", carry),
                TypeRef::Generic(a) => {
                    if self.generic_is_subtype(a, t) {
                        carry
                    } else {
                        self.not_assignable(
                            target,
                            assignee,
                            span,
                            "the value cannot be proven to be a subtype of the type parameter",
                            carry,
                        )
                    }
                }
                _ => self.mismatch(target, assignee, span, carry),
            },
            TypeRef::Nullable(nested) => match assignee {
                TypeRef::Nullable(inner) => self.unify(nested, inner, span, carry),
                TypeRef::Generic(g) if !matches!(**nested, TypeRef::Generic(_)) => {
                    self.unify(target, &self.reg.effective_bound(g), span, carry)
                }
                _ => self.unify(nested, assignee, span, carry),
            },
            TypeRef::Intersection(components) => {
                if let TypeRef::Nullable(_) = assignee {
                    return self.not_assignable(target, assignee, span, "the value may be null", carry);
                }
                self.unify_into_intersection(components, assignee, span, carry)
            }
            TypeRef::Union(components) => {
                for component in components.iter() {
                    let attempt = self.unify(component, assignee, span, carry.clone());
                    if !attempt.has_errors_since(&carry) {
                        return attempt;
                    }
                }
                self.not_assignable(target, assignee, span, "the value is not assignable to any of the alternatives", carry)
            }
            TypeRef::Function(t) => match assignee {
                TypeRef::Function(a) => self.unify_functions(target, t, assignee, a, span, carry),
                TypeRef::Nullable(_) => self.not_assignable(target, assignee, span, "the value may be null", carry),
                TypeRef::Generic(g) => self.unify(target, &self.reg.effective_bound(g), span, carry),
                _ => self.not_assignable(target, assignee, span, "the value is not a function", carry),
            },
            TypeRef::Erroneous(_) | TypeRef::Variable(_) | TypeRef::Argument(_) => carry,
        }
    }

    fn unify_nominal(
        &self,
        target: &TypeRef,
        t: &NominalTy,
        assignee: &TypeRef,
        a: &NominalTy,
        span: Span,
        carry: TypeUnification,
    ) -> TypeUnification {
        if !self.reg.is_subtype_base(a.base, t.base) {
            let reason = format!(
                "`{}` is not a subtype of `{}`",
                self.reg.base_name(a.base),
                self.reg.base_name(t.base)
            );
            return self.not_assignable(target, assignee, span, &reason, carry);
        }
        if !a.mutability().is_assignable_to(t.mutability()) {
            let reason = format!("a {} value cannot be used as {}", a.mutability(), t.mutability());
            return self.not_assignable(target, assignee, span, &reason, carry);
        }

        let Some(target_args) = t.args.as_deref().filter(|args| !args.is_empty()) else {
            return carry;
        };
        let Some(view) = self.reg.supertype_view(a, t.base) else {
            return carry;
        };
        let Some(assignee_args) = view.args.as_deref() else {
            return carry;
        };

        target_args
            .iter()
            .zip(assignee_args)
            .fold(carry, |carry, (target_arg, assignee_arg)| {
                self.unify_type_arguments(target_arg, assignee_arg, span, carry)
            })
    }

    fn unify_into_variable(
        &self,
        v: &GenericTy,
        target: &TypeRef,
        assignee: &TypeRef,
        span: Span,
        carry: TypeUnification,
    ) -> TypeUnification {
        match assignee {
            TypeRef::Variable(w) if w.param == v.param => carry,
            TypeRef::Nullable(inner) if !target.is_nullable(self.reg) => {
                let carry = self.not_assignable(target, assignee, span, "the value may be null", carry);
                self.unify(target, inner, span, carry)
            }
            _ => self.plus_supertype_constraint(v.param, assignee, span, carry),
        }
    }

    fn unify_into_argument(
        &self,
        arg: &TypeArgument,
        target: &TypeRef,
        assignee: &TypeRef,
        span: Span,
        carry: TypeUnification,
    ) -> TypeUnification {
        if arg.variance == Variance::Out && !matches!(assignee, TypeRef::Argument(_)) {
            return self.not_assignable(target, assignee, span, "cannot assign to a reference of an out-variant type", carry);
        }
        if let TypeRef::Variable(_) = arg.ty {
            return self.unify(&arg.ty, assignee, span, carry);
        }
        match assignee {
            TypeRef::Argument(assignee_arg) => self.unify_type_arguments(arg, assignee_arg, span, carry),
            TypeRef::Variable(v) => self.plus_subtype_constraint(v.param, target, span, carry),
            _ => self.unify(&arg.ty, assignee, span, carry),
        }
    }

    /// Type arguments of two nominal types at the same position.
    fn unify_type_arguments(
        &self,
        target: &TypeArgument,
        assignee: &TypeArgument,
        span: Span,
        carry: TypeUnification,
    ) -> TypeUnification {
        if matches!(target.ty, TypeRef::Variable(_)) || matches!(assignee.ty, TypeRef::Variable(_)) {
            return self.unify(&target.ty, &assignee.ty, span, carry);
        }

        match target.variance {
            Variance::Unspecified => {
                let before = carry.clone();
                let carry = self.unify(&target.ty, &assignee.ty, span, carry);
                if carry.has_errors_since(&before) {
                    return carry;
                }
                if !matches!(assignee.ty, TypeRef::Generic(_)) && !self.reg.has_same_base_type(&target.ty, &assignee.ty) {
                    return self.argument_mismatch(target, assignee, span, "an invariant type argument requires the same type", carry);
                }
                if assignee.variance != Variance::Unspecified {
                    return self.argument_mismatch(
                        target,
                        assignee,
                        span,
                        "a variant type argument cannot be used for an invariant one",
                        carry,
                    );
                }
                self.unify(&assignee.ty, &target.ty, span, carry)
            }
            Variance::Out => {
                if assignee.variance == Variance::In {
                    return self.argument_mismatch(target, assignee, span, "an in-variant argument cannot be used for an out-variant one", carry);
                }
                self.unify(&target.ty, &assignee.ty, span, carry)
            }
            Variance::In => {
                if assignee.variance == Variance::Out {
                    return self.argument_mismatch(target, assignee, span, "an out-variant argument cannot be used for an in-variant one", carry);
                }
                self.unify(&assignee.ty, &target.ty, span, carry)
            }
        }
    }

    fn unify_into_intersection(
        &self,
        components: &[TypeRef],
        assignee: &TypeRef,
        span: Span,
        carry: TypeUnification,
    ) -> TypeUnification {
        let (variables, others): (Vec<&TypeRef>, Vec<&TypeRef>) = components
            .iter()
            .partition(|c| matches!(c, TypeRef::Variable(_)));

        let carry = others
            .iter()
            .fold(carry, |carry, component| self.unify(component, assignee, span, carry));
        if variables.is_empty() {
            return carry;
        }

        let variable_assignee = match others.iter().find(|c| self.reg.has_same_base_type(c, assignee)) {
            Some(covering) => {
                let mutability = assignee.mutability(self.reg).intersect(covering.mutability(self.reg));
                self.reg.any().with_mutability(Some(mutability))
            }
            None => assignee.clone(),
        };
        variables
            .iter()
            .fold(carry, |carry, variable| self.unify(variable, &variable_assignee, span, carry))
    }

    /// An intersection value is assignable if one of its components is.
    fn unify_from_intersection(
        &self,
        target: &TypeRef,
        assignee: &TypeRef,
        components: &[TypeRef],
        span: Span,
        carry: TypeUnification,
    ) -> TypeUnification {
        let mutability = assignee.mutability(self.reg);
        for component in components {
            let component = component.with_mutability_intersected(mutability);
            let attempt = self.unify(target, &component, span, carry.clone());
            if !attempt.has_errors_since(&carry) {
                return attempt;
            }
        }
        self.not_assignable(target, assignee, span, "none of the intersected types is assignable", carry)
    }

    fn unify_functions(
        &self,
        target: &TypeRef,
        t: &FunctionTy,
        assignee: &TypeRef,
        a: &FunctionTy,
        span: Span,
        carry: TypeUnification,
    ) -> TypeUnification {
        if t.params.len() != a.params.len() {
            let reason = format!("expected {} parameters, found {}", t.params.len(), a.params.len());
            return self.not_assignable(target, assignee, span, &reason, carry);
        }
        let mut carry = carry;
        if t.nothrow && !a.nothrow {
            carry = self.not_assignable(target, assignee, span, "the function may throw", carry);
        }
        if !t.purity.contains(a.purity) {
            let reason = format!("a {} function cannot be used as a {} one", a.purity, t.purity);
            carry = self.not_assignable(target, assignee, span, &reason, carry);
        }
        let carry = self.unify(&t.ret, &a.ret, span, carry);
        t.params
            .iter()
            .zip(a.params.iter())
            .fold(carry, |carry, (target_param, assignee_param)| {
                self.unify(assignee_param, target_param, span, carry)
            })
    }

    /// Whether `sub` is known to be a subtype of `sup` inside generic code.
    fn generic_is_subtype(&self, sub: &GenericTy, sup: &GenericTy) -> bool {
        let mut current = sub.clone();
        let mut hops = 0usize;
        loop {
            if current.param == sup.param {
                let sub_ty = TypeRef::Generic(Rc::new(current));
                let sup_ty = TypeRef::Generic(Rc::new(sup.clone()));
                return sub_ty.mutability(self.reg).is_assignable_to(sup_ty.mutability(self.reg));
            }
            match self.reg.effective_bound(&current) {
                TypeRef::Generic(bound) if hops < self.reg.param_count() => {
                    current = GenericTy::clone(&bound);
                    hops += 1;
                }
                _ => return false,
            }
        }
    }

    fn mismatch(&self, target: &TypeRef, assignee: &TypeRef, span: Span, carry: TypeUnification) -> TypeUnification {
        self.not_assignable(target, assignee, span, "the types are not compatible", carry)
    }

    fn not_assignable(
        &self,
        target: &TypeRef,
        assignee: &TypeRef,
        span: Span,
        reason: &str,
        carry: TypeUnification,
    ) -> TypeUnification {
        tracing::trace!(reason, "not assignable");
        carry.plus_diagnostic(value_not_assignable(
            span,
            &self.reg.render(target),
            &self.reg.render(assignee),
            reason,
        ))
    }

    fn argument_mismatch(
        &self,
        target: &TypeArgument,
        assignee: &TypeArgument,
        span: Span,
        reason: &str,
        carry: TypeUnification,
    ) -> TypeUnification {
        let target = TypeRef::Argument(Rc::new(target.clone()));
        let assignee = TypeRef::Argument(Rc::new(assignee.clone()));
        self.not_assignable(&target, &assignee, span, reason, carry)
    }
}

impl TypeRegistry {
    /// Unify `assignee` into `target`; see [`Unifier`].
    pub fn unify(&self, target: &TypeRef, assignee: &TypeRef, span: Span, carry: TypeUnification) -> TypeUnification {
        Unifier::new(self).unify(target, assignee, span, carry)
    }

    /// Whether a value of `assignee` can be assigned to `target` without any
    /// diagnostic.
    pub fn is_assignable(&self, assignee: &TypeRef, target: &TypeRef) -> bool {
        !self
            .unify(target, assignee, Span::DUMMY, TypeUnification::empty())
            .has_errors()
    }

    /// Neither type is assignable to the other.
    pub fn is_disjoint_with(&self, a: &TypeRef, b: &TypeRef) -> bool {
        !self.is_assignable(a, b) && !self.is_assignable(b, a)
    }

    /// Wrap a not-assignable diagnostic for callers outside the engine.
    pub fn not_assignable_diagnostic(&self, target: &TypeRef, assignee: &TypeRef, span: Span, reason: &str) -> Diagnostic {
        value_not_assignable(span, &self.render(target), &self.render(assignee), reason)
    }
}

//! Substituting inferred values for type parameters.

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use emerge_ir::Span;
use emerge_stack::ensure_sufficient_stack;

use crate::ty::{FunctionTy, GenericTy, NominalTy, TypeArgument};
use crate::{Nullability, TypeParamId, TypeRef, TypeRegistry, TypeUnification, Variance};

impl TypeRef {
    /// Replace every type parameter and variable with its value in `bindings`.
    #[must_use]
    pub fn instantiate_all_parameters(&self, reg: &TypeRegistry, bindings: &TypeUnification) -> TypeRef {
        Instantiator::new(reg, bindings).instantiate(self, true)
    }

    /// Replace only type variables; generic references stay as they are.
    #[must_use]
    pub fn instantiate_free_variables(&self, reg: &TypeRegistry, bindings: &TypeUnification) -> TypeRef {
        Instantiator::new(reg, bindings).instantiate(self, false)
    }
}

/// Lower bound if one was inferred, the upper bound otherwise; the declared
/// bound for a parameter that is not under inference.
pub(crate) fn final_value_for(reg: &TypeRegistry, bindings: &TypeUnification, param: TypeParamId) -> TypeRef {
    Instantiator::new(reg, bindings).final_value(param)
}

struct Instantiator<'a> {
    reg: &'a TypeRegistry,
    bindings: &'a TypeUnification,
    /// Parameters whose value is being computed; a bound that mentions its
    /// own parameter resolves to the plain parameter on re-entry.
    resolving: RefCell<SmallVec<[TypeParamId; 4]>>,
}

impl<'a> Instantiator<'a> {
    fn new(reg: &'a TypeRegistry, bindings: &'a TypeUnification) -> Self {
        Instantiator {
            reg,
            bindings,
            resolving: RefCell::new(SmallVec::new()),
        }
    }

    fn instantiate(&self, ty: &TypeRef, all: bool) -> TypeRef {
        ensure_sufficient_stack(|| match ty {
            TypeRef::Nominal(n) => match &n.args {
                None => ty.clone(),
                Some(args) => TypeRef::Nominal(Rc::new(NominalTy {
                    args: Some(args.iter().map(|a| self.argument(a, all)).collect()),
                    ..NominalTy::clone(n)
                })),
            },
            TypeRef::Generic(g) if all => self.parameter_value(g, ty),
            TypeRef::Generic(_) | TypeRef::Erroneous(_) => ty.clone(),
            TypeRef::Variable(g) => self.parameter_value(g, ty),
            TypeRef::Argument(a) => TypeRef::Argument(Rc::new(self.argument(a, all))),
            TypeRef::Nullable(inner) => self
                .instantiate(inner, all)
                .with_combined_nullability(Nullability::Nullable),
            TypeRef::Intersection(components) => self
                .reg
                .intersection_of(components.iter().map(|c| self.instantiate(c, all)).collect()),
            TypeRef::Union(components) => self
                .reg
                .union_of(components.iter().map(|c| self.instantiate(c, all)).collect()),
            TypeRef::Function(f) => TypeRef::Function(Rc::new(FunctionTy {
                params: f.params.iter().map(|p| self.instantiate(p, all)).collect(),
                ret: self.instantiate(&f.ret, all),
                ..FunctionTy::clone(f)
            })),
        })
    }

    /// Nested arguments collapse into one; the outer variance wins unless it
    /// is unspecified.
    fn argument(&self, arg: &TypeArgument, all: bool) -> TypeArgument {
        match self.instantiate(&arg.ty, all) {
            TypeRef::Argument(inner) => TypeArgument {
                variance: if arg.variance == Variance::Unspecified {
                    inner.variance
                } else {
                    arg.variance
                },
                ty: inner.ty.clone(),
                span: arg.span,
            },
            ty => TypeArgument {
                variance: arg.variance,
                ty,
                span: arg.span,
            },
        }
    }

    fn parameter_value(&self, generic: &GenericTy, original: &TypeRef) -> TypeRef {
        let mut value = self.final_value(generic.param);
        if let TypeRef::Argument(arg) = &value {
            if arg.variance == Variance::Unspecified {
                value = arg.ty.clone();
            }
        }
        if generic.explicit_mutability.is_some() {
            value = value.with_mutability_union(original.mutability(self.reg));
        }
        if generic.is_not_nullable() {
            value = value.with_combined_nullability(Nullability::NotNullable);
        }
        value
    }

    fn final_value(&self, param: TypeParamId) -> TypeRef {
        if self.resolving.borrow().contains(&param) {
            return TypeRef::generic(param, None, Span::DUMMY);
        }
        self.resolving.borrow_mut().push(param);
        let value = match self.bindings.state(param) {
            None => self.instantiate(&self.reg.bound(param), true),
            Some(state) => {
                let raw = if state.lower.is_nothing(self.reg) {
                    &state.upper
                } else {
                    &state.lower
                };
                self.instantiate(raw, false)
            }
        };
        self.resolving.borrow_mut().retain(|p| *p != param);
        value
    }
}

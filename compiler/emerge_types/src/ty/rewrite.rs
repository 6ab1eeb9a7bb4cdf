//! Registry-free rewrites of mutability and nullability.

use std::rc::Rc;

use crate::{Mutability, Nullability, TypeParamId};

use super::{BoundOp, ErroneousTy, FunctionTy, GenericTy, NominalTy, TypeArgument, TypeRef};

/// A mutability rewrite.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MutabilityOp {
    /// Replace; `None` resets to the default.
    Set(Option<Mutability>),
    /// [`Mutability::combined_with`] the current mutability.
    Combine(Option<Mutability>),
    /// Set only where nothing was written explicitly.
    DefaultTo(Option<Mutability>),
    Union(Mutability),
    LimitTo(Mutability),
    Intersect(Mutability),
}

impl MutabilityOp {
    /// The explicit mutability after applying this op, given the effective
    /// and the explicitly written one.
    pub fn apply(self, current: Mutability, explicit: Option<Mutability>) -> Option<Mutability> {
        match self {
            MutabilityOp::Set(m) => m,
            MutabilityOp::Combine(m) => Some(current.combined_with(m)),
            MutabilityOp::DefaultTo(m) => explicit.or(m),
            MutabilityOp::Union(m) => Some(current.union(m)),
            MutabilityOp::LimitTo(m) => Some(current.limited_to(m)),
            MutabilityOp::Intersect(m) => Some(current.intersect(m)),
        }
    }
}

impl TypeRef {
    #[must_use]
    pub fn with_mutability(&self, mutability: Option<Mutability>) -> TypeRef {
        self.map_mutability(MutabilityOp::Set(mutability))
    }

    #[must_use]
    pub fn with_combined_mutability(&self, contextual: Option<Mutability>) -> TypeRef {
        self.map_mutability(MutabilityOp::Combine(contextual))
    }

    #[must_use]
    pub fn default_mutability_to(&self, mutability: Option<Mutability>) -> TypeRef {
        self.map_mutability(MutabilityOp::DefaultTo(mutability))
    }

    #[must_use]
    pub fn with_mutability_union(&self, mutability: Mutability) -> TypeRef {
        self.map_mutability(MutabilityOp::Union(mutability))
    }

    #[must_use]
    pub fn with_mutability_limited_to(&self, limit: Mutability) -> TypeRef {
        self.map_mutability(MutabilityOp::LimitTo(limit))
    }

    #[must_use]
    pub fn with_mutability_intersected(&self, mutability: Mutability) -> TypeRef {
        self.map_mutability(MutabilityOp::Intersect(mutability))
    }

    /// Apply a mutability rewrite, recursing into structural children.
    #[must_use]
    pub fn map_mutability(&self, op: MutabilityOp) -> TypeRef {
        match self {
            TypeRef::Nominal(n) => map_nominal(n, op),
            TypeRef::Generic(g) => TypeRef::Generic(map_generic(g, op)),
            TypeRef::Variable(g) => TypeRef::Variable(map_generic(g, op)),
            TypeRef::Argument(arg) => TypeRef::Argument(Rc::new(TypeArgument {
                variance: arg.variance,
                ty: arg.ty.map_mutability(op),
                span: arg.span,
            })),
            TypeRef::Nullable(inner) => TypeRef::Nullable(Rc::new(inner.map_mutability(op))),
            TypeRef::Intersection(components) => {
                TypeRef::Intersection(components.iter().map(|c| c.map_mutability(op)).collect())
            }
            TypeRef::Union(components) => {
                TypeRef::Union(components.iter().map(|c| c.map_mutability(op)).collect())
            }
            TypeRef::Function(f) => {
                let requested = op.apply(f.mutability, Some(f.mutability));
                let mutability = if requested == Some(Mutability::ReadOnly) {
                    Mutability::ReadOnly
                } else {
                    Mutability::Immutable
                };
                TypeRef::Function(Rc::new(FunctionTy {
                    mutability,
                    ..FunctionTy::clone(f)
                }))
            }
            TypeRef::Erroneous(e) => {
                let current = e.mutability.unwrap_or(Mutability::ReadOnly);
                TypeRef::Erroneous(Rc::new(ErroneousTy {
                    mutability: op.apply(current, e.mutability),
                    ..ErroneousTy::clone(e)
                }))
            }
        }
    }

    /// Make nullable or non-nullable; never double-wraps.
    #[must_use]
    pub fn with_combined_nullability(&self, nullability: Nullability) -> TypeRef {
        match nullability {
            Nullability::Unspecified => self.clone(),
            Nullability::Nullable => match self {
                TypeRef::Nullable(_) => self.clone(),
                TypeRef::Argument(arg) => map_argument(arg, |ty| ty.with_combined_nullability(nullability)),
                TypeRef::Union(components) => TypeRef::Union(
                    components
                        .iter()
                        .map(|c| c.with_combined_nullability(nullability))
                        .collect(),
                ),
                _ => TypeRef::Nullable(Rc::new(self.clone())),
            },
            Nullability::NotNullable => match self {
                TypeRef::Nullable(inner) => TypeRef::clone(inner),
                TypeRef::Generic(g) => TypeRef::Generic(push_op(g, BoundOp::NotNullable)),
                TypeRef::Variable(g) => TypeRef::Variable(push_op(g, BoundOp::NotNullable)),
                TypeRef::Argument(arg) => map_argument(arg, |ty| ty.with_combined_nullability(nullability)),
                TypeRef::Union(components) => TypeRef::Union(
                    components
                        .iter()
                        .map(|c| c.with_combined_nullability(nullability))
                        .collect(),
                ),
                _ => self.clone(),
            },
        }
    }

    /// Turn references to `params` into type variables.
    #[must_use]
    pub fn with_type_variables(&self, params: &Rc<[TypeParamId]>) -> TypeRef {
        if params.is_empty() {
            return self.clone();
        }
        match self {
            TypeRef::Generic(g) => {
                let mapped = push_op(g, BoundOp::TypeVariables(Rc::clone(params)));
                if params.contains(&g.param) {
                    TypeRef::Variable(mapped)
                } else {
                    TypeRef::Generic(mapped)
                }
            }
            TypeRef::Variable(_) | TypeRef::Erroneous(_) => self.clone(),
            TypeRef::Nominal(n) => match &n.args {
                None => self.clone(),
                Some(args) => TypeRef::Nominal(Rc::new(NominalTy {
                    args: Some(
                        args.iter()
                            .map(|a| TypeArgument {
                                variance: a.variance,
                                ty: a.ty.with_type_variables(params),
                                span: a.span,
                            })
                            .collect(),
                    ),
                    ..NominalTy::clone(n)
                })),
            },
            TypeRef::Argument(arg) => map_argument(arg, |ty| ty.with_type_variables(params)),
            TypeRef::Nullable(inner) => TypeRef::Nullable(Rc::new(inner.with_type_variables(params))),
            TypeRef::Intersection(c) => {
                TypeRef::Intersection(c.iter().map(|t| t.with_type_variables(params)).collect())
            }
            TypeRef::Union(c) => TypeRef::Union(c.iter().map(|t| t.with_type_variables(params)).collect()),
            TypeRef::Function(f) => TypeRef::Function(Rc::new(FunctionTy {
                params: f.params.iter().map(|t| t.with_type_variables(params)).collect(),
                ret: f.ret.with_type_variables(params),
                ..FunctionTy::clone(f)
            })),
        }
    }
}

fn map_nominal(n: &Rc<NominalTy>, op: MutabilityOp) -> TypeRef {
    if n.scalar {
        return TypeRef::Nominal(Rc::clone(n));
    }
    if matches!(op, MutabilityOp::DefaultTo(_)) && n.explicit_mutability.is_some() {
        return TypeRef::Nominal(Rc::clone(n));
    }
    let explicit = op.apply(n.mutability(), n.explicit_mutability);
    let args = n.args.as_ref().map(|args| {
        args.iter()
            .map(|a| TypeArgument {
                variance: a.variance,
                ty: a.ty.default_mutability_to(explicit),
                span: a.span,
            })
            .collect()
    });
    TypeRef::Nominal(Rc::new(NominalTy {
        explicit_mutability: explicit,
        args,
        ..NominalTy::clone(n)
    }))
}

fn map_generic(g: &Rc<GenericTy>, op: MutabilityOp) -> Rc<GenericTy> {
    // the concrete mutability of a parameter is unknown inside generic code
    if matches!(op, MutabilityOp::DefaultTo(_)) {
        return Rc::clone(g);
    }
    push_op(g, BoundOp::Mutability(op))
}

fn push_op(g: &Rc<GenericTy>, op: BoundOp) -> Rc<GenericTy> {
    let mut mapped = GenericTy::clone(g);
    mapped.ops.push(op);
    Rc::new(mapped)
}

fn map_argument(arg: &Rc<TypeArgument>, f: impl FnOnce(&TypeRef) -> TypeRef) -> TypeRef {
    TypeRef::Argument(Rc::new(TypeArgument {
        variance: arg.variance,
        ty: f(&arg.ty),
        span: arg.span,
    }))
}

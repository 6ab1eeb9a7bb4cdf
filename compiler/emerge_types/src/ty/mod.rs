//! Type representation.
//!
//! [`TypeRef`] is a closed set of type forms. Nodes are immutable and share
//! their children through `Rc`, so rewriting a type clones only the spine
//! that changes. Equality is structural and ignores source spans.
//!
//! Operations that need declarations (bounds, supertypes, names) live on
//! [`TypeRegistry`](crate::TypeRegistry) or take it as a parameter; pure
//! rewrites of mutability and nullability live in [`rewrite`].

mod display;
mod query;
mod rewrite;

use std::rc::Rc;

use smallvec::SmallVec;

use emerge_ir::{Name, Span};

use crate::{BaseTypeId, Mutability, Purity, TypeParamId, Variance};

pub use display::TypeDisplay;
pub use rewrite::MutabilityOp;

/// A reference to a type, as written in source or produced by inference.
#[derive(Clone, Debug)]
pub enum TypeRef {
    /// A base type with optional type arguments.
    Nominal(Rc<NominalTy>),
    /// A type parameter, seen from inside the generic code.
    Generic(Rc<GenericTy>),
    /// A type parameter open for inference in the current unification.
    Variable(Rc<GenericTy>),
    /// A type argument with its variance, e.g. `out S32`.
    Argument(Rc<TypeArgument>),
    /// `T?`; the nested type is never itself `Nullable`.
    Nullable(Rc<TypeRef>),
    /// `A & B`; components are never nullable.
    Intersection(Rc<[TypeRef]>),
    /// `A | B`.
    Union(Rc<[TypeRef]>),
    Function(Rc<FunctionTy>),
    /// Stand-in for a name that did not resolve to exactly one type.
    Erroneous(Rc<ErroneousTy>),
}

/// A base type reference.
#[derive(Clone, Debug)]
pub struct NominalTy {
    pub base: BaseTypeId,
    /// `None` for a raw reference that does not mention arguments at all.
    pub args: Option<Rc<[TypeArgument]>>,
    pub explicit_mutability: Option<Mutability>,
    /// Cached from the base type; scalars are const by construction.
    pub scalar: bool,
    pub span: Span,
}

impl NominalTy {
    pub fn mutability(&self) -> Mutability {
        if self.scalar {
            Mutability::Immutable
        } else {
            self.explicit_mutability.unwrap_or(Mutability::ReadOnly)
        }
    }

    pub fn args(&self) -> &[TypeArgument] {
        self.args.as_deref().unwrap_or(&[])
    }
}

/// Rewrite queued on the bound of a generic reference.
///
/// The bound is only known once the registry resolved it, so rewrites are
/// recorded and replayed by [`TypeRegistry::effective_bound`](crate::TypeRegistry::effective_bound).
#[derive(Clone, Debug, PartialEq)]
pub enum BoundOp {
    Mutability(MutabilityOp),
    NotNullable,
    TypeVariables(Rc<[TypeParamId]>),
}

/// A reference to a type parameter.
#[derive(Clone, Debug)]
pub struct GenericTy {
    pub param: TypeParamId,
    pub explicit_mutability: Option<Mutability>,
    pub ops: SmallVec<[BoundOp; 2]>,
    pub span: Span,
}

impl GenericTy {
    pub fn is_not_nullable(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, BoundOp::NotNullable))
    }
}

/// A type argument: a nested type with its use-site variance.
#[derive(Clone, Debug)]
pub struct TypeArgument {
    pub variance: Variance,
    pub ty: TypeRef,
    pub span: Span,
}

impl TypeArgument {
    pub fn new(variance: Variance, ty: TypeRef) -> Self {
        let span = ty.span();
        TypeArgument { variance, ty, span }
    }

    pub fn invariant(ty: TypeRef) -> Self {
        Self::new(Variance::Unspecified, ty)
    }
}

impl PartialEq for TypeArgument {
    fn eq(&self, other: &Self) -> bool {
        self.variance == other.variance && self.ty == other.ty
    }
}

/// A function type `(A, B) -> R`.
#[derive(Clone, Debug)]
pub struct FunctionTy {
    pub params: Rc<[TypeRef]>,
    pub ret: TypeRef,
    pub purity: Purity,
    pub nothrow: bool,
    /// `Immutable`, or `ReadOnly` once weakened.
    pub mutability: Mutability,
    pub span: Span,
}

/// A reference that did not resolve.
#[derive(Clone, Debug)]
pub struct ErroneousTy {
    pub name: Name,
    /// Empty when the name is unknown, two or more when it is ambiguous.
    pub candidates: Rc<[BaseTypeId]>,
    pub mutability: Option<Mutability>,
    pub span: Span,
}

impl ErroneousTy {
    pub fn is_ambiguous(&self) -> bool {
        self.candidates.len() > 1
    }
}

impl TypeRef {
    /// Reference to a base type with no explicit mutability.
    ///
    /// Scalar-ness is a property of the base type; prefer
    /// [`TypeRegistry::nominal`](crate::TypeRegistry::nominal), which fills it in.
    pub fn nominal(
        base: BaseTypeId,
        args: Option<Rc<[TypeArgument]>>,
        scalar: bool,
        span: Span,
    ) -> TypeRef {
        TypeRef::Nominal(Rc::new(NominalTy {
            base,
            args,
            explicit_mutability: None,
            scalar,
            span,
        }))
    }

    /// Reference to a type parameter, with the mutability written at the
    /// reference applied to the bound.
    pub fn generic(param: TypeParamId, explicit_mutability: Option<Mutability>, span: Span) -> TypeRef {
        let mut ops = SmallVec::new();
        if explicit_mutability.is_some() {
            ops.push(BoundOp::Mutability(MutabilityOp::Set(explicit_mutability)));
        }
        TypeRef::Generic(Rc::new(GenericTy {
            param,
            explicit_mutability,
            ops,
            span,
        }))
    }

    pub fn erroneous(name: Name, candidates: Rc<[BaseTypeId]>, span: Span) -> TypeRef {
        TypeRef::Erroneous(Rc::new(ErroneousTy {
            name,
            candidates,
            mutability: None,
            span,
        }))
    }

    pub fn function(params: Rc<[TypeRef]>, ret: TypeRef, purity: Purity, nothrow: bool, span: Span) -> TypeRef {
        TypeRef::Function(Rc::new(FunctionTy {
            params,
            ret,
            purity,
            nothrow,
            mutability: Mutability::Immutable,
            span,
        }))
    }

    /// Source span of this reference; synthesized types carry [`Span::DUMMY`].
    pub fn span(&self) -> Span {
        match self {
            TypeRef::Nominal(n) => n.span,
            TypeRef::Generic(g) | TypeRef::Variable(g) => g.span,
            TypeRef::Argument(a) => a.span,
            TypeRef::Nullable(inner) => inner.span(),
            TypeRef::Intersection(components) | TypeRef::Union(components) => {
                Span::covering(components.iter().map(TypeRef::span)).unwrap_or(Span::DUMMY)
            }
            TypeRef::Function(f) => f.span,
            TypeRef::Erroneous(e) => e.span,
        }
    }

    pub fn is_erroneous(&self) -> bool {
        match self {
            TypeRef::Erroneous(_) => true,
            TypeRef::Nullable(inner) => inner.is_erroneous(),
            TypeRef::Argument(arg) => arg.ty.is_erroneous(),
            _ => false,
        }
    }

    /// Whether this or any nested type is erroneous.
    pub fn is_partially_erroneous(&self) -> bool {
        match self {
            TypeRef::Erroneous(_) => true,
            TypeRef::Nominal(n) => n.args().iter().any(|a| a.ty.is_partially_erroneous()),
            TypeRef::Generic(_) | TypeRef::Variable(_) => false,
            TypeRef::Argument(a) => a.ty.is_partially_erroneous(),
            TypeRef::Nullable(inner) => inner.is_partially_erroneous(),
            TypeRef::Intersection(c) | TypeRef::Union(c) => c.iter().any(TypeRef::is_partially_erroneous),
            TypeRef::Function(f) => {
                f.ret.is_partially_erroneous() || f.params.iter().any(TypeRef::is_partially_erroneous)
            }
        }
    }

    /// The same reference with a different span.
    #[must_use]
    pub fn at(&self, span: Span) -> TypeRef {
        match self {
            TypeRef::Nominal(n) => TypeRef::Nominal(Rc::new(NominalTy { span, ..NominalTy::clone(n) })),
            TypeRef::Generic(g) => TypeRef::Generic(Rc::new(GenericTy { span, ..GenericTy::clone(g) })),
            TypeRef::Variable(g) => TypeRef::Variable(Rc::new(GenericTy { span, ..GenericTy::clone(g) })),
            TypeRef::Argument(a) => TypeRef::Argument(Rc::new(TypeArgument { span, ..TypeArgument::clone(a) })),
            TypeRef::Nullable(inner) => TypeRef::Nullable(Rc::new(inner.at(span))),
            TypeRef::Function(f) => TypeRef::Function(Rc::new(FunctionTy { span, ..FunctionTy::clone(f) })),
            TypeRef::Erroneous(e) => TypeRef::Erroneous(Rc::new(ErroneousTy { span, ..ErroneousTy::clone(e) })),
            TypeRef::Intersection(_) | TypeRef::Union(_) => self.clone(),
        }
    }

    /// Strip one level of `Nullable`.
    pub fn non_null_view(&self) -> &TypeRef {
        match self {
            TypeRef::Nullable(inner) => inner,
            other => other,
        }
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeRef::Nominal(a), TypeRef::Nominal(b)) => {
                a.base == b.base && a.mutability() == b.mutability() && a.args == b.args
            }
            (TypeRef::Generic(a), TypeRef::Generic(b)) | (TypeRef::Variable(a), TypeRef::Variable(b)) => {
                a.param == b.param && a.explicit_mutability == b.explicit_mutability && a.ops == b.ops
            }
            (TypeRef::Argument(a), TypeRef::Argument(b)) => a == b,
            (TypeRef::Nullable(a), TypeRef::Nullable(b)) => a == b,
            (TypeRef::Intersection(a), TypeRef::Intersection(b)) | (TypeRef::Union(a), TypeRef::Union(b)) => a == b,
            (TypeRef::Function(a), TypeRef::Function(b)) => {
                a.purity == b.purity
                    && a.nothrow == b.nothrow
                    && a.mutability == b.mutability
                    && a.ret == b.ret
                    && a.params == b.params
            }
            (TypeRef::Erroneous(a), TypeRef::Erroneous(b)) => {
                a.name == b.name && a.candidates == b.candidates && a.mutability == b.mutability
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests;

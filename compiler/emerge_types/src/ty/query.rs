//! Queries that need the declarations behind a type.

use crate::{BaseTypeId, Mutability, TypeRegistry};

use super::TypeRef;

impl TypeRef {
    /// The effective mutability of this reference.
    pub fn mutability(&self, reg: &TypeRegistry) -> Mutability {
        match self {
            TypeRef::Nominal(n) => n.mutability(),
            TypeRef::Generic(g) | TypeRef::Variable(g) => {
                let bound = reg.effective_bound(g).mutability(reg);
                match g.explicit_mutability {
                    Some(explicit) if explicit.is_assignable_to(bound) => explicit,
                    _ => bound,
                }
            }
            TypeRef::Argument(arg) => arg.ty.mutability(reg),
            TypeRef::Nullable(inner) => inner.mutability(reg),
            TypeRef::Intersection(components) => components
                .iter()
                .map(|c| c.mutability(reg))
                .reduce(Mutability::intersect)
                .unwrap_or(Mutability::ReadOnly),
            TypeRef::Union(components) => components
                .iter()
                .map(|c| c.mutability(reg))
                .reduce(Mutability::union)
                .unwrap_or(Mutability::ReadOnly),
            TypeRef::Function(f) => f.mutability,
            TypeRef::Erroneous(e) => e.mutability.unwrap_or(Mutability::ReadOnly),
        }
    }

    /// Whether `null` is a possible value.
    ///
    /// A generic reference is nullable when its bound is.
    pub fn is_nullable(&self, reg: &TypeRegistry) -> bool {
        match self {
            TypeRef::Nullable(_) => true,
            TypeRef::Generic(g) | TypeRef::Variable(g) => reg.effective_bound(g).is_nullable(reg),
            TypeRef::Argument(arg) => arg.ty.is_nullable(reg),
            TypeRef::Union(components) => components.iter().all(|c| c.is_nullable(reg)),
            TypeRef::Nominal(_)
            | TypeRef::Intersection(_)
            | TypeRef::Function(_)
            | TypeRef::Erroneous(_) => false,
        }
    }

    /// Whether this is the non-nullable bottom type.
    pub fn is_nothing(&self, reg: &TypeRegistry) -> bool {
        match self {
            TypeRef::Nominal(n) => n.base == BaseTypeId::NOTHING,
            TypeRef::Generic(g) | TypeRef::Variable(g) => reg.effective_bound(g).is_nothing(reg),
            TypeRef::Argument(arg) => arg.ty.is_nothing(reg),
            TypeRef::Intersection(components) => components.iter().any(|c| c.is_nothing(reg)),
            TypeRef::Nullable(_) | TypeRef::Union(_) | TypeRef::Function(_) | TypeRef::Erroneous(_) => {
                false
            }
        }
    }

    /// Base type of a nominal reference, looking through `?` and arguments.
    pub fn nominal_base(&self) -> Option<BaseTypeId> {
        match self {
            TypeRef::Nominal(n) => Some(n.base),
            TypeRef::Nullable(inner) => inner.nominal_base(),
            TypeRef::Argument(arg) => arg.ty.nominal_base(),
            _ => None,
        }
    }
}

//! Intersection and union normalisation.
//!
//! Intersections:
//! 1. collapse to `Nothing` when two nominal components cannot have a common
//!    value (a final base type unrelated to another component's base)
//! 2. drop `Any` components, folding their mutability into the others
//! 3. repeatedly drop components that are supertypes of another component,
//!    keeping the narrower mutability
//!
//! Unions drop everything else once `Any` is among the alternatives and make
//! nullability consistent across the alternatives.

use crate::{BaseTypeId, Mutability, Nullability, TypeRef, TypeRegistry};

impl TypeRegistry {
    /// Build the intersection of `components`, simplified.
    ///
    /// The result is nullable only if every component is.
    pub fn intersection_of(&self, components: Vec<TypeRef>) -> TypeRef {
        let components = flatten(components, &|ty| match ty {
            TypeRef::Intersection(inner) => Some(inner.to_vec()),
            _ => None,
        });
        match components.as_slice() {
            [] => return self.any(),
            [single] => return single.clone(),
            _ => {}
        }

        let nullable = components.iter().all(|c| c.is_nullable(self));
        let components: Vec<TypeRef> = components
            .iter()
            .map(|c| c.with_combined_nullability(Nullability::NotNullable))
            .collect();
        let simplified = self.simplify_intersection_components(components);

        let ty = match <[TypeRef; 1]>::try_from(simplified) {
            Ok([single]) => single,
            Err(many) => TypeRef::Intersection(many.into()),
        };
        if nullable {
            ty.with_combined_nullability(Nullability::Nullable)
        } else {
            ty
        }
    }

    fn simplify_intersection_components(&self, components: Vec<TypeRef>) -> Vec<TypeRef> {
        let self_mutability = components
            .iter()
            .map(|c| c.mutability(self))
            .reduce(Mutability::intersect)
            .unwrap_or(Mutability::ReadOnly);

        if components.iter().any(|c| c.is_nothing(self)) || self.is_effectively_bottom(&components) {
            tracing::trace!("intersection has no values");
            return vec![self.nothing().with_mutability(Some(self_mutability))];
        }

        let (anys, others): (Vec<TypeRef>, Vec<TypeRef>) = components
            .into_iter()
            .partition(|c| matches!(c, TypeRef::Nominal(n) if n.base == BaseTypeId::ANY));
        let any_mutability = anys
            .iter()
            .fold(Mutability::ReadOnly, |m, any| m.intersect(any.mutability(self)));
        if others.is_empty() {
            return vec![self.any().with_mutability(Some(any_mutability))];
        }
        let mut components: Vec<TypeRef> = if any_mutability == Mutability::ReadOnly {
            others
        } else {
            others
                .iter()
                .map(|c| c.with_mutability_intersected(any_mutability))
                .collect()
        };

        while let Some((supertype, subtype)) = self.find_redundant_component(&components, self_mutability) {
            let removed = components.remove(supertype);
            let subtype = if subtype > supertype { subtype - 1 } else { subtype };
            let narrowed = components[subtype].with_mutability_intersected(removed.mutability(self));
            components[subtype] = narrowed;
        }
        components
    }

    /// Index of a component that is a supertype of another one, and the index
    /// of that other one.
    fn find_redundant_component(&self, components: &[TypeRef], mutability: Mutability) -> Option<(usize, usize)> {
        let comparable = |ty: &TypeRef| matches!(ty, TypeRef::Nominal(_) | TypeRef::Generic(_) | TypeRef::Function(_));
        for (i, pivot) in components.iter().enumerate() {
            if !comparable(pivot) {
                continue;
            }
            let pivot = pivot.with_mutability(Some(mutability));
            for (j, check) in components.iter().enumerate() {
                if i == j || !comparable(check) {
                    continue;
                }
                if self.is_assignable(&check.with_mutability(Some(mutability)), &pivot) {
                    return Some((i, j));
                }
            }
        }
        None
    }

    /// Some nominal component has a final base type that is not a subtype of
    /// another nominal component's base.
    fn is_effectively_bottom(&self, components: &[TypeRef]) -> bool {
        let bases: Vec<BaseTypeId> = components.iter().filter_map(TypeRef::nominal_base).collect();
        bases.iter().any(|a| {
            !self.allows_subtypes(*a) && bases.iter().any(|b| a != b && !self.is_subtype_base(*a, *b))
        })
    }

    /// Build the union of `components`, simplified.
    pub fn union_of(&self, components: Vec<TypeRef>) -> TypeRef {
        let flattened = flatten(components, &|ty| match ty {
            TypeRef::Union(inner) => Some(inner.to_vec()),
            _ => None,
        });
        let mut components: Vec<TypeRef> = Vec::with_capacity(flattened.len());
        for component in flattened {
            if !components.contains(&component) {
                components.push(component);
            }
        }

        let any_nullable = components.iter().any(|c| c.is_nullable(self));
        if components
            .iter()
            .any(|c| matches!(c.non_null_view(), TypeRef::Nominal(n) if n.base == BaseTypeId::ANY))
        {
            let mutability = components
                .iter()
                .fold(Mutability::Exclusive, |m, c| m.union(c.mutability(self)));
            let any = self.any().with_mutability(Some(mutability));
            return if any_nullable {
                any.with_combined_nullability(Nullability::Nullable)
            } else {
                any
            };
        }

        if any_nullable {
            components = components
                .iter()
                .map(|c| c.with_combined_nullability(Nullability::Nullable))
                .collect();
        }
        match <[TypeRef; 1]>::try_from(components) {
            Ok([single]) => single,
            Err(many) => TypeRef::Union(many.into()),
        }
    }

    /// Normalise an intersection or union at the top level of `ty`.
    pub fn simplify(&self, ty: &TypeRef) -> TypeRef {
        match ty {
            TypeRef::Intersection(components) => self.intersection_of(components.to_vec()),
            TypeRef::Union(components) => self.union_of(components.to_vec()),
            TypeRef::Nullable(inner) => self.simplify(inner).with_combined_nullability(Nullability::Nullable),
            _ => ty.clone(),
        }
    }
}

fn flatten(components: Vec<TypeRef>, nested: &dyn Fn(&TypeRef) -> Option<Vec<TypeRef>>) -> Vec<TypeRef> {
    let mut out = Vec::with_capacity(components.len());
    for component in components {
        match nested(&component) {
            Some(inner) => out.extend(flatten(inner, nested)),
            None => out.push(component),
        }
    }
    out
}

#[cfg(test)]
mod tests;

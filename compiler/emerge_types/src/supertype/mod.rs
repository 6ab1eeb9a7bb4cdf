//! Least upper bounds, base-type comparison and supertype views.

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use emerge_stack::ensure_sufficient_stack;

use crate::ty::{FunctionTy, NominalTy, TypeArgument};
use crate::unify::VariableState;
use crate::{BaseTypeId, Mutability, Nullability, TypeParamId, TypeRef, TypeRegistry, TypeUnification, Variance};

impl TypeRegistry {
    /// The least type both `a` and `b` are assignable to.
    ///
    /// `Nothing` is the identity and erroneous types absorb; nominal types
    /// meet at their minimal common ancestor, generics at their bounds.
    pub fn closest_common_supertype(&self, a: &TypeRef, b: &TypeRef) -> TypeRef {
        ensure_sufficient_stack(|| self.ccs(a, b))
    }

    fn ccs(&self, a: &TypeRef, b: &TypeRef) -> TypeRef {
        match (a, b) {
            (TypeRef::Erroneous(_), _) => a.clone(),
            (_, TypeRef::Erroneous(_)) => b.clone(),
            (TypeRef::Nullable(x), _) => self
                .ccs(x, b.non_null_view())
                .with_combined_nullability(Nullability::Nullable),
            (_, TypeRef::Nullable(y)) => self.ccs(a, y).with_combined_nullability(Nullability::Nullable),
            (TypeRef::Nominal(n), _) if n.base == BaseTypeId::NOTHING => b.clone(),
            (_, TypeRef::Nominal(n)) if n.base == BaseTypeId::NOTHING => a.clone(),
            (TypeRef::Argument(x), _) => self.ccs(&self.readable(x), b),
            (_, TypeRef::Argument(y)) => self.ccs(a, &self.readable(y)),
            (TypeRef::Variable(g), _) => self.ccs(&TypeRef::Generic(Rc::clone(g)), b),
            (_, TypeRef::Variable(g)) => self.ccs(a, &TypeRef::Generic(Rc::clone(g))),
            (TypeRef::Union(components), _) => {
                self.union_of(components.iter().cloned().chain(std::iter::once(b.clone())).collect())
            }
            (_, TypeRef::Union(components)) => {
                self.union_of(std::iter::once(a.clone()).chain(components.iter().cloned()).collect())
            }
            (TypeRef::Intersection(components), _) => {
                self.intersection_of(components.iter().map(|c| self.ccs(c, b)).collect())
            }
            (_, TypeRef::Intersection(components)) => {
                self.intersection_of(components.iter().map(|c| self.ccs(a, c)).collect())
            }
            (TypeRef::Generic(x), TypeRef::Generic(y)) => {
                if self.is_assignable(a, b) {
                    b.clone()
                } else if self.is_assignable(b, a) {
                    a.clone()
                } else {
                    self.ccs(&self.effective_bound(x), &self.effective_bound(y))
                }
            }
            (TypeRef::Generic(x), _) => self.ccs(&self.effective_bound(x), b),
            (_, TypeRef::Generic(y)) => self.ccs(a, &self.effective_bound(y)),
            (TypeRef::Nominal(x), TypeRef::Nominal(y)) => self.nominal_ccs(x, y),
            (TypeRef::Function(f), TypeRef::Function(g)) => self.function_ccs(f, g),
            _ => self
                .any()
                .with_mutability(Some(a.mutability(self).union(b.mutability(self)))),
        }
    }

    /// What reading through a type argument yields.
    fn readable(&self, arg: &TypeArgument) -> TypeRef {
        match arg.variance {
            Variance::In => self.any(),
            Variance::Out | Variance::Unspecified => arg.ty.clone(),
        }
    }

    fn nominal_ccs(&self, x: &NominalTy, y: &NominalTy) -> TypeRef {
        let base = self.common_base(x.base, y.base);
        let mutability = x.mutability().union(y.mutability());
        let args = if self.base(base).params().is_empty() {
            None
        } else {
            match (self.supertype_view(x, base), self.supertype_view(y, base)) {
                (Some(vx), Some(vy)) => match (vx.args, vy.args) {
                    (Some(ax), Some(ay)) => Some(
                        ax.iter()
                            .zip(ay.iter())
                            .map(|(l, r)| {
                                if l == r {
                                    l.clone()
                                } else {
                                    TypeArgument::new(Variance::Out, self.ccs(&l.ty, &r.ty))
                                }
                            })
                            .collect(),
                    ),
                    _ => None,
                },
                _ => None,
            }
        };
        TypeRef::Nominal(Rc::new(NominalTy {
            base,
            args,
            explicit_mutability: Some(mutability),
            scalar: self.base(base).is_scalar(),
            span: x.span,
        }))
    }

    /// Same parameters: join the return types, keep the weaker guarantees.
    fn function_ccs(&self, f: &FunctionTy, g: &FunctionTy) -> TypeRef {
        if f.params != g.params {
            return self.any().with_mutability(Some(f.mutability.union(g.mutability)));
        }
        TypeRef::Function(Rc::new(FunctionTy {
            params: Rc::clone(&f.params),
            ret: self.ccs(&f.ret, &g.ret),
            purity: f.purity.weaker(g.purity),
            nothrow: f.nothrow && g.nothrow,
            mutability: if f.mutability == Mutability::ReadOnly || g.mutability == Mutability::ReadOnly {
                Mutability::ReadOnly
            } else {
                Mutability::Immutable
            },
            span: f.span,
        }))
    }

    /// Narrow an upper bound by another one.
    pub fn intersect(&self, a: &TypeRef, b: &TypeRef) -> TypeRef {
        match (a, b) {
            (TypeRef::Argument(x), _) => TypeRef::Argument(Rc::new(TypeArgument {
                variance: x.variance,
                ty: self.intersect(&x.ty, b),
                span: x.span,
            })),
            (_, TypeRef::Argument(y)) => TypeRef::Argument(Rc::new(TypeArgument {
                variance: y.variance,
                ty: self.intersect(a, &y.ty),
                span: y.span,
            })),
            (TypeRef::Intersection(c), TypeRef::Intersection(d)) => {
                self.intersection_of(c.iter().chain(d.iter()).cloned().collect())
            }
            (TypeRef::Intersection(c), _) => {
                self.intersection_of(c.iter().cloned().chain(std::iter::once(b.clone())).collect())
            }
            (_, TypeRef::Intersection(d)) => {
                self.intersection_of(std::iter::once(a.clone()).chain(d.iter().cloned()).collect())
            }
            _ => self.intersection_of(vec![a.clone(), b.clone()]),
        }
    }

    /// Whether `a` and `b` refer to the same base type, ignoring mutability
    /// and nullability.
    pub fn has_same_base_type(&self, a: &TypeRef, b: &TypeRef) -> bool {
        let (a, b) = (a.non_null_view(), b.non_null_view());
        match (a, b) {
            (TypeRef::Erroneous(_), _) | (_, TypeRef::Erroneous(_)) => true,
            (TypeRef::Argument(x), _) => self.has_same_base_type(&x.ty, b),
            (_, TypeRef::Argument(y)) => self.has_same_base_type(a, &y.ty),
            (TypeRef::Nominal(x), TypeRef::Nominal(y)) => x.base == y.base,
            (
                TypeRef::Generic(x) | TypeRef::Variable(x),
                TypeRef::Generic(y) | TypeRef::Variable(y),
            ) => x.param == y.param,
            (TypeRef::Intersection(c), _) => c.iter().any(|x| self.has_same_base_type(x, b)),
            (_, TypeRef::Intersection(d)) => d.iter().any(|y| self.has_same_base_type(a, y)),
            (TypeRef::Union(c), _) => c.iter().all(|x| self.has_same_base_type(x, b)),
            (_, TypeRef::Union(d)) => d.iter().all(|y| self.has_same_base_type(a, y)),
            (TypeRef::Function(f), TypeRef::Function(g)) => {
                f.params.len() == g.params.len() && f.purity == g.purity && f.nothrow == g.nothrow
            }
            _ => false,
        }
    }

    /// `ty` seen as its ancestor `target`, with the type arguments it passes
    /// up the inheritance chain, e.g. `ArrayList<S32>` as `List<S32>`.
    pub fn supertype_view(&self, ty: &NominalTy, target: BaseTypeId) -> Option<NominalTy> {
        if ty.base == target {
            return Some(ty.clone());
        }
        let mut visited = FxHashSet::default();
        self.supertype_view_rec(ty, target, &mut visited)
    }

    fn supertype_view_rec(
        &self,
        ty: &NominalTy,
        target: BaseTypeId,
        visited: &mut FxHashSet<BaseTypeId>,
    ) -> Option<NominalTy> {
        if !visited.insert(ty.base) {
            return None;
        }
        let bindings = self.inherent_bindings(ty);
        for supertype in self.base(ty.base).supertypes() {
            let TypeRef::Nominal(_) = supertype else {
                continue;
            };
            let TypeRef::Nominal(instantiated) = supertype.instantiate_all_parameters(self, &bindings) else {
                continue;
            };
            if instantiated.base == target {
                return Some(NominalTy::clone(&instantiated));
            }
            if let Some(view) = self.supertype_view_rec(&instantiated, target, visited) {
                return Some(view);
            }
        }
        None
    }

    /// The type arguments of `ty` as exact bindings of its base's parameters,
    /// without checking them against the bounds.
    pub fn inherent_bindings(&self, ty: &NominalTy) -> TypeUnification {
        let params = self.base(ty.base).params();
        let mut states: FxHashMap<TypeParamId, VariableState> = FxHashMap::default();
        for (param, arg) in params.iter().zip(ty.args()) {
            let bound = TypeRef::Argument(Rc::new(arg.clone()));
            states.insert(
                *param,
                VariableState {
                    static_upper: self.bound(*param),
                    upper: bound.clone(),
                    lower: bound,
                    exact: true,
                },
            );
        }
        TypeUnification::from_states(states)
    }
}

#[cfg(test)]
mod tests;

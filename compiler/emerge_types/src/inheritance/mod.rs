//! Flattened view of a base type's ancestors.
//!
//! Every ancestor appears once, parameterized the way the subtype sees it:
//! given `interface A<T>`, `interface B<E> : A<Array<E>>` and
//! `class C<K> : B<K>`, the tree of `C` maps `A` to `A<Array<K>>`.
//!
//! Diamonds are merged. When two paths reach the same ancestor with different
//! type arguments the binding is inconsistent and reported as `E3010`.

use rustc_hash::{FxHashMap, FxHashSet};

use emerge_diagnostic::{Diagnostic, ErrorCode};
use emerge_ir::Span;

use crate::ty::NominalTy;
use crate::{BaseTypeId, TypeArgument, TypeParamId, TypeRef, TypeRegistry};

/// Two or more different arguments reaching the same ancestor parameter.
#[derive(Clone, Debug)]
pub struct InconsistentBinding {
    pub ancestor: BaseTypeId,
    pub param: TypeParamId,
    pub args: Vec<TypeArgument>,
}

#[derive(Clone, Debug, Default)]
pub struct InheritanceTree {
    order: Vec<BaseTypeId>,
    supertypes: FxHashMap<BaseTypeId, NominalTy>,
    inconsistent: Vec<InconsistentBinding>,
    /// Supertypes skipped because they lead back to a type already being merged.
    cyclic: Vec<BaseTypeId>,
}

impl InheritanceTree {
    /// `ancestor` as seen from the subtype. `None` for `Any` and unrelated types.
    pub fn parameterized_supertype(&self, ancestor: BaseTypeId) -> Option<&NominalTy> {
        self.supertypes.get(&ancestor)
    }

    /// All ancestors except `Any`, nearest paths first.
    pub fn ancestors(&self) -> impl Iterator<Item = &NominalTy> {
        self.order.iter().filter_map(|id| self.supertypes.get(id))
    }

    pub fn inconsistent_bindings(&self) -> &[InconsistentBinding] {
        &self.inconsistent
    }

    pub fn cyclic_supertypes(&self) -> &[BaseTypeId] {
        &self.cyclic
    }

    /// `E3010` for every inconsistent binding, reported at `span`.
    pub fn diagnostics(&self, reg: &TypeRegistry, span: Span) -> Vec<Diagnostic> {
        self.inconsistent
            .iter()
            .map(|binding| {
                let args: Vec<String> = binding.args.iter().map(|a| reg.render(&a.ty)).collect();
                Diagnostic::error(ErrorCode::E3010)
                    .with_message(format!(
                        "`{}` is inherited more than once with different arguments for `{}`: {}",
                        reg.base_name(binding.ancestor),
                        reg.names().lookup(reg.param(binding.param).name),
                        args.join(", ")
                    ))
                    .with_label(span, "inconsistent type arguments")
            })
            .collect()
    }

    fn insert(&mut self, reg: &TypeRegistry, supertype: NominalTy) {
        let Some(existing) = self.supertypes.get(&supertype.base) else {
            self.order.push(supertype.base);
            self.supertypes.insert(supertype.base, supertype);
            return;
        };
        let params = reg.base(existing.base).params();
        for ((existing_arg, arg), param) in existing.args().iter().zip(supertype.args()).zip(params) {
            if existing_arg == arg {
                continue;
            }
            let binding = match self
                .inconsistent
                .iter_mut()
                .position(|b| b.ancestor == existing.base && b.param == *param)
            {
                Some(at) => &mut self.inconsistent[at],
                None => {
                    self.inconsistent.push(InconsistentBinding {
                        ancestor: existing.base,
                        param: *param,
                        args: Vec::new(),
                    });
                    let last = self.inconsistent.len() - 1;
                    &mut self.inconsistent[last]
                }
            };
            for candidate in [existing_arg, arg] {
                if !binding.args.contains(candidate) {
                    binding.args.push(candidate.clone());
                }
            }
        }
    }
}

impl TypeRegistry {
    /// Merge the ancestors of `base` along all of its resolved supertypes.
    #[tracing::instrument(level = "trace", skip_all, fields(base = self.base_name(base)))]
    pub fn inheritance_tree(&self, base: BaseTypeId) -> InheritanceTree {
        let mut visiting = FxHashSet::default();
        self.build_tree(base, &mut visiting)
    }

    fn build_tree(&self, base: BaseTypeId, visiting: &mut FxHashSet<BaseTypeId>) -> InheritanceTree {
        let mut tree = InheritanceTree::default();
        visiting.insert(base);
        for supertype in self.base(base).supertypes() {
            let TypeRef::Nominal(direct) = supertype else {
                continue;
            };
            if direct.base == BaseTypeId::ANY {
                continue;
            }
            if visiting.contains(&direct.base) {
                tracing::warn!(base = self.base_name(base), "cyclic supertype skipped");
                tree.cyclic.push(direct.base);
                continue;
            }
            let inherited = emerge_stack::ensure_sufficient_stack(|| self.build_tree(direct.base, visiting));
            let bindings = self.inherent_bindings(direct);
            for ancestor in inherited.ancestors() {
                let translated = TypeRef::Nominal(ancestor.clone().into()).instantiate_all_parameters(self, &bindings);
                if let TypeRef::Nominal(n) = translated {
                    tree.insert(self, NominalTy::clone(&n));
                }
            }
            tree.inconsistent.extend(inherited.inconsistent);
            tree.cyclic.extend(inherited.cyclic);
            tree.insert(self, NominalTy::clone(direct));
        }
        visiting.remove(&base);
        tree
    }
}

//! Registry of base types and type parameters.
//!
//! Declarations are registered up front (with `&mut self`) so handles exist
//! before anything is resolved; supertypes and bounds are resolved later and
//! stored in write-once cells, which keeps forward references and cycles
//! between declarations expressible with a shared `&TypeRegistry`.
//!
//! # Well-known types
//!
//! `TypeRegistry::new` registers `Any`, `Nothing`, `Unit`, `Bool`, the
//! integer and float scalars, `String` and `Array<Element>` at the fixed
//! handles declared on [`BaseTypeId`].

use std::cell::OnceCell;
use std::collections::VecDeque;
use std::rc::Rc;

use bitflags::bitflags;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use emerge_ir::{Name, PackagePath, SharedInterner, Span, StringLookup};

use crate::ty::{BoundOp, GenericTy, TypeArgument, TypeDisplay};
use crate::{BaseTypeId, Mutability, Nullability, TypeParamId, TypeRef, Variance, Visibility};

bitflags! {
    /// Properties of a base type fixed at declaration.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct BaseTypeFlags: u8 {
        /// Values are const by construction.
        const SCALAR = 1 << 0;
        /// Part of the core package, visible everywhere without import.
        const CORE = 1 << 1;
        /// Generated by the compiler rather than declared in source.
        const SYNTHETIC = 1 << 2;
    }
}

/// Kind of base type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BaseTypeKind {
    Class,
    Interface,
    Builtin,
}

/// A base type declaration.
#[derive(Debug)]
pub struct BaseTypeDef {
    pub name: Name,
    pub package: PackagePath,
    pub kind: BaseTypeKind,
    pub flags: BaseTypeFlags,
    pub visibility: Visibility,
    pub span: Span,
    params: Vec<TypeParamId>,
    supertypes: OnceCell<Rc<[TypeRef]>>,
}

impl BaseTypeDef {
    pub fn new(name: Name, kind: BaseTypeKind, visibility: Visibility, span: Span) -> Self {
        BaseTypeDef {
            name,
            package: PackagePath::default(),
            kind,
            flags: BaseTypeFlags::empty(),
            visibility,
            span,
            params: Vec::new(),
            supertypes: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn with_package(mut self, package: PackagePath) -> Self {
        self.package = package;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: BaseTypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn params(&self) -> &[TypeParamId] {
        &self.params
    }

    /// Declared supertypes; empty until resolved.
    pub fn supertypes(&self) -> &[TypeRef] {
        self.supertypes.get().map_or(&[], |s| s)
    }

    pub fn supertypes_resolved(&self) -> bool {
        self.supertypes.get().is_some()
    }

    pub fn is_scalar(&self) -> bool {
        self.flags.contains(BaseTypeFlags::SCALAR)
    }
}

/// Declaration a type parameter belongs to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ParamOwner {
    BaseType(BaseTypeId),
    Function,
}

/// A type parameter declaration.
#[derive(Debug)]
pub struct TypeParamDef {
    pub name: Name,
    pub variance: Variance,
    pub span: Span,
    pub owner: ParamOwner,
    bound: OnceCell<TypeRef>,
}

impl TypeParamDef {
    pub fn bound_resolved(&self) -> bool {
        self.bound.get().is_some()
    }
}

/// Arena of base types and type parameters.
#[derive(Debug)]
pub struct TypeRegistry {
    names: SharedInterner,
    bases: Vec<BaseTypeDef>,
    params: Vec<TypeParamDef>,
    by_name: FxHashMap<Name, SmallVec<[BaseTypeId; 1]>>,
    core_package: PackagePath,
}

impl TypeRegistry {
    pub fn new(names: SharedInterner) -> Self {
        let core_package = PackagePath::new([names.intern("emerge"), names.intern("core")]);
        let mut reg = TypeRegistry {
            names,
            bases: Vec::new(),
            params: Vec::new(),
            by_name: FxHashMap::default(),
            core_package,
        };
        reg.register_well_known();
        reg
    }

    fn register_well_known(&mut self) {
        const SCALARS: [&str; 11] = [
            "Bool", "S8", "U8", "S16", "U16", "S32", "U32", "S64", "U64", "F32", "F64",
        ];

        self.register_builtin("Any", BaseTypeFlags::empty());
        self.register_builtin("Nothing", BaseTypeFlags::empty());
        self.register_builtin("Unit", BaseTypeFlags::empty());
        for text in SCALARS {
            self.register_builtin(text, BaseTypeFlags::SCALAR);
        }
        self.register_builtin("String", BaseTypeFlags::empty());
        let array = self.register_builtin("Array", BaseTypeFlags::empty());
        let element = self.names.intern("Element");
        self.add_type_param(ParamOwner::BaseType(array), element, Variance::Unspecified, Span::DUMMY);

        debug_assert_eq!(array, BaseTypeId::ARRAY);
    }

    fn register_builtin(&mut self, text: &str, flags: BaseTypeFlags) -> BaseTypeId {
        let name = self.names.intern(text);
        let def = BaseTypeDef::new(name, BaseTypeKind::Builtin, Visibility::Exported, Span::DUMMY)
            .with_package(self.core_package.clone())
            .with_flags(flags | BaseTypeFlags::CORE);
        let id = self.register_base_type(def);
        self.set_supertypes(id, Rc::from([]));
        id
    }

    pub fn names(&self) -> &SharedInterner {
        &self.names
    }

    /// Package of the well-known types.
    pub fn core_package(&self) -> &PackagePath {
        &self.core_package
    }

    pub fn register_base_type(&mut self, def: BaseTypeDef) -> BaseTypeId {
        let id = BaseTypeId::from_raw(u32::try_from(self.bases.len()).unwrap_or(u32::MAX));
        self.by_name.entry(def.name).or_default().push(id);
        tracing::trace!(?id, name = self.names.lookup(def.name), "registered base type");
        self.bases.push(def);
        id
    }

    pub fn add_type_param(&mut self, owner: ParamOwner, name: Name, variance: Variance, span: Span) -> TypeParamId {
        let id = TypeParamId::from_raw(u32::try_from(self.params.len()).unwrap_or(u32::MAX));
        self.params.push(TypeParamDef {
            name,
            variance,
            span,
            owner,
            bound: OnceCell::new(),
        });
        if let ParamOwner::BaseType(base) = owner {
            self.bases[base.index()].params.push(id);
        }
        id
    }

    /// Record resolved supertypes. Returns `false` if they were already set.
    pub fn set_supertypes(&self, id: BaseTypeId, supertypes: Rc<[TypeRef]>) -> bool {
        self.base(id).supertypes.set(supertypes).is_ok()
    }

    /// Record a resolved bound. Returns `false` if it was already set.
    pub fn set_bound(&self, param: TypeParamId, bound: TypeRef) -> bool {
        self.param(param).bound.set(bound).is_ok()
    }

    pub fn base(&self, id: BaseTypeId) -> &BaseTypeDef {
        &self.bases[id.index()]
    }

    pub fn param(&self, id: TypeParamId) -> &TypeParamDef {
        &self.params[id.index()]
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn base_types(&self) -> impl Iterator<Item = (BaseTypeId, &BaseTypeDef)> {
        self.bases
            .iter()
            .enumerate()
            .map(|(i, def)| (BaseTypeId::from_raw(u32::try_from(i).unwrap_or(u32::MAX)), def))
    }

    /// Every base type registered under `name`, in registration order.
    pub fn lookup(&self, name: Name) -> &[BaseTypeId] {
        self.by_name.get(&name).map_or(&[], |ids| ids)
    }

    pub fn base_name(&self, id: BaseTypeId) -> &str {
        self.names.lookup(self.base(id).name)
    }

    pub fn display<'a>(&'a self, ty: &'a TypeRef) -> TypeDisplay<'a> {
        TypeDisplay { reg: self, ty }
    }

    /// Render to an owned string, for diagnostic messages.
    pub fn render(&self, ty: &TypeRef) -> String {
        self.display(ty).to_string()
    }

    // === Constructors ===

    /// Reference to a base type without type arguments.
    pub fn nominal(&self, base: BaseTypeId) -> TypeRef {
        TypeRef::nominal(base, None, self.base(base).is_scalar(), Span::DUMMY)
    }

    pub fn nominal_with_args(&self, base: BaseTypeId, args: impl IntoIterator<Item = TypeArgument>) -> TypeRef {
        TypeRef::nominal(base, Some(args.into_iter().collect()), self.base(base).is_scalar(), Span::DUMMY)
    }

    /// Reference to a base type with its own parameters as arguments.
    pub fn nominal_self(&self, base: BaseTypeId) -> TypeRef {
        let params = self.base(base).params();
        if params.is_empty() {
            return self.nominal(base);
        }
        self.nominal_with_args(
            base,
            params
                .iter()
                .map(|p| TypeArgument::invariant(TypeRef::generic(*p, None, Span::DUMMY))),
        )
    }

    pub fn any(&self) -> TypeRef {
        self.nominal(BaseTypeId::ANY)
    }

    pub fn nothing(&self) -> TypeRef {
        self.nominal(BaseTypeId::NOTHING)
    }

    pub fn unit(&self) -> TypeRef {
        self.nominal(BaseTypeId::UNIT)
    }

    /// `read Any?`, the top of the whole type lattice.
    pub fn top(&self) -> TypeRef {
        self.any()
            .with_mutability(Some(Mutability::ReadOnly))
            .with_combined_nullability(Nullability::Nullable)
    }

    // === Bounds ===

    /// Declared bound of a parameter; `read Any?` until resolved.
    pub fn bound(&self, param: TypeParamId) -> TypeRef {
        self.param(param).bound.get().cloned().unwrap_or_else(|| self.top())
    }

    /// The bound of a generic reference with its queued rewrites applied.
    pub fn effective_bound(&self, generic: &GenericTy) -> TypeRef {
        generic
            .ops
            .iter()
            .fold(self.bound(generic.param), |bound, op| match op {
                BoundOp::Mutability(op) => bound.map_mutability(*op),
                BoundOp::NotNullable => bound.with_combined_nullability(Nullability::NotNullable),
                BoundOp::TypeVariables(params) => bound.with_type_variables(params),
            })
    }

    /// Whether using `candidate` as the bound of `param` would make the bound
    /// chain `param: A, A: B, ...` loop back to `param`.
    pub fn bound_is_cyclic(&self, param: TypeParamId, candidate: &TypeRef) -> bool {
        let mut seen = FxHashSet::default();
        let mut current = candidate.clone();
        loop {
            let next = match current.non_null_view() {
                TypeRef::Generic(g) | TypeRef::Variable(g) => g.param,
                _ => return false,
            };
            if next == param || !seen.insert(next) {
                return true;
            }
            current = match self.param(next).bound.get() {
                Some(bound) => bound.clone(),
                None => return false,
            };
        }
    }

    // === Base type hierarchy ===

    /// Whether subtypes of `id` may be declared.
    pub fn allows_subtypes(&self, id: BaseTypeId) -> bool {
        id == BaseTypeId::ANY || self.base(id).kind == BaseTypeKind::Interface
    }

    /// Nominal subtyping between base types.
    ///
    /// `Nothing` is a subtype of everything and everything is a subtype of
    /// `Any`.
    pub fn is_subtype_base(&self, sub: BaseTypeId, sup: BaseTypeId) -> bool {
        if sub == sup || sup == BaseTypeId::ANY || sub == BaseTypeId::NOTHING {
            return true;
        }
        if sup == BaseTypeId::NOTHING {
            return false;
        }
        self.ancestors(sub).contains(&sup)
    }

    /// `id` and all of its transitive supertypes, nearest first.
    pub fn ancestors(&self, id: BaseTypeId) -> Vec<BaseTypeId> {
        let mut seen = FxHashSet::default();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            order.push(current);
            for sup in self.base(current).supertypes() {
                if let Some(base) = sup.nominal_base() {
                    queue.push_back(base);
                }
            }
        }
        order
    }

    /// Minimal common ancestor of two base types, or `Any` when there is no
    /// unique one.
    pub fn common_base(&self, a: BaseTypeId, b: BaseTypeId) -> BaseTypeId {
        if a == BaseTypeId::NOTHING {
            return b;
        }
        if b == BaseTypeId::NOTHING {
            return a;
        }
        let of_b: FxHashSet<BaseTypeId> = self.ancestors(b).into_iter().collect();
        let common: Vec<BaseTypeId> = self.ancestors(a).into_iter().filter(|c| of_b.contains(c)).collect();
        let minimal: SmallVec<[BaseTypeId; 2]> = common
            .iter()
            .copied()
            .filter(|c| !common.iter().any(|other| other != c && self.is_subtype_base(*other, *c)))
            .collect();
        match minimal.as_slice() {
            [single] => *single,
            _ => BaseTypeId::ANY,
        }
    }
}

//! Registry fixtures shared by the unit tests.

use emerge_ir::{FileId, Name, PackagePath, SharedInterner, Span};

use crate::{
    AccessSite, BaseTypeDef, BaseTypeId, BaseTypeKind, ParamOwner, TypeArgument, TypeParamId, TypeRef,
    TypeRegistry, Variance, Visibility,
};

pub(crate) struct Fixture {
    pub reg: TypeRegistry,
    pub package: PackagePath,
}

impl Fixture {
    pub fn new() -> Self {
        let names = SharedInterner::new();
        let package = PackagePath::new([names.intern("app")]);
        Fixture {
            reg: TypeRegistry::new(names),
            package,
        }
    }

    pub fn name(&self, text: &str) -> Name {
        self.reg.names().intern(text)
    }

    pub fn site(&self) -> AccessSite {
        AccessSite::new(FileId::new(0), self.package.clone())
    }

    fn declare(&mut self, text: &str, kind: BaseTypeKind, params: &[(&str, Variance)]) -> (BaseTypeId, Vec<TypeParamId>) {
        let def = BaseTypeDef::new(self.name(text), kind, Visibility::Exported, Span::DUMMY)
            .with_package(self.package.clone());
        let id = self.reg.register_base_type(def);
        let params = params
            .iter()
            .map(|(param, variance)| {
                let name = self.name(param);
                self.reg
                    .add_type_param(ParamOwner::BaseType(id), name, *variance, Span::DUMMY)
            })
            .collect();
        (id, params)
    }

    pub fn class(&mut self, text: &str) -> BaseTypeId {
        self.declare(text, BaseTypeKind::Class, &[]).0
    }

    pub fn interface(&mut self, text: &str) -> BaseTypeId {
        self.declare(text, BaseTypeKind::Interface, &[]).0
    }

    pub fn generic_class(&mut self, text: &str, params: &[(&str, Variance)]) -> (BaseTypeId, Vec<TypeParamId>) {
        self.declare(text, BaseTypeKind::Class, params)
    }

    pub fn generic_interface(&mut self, text: &str, params: &[(&str, Variance)]) -> (BaseTypeId, Vec<TypeParamId>) {
        self.declare(text, BaseTypeKind::Interface, params)
    }

    /// A type parameter of a function.
    pub fn fn_param(&mut self, text: &str) -> TypeParamId {
        let name = self.name(text);
        self.reg
            .add_type_param(ParamOwner::Function, name, Variance::Unspecified, Span::DUMMY)
    }

    pub fn extends(&self, id: BaseTypeId, supertypes: Vec<TypeRef>) {
        assert!(self.reg.set_supertypes(id, supertypes.into()));
    }

    pub fn ty(&self, id: BaseTypeId) -> TypeRef {
        self.reg.nominal(id)
    }

    pub fn applied(&self, id: BaseTypeId, args: Vec<TypeRef>) -> TypeRef {
        self.reg
            .nominal_with_args(id, args.into_iter().map(TypeArgument::invariant))
    }

    pub fn applied_with(&self, id: BaseTypeId, args: Vec<TypeArgument>) -> TypeRef {
        self.reg.nominal_with_args(id, args)
    }

    pub fn generic(&self, param: TypeParamId) -> TypeRef {
        TypeRef::generic(param, None, Span::DUMMY)
    }
}

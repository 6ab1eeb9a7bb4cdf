//! The declaration tree: the input contract of the semantic core.
//!
//! A parser produces one [`SourceFile`] per compiled file. The tree is plain
//! owned data with spans; names are interned. Nothing here is resolved:
//! type expressions name types, identifiers name variables, and the binding
//! layer decides what they refer to.
//!
//! Constructors and `with_*` methods exist so front ends and tests can build
//! trees without spelling out every field.

mod expr;

use emerge_ir::{FileId, Name, PackagePath, Span};
use emerge_types::{Mutability, Nullability, Purity, Variance};

pub use expr::{BinaryOp, BlockDecl, ExprDecl, ExprKind, StmtDecl, UnaryOp};

/// One parsed source file.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub file: FileId,
    pub package: PackagePath,
    pub items: Vec<Item>,
}

impl SourceFile {
    pub fn new(file: FileId, package: PackagePath) -> Self {
        SourceFile {
            file,
            package,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_item(mut self, item: impl Into<Item>) -> Self {
        self.items.push(item.into());
        self
    }
}

/// A top-level declaration.
#[derive(Clone, Debug)]
pub enum Item {
    Function(FunctionDecl),
    Variable(VariableDecl),
    BaseType(BaseTypeDecl),
    Import(ImportDecl),
}

impl From<FunctionDecl> for Item {
    fn from(decl: FunctionDecl) -> Self {
        Item::Function(decl)
    }
}

impl From<VariableDecl> for Item {
    fn from(decl: VariableDecl) -> Self {
        Item::Variable(decl)
    }
}

impl From<BaseTypeDecl> for Item {
    fn from(decl: BaseTypeDecl) -> Self {
        Item::BaseType(decl)
    }
}

impl From<ImportDecl> for Item {
    fn from(decl: ImportDecl) -> Self {
        Item::Import(decl)
    }
}

/// `import a.b.c` followed by the symbols taken from the package.
#[derive(Clone, Debug)]
pub struct ImportDecl {
    pub package: PackagePath,
    pub symbols: ImportSymbols,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum ImportSymbols {
    /// `import a.b.*`
    All,
    /// `import a.b.f` or `import a.b.{f, g}`
    Names(Vec<(Name, Span)>),
}

impl ImportDecl {
    pub fn all(package: PackagePath, span: Span) -> Self {
        ImportDecl {
            package,
            symbols: ImportSymbols::All,
            span,
        }
    }

    pub fn names(package: PackagePath, names: Vec<(Name, Span)>, span: Span) -> Self {
        ImportDecl {
            package,
            symbols: ImportSymbols::Names(names),
            span,
        }
    }
}

/// Visibility modifier as written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VisibilityKind {
    /// `private`: the declaring file only.
    File,
    /// `module`: the declaring package.
    Module,
    /// `package(a.b)`: the named package and everything nested in it.
    Package(PackagePath),
    /// `export`
    Export,
}

#[derive(Clone, Debug)]
pub struct VisibilityDecl {
    pub kind: VisibilityKind,
    pub span: Span,
}

impl VisibilityDecl {
    pub fn new(kind: VisibilityKind, span: Span) -> Self {
        VisibilityDecl { kind, span }
    }
}

/// A type as written, e.g. `mut List<out S32>?`.
#[derive(Clone, Debug)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub mutability: Option<Mutability>,
    pub nullability: Nullability,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum TypeExprKind {
    /// A type name with optional arguments; `_` asks for inference.
    Named { name: Name, args: Option<Vec<TypeArgExpr>> },
    Function {
        params: Vec<TypeExpr>,
        ret: Box<TypeExpr>,
        purity: Purity,
        nothrow: bool,
    },
    Intersection(Vec<TypeExpr>),
    /// `A | B`
    Union(Vec<TypeExpr>),
}

#[derive(Clone, Debug)]
pub struct TypeArgExpr {
    pub variance: Variance,
    pub ty: TypeExpr,
    pub span: Span,
}

impl TypeExpr {
    pub fn named(name: Name, span: Span) -> Self {
        TypeExpr {
            kind: TypeExprKind::Named { name, args: None },
            mutability: None,
            nullability: Nullability::Unspecified,
            span,
        }
    }

    pub fn applied(name: Name, args: Vec<TypeArgExpr>, span: Span) -> Self {
        TypeExpr {
            kind: TypeExprKind::Named { name, args: Some(args) },
            ..Self::named(name, span)
        }
    }

    pub fn intersection(components: Vec<TypeExpr>, span: Span) -> Self {
        TypeExpr {
            kind: TypeExprKind::Intersection(components),
            mutability: None,
            nullability: Nullability::Unspecified,
            span,
        }
    }

    pub fn union(components: Vec<TypeExpr>, span: Span) -> Self {
        TypeExpr {
            kind: TypeExprKind::Union(components),
            mutability: None,
            nullability: Nullability::Unspecified,
            span,
        }
    }

    pub fn function(params: Vec<TypeExpr>, ret: TypeExpr, purity: Purity, nothrow: bool, span: Span) -> Self {
        TypeExpr {
            kind: TypeExprKind::Function {
                params,
                ret: Box::new(ret),
                purity,
                nothrow,
            },
            mutability: None,
            nullability: Nullability::Unspecified,
            span,
        }
    }

    #[must_use]
    pub fn with_mutability(mut self, mutability: Mutability) -> Self {
        self.mutability = Some(mutability);
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullability = Nullability::Nullable;
        self
    }
}

impl TypeArgExpr {
    pub fn new(variance: Variance, ty: TypeExpr) -> Self {
        let span = ty.span;
        TypeArgExpr { variance, ty, span }
    }
}

/// `<out T : Bound>`
#[derive(Clone, Debug)]
pub struct TypeParamDecl {
    pub name: Name,
    pub variance: Variance,
    pub bound: Option<TypeExpr>,
    pub span: Span,
}

impl TypeParamDecl {
    pub fn new(name: Name, span: Span) -> Self {
        TypeParamDecl {
            name,
            variance: Variance::Unspecified,
            bound: None,
            span,
        }
    }

    #[must_use]
    pub fn with_variance(mut self, variance: Variance) -> Self {
        self.variance = variance;
        self
    }

    #[must_use]
    pub fn with_bound(mut self, bound: TypeExpr) -> Self {
        self.bound = Some(bound);
        self
    }
}

/// A function attribute as written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeKind {
    /// `pure`, `read`, `mut`
    Purity(Purity),
    Nothrow,
    /// `external(C)`: implemented outside, with the given calling convention.
    External(Name),
    Operator,
    Override,
    /// `get` / `set`: the function stands in for a member variable of the
    /// same name.
    Accessor(AccessorKind),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AccessorKind {
    Read,
    Write,
}

impl AccessorKind {
    pub fn keyword(self) -> &'static str {
        match self {
            AccessorKind::Read => "get",
            AccessorKind::Write => "set",
        }
    }
}

#[derive(Clone, Debug)]
pub struct AttributeDecl {
    pub kind: AttributeKind,
    pub span: Span,
}

impl AttributeDecl {
    pub fn new(kind: AttributeKind, span: Span) -> Self {
        AttributeDecl { kind, span }
    }
}

/// A value parameter; the receiver is the parameter named `self`.
#[derive(Clone, Debug)]
pub struct ParamDecl {
    pub name: Name,
    pub ty: Option<TypeExpr>,
    pub span: Span,
}

impl ParamDecl {
    pub fn new(name: Name, ty: Option<TypeExpr>, span: Span) -> Self {
        ParamDecl { name, ty, span }
    }
}

#[derive(Clone, Debug)]
pub enum BodyDecl {
    /// `= expr`
    Expression(ExprDecl),
    Block(BlockDecl),
}

#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub name: Name,
    pub visibility: Option<VisibilityDecl>,
    pub attributes: Vec<AttributeDecl>,
    pub type_params: Vec<TypeParamDecl>,
    pub params: Vec<ParamDecl>,
    pub ret: Option<TypeExpr>,
    pub body: Option<BodyDecl>,
    pub span: Span,
}

impl FunctionDecl {
    pub fn new(name: Name, span: Span) -> Self {
        FunctionDecl {
            name,
            visibility: None,
            attributes: Vec::new(),
            type_params: Vec::new(),
            params: Vec::new(),
            ret: None,
            body: None,
            span,
        }
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: VisibilityDecl) -> Self {
        self.visibility = Some(visibility);
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: AttributeDecl) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[must_use]
    pub fn with_type_param(mut self, param: TypeParamDecl) -> Self {
        self.type_params.push(param);
        self
    }

    #[must_use]
    pub fn with_param(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn returning(mut self, ret: TypeExpr) -> Self {
        self.ret = Some(ret);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: BodyDecl) -> Self {
        self.body = Some(body);
        self
    }
}

/// `var` / `val` declaration, at any level.
#[derive(Clone, Debug)]
pub struct VariableDecl {
    pub name: Name,
    pub visibility: Option<VisibilityDecl>,
    pub ty: Option<TypeExpr>,
    pub init: Option<ExprDecl>,
    /// `var` rather than `val`.
    pub reassignable: bool,
    pub span: Span,
}

impl VariableDecl {
    pub fn new(name: Name, span: Span) -> Self {
        VariableDecl {
            name,
            visibility: None,
            ty: None,
            init: None,
            reassignable: false,
            span,
        }
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: VisibilityDecl) -> Self {
        self.visibility = Some(visibility);
        self
    }

    #[must_use]
    pub fn with_type(mut self, ty: TypeExpr) -> Self {
        self.ty = Some(ty);
        self
    }

    #[must_use]
    pub fn with_init(mut self, init: ExprDecl) -> Self {
        self.init = Some(init);
        self
    }

    #[must_use]
    pub fn reassignable(mut self) -> Self {
        self.reassignable = true;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaseTypeDeclKind {
    Class,
    Interface,
}

/// A member variable; `init` members become constructor parameters.
#[derive(Clone, Debug)]
pub struct MemberVariableDecl {
    pub variable: VariableDecl,
    pub init_from_constructor: bool,
    /// `decorates`: the member wraps the constructed object and the
    /// constructor is generic in the mutability it is handed.
    pub decorated: bool,
}

#[derive(Clone, Debug)]
pub struct ConstructorDecl {
    pub attributes: Vec<AttributeDecl>,
    pub body: BlockDecl,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct DestructorDecl {
    pub body: BlockDecl,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum MemberDecl {
    Variable(MemberVariableDecl),
    Function(FunctionDecl),
    Constructor(ConstructorDecl),
    Destructor(DestructorDecl),
}

#[derive(Clone, Debug)]
pub struct BaseTypeDecl {
    pub kind: BaseTypeDeclKind,
    pub name: Name,
    pub visibility: Option<VisibilityDecl>,
    pub type_params: Vec<TypeParamDecl>,
    pub supertypes: Vec<TypeExpr>,
    pub members: Vec<MemberDecl>,
    pub span: Span,
}

impl BaseTypeDecl {
    pub fn new(kind: BaseTypeDeclKind, name: Name, span: Span) -> Self {
        BaseTypeDecl {
            kind,
            name,
            visibility: None,
            type_params: Vec::new(),
            supertypes: Vec::new(),
            members: Vec::new(),
            span,
        }
    }

    pub fn class(name: Name, span: Span) -> Self {
        Self::new(BaseTypeDeclKind::Class, name, span)
    }

    pub fn interface(name: Name, span: Span) -> Self {
        Self::new(BaseTypeDeclKind::Interface, name, span)
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: VisibilityDecl) -> Self {
        self.visibility = Some(visibility);
        self
    }

    #[must_use]
    pub fn with_type_param(mut self, param: TypeParamDecl) -> Self {
        self.type_params.push(param);
        self
    }

    #[must_use]
    pub fn with_supertype(mut self, supertype: TypeExpr) -> Self {
        self.supertypes.push(supertype);
        self
    }

    #[must_use]
    pub fn with_member(mut self, member: MemberDecl) -> Self {
        self.members.push(member);
        self
    }

    /// A member variable; `init` marks it as set by the constructor.
    #[must_use]
    pub fn with_member_variable(self, variable: VariableDecl, init: bool) -> Self {
        self.with_member(MemberDecl::Variable(MemberVariableDecl {
            variable,
            init_from_constructor: init,
            decorated: false,
        }))
    }

    #[must_use]
    pub fn with_member_function(self, function: FunctionDecl) -> Self {
        self.with_member(MemberDecl::Function(function))
    }
}

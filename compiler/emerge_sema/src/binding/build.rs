//! Construction of a [`Program`] from declaration trees.

use std::cell::OnceCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use emerge_ir::{Name, PackagePath, SharedInterner, Span};
use emerge_types::{BaseTypeDef, BaseTypeKind, Mutability, ParamOwner, TypeParamId, TypeRegistry, Variance, Visibility};

use crate::decl::{
    BaseTypeDecl, BaseTypeDeclKind, BlockDecl, BodyDecl, ConstructorDecl, DestructorDecl, ExprDecl, ExprKind, FunctionDecl,
    Item, MemberDecl, SourceFile, StmtDecl, TypeExpr, TypeParamDecl, VariableDecl, VisibilityDecl,
};
use crate::phase::{CycleGuard, PhaseTracker};
use crate::AnalysisConfig;

use super::expr::BoundExprKind;
use super::function::{DecoratorParams, FnBody};
use super::scope::ScopeKind;
use super::variable::DeclaredType;
use super::{
    AttributeList, BaseId, BoundBaseType, BoundExpr, BoundFunction, BoundImport, BoundOverloadSet, BoundStmt,
    BoundTypeParam, BoundVariable, ExprId, FileIdx, FileInfo, FnId, FunctionKind, ImportId, MemberVariable,
    OverloadSetId, Program, Scope,
    ScopeId, StmtId, VarId, VariableKind,
};

/// Locals met while binding one body or initializer.
struct BodyBinder {
    file: FileIdx,
    locals: Vec<VarId>,
}

impl BodyBinder {
    fn new(file: FileIdx) -> Self {
        BodyBinder {
            file,
            locals: Vec::new(),
        }
    }
}

/// The base type whose members are being built.
struct Owner {
    file: FileIdx,
    scope: ScopeId,
    base: BaseId,
    name: Name,
    span: Span,
    visibility: Visibility,
    params: Vec<TypeParamId>,
}

/// Everything about a new variable except what binding derives.
struct VariableSpec {
    name: Name,
    kind: VariableKind,
    reassignable: bool,
    span: Span,
    visibility: Visibility,
    file: FileIdx,
    scope: ScopeId,
    declared: DeclaredType,
    visibility_decl: Option<VisibilityDecl>,
}

fn declared_of(ty: Option<&TypeExpr>) -> DeclaredType {
    ty.map_or(DeclaredType::None, |ty| DeclaredType::Written(ty.clone()))
}

impl Program {
    /// Bind every declaration of `sources`. Never fails: problems are
    /// reported by the analysis phases.
    #[tracing::instrument(level = "debug", skip_all, fields(files = sources.len()))]
    pub fn build(names: SharedInterner, config: AnalysisConfig, sources: Vec<SourceFile>) -> Program {
        let reg = TypeRegistry::new(names.clone());
        let mut program = Program {
            names,
            reg,
            config,
            files: Vec::new(),
            scopes: Vec::new(),
            functions: Vec::new(),
            variables: Vec::new(),
            base_types: Vec::new(),
            overload_sets: Vec::new(),
            imports: Vec::new(),
            exprs: Vec::new(),
            stmts: Vec::new(),
            globals: Vec::new(),
            top_level_functions: Vec::new(),
            top_level_overload_sets: Vec::new(),
            globals_by_name: FxHashMap::default(),
            functions_by_name: FxHashMap::default(),
            base_by_type: FxHashMap::default(),
            cycles: CycleGuard::new(),
        };

        for source in sources {
            let scope = program.push_scope(ScopeKind::File, None);
            let file = FileIdx::from_index(program.files.len());
            program.files.push(FileInfo {
                file: source.file,
                package: source.package,
                scope,
                imports: Vec::new(),
            });
            for item in source.items {
                match item {
                    Item::Import(decl) => {
                        let id = ImportId::from_index(program.imports.len());
                        let label = format!("import of `{}`", decl.package.display(&program.names));
                        program.imports.push(BoundImport {
                            package: decl.package,
                            span: decl.span,
                            symbols: decl.symbols,
                            file,
                            phases: PhaseTracker::new(label),
                        });
                        program.files[file.index()].imports.push(id);
                    }
                    Item::BaseType(decl) => {
                        program.build_base_type(file, decl);
                    }
                    Item::Function(decl) => {
                        let name = decl.name;
                        let id = program.build_function(file, scope, FunctionKind::TopLevel, decl, &[], None);
                        program.top_level_functions.push(id);
                        program.functions_by_name.entry(name).or_default().push(id);
                    }
                    Item::Variable(decl) => program.build_global(file, scope, &decl),
                }
            }
        }

        let top_level = program.top_level_functions.clone();
        program.top_level_overload_sets = program.group_overloads(&top_level, true);
        tracing::debug!(
            base_types = program.base_types.len(),
            functions = program.functions.len(),
            variables = program.variables.len(),
            "program bound"
        );
        program
    }

    /// A file scope belongs to the file about to be pushed.
    fn push_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId::from_index(self.scopes.len());
        let file = parent.map_or_else(|| FileIdx::from_index(self.files.len()), |p| self.scope(p).file);
        self.scopes.push(Scope::new(kind, parent, file));
        id
    }

    fn push_expr(&mut self, expr: BoundExpr) -> ExprId {
        let id = ExprId::from_index(self.exprs.len());
        self.exprs.push(expr);
        id
    }

    fn push_stmt(&mut self, stmt: BoundStmt) -> StmtId {
        let id = StmtId::from_index(self.stmts.len());
        self.stmts.push(stmt);
        id
    }

    fn push_variable(&mut self, spec: VariableSpec, init: Option<ExprId>, locals: Vec<VarId>) -> VarId {
        let id = VarId::from_index(self.variables.len());
        let label = format!("variable `{}`", self.text(spec.name));
        self.variables.push(BoundVariable {
            name: spec.name,
            kind: spec.kind,
            reassignable: spec.reassignable,
            span: spec.span,
            visibility: spec.visibility,
            file: spec.file,
            scope: spec.scope,
            declared: spec.declared,
            visibility_decl: spec.visibility_decl,
            init,
            locals,
            phases: PhaseTracker::new(label),
            resolved_declared: OnceCell::new(),
            ty: OnceCell::new(),
        });
        id
    }

    /// A local of the body being bound, resolved in `scope`.
    fn local_spec(
        &self,
        body: &BodyBinder,
        scope: ScopeId,
        name: Name,
        span: Span,
        reassignable: bool,
        declared: DeclaredType,
    ) -> VariableSpec {
        VariableSpec {
            name,
            kind: VariableKind::Local,
            reassignable,
            span,
            visibility: Visibility::file_of(&self.file(body.file).access_site()),
            file: body.file,
            scope,
            declared,
            visibility_decl: None,
        }
    }

    fn declare_in(&mut self, scope: ScopeId, name: Name, var: VarId) {
        self.scopes[scope.index()].variables.push((name, var));
    }

    fn declare_type_params(
        &mut self,
        scope: ScopeId,
        owner: ParamOwner,
        decls: Vec<TypeParamDecl>,
    ) -> Vec<BoundTypeParam> {
        let mut params = Vec::with_capacity(decls.len());
        for decl in decls {
            let id = self.reg.add_type_param(owner, decl.name, decl.variance, decl.span);
            self.scopes[scope.index()].type_params.push((decl.name, id));
            params.push(BoundTypeParam { id, decl });
        }
        params
    }

    /// Members default to the visibility of their base type and never
    /// exceed it.
    fn member_visibility(
        &self,
        file: FileIdx,
        declared: Option<&VisibilityDecl>,
        enclosing: Option<&Visibility>,
    ) -> Visibility {
        match (declared, enclosing) {
            (None, Some(enclosing)) => enclosing.clone(),
            (Some(_), Some(enclosing)) => self.resolve_visibility(file, declared).coerce_at_most(enclosing),
            (_, None) => self.resolve_visibility(file, declared),
        }
    }

    fn build_global(&mut self, file: FileIdx, scope: ScopeId, decl: &VariableDecl) {
        let mut body = BodyBinder::new(file);
        let init = decl.init.as_ref().map(|e| self.bind_expr(e, scope, &mut body));
        let spec = VariableSpec {
            name: decl.name,
            kind: VariableKind::Global,
            reassignable: decl.reassignable,
            span: decl.span,
            visibility: self.resolve_visibility(file, decl.visibility.as_ref()),
            file,
            scope,
            declared: declared_of(decl.ty.as_ref()),
            visibility_decl: decl.visibility.clone(),
        };
        let id = self.push_variable(spec, init, body.locals);
        self.globals.push(id);
        self.globals_by_name.entry(decl.name).or_default().push(id);
    }

    fn build_base_type(&mut self, file: FileIdx, decl: BaseTypeDecl) -> BaseId {
        let file_scope = self.file(file).scope;
        let package = self.file(file).package.clone();
        let visibility = self.resolve_visibility(file, decl.visibility.as_ref());
        let kind = match decl.kind {
            BaseTypeDeclKind::Class => BaseTypeKind::Class,
            BaseTypeDeclKind::Interface => BaseTypeKind::Interface,
        };
        let def = BaseTypeDef::new(decl.name, kind, visibility.clone(), decl.span).with_package(package);
        let type_id = self.reg.register_base_type(def);
        let base = BaseId::from_index(self.base_types.len());
        self.base_by_type.insert(type_id, base);

        let scope = self.push_scope(ScopeKind::BaseType, Some(file_scope));
        let type_params = self.declare_type_params(scope, ParamOwner::BaseType(type_id), decl.type_params);
        let owner = Owner {
            file,
            scope,
            base,
            name: decl.name,
            span: decl.span,
            visibility: visibility.clone(),
            params: type_params.iter().map(|p| p.id).collect(),
        };

        let mut member_variables = Vec::new();
        let mut member_functions = Vec::new();
        let mut constructor_decls = Vec::new();
        let mut destructor_decls = Vec::new();
        for member in decl.members {
            match member {
                MemberDecl::Variable(m) => member_variables.push(MemberVariable {
                    variable: self.build_member_variable(&owner, &m.variable),
                    init_from_constructor: m.init_from_constructor,
                    decorated: m.decorated,
                }),
                MemberDecl::Function(f) => member_functions.push(self.build_function(
                    file,
                    scope,
                    FunctionKind::Member(base),
                    f,
                    &owner.params,
                    Some(&visibility),
                )),
                MemberDecl::Constructor(c) => constructor_decls.push(c),
                MemberDecl::Destructor(d) => destructor_decls.push(d),
            }
        }

        let mut constructors: Vec<FnId> = constructor_decls
            .into_iter()
            .map(|c| self.build_constructor(&owner, &member_variables, Some(c)))
            .collect();
        if constructors.is_empty() && decl.kind == BaseTypeDeclKind::Class {
            constructors.push(self.build_constructor(&owner, &member_variables, None));
        }
        let destructors: Vec<FnId> = destructor_decls
            .into_iter()
            .map(|d| self.build_destructor(&owner, d))
            .collect();
        let member_overload_sets = self.group_overloads(&member_functions, false);

        let label = format!("type `{}`", self.text(decl.name));
        self.base_types.push(BoundBaseType {
            name: decl.name,
            kind: decl.kind,
            id: type_id,
            span: decl.span,
            visibility,
            type_params,
            member_variables,
            member_functions,
            constructors,
            destructors,
            member_overload_sets,
            supertype_decls: decl.supertypes,
            file,
            scope,
            phases: PhaseTracker::new(label),
            supertype_diagnostics: OnceCell::new(),
        });
        base
    }

    fn build_member_variable(&mut self, owner: &Owner, decl: &VariableDecl) -> VarId {
        let mut body = BodyBinder::new(owner.file);
        let init = decl.init.as_ref().map(|e| self.bind_expr(e, owner.scope, &mut body));
        let spec = VariableSpec {
            name: decl.name,
            kind: VariableKind::Member(owner.base),
            reassignable: decl.reassignable,
            span: decl.span,
            visibility: self.member_visibility(owner.file, decl.visibility.as_ref(), Some(&owner.visibility)),
            file: owner.file,
            scope: owner.scope,
            declared: declared_of(decl.ty.as_ref()),
            visibility_decl: decl.visibility.clone(),
        };
        self.push_variable(spec, init, body.locals)
    }

    fn build_function(
        &mut self,
        file: FileIdx,
        parent: ScopeId,
        kind: FunctionKind,
        decl: FunctionDecl,
        outer_params: &[TypeParamId],
        enclosing: Option<&Visibility>,
    ) -> FnId {
        let id = FnId::from_index(self.functions.len());
        let scope = self.push_scope(ScopeKind::Function, Some(parent));
        let type_params = self.declare_type_params(scope, ParamOwner::Function, decl.type_params);
        let visibility = self.member_visibility(file, decl.visibility.as_ref(), enclosing);

        let mut params = Vec::with_capacity(decl.params.len());
        for param in &decl.params {
            let declared = match (&param.ty, kind) {
                (Some(ty), _) => DeclaredType::Written(ty.clone()),
                (None, FunctionKind::Member(base)) if self.text(param.name) == "self" => {
                    DeclaredType::Receiver(base, Mutability::ReadOnly)
                }
                (None, _) => DeclaredType::None,
            };
            let spec = VariableSpec {
                name: param.name,
                kind: VariableKind::Parameter(id),
                reassignable: false,
                span: param.span,
                visibility: visibility.clone(),
                file,
                scope,
                declared,
                visibility_decl: None,
            };
            let var = self.push_variable(spec, None, Vec::new());
            self.declare_in(scope, param.name, var);
            params.push(var);
        }

        let mut binder = BodyBinder::new(file);
        let body = match &decl.body {
            None => FnBody::Absent,
            Some(BodyDecl::Expression(expr)) => FnBody::Expression(self.bind_expr(expr, scope, &mut binder)),
            Some(BodyDecl::Block(block)) => FnBody::Block(self.bind_block(block, scope, &mut binder)),
        };
        let all_type_params: Rc<[TypeParamId]> = outer_params
            .iter()
            .copied()
            .chain(type_params.iter().map(|p| p.id))
            .collect();

        let label = format!("function `{}`", self.text(decl.name));
        self.functions.push(BoundFunction {
            name: decl.name,
            kind,
            span: decl.span,
            visibility,
            attributes: AttributeList::new(decl.attributes),
            type_params,
            params,
            all_type_params,
            locals: binder.locals,
            file,
            scope,
            visibility_decl: decl.visibility,
            declared_return: decl.ret,
            body,
            decorator: None,
            phases: PhaseTracker::new(label),
            resolved_return: OnceCell::new(),
            return_type: OnceCell::new(),
        });
        id
    }

    /// `self`, typed as the object under construction or destruction.
    fn declare_receiver(&mut self, owner: &Owner, scope: ScopeId, span: Span) -> VarId {
        let name = self.names.intern("self");
        let spec = VariableSpec {
            name,
            kind: VariableKind::Local,
            reassignable: false,
            span,
            visibility: Visibility::file_of(&self.file(owner.file).access_site()),
            file: owner.file,
            scope,
            declared: DeclaredType::Receiver(owner.base, Mutability::Mutable),
            visibility_decl: None,
        };
        let var = self.push_variable(spec, None, Vec::new());
        self.declare_in(scope, name, var);
        var
    }

    /// A declared constructor, or the default one when `decl` is `None`.
    ///
    /// Parameters are generated for the `init` members in declaration
    /// order. Decorated members make the constructor generic in the
    /// mutability of the object it is handed.
    fn build_constructor(&mut self, owner: &Owner, members: &[MemberVariable], decl: Option<ConstructorDecl>) -> FnId {
        let id = FnId::from_index(self.functions.len());
        let scope = self.push_scope(ScopeKind::Function, Some(owner.scope));
        let span = decl.as_ref().map_or(owner.span, |c| c.span);
        let initialized: Vec<MemberVariable> = members.iter().copied().filter(|m| m.init_from_constructor).collect();

        let decorator = if initialized.iter().any(|m| m.decorated) {
            let name = self.names.intern("$Mutability");
            let mutability = self.reg.add_type_param(ParamOwner::Function, name, Variance::Unspecified, span);
            let mut members = Vec::new();
            for m in initialized.iter().filter(|m| m.decorated) {
                let (member_name, member_span) = {
                    let var = self.variable(m.variable);
                    (var.name, var.span)
                };
                let name = self.names.intern(&format!("${}", self.text(member_name)));
                let param = self.reg.add_type_param(ParamOwner::Function, name, Variance::Unspecified, member_span);
                members.push((m.variable, param));
            }
            Some(DecoratorParams { mutability, members })
        } else {
            None
        };

        let mut params = Vec::with_capacity(initialized.len());
        for member in &initialized {
            let (name, member_span) = {
                let var = self.variable(member.variable);
                (var.name, var.span)
            };
            let generated = decorator
                .as_ref()
                .and_then(|d| d.members.iter().find(|(v, _)| *v == member.variable))
                .map(|(_, param)| *param);
            let declared = match generated {
                Some(param) => DeclaredType::Generated(param),
                None => DeclaredType::FromMember(member.variable),
            };
            let spec = VariableSpec {
                name,
                kind: VariableKind::Parameter(id),
                reassignable: false,
                span: member_span,
                visibility: owner.visibility.clone(),
                file: owner.file,
                scope,
                declared,
                visibility_decl: None,
            };
            let var = self.push_variable(spec, None, Vec::new());
            self.declare_in(scope, name, var);
            params.push(var);
        }

        let receiver = self.declare_receiver(owner, scope, span);
        let mut binder = BodyBinder::new(owner.file);
        binder.locals.push(receiver);
        let (body, attributes) = match decl {
            Some(c) => (FnBody::Block(self.bind_block(&c.body, scope, &mut binder)), c.attributes),
            None => (FnBody::Generated, Vec::new()),
        };
        let all_type_params: Rc<[TypeParamId]> = owner
            .params
            .iter()
            .copied()
            .chain(decorator.iter().flat_map(|d| {
                std::iter::once(d.mutability).chain(d.members.iter().map(|(_, param)| *param))
            }))
            .collect();

        let label = format!("constructor of `{}`", self.text(owner.name));
        self.functions.push(BoundFunction {
            name: owner.name,
            kind: FunctionKind::Constructor(owner.base),
            span,
            visibility: owner.visibility.clone(),
            attributes: AttributeList::new(attributes),
            type_params: Vec::new(),
            params,
            all_type_params,
            locals: binder.locals,
            file: owner.file,
            scope,
            visibility_decl: None,
            declared_return: None,
            body,
            decorator,
            phases: PhaseTracker::new(label),
            resolved_return: OnceCell::new(),
            return_type: OnceCell::new(),
        });
        id
    }

    fn build_destructor(&mut self, owner: &Owner, decl: DestructorDecl) -> FnId {
        let scope = self.push_scope(ScopeKind::Function, Some(owner.scope));
        let receiver = self.declare_receiver(owner, scope, decl.span);
        let mut binder = BodyBinder::new(owner.file);
        binder.locals.push(receiver);
        let body = FnBody::Block(self.bind_block(&decl.body, scope, &mut binder));

        let label = format!("destructor of `{}`", self.text(owner.name));
        let id = FnId::from_index(self.functions.len());
        self.functions.push(BoundFunction {
            name: owner.name,
            kind: FunctionKind::Destructor(owner.base),
            span: decl.span,
            visibility: owner.visibility.clone(),
            attributes: AttributeList::new(Vec::new()),
            type_params: Vec::new(),
            params: Vec::new(),
            all_type_params: owner.params.iter().copied().collect(),
            locals: binder.locals,
            file: owner.file,
            scope,
            visibility_decl: None,
            declared_return: None,
            body,
            decorator: None,
            phases: PhaseTracker::new(label),
            resolved_return: OnceCell::new(),
            return_type: OnceCell::new(),
        });
        id
    }

    /// Group functions by name and parameter count, and by package for
    /// top-level functions, keeping declaration order.
    fn group_overloads(&mut self, functions: &[FnId], top_level: bool) -> Vec<OverloadSetId> {
        let mut groups: Vec<(Option<PackagePath>, Name, usize, Vec<FnId>)> = Vec::new();
        for id in functions {
            let f = self.function(*id);
            let package = top_level.then(|| self.file(f.file).package.clone());
            let count = f.params.len();
            match groups
                .iter_mut()
                .find(|(p, n, c, _)| *p == package && *n == f.name && *c == count)
            {
                Some((.., overloads)) => overloads.push(*id),
                None => groups.push((package, f.name, count, vec![*id])),
            }
        }
        groups
            .into_iter()
            .map(|(package, name, parameter_count, overloads)| {
                let id = OverloadSetId::from_index(self.overload_sets.len());
                let label = format!("overload set `{}/{parameter_count}`", self.text(name));
                self.overload_sets.push(BoundOverloadSet {
                    name,
                    parameter_count,
                    package,
                    overloads,
                    phases: PhaseTracker::new(label),
                });
                id
            })
            .collect()
    }

    fn bind_expr(&mut self, decl: &ExprDecl, scope: ScopeId, body: &mut BodyBinder) -> ExprId {
        let kind = match &decl.kind {
            ExprKind::IntLiteral(value) => BoundExprKind::IntLiteral(*value),
            ExprKind::BoolLiteral(_) => BoundExprKind::BoolLiteral,
            ExprKind::StringLiteral(_) => BoundExprKind::StringLiteral,
            ExprKind::Null => BoundExprKind::Null,
            ExprKind::Identifier(name) => BoundExprKind::Identifier(*name),
            ExprKind::MemberAccess { receiver, member } => BoundExprKind::MemberAccess {
                receiver: self.bind_expr(receiver, scope, body),
                member: *member,
            },
            ExprKind::Invocation {
                receiver,
                name,
                type_args,
                args,
            } => {
                let receiver = receiver.as_ref().map(|r| self.bind_expr(r, scope, body));
                let args = args.iter().map(|a| self.bind_expr(a, scope, body)).collect();
                BoundExprKind::Invocation {
                    receiver,
                    name: *name,
                    type_args: type_args.clone(),
                    args,
                }
            }
            ExprKind::NotNull(value) => BoundExprKind::NotNull(self.bind_expr(value, scope, body)),
            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => BoundExprKind::If {
                condition: self.bind_expr(condition, scope, body),
                then_branch: self.bind_block(then_branch, scope, body),
                else_branch: else_branch.as_ref().map(|b| self.bind_block(b, scope, body)),
            },
            ExprKind::ArrayLiteral(elements) => {
                BoundExprKind::ArrayLiteral(elements.iter().map(|e| self.bind_expr(e, scope, body)).collect())
            }
            ExprKind::Binary { op, lhs, rhs } => BoundExprKind::Binary {
                op: *op,
                lhs: self.bind_expr(lhs, scope, body),
                rhs: self.bind_expr(rhs, scope, body),
            },
            ExprKind::Unary { op, value } => BoundExprKind::Unary {
                op: *op,
                value: self.bind_expr(value, scope, body),
            },
            ExprKind::NullCoalescing { value, alternative } => BoundExprKind::NullCoalescing {
                value: self.bind_expr(value, scope, body),
                alternative: self.bind_expr(alternative, scope, body),
            },
            ExprKind::Cast { value, to, safe } => BoundExprKind::Cast {
                value: self.bind_expr(value, scope, body),
                to: to.clone(),
                safe: *safe,
            },
            ExprKind::InstanceOf { value, ty } => BoundExprKind::InstanceOf {
                value: self.bind_expr(value, scope, body),
                ty: ty.clone(),
            },
            ExprKind::TryCatch {
                fallible,
                error,
                error_span,
                handler,
            } => {
                let fallible = self.bind_block(fallible, scope, body);
                let catch_scope = self.push_scope(ScopeKind::Block, Some(scope));
                let spec = self.local_spec(body, scope, *error, *error_span, false, DeclaredType::Caught);
                let error = self.push_variable(spec, None, Vec::new());
                body.locals.push(error);
                self.declare_in(catch_scope, self.variable(error).name, error);
                BoundExprKind::TryCatch {
                    fallible,
                    error,
                    handler: self.bind_block(handler, catch_scope, body),
                }
            }
        };
        self.push_expr(BoundExpr::new(kind, decl.span, scope))
    }

    /// Every local declaration opens a scope for the statements after it.
    fn bind_block(&mut self, block: &BlockDecl, parent: ScopeId, body: &mut BodyBinder) -> Vec<StmtId> {
        let mut scope = self.push_scope(ScopeKind::Block, Some(parent));
        let mut stmts = Vec::with_capacity(block.statements.len());
        for stmt in &block.statements {
            let bound = match stmt {
                StmtDecl::Variable(decl) => {
                    let init = decl.init.as_ref().map(|e| self.bind_expr(e, scope, body));
                    let declared = declared_of(decl.ty.as_ref());
                    let spec = self.local_spec(body, scope, decl.name, decl.span, decl.reassignable, declared);
                    let var = self.push_variable(spec, init, Vec::new());
                    body.locals.push(var);
                    scope = self.push_scope(ScopeKind::Block, Some(scope));
                    self.declare_in(scope, decl.name, var);
                    BoundStmt::Variable(var)
                }
                StmtDecl::Assign { target, value, span } => BoundStmt::Assign {
                    target: self.bind_expr(target, scope, body),
                    value: self.bind_expr(value, scope, body),
                    span: *span,
                },
                StmtDecl::Expr(expr) => BoundStmt::Expr(self.bind_expr(expr, scope, body)),
                StmtDecl::Return { value, span } => BoundStmt::Return {
                    value: value.as_ref().map(|v| self.bind_expr(v, scope, body)),
                    span: *span,
                },
                StmtDecl::Throw { value, span } => BoundStmt::Throw {
                    value: self.bind_expr(value, scope, body),
                    span: *span,
                },
                StmtDecl::While {
                    condition,
                    body: block,
                    span: _,
                } => {
                    let condition = self.bind_expr(condition, scope, body);
                    let loop_scope = self.push_scope(ScopeKind::Loop, Some(scope));
                    BoundStmt::While {
                        condition,
                        body: self.bind_block(block, loop_scope, body),
                    }
                }
                StmtDecl::DoWhile {
                    body: block,
                    condition,
                    span: _,
                } => {
                    let loop_scope = self.push_scope(ScopeKind::Loop, Some(scope));
                    BoundStmt::DoWhile {
                        body: self.bind_block(block, loop_scope, body),
                        condition: self.bind_expr(condition, scope, body),
                    }
                }
                StmtDecl::ForEach {
                    cursor,
                    iterable,
                    body: block,
                    span: _,
                } => {
                    let iterable = self.bind_expr(iterable, scope, body);
                    let loop_scope = self.push_scope(ScopeKind::Loop, Some(scope));
                    let declared = match &cursor.ty {
                        Some(ty) => DeclaredType::Written(ty.clone()),
                        None => DeclaredType::ElementOf(iterable),
                    };
                    let spec = self.local_spec(body, scope, cursor.name, cursor.span, cursor.reassignable, declared);
                    let var = self.push_variable(spec, None, Vec::new());
                    body.locals.push(var);
                    self.declare_in(loop_scope, cursor.name, var);
                    BoundStmt::ForEach {
                        cursor: var,
                        iterable,
                        body: self.bind_block(block, loop_scope, body),
                    }
                }
                StmtDecl::Break(span) => BoundStmt::Break { span: *span, scope },
                StmtDecl::Continue(span) => BoundStmt::Continue { span: *span, scope },
            };
            stmts.push(self.push_stmt(bound));
        }
        stmts
    }
}

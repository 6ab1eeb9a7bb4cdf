//! Variables: globals, members, parameters and locals.

use std::cell::OnceCell;
use std::rc::Rc;

use emerge_diagnostic::{cyclic_type_deduction, duplicate_declaration, Diagnostic, ErrorCode};
use emerge_ir::{Name, Span};
use emerge_types::{Mutability, Purity, TypeParamId, TypeRef, TypeUnification, TypeUseSite, UseSiteRole, Visibility};

use crate::decl::{TypeExpr, TypeExprKind, VisibilityDecl};
use crate::effect::{Boundary, PurityViolationVisitor};
use crate::phase::{Guarded, PhaseTracker};
use crate::InternalCompilerError;

use super::effects::EffectRoot;
use super::expr::ExprContext;
use super::{BaseId, Entity, ExprId, FileIdx, FnId, Program, ScopeId, VarId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VariableKind {
    Global,
    Member(BaseId),
    Parameter(FnId),
    Local,
}

/// Where the declared type of a variable comes from.
#[derive(Clone, Debug)]
pub(crate) enum DeclaredType {
    None,
    Written(TypeExpr),
    /// The receiver of a member function or constructor.
    Receiver(BaseId, Mutability),
    /// A constructor parameter initializing the given member.
    FromMember(VarId),
    /// A constructor parameter of a decorated member, typed by a generated
    /// type parameter.
    Generated(TypeParamId),
    /// The cursor of a `for` loop over the given iterable.
    ElementOf(ExprId),
    /// The error bound by a `catch`.
    Caught,
}

#[derive(Debug)]
pub struct BoundVariable {
    pub name: Name,
    pub kind: VariableKind,
    /// `var` rather than `val`.
    pub reassignable: bool,
    pub span: Span,
    pub visibility: Visibility,
    pub(crate) file: FileIdx,
    /// Scope the type and initializer are resolved in; it does not contain
    /// the variable itself.
    pub(crate) scope: ScopeId,
    pub(crate) declared: DeclaredType,
    pub(crate) visibility_decl: Option<VisibilityDecl>,
    pub(crate) init: Option<ExprId>,
    /// Locals declared in blocks of the initializer.
    pub(crate) locals: Vec<VarId>,
    pub(crate) phases: PhaseTracker,
    pub(crate) resolved_declared: OnceCell<Option<TypeRef>>,
    pub(crate) ty: OnceCell<Option<TypeRef>>,
}

impl BoundVariable {
    /// Mutability assumed where the declared type does not say.
    pub fn implicit_mutability(&self) -> Mutability {
        if self.reassignable {
            Mutability::Mutable
        } else if matches!(self.kind, VariableKind::Parameter(_)) {
            Mutability::ReadOnly
        } else {
            Mutability::Immutable
        }
    }

    fn describe(&self, name: &str) -> String {
        match self.kind {
            VariableKind::Global => format!("global variable `{name}`"),
            VariableKind::Member(_) => format!("member variable `{name}`"),
            VariableKind::Parameter(_) => format!("parameter `{name}`"),
            VariableKind::Local => format!("variable `{name}`"),
        }
    }
}

impl Program {
    pub fn variable_phase1(&self, id: VarId) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        let var = self.variable(id);
        var.phases.phase1(|| {
            let mut out = Vec::new();
            let name = self.text(var.name);
            let what = var.describe(name);

            if let Some(original) = self.earlier_declaration(id) {
                out.push(duplicate_declaration(var.span, self.variable(original).span, "variable", name));
            }
            if var.kind == VariableKind::Global && var.init.is_none() {
                out.push(
                    Diagnostic::error(ErrorCode::E1002)
                        .with_message(format!("{what} must be initialized"))
                        .with_label(var.span, "no initializer"),
                );
            }

            let written = match &var.declared {
                DeclaredType::Written(ty) => Some(ty),
                _ => None,
            };
            let untyped = matches!(var.declared, DeclaredType::None);
            let missing_type = match var.kind {
                VariableKind::Parameter(_) => untyped,
                _ => untyped && var.init.is_none(),
            };
            if missing_type {
                out.push(
                    Diagnostic::error(ErrorCode::E1003)
                        .with_message(format!("the type of {what} must be declared"))
                        .with_label(var.span, "type cannot be inferred"),
                );
            }
            if let Some(ty) = written.filter(|ty| self.is_infer_marker(ty)) {
                if let Some(reason) = self.infer_marker_misuse(var, ty) {
                    out.push(
                        Diagnostic::error(ErrorCode::E2013)
                            .with_message(format!("the type of {what} cannot be inferred: {reason}"))
                            .with_label(ty.span, "`_` not allowed here"),
                    );
                }
            }

            let resolved = self.resolve_declared(var);
            let _ = var.resolved_declared.set(resolved);
            for local in &var.locals {
                out.extend(self.variable_phase1(*local)?.iter().cloned());
            }
            Ok(out)
        })
    }

    fn earlier_declaration(&self, id: VarId) -> Option<VarId> {
        let var = self.variable(id);
        match var.kind {
            VariableKind::Local | VariableKind::Parameter(_) => self.earlier_local(var.scope, id, var.name),
            VariableKind::Global => {
                let package = &self.file(var.file).package;
                self.globals_by_name
                    .get(&var.name)?
                    .iter()
                    .take_while(|other| **other != id)
                    .copied()
                    .find(|other| self.file(self.variable(*other).file).package == *package)
            }
            // member duplicates are reported by the base type
            VariableKind::Member(_) => None,
        }
    }

    fn infer_marker_misuse(&self, var: &BoundVariable, ty: &TypeExpr) -> Option<&'static str> {
        if matches!(var.kind, VariableKind::Parameter(_)) {
            return Some("parameters have no initializer");
        }
        match &ty.kind {
            TypeExprKind::Named { args: Some(_), .. } => Some("`_` takes no type arguments"),
            _ if var.init.is_none() => Some("there is no initializer"),
            _ => None,
        }
    }

    /// The declared type with the implicit mutability filled in; `None` when
    /// nothing is declared or the type is to be inferred.
    fn resolve_declared(&self, var: &BoundVariable) -> Option<TypeRef> {
        let implicit = Some(var.implicit_mutability());
        match &var.declared {
            DeclaredType::None => None,
            DeclaredType::Written(ty) if self.is_infer_marker(ty) => None,
            DeclaredType::Written(ty) => Some(self.resolve_type(var.scope, ty).default_mutability_to(implicit)),
            DeclaredType::Receiver(base, mutability) => {
                let id = self.base_type(*base).id;
                Some(self.reg.nominal_self(id).with_mutability(Some(*mutability)))
            }
            DeclaredType::FromMember(member) => self
                .variable(*member)
                .resolved_declared
                .get()
                .cloned()
                .flatten()
                .map(|ty| ty.at(var.span)),
            DeclaredType::Generated(param) => Some(TypeRef::generic(*param, None, var.span)),
            DeclaredType::ElementOf(_) => None,
            DeclaredType::Caught => Some(
                self.reg
                    .any()
                    .with_mutability(Some(Mutability::ReadOnly))
                    .at(var.span),
            ),
        }
    }

    /// Declared type after phase 1, if the variable has one.
    pub(crate) fn declared_type(&self, id: VarId) -> Option<TypeRef> {
        self.variable(id).resolved_declared.get().cloned().flatten()
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub fn variable_phase2(&self, id: VarId) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        let var = self.variable(id);
        var.phases.phase2(|| {
            let mut out = Vec::new();
            let declared = self.declared_type(id);
            let init_ty = match var.init {
                None => None,
                Some(init) => {
                    let ctx = ExprContext::new(self.file(var.file).access_site(), None, None);
                    let guarded = self.cycles.guard(Entity::Variable(id), || {
                        let mut inner = Vec::new();
                        let ty = self.analyze_expr(init, &ctx, declared.as_ref(), &mut inner);
                        ty.map(|ty| (ty, inner))
                    });
                    match guarded {
                        Guarded::Completed(result) => {
                            let (ty, inner) = result?;
                            out.extend(inner);
                            ty
                        }
                        Guarded::Cyclic(result) => {
                            let (_, inner) = result?;
                            out.extend(inner);
                            out.push(cyclic_type_deduction(
                                var.span,
                                &var.describe(self.text(var.name)),
                            ));
                            None
                        }
                        Guarded::Reentered => None,
                    }
                }
            };

            let ty = match (&declared, &var.declared) {
                (Some(declared), _) => {
                    if let (Some(init_ty), Some(init)) = (&init_ty, var.init) {
                        let span = self.expr(init).span;
                        let unification = self.reg.unify(declared, init_ty, span, TypeUnification::empty());
                        out.extend(unification.diagnostics().iter().cloned());
                    }
                    Some(declared.clone())
                }
                (None, DeclaredType::Written(marker)) => init_ty.map(|ty| {
                    let ty = ty.with_combined_mutability(Some(var.implicit_mutability()));
                    let ty = match marker.mutability {
                        Some(_) => ty.with_mutability(marker.mutability),
                        None => ty,
                    };
                    ty.with_combined_nullability(marker.nullability)
                }),
                (None, DeclaredType::ElementOf(iterable)) => self
                    .expression_type(*iterable)
                    .and_then(|ty| self.element_type(&ty))
                    .map(|ty| ty.at(var.span)),
                (None, _) => init_ty.map(|ty| ty.with_combined_mutability(Some(var.implicit_mutability()))),
            };

            if let (Some(declared), DeclaredType::Written(written)) = (&declared, &var.declared) {
                out.extend(self.validate_type(declared, &self.declared_type_site(var, written.span)));
            }
            for local in &var.locals {
                out.extend(self.variable_phase2(*local)?.iter().cloned());
            }

            let _ = var.ty.set(ty);
            Ok(out)
        })
    }

    fn declared_type_site(&self, var: &BoundVariable, span: Span) -> TypeUseSite {
        let access = self.file(var.file).access_site();
        match var.kind {
            VariableKind::Parameter(function) => TypeUseSite::new(UseSiteRole::In, span, access)
                .exposed_by(self.function(function).visibility.clone()),
            VariableKind::Global | VariableKind::Member(_) => {
                TypeUseSite::irrelevant(span, access).exposed_by(var.visibility.clone())
            }
            VariableKind::Local => TypeUseSite::irrelevant(span, access),
        }
    }

    /// Phase 3 of a global checks that its initializer reads no mutable
    /// state and initializes its own locals before reading them.
    pub fn variable_phase3(&self, id: VarId) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        let var = self.variable(id);
        var.phases.phase3(self.config.run_phase3_after_errors, || {
            let Some(init) = var.init else {
                return Ok(Vec::new());
            };
            if var.kind != VariableKind::Global {
                return Ok(Vec::new());
            }
            let boundary = Boundary {
                name: format!("initializer of `{}`", self.text(var.name)),
                purity: Purity::Pure,
                span: var.span,
            };
            let mut visitor = PurityViolationVisitor::new();
            self.visit_effects(&boundary, EffectRoot::Expr(init), &mut visitor)?;
            let mut out = visitor.into_diagnostics();
            out.extend(self.flow_violations(None, EffectRoot::Expr(init)));
            Ok(out)
        })
    }

    /// The type of variable `id` as seen by an expression referring to it.
    ///
    /// Declared types are known after phase 1. Inferred ones run the
    /// variable's phase 2 on demand; a reference from within its own
    /// initializer yields an unknown type, and the cycle is reported by the
    /// variable.
    pub(crate) fn type_of_reference(&self, id: VarId) -> Result<Option<TypeRef>, InternalCompilerError> {
        if let Some(declared) = self.declared_type(id) {
            return Ok(Some(declared));
        }
        if self.cycles.intercept(Entity::Variable(id)) {
            return Ok(None);
        }
        self.variable_phase2(id)?;
        Ok(self.variable_type(id))
    }

    pub(crate) fn describe_variable(&self, id: VarId) -> String {
        let var = self.variable(id);
        var.describe(self.text(var.name))
    }
}

//! Functions, member functions, constructors and destructors.

use std::cell::OnceCell;
use std::rc::Rc;

use emerge_diagnostic::{cyclic_type_deduction, Diagnostic, ErrorCode};
use emerge_ir::{Name, Span};
use emerge_types::{BaseTypeId, Mutability, TypeParamId, TypeRef, TypeUnification, TypeUseSite, UseSiteRole, Visibility};

use crate::decl::{TypeExpr, VisibilityDecl};
use crate::effect::{Boundary, PurityViolationVisitor, SideEffectPrediction};
use crate::phase::{Guarded, PhaseTracker};
use crate::InternalCompilerError;

use super::effects::EffectRoot;
use super::expr::ExprContext;
use super::{AttributeList, BaseId, BoundTypeParam, Entity, ExprId, FileIdx, FnId, Program, ScopeId, StmtId, VarId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FunctionKind {
    TopLevel,
    Member(BaseId),
    Constructor(BaseId),
    Destructor(BaseId),
}

impl FunctionKind {
    pub fn owner(self) -> Option<BaseId> {
        match self {
            FunctionKind::TopLevel => None,
            FunctionKind::Member(base) | FunctionKind::Constructor(base) | FunctionKind::Destructor(base) => {
                Some(base)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) enum FnBody {
    Expression(ExprId),
    Block(Vec<StmtId>),
    /// Synthesized constructor without code of its own.
    Generated,
    /// Abstract or external.
    Absent,
}

/// Type parameters a constructor of a decorating class gets implicitly.
#[derive(Clone, Debug)]
pub(crate) struct DecoratorParams {
    /// Mutability the constructed object is handed.
    pub mutability: TypeParamId,
    /// One per decorated member, bounded by the member type and `mutability`.
    pub members: Vec<(VarId, TypeParamId)>,
}

#[derive(Debug)]
pub struct BoundFunction {
    pub name: Name,
    pub kind: FunctionKind,
    pub span: Span,
    pub visibility: Visibility,
    pub attributes: AttributeList,
    pub type_params: Vec<BoundTypeParam>,
    pub params: Vec<VarId>,
    /// Own, generated and (for member functions) the base type's parameters.
    pub(crate) all_type_params: Rc<[TypeParamId]>,
    /// Every local of the body, nested blocks included.
    pub(crate) locals: Vec<VarId>,
    pub(crate) file: FileIdx,
    pub(crate) scope: ScopeId,
    pub(crate) visibility_decl: Option<VisibilityDecl>,
    pub(crate) declared_return: Option<TypeExpr>,
    pub(crate) body: FnBody,
    pub(crate) decorator: Option<DecoratorParams>,
    pub(crate) phases: PhaseTracker,
    pub(crate) resolved_return: OnceCell<Option<TypeRef>>,
    pub(crate) return_type: OnceCell<Option<TypeRef>>,
}

impl BoundFunction {
    pub fn has_body(&self) -> bool {
        !matches!(self.body, FnBody::Absent)
    }

    pub(crate) fn body_root(&self) -> Option<EffectRoot<'_>> {
        match &self.body {
            FnBody::Expression(expr) => Some(EffectRoot::Expr(*expr)),
            FnBody::Block(stmts) => Some(EffectRoot::Block(stmts)),
            FnBody::Generated | FnBody::Absent => None,
        }
    }
}

impl Program {
    /// Whether the first parameter is the receiver `self`.
    pub fn declares_receiver(&self, id: FnId) -> bool {
        self.function(id)
            .params
            .first()
            .is_some_and(|p| self.text(self.variable(*p).name) == "self")
    }

    pub(crate) fn describe_function(&self, id: FnId) -> String {
        let f = self.function(id);
        match f.kind {
            FunctionKind::Constructor(_) => format!("constructor of `{}`", self.text(f.name)),
            FunctionKind::Destructor(_) => format!("destructor of `{}`", self.text(f.name)),
            FunctionKind::TopLevel | FunctionKind::Member(_) => format!("function `{}`", self.text(f.name)),
        }
    }

    pub fn function_phase1(&self, id: FnId) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        let f = self.function(id);
        f.phases.phase1(|| {
            let name = self.text(f.name);
            let mut out = f.attributes.validate(name, f.span);
            if let Some(owner) = f.kind.owner() {
                let base = self.base_type(owner);
                out.extend(self.check_visibility_shadowing(
                    &self.describe_function(id),
                    f.file,
                    f.visibility_decl.as_ref(),
                    &base.visibility,
                ));
            }
            out.extend(self.type_params_phase1(&f.type_params, f.scope));
            if let Some(decorator) = &f.decorator {
                let mutability = TypeRef::generic(decorator.mutability, None, f.span);
                for (member, param) in &decorator.members {
                    if let Some(member_ty) = self.declared_type(*member) {
                        let bound = self.reg.intersection_of(vec![member_ty, mutability.clone()]);
                        self.reg.set_bound(*param, bound);
                    }
                }
            }
            for param in &f.params {
                out.extend(self.variable_phase1(*param)?.iter().cloned());
            }
            out.extend(self.check_body_presence(id));

            let resolved = self.resolve_return(f);
            let _ = f.resolved_return.set(resolved);
            out.extend(self.check_accessor_contract(id));

            for local in &f.locals {
                out.extend(self.variable_phase1(*local)?.iter().cloned());
            }
            Ok(out)
        })
    }

    /// `E1012` for a missing body where one is required, or a body on an
    /// external function.
    fn check_body_presence(&self, id: FnId) -> Option<Diagnostic> {
        let f = self.function(id);
        let what = self.describe_function(id);
        if f.attributes.external.is_some() {
            return f.has_body().then(|| {
                Diagnostic::error(ErrorCode::E1012)
                    .with_message(format!("external {what} cannot have a body"))
                    .with_label(f.span, "body not allowed")
            });
        }
        let abstract_allowed = match f.kind {
            FunctionKind::Member(base) => self.base_type(base).is_interface(),
            _ => false,
        };
        (!f.has_body() && !abstract_allowed).then(|| {
            Diagnostic::error(ErrorCode::E1012)
                .with_message(format!("{what} needs a body"))
                .with_label(f.span, "missing body")
                .with_suggestion("declare the function `external` or give it a body")
        })
    }

    fn resolve_return(&self, f: &BoundFunction) -> Option<TypeRef> {
        match f.kind {
            FunctionKind::Constructor(base) => {
                let id = self.base_type(base).id;
                let own = self.reg.nominal_self(id).at(f.span);
                Some(match &f.decorator {
                    None => own.with_mutability(Some(Mutability::Exclusive)),
                    Some(decorator) => self.reg.intersection_of(vec![
                        own.with_mutability(Some(Mutability::ReadOnly)),
                        TypeRef::generic(decorator.mutability, None, f.span),
                    ]),
                })
            }
            FunctionKind::Destructor(_) => Some(self.reg.unit()),
            FunctionKind::TopLevel | FunctionKind::Member(_) => match (&f.declared_return, &f.body) {
                (Some(written), FnBody::Block(_)) => Some(
                    self.resolve_type(f.scope, written)
                        .default_mutability_to(Some(Mutability::Immutable)),
                ),
                (Some(written), _) => Some(self.resolve_type(f.scope, written)),
                (None, FnBody::Expression(_)) => None,
                (None, _) => Some(self.reg.unit()),
            },
        }
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub fn function_phase2(&self, id: FnId) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        let f = self.function(id);
        f.phases.phase2(|| {
            let mut out = Vec::new();
            for param in &f.params {
                out.extend(self.variable_phase2(*param)?.iter().cloned());
            }
            out.extend(self.type_params_phase2(&f.type_params, f.file, &f.visibility, true));

            let declared = f.resolved_return.get().cloned().flatten();
            if let (Some(written), Some(ty)) = (&f.declared_return, &declared) {
                let site = TypeUseSite::new(UseSiteRole::Out, written.span, self.file(f.file).access_site())
                    .exposed_by(f.visibility.clone());
                out.extend(self.validate_type(ty, &site));
            }

            let ctx = ExprContext::new(self.file(f.file).access_site(), Some(id), declared.clone());
            let guarded = self.cycles.guard(Entity::FunctionBody(id), || {
                let mut inner = Vec::new();
                let ty = match &f.body {
                    FnBody::Expression(expr) => {
                        let ty = self.analyze_expr(*expr, &ctx, declared.as_ref(), &mut inner)?;
                        if let (Some(declared), Some(ty)) = (&declared, &ty) {
                            let span = self.expr(*expr).span;
                            let unification = self.reg.unify(declared, ty, span, TypeUnification::empty());
                            inner.extend(unification.diagnostics().iter().cloned());
                        }
                        ty
                    }
                    FnBody::Block(stmts) => {
                        self.analyze_statements(stmts, &ctx, &mut inner)?;
                        None
                    }
                    FnBody::Generated | FnBody::Absent => None,
                };
                Ok::<_, InternalCompilerError>((ty, inner))
            });
            let body_ty = match guarded {
                Guarded::Completed(result) => {
                    let (ty, inner) = result?;
                    out.extend(inner);
                    ty
                }
                Guarded::Cyclic(result) => {
                    let (_, inner) = result?;
                    out.extend(inner);
                    out.push(cyclic_type_deduction(
                        f.span,
                        &format!("the return type of {}", self.describe_function(id)),
                    ));
                    None
                }
                Guarded::Reentered => None,
            };

            for local in &f.locals {
                out.extend(self.variable_phase2(*local)?.iter().cloned());
            }
            let _ = f.return_type.set(declared.or(body_ty));
            Ok(out)
        })
    }

    /// The return type a call of `id` sees. Declared return types are known
    /// after phase 1; inferred ones run the callee's phase 2 on demand.
    pub(crate) fn callee_return_type(&self, id: FnId) -> Result<Option<TypeRef>, InternalCompilerError> {
        let f = self.function(id);
        if let Some(declared) = f.resolved_return.get().cloned().flatten() {
            return Ok(Some(declared));
        }
        if self.cycles.intercept(Entity::FunctionBody(id)) {
            return Ok(None);
        }
        self.function_phase2(id)?;
        Ok(self.return_type(id))
    }

    pub fn function_phase3(&self, id: FnId) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        let f = self.function(id);
        f.phases.phase3(self.config.run_phase3_after_errors, || {
            let mut out = Vec::new();
            let Some(root) = f.body_root() else {
                return Ok(out);
            };
            let boundary = Boundary {
                name: self.text(f.name).to_owned(),
                purity: f.attributes.purity,
                span: f.span,
            };
            let mut visitor = PurityViolationVisitor::new();
            self.visit_effects(&boundary, root, &mut visitor)?;
            out.extend(visitor.into_diagnostics());
            out.extend(self.flow_violations(Some(id), root));

            if f.attributes.is_nothrow() {
                out.extend(self.nothrow_violations(&self.describe_function(id), root));
            }

            if let FnBody::Block(stmts) = &f.body {
                let returns_value = self
                    .return_type(id)
                    .is_some_and(|ty| ty.nominal_base() != Some(BaseTypeId::UNIT));
                if returns_value && self.exit_behavior(stmts) != SideEffectPrediction::Guaranteed {
                    out.push(
                        Diagnostic::error(ErrorCode::E4004)
                            .with_message(format!(
                                "{} does not return or throw on every path",
                                self.describe_function(id)
                            ))
                            .with_label(f.span, "missing return"),
                    );
                }
            }
            Ok(out)
        })
    }

    /// Whether calling `id` may throw.
    pub fn throw_behavior(&self, id: FnId) -> SideEffectPrediction {
        let f = self.function(id);
        if f.attributes.is_nothrow() {
            return SideEffectPrediction::Never;
        }
        let Some(root) = f.body_root() else {
            return match f.body {
                FnBody::Generated => SideEffectPrediction::Never,
                _ => SideEffectPrediction::Possibly,
            };
        };
        match self.cycles.guard(Entity::ThrowBehavior(id), || self.predict_throw(root)) {
            Guarded::Completed(prediction) | Guarded::Cyclic(prediction) => prediction,
            Guarded::Reentered => SideEffectPrediction::Possibly,
        }
    }
}

//! Getters and setters: member functions that stand in for a member
//! variable of the same name.
//!
//! `obj.name` reads through the getter when the type has no member variable
//! `name`; `obj.name = v` writes through the setter.

use emerge_diagnostic::{Diagnostic, ErrorCode};
use emerge_ir::{Name, Span};
use emerge_types::{BaseTypeId, Mutability, NominalTy, Purity, TypeRef};

use crate::decl::{AccessorKind, AttributeKind};
use crate::InternalCompilerError;

use super::expr::{BoundExpr, BoundExprKind, ExprContext, Resolution, ResolvedInvocation};
use super::{ExprId, FnId, FunctionKind, Program};

impl Program {
    /// The accessor of `kind` named `name` on `base` or its ancestors.
    pub(crate) fn find_accessor(
        &self,
        base: BaseTypeId,
        name: Name,
        kind: AccessorKind,
    ) -> Option<FnId> {
        self.reg.ancestors(base).into_iter().find_map(|ancestor| {
            let bound = self.base_type(self.base_of(ancestor)?);
            bound.member_functions.iter().copied().find(|f| {
                let function = self.function(*f);
                function.name == name && function.attributes.accessor == Some(kind)
            })
        })
    }

    /// `E3011` for each way the accessor `id` breaks its contract.
    pub(crate) fn check_accessor_contract(&self, id: FnId) -> Vec<Diagnostic> {
        let f = self.function(id);
        let Some(kind) = f.attributes.accessor else {
            return Vec::new();
        };
        let keyword = kind.keyword();
        let at = f
            .attributes
            .span_of(|k| matches!(k, AttributeKind::Accessor(_)))
            .unwrap_or(f.span);
        let violation = |message: String, span: Span| {
            Diagnostic::error(ErrorCode::E3011)
                .with_message(format!("`{}` is declared `{keyword}`: {message}", self.text(f.name)))
                .with_label(span, "accessor contract violated")
                .with_secondary_label(at, "declared an accessor here")
        };

        if !matches!(f.kind, FunctionKind::Member(_)) {
            return vec![violation("only member functions can be accessors".to_owned(), f.span)];
        }
        let mut out = Vec::new();
        let purity = f.attributes.purity;
        if purity != Purity::Pure {
            out.push(violation(format!("accessors must be pure, not {purity}"), f.span));
        }

        let (arity, shape, receiver_mutability) = match kind {
            AccessorKind::Read => (1, "getters take `self` only", Mutability::ReadOnly),
            AccessorKind::Write => {
                (2, "setters take `self` and the new value", Mutability::Mutable)
            }
        };
        if f.params.len() != arity || !self.declares_receiver(id) {
            let span = f.params.get(arity).map_or(f.span, |p| self.variable(*p).span);
            out.push(violation(shape.to_owned(), span));
            return out;
        }
        let receiver = f.params[0];
        if let Some(ty) = self.declared_type(receiver) {
            let actual = ty.mutability(&self.reg);
            if actual != receiver_mutability {
                out.push(violation(
                    format!("the object must be `{receiver_mutability}`, not `{actual}`"),
                    self.variable(receiver).span,
                ));
            }
        }
        if kind == AccessorKind::Write {
            let returns_unit = f
                .resolved_return
                .get()
                .cloned()
                .flatten()
                .map_or(true, |ty| ty.nominal_base() == Some(BaseTypeId::UNIT));
            if !returns_unit {
                out.push(violation("setters return `Unit`".to_owned(), f.span));
            }
        }
        out
    }

    /// `obj.name` on a type whose member `name` is a getter.
    pub(crate) fn read_through_getter(
        &self,
        expr: &BoundExpr,
        getter: FnId,
        nominal: &NominalTy,
        ctx: &ExprContext,
        out: &mut Vec<Diagnostic>,
    ) -> Result<Option<TypeRef>, InternalCompilerError> {
        self.check_accessor_visibility(expr, getter, ctx, out);
        let ty = self.callee_return_type(getter)?;
        let bindings = self.reg.inherent_bindings(nominal);
        let ty = ty.map(|ty| ty.instantiate_all_parameters(&self.reg, &bindings).at(expr.span));
        let _ = expr.resolution.set(Resolution::Invocation(ResolvedInvocation {
            function: getter,
            bindings: Vec::new(),
            return_type: ty.clone(),
        }));
        Ok(ty)
    }

    /// Type of the assignment target `obj.name` when it writes through a
    /// setter; `None` when `target` is not such a write.
    pub(crate) fn analyze_setter_target(
        &self,
        target: ExprId,
        ctx: &ExprContext,
        out: &mut Vec<Diagnostic>,
    ) -> Result<Option<Option<TypeRef>>, InternalCompilerError> {
        let expr = self.expr(target);
        let BoundExprKind::MemberAccess { receiver, member } = &expr.kind else {
            return Ok(None);
        };
        let Some(receiver_ty) = self.analyze_expr(*receiver, ctx, None, out)? else {
            return Ok(None);
        };
        let TypeRef::Nominal(nominal) = receiver_ty.non_null_view() else {
            return Ok(None);
        };
        if self.find_member_variable(nominal.base, *member).is_some() {
            return Ok(None);
        }
        let Some(setter) = self.find_accessor(nominal.base, *member, AccessorKind::Write) else {
            return Ok(None);
        };
        self.check_accessor_visibility(expr, setter, ctx, out);
        let bindings = self.reg.inherent_bindings(nominal);
        let value_ty = self
            .function(setter)
            .params
            .get(1)
            .and_then(|p| self.declared_type(*p))
            .map(|ty| ty.instantiate_all_parameters(&self.reg, &bindings).at(expr.span));
        let _ = expr.resolution.set(Resolution::Invocation(ResolvedInvocation {
            function: setter,
            bindings: Vec::new(),
            return_type: Some(self.reg.unit()),
        }));
        Ok(Some(expr.ty.get_or_init(|| value_ty).clone()))
    }

    fn check_accessor_visibility(
        &self,
        expr: &BoundExpr,
        accessor: FnId,
        ctx: &ExprContext,
        out: &mut Vec<Diagnostic>,
    ) {
        let f = self.function(accessor);
        if let Some(denied) =
            f.visibility
                .validate_access_from(&ctx.access, expr.span, &self.describe_function(accessor))
        {
            out.push(denied);
        }
    }
}

//! Bound expressions and statements, and their type analysis.

use std::cell::OnceCell;

use emerge_diagnostic::{unknown_identifier, Diagnostic, ErrorCode};
use emerge_ir::{Name, Span};
use emerge_types::{
    AccessSite, BaseTypeFlags, BaseTypeId, Mutability, Nullability, TypeArgument, TypeParamId, TypeRef,
    TypeUnification, TypeUseSite,
};

use crate::decl::{AccessorKind, BinaryOp, TypeArgExpr, TypeExpr, UnaryOp};
use crate::effect::SideEffectPrediction;
use crate::InternalCompilerError;

use super::variable::DeclaredType;
use super::{ExprId, FnId, FunctionKind, Program, ScopeId, StmtId, VarId, VariableKind};

#[derive(Clone, Debug)]
pub(crate) enum BoundExprKind {
    IntLiteral(i64),
    BoolLiteral,
    StringLiteral,
    Null,
    Identifier(Name),
    MemberAccess {
        receiver: ExprId,
        member: Name,
    },
    Invocation {
        receiver: Option<ExprId>,
        name: Name,
        type_args: Option<Vec<TypeArgExpr>>,
        args: Vec<ExprId>,
    },
    NotNull(ExprId),
    If {
        condition: ExprId,
        then_branch: Vec<StmtId>,
        else_branch: Option<Vec<StmtId>>,
    },
    ArrayLiteral(Vec<ExprId>),
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Unary {
        op: UnaryOp,
        value: ExprId,
    },
    NullCoalescing {
        value: ExprId,
        alternative: ExprId,
    },
    Cast {
        value: ExprId,
        to: TypeExpr,
        safe: bool,
    },
    InstanceOf {
        value: ExprId,
        ty: TypeExpr,
    },
    TryCatch {
        fallible: Vec<StmtId>,
        error: VarId,
        handler: Vec<StmtId>,
    },
}

/// What a name or invocation in an expression turned out to refer to.
#[derive(Clone, Debug)]
pub(crate) enum Resolution {
    Variable(VarId),
    Member(VarId),
    Invocation(ResolvedInvocation),
}

/// The overload an invocation selected, with its inferred type arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedInvocation {
    pub function: FnId,
    pub bindings: Vec<(TypeParamId, TypeRef)>,
    /// `None` when the callee's return type could not be determined.
    pub return_type: Option<TypeRef>,
}

#[derive(Debug)]
pub(crate) struct BoundExpr {
    pub kind: BoundExprKind,
    pub span: Span,
    pub scope: ScopeId,
    pub ty: OnceCell<Option<TypeRef>>,
    pub resolution: OnceCell<Resolution>,
}

impl BoundExpr {
    pub fn new(kind: BoundExprKind, span: Span, scope: ScopeId) -> Self {
        BoundExpr {
            kind,
            span,
            scope,
            ty: OnceCell::new(),
            resolution: OnceCell::new(),
        }
    }

    pub fn invocation(&self) -> Option<&ResolvedInvocation> {
        match self.resolution.get() {
            Some(Resolution::Invocation(invocation)) => Some(invocation),
            _ => None,
        }
    }

    pub fn variable(&self) -> Option<VarId> {
        match self.resolution.get() {
            Some(Resolution::Variable(var)) => Some(*var),
            _ => None,
        }
    }

    pub fn member(&self) -> Option<VarId> {
        match self.resolution.get() {
            Some(Resolution::Member(var)) => Some(*var),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) enum BoundStmt {
    Variable(VarId),
    Assign { target: ExprId, value: ExprId, span: Span },
    Expr(ExprId),
    Return { value: Option<ExprId>, span: Span },
    Throw { value: ExprId, span: Span },
    While { condition: ExprId, body: Vec<StmtId> },
    DoWhile { body: Vec<StmtId>, condition: ExprId },
    ForEach { cursor: VarId, iterable: ExprId, body: Vec<StmtId> },
    Break { span: Span, scope: ScopeId },
    Continue { span: Span, scope: ScopeId },
}

/// Where an expression is analyzed.
#[derive(Clone, Debug)]
pub(crate) struct ExprContext {
    pub access: AccessSite,
    /// The enclosing function; `None` in global initializers.
    pub function: Option<FnId>,
    /// Declared return type of the enclosing function.
    pub return_type: Option<TypeRef>,
}

impl ExprContext {
    pub fn new(access: AccessSite, function: Option<FnId>, return_type: Option<TypeRef>) -> Self {
        ExprContext {
            access,
            function,
            return_type,
        }
    }
}

const INTEGER_TYPES: [BaseTypeId; 8] = [
    BaseTypeId::S8,
    BaseTypeId::U8,
    BaseTypeId::S16,
    BaseTypeId::U16,
    BaseTypeId::S32,
    BaseTypeId::U32,
    BaseTypeId::S64,
    BaseTypeId::U64,
];

const FLOAT_TYPES: [BaseTypeId; 2] = [BaseTypeId::F32, BaseTypeId::F64];

const SIGNED_TYPES: [BaseTypeId; 4] = [BaseTypeId::S8, BaseTypeId::S16, BaseTypeId::S32, BaseTypeId::S64];

fn is_numeric(base: BaseTypeId) -> bool {
    INTEGER_TYPES.contains(&base) || FLOAT_TYPES.contains(&base)
}

fn integer_fits(base: BaseTypeId, value: i64) -> bool {
    let range = match base {
        BaseTypeId::S8 => i64::from(i8::MIN)..=i64::from(i8::MAX),
        BaseTypeId::U8 => 0..=i64::from(u8::MAX),
        BaseTypeId::S16 => i64::from(i16::MIN)..=i64::from(i16::MAX),
        BaseTypeId::U16 => 0..=i64::from(u16::MAX),
        BaseTypeId::S32 => i64::from(i32::MIN)..=i64::from(i32::MAX),
        BaseTypeId::U32 => 0..=i64::from(u32::MAX),
        BaseTypeId::U64 => 0..=i64::MAX,
        _ => i64::MIN..=i64::MAX,
    };
    range.contains(&value)
}

impl Program {
    /// Infer the type of an expression, recording diagnostics in `out`.
    ///
    /// `expected` is a hint for literals; it never produces diagnostics by
    /// itself. `Ok(None)` means the type is unknown because of an error
    /// reported elsewhere.
    pub(crate) fn analyze_expr(
        &self,
        id: ExprId,
        ctx: &ExprContext,
        expected: Option<&TypeRef>,
        out: &mut Vec<Diagnostic>,
    ) -> Result<Option<TypeRef>, InternalCompilerError> {
        let expr = self.expr(id);
        if let Some(ty) = expr.ty.get() {
            return Ok(ty.clone());
        }
        let ty = emerge_stack::ensure_sufficient_stack(|| self.analyze_expr_kind(id, expr, ctx, expected, out))?;
        Ok(expr.ty.get_or_init(|| ty).clone())
    }

    fn analyze_expr_kind(
        &self,
        id: ExprId,
        expr: &BoundExpr,
        ctx: &ExprContext,
        expected: Option<&TypeRef>,
        out: &mut Vec<Diagnostic>,
    ) -> Result<Option<TypeRef>, InternalCompilerError> {
        let ty = match &expr.kind {
            BoundExprKind::IntLiteral(value) => {
                let hinted = expected
                    .and_then(TypeRef::nominal_base)
                    .filter(|base| INTEGER_TYPES.contains(base) && integer_fits(*base, *value));
                let base = hinted.unwrap_or(if integer_fits(BaseTypeId::S32, *value) {
                    BaseTypeId::S32
                } else {
                    BaseTypeId::S64
                });
                Some(self.reg.nominal(base).at(expr.span))
            }
            BoundExprKind::BoolLiteral => Some(self.reg.nominal(BaseTypeId::BOOL).at(expr.span)),
            BoundExprKind::StringLiteral => Some(
                self.reg
                    .nominal(BaseTypeId::STRING)
                    .with_mutability(Some(Mutability::Immutable))
                    .at(expr.span),
            ),
            BoundExprKind::Null => Some(self.reg.nothing().with_combined_nullability(Nullability::Nullable)),
            BoundExprKind::Identifier(name) => self.analyze_identifier(expr, *name, ctx, out)?,
            BoundExprKind::MemberAccess { receiver, member } => {
                self.analyze_member_access(expr, *receiver, *member, ctx, out)?
            }
            BoundExprKind::Invocation { .. } => self.analyze_invocation(id, ctx, out)?,
            BoundExprKind::NotNull(value) => self
                .analyze_expr(*value, ctx, None, out)?
                .map(|ty| ty.with_combined_nullability(Nullability::NotNullable)),
            BoundExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check_condition(*condition, ctx, out)?;
                let then_ty = self.analyze_block_value(then_branch, ctx, expected, out)?;
                match else_branch {
                    None => Some(self.reg.unit()),
                    Some(else_branch) => {
                        let else_ty = self.analyze_block_value(else_branch, ctx, expected, out)?;
                        then_ty
                            .zip(else_ty)
                            .map(|(a, b)| self.reg.closest_common_supertype(&a, &b).at(expr.span))
                    }
                }
            }
            BoundExprKind::ArrayLiteral(elements) => self.analyze_array_literal(expr, elements, ctx, expected, out)?,
            BoundExprKind::Binary { op, lhs, rhs } => self.analyze_binary(expr, *op, *lhs, *rhs, ctx, out)?,
            BoundExprKind::Unary { op, value } => {
                let hint = expected.filter(|_| *op == UnaryOp::Minus);
                let Some(value_ty) = self.analyze_expr(*value, ctx, hint, out)? else {
                    return Ok(None);
                };
                let intrinsic = match (op, value_ty.nominal_base()) {
                    (UnaryOp::Minus, Some(base)) if SIGNED_TYPES.contains(&base) || FLOAT_TYPES.contains(&base) => {
                        Some(base)
                    }
                    (UnaryOp::Not, Some(BaseTypeId::BOOL)) => Some(BaseTypeId::BOOL),
                    _ => None,
                };
                match intrinsic {
                    Some(base) => Some(self.reg.nominal(base).at(expr.span)),
                    None => {
                        let operand = [(value_ty, self.expr(*value).span)];
                        self.analyze_operator(expr, op.function_name(), op.symbol(), &operand, ctx, out)?
                    }
                }
            }
            BoundExprKind::NullCoalescing { value, alternative } => {
                let value_ty = self.analyze_expr(*value, ctx, expected, out)?;
                let alternative_ty = self.analyze_expr(*alternative, ctx, expected, out)?;
                if let Some(ty) = value_ty.as_ref().filter(|ty| !ty.is_nullable(&self.reg)) {
                    out.push(
                        Diagnostic::warning(ErrorCode::W3010)
                            .with_message(format!(
                                "a value of type `{}` is never null; the alternative is never used",
                                self.reg.render(ty)
                            ))
                            .with_label(self.expr(*value).span, "never null"),
                    );
                }
                value_ty.zip(alternative_ty).map(|(value, alternative)| {
                    self.reg
                        .closest_common_supertype(&value.with_combined_nullability(Nullability::NotNullable), &alternative)
                        .at(expr.span)
                })
            }
            BoundExprKind::Cast { value, to, safe } => {
                let target = self.resolve_type(expr.scope, to);
                // a numeric literal adopts the target type
                let value_ty = self.analyze_expr(*value, ctx, Some(&target), out)?;
                out.extend(self.check_runtime_type(&target, to, "cast", ctx));
                let target = if *safe {
                    target.with_combined_nullability(Nullability::Nullable)
                } else {
                    target
                };
                value_ty.map(|_| target.at(expr.span))
            }
            BoundExprKind::InstanceOf { value, ty } => {
                let checked = self.resolve_type(expr.scope, ty);
                self.analyze_expr(*value, ctx, None, out)?;
                out.extend(self.check_runtime_type(&checked, ty, "type check", ctx));
                Some(self.reg.nominal(BaseTypeId::BOOL).at(expr.span))
            }
            BoundExprKind::TryCatch {
                fallible,
                error,
                handler,
            } => {
                let fallible_ty = self.analyze_block_value(fallible, ctx, expected, out)?;
                // diagnostics are collected by the enclosing function
                self.variable_phase2(*error)?;
                let handler_ty = self.analyze_block_value(handler, ctx, expected, out)?;
                fallible_ty
                    .zip(handler_ty)
                    .map(|(a, b)| self.reg.closest_common_supertype(&a, &b).at(expr.span))
            }
        };
        Ok(ty)
    }

    fn analyze_identifier(
        &self,
        expr: &BoundExpr,
        name: Name,
        ctx: &ExprContext,
        out: &mut Vec<Diagnostic>,
    ) -> Result<Option<TypeRef>, InternalCompilerError> {
        let Some(var) = self.lookup_variable(expr.scope, name) else {
            out.push(unknown_identifier(expr.span, self.text(name)));
            return Ok(None);
        };
        let _ = expr.resolution.set(Resolution::Variable(var));
        let bound = self.variable(var);
        if bound.kind == VariableKind::Global {
            if let Some(denied) =
                bound
                    .visibility
                    .validate_access_from(&ctx.access, expr.span, &self.describe_variable(var))
            {
                out.push(denied);
            }
        }
        Ok(self.type_of_reference(var)?.map(|ty| ty.at(expr.span)))
    }

    /// `E2001` unless `condition` is a `Bool`.
    fn check_condition(
        &self,
        condition: ExprId,
        ctx: &ExprContext,
        out: &mut Vec<Diagnostic>,
    ) -> Result<(), InternalCompilerError> {
        let bool_ty = self.reg.nominal(BaseTypeId::BOOL);
        if let Some(ty) = self.analyze_expr(condition, ctx, Some(&bool_ty), out)? {
            let span = self.expr(condition).span;
            let unification = self.reg.unify(&bool_ty, &ty, span, TypeUnification::empty());
            out.extend(unification.diagnostics().iter().cloned());
        }
        Ok(())
    }

    /// A block used as a value has the type of its trailing expression;
    /// without one it is `Nothing` when it always exits and `Unit`
    /// otherwise.
    fn analyze_block_value(
        &self,
        stmts: &[StmtId],
        ctx: &ExprContext,
        expected: Option<&TypeRef>,
        out: &mut Vec<Diagnostic>,
    ) -> Result<Option<TypeRef>, InternalCompilerError> {
        let Some((last, leading)) = stmts.split_last() else {
            return Ok(Some(self.reg.unit()));
        };
        self.analyze_statements(leading, ctx, out)?;
        if let BoundStmt::Expr(value) = self.stmt(*last) {
            return self.analyze_expr(*value, ctx, expected, out);
        }
        self.analyze_statement(*last, ctx, out)?;
        Ok(Some(if self.exit_behavior(stmts) == SideEffectPrediction::Guaranteed {
            self.reg.nothing()
        } else {
            self.reg.unit()
        }))
    }

    /// Elements unify with the expected element type when there is one;
    /// otherwise the element type is their closest common supertype, `Any`
    /// for an empty literal.
    fn analyze_array_literal(
        &self,
        expr: &BoundExpr,
        elements: &[ExprId],
        ctx: &ExprContext,
        expected: Option<&TypeRef>,
        out: &mut Vec<Diagnostic>,
    ) -> Result<Option<TypeRef>, InternalCompilerError> {
        let expected_element = expected.and_then(|ty| self.element_type(ty));
        let mut common: Option<TypeRef> = None;
        let mut complete = true;
        for element in elements {
            let Some(ty) = self.analyze_expr(*element, ctx, expected_element.as_ref(), out)? else {
                complete = false;
                continue;
            };
            if let Some(target) = &expected_element {
                let span = self.expr(*element).span;
                let unification = self.reg.unify(target, &ty, span, TypeUnification::empty());
                out.extend(unification.diagnostics().iter().cloned());
            }
            common = Some(match common {
                None => ty,
                Some(acc) => self.reg.closest_common_supertype(&acc, &ty),
            });
        }
        if !complete {
            return Ok(None);
        }
        let element = expected_element.or(common).unwrap_or_else(|| self.reg.any());
        Ok(Some(
            self.reg
                .nominal_with_args(BaseTypeId::ARRAY, [TypeArgument::invariant(element)])
                .with_mutability(Some(Mutability::Exclusive))
                .at(expr.span),
        ))
    }

    /// The element type of an iterable value: the argument of an `Array`.
    pub(crate) fn element_type(&self, ty: &TypeRef) -> Option<TypeRef> {
        match ty {
            TypeRef::Nominal(nominal) if nominal.base == BaseTypeId::ARRAY => {
                nominal.args().first().map(|arg| arg.ty.clone())
            }
            _ => None,
        }
    }

    /// Scalars of the core package implement arithmetic, comparison and
    /// logic intrinsically; every other operand type needs an `operator`
    /// function.
    fn analyze_binary(
        &self,
        expr: &BoundExpr,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        ctx: &ExprContext,
        out: &mut Vec<Diagnostic>,
    ) -> Result<Option<TypeRef>, InternalCompilerError> {
        let lhs_ty = self.analyze_expr(lhs, ctx, None, out)?;
        let rhs_ty = self.analyze_expr(rhs, ctx, lhs_ty.as_ref(), out)?;
        let (Some(lhs_ty), Some(rhs_ty)) = (lhs_ty, rhs_ty) else {
            return Ok(None);
        };
        let bool_ty = self.reg.nominal(BaseTypeId::BOOL).at(expr.span);
        let same_base = match (&lhs_ty, &rhs_ty) {
            (TypeRef::Nominal(a), TypeRef::Nominal(b)) if a.base == b.base => Some(a.base),
            _ => None,
        };
        if let Some(base) = same_base {
            let core = self.reg.base(base).flags.contains(BaseTypeFlags::CORE);
            let intrinsic = match op {
                BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Times | BinaryOp::Divide if is_numeric(base) => {
                    Some(self.reg.nominal(base).at(expr.span))
                }
                BinaryOp::Equals | BinaryOp::NotEquals if core => Some(bool_ty.clone()),
                BinaryOp::Less | BinaryOp::LessOrEqual | BinaryOp::Greater | BinaryOp::GreaterOrEqual
                    if is_numeric(base) =>
                {
                    Some(bool_ty.clone())
                }
                _ if op.is_logical() && base == BaseTypeId::BOOL => Some(bool_ty.clone()),
                _ => None,
            };
            if intrinsic.is_some() {
                return Ok(intrinsic);
            }
        }
        let operands = [(lhs_ty, self.expr(lhs).span), (rhs_ty, self.expr(rhs).span)];
        let result = self.analyze_operator(expr, op.function_name(), op.symbol(), &operands, ctx, out)?;
        Ok(if op.is_predicate() { result.map(|_| bool_ty) } else { result })
    }

    /// Validate the type a cast or type check tests against; type
    /// parameters are erased and cannot be checked at runtime.
    fn check_runtime_type(&self, ty: &TypeRef, written: &TypeExpr, what: &str, ctx: &ExprContext) -> Vec<Diagnostic> {
        let mut out = self.validate_type(ty, &TypeUseSite::irrelevant(written.span, ctx.access.clone()));
        if let TypeRef::Generic(generic) = ty.non_null_view() {
            let name = self.text(self.reg.param(generic.param).name);
            out.push(
                Diagnostic::error(ErrorCode::E2016)
                    .with_message(format!("the {what} against type parameter `{name}` cannot be checked at runtime"))
                    .with_label(written.span, "type parameter"),
            );
        }
        out
    }

    /// The member variable `name` of a base type or one of its ancestors.
    pub(crate) fn find_member_variable(&self, base: BaseTypeId, name: Name) -> Option<VarId> {
        self.reg.ancestors(base).into_iter().find_map(|ancestor| {
            let bound = self.base_type(self.base_of(ancestor)?);
            bound
                .member_variables
                .iter()
                .map(|m| m.variable)
                .find(|v| self.variable(*v).name == name)
        })
    }

    fn analyze_member_access(
        &self,
        expr: &BoundExpr,
        receiver: ExprId,
        member: Name,
        ctx: &ExprContext,
        out: &mut Vec<Diagnostic>,
    ) -> Result<Option<TypeRef>, InternalCompilerError> {
        let Some(receiver_ty) = self.analyze_expr(receiver, ctx, None, out)? else {
            return Ok(None);
        };
        let TypeRef::Nominal(nominal) = receiver_ty.non_null_view() else {
            out.push(unknown_member(expr.span, self.text(member), &self.reg.render(&receiver_ty)));
            return Ok(None);
        };
        let Some(var) = self.find_member_variable(nominal.base, member) else {
            if let Some(getter) = self.find_accessor(nominal.base, member, AccessorKind::Read) {
                return self.read_through_getter(expr, getter, nominal, ctx, out);
            }
            out.push(unknown_member(expr.span, self.text(member), &self.reg.render(&receiver_ty)));
            return Ok(None);
        };
        let _ = expr.resolution.set(Resolution::Member(var));

        let bound = self.variable(var);
        if let Some(denied) =
            bound
                .visibility
                .validate_access_from(&ctx.access, expr.span, &self.describe_variable(var))
        {
            out.push(denied);
        }
        let Some(member_ty) = self.type_of_reference(var)? else {
            return Ok(None);
        };
        let bindings = self.reg.inherent_bindings(nominal);
        Ok(Some(
            member_ty
                .instantiate_all_parameters(&self.reg, &bindings)
                .with_combined_mutability(Some(receiver_ty.mutability(&self.reg)))
                .at(expr.span),
        ))
    }

    pub(crate) fn analyze_statements(
        &self,
        stmts: &[StmtId],
        ctx: &ExprContext,
        out: &mut Vec<Diagnostic>,
    ) -> Result<(), InternalCompilerError> {
        for stmt in stmts {
            self.analyze_statement(*stmt, ctx, out)?;
        }
        Ok(())
    }

    fn analyze_statement(
        &self,
        id: StmtId,
        ctx: &ExprContext,
        out: &mut Vec<Diagnostic>,
    ) -> Result<(), InternalCompilerError> {
        match self.stmt(id) {
            BoundStmt::Variable(var) => {
                // diagnostics are collected by the enclosing function
                self.variable_phase2(*var)?;
            }
            BoundStmt::Expr(expr) => {
                self.analyze_expr(*expr, ctx, None, out)?;
            }
            BoundStmt::Assign { target, value, span } => {
                let target_ty = match self.analyze_setter_target(*target, ctx, out)? {
                    Some(ty) => ty,
                    None => self.analyze_expr(*target, ctx, None, out)?,
                };
                let value_ty = self.analyze_expr(*value, ctx, target_ty.as_ref(), out)?;
                if let Some(denied) = self.check_assignable_target(*target, ctx) {
                    out.push(denied);
                } else if let (Some(target_ty), Some(value_ty)) = (target_ty, value_ty) {
                    let unification = self.reg.unify(&target_ty, &value_ty, *span, TypeUnification::empty());
                    out.extend(unification.diagnostics().iter().cloned());
                }
            }
            BoundStmt::While { condition, body } => {
                self.check_condition(*condition, ctx, out)?;
                self.analyze_statements(body, ctx, out)?;
            }
            BoundStmt::DoWhile { body, condition } => {
                self.analyze_statements(body, ctx, out)?;
                self.check_condition(*condition, ctx, out)?;
            }
            BoundStmt::ForEach { cursor, iterable, body } => {
                if let Some(ty) = self.analyze_expr(*iterable, ctx, None, out)? {
                    let span = self.expr(*iterable).span;
                    match self.element_type(&ty) {
                        None => out.push(
                            Diagnostic::error(ErrorCode::E2001)
                                .with_message(format!("a value of type `{}` cannot be iterated", self.reg.render(&ty)))
                                .with_label(span, "not an array"),
                        ),
                        Some(element) => {
                            if let Some(declared) = self.declared_type(*cursor) {
                                let unification = self.reg.unify(&declared, &element, span, TypeUnification::empty());
                                out.extend(unification.diagnostics().iter().cloned());
                            }
                        }
                    }
                }
                // the cursor's type comes from the iterable analyzed above
                self.variable_phase2(*cursor)?;
                self.analyze_statements(body, ctx, out)?;
            }
            BoundStmt::Break { span, scope } | BoundStmt::Continue { span, scope } => {
                if !self.is_in_loop(*scope) {
                    let keyword = if matches!(self.stmt(id), BoundStmt::Break { .. }) {
                        "break"
                    } else {
                        "continue"
                    };
                    out.push(
                        Diagnostic::error(ErrorCode::E1020)
                            .with_message(format!("`{keyword}` outside of a loop"))
                            .with_label(*span, "not in a loop"),
                    );
                }
            }
            BoundStmt::Return { value, span } => {
                let declared = ctx.return_type.clone().unwrap_or_else(|| self.reg.unit());
                let returns_unit = declared.nominal_base() == Some(BaseTypeId::UNIT);
                match value {
                    None if !returns_unit => out.push(
                        Diagnostic::error(ErrorCode::E1017)
                            .with_message(format!(
                                "this function returns `{}`; `return` needs a value",
                                self.reg.render(&declared)
                            ))
                            .with_label(*span, "missing return value"),
                    ),
                    None => {}
                    Some(value) => {
                        if let Some(ty) = self.analyze_expr(*value, ctx, Some(&declared), out)? {
                            let span = self.expr(*value).span;
                            let unification = self.reg.unify(&declared, &ty, span, TypeUnification::empty());
                            out.extend(unification.diagnostics().iter().cloned());
                        }
                    }
                }
            }
            BoundStmt::Throw { value, .. } => {
                self.analyze_expr(*value, ctx, None, out)?;
            }
        }
        Ok(())
    }

    /// `E1016` unless `target` denotes something that can be assigned.
    ///
    /// A `val` declared without initializer may be assigned, and so may the
    /// `val` members of the object under construction; assigning them more
    /// than once is caught by the initialization analysis.
    fn check_assignable_target(&self, target: ExprId, ctx: &ExprContext) -> Option<Diagnostic> {
        let expr = self.expr(target);
        let not_assignable = |reason: String| {
            Some(
                Diagnostic::error(ErrorCode::E1016)
                    .with_message(format!("cannot assign: {reason}"))
                    .with_label(expr.span, "not assignable"),
            )
        };
        match &expr.kind {
            BoundExprKind::Identifier(_) => {
                let var = expr.variable()?;
                if self.variable(var).reassignable || self.is_deferred_local(var) {
                    None
                } else {
                    not_assignable(format!("{} is declared with `val`", self.describe_variable(var)))
                }
            }
            BoundExprKind::MemberAccess { receiver, member } => {
                if let Some(invocation) = expr.invocation() {
                    let accessor = self.function(invocation.function).attributes.accessor;
                    if accessor != Some(AccessorKind::Write) {
                        return not_assignable(format!("`{}` has a getter but no setter", self.text(*member)));
                    }
                    let receiver_ty = self.expr(*receiver).ty.get().cloned().flatten()?;
                    return match receiver_ty.mutability(&self.reg) {
                        Mutability::Mutable | Mutability::Exclusive => None,
                        other => not_assignable(format!("the object is `{other}`")),
                    };
                }
                let var = expr.member()?;
                let initializing = self.is_object_under_construction(*receiver, ctx) && self.variable(var).init.is_none();
                if !self.variable(var).reassignable && !initializing {
                    return not_assignable(format!("{} is declared with `val`", self.describe_variable(var)));
                }
                let receiver_ty = self.expr(*receiver).ty.get().cloned().flatten()?;
                match receiver_ty.mutability(&self.reg) {
                    Mutability::Mutable | Mutability::Exclusive => None,
                    other => not_assignable(format!("the object is `{other}`")),
                }
            }
            _ => not_assignable("only variables and member variables can be assigned".to_owned()),
        }
    }

    /// A local declared without initializer, initialized by assignment.
    pub(crate) fn is_deferred_local(&self, id: VarId) -> bool {
        let var = self.variable(id);
        var.kind == VariableKind::Local
            && var.init.is_none()
            && matches!(var.declared, DeclaredType::None | DeclaredType::Written(_))
    }

    /// Whether `expr` names `self` inside a constructor.
    pub(crate) fn is_object_under_construction(&self, expr: ExprId, ctx: &ExprContext) -> bool {
        let in_constructor = ctx
            .function
            .is_some_and(|f| matches!(self.function(f).kind, FunctionKind::Constructor(_)));
        in_constructor && self.expr(expr).variable().is_some_and(|v| self.is_receiver_local(v))
    }

    pub(crate) fn is_receiver_local(&self, id: VarId) -> bool {
        let var = self.variable(id);
        var.kind == VariableKind::Local && matches!(var.declared, DeclaredType::Receiver(..))
    }
}

fn unknown_member(span: Span, member: &str, receiver: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2003)
        .with_message(format!("`{receiver}` has no member `{member}`"))
        .with_label(span, "unknown member")
}

//! Effect walks over function bodies: boundary crossings, throwing
//! operations and exit behavior.

use emerge_diagnostic::{Diagnostic, ErrorCode};
use emerge_ir::Span;
use emerge_types::{Mutability, Purity};

use crate::effect::{Boundary, DetectingVisitor, Impurity, ImpurityVisitor, SideEffectPrediction};
use crate::InternalCompilerError;

use super::expr::{BoundExprKind, BoundStmt};
use super::{ExprId, FnId, Program, StmtId, VarId, VariableKind};

/// Code to walk: an expression body or initializer, or a block.
#[derive(Copy, Clone, Debug)]
pub(crate) enum EffectRoot<'a> {
    Expr(ExprId),
    Block(&'a [StmtId]),
}

impl Program {
    /// Report every boundary crossing under `root` to `visitor`, all writes
    /// before any read.
    pub(crate) fn visit_effects(
        &self,
        boundary: &Boundary,
        root: EffectRoot<'_>,
        visitor: &mut dyn ImpurityVisitor,
    ) -> Result<(), InternalCompilerError> {
        let mut writes = Vec::new();
        let mut reads = Vec::new();
        self.collect_root(root, &mut writes, &mut reads);
        for write in &writes {
            visitor.visit_write_beyond_boundary(boundary, write)?;
        }
        for read in &reads {
            visitor.visit_read_beyond_boundary(boundary, read)?;
        }
        Ok(())
    }

    /// Whether `expr` reads and whether it writes beyond the boundary of
    /// function `id`.
    pub fn detect_impurity(&self, id: FnId, expr: ExprId) -> Result<(bool, bool), InternalCompilerError> {
        let f = self.function(id);
        let Some(root) = f.body_root() else {
            return Ok((false, false));
        };
        let boundary = Boundary {
            name: self.text(f.name).to_owned(),
            purity: f.attributes.purity,
            span: f.span,
        };
        let mut visitor = DetectingVisitor::new(expr);
        self.visit_effects(&boundary, root, &mut visitor)?;
        Ok((visitor.found_as_reading(), visitor.found_as_writing()))
    }

    fn collect_root(&self, root: EffectRoot<'_>, writes: &mut Vec<Impurity>, reads: &mut Vec<Impurity>) {
        match root {
            EffectRoot::Expr(expr) => self.collect_expr(expr, writes, reads),
            EffectRoot::Block(stmts) => self.collect_stmts(stmts, writes, reads),
        }
    }

    fn collect_stmts(&self, stmts: &[StmtId], writes: &mut Vec<Impurity>, reads: &mut Vec<Impurity>) {
        for stmt in stmts {
            match self.stmt(*stmt) {
                BoundStmt::Variable(var) => {
                    if let Some(init) = self.variable(*var).init {
                        self.collect_expr(init, writes, reads);
                    }
                }
                BoundStmt::Assign { target, value, .. } => {
                    if let Some((site, global)) = self.written_global(*target) {
                        writes.push(Impurity {
                            site,
                            span: self.expr(*target).span,
                            subject: self.describe_variable(global),
                        });
                    }
                    self.collect_expr(*target, writes, reads);
                    self.collect_expr(*value, writes, reads);
                }
                BoundStmt::Expr(expr) | BoundStmt::Throw { value: expr, .. } => {
                    self.collect_expr(*expr, writes, reads);
                }
                BoundStmt::Return { value, .. } => {
                    if let Some(value) = value {
                        self.collect_expr(*value, writes, reads);
                    }
                }
                BoundStmt::While { condition, body } | BoundStmt::DoWhile { body, condition } => {
                    self.collect_expr(*condition, writes, reads);
                    self.collect_stmts(body, writes, reads);
                }
                BoundStmt::ForEach { iterable, body, .. } => {
                    self.collect_expr(*iterable, writes, reads);
                    self.collect_stmts(body, writes, reads);
                }
                BoundStmt::Break { .. } | BoundStmt::Continue { .. } => {}
            }
        }
    }

    /// The global an assignment to `target` modifies, and the identifier
    /// expression naming it.
    fn written_global(&self, target: ExprId) -> Option<(ExprId, VarId)> {
        let mut current = target;
        loop {
            let expr = self.expr(current);
            match &expr.kind {
                BoundExprKind::Identifier(_) => {
                    let var = expr.variable()?;
                    return (self.variable(var).kind == VariableKind::Global).then_some((current, var));
                }
                BoundExprKind::MemberAccess { receiver, .. } => current = *receiver,
                _ => return None,
            }
        }
    }

    fn collect_expr(&self, id: ExprId, writes: &mut Vec<Impurity>, reads: &mut Vec<Impurity>) {
        let expr = self.expr(id);
        match &expr.kind {
            BoundExprKind::IntLiteral(_)
            | BoundExprKind::BoolLiteral
            | BoundExprKind::StringLiteral
            | BoundExprKind::Null => {}
            BoundExprKind::Identifier(_) => {
                if let Some(var) = expr.variable().filter(|v| self.is_mutable_global(*v)) {
                    reads.push(Impurity {
                        site: id,
                        span: expr.span,
                        subject: self.describe_variable(var),
                    });
                }
            }
            BoundExprKind::MemberAccess { receiver, .. } | BoundExprKind::NotNull(receiver) => {
                self.collect_expr(*receiver, writes, reads);
            }
            BoundExprKind::Invocation { .. } | BoundExprKind::Binary { .. } | BoundExprKind::Unary { .. } => {
                for operand in self.operands(id) {
                    self.collect_expr(operand, writes, reads);
                }
                if let Some(invocation) = expr.invocation() {
                    let callee = self.function(invocation.function);
                    let subject = format!("state through `{}`", self.text(callee.name));
                    let impurity = Impurity {
                        site: id,
                        span: expr.span,
                        subject,
                    };
                    match callee.attributes.purity {
                        Purity::Pure => {}
                        Purity::ReadOnly => reads.push(impurity),
                        Purity::Modifying => {
                            writes.push(impurity.clone());
                            reads.push(impurity);
                        }
                    }
                }
            }
            BoundExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.collect_expr(*condition, writes, reads);
                self.collect_stmts(then_branch, writes, reads);
                if let Some(else_branch) = else_branch {
                    self.collect_stmts(else_branch, writes, reads);
                }
            }
            BoundExprKind::ArrayLiteral(elements) => {
                for element in elements {
                    self.collect_expr(*element, writes, reads);
                }
            }
            BoundExprKind::NullCoalescing { value, alternative } => {
                self.collect_expr(*value, writes, reads);
                self.collect_expr(*alternative, writes, reads);
            }
            BoundExprKind::Cast { value, .. } | BoundExprKind::InstanceOf { value, .. } => {
                self.collect_expr(*value, writes, reads);
            }
            BoundExprKind::TryCatch { fallible, handler, .. } => {
                self.collect_stmts(fallible, writes, reads);
                self.collect_stmts(handler, writes, reads);
            }
        }
    }

    /// Operands of a call or operator in evaluation order, receiver first.
    fn operands(&self, id: ExprId) -> Vec<ExprId> {
        match &self.expr(id).kind {
            BoundExprKind::Invocation { receiver, args, .. } => receiver.iter().chain(args).copied().collect(),
            BoundExprKind::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            BoundExprKind::Unary { value, .. } => vec![*value],
            _ => Vec::new(),
        }
    }

    /// Reading a global is only observable when someone can change it.
    fn is_mutable_global(&self, id: VarId) -> bool {
        let var = self.variable(id);
        if var.kind != VariableKind::Global {
            return false;
        }
        var.reassignable
            || self
                .variable_type(id)
                .is_some_and(|ty| ty.mutability(&self.reg) != Mutability::Immutable)
    }

    /// `E4003` for every operation under `root` that may throw.
    pub(crate) fn nothrow_violations(&self, function: &str, root: EffectRoot<'_>) -> Vec<Diagnostic> {
        let mut sites = Vec::new();
        match root {
            EffectRoot::Expr(expr) => self.throwing_sites_expr(expr, &mut sites),
            EffectRoot::Block(stmts) => self.throwing_sites_stmts(stmts, &mut sites),
        }
        sites
            .into_iter()
            .map(|(span, what)| {
                Diagnostic::error(ErrorCode::E4003)
                    .with_message(format!("{function} is declared nothrow but {what}"))
                    .with_label(span, "may throw")
            })
            .collect()
    }

    fn throwing_sites_stmts(&self, stmts: &[StmtId], sites: &mut Vec<(Span, String)>) {
        for stmt in stmts {
            match self.stmt(*stmt) {
                BoundStmt::Variable(var) => {
                    if let Some(init) = self.variable(*var).init {
                        self.throwing_sites_expr(init, sites);
                    }
                }
                BoundStmt::Assign { target, value, .. } => {
                    self.throwing_sites_expr(*target, sites);
                    self.throwing_sites_expr(*value, sites);
                }
                BoundStmt::Expr(expr) => self.throwing_sites_expr(*expr, sites),
                BoundStmt::Return { value, .. } => {
                    if let Some(value) = value {
                        self.throwing_sites_expr(*value, sites);
                    }
                }
                BoundStmt::Throw { value, span } => {
                    self.throwing_sites_expr(*value, sites);
                    sites.push((*span, "throws".to_owned()));
                }
                BoundStmt::While { condition, body } | BoundStmt::DoWhile { body, condition } => {
                    self.throwing_sites_expr(*condition, sites);
                    self.throwing_sites_stmts(body, sites);
                }
                BoundStmt::ForEach { iterable, body, .. } => {
                    self.throwing_sites_expr(*iterable, sites);
                    self.throwing_sites_stmts(body, sites);
                }
                BoundStmt::Break { .. } | BoundStmt::Continue { .. } => {}
            }
        }
    }

    fn throwing_sites_expr(&self, id: ExprId, sites: &mut Vec<(Span, String)>) {
        let expr = self.expr(id);
        match &expr.kind {
            BoundExprKind::IntLiteral(_)
            | BoundExprKind::BoolLiteral
            | BoundExprKind::StringLiteral
            | BoundExprKind::Null
            | BoundExprKind::Identifier(_) => {}
            BoundExprKind::MemberAccess { receiver, .. } => {
                self.throwing_sites_expr(*receiver, sites);
                if let Some(accessor) = expr.invocation() {
                    if self.throw_behavior(accessor.function) != SideEffectPrediction::Never {
                        sites.push((
                            expr.span,
                            format!("calls {}, which may throw", self.describe_function(accessor.function)),
                        ));
                    }
                }
            }
            BoundExprKind::NotNull(value) => {
                self.throwing_sites_expr(*value, sites);
                sites.push((expr.span, "asserts non-null, which throws on null".to_owned()));
            }
            BoundExprKind::Invocation { .. } | BoundExprKind::Binary { .. } | BoundExprKind::Unary { .. } => {
                for operand in self.operands(id) {
                    self.throwing_sites_expr(operand, sites);
                }
                if let Some(invocation) = expr.invocation() {
                    if self.throw_behavior(invocation.function) != SideEffectPrediction::Never {
                        sites.push((
                            expr.span,
                            format!("calls {}, which may throw", self.describe_function(invocation.function)),
                        ));
                    }
                }
            }
            BoundExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.throwing_sites_expr(*condition, sites);
                self.throwing_sites_stmts(then_branch, sites);
                if let Some(else_branch) = else_branch {
                    self.throwing_sites_stmts(else_branch, sites);
                }
            }
            BoundExprKind::ArrayLiteral(elements) => {
                for element in elements {
                    self.throwing_sites_expr(*element, sites);
                }
            }
            BoundExprKind::NullCoalescing { value, alternative } => {
                self.throwing_sites_expr(*value, sites);
                self.throwing_sites_expr(*alternative, sites);
            }
            BoundExprKind::Cast { value, safe, .. } => {
                self.throwing_sites_expr(*value, sites);
                if self.cast_may_throw(*value, *safe) {
                    sites.push((expr.span, "casts, which throws when the value has another type".to_owned()));
                }
            }
            BoundExprKind::InstanceOf { value, .. } => self.throwing_sites_expr(*value, sites),
            // catching does not make the guarded code nothrow
            BoundExprKind::TryCatch { fallible, handler, .. } => {
                self.throwing_sites_stmts(fallible, sites);
                self.throwing_sites_stmts(handler, sites);
            }
        }
    }

    /// Unsafe casts throw on a mismatch; a numeric literal takes the target
    /// type instead.
    fn cast_may_throw(&self, value: ExprId, safe: bool) -> bool {
        !safe && !matches!(self.expr(value).kind, BoundExprKind::IntLiteral(_))
    }

    pub(crate) fn predict_throw(&self, root: EffectRoot<'_>) -> SideEffectPrediction {
        match root {
            EffectRoot::Expr(expr) => self.predict_throw_expr(expr),
            EffectRoot::Block(stmts) => self.predict_throw_stmts(stmts),
        }
    }

    fn predict_throw_stmts(&self, stmts: &[StmtId]) -> SideEffectPrediction {
        SideEffectPrediction::reduce_sequential(stmts.iter().map(|stmt| match self.stmt(*stmt) {
            BoundStmt::Variable(var) => self
                .variable(*var)
                .init
                .map_or(SideEffectPrediction::Never, |init| self.predict_throw_expr(init)),
            BoundStmt::Assign { target, value, .. } => {
                self.predict_throw_expr(*target)
                    .combine_sequential(self.predict_throw_expr(*value))
            }
            BoundStmt::Expr(expr) => self.predict_throw_expr(*expr),
            BoundStmt::Return { value, .. } => value.map_or(SideEffectPrediction::Never, |v| self.predict_throw_expr(v)),
            BoundStmt::Throw { .. } => SideEffectPrediction::Guaranteed,
            // the body may not run at all
            BoundStmt::While { condition, body } => self
                .predict_throw_expr(*condition)
                .combine_sequential(self.predict_throw_stmts(body).combine_branch(SideEffectPrediction::Never)),
            BoundStmt::ForEach { iterable, body, .. } => self
                .predict_throw_expr(*iterable)
                .combine_sequential(self.predict_throw_stmts(body).combine_branch(SideEffectPrediction::Never)),
            BoundStmt::DoWhile { body, condition } => self
                .predict_throw_stmts(body)
                .combine_sequential(self.predict_throw_expr(*condition)),
            BoundStmt::Break { .. } | BoundStmt::Continue { .. } => SideEffectPrediction::Never,
        }))
    }

    fn predict_throw_expr(&self, id: ExprId) -> SideEffectPrediction {
        let expr = self.expr(id);
        match &expr.kind {
            BoundExprKind::IntLiteral(_)
            | BoundExprKind::BoolLiteral
            | BoundExprKind::StringLiteral
            | BoundExprKind::Null
            | BoundExprKind::Identifier(_) => SideEffectPrediction::Never,
            BoundExprKind::MemberAccess { receiver, .. } => {
                let accessor = expr
                    .invocation()
                    .map_or(SideEffectPrediction::Never, |i| self.throw_behavior(i.function));
                self.predict_throw_expr(*receiver).combine_sequential(accessor)
            }
            BoundExprKind::NotNull(value) => self
                .predict_throw_expr(*value)
                .combine_sequential(SideEffectPrediction::Possibly),
            BoundExprKind::Invocation { .. } => {
                let operands =
                    SideEffectPrediction::reduce_sequential(self.operands(id).into_iter().map(|e| self.predict_throw_expr(e)));
                let call = expr
                    .invocation()
                    .map_or(SideEffectPrediction::Possibly, |i| self.throw_behavior(i.function));
                operands.combine_sequential(call)
            }
            // intrinsic operators never throw
            BoundExprKind::Binary { .. } | BoundExprKind::Unary { .. } => {
                let operands =
                    SideEffectPrediction::reduce_sequential(self.operands(id).into_iter().map(|e| self.predict_throw_expr(e)));
                let call = expr
                    .invocation()
                    .map_or(SideEffectPrediction::Never, |i| self.throw_behavior(i.function));
                operands.combine_sequential(call)
            }
            BoundExprKind::ArrayLiteral(elements) => {
                SideEffectPrediction::reduce_sequential(elements.iter().map(|e| self.predict_throw_expr(*e)))
            }
            BoundExprKind::NullCoalescing { value, alternative } => self.predict_throw_expr(*value).combine_sequential(
                self.predict_throw_expr(*alternative)
                    .combine_branch(SideEffectPrediction::Never),
            ),
            BoundExprKind::Cast { value, safe, .. } => {
                let cast = if self.cast_may_throw(*value, *safe) {
                    SideEffectPrediction::Possibly
                } else {
                    SideEffectPrediction::Never
                };
                self.predict_throw_expr(*value).combine_sequential(cast)
            }
            BoundExprKind::InstanceOf { value, .. } => self.predict_throw_expr(*value),
            BoundExprKind::TryCatch { fallible, handler, .. } => self
                .predict_throw_stmts(fallible)
                .combine_branch(self.predict_throw_stmts(handler)),
            BoundExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let otherwise = else_branch
                    .as_deref()
                    .map_or(SideEffectPrediction::Never, |b| self.predict_throw_stmts(b));
                self.predict_throw_expr(*condition)
                    .combine_sequential(self.predict_throw_stmts(then_branch).combine_branch(otherwise))
            }
        }
    }

    /// Whether control leaves the block by `return` or `throw` on every path.
    pub(crate) fn exit_behavior(&self, stmts: &[StmtId]) -> SideEffectPrediction {
        SideEffectPrediction::reduce_sequential(stmts.iter().map(|stmt| match self.stmt(*stmt) {
            BoundStmt::Return { .. } | BoundStmt::Throw { .. } => SideEffectPrediction::Guaranteed,
            BoundStmt::Expr(expr) => self.exit_behavior_expr(*expr),
            // the body of a `do` loop runs at least once
            BoundStmt::DoWhile { body, .. } if !self.breaks_out(body) => self.exit_behavior(body),
            BoundStmt::Variable(_)
            | BoundStmt::Assign { .. }
            | BoundStmt::While { .. }
            | BoundStmt::DoWhile { .. }
            | BoundStmt::ForEach { .. }
            | BoundStmt::Break { .. }
            | BoundStmt::Continue { .. } => SideEffectPrediction::Never,
        }))
    }

    fn exit_behavior_expr(&self, expr: ExprId) -> SideEffectPrediction {
        match &self.expr(expr).kind {
            BoundExprKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                let otherwise = else_branch
                    .as_deref()
                    .map_or(SideEffectPrediction::Never, |b| self.exit_behavior(b));
                self.exit_behavior(then_branch).combine_branch(otherwise)
            }
            BoundExprKind::TryCatch { fallible, handler, .. } => {
                self.exit_behavior(fallible).combine_branch(self.exit_behavior(handler))
            }
            _ => SideEffectPrediction::Never,
        }
    }

    /// Whether `stmts` contain a `break` or `continue` of the enclosing
    /// loop, outside of nested loops.
    fn breaks_out(&self, stmts: &[StmtId]) -> bool {
        stmts.iter().any(|stmt| match self.stmt(*stmt) {
            BoundStmt::Break { .. } | BoundStmt::Continue { .. } => true,
            BoundStmt::Expr(expr) => match &self.expr(*expr).kind {
                BoundExprKind::If {
                    then_branch,
                    else_branch,
                    ..
                } => self.breaks_out(then_branch) || else_branch.as_deref().is_some_and(|b| self.breaks_out(b)),
                BoundExprKind::TryCatch { fallible, handler, .. } => {
                    self.breaks_out(fallible) || self.breaks_out(handler)
                }
                _ => false,
            },
            _ => false,
        })
    }
}

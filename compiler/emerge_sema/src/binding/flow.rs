//! Flow-sensitive checks of function bodies and initializers.
//!
//! Two facts are tracked along control flow: definite initialization of
//! locals and of the object under construction, and whether `exclusive`
//! parameters and locals still hold their value. The walk follows evaluation
//! order; branches join their end states, loop bodies are walked twice so
//! the second pass starts from what an earlier iteration may have left.

use rustc_hash::FxHashMap;

use emerge_diagnostic::{Diagnostic, ErrorCode};
use emerge_ir::Span;
use emerge_types::{Mutability, TypeRef};

use crate::effect::{VariableInitialization, VariableLifetime};

use super::effects::EffectRoot;
use super::expr::{BoundExprKind, BoundStmt};
use super::variable::DeclaredType;
use super::{ExprId, FnId, FunctionKind, Program, StmtId, VarId};

use VariableInitialization::{Initialized, MaybeInitialized, NotInitialized};

/// What is known about every tracked variable at one point of the code.
#[derive(Clone, Debug)]
struct FlowState {
    vars: FxHashMap<VarId, VariableInitialization>,
    lifetimes: FxHashMap<VarId, VariableLifetime>,
    /// Cleared by `return`, `throw`, `break` and `continue`.
    reachable: bool,
}

impl FlowState {
    fn new() -> Self {
        FlowState {
            vars: FxHashMap::default(),
            lifetimes: FxHashMap::default(),
            reachable: true,
        }
    }

    fn get(&self, var: VarId) -> Option<VariableInitialization> {
        self.vars.get(&var).copied()
    }

    fn lifetime(&self, var: VarId) -> Option<VariableLifetime> {
        self.lifetimes.get(&var).copied()
    }

    /// The state after exactly one of `self` and `other` ran. Variables
    /// only one side knows about are out of scope afterwards.
    fn join(self, other: FlowState) -> FlowState {
        match (self.reachable, other.reachable) {
            (false, _) => other,
            (_, false) => self,
            _ => FlowState {
                vars: self
                    .vars
                    .iter()
                    .filter_map(|(var, state)| Some((*var, state.combine_branch(other.get(*var)?))))
                    .collect(),
                lifetimes: self
                    .lifetimes
                    .iter()
                    .filter_map(|(var, state)| {
                        Some((*var, state.combine_branch(other.lifetime(*var)?)))
                    })
                    .collect(),
                reachable: true,
            },
        }
    }

    /// The state after code that ended in `body` may or may not have run.
    fn maybe(self, body: &FlowState) -> FlowState {
        if !body.reachable {
            return self;
        }
        FlowState {
            vars: self
                .vars
                .iter()
                .map(|(var, state)| (*var, state.combine_maybe(body.get(*var).unwrap_or(*state))))
                .collect(),
            lifetimes: self
                .lifetimes
                .iter()
                .map(|(var, state)| {
                    (*var, state.combine_maybe(body.lifetime(*var).unwrap_or(*state)))
                })
                .collect(),
            reachable: self.reachable,
        }
    }
}

struct FlowWalk<'p> {
    program: &'p Program,
    function: Option<FnId>,
    /// `self` of the constructor being checked.
    receiver: Option<VarId>,
    /// States at the `break`s and `continue`s of each enclosing loop.
    loop_exits: Vec<Vec<FlowState>>,
    /// Loop nesting at the declaration of each `exclusive` variable.
    declared_depth: FxHashMap<VarId, usize>,
    /// Off while a loop body is walked for its end state only.
    report: bool,
    object_use_reported: bool,
    out: Vec<Diagnostic>,
}

impl Program {
    /// `E4005` to `E4009` for the code under `root`. `function` is the
    /// enclosing function, `None` for initializers.
    pub(crate) fn flow_violations(
        &self,
        function: Option<FnId>,
        root: EffectRoot<'_>,
    ) -> Vec<Diagnostic> {
        let mut walk = FlowWalk {
            program: self,
            function,
            receiver: None,
            loop_exits: Vec::new(),
            declared_depth: FxHashMap::default(),
            report: true,
            object_use_reported: false,
            out: Vec::new(),
        };
        let mut state = FlowState::new();
        if let Some(id) = function {
            let f = self.function(id);
            for param in &f.params {
                walk.track_lifetime(*param, &mut state);
            }
            if let FunctionKind::Constructor(base) = f.kind {
                walk.receiver = f.locals.iter().copied().find(|v| self.is_receiver_local(*v));
                let members = &self.base_type(base).member_variables;
                for member in members.iter().filter(|m| !m.init_from_constructor) {
                    if self.variable(member.variable).init.is_none() {
                        state.vars.insert(member.variable, NotInitialized);
                    }
                }
            }
        }
        match root {
            EffectRoot::Expr(expr) => walk.expr(expr, &mut state),
            EffectRoot::Block(stmts) => walk.stmts(stmts, &mut state),
        }
        if state.reachable {
            if let Some(id) = function {
                walk.check_object_complete(&state, self.function(id).span);
            }
        }
        walk.out
    }

    /// Whether `var` is declared to hold an `exclusive` value.
    fn holds_exclusive(&self, var: VarId) -> bool {
        matches!(self.variable(var).declared, DeclaredType::Written(_))
            && self
                .declared_type(var)
                .is_some_and(|ty| ty.mutability(&self.reg) == Mutability::Exclusive)
    }

    /// Whether storing a value into a slot of type `ty` takes it over;
    /// `read` slots only borrow.
    fn takes_over(&self, ty: Option<TypeRef>) -> bool {
        ty.map_or(true, |ty| ty.mutability(&self.reg) != Mutability::ReadOnly)
    }
}

impl FlowWalk<'_> {
    fn track_lifetime(&mut self, var: VarId, state: &mut FlowState) {
        if self.program.holds_exclusive(var) {
            state.lifetimes.insert(var, VariableLifetime::Alive);
            self.declared_depth.insert(var, self.loop_exits.len());
        }
    }

    fn stmts(&mut self, stmts: &[StmtId], state: &mut FlowState) {
        for stmt in stmts {
            self.stmt(*stmt, state);
        }
    }

    fn stmt(&mut self, id: StmtId, state: &mut FlowState) {
        let program = self.program;
        match program.stmt(id) {
            BoundStmt::Variable(var) => {
                match program.variable(*var).init {
                    Some(init) => {
                        let takes_over = program.takes_over(program.variable_type(*var));
                        self.value(init, takes_over, state);
                    }
                    None if program.is_deferred_local(*var) => {
                        state.vars.insert(*var, NotInitialized);
                    }
                    None => {}
                }
                self.track_lifetime(*var, state);
            }
            BoundStmt::Assign { target, value, .. } => {
                let takes_over = program.takes_over(program.expression_type(*target));
                self.value(*value, takes_over, state);
                self.assign(*target, state);
            }
            BoundStmt::Expr(expr) => self.expr(*expr, state),
            BoundStmt::Return { value, span } => {
                if let Some(value) = value {
                    let returned = self.function.and_then(|f| program.return_type(f));
                    self.value(*value, program.takes_over(returned), state);
                }
                if state.reachable {
                    self.check_object_complete(state, *span);
                }
                state.reachable = false;
            }
            BoundStmt::Throw { value, .. } => {
                self.expr(*value, state);
                state.reachable = false;
            }
            BoundStmt::While { condition, body } => {
                self.expr(*condition, state);
                self.repeated(body, state, false);
            }
            BoundStmt::ForEach { iterable, body, .. } => {
                self.expr(*iterable, state);
                self.repeated(body, state, false);
            }
            BoundStmt::DoWhile { body, condition } => {
                self.repeated(body, state, true);
                self.expr(*condition, state);
            }
            BoundStmt::Break { .. } | BoundStmt::Continue { .. } => {
                if let Some(exits) = self.loop_exits.last_mut() {
                    exits.push(state.clone());
                }
                state.reachable = false;
            }
        }
    }

    /// A loop body. The first pass finds what one iteration leaves behind;
    /// the reporting pass starts from any iteration's entry state.
    fn repeated(&mut self, body: &[StmtId], state: &mut FlowState, runs_once: bool) {
        let before = state.clone();
        let report = std::mem::replace(&mut self.report, false);
        let first = self.iteration(body, before.clone());
        self.report = report;

        let entry = if runs_once {
            before.join(first)
        } else {
            before.maybe(&first)
        };
        let end = self.iteration(body, entry.clone());
        *state = if runs_once { end } else { entry.maybe(&end) };
    }

    /// One pass over a loop body; the end state includes every `break` and
    /// `continue`.
    fn iteration(&mut self, body: &[StmtId], start: FlowState) -> FlowState {
        let mut state = start;
        self.loop_exits.push(Vec::new());
        self.stmts(body, &mut state);
        let exits = self.loop_exits.pop().unwrap_or_default();
        exits.into_iter().fold(state, FlowState::join)
    }

    fn assign(&mut self, target: ExprId, state: &mut FlowState) {
        let program = self.program;
        let expr = program.expr(target);
        let written = match &expr.kind {
            BoundExprKind::Identifier(_) => expr.variable(),
            BoundExprKind::MemberAccess { receiver, .. } if self.is_receiver(*receiver) => {
                expr.member()
            }
            BoundExprKind::MemberAccess { receiver, .. } => {
                self.expr(*receiver, state);
                None
            }
            _ => {
                self.expr(target, state);
                None
            }
        };
        let Some(var) = written else {
            return;
        };
        if state.lifetimes.contains_key(&var) {
            state.lifetimes.insert(var, VariableLifetime::Alive);
        }
        let Some(current) = state.get(var) else {
            return;
        };
        let reassignable = program.variable(var).reassignable;
        if current != NotInitialized && !reassignable && self.reporting(state) {
            let what = program.describe_variable(var);
            let (message, label) = match current {
                MaybeInitialized => (
                    format!("{what} is a `val` and may already be initialized"),
                    "may be a second assignment",
                ),
                _ => (format!("{what} is a `val` and already initialized"), "second assignment"),
            };
            self.out.push(
                Diagnostic::error(ErrorCode::E4006)
                    .with_message(message)
                    .with_label(expr.span, label)
                    .with_secondary_label(program.variable(var).span, "declared here")
                    .with_suggestion("declare it with `var` to allow reassignment"),
            );
        }
        state.vars.insert(var, Initialized);
    }

    /// An expression whose value is stored somewhere; when the slot takes
    /// the value over, an `exclusive` variable named here gives it up.
    fn value(&mut self, id: ExprId, takes_over: bool, state: &mut FlowState) {
        let expr = self.program.expr(id);
        let captured = match &expr.kind {
            BoundExprKind::Identifier(_) if takes_over => {
                expr.variable().filter(|v| state.lifetimes.contains_key(v))
            }
            _ => None,
        };
        match captured {
            Some(var) => self.capture(var, expr.span, state),
            None => self.expr(id, state),
        }
    }

    fn capture(&mut self, var: VarId, span: Span, state: &mut FlowState) {
        self.check_read(var, state, span);
        let declared_at = self.declared_depth.get(&var).copied().unwrap_or_default();
        if self.loop_exits.len() > declared_at {
            if self.reporting(state) {
                let what = self.program.describe_variable(var);
                self.out.push(
                    Diagnostic::error(ErrorCode::E4009)
                        .with_message(format!("{what} is captured inside a loop"))
                        .with_label(span, "captured in every iteration")
                        .with_secondary_label(
                            self.program.variable(var).span,
                            "declared outside the loop",
                        )
                        .with_suggestion("borrow it through a `read` reference instead"),
                );
            }
        } else {
            self.check_alive(var, state, span);
        }
        state.lifetimes.insert(var, VariableLifetime::Dead { at: span, maybe: false });
    }

    fn expr(&mut self, id: ExprId, state: &mut FlowState) {
        let program = self.program;
        let expr = program.expr(id);
        match &expr.kind {
            BoundExprKind::IntLiteral(_)
            | BoundExprKind::BoolLiteral
            | BoundExprKind::StringLiteral
            | BoundExprKind::Null => {}
            BoundExprKind::Identifier(_) => {
                let Some(var) = expr.variable() else {
                    return;
                };
                if Some(var) == self.receiver {
                    self.check_object_use(state, expr.span);
                } else {
                    self.check_read(var, state, expr.span);
                    self.check_alive(var, state, expr.span);
                }
            }
            BoundExprKind::MemberAccess { receiver, .. } => {
                if self.is_receiver(*receiver) {
                    if let Some(member) = expr.member() {
                        self.check_read(member, state, expr.span);
                    }
                } else {
                    self.expr(*receiver, state);
                }
            }
            BoundExprKind::Invocation { receiver, args, .. } => {
                for operand in receiver.iter().chain(args) {
                    self.expr(*operand, state);
                }
            }
            BoundExprKind::Binary { lhs, rhs, .. } => {
                self.expr(*lhs, state);
                self.expr(*rhs, state);
            }
            BoundExprKind::Unary { value, .. }
            | BoundExprKind::NotNull(value)
            | BoundExprKind::Cast { value, .. }
            | BoundExprKind::InstanceOf { value, .. } => self.expr(*value, state),
            BoundExprKind::ArrayLiteral(elements) => {
                for element in elements {
                    self.value(*element, true, state);
                }
            }
            BoundExprKind::NullCoalescing { value, alternative } => {
                self.expr(*value, state);
                let mut alternative_state = state.clone();
                self.expr(*alternative, &mut alternative_state);
                *state = state.clone().join(alternative_state);
            }
            BoundExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.expr(*condition, state);
                let mut then_state = state.clone();
                self.stmts(then_branch, &mut then_state);
                let mut else_state = state.clone();
                if let Some(else_branch) = else_branch {
                    self.stmts(else_branch, &mut else_state);
                }
                *state = then_state.join(else_state);
            }
            BoundExprKind::TryCatch { fallible, handler, .. } => {
                let before = state.clone();
                let mut fallible_state = before.clone();
                self.stmts(fallible, &mut fallible_state);
                // the handler may run after any prefix of the guarded block
                let mut handler_state = before.maybe(&fallible_state);
                self.stmts(handler, &mut handler_state);
                *state = fallible_state.join(handler_state);
            }
        }
    }

    fn is_receiver(&self, expr: ExprId) -> bool {
        self.receiver.is_some() && self.program.expr(expr).variable() == self.receiver
    }

    fn reporting(&self, state: &FlowState) -> bool {
        self.report && state.reachable
    }

    fn check_read(&mut self, var: VarId, state: &FlowState, span: Span) {
        let Some(current) = state.get(var) else {
            return;
        };
        if current == Initialized || !self.reporting(state) {
            return;
        }
        let program = self.program;
        let what = program.describe_variable(var);
        let message = match current {
            MaybeInitialized => format!("{what} may not be initialized here"),
            _ => format!("{what} is read before it is initialized"),
        };
        self.out.push(
            Diagnostic::error(ErrorCode::E4005)
                .with_message(message)
                .with_label(span, "not initialized")
                .with_secondary_label(program.variable(var).span, "declared here"),
        );
    }

    /// `var` must still hold its `exclusive` value.
    fn check_alive(&mut self, var: VarId, state: &FlowState, span: Span) {
        let Some(VariableLifetime::Dead { at, maybe }) = state.lifetime(var) else {
            return;
        };
        if !self.reporting(state) {
            return;
        }
        let what = self.program.describe_variable(var);
        let message = if maybe {
            format!("{what} may have given up its value")
        } else {
            format!("{what} has given up its value")
        };
        self.out.push(
            Diagnostic::error(ErrorCode::E4008)
                .with_message(message)
                .with_label(span, "used after capture")
                .with_secondary_label(at, "captured here"),
        );
    }

    /// Members of the object under construction not yet initialized.
    fn pending_members(&self, state: &FlowState) -> Vec<VarId> {
        let mut pending: Vec<VarId> = state
            .vars
            .iter()
            .filter(|(var, init)| !init.is_initialized() && !self.program.is_deferred_local(**var))
            .map(|(var, _)| *var)
            .collect();
        pending.sort_unstable();
        pending
    }

    /// `self` escapes while members are still uninitialized.
    fn check_object_use(&mut self, state: &FlowState, span: Span) {
        if self.object_use_reported || !self.reporting(state) {
            return;
        }
        let pending = self.pending_members(state);
        let Some(first) = pending.first() else {
            return;
        };
        self.object_use_reported = true;
        let what = self.program.describe_variable(*first);
        self.out.push(
            Diagnostic::error(ErrorCode::E4007)
                .with_message(format!("the object is used before {what} is initialized"))
                .with_label(span, "object not fully initialized"),
        );
    }

    /// Every member must be initialized where the constructor finishes.
    fn check_object_complete(&mut self, state: &FlowState, span: Span) {
        if self.receiver.is_none() || !self.report {
            return;
        }
        for member in self.pending_members(state) {
            let what = self.program.describe_variable(member);
            let message = match state.get(member) {
                Some(MaybeInitialized) => {
                    format!("{what} may not be initialized when the constructor finishes")
                }
                _ => format!("{what} is not initialized by the constructor"),
            };
            self.out.push(
                Diagnostic::error(ErrorCode::E4007)
                    .with_message(message)
                    .with_label(span, "constructor finishes here")
                    .with_secondary_label(self.program.variable(member).span, "declared here"),
            );
        }
    }
}

//! Expressions and statements of function bodies and initializers.

use emerge_ir::{Name, Span};

use super::{TypeArgExpr, TypeExpr, VariableDecl};

#[derive(Clone, Debug)]
pub struct ExprDecl {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    IntLiteral(i64),
    BoolLiteral(bool),
    StringLiteral(String),
    Null,
    Identifier(Name),
    /// `receiver.member`
    MemberAccess { receiver: Box<ExprDecl>, member: Name },
    /// `name<Args>(args)` or `receiver.name(args)`; the receiver is passed
    /// as the first argument.
    Invocation {
        receiver: Option<Box<ExprDecl>>,
        name: Name,
        type_args: Option<Vec<TypeArgExpr>>,
        args: Vec<ExprDecl>,
    },
    /// `value!!`
    NotNull(Box<ExprDecl>),
    If {
        condition: Box<ExprDecl>,
        then_branch: BlockDecl,
        else_branch: Option<BlockDecl>,
    },
    /// `[a, b, c]`
    ArrayLiteral(Vec<ExprDecl>),
    Binary {
        op: BinaryOp,
        lhs: Box<ExprDecl>,
        rhs: Box<ExprDecl>,
    },
    Unary { op: UnaryOp, value: Box<ExprDecl> },
    /// `value ?: alternative`
    NullCoalescing {
        value: Box<ExprDecl>,
        alternative: Box<ExprDecl>,
    },
    /// `value as T`, or `value as? T` when `safe`.
    Cast {
        value: Box<ExprDecl>,
        to: TypeExpr,
        safe: bool,
    },
    /// `value is T`
    InstanceOf { value: Box<ExprDecl>, ty: TypeExpr },
    /// `try { .. } catch error { .. }`
    TryCatch {
        fallible: BlockDecl,
        error: Name,
        error_span: Span,
        handler: BlockDecl,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Plus,
    Minus,
    Times,
    Divide,
    Equals,
    NotEquals,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    And,
    Or,
    Xor,
}

impl BinaryOp {
    /// The member function the operator is sugar for.
    pub fn function_name(self) -> &'static str {
        match self {
            BinaryOp::Plus => "plus",
            BinaryOp::Minus => "minus",
            BinaryOp::Times => "times",
            BinaryOp::Divide => "divideBy",
            BinaryOp::Equals | BinaryOp::NotEquals => "equals",
            BinaryOp::Less | BinaryOp::LessOrEqual | BinaryOp::Greater | BinaryOp::GreaterOrEqual => "compareTo",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Times => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
        }
    }

    /// Operators whose result is always `Bool`.
    pub fn is_predicate(self) -> bool {
        matches!(
            self,
            BinaryOp::Equals
                | BinaryOp::NotEquals
                | BinaryOp::Less
                | BinaryOp::LessOrEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterOrEqual
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::Xor)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-value`
    Minus,
    /// `not value`
    Not,
}

impl UnaryOp {
    pub fn function_name(self) -> &'static str {
        match self {
            UnaryOp::Minus => "unaryMinus",
            UnaryOp::Not => "negate",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Minus => "-",
            UnaryOp::Not => "not",
        }
    }
}

impl ExprDecl {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        ExprDecl { kind, span }
    }

    pub fn int(value: i64, span: Span) -> Self {
        Self::new(ExprKind::IntLiteral(value), span)
    }

    pub fn bool(value: bool, span: Span) -> Self {
        Self::new(ExprKind::BoolLiteral(value), span)
    }

    pub fn string(value: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::StringLiteral(value.into()), span)
    }

    pub fn null(span: Span) -> Self {
        Self::new(ExprKind::Null, span)
    }

    pub fn ident(name: Name, span: Span) -> Self {
        Self::new(ExprKind::Identifier(name), span)
    }

    pub fn member(receiver: ExprDecl, member: Name, span: Span) -> Self {
        Self::new(
            ExprKind::MemberAccess {
                receiver: Box::new(receiver),
                member,
            },
            span,
        )
    }

    pub fn call(name: Name, args: Vec<ExprDecl>, span: Span) -> Self {
        Self::new(
            ExprKind::Invocation {
                receiver: None,
                name,
                type_args: None,
                args,
            },
            span,
        )
    }

    pub fn method_call(receiver: ExprDecl, name: Name, args: Vec<ExprDecl>, span: Span) -> Self {
        Self::new(
            ExprKind::Invocation {
                receiver: Some(Box::new(receiver)),
                name,
                type_args: None,
                args,
            },
            span,
        )
    }

    /// Attach explicit type arguments to an invocation; other expressions
    /// are returned unchanged.
    #[must_use]
    pub fn with_type_args(mut self, explicit: Vec<TypeArgExpr>) -> Self {
        if let ExprKind::Invocation { type_args, .. } = &mut self.kind {
            *type_args = Some(explicit);
        }
        self
    }

    pub fn not_null(value: ExprDecl, span: Span) -> Self {
        Self::new(ExprKind::NotNull(Box::new(value)), span)
    }

    pub fn if_else(condition: ExprDecl, then_branch: BlockDecl, else_branch: Option<BlockDecl>, span: Span) -> Self {
        Self::new(
            ExprKind::If {
                condition: Box::new(condition),
                then_branch,
                else_branch,
            },
            span,
        )
    }

    pub fn array(elements: Vec<ExprDecl>, span: Span) -> Self {
        Self::new(ExprKind::ArrayLiteral(elements), span)
    }

    pub fn binary(op: BinaryOp, lhs: ExprDecl, rhs: ExprDecl, span: Span) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        )
    }

    pub fn unary(op: UnaryOp, value: ExprDecl, span: Span) -> Self {
        Self::new(ExprKind::Unary { op, value: Box::new(value) }, span)
    }

    pub fn null_coalescing(value: ExprDecl, alternative: ExprDecl, span: Span) -> Self {
        Self::new(
            ExprKind::NullCoalescing {
                value: Box::new(value),
                alternative: Box::new(alternative),
            },
            span,
        )
    }

    pub fn cast(value: ExprDecl, to: TypeExpr, safe: bool, span: Span) -> Self {
        Self::new(
            ExprKind::Cast {
                value: Box::new(value),
                to,
                safe,
            },
            span,
        )
    }

    pub fn instance_of(value: ExprDecl, ty: TypeExpr, span: Span) -> Self {
        Self::new(ExprKind::InstanceOf { value: Box::new(value), ty }, span)
    }

    pub fn try_catch(fallible: BlockDecl, error: Name, error_span: Span, handler: BlockDecl, span: Span) -> Self {
        Self::new(
            ExprKind::TryCatch {
                fallible,
                error,
                error_span,
                handler,
            },
            span,
        )
    }
}

#[derive(Clone, Debug)]
pub struct BlockDecl {
    pub statements: Vec<StmtDecl>,
    pub span: Span,
}

impl BlockDecl {
    pub fn new(statements: Vec<StmtDecl>, span: Span) -> Self {
        BlockDecl { statements, span }
    }
}

#[derive(Clone, Debug)]
pub enum StmtDecl {
    Variable(VariableDecl),
    Assign { target: ExprDecl, value: ExprDecl, span: Span },
    Expr(ExprDecl),
    Return { value: Option<ExprDecl>, span: Span },
    Throw { value: ExprDecl, span: Span },
    While {
        condition: ExprDecl,
        body: BlockDecl,
        span: Span,
    },
    DoWhile {
        body: BlockDecl,
        condition: ExprDecl,
        span: Span,
    },
    /// `for cursor in iterable { .. }`; the cursor takes the element type.
    ForEach {
        cursor: VariableDecl,
        iterable: ExprDecl,
        body: BlockDecl,
        span: Span,
    },
    Break(Span),
    Continue(Span),
}

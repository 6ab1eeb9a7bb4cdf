//! Typing of expressions and statements beyond calls: branches, arrays,
//! operators, casts, loops and `try`/`catch`.

use emerge_diagnostic::ErrorCode;
use emerge_sema::decl::{
    AttributeDecl, AttributeKind, BaseTypeDecl, BinaryOp, BodyDecl, ExprDecl, ParamDecl, StmtDecl, TypeExpr,
    TypeParamDecl, UnaryOp,
};
use emerge_sema::Analysis;
use emerge_types::{BaseTypeId, TypeRef};
use pretty_assertions::assert_eq;

use crate::common::{codes, Source};

fn global_base(analysis: &Analysis, name: &str) -> Option<BaseTypeId> {
    let program = analysis.program();
    let Some(global) = program.global_named(name) else {
        panic!("{name} was not bound");
    };
    program.variable_type(global).and_then(|ty| ty.nominal_base())
}

#[test]
fn test_if_else_value_is_the_closest_common_supertype() {
    let mut src = Source::new();
    let shape = BaseTypeDecl::interface(src.name("Shape"), src.span());
    let circle = BaseTypeDecl::class(src.name("Circle"), src.span()).with_supertype(src.ty("Shape"));
    let square = BaseTypeDecl::class(src.name("Square"), src.span()).with_supertype(src.ty("Shape"));
    let c = src.global("c").with_init(ExprDecl::bool(true, src.span()));
    let then_branch = src.block(vec![StmtDecl::Expr(src.call("Circle", vec![]))]);
    let else_branch = src.block(vec![StmtDecl::Expr(src.call("Square", vec![]))]);
    let pick = src.global("s").with_init(ExprDecl::if_else(
        src.ident("c"),
        then_branch,
        Some(else_branch),
        src.span(),
    ));
    src.item(shape);
    src.item(circle);
    src.item(square);
    src.item(c);
    src.item(pick);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
    let Some(shape) = analysis.program().base_type_named("Shape") else {
        panic!("Shape was not bound");
    };
    assert_eq!(global_base(&analysis, "s"), Some(analysis.program().base_type(shape).id));
}

#[test]
fn test_array_literal_takes_the_element_type() {
    let mut src = Source::new();
    let a = src.global("a").with_init(ExprDecl::array(vec![src.int(1), src.int(2)], src.span()));
    src.item(a);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
    let program = analysis.program();
    let Some(a) = program.global_named("a") else {
        panic!("a was not bound");
    };
    let Some(TypeRef::Nominal(array)) = program.variable_type(a) else {
        panic!("a is not typed as an array");
    };
    assert_eq!(array.base, BaseTypeId::ARRAY);
    let elements: Vec<Option<BaseTypeId>> = array.args().iter().map(|arg| arg.ty.nominal_base()).collect();
    assert_eq!(elements, vec![Some(BaseTypeId::S32)]);
}

#[test]
fn test_scalar_operators_are_intrinsic() {
    let mut src = Source::new();
    let sum = src.global("sum").with_init(ExprDecl::binary(BinaryOp::Plus, src.int(1), src.int(2), src.span()));
    let less = src.global("less").with_init(ExprDecl::binary(BinaryOp::Less, src.int(1), src.int(2), src.span()));
    src.item(sum);
    src.item(less);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
    assert_eq!(global_base(&analysis, "sum"), Some(BaseTypeId::S32));
    assert_eq!(global_base(&analysis, "less"), Some(BaseTypeId::BOOL));
}

/// `fn add(a: Money, b: Money) = a + b` next to a top-level `plus`.
fn money_sum(src: &mut Source, plus_is_operator: bool) {
    src.item(BaseTypeDecl::class(src.name("Money"), src.span()));
    let mut plus = src
        .function("plus")
        .with_param(src.param("left", "Money"))
        .with_param(src.param("right", "Money"))
        .returning(src.ty("Money"))
        .with_body(BodyDecl::Expression(src.ident("left")));
    if plus_is_operator {
        plus = plus.with_attribute(AttributeDecl::new(AttributeKind::Operator, src.span()));
    }
    let sum = ExprDecl::binary(BinaryOp::Plus, src.ident("a"), src.ident("b"), src.span());
    let add = src
        .function("add")
        .with_param(src.param("a", "Money"))
        .with_param(src.param("b", "Money"))
        .with_body(BodyDecl::Expression(sum));
    src.item(plus);
    src.item(add);
}

#[test]
fn test_operator_function_implements_an_operator() {
    let mut src = Source::new();
    money_sum(&mut src, true);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
    let program = analysis.program();
    let [add] = program.functions_named("add")[..] else {
        panic!("expected exactly one `add`");
    };
    let Some(money) = program.base_type_named("Money") else {
        panic!("Money was not bound");
    };
    assert_eq!(
        program.return_type(add).and_then(|ty| ty.nominal_base()),
        Some(program.base_type(money).id)
    );
}

#[test]
fn test_operator_needs_the_operator_attribute() {
    let mut src = Source::new();
    money_sum(&mut src, false);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E1022]);
}

#[test]
fn test_operator_without_a_function() {
    let mut src = Source::new();
    src.item(BaseTypeDecl::class(src.name("Money"), src.span()));
    let negated = ExprDecl::unary(UnaryOp::Minus, src.ident("a"), src.span());
    let negate = src
        .function("negate")
        .with_param(src.param("a", "Money"))
        .with_body(BodyDecl::Expression(negated));
    src.item(negate);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E1021]);
}

#[test]
fn test_null_coalescing() {
    let mut src = Source::new();
    let fallback = src
        .function("fallback")
        .with_param(ParamDecl::new(
            src.name("n"),
            Some(src.ty("S32").nullable()),
            src.span(),
        ))
        .returning(src.ty("S32"))
        .with_body(BodyDecl::Expression(ExprDecl::null_coalescing(
            src.ident("n"),
            src.int(0),
            src.span(),
        )));
    let pointless = src
        .function("pointless")
        .with_param(src.param("n", "S32"))
        .returning(src.ty("S32"))
        .with_body(BodyDecl::Expression(ExprDecl::null_coalescing(
            src.ident("n"),
            src.int(0),
            src.span(),
        )));
    src.item(fallback);
    src.item(pointless);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::W3010]);
}

#[test]
fn test_type_check_against_a_type_parameter() {
    let mut src = Source::new();
    let check = ExprDecl::instance_of(src.ident("x"), src.ty("T"), src.span());
    let is_t = src
        .function("isT")
        .with_type_param(TypeParamDecl::new(src.name("T"), src.span()))
        .with_param(src.param("x", "Any"))
        .returning(src.ty("Bool"))
        .with_body(BodyDecl::Expression(check));
    src.item(is_t);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E2016]);
}

#[test]
fn test_union_parameter_type() {
    let mut src = Source::new();
    let either = TypeExpr::union(vec![src.ty("S32"), src.ty("String")], src.span());
    let show = src
        .function("show")
        .with_param(ParamDecl::new(src.name("x"), Some(either), src.span()))
        .with_body(src.block_body(vec![]));
    src.item(show);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
    let program = analysis.program();
    let [show] = program.functions_named("show")[..] else {
        panic!("expected exactly one `show`");
    };
    let param = program.function(show).params[0];
    assert!(matches!(program.variable_type(param), Some(TypeRef::Union(_))));
}

#[test]
fn test_try_catch_value() {
    let mut src = Source::new();
    let guarded = src.block(vec![StmtDecl::Expr(src.int(1))]);
    let handler = src.block(vec![StmtDecl::Expr(src.int(2))]);
    let attempt = ExprDecl::try_catch(guarded, src.name("e"), src.span(), handler, src.span());
    let v = src.global("v").with_init(attempt);
    src.item(v);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
    assert_eq!(global_base(&analysis, "v"), Some(BaseTypeId::S32));
}

#[test]
fn test_break_outside_of_a_loop() {
    let mut src = Source::new();
    let inside = StmtDecl::While {
        condition: src.ident("c"),
        body: src.block(vec![StmtDecl::Break(src.span())]),
        span: src.span(),
    };
    let outside = StmtDecl::Continue(src.span());
    let f = src
        .function("f")
        .with_param(src.param("c", "Bool"))
        .with_body(src.block_body(vec![inside, outside]));
    src.item(f);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E1020]);
}

#[test]
fn test_for_each_needs_an_array() {
    let mut src = Source::new();
    let looping = StmtDecl::ForEach {
        cursor: src.global("i"),
        iterable: src.ident("n"),
        body: src.block(vec![]),
        span: src.span(),
    };
    let f = src
        .function("f")
        .with_param(src.param("n", "S32"))
        .with_body(src.block_body(vec![looping]));
    src.item(f);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E2001]);
}

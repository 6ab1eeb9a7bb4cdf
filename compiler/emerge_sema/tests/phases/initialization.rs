//! Definite initialization of `val` locals and of constructed objects, and
//! the lifetime of `exclusive` values.

use emerge_diagnostic::ErrorCode;
use emerge_sema::decl::{
    BaseTypeDecl, ConstructorDecl, ExprDecl, MemberDecl, ParamDecl, StmtDecl, VariableDecl,
};
use emerge_types::Mutability;
use pretty_assertions::assert_eq;

use crate::common::{codes, Source};

fn deferred(src: &Source, name: &str) -> StmtDecl {
    StmtDecl::Variable(src.global(name).with_type(src.ty("S32")))
}

#[test]
fn test_val_read_before_assignment() {
    let mut src = Source::new();
    let read = src.ident("x");
    let read_span = read.span;
    let f = src
        .function("f")
        .returning(src.ty("S32"))
        .with_body(src.block_body(vec![deferred(&src, "x"), src.ret(read)]));
    src.item(f);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E4005]);
    assert_eq!(analysis.diagnostics()[0].primary_span(), Some(read_span));
}

#[test]
fn test_val_assigned_on_every_path() {
    let mut src = Source::new();
    let then_branch = src.block(vec![src.assign(src.ident("x"), src.int(1))]);
    let else_branch = src.block(vec![src.assign(src.ident("x"), src.int(2))]);
    let branch = ExprDecl::if_else(src.ident("c"), then_branch, Some(else_branch), src.span());
    let f = src
        .function("f")
        .with_param(src.param("c", "Bool"))
        .returning(src.ty("S32"))
        .with_body(src.block_body(vec![
            deferred(&src, "x"),
            StmtDecl::Expr(branch),
            src.ret(src.ident("x")),
        ]));
    src.item(f);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
}

#[test]
fn test_val_assigned_on_one_path_is_maybe_initialized() {
    let mut src = Source::new();
    let then_branch = src.block(vec![src.assign(src.ident("x"), src.int(1))]);
    let branch = ExprDecl::if_else(src.ident("c"), then_branch, None, src.span());
    let f = src
        .function("f")
        .with_param(src.param("c", "Bool"))
        .returning(src.ty("S32"))
        .with_body(src.block_body(vec![
            deferred(&src, "x"),
            StmtDecl::Expr(branch),
            src.ret(src.ident("x")),
        ]));
    src.item(f);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E4005]);
}

#[test]
fn test_val_assigned_twice() {
    let mut src = Source::new();
    let then_branch = src.block(vec![src.assign(src.ident("x"), src.int(1))]);
    let branch = ExprDecl::if_else(src.ident("c"), then_branch, None, src.span());
    let second = src.assign(src.ident("x"), src.int(2));
    let f = src
        .function("f")
        .with_param(src.param("c", "Bool"))
        .with_body(src.block_body(vec![deferred(&src, "x"), StmtDecl::Expr(branch), second]));
    src.item(f);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E4006]);
}

#[test]
fn test_val_assigned_in_a_loop() {
    let mut src = Source::new();
    let body = src.block(vec![src.assign(src.ident("x"), src.int(1))]);
    let looping = StmtDecl::While {
        condition: src.ident("c"),
        body,
        span: src.span(),
    };
    let f = src
        .function("f")
        .with_param(src.param("c", "Bool"))
        .with_body(src.block_body(vec![deferred(&src, "x"), looping]));
    src.item(f);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E4006]);
}

#[test]
fn test_var_may_be_assigned_in_a_loop() {
    let mut src = Source::new();
    let body = src.block(vec![src.assign(src.ident("x"), src.int(1))]);
    let looping = StmtDecl::While {
        condition: src.ident("c"),
        body,
        span: src.span(),
    };
    let x = src.global("x").with_type(src.ty("S32")).reassignable();
    let f = src
        .function("f")
        .with_param(src.param("c", "Bool"))
        .with_body(src.block_body(vec![StmtDecl::Variable(x), looping]));
    src.item(f);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
}

/// `class Point { x: S32; y: S32; constructor { <body> } }`
fn point(src: &Source, body: Vec<StmtDecl>) -> BaseTypeDecl {
    let member = |name: &str| -> VariableDecl { src.global(name).with_type(src.ty("S32")) };
    BaseTypeDecl::class(src.name("Point"), src.span())
        .with_member_variable(member("x"), false)
        .with_member_variable(member("y"), false)
        .with_member(MemberDecl::Constructor(ConstructorDecl {
            attributes: Vec::new(),
            body: src.block(body),
            span: src.span(),
        }))
}

fn set(src: &Source, member: &str, value: i64) -> StmtDecl {
    src.assign(ExprDecl::member(src.ident("self"), src.name(member), src.span()), src.int(value))
}

#[test]
fn test_constructor_initializing_every_member() {
    let mut src = Source::new();
    let class = point(&src, vec![set(&src, "x", 1), set(&src, "y", 2)]);
    src.item(class);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
}

#[test]
fn test_constructor_missing_a_member() {
    let mut src = Source::new();
    let class = point(&src, vec![set(&src, "x", 1)]);
    src.item(class);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E4007]);
}

#[test]
fn test_constructor_assigning_a_val_member_twice() {
    let mut src = Source::new();
    let class = point(&src, vec![set(&src, "x", 1), set(&src, "y", 2), set(&src, "x", 3)]);
    src.item(class);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E4006]);
}

#[test]
fn test_object_used_before_it_is_complete() {
    let mut src = Source::new();
    let register = src
        .function("register")
        .with_param(src.param("p", "Point"))
        .with_body(src.block_body(vec![]));
    let escape = StmtDecl::Expr(src.call("register", vec![src.ident("self")]));
    let class = point(&src, vec![set(&src, "x", 1), escape, set(&src, "y", 2)]);
    src.item(register);
    src.item(class);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E4007]);
}

/// `fn consume(c: Bool, p: exclusive Box) { <body> }` next to `class Box`.
fn consume(src: &mut Source, body: Vec<StmtDecl>) {
    let class = BaseTypeDecl::class(src.name("Box"), src.span());
    let owned = ParamDecl::new(
        src.name("p"),
        Some(src.ty("Box").with_mutability(Mutability::Exclusive)),
        src.span(),
    );
    let f = src
        .function("consume")
        .with_param(src.param("c", "Bool"))
        .with_param(owned)
        .with_body(src.block_body(body));
    src.item(class);
    src.item(f);
}

fn hold(src: &Source, name: &str, value: ExprDecl) -> StmtDecl {
    StmtDecl::Variable(src.global(name).with_init(value))
}

#[test]
fn test_exclusive_value_used_after_capture() {
    let mut src = Source::new();
    let second = src.ident("p");
    let second_span = second.span;
    let body = vec![hold(&src, "a", src.ident("p")), hold(&src, "b", second)];
    consume(&mut src, body);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E4008]);
    assert_eq!(analysis.diagnostics()[0].primary_span(), Some(second_span));
}

#[test]
fn test_read_reference_only_borrows() {
    let mut src = Source::new();
    let borrowed = src
        .global("r")
        .with_type(src.ty("Box").with_mutability(Mutability::ReadOnly))
        .with_init(src.ident("p"));
    let body = vec![StmtDecl::Variable(borrowed), hold(&src, "a", src.ident("p"))];
    consume(&mut src, body);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
}

#[test]
fn test_capture_on_one_path_is_a_maybe() {
    let mut src = Source::new();
    let then_branch = src.block(vec![hold(&src, "a", src.ident("p"))]);
    let branch = ExprDecl::if_else(src.ident("c"), then_branch, None, src.span());
    let body = vec![StmtDecl::Expr(branch), hold(&src, "b", src.ident("p"))];
    consume(&mut src, body);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E4008]);
    assert!(analysis.diagnostics()[0].message.contains("may"));
}

#[test]
fn test_exclusive_value_captured_in_a_loop() {
    let mut src = Source::new();
    let body = src.block(vec![hold(&src, "a", src.ident("p"))]);
    let looping = StmtDecl::While {
        condition: src.ident("c"),
        body,
        span: src.span(),
    };
    consume(&mut src, vec![looping]);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E4009]);
}

#[test]
fn test_reassignment_gives_the_variable_a_new_value() {
    let mut src = Source::new();
    let owned = src
        .global("q")
        .with_type(src.ty("Box").with_mutability(Mutability::Exclusive))
        .with_init(src.call("Box", vec![]))
        .reassignable();
    let body = vec![
        StmtDecl::Variable(owned),
        hold(&src, "a", src.ident("q")),
        src.assign(src.ident("q"), src.call("Box", vec![])),
        hold(&src, "b", src.ident("q")),
    ];
    consume(&mut src, body);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
}

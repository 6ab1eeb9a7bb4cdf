//! Purity boundaries, `nothrow` and termination of function bodies.

use emerge_diagnostic::ErrorCode;
use emerge_sema::decl::{AttributeDecl, AttributeKind, BaseTypeDecl, BodyDecl, ExprDecl, StmtDecl, VariableDecl};
use emerge_types::{Mutability, Purity};
use pretty_assertions::assert_eq;

use crate::common::{codes, Source};

fn counter(src: &Source) -> VariableDecl {
    src.global("counter")
        .with_type(src.ty("S32"))
        .with_init(src.int(0))
        .reassignable()
}

#[test]
fn test_pure_function_writing_a_global() {
    let mut src = Source::new();
    let global = counter(&src);
    let target = src.ident("counter");
    let target_span = target.span;
    let assign = src.assign(target, src.int(1));
    let bump = src.function("bump").with_body(src.block_body(vec![assign]));
    src.item(global);
    src.item(bump);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E4002]);
    assert_eq!(analysis.diagnostics()[0].primary_span(), Some(target_span));
}

/// `box.value = 1` reads `box` to reach the member it writes; the read at
/// the written location is not reported on its own.
#[test]
fn test_written_location_is_reported_once() {
    let mut src = Source::new();
    let value = src.global("value").with_type(src.ty("S32")).with_init(src.int(0)).reassignable();
    let class = BaseTypeDecl::class(src.name("Box"), src.span()).with_member_variable(value, false);
    let global = src
        .global("box")
        .with_type(src.ty("Box").with_mutability(Mutability::Mutable))
        .with_init(src.call("Box", vec![]))
        .reassignable();
    let target = ExprDecl::member(src.ident("box"), src.name("value"), src.span());
    let target_span = target.span;
    let assign = src.assign(target, src.int(1));
    let fill = src.function("fill").with_body(src.block_body(vec![assign]));
    src.item(class);
    src.item(global);
    src.item(fill);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E4002]);
    assert_eq!(analysis.diagnostics()[0].primary_span(), Some(target_span));
}

#[test]
fn test_modifying_function_may_write_a_global() {
    let mut src = Source::new();
    let global = counter(&src);
    let assign = src.assign(src.ident("counter"), src.int(1));
    let bump = src
        .function("bump")
        .with_attribute(AttributeDecl::new(AttributeKind::Purity(Purity::Modifying), src.span()))
        .with_body(src.block_body(vec![assign]));
    src.item(global);
    src.item(bump);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
}

#[test]
fn test_pure_function_reading_a_mutable_global() {
    let mut src = Source::new();
    let global = counter(&src);
    let peek = src
        .function("peek")
        .returning(src.ty("S32"))
        .with_body(BodyDecl::Expression(src.ident("counter")));
    src.item(global);
    src.item(peek);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E4001]);
}

#[test]
fn test_nothrow_function_calling_a_throwing_one() {
    let mut src = Source::new();
    let throw = StmtDecl::Throw {
        value: ExprDecl::string("boom", src.span()),
        span: src.span(),
    };
    let risky = src.function("risky").with_body(src.block_body(vec![throw]));
    let safe = src
        .function("safe")
        .with_attribute(AttributeDecl::new(AttributeKind::Nothrow, src.span()))
        .with_body(src.block_body(vec![StmtDecl::Expr(src.call("risky", vec![]))]));
    src.item(risky);
    src.item(safe);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E4003]);
}

#[test]
fn test_missing_return_on_one_path() {
    let mut src = Source::new();
    let then_branch = src.block(vec![src.ret(src.int(1))]);
    let branch = ExprDecl::if_else(src.ident("c"), then_branch, None, src.span());
    let pick = src
        .function("pick")
        .with_param(src.param("c", "Bool"))
        .returning(src.ty("S32"))
        .with_body(src.block_body(vec![StmtDecl::Expr(branch)]));
    src.item(pick);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E4004]);
}

#[test]
fn test_returning_on_both_paths() {
    let mut src = Source::new();
    let then_branch = src.block(vec![src.ret(src.int(1))]);
    let else_branch = src.block(vec![src.ret(src.int(2))]);
    let branch = ExprDecl::if_else(src.ident("c"), then_branch, Some(else_branch), src.span());
    let pick = src
        .function("pick")
        .with_param(src.param("c", "Bool"))
        .returning(src.ty("S32"))
        .with_body(src.block_body(vec![StmtDecl::Expr(branch)]));
    src.item(pick);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
}

fn nothrow(src: &Source) -> AttributeDecl {
    AttributeDecl::new(AttributeKind::Nothrow, src.span())
}

#[test]
fn test_nothrow_function_with_an_unchecked_cast() {
    let mut src = Source::new();
    let cast = ExprDecl::cast(src.ident("x"), src.ty("S32"), false, src.span());
    let narrow = src
        .function("narrow")
        .with_attribute(nothrow(&src))
        .with_param(src.param("x", "Any"))
        .returning(src.ty("S32"))
        .with_body(BodyDecl::Expression(cast));
    src.item(narrow);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E4003]);
}

#[test]
fn test_nothrow_function_with_a_safe_cast() {
    let mut src = Source::new();
    let cast = ExprDecl::cast(src.ident("x"), src.ty("S32"), true, src.span());
    let narrow = src
        .function("narrow")
        .with_attribute(nothrow(&src))
        .with_param(src.param("x", "Any"))
        .returning(src.ty("S32").nullable())
        .with_body(BodyDecl::Expression(cast));
    src.item(narrow);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
}

#[test]
fn test_catching_does_not_make_a_call_nothrow() {
    let mut src = Source::new();
    let throw = StmtDecl::Throw {
        value: ExprDecl::string("boom", src.span()),
        span: src.span(),
    };
    let risky = src.function("risky").with_body(src.block_body(vec![throw]));
    let guarded = src.block(vec![StmtDecl::Expr(src.call("risky", vec![]))]);
    let handler = src.block(vec![]);
    let attempt = ExprDecl::try_catch(guarded, src.name("e"), src.span(), handler, src.span());
    let safe = src
        .function("safe")
        .with_attribute(nothrow(&src))
        .with_body(src.block_body(vec![StmtDecl::Expr(attempt)]));
    src.item(risky);
    src.item(safe);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E4003]);
}

/// A `while` body may never run; a `do`/`while` body runs at least once.
#[test]
fn test_return_inside_loops() {
    let mut src = Source::new();
    let body = src.block(vec![src.ret(src.int(1))]);
    let looping = StmtDecl::While {
        condition: src.ident("c"),
        body,
        span: src.span(),
    };
    let maybe = src
        .function("maybe")
        .with_param(src.param("c", "Bool"))
        .returning(src.ty("S32"))
        .with_body(src.block_body(vec![looping]));
    let body = src.block(vec![src.ret(src.int(1))]);
    let looping = StmtDecl::DoWhile {
        body,
        condition: src.ident("c"),
        span: src.span(),
    };
    let surely = src
        .function("surely")
        .with_param(src.param("c", "Bool"))
        .returning(src.ty("S32"))
        .with_body(src.block_body(vec![looping]));
    src.item(maybe);
    src.item(surely);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E4004]);
    let [maybe] = analysis.program().functions_named("maybe")[..] else {
        panic!("expected exactly one `maybe`");
    };
    assert_eq!(
        analysis.diagnostics()[0].primary_span(),
        Some(analysis.program().function(maybe).span)
    );
}

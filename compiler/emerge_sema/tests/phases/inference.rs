//! Type inference across declarations: cycles, generic members and type
//! argument inference at call sites.

use emerge_diagnostic::ErrorCode;
use emerge_sema::decl::{BaseTypeDecl, BodyDecl, ExprDecl, ParamDecl, TypeArgExpr, TypeExpr, TypeParamDecl};
use emerge_types::{BaseTypeId, Variance};
use pretty_assertions::assert_eq;

use crate::common::{codes, Source};

#[test]
fn test_mutually_dependent_globals_report_one_cycle() {
    let mut src = Source::new();
    let x = src.global("x").with_init(src.ident("y"));
    let y = src.global("y").with_init(src.ident("x"));
    src.item(x);
    src.item(y);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E2005]);
    let program = analysis.program();
    let Some(x) = program.global_named("x") else {
        panic!("x was not bound");
    };
    assert!(program.variable_type(x).is_none());
}

#[test]
fn test_mutually_recursive_inferred_returns_report_one_cycle() {
    let mut src = Source::new();
    let a = src.function("a").with_body(BodyDecl::Expression(src.call("b", vec![])));
    let b = src.function("b").with_body(BodyDecl::Expression(src.call("a", vec![])));
    src.item(a);
    src.item(b);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E2005]);
}

#[test]
fn test_generic_member_is_substituted_by_the_type_argument() {
    let mut src = Source::new();
    let member = src.global("p").with_type(src.ty("T"));
    let class = BaseTypeDecl::class(src.name("X"), src.span())
        .with_type_param(TypeParamDecl::new(src.name("T"), src.span()).with_bound(src.ty("Any")))
        .with_member_variable(member, true);
    let receiver = TypeExpr::applied(
        src.name("X"),
        vec![TypeArgExpr::new(Variance::Unspecified, src.ty("S32"))],
        src.span(),
    );
    let access = ExprDecl::member(src.ident("x"), src.name("p"), src.span());
    let read = src
        .function("read")
        .with_param(ParamDecl::new(src.name("x"), Some(receiver), src.span()))
        .with_body(BodyDecl::Expression(access));
    src.item(class);
    src.item(read);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
    let program = analysis.program();
    let [read] = program.functions_named("read")[..] else {
        panic!("expected exactly one `read`");
    };
    let Some(ty) = program.return_type(read) else {
        panic!("the return type of `read` was not inferred");
    };
    assert_eq!(ty.nominal_base(), Some(BaseTypeId::S32));
}

#[test]
fn test_type_argument_is_inferred_from_the_call() {
    let mut src = Source::new();
    let foo = src
        .function("foo")
        .with_type_param(TypeParamDecl::new(src.name("T"), src.span()))
        .with_param(src.param("p", "T"))
        .returning(src.ty("T"))
        .with_body(BodyDecl::Expression(src.ident("p")));
    let call = src.call("foo", vec![ExprDecl::bool(true, src.span())]);
    let b = src.global("b").with_init(call);
    src.item(foo);
    src.item(b);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
    let program = analysis.program();
    let Some(b) = program.global_named("b") else {
        panic!("b was not bound");
    };
    let Some(invocation) = program.initializer(b).and_then(|init| program.invocation(init)) else {
        panic!("the initializer of b is not a resolved invocation");
    };
    let bindings: Vec<(&str, Option<BaseTypeId>)> = invocation
        .bindings
        .iter()
        .map(|(param, ty)| {
            let name = program.names().lookup(program.registry().param(*param).name);
            (name, ty.nominal_base())
        })
        .collect();
    assert_eq!(bindings, vec![("T", Some(BaseTypeId::BOOL))]);
    assert_eq!(
        program.variable_type(b).and_then(|ty| ty.nominal_base()),
        Some(BaseTypeId::BOOL)
    );
}

#[test]
fn test_declared_type_stops_inference() {
    let mut src = Source::new();
    let x = src.global("x").with_type(src.ty("S32")).with_init(src.ident("y"));
    let y = src.global("y").with_init(src.ident("x"));
    src.item(x);
    src.item(y);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
    let program = analysis.program();
    let Some(y) = program.global_named("y") else {
        panic!("y was not bound");
    };
    assert_eq!(
        program.variable_type(y).and_then(|ty| ty.nominal_base()),
        Some(BaseTypeId::S32)
    );
}

#[test]
fn test_unresolvable_calls() {
    let mut src = Source::new();
    let f = src
        .function("f")
        .with_param(src.param("n", "S32"))
        .with_body(src.block_body(vec![]));
    let call = src.call("f", vec![ExprDecl::string("one", src.span())]);
    let g = src.global("g").with_init(call);
    let h = src.global("h").with_init(src.call("missing", vec![src.int(1)]));
    src.item(f);
    src.item(g);
    src.item(h);
    let analysis = src.analyze();

    let codes = codes(&analysis);
    assert!(codes.contains(&ErrorCode::E2001), "{codes:?}");
    assert!(codes.contains(&ErrorCode::E1013), "{codes:?}");
}

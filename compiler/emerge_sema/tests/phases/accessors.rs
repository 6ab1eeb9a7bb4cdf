//! `get` / `set` member functions standing in for member variables.

use emerge_diagnostic::ErrorCode;
use emerge_sema::decl::{
    AccessorKind, AttributeDecl, AttributeKind, BaseTypeDecl, BodyDecl, ExprDecl, FunctionDecl,
    ParamDecl,
};
use emerge_types::{BaseTypeId, Mutability, Purity};
use pretty_assertions::assert_eq;

use crate::common::{codes, Source};

fn accessor(src: &Source, kind: AccessorKind) -> AttributeDecl {
    AttributeDecl::new(AttributeKind::Accessor(kind), src.span())
}

fn receiver(src: &Source, mutability: Mutability) -> ParamDecl {
    ParamDecl::new(
        src.name("self"),
        Some(src.ty("Thermometer").with_mutability(mutability)),
        src.span(),
    )
}

/// `get fn fahrenheit(self: <mutability> Thermometer): S32 = 32`
fn getter_on(src: &Source, mutability: Mutability) -> FunctionDecl {
    src.function("fahrenheit")
        .with_attribute(accessor(src, AccessorKind::Read))
        .with_param(receiver(src, mutability))
        .returning(src.ty("S32"))
        .with_body(BodyDecl::Expression(src.int(32)))
}

fn getter(src: &Source) -> FunctionDecl {
    getter_on(src, Mutability::ReadOnly)
}

/// `set fn fahrenheit(self: mut Thermometer, value: S32) { self.celsius = 0 }`
fn setter(src: &Source) -> FunctionDecl {
    let celsius = ExprDecl::member(src.ident("self"), src.name("celsius"), src.span());
    src.function("fahrenheit")
        .with_attribute(accessor(src, AccessorKind::Write))
        .with_param(receiver(src, Mutability::Mutable))
        .with_param(src.param("value", "S32"))
        .with_body(src.block_body(vec![src.assign(celsius, src.int(0))]))
}

fn thermometer(src: &Source, accessors: Vec<FunctionDecl>) -> BaseTypeDecl {
    let celsius = src.global("celsius").with_type(src.ty("S32")).with_init(src.int(0)).reassignable();
    accessors.into_iter().fold(
        BaseTypeDecl::class(src.name("Thermometer"), src.span()).with_member_variable(celsius, false),
        BaseTypeDecl::with_member_function,
    )
}

#[test]
fn test_member_read_goes_through_the_getter() {
    let mut src = Source::new();
    let class = thermometer(&src, vec![getter(&src)]);
    let read = ExprDecl::member(src.ident("t"), src.name("fahrenheit"), src.span());
    let f = src
        .function("read")
        .with_param(src.param("t", "Thermometer"))
        .with_body(BodyDecl::Expression(read));
    src.item(class);
    src.item(f);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
    let program = analysis.program();
    let [read] = program.functions_named("read")[..] else {
        panic!("expected exactly one `read`");
    };
    assert_eq!(
        program.return_type(read).and_then(|ty| ty.nominal_base()),
        Some(BaseTypeId::S32)
    );
}

#[test]
fn test_member_write_goes_through_the_setter() {
    let mut src = Source::new();
    let class = thermometer(&src, vec![getter(&src), setter(&src)]);
    let target = ExprDecl::member(src.ident("t"), src.name("fahrenheit"), src.span());
    let f = src
        .function("reset")
        .with_param(ParamDecl::new(
            src.name("t"),
            Some(src.ty("Thermometer").with_mutability(Mutability::Mutable)),
            src.span(),
        ))
        .with_body(src.block_body(vec![src.assign(target, src.int(0))]));
    src.item(class);
    src.item(f);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
}

#[test]
fn test_setter_needs_a_mutable_object() {
    let mut src = Source::new();
    let class = thermometer(&src, vec![setter(&src)]);
    let target = ExprDecl::member(src.ident("t"), src.name("fahrenheit"), src.span());
    let f = src
        .function("reset")
        .with_param(src.param("t", "Thermometer"))
        .with_body(src.block_body(vec![src.assign(target, src.int(0))]));
    src.item(class);
    src.item(f);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E1016]);
}

#[test]
fn test_getter_alone_cannot_be_assigned() {
    let mut src = Source::new();
    let class = thermometer(&src, vec![getter(&src)]);
    let target = ExprDecl::member(src.ident("t"), src.name("fahrenheit"), src.span());
    let f = src
        .function("reset")
        .with_param(ParamDecl::new(
            src.name("t"),
            Some(src.ty("Thermometer").with_mutability(Mutability::Mutable)),
            src.span(),
        ))
        .with_body(src.block_body(vec![src.assign(target, src.int(0))]));
    src.item(class);
    src.item(f);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E1016]);
    assert!(analysis.diagnostics()[0].message.contains("no setter"));
}

#[test]
fn test_getter_taking_an_extra_parameter() {
    let mut src = Source::new();
    let broken = getter(&src).with_param(src.param("scale", "S32"));
    src.item(thermometer(&src, vec![broken]));
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E3011]);
}

#[test]
fn test_accessors_must_be_pure() {
    let mut src = Source::new();
    let impure = getter(&src).with_attribute(AttributeDecl::new(
        AttributeKind::Purity(Purity::ReadOnly),
        src.span(),
    ));
    src.item(thermometer(&src, vec![impure]));
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E3011]);
}

#[test]
fn test_getter_must_not_modify_the_object() {
    let mut src = Source::new();
    let modifying = getter_on(&src, Mutability::Mutable);
    src.item(thermometer(&src, vec![modifying]));
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E3011]);
}

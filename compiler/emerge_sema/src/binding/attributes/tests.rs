use emerge_diagnostic::ErrorCode;
use emerge_ir::{SharedInterner, Span};
use emerge_types::Purity;
use pretty_assertions::assert_eq;

use super::*;

fn attr(kind: AttributeKind) -> AttributeDecl {
    AttributeDecl::new(kind, Span::DUMMY)
}

fn codes(list: &AttributeList, name: &str) -> Vec<ErrorCode> {
    list.validate(name, Span::DUMMY).iter().map(|d| d.code).collect()
}

#[test]
fn test_defaults() {
    let list = AttributeList::new(vec![]);
    assert_eq!(list.purity, Purity::Pure);
    assert!(!list.is_nothrow());
    assert!(codes(&list, "f").is_empty());
}

#[test]
fn test_explicit_pure_is_superfluous() {
    let list = AttributeList::new(vec![attr(AttributeKind::Purity(Purity::Pure))]);
    assert_eq!(codes(&list, "f"), vec![ErrorCode::W3002]);
}

#[test]
fn test_repeated_and_conflicting_attributes() {
    let list = AttributeList::new(vec![
        attr(AttributeKind::Purity(Purity::ReadOnly)),
        attr(AttributeKind::Nothrow),
        attr(AttributeKind::Nothrow),
        attr(AttributeKind::Purity(Purity::Modifying)),
    ]);
    assert_eq!(list.purity, Purity::ReadOnly);
    assert_eq!(codes(&list, "f"), vec![ErrorCode::W3002, ErrorCode::E3003]);
}

#[test]
fn test_external_implies_nothrow_but_must_say_so() {
    let names = SharedInterner::new();
    let c = names.intern("C");
    let implicit = AttributeList::new(vec![attr(AttributeKind::External(c))]);
    assert!(implicit.is_nothrow());
    assert_eq!(codes(&implicit, "puts"), vec![ErrorCode::E3004]);

    let explicit = AttributeList::new(vec![attr(AttributeKind::External(c)), attr(AttributeKind::Nothrow)]);
    assert!(codes(&explicit, "puts").is_empty());
}

#[test]
fn test_operator_requires_an_operator_name() {
    let list = AttributeList::new(vec![attr(AttributeKind::Operator)]);
    assert!(codes(&list, "plus").is_empty());
    assert_eq!(codes(&list, "frobnicate"), vec![ErrorCode::E3005]);
}

#[test]
fn test_getter_and_setter_conflict() {
    let getter = AttributeList::new(vec![attr(AttributeKind::Accessor(AccessorKind::Read))]);
    assert_eq!(getter.accessor, Some(AccessorKind::Read));
    assert!(codes(&getter, "celsius").is_empty());

    let both = AttributeList::new(vec![
        attr(AttributeKind::Accessor(AccessorKind::Read)),
        attr(AttributeKind::Accessor(AccessorKind::Write)),
    ]);
    assert_eq!(both.accessor, Some(AccessorKind::Read));
    assert_eq!(codes(&both, "celsius"), vec![ErrorCode::E3003]);
}

use super::*;
use crate::{MutabilityOp, Nullability};
use emerge_ir::FileId;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn span(start: u32) -> Span {
    Span::new(FileId::new(1), start, start + 1)
}

fn nominal(raw: u32) -> TypeRef {
    TypeRef::nominal(BaseTypeId::from_raw(raw), None, false, Span::DUMMY)
}

/// Non-nullable types of bounded depth.
fn non_nullable_type() -> impl Strategy<Value = TypeRef> {
    let leaf = prop_oneof![
        (16u32..24).prop_map(nominal),
        (0u32..4).prop_map(|raw| TypeRef::generic(TypeParamId::from_raw(raw), None, Span::DUMMY)),
        (0u32..4, proptest::sample::select(Mutability::ALL.to_vec())).prop_map(|(raw, m)| {
            TypeRef::generic(TypeParamId::from_raw(raw), Some(m), Span::DUMMY)
        }),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            (16u32..24, proptest::collection::vec(inner.clone(), 1..3)).prop_map(|(raw, args)| {
                TypeRef::nominal(
                    BaseTypeId::from_raw(raw),
                    Some(args.into_iter().map(TypeArgument::invariant).collect()),
                    false,
                    Span::DUMMY,
                )
            }),
            proptest::collection::vec(inner.clone(), 2..4).prop_map(|c| TypeRef::Intersection(c.into())),
            (proptest::collection::vec(inner.clone(), 0..3), inner).prop_map(|(params, ret)| {
                TypeRef::function(params.into(), ret, Purity::Pure, false, Span::DUMMY)
            }),
        ]
    })
}

proptest! {
    #[test]
    fn prop_nullable_then_not_nullable_is_identity(ty in non_nullable_type()) {
        let round_trip = ty
            .with_combined_nullability(Nullability::Nullable)
            .with_combined_nullability(Nullability::NotNullable);
        prop_assert_eq!(round_trip, ty);
    }

    #[test]
    fn prop_nullable_is_idempotent(ty in non_nullable_type()) {
        let once = ty.with_combined_nullability(Nullability::Nullable);
        let twice = once.with_combined_nullability(Nullability::Nullable);
        prop_assert!(!matches!(&twice, TypeRef::Nullable(inner) if matches!(**inner, TypeRef::Nullable(_))));
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn test_equality_ignores_spans() {
    let a = TypeRef::nominal(BaseTypeId::STRING, None, false, span(3));
    let b = TypeRef::nominal(BaseTypeId::STRING, None, false, span(40));
    assert_eq!(a, b);
    assert_eq!(a.at(span(7)), b);
}

#[test]
fn test_default_mutability_is_read_only() {
    let TypeRef::Nominal(n) = nominal(20) else {
        panic!("expected a nominal type");
    };
    assert_eq!(n.mutability(), Mutability::ReadOnly);
    assert_eq!(nominal(20), nominal(20).with_mutability(Some(Mutability::ReadOnly)));
}

#[test]
fn test_scalars_stay_immutable() {
    let s32 = TypeRef::nominal(BaseTypeId::S32, None, true, Span::DUMMY);
    let TypeRef::Nominal(n) = s32.with_mutability(Some(Mutability::Mutable)) else {
        panic!("expected a nominal type");
    };
    assert_eq!(n.mutability(), Mutability::Immutable);
}

#[test]
fn test_default_mutability_keeps_explicit_one() {
    let explicit = nominal(20).with_mutability(Some(Mutability::Mutable));
    assert_eq!(explicit.default_mutability_to(Some(Mutability::Immutable)), explicit);
    assert_eq!(
        nominal(20).default_mutability_to(Some(Mutability::Immutable)),
        nominal(20).with_mutability(Some(Mutability::Immutable))
    );
}

#[test]
fn test_mutability_propagates_into_arguments() {
    let list = TypeRef::nominal(
        BaseTypeId::from_raw(20),
        Some(Rc::from([TypeArgument::invariant(nominal(21))])),
        false,
        Span::DUMMY,
    );
    let TypeRef::Nominal(n) = list.with_mutability(Some(Mutability::Immutable)) else {
        panic!("expected a nominal type");
    };
    assert_eq!(n.args()[0].ty, nominal(21).with_mutability(Some(Mutability::Immutable)));
}

#[test]
fn test_function_mutability_only_weakens_to_read_only() {
    let f = TypeRef::function(Rc::from([]), nominal(20), Purity::Pure, true, Span::DUMMY);
    let TypeRef::Function(mutable) = f.with_mutability(Some(Mutability::Mutable)) else {
        panic!("expected a function type");
    };
    assert_eq!(mutable.mutability, Mutability::Immutable);
    let TypeRef::Function(read) = f.map_mutability(MutabilityOp::Set(Some(Mutability::ReadOnly))) else {
        panic!("expected a function type");
    };
    assert_eq!(read.mutability, Mutability::ReadOnly);
}

#[test]
fn test_not_nullable_on_generic_is_queued() {
    let t = TypeRef::generic(TypeParamId::from_raw(0), None, Span::DUMMY);
    let TypeRef::Generic(g) = t.with_combined_nullability(Nullability::NotNullable) else {
        panic!("expected a generic type");
    };
    assert!(g.is_not_nullable());
}

#[test]
fn test_type_variables_only_for_listed_params() {
    let t = TypeRef::generic(TypeParamId::from_raw(0), None, Span::DUMMY);
    let u = TypeRef::generic(TypeParamId::from_raw(1), None, Span::DUMMY);
    let params: Rc<[TypeParamId]> = Rc::from([TypeParamId::from_raw(0)]);
    assert!(matches!(t.with_type_variables(&params), TypeRef::Variable(_)));
    assert!(matches!(u.with_type_variables(&params), TypeRef::Generic(_)));
}

#[test]
fn test_partially_erroneous() {
    let erroneous = TypeRef::erroneous(emerge_ir::Name::from_raw(0), Rc::from([]), Span::DUMMY);
    let list = TypeRef::nominal(
        BaseTypeId::from_raw(20),
        Some(Rc::from([TypeArgument::invariant(erroneous.clone())])),
        false,
        Span::DUMMY,
    );
    assert!(!list.is_erroneous());
    assert!(list.is_partially_erroneous());
    assert!(erroneous.with_combined_nullability(Nullability::Nullable).is_erroneous());
}

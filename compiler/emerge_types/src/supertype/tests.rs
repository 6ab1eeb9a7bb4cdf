use super::*;
use crate::test_support::Fixture;
use crate::Purity;
use emerge_ir::Span;
use pretty_assertions::assert_eq;

#[test]
fn test_nothing_is_the_identity() {
    let mut fx = Fixture::new();
    let circle = fx.class("Circle");
    assert_eq!(fx.reg.closest_common_supertype(&fx.reg.nothing(), &fx.ty(circle)), fx.ty(circle));
    assert_eq!(fx.reg.closest_common_supertype(&fx.ty(circle), &fx.reg.nothing()), fx.ty(circle));
}

#[test]
fn test_siblings_meet_at_their_interface() {
    let mut fx = Fixture::new();
    let shape = fx.interface("Shape");
    let circle = fx.class("Circle");
    let square = fx.class("Square");
    fx.extends(circle, vec![fx.ty(shape)]);
    fx.extends(square, vec![fx.ty(shape)]);

    let mutable_circle = fx.ty(circle).with_mutability(Some(Mutability::Mutable));
    let immutable_square = fx.ty(square).with_mutability(Some(Mutability::Immutable));
    let joined = fx.reg.closest_common_supertype(&mutable_circle, &immutable_square);
    assert_eq!(joined, fx.ty(shape).with_mutability(Some(Mutability::ReadOnly)));
    assert_eq!(fx.reg.render(&joined), "read Shape");
}

#[test]
fn test_nullability_is_kept() {
    let mut fx = Fixture::new();
    let circle = fx.class("Circle");
    let nullable = fx.ty(circle).with_combined_nullability(Nullability::Nullable);
    let joined = fx.reg.closest_common_supertype(&fx.ty(circle), &nullable);
    assert_eq!(joined, nullable);
}

#[test]
fn test_unrelated_types_meet_at_any() {
    let mut fx = Fixture::new();
    let circle = fx.class("Circle");
    let joined = fx.reg.closest_common_supertype(&fx.ty(circle), &fx.ty(BaseTypeId::S32));
    assert_eq!(joined, fx.reg.any());
}

#[test]
fn test_erroneous_absorbs() {
    let mut fx = Fixture::new();
    let circle = fx.class("Circle");
    let unknown = TypeRef::erroneous(fx.name("Unknown"), Rc::from([]), Span::DUMMY);
    assert!(fx.reg.closest_common_supertype(&fx.ty(circle), &unknown).is_erroneous());
    assert!(fx.reg.closest_common_supertype(&unknown, &fx.ty(circle)).is_erroneous());
}

#[test]
fn test_differing_arguments_become_out_variant() {
    let mut fx = Fixture::new();
    let shape = fx.interface("Shape");
    let circle = fx.class("Circle");
    let square = fx.class("Square");
    fx.extends(circle, vec![fx.ty(shape)]);
    fx.extends(square, vec![fx.ty(shape)]);
    let (list, _) = fx.generic_class("List", &[("E", Variance::Unspecified)]);

    let joined = fx.reg.closest_common_supertype(
        &fx.applied(list, vec![fx.ty(circle)]),
        &fx.applied(list, vec![fx.ty(square)]),
    );
    assert_eq!(
        joined,
        fx.applied_with(list, vec![TypeArgument::new(Variance::Out, fx.ty(shape))])
    );
    let same = fx.reg.closest_common_supertype(
        &fx.applied(list, vec![fx.ty(circle)]),
        &fx.applied(list, vec![fx.ty(circle)]),
    );
    assert_eq!(same, fx.applied(list, vec![fx.ty(circle)]));
}

#[test]
fn test_function_join_keeps_weaker_guarantees() {
    let mut fx = Fixture::new();
    let shape = fx.interface("Shape");
    let circle = fx.class("Circle");
    let square = fx.class("Square");
    fx.extends(circle, vec![fx.ty(shape)]);
    fx.extends(square, vec![fx.ty(shape)]);
    let params: Rc<[TypeRef]> = Rc::from([fx.ty(BaseTypeId::S32)]);

    let f = TypeRef::function(Rc::clone(&params), fx.ty(circle), Purity::Pure, true, Span::DUMMY);
    let g = TypeRef::function(Rc::clone(&params), fx.ty(square), Purity::ReadOnly, false, Span::DUMMY);
    let TypeRef::Function(joined) = fx.reg.closest_common_supertype(&f, &g) else {
        panic!("expected a function type");
    };
    assert_eq!(joined.ret, fx.ty(shape));
    assert_eq!(joined.purity, Purity::ReadOnly);
    assert!(!joined.nothrow);
    assert_eq!(joined.mutability, Mutability::Immutable);

    let other = TypeRef::function(Rc::from([]), fx.ty(circle), Purity::Pure, true, Span::DUMMY);
    assert_eq!(fx.reg.closest_common_supertype(&f, &other).nominal_base(), Some(BaseTypeId::ANY));
}

#[test]
fn test_same_base_type_ignores_mutability_and_nullability() {
    let mut fx = Fixture::new();
    let circle = fx.class("Circle");
    let square = fx.class("Square");
    let nullable_mut = fx
        .ty(circle)
        .with_mutability(Some(Mutability::Mutable))
        .with_combined_nullability(Nullability::Nullable);
    assert!(fx.reg.has_same_base_type(&fx.ty(circle), &nullable_mut));
    assert!(!fx.reg.has_same_base_type(&fx.ty(circle), &fx.ty(square)));
}

#[test]
fn test_supertype_view_translates_arguments() {
    let mut fx = Fixture::new();
    let (a, _) = fx.generic_interface("A", &[("T", Variance::Unspecified)]);
    let (b, b_params) = fx.generic_interface("B", &[("E", Variance::Unspecified)]);
    let (c, c_params) = fx.generic_class("C", &[("K", Variance::Unspecified)]);
    let array_of_e = fx.applied(BaseTypeId::ARRAY, vec![fx.generic(b_params[0])]);
    fx.extends(b, vec![fx.applied(a, vec![array_of_e])]);
    fx.extends(c, vec![fx.applied(b, vec![fx.generic(c_params[0])])]);

    let TypeRef::Nominal(c_of_s32) = fx.applied(c, vec![fx.ty(BaseTypeId::S32)]) else {
        panic!("expected a nominal type");
    };
    let view = fx.reg.supertype_view(&c_of_s32, a).map(|n| TypeRef::Nominal(Rc::new(n)));
    let expected = fx.applied(a, vec![fx.applied(BaseTypeId::ARRAY, vec![fx.ty(BaseTypeId::S32)])]);
    assert_eq!(view, Some(expected));
    assert!(fx.reg.supertype_view(&c_of_s32, BaseTypeId::STRING).is_none());
}

#[test]
fn test_intersect_narrows_bounds() {
    let mut fx = Fixture::new();
    let shape = fx.interface("Shape");
    let circle = fx.class("Circle");
    fx.extends(circle, vec![fx.ty(shape)]);
    assert_eq!(fx.reg.intersect(&fx.ty(shape), &fx.ty(circle)), fx.ty(circle));
    assert_eq!(fx.reg.intersect(&fx.reg.top(), &fx.ty(circle)), fx.ty(circle));
}

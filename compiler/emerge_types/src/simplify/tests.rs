use super::*;
use crate::test_support::Fixture;
use pretty_assertions::assert_eq;

#[test]
fn test_any_is_dropped_from_intersections() {
    let fx = Fixture::new();
    let s32 = fx.ty(BaseTypeId::S32);
    let read_any = fx.reg.any().with_mutability(Some(Mutability::ReadOnly));
    let simplified = fx.reg.intersection_of(vec![s32.clone(), read_any]);
    assert_eq!(simplified, s32);
    assert_eq!(fx.reg.render(&simplified), "const S32");
}

#[test]
fn test_supertype_components_are_dropped() {
    let mut fx = Fixture::new();
    let i = fx.interface("I");
    let s = fx.class("S");
    fx.extends(s, vec![fx.ty(i)]);

    let simplified = fx.reg.intersection_of(vec![fx.ty(i), fx.ty(s)]);
    assert_eq!(simplified, fx.ty(s).with_mutability(Some(Mutability::ReadOnly)));
    assert_eq!(fx.reg.render(&simplified), "read S");
}

#[test]
fn test_narrower_mutability_is_retained() {
    let mut fx = Fixture::new();
    let i = fx.interface("I");
    let s = fx.class("S");
    fx.extends(s, vec![fx.ty(i)]);

    let mutable_i = fx.ty(i).with_mutability(Some(Mutability::Mutable));
    let simplified = fx.reg.intersection_of(vec![mutable_i, fx.ty(s)]);
    assert_eq!(simplified, fx.ty(s).with_mutability(Some(Mutability::Mutable)));
}

#[test]
fn test_any_mutability_is_folded_into_the_rest() {
    let mut fx = Fixture::new();
    let i = fx.interface("I");
    let mut_any = fx.reg.any().with_mutability(Some(Mutability::Mutable));
    let simplified = fx.reg.intersection_of(vec![fx.ty(i), mut_any]);
    assert_eq!(simplified, fx.ty(i).with_mutability(Some(Mutability::Mutable)));
}

#[test]
fn test_unrelated_final_types_have_no_common_value() {
    let mut fx = Fixture::new();
    let a = fx.class("A");
    let b = fx.class("B");
    let simplified = fx.reg.intersection_of(vec![fx.ty(a), fx.ty(b)]);
    assert!(simplified.is_nothing(&fx.reg));

    let scalar_and_string = fx
        .reg
        .intersection_of(vec![fx.ty(BaseTypeId::S32), fx.ty(BaseTypeId::STRING)]);
    assert!(scalar_and_string.is_nothing(&fx.reg));
}

#[test]
fn test_final_type_outside_an_interface_is_bottom() {
    let mut fx = Fixture::new();
    let i = fx.interface("I");
    let s = fx.class("S");
    assert!(fx.reg.intersection_of(vec![fx.ty(i), fx.ty(s)]).is_nothing(&fx.reg));
}

#[test]
fn test_unrelated_interfaces_stay_intersected() {
    let mut fx = Fixture::new();
    let left = fx.interface("Left");
    let right = fx.interface("Right");
    let simplified = fx.reg.intersection_of(vec![fx.ty(left), fx.ty(right)]);
    assert_eq!(simplified, TypeRef::Intersection(vec![fx.ty(left), fx.ty(right)].into()));
    assert_eq!(fx.reg.render(&simplified), "read Left & read Right");
}

#[test]
fn test_intersection_is_nullable_only_if_every_component_is() {
    let mut fx = Fixture::new();
    let left = fx.interface("Left");
    let right = fx.interface("Right");
    let nullable = |id| fx.ty(id).with_combined_nullability(Nullability::Nullable);

    let both = fx.reg.intersection_of(vec![nullable(left), nullable(right)]);
    assert!(both.is_nullable(&fx.reg));
    let one = fx.reg.intersection_of(vec![nullable(left), fx.ty(right)]);
    assert!(!one.is_nullable(&fx.reg));
}

#[test]
fn test_nested_intersections_are_flattened() {
    let mut fx = Fixture::new();
    let a = fx.interface("A");
    let b = fx.interface("B");
    let c = fx.interface("C");
    let nested = TypeRef::Intersection(vec![fx.ty(a), fx.ty(b)].into());
    let simplified = fx.reg.intersection_of(vec![nested, fx.ty(c)]);
    assert_eq!(simplified, TypeRef::Intersection(vec![fx.ty(a), fx.ty(b), fx.ty(c)].into()));
}

#[test]
fn test_union_with_any_is_any() {
    let mut fx = Fixture::new();
    let i = fx.interface("I");
    let simplified = fx.reg.union_of(vec![
        fx.ty(i).with_mutability(Some(Mutability::Mutable)),
        fx.reg.any().with_mutability(Some(Mutability::Mutable)),
    ]);
    assert_eq!(simplified, fx.reg.any().with_mutability(Some(Mutability::Mutable)));
}

#[test]
fn test_union_nullability_is_normalised() {
    let mut fx = Fixture::new();
    let left = fx.interface("Left");
    let right = fx.interface("Right");
    let simplified = fx.reg.union_of(vec![
        fx.ty(left),
        fx.ty(right).with_combined_nullability(Nullability::Nullable),
        fx.ty(left),
    ]);
    let TypeRef::Union(components) = &simplified else {
        panic!("expected a union");
    };
    assert_eq!(components.len(), 2);
    assert!(components.iter().all(|c| c.is_nullable(&fx.reg)));
    assert!(simplified.is_nullable(&fx.reg));
}

#[test]
fn test_simplify_leaves_other_types_alone() {
    let mut fx = Fixture::new();
    let i = fx.interface("I");
    assert_eq!(fx.reg.simplify(&fx.ty(i)), fx.ty(i));
}

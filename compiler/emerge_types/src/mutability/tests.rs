use super::*;
use proptest::prelude::*;
use proptest::sample::select;

use Mutability::{Exclusive, Immutable, Mutable, ReadOnly};

fn any_mutability() -> impl Strategy<Value = Mutability> {
    select(Mutability::ALL.to_vec())
}

#[test]
fn test_assignability_table() {
    assert!(Mutable.is_assignable_to(Mutable));
    assert!(Mutable.is_assignable_to(ReadOnly));
    assert!(!Mutable.is_assignable_to(Immutable));
    assert!(!Mutable.is_assignable_to(Exclusive));

    assert!(ReadOnly.is_assignable_to(ReadOnly));
    assert!(!ReadOnly.is_assignable_to(Mutable));
    assert!(!ReadOnly.is_assignable_to(Immutable));

    assert!(Immutable.is_assignable_to(ReadOnly));
    assert!(!Immutable.is_assignable_to(Mutable));

    for target in Mutability::ALL {
        assert!(Exclusive.is_assignable_to(target));
    }
}

#[test]
fn test_intersect_table() {
    assert_eq!(Mutable.intersect(ReadOnly), Mutable);
    assert_eq!(Mutable.intersect(Immutable), Exclusive);
    assert_eq!(ReadOnly.intersect(Immutable), Immutable);
    assert_eq!(ReadOnly.intersect(Exclusive), Exclusive);
}

#[test]
fn test_union_table() {
    assert_eq!(Mutable.union(Immutable), ReadOnly);
    assert_eq!(Exclusive.union(Immutable), Immutable);
    assert_eq!(Mutable.union(Mutable), Mutable);
    assert_eq!(Exclusive.union(Exclusive), Exclusive);
}

#[test]
fn test_limited_to() {
    assert_eq!(Mutable.limited_to(ReadOnly), ReadOnly);
    assert_eq!(Mutable.limited_to(Immutable), ReadOnly);
    assert_eq!(Mutable.limited_to(Mutable), Mutable);
    assert_eq!(Exclusive.limited_to(Immutable), Immutable);
    assert_eq!(Exclusive.limited_to(Mutable), Mutable);
    assert_eq!(Exclusive.limited_to(Exclusive), Exclusive);
    assert_eq!(Immutable.limited_to(Mutable), Immutable);
}

#[test]
fn test_combined_with() {
    assert_eq!(Mutable.combined_with(None), Mutable);
    assert_eq!(Exclusive.combined_with(Some(Immutable)), Immutable);
    assert_eq!(Mutable.combined_with(Some(Immutable)), ReadOnly);
}

#[test]
fn test_keywords() {
    assert_eq!(Immutable.to_string(), "const");
    assert_eq!(ReadOnly.to_string(), "read");
    assert_eq!(Exclusive.except_exclusive(), Mutable);
}

proptest! {
    #[test]
    fn intersect_and_union_commute(a in any_mutability(), b in any_mutability()) {
        prop_assert_eq!(a.intersect(b), b.intersect(a));
        prop_assert_eq!(a.union(b), b.union(a));
    }

    #[test]
    fn intersect_and_union_associate(
        a in any_mutability(),
        b in any_mutability(),
        c in any_mutability(),
    ) {
        prop_assert_eq!(a.intersect(b).intersect(c), a.intersect(b.intersect(c)));
        prop_assert_eq!(a.union(b).union(c), a.union(b.union(c)));
    }

    #[test]
    fn intersection_is_assignable_to_both(a in any_mutability(), b in any_mutability()) {
        let i = a.intersect(b);
        prop_assert!(i.is_assignable_to(a));
        prop_assert!(i.is_assignable_to(b));
    }

    #[test]
    fn both_are_assignable_to_union(a in any_mutability(), b in any_mutability()) {
        prop_assert!(a.is_assignable_to(a.union(b)));
        prop_assert!(b.is_assignable_to(a.union(b)));
    }

    #[test]
    fn operations_are_idempotent(a in any_mutability()) {
        prop_assert_eq!(a.intersect(a), a);
        prop_assert_eq!(a.union(a), a);
        prop_assert!(a.is_assignable_to(a));
    }
}

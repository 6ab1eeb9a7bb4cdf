use super::*;
use crate::StringInterner;

fn path(interner: &StringInterner, dotted: &str) -> PackagePath {
    PackagePath::new(dotted.split('.').filter(|s| !s.is_empty()).map(|s| interner.intern(s)))
}

#[test]
fn test_contains_self_and_nested() {
    let interner = StringInterner::new();
    let core = path(&interner, "emerge.core");
    let nested = path(&interner, "emerge.core.collections");
    let sibling = path(&interner, "emerge.std");

    assert!(core.contains(&core));
    assert!(core.contains(&nested));
    assert!(!nested.contains(&core));
    assert!(!core.contains(&sibling));
}

#[test]
fn test_root_contains_everything() {
    let interner = StringInterner::new();
    let root = PackagePath::default();
    assert!(root.is_root());
    assert!(root.contains(&path(&interner, "a.b")));
}

#[test]
fn test_parent() {
    let interner = StringInterner::new();
    let nested = path(&interner, "emerge.core.collections");
    assert_eq!(nested.parent(), path(&interner, "emerge.core"));
    assert_eq!(PackagePath::default().parent(), PackagePath::default());
}

#[test]
fn test_display() {
    let interner = StringInterner::new();
    let p = path(&interner, "emerge.core");
    assert_eq!(p.display(&interner), "emerge.core");
}

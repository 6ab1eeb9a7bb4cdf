use super::Purity;

#[test]
fn test_containment_follows_order() {
    assert!(Purity::Modifying.contains(Purity::Pure));
    assert!(Purity::ReadOnly.contains(Purity::ReadOnly));
    assert!(!Purity::Pure.contains(Purity::ReadOnly));
}

#[test]
fn test_weaker_picks_less_restrictive() {
    assert_eq!(Purity::Pure.weaker(Purity::Modifying), Purity::Modifying);
    assert_eq!(Purity::ReadOnly.weaker(Purity::Pure), Purity::ReadOnly);
}

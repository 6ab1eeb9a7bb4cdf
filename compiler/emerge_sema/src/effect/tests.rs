use emerge_diagnostic::ErrorCode;
use emerge_ir::Span;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

fn boundary(purity: Purity) -> Boundary {
    Boundary {
        name: "compute".to_owned(),
        purity,
        span: Span::DUMMY,
    }
}

fn global_access(site: usize) -> Impurity {
    Impurity {
        site: ExprId::from_index(site),
        span: Span::DUMMY,
        subject: "global variable `counter`".to_owned(),
    }
}

fn codes(visitor: PurityViolationVisitor) -> Vec<ErrorCode> {
    visitor.into_diagnostics().iter().map(|d| d.code).collect()
}

#[test]
fn test_pure_boundary_forbids_reads_and_writes() {
    let pure = boundary(Purity::Pure);
    let mut visitor = PurityViolationVisitor::new();
    let Ok(()) = visitor.visit_write_beyond_boundary(&pure, &global_access(0)) else {
        panic!("write rejected");
    };
    let Ok(()) = visitor.visit_read_beyond_boundary(&pure, &global_access(1)) else {
        panic!("read rejected");
    };
    assert_eq!(codes(visitor), vec![ErrorCode::E4002, ErrorCode::E4001]);
}

#[test]
fn test_read_at_a_written_location_is_not_reported_again() {
    let pure = boundary(Purity::Pure);
    let mut visitor = PurityViolationVisitor::new();
    let Ok(()) = visitor.visit_write_beyond_boundary(&pure, &global_access(3)) else {
        panic!("write rejected");
    };
    let Ok(()) = visitor.visit_read_beyond_boundary(&pure, &global_access(3)) else {
        panic!("read rejected");
    };
    assert_eq!(codes(visitor), vec![ErrorCode::E4002]);
}

#[test]
fn test_readonly_boundary_only_forbids_writes() {
    let readonly = boundary(Purity::ReadOnly);
    let mut visitor = PurityViolationVisitor::new();
    let Ok(()) = visitor.visit_write_beyond_boundary(&readonly, &global_access(0)) else {
        panic!("write rejected");
    };
    let Ok(()) = visitor.visit_read_beyond_boundary(&readonly, &global_access(1)) else {
        panic!("read rejected");
    };
    assert_eq!(codes(visitor), vec![ErrorCode::E4002]);
}

#[test]
fn test_modifying_boundary_allows_everything() {
    let modifying = boundary(Purity::Modifying);
    let mut visitor = PurityViolationVisitor::new();
    let Ok(()) = visitor.visit_write_beyond_boundary(&modifying, &global_access(0)) else {
        panic!("write rejected");
    };
    let Ok(()) = visitor.visit_read_beyond_boundary(&modifying, &global_access(0)) else {
        panic!("read rejected");
    };
    assert!(visitor.into_diagnostics().is_empty());
}

#[test]
fn test_write_after_read_is_a_contract_violation() {
    let pure = boundary(Purity::Pure);
    let mut visitor = PurityViolationVisitor::new();
    let Ok(()) = visitor.visit_read_beyond_boundary(&pure, &global_access(0)) else {
        panic!("read rejected");
    };
    assert_eq!(
        visitor.visit_write_beyond_boundary(&pure, &global_access(1)),
        Err(InternalCompilerError::WriteAfterRead {
            function: "compute".to_owned()
        })
    );
}

#[test]
fn test_detecting_visitor_only_sees_its_site() {
    let pure = boundary(Purity::Pure);
    let mut visitor = DetectingVisitor::new(ExprId::from_index(2));
    let Ok(()) = visitor.visit_write_beyond_boundary(&pure, &global_access(1)) else {
        panic!("write rejected");
    };
    let Ok(()) = visitor.visit_read_beyond_boundary(&pure, &global_access(2)) else {
        panic!("read rejected");
    };
    assert!(visitor.found_as_reading());
    assert!(!visitor.found_as_writing());
}

#[test]
fn test_prediction_tables() {
    use SideEffectPrediction::{Guaranteed, Never, Possibly};

    assert_eq!(Never.combine_sequential(Never), Never);
    assert_eq!(Never.combine_sequential(Possibly), Possibly);
    assert_eq!(Possibly.combine_sequential(Guaranteed), Guaranteed);
    assert_eq!(Guaranteed.combine_sequential(Never), Guaranteed);

    assert_eq!(Never.combine_branch(Guaranteed), Possibly);
    assert_eq!(Guaranteed.combine_branch(Guaranteed), Guaranteed);
    assert_eq!(Possibly.combine_branch(Never), Possibly);

    assert_eq!(SideEffectPrediction::reduce_sequential(Vec::new()), Never);
    assert_eq!(SideEffectPrediction::reduce_sequential([Never, Possibly, Never]), Possibly);
}

#[test]
fn test_initialization_tables() {
    use VariableInitialization::{Initialized, MaybeInitialized, NotInitialized};

    assert_eq!(Initialized.combine_branch(Initialized), Initialized);
    assert_eq!(NotInitialized.combine_branch(Initialized), MaybeInitialized);
    assert_eq!(NotInitialized.combine_branch(NotInitialized), NotInitialized);

    assert_eq!(NotInitialized.combine_maybe(Initialized), MaybeInitialized);
    assert_eq!(Initialized.combine_maybe(NotInitialized), Initialized);
    assert_eq!(NotInitialized.combine_maybe(NotInitialized), NotInitialized);
    assert!(!MaybeInitialized.is_initialized());
}

#[test]
fn test_lifetime_tables() {
    use VariableLifetime::{Alive, Dead};

    let captured = Span::new(emerge_ir::FileId::new(1), 4, 9);
    assert_eq!(Alive.combine_branch(Alive), Alive);
    assert_eq!(
        Alive.combine_branch(Dead { at: captured, maybe: false }),
        Dead { at: captured, maybe: true }
    );
    assert_eq!(
        Dead { at: captured, maybe: false }.combine_branch(Dead { at: Span::DUMMY, maybe: false }),
        Dead { at: captured, maybe: false }
    );

    assert_eq!(
        Alive.combine_maybe(Dead { at: captured, maybe: false }),
        Dead { at: captured, maybe: true }
    );
    assert_eq!(
        Dead { at: captured, maybe: false }.combine_maybe(Alive),
        Dead { at: captured, maybe: false }
    );
    assert!(!Dead { at: captured, maybe: true }.is_alive());
}

fn lifetime() -> impl Strategy<Value = VariableLifetime> {
    prop_oneof![
        Just(VariableLifetime::Alive),
        any::<bool>().prop_map(|maybe| VariableLifetime::Dead { at: Span::DUMMY, maybe }),
    ]
}

fn initialization() -> impl Strategy<Value = VariableInitialization> {
    prop_oneof![
        Just(VariableInitialization::NotInitialized),
        Just(VariableInitialization::MaybeInitialized),
        Just(VariableInitialization::Initialized),
    ]
}

fn prediction() -> impl Strategy<Value = SideEffectPrediction> {
    prop_oneof![
        Just(SideEffectPrediction::Never),
        Just(SideEffectPrediction::Possibly),
        Just(SideEffectPrediction::Guaranteed),
    ]
}

proptest! {
    #[test]
    fn prop_sequential_is_associative(a in prediction(), b in prediction(), c in prediction()) {
        prop_assert_eq!(
            a.combine_sequential(b).combine_sequential(c),
            a.combine_sequential(b.combine_sequential(c))
        );
    }

    #[test]
    fn prop_never_is_the_sequential_identity(a in prediction()) {
        prop_assert_eq!(SideEffectPrediction::Never.combine_sequential(a), a);
        prop_assert_eq!(a.combine_sequential(SideEffectPrediction::Never), a);
    }

    #[test]
    fn prop_branch_is_commutative_and_idempotent(a in prediction(), b in prediction()) {
        prop_assert_eq!(a.combine_branch(b), b.combine_branch(a));
        prop_assert_eq!(a.combine_branch(a), a);
    }

    #[test]
    fn prop_reduce_matches_a_left_fold(list in proptest::collection::vec(prediction(), 0..8)) {
        let folded = list
            .iter()
            .fold(SideEffectPrediction::Never, |acc, p| acc.combine_sequential(*p));
        prop_assert_eq!(SideEffectPrediction::reduce_sequential(list), folded);
    }

    #[test]
    fn prop_initialization_branch_is_commutative(a in initialization(), b in initialization()) {
        prop_assert_eq!(a.combine_branch(b), b.combine_branch(a));
        prop_assert_eq!(a.combine_branch(a), a);
    }

    #[test]
    fn prop_maybe_never_loses_definite_initialization(a in initialization(), b in initialization()) {
        prop_assert_eq!(a.combine_maybe(b).is_initialized(), a.is_initialized());
    }

    #[test]
    fn prop_lifetime_branch_is_commutative(a in lifetime(), b in lifetime()) {
        prop_assert_eq!(a.combine_branch(b), b.combine_branch(a));
        prop_assert_eq!(a.combine_branch(a), a);
    }

    #[test]
    fn prop_a_capture_is_never_forgotten(a in lifetime(), b in lifetime()) {
        prop_assert_eq!(a.combine_maybe(b).is_alive(), a.is_alive() && b.is_alive());
    }
}

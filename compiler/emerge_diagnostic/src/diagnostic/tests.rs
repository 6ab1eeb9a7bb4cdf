use super::*;
use emerge_ir::FileId;
use pretty_assertions::assert_eq;

fn span(start: u32, end: u32) -> Span {
    Span::new(FileId::new(0), start, end)
}

#[test]
fn test_diagnostic_builder() {
    let diag = Diagnostic::error(ErrorCode::E2001)
        .with_message("not assignable")
        .with_label(span(0, 5), "here")
        .with_secondary_label(span(10, 12), "declared here")
        .with_note("a note")
        .with_suggestion("try this");

    assert_eq!(diag.code, ErrorCode::E2001);
    assert_eq!(diag.severity, Severity::Error);
    assert_eq!(diag.labels.len(), 2);
    assert_eq!(diag.primary_span(), Some(span(0, 5)));
    assert!(diag.is_error());
}

#[test]
fn test_severity_order() {
    assert!(Severity::Consecutive < Severity::Info);
    assert!(Severity::Info < Severity::Warning);
    assert!(Severity::Warning < Severity::Error);
}

#[test]
fn test_of_kind_picks_severity_from_code() {
    assert_eq!(Diagnostic::of_kind(ErrorCode::W3001).severity, Severity::Warning);
    assert_eq!(Diagnostic::of_kind(ErrorCode::E4001).severity, Severity::Error);
}

#[test]
fn test_consecutive_is_not_an_error() {
    let diag = Diagnostic::error(ErrorCode::E2001).as_consecutive();
    assert!(!diag.is_error());
}

#[test]
fn test_display() {
    let diag = unknown_type(span(3, 6), "Foo");
    let text = diag.to_string();
    assert!(text.starts_with("error [E2002]: unknown type `Foo`"));
    assert!(text.contains("--> 0:3..6: not found in this scope"));
}

#[test]
fn test_value_not_assignable_carries_reason() {
    let diag = value_not_assignable(span(0, 1), "mut S32", "read S32", "mutability");
    assert_eq!(diag.code, ErrorCode::E2001);
    assert!(diag.message.contains("`read S32`"));
    assert!(diag.message.contains("`mut S32`"));
    assert_eq!(diag.labels[0].message, "mutability");
}

#[test]
fn test_equal_diagnostics_compare_equal() {
    let a = cyclic_type_deduction(span(1, 2), "variable `x`");
    let b = cyclic_type_deduction(span(1, 2), "variable `x`");
    assert_eq!(a, b);
}

#[test]
fn test_duplicate_declaration_labels() {
    let diag = duplicate_declaration(span(20, 21), span(0, 1), "variable", "x");
    assert_eq!(diag.labels.len(), 2);
    assert!(!diag.labels[1].is_primary);
}

#[test]
fn test_ambiguous_type_lists_candidates() {
    let diag = ambiguous_type(span(0, 1), "T", &["a.T".to_owned(), "b.T".to_owned()]);
    assert_eq!(diag.notes, vec!["candidates are: a.T, b.T".to_owned()]);
}

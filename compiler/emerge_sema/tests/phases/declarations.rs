//! Declaration-level checks: overload disjointness, assignability and the
//! knobs of `AnalysisConfig`.

use emerge_diagnostic::ErrorCode;
use emerge_sema::decl::{BaseTypeDecl, BodyDecl, ImportDecl, Item, StmtDecl, VisibilityDecl, VisibilityKind};
use emerge_sema::AnalysisConfig;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::{codes, Source};

#[test]
fn test_overloads_on_distinct_types_are_disjoint() {
    let mut src = Source::new();
    let by_number = src
        .function("f")
        .with_param(src.param("n", "S32"))
        .with_body(src.block_body(vec![]));
    let by_text = src
        .function("f")
        .with_param(src.param("s", "String"))
        .with_body(src.block_body(vec![]));
    src.item(by_number);
    src.item(by_text);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
    assert_eq!(analysis.program().top_level_overload_sets().len(), 1);
}

#[test]
fn test_identical_overloads_are_reported_once() {
    let mut src = Source::new();
    let first = src
        .function("g")
        .with_param(src.param("a", "S32"))
        .with_body(src.block_body(vec![]));
    let second = src
        .function("g")
        .with_param(src.param("b", "S32"))
        .with_body(src.block_body(vec![]));
    src.item(first);
    src.item(second);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E3007]);
}

#[test]
fn test_assignment_to_val() {
    let mut src = Source::new();
    let local = src.global("limit").with_type(src.ty("S32")).with_init(src.int(1));
    let assign = src.assign(src.ident("limit"), src.int(2));
    let f = src
        .function("f")
        .with_body(src.block_body(vec![StmtDecl::Variable(local), assign]));
    src.item(f);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E1016]);
}

#[test]
fn test_naming_lint_can_be_disabled() {
    let mut src = Source::new();
    src.item(BaseTypeDecl::interface(src.name("shape"), src.span()));
    let analysis = src.analyze_with(AnalysisConfig::default().with_lint_naming(false));

    assert_eq!(codes(&analysis), vec![]);
}

fn write_with_unknown_value(src: &mut Source) {
    let global = src
        .global("counter")
        .with_type(src.ty("S32"))
        .with_init(src.int(0))
        .reassignable();
    let assign = src.assign(src.ident("counter"), src.ident("missing"));
    let bump = src.function("bump").with_body(src.block_body(vec![assign]));
    src.item(global);
    src.item(bump);
}

#[test]
fn test_phase3_runs_after_errors_by_default() {
    let mut src = Source::new();
    write_with_unknown_value(&mut src);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E2003, ErrorCode::E4002]);
}

#[test]
fn test_phase3_can_be_skipped_after_errors() {
    let mut src = Source::new();
    write_with_unknown_value(&mut src);
    let analysis = src.analyze_with(AnalysisConfig::default().with_run_phase3_after_errors(false));

    assert_eq!(codes(&analysis), vec![ErrorCode::E2003]);
    assert!(analysis.has_errors().is_some());
}

/// `lib.helper`, returning `S32`; exported unless `exported` is false.
fn helper_library(src: &mut Source, exported: bool) {
    let mut helper = src
        .function("helper")
        .returning(src.ty("S32"))
        .with_body(BodyDecl::Expression(src.int(1)));
    if exported {
        helper = helper.with_visibility(VisibilityDecl::new(VisibilityKind::Export, src.span()));
    }
    src.library("lib", vec![Item::from(helper)]);
}

#[test]
fn test_foreign_function_is_not_in_scope_without_import() {
    let mut src = Source::new();
    helper_library(&mut src, true);
    let n = src.global("n").with_init(src.call("helper", vec![]));
    src.item(n);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E1013]);
}

#[test]
fn test_imported_function_resolves() {
    let mut src = Source::new();
    helper_library(&mut src, true);
    let import = ImportDecl::names(src.package("lib"), vec![(src.name("helper"), src.span())], src.span());
    let n = src.global("n").with_init(src.call("helper", vec![]));
    src.item(import);
    src.item(n);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![]);
    let program = analysis.program();
    let Some(n) = program.global_named("n") else {
        panic!("n was not bound");
    };
    let [helper] = program.functions_named("helper")[..] else {
        panic!("expected exactly one `helper`");
    };
    let resolved = program.initializer(n).and_then(|init| program.invocation(init)).map(|i| i.function);
    assert_eq!(resolved, Some(helper));
}

#[test]
fn test_unknown_package_and_symbol() {
    let mut src = Source::new();
    helper_library(&mut src, true);
    let missing_span = src.span();
    src.item(ImportDecl::all(src.package("nowhere"), src.span()));
    src.item(ImportDecl::names(
        src.package("lib"),
        vec![(src.name("helper"), src.span()), (src.name("missing"), missing_span)],
        src.span(),
    ));
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E1018, ErrorCode::E1019]);
    assert_eq!(analysis.diagnostics()[1].primary_span(), Some(missing_span));
}

#[test]
fn test_importing_an_inaccessible_symbol() {
    let mut src = Source::new();
    helper_library(&mut src, false);
    let import = ImportDecl::names(src.package("lib"), vec![(src.name("helper"), src.span())], src.span());
    src.item(import);
    let analysis = src.analyze();

    assert_eq!(codes(&analysis), vec![ErrorCode::E1009]);
}

/// Without a configured limit every error is kept.
#[test]
fn test_no_error_limit_by_default() {
    const ERRORS: usize = 150;
    let mut src = Source::new();
    for i in 0..ERRORS {
        let global = src.global(&format!("g{i}")).with_init(src.ident(&format!("missing{i}")));
        src.item(global);
    }
    let analysis = src.analyze();

    let codes = codes(&analysis);
    assert_eq!(codes.len(), ERRORS);
    assert!(codes.iter().all(|c| *c == ErrorCode::E2003), "{codes:?}");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Overloads over pairwise distinct types never collide; any repeated
    /// type makes the whole set collide, reported once.
    #[test]
    fn prop_overload_disjointness(picks in prop::collection::vec(0..4usize, 1..6)) {
        const SCALARS: [&str; 4] = ["S32", "U8", "Bool", "String"];
        let mut src = Source::new();
        for (i, pick) in picks.iter().enumerate() {
            let f = src
                .function("f")
                .with_param(src.param(&format!("p{i}"), SCALARS[*pick]))
                .with_body(src.block_body(vec![]));
            src.item(f);
        }
        let analysis = src.analyze();

        let mut distinct = picks.clone();
        distinct.sort_unstable();
        distinct.dedup();
        let collisions = codes(&analysis).iter().filter(|c| **c == ErrorCode::E3007).count();
        prop_assert_eq!(collisions, usize::from(distinct.len() < picks.len()));
    }
}

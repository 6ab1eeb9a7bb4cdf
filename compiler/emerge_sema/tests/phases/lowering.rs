//! Signatures handed to the backend.

use emerge_diagnostic::ErrorCode;
use emerge_sema::decl::BodyDecl;
use emerge_sema::{InternalCompilerError, IrParam, IrType};
use pretty_assertions::assert_eq;

use crate::common::{analyze, codes, Source};

fn s32() -> IrType {
    IrType::Nominal {
        name: "S32".to_owned(),
        package: "emerge.core".to_owned(),
        mutability: "const".to_owned(),
        args: Vec::new(),
    }
}

fn add(src: &mut Source) {
    let add = src
        .function("add")
        .with_param(src.param("a", "S32"))
        .with_param(src.param("b", "S32"))
        .returning(src.ty("S32"))
        .with_body(BodyDecl::Expression(src.ident("a")));
    src.item(add);
}

#[test]
fn test_lower_analyzed_signature() {
    let mut src = Source::new();
    add(&mut src);
    let analysis = src.analyze();
    assert_eq!(codes(&analysis), vec![]);

    let program = analysis.program();
    let [id] = program.functions_named("add")[..] else {
        panic!("expected exactly one `add`");
    };
    let Ok(signature) = program.lower_signature(id) else {
        panic!("`add` could not be lowered");
    };
    assert_eq!(signature.name, "add");
    assert_eq!(signature.owner, None);
    assert!(signature.type_params.is_empty());
    assert_eq!(
        signature.params,
        vec![
            IrParam {
                name: "a".to_owned(),
                ty: s32(),
            },
            IrParam {
                name: "b".to_owned(),
                ty: s32(),
            },
        ]
    );
    assert_eq!(signature.return_type, s32());
    assert_eq!(signature.purity, "pure");
    assert!(!signature.nothrow);
    assert!(!signature.external);
}

#[test]
fn test_lowering_requires_analysis() {
    let mut src = Source::new();
    add(&mut src);
    let unit = src.unit();
    let [id] = unit.program().functions_named("add")[..] else {
        panic!("expected exactly one `add`");
    };
    assert!(matches!(
        unit.program().lower_signature(id),
        Err(InternalCompilerError::NotAnalyzed { .. })
    ));

    let analysis = analyze(unit);
    assert!(analysis.program().lower_signature(id).is_ok());
}

#[test]
fn test_unknown_parameter_type_cannot_be_lowered() {
    let mut src = Source::new();
    let bad = src
        .function("bad")
        .with_param(src.param("p", "Missing"))
        .with_body(src.block_body(vec![]));
    src.item(bad);
    let analysis = src.analyze();
    assert_eq!(codes(&analysis), vec![ErrorCode::E2002]);

    let program = analysis.program();
    let [id] = program.functions_named("bad")[..] else {
        panic!("expected exactly one `bad`");
    };
    let Err(error) = program.lower_signature(id) else {
        panic!("an erroneous signature was lowered");
    };
    assert!(matches!(error, InternalCompilerError::ErroneousSignature { .. }));
    assert!(error.to_string().contains("parameter `p`"));
}

use super::*;
use std::str::FromStr;

#[test]
fn test_error_code_display() {
    assert_eq!(ErrorCode::E2001.to_string(), "E2001");
    assert_eq!(ErrorCode::W3001.as_str(), "W3001");
}

#[test]
fn test_all_variants_listed() {
    let mut seen = std::collections::HashSet::new();
    for code in ErrorCode::ALL {
        assert!(seen.insert(code.as_str()), "{code} listed twice");
    }
    assert_eq!(seen.len(), ErrorCode::ALL.len());
}

#[test]
fn test_ranges_are_exclusive() {
    for code in ErrorCode::ALL {
        let ranges = [
            code.is_binding_error(),
            code.is_type_error(),
            code.is_effect_error(),
            code.is_warning(),
        ];
        assert!(
            ranges.iter().filter(|r| **r).count() <= 1,
            "{code} is in more than one range"
        );
    }
}

#[test]
fn test_effect_codes() {
    for code in [
        ErrorCode::E4001,
        ErrorCode::E4002,
        ErrorCode::E4003,
        ErrorCode::E4004,
        ErrorCode::E4005,
        ErrorCode::E4006,
        ErrorCode::E4007,
        ErrorCode::E4008,
        ErrorCode::E4009,
    ] {
        assert!(code.is_effect_error());
        assert!(!code.is_type_error());
        assert!(!code.is_warning());
    }
}

#[test]
fn test_from_str_roundtrip_and_case() {
    for code in ErrorCode::ALL {
        assert_eq!(ErrorCode::from_str(code.as_str()), Ok(*code));
    }
    assert_eq!(ErrorCode::from_str("e2005"), Ok(ErrorCode::E2005));
    assert_eq!(ErrorCode::from_str("E0000"), Err(()));
}

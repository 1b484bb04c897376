use miette::Diagnostic;
use reef_syntax::parse_source;
use reef_types::type_check;

use super::helpers::MODULE;
use crate::lowering::{lower_program, LoweringError};

#[test]
fn test_unchecked_program_is_rejected() {
    let parsed = parse_source(MODULE, "var a = b;");
    assert!(parsed.errors.is_empty());
    let checked = type_check(&parsed.program);
    assert!(!checked.errors.is_empty());

    let error = lower_program(&checked.program).unwrap_err();
    assert!(
        matches!(error, LoweringError::MissingType { .. } | LoweringError::Internal(_)),
        "unexpected error: {error:?}"
    );
}

#[test]
fn test_error_messages_and_codes() {
    let error = LoweringError::UnknownVariant {
        ty: "MyUnion".to_owned(),
        variant: 3,
    };
    assert_eq!(error.to_string(), "type 'MyUnion' has no variant at index 3");
    assert_eq!(error.code().map(|c| c.to_string()), Some("reef_mir::unknown_variant".to_owned()));

    let error = LoweringError::MissingType {
        context: "integer literal 1".to_owned(),
    };
    assert_eq!(error.to_string(), "no concrete type for integer literal 1");
    assert_eq!(error.code().map(|c| c.to_string()), Some("reef_mir::missing_type".to_owned()));

    let error = LoweringError::Internal("'break' outside of a loop".to_owned());
    assert_eq!(error.to_string(), "internal lowering error: 'break' outside of a loop");
}

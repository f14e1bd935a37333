//! Argument-count validation for named generic references.
//!
//! A class or type alias named without type arguments is accepted only when
//! every parameter has a default, and is then the same as `Name<>`. Generic
//! function calls never come through here; they are inferred instead.

use crate::def::{DefId, DefinitionInfo};
use crate::diagnostics::DiagnosticKind;

/// Validate a reference that supplies no argument list at all.
pub fn validate_bare_usage(def: DefId, info: &DefinitionInfo) -> Result<(), DiagnosticKind> {
    validate_argument_count(def, info, 0)
}

/// Validate an explicit list of `supplied` type arguments.
///
/// Fewer than the required parameters is `MissingTypeArguments`; more than
/// declared is `TooManyTypeArguments`.
pub fn validate_argument_count(
    def: DefId,
    info: &DefinitionInfo,
    supplied: usize,
) -> Result<(), DiagnosticKind> {
    let declared = info.type_params.len();
    if supplied > declared {
        return Err(DiagnosticKind::TooManyTypeArguments {
            declaration: def,
            expected: declared,
            got: supplied,
        });
    }
    let required = info.required_param_count();
    if supplied < required {
        return Err(DiagnosticKind::MissingTypeArguments {
            declaration: def,
            parameters: info.param_names(),
            required,
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/bare_usage_tests.rs"]
mod tests;

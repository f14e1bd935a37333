//! Diagnostic codes, message templates and the rendered diagnostic.
//!
//! Codes follow the numbering TypeScript uses for the same conditions so that
//! downstream tooling can map them without a translation table. The engine
//! itself attaches no severity: classifying a diagnostic as an error or a
//! warning is the reporting layer's concern.

use serde::Serialize;

/// A diagnostic message definition with code and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub message: &'static str,
}

pub mod diagnostic_codes {
    pub const DUPLICATE_IDENTIFIER: u32 = 2300;
    pub const CANNOT_FIND_NAME: u32 = 2304;
    pub const GENERIC_TYPE_REQUIRES_TYPE_ARGUMENT_S: u32 = 2314;
    pub const PROPERTY_DOES_NOT_EXIST_ON_TYPE: u32 = 2339;
    pub const TYPE_DOES_NOT_SATISFY_THE_CONSTRAINT: u32 = 2344;
    pub const ARGUMENT_OF_TYPE_IS_NOT_ASSIGNABLE_TO_PARAMETER_OF_TYPE: u32 = 2345;
    pub const THIS_EXPRESSION_IS_NOT_CALLABLE: u32 = 2349;
    pub const EXPECTED_ARGUMENTS_BUT_GOT: u32 = 2554;
    pub const EXPECTED_TYPE_ARGUMENTS_BUT_GOT: u32 = 2558;
    pub const TYPE_INSTANTIATION_IS_EXCESSIVELY_DEEP_AND_POSSIBLY_INFINITE: u32 = 2589;
}

pub mod diagnostic_messages {
    pub const DUPLICATE_IDENTIFIER: &str = "Duplicate identifier '{0}'.";
    pub const CANNOT_FIND_NAME: &str = "Cannot find name '{0}'.";
    pub const GENERIC_TYPE_REQUIRES_TYPE_ARGUMENT_S: &str =
        "Generic type '{0}' requires {1} type argument(s).";
    pub const PROPERTY_DOES_NOT_EXIST_ON_TYPE: &str =
        "Property '{0}' does not exist on type '{1}'.";
    pub const TYPE_DOES_NOT_SATISFY_THE_CONSTRAINT: &str =
        "Type '{0}' does not satisfy the constraint '{1}'.";
    pub const ARGUMENT_OF_TYPE_IS_NOT_ASSIGNABLE_TO_PARAMETER_OF_TYPE: &str =
        "Argument of type '{0}' is not assignable to parameter of type '{1}'.";
    pub const THIS_EXPRESSION_IS_NOT_CALLABLE: &str = "This expression is not callable.";
    pub const EXPECTED_ARGUMENTS_BUT_GOT: &str = "Expected {0} arguments, but got {1}.";
    pub const EXPECTED_TYPE_ARGUMENTS_BUT_GOT: &str = "Expected {0} type arguments, but got {1}.";
    pub const TYPE_INSTANTIATION_IS_EXCESSIVELY_DEEP_AND_POSSIBLY_INFINITE: &str =
        "Type instantiation is excessively deep and possibly infinite.";
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: diagnostic_codes::DUPLICATE_IDENTIFIER,
        message: diagnostic_messages::DUPLICATE_IDENTIFIER,
    },
    DiagnosticMessage {
        code: diagnostic_codes::CANNOT_FIND_NAME,
        message: diagnostic_messages::CANNOT_FIND_NAME,
    },
    DiagnosticMessage {
        code: diagnostic_codes::GENERIC_TYPE_REQUIRES_TYPE_ARGUMENT_S,
        message: diagnostic_messages::GENERIC_TYPE_REQUIRES_TYPE_ARGUMENT_S,
    },
    DiagnosticMessage {
        code: diagnostic_codes::PROPERTY_DOES_NOT_EXIST_ON_TYPE,
        message: diagnostic_messages::PROPERTY_DOES_NOT_EXIST_ON_TYPE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::TYPE_DOES_NOT_SATISFY_THE_CONSTRAINT,
        message: diagnostic_messages::TYPE_DOES_NOT_SATISFY_THE_CONSTRAINT,
    },
    DiagnosticMessage {
        code: diagnostic_codes::ARGUMENT_OF_TYPE_IS_NOT_ASSIGNABLE_TO_PARAMETER_OF_TYPE,
        message: diagnostic_messages::ARGUMENT_OF_TYPE_IS_NOT_ASSIGNABLE_TO_PARAMETER_OF_TYPE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::THIS_EXPRESSION_IS_NOT_CALLABLE,
        message: diagnostic_messages::THIS_EXPRESSION_IS_NOT_CALLABLE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::EXPECTED_ARGUMENTS_BUT_GOT,
        message: diagnostic_messages::EXPECTED_ARGUMENTS_BUT_GOT,
    },
    DiagnosticMessage {
        code: diagnostic_codes::EXPECTED_TYPE_ARGUMENTS_BUT_GOT,
        message: diagnostic_messages::EXPECTED_TYPE_ARGUMENTS_BUT_GOT,
    },
    DiagnosticMessage {
        code: diagnostic_codes::TYPE_INSTANTIATION_IS_EXCESSIVELY_DEEP_AND_POSSIBLY_INFINITE,
        message: diagnostic_messages::TYPE_INSTANTIATION_IS_EXCESSIVELY_DEEP_AND_POSSIBLY_INFINITE,
    },
];

/// A rendered diagnostic with its location and related information.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub code: u32,
    /// Related information spans (e.g., where the generic was declared)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

/// Related information for a diagnostic (e.g., "see also" locations).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosticRelatedInformation {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
}

impl Diagnostic {
    #[must_use]
    pub const fn new(file: String, start: u32, length: u32, message: String, code: u32) -> Self {
        Self {
            file,
            start,
            length,
            message_text: message,
            code,
            related_information: Vec::new(),
        }
    }

    /// Add related information to this diagnostic.
    #[must_use]
    pub fn with_related(mut self, file: String, start: u32, length: u32, message: String) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            file,
            start,
            length,
            message_text: message,
        });
        self
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// Get the message template for a diagnostic code.
#[must_use]
pub fn get_message_template(code: u32) -> Option<&'static str> {
    DIAGNOSTIC_MESSAGES
        .iter()
        .find(|m| m.code == code)
        .map(|m| m.message)
}

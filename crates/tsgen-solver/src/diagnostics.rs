//! Diagnostics produced by the engine.
//!
//! ## Architecture: Lazy Diagnostics
//!
//! Engine components return structured [`DiagnosticKind`] values and never
//! format strings while checking. The entry point that owns a site attaches
//! its `SourceLocation`, giving a [`PendingDiagnostic`]. Text is produced only
//! by [`PendingDiagnostic::render`], with a `TypeFormatter` that can name
//! declarations.
//!
//! Nothing here carries a severity; classifying diagnostics is the reporting
//! layer's concern.

use crate::def::DefId;
use crate::format::TypeFormatter;
use crate::infer::{ConflictKind, UnificationConflict};
use crate::instantiate::DepthLimitExceeded;
use crate::types::TypeId;
use std::sync::Arc;
use tsgen_common::SourceLocation;
use tsgen_common::diagnostics::{Diagnostic, diagnostic_codes as dc, format_message, get_message_template};
use tsgen_common::interner::Atom;

/// Stable numeric codes, by engine condition.
pub mod codes {
    use super::dc;

    pub const MISSING_TYPE_ARGUMENTS: u32 = dc::GENERIC_TYPE_REQUIRES_TYPE_ARGUMENT_S;
    pub const TOO_MANY_TYPE_ARGUMENTS: u32 = dc::EXPECTED_TYPE_ARGUMENTS_BUT_GOT;
    pub const UNIFICATION_CONFLICT: u32 = dc::ARGUMENT_OF_TYPE_IS_NOT_ASSIGNABLE_TO_PARAMETER_OF_TYPE;
    pub const CONSTRAINT_VIOLATION: u32 = dc::TYPE_DOES_NOT_SATISFY_THE_CONSTRAINT;
    pub const UNRESOLVED_CAPABILITY_ACCESS: u32 = dc::PROPERTY_DOES_NOT_EXIST_ON_TYPE;
    pub const RECURSIVE_EXPANSION_LIMIT: u32 =
        dc::TYPE_INSTANTIATION_IS_EXCESSIVELY_DEEP_AND_POSSIBLY_INFINITE;
    pub const ARGUMENT_COUNT_MISMATCH: u32 = dc::EXPECTED_ARGUMENTS_BUT_GOT;
    pub const NOT_CALLABLE: u32 = dc::THIS_EXPRESSION_IS_NOT_CALLABLE;
    pub const UNKNOWN_TYPE_NAME: u32 = dc::CANNOT_FIND_NAME;
    pub const DUPLICATE_TYPE_PARAMETER: u32 = dc::DUPLICATE_IDENTIFIER;
    pub const DUPLICATE_DECLARATION: u32 = dc::DUPLICATE_IDENTIFIER;
}

/// What went wrong, with the data needed to explain it.
#[derive(Clone, Debug, PartialEq)]
pub enum DiagnosticKind {
    /// Bare reference (or too short an explicit list) to a declaration whose
    /// parameters are not all defaulted.
    MissingTypeArguments {
        declaration: DefId,
        parameters: Vec<Atom>,
        required: usize,
    },
    TooManyTypeArguments {
        declaration: DefId,
        expected: usize,
        got: usize,
    },
    UnificationConflict {
        declaration: DefId,
        conflict: UnificationConflict,
    },
    ConstraintViolation {
        declaration: DefId,
        parameter: Atom,
        bound: TypeId,
        constraint: TypeId,
    },
    /// A template reads `member` from a parameter whose constraint does not provide it.
    UnresolvedCapabilityAccess {
        declaration: DefId,
        parameter: Atom,
        member: Atom,
        constraint: TypeId,
    },
    /// Aborts the instantiation it occurs in; sibling sites are unaffected.
    RecursiveGenericExpansionLimit { declaration: DefId, depth: u32 },
    ArgumentCountMismatch {
        declaration: DefId,
        expected: usize,
        got: usize,
    },
    NotCallable { declaration: DefId, template: TypeId },
    UnknownTypeName { name: Atom },
    DuplicateTypeParameter { declaration: Atom, parameter: Atom },
    /// A second declaration with a name already in the table; the first one stays.
    DuplicateDeclaration { name: Atom },
}

/// Maps a failed substitution walk to the expansion limit of `declaration`.
pub(crate) fn depth_limit(declaration: DefId) -> impl Fn(DepthLimitExceeded) -> DiagnosticKind {
    move |DepthLimitExceeded { depth }| DiagnosticKind::RecursiveGenericExpansionLimit {
        declaration,
        depth,
    }
}

impl DiagnosticKind {
    /// A unification failure at a call to `declaration`.
    ///
    /// Running out of depth is the expansion limit, not a type mismatch.
    pub fn from_conflict(declaration: DefId, conflict: UnificationConflict) -> Self {
        match conflict.kind {
            ConflictKind::TooDeep { depth } => {
                DiagnosticKind::RecursiveGenericExpansionLimit { declaration, depth }
            }
            _ => DiagnosticKind::UnificationConflict {
                declaration,
                conflict,
            },
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            DiagnosticKind::MissingTypeArguments { .. } => codes::MISSING_TYPE_ARGUMENTS,
            DiagnosticKind::TooManyTypeArguments { .. } => codes::TOO_MANY_TYPE_ARGUMENTS,
            DiagnosticKind::UnificationConflict { .. } => codes::UNIFICATION_CONFLICT,
            DiagnosticKind::ConstraintViolation { .. } => codes::CONSTRAINT_VIOLATION,
            DiagnosticKind::UnresolvedCapabilityAccess { .. } => {
                codes::UNRESOLVED_CAPABILITY_ACCESS
            }
            DiagnosticKind::RecursiveGenericExpansionLimit { .. } => {
                codes::RECURSIVE_EXPANSION_LIMIT
            }
            DiagnosticKind::ArgumentCountMismatch { .. } => codes::ARGUMENT_COUNT_MISMATCH,
            DiagnosticKind::NotCallable { .. } => codes::NOT_CALLABLE,
            DiagnosticKind::UnknownTypeName { .. } => codes::UNKNOWN_TYPE_NAME,
            DiagnosticKind::DuplicateTypeParameter { .. } => codes::DUPLICATE_TYPE_PARAMETER,
            DiagnosticKind::DuplicateDeclaration { .. } => codes::DUPLICATE_DECLARATION,
        }
    }

    /// The declaration the diagnostic is about, when there is one.
    pub fn declaration(&self) -> Option<DefId> {
        match self {
            DiagnosticKind::MissingTypeArguments { declaration, .. }
            | DiagnosticKind::TooManyTypeArguments { declaration, .. }
            | DiagnosticKind::UnificationConflict { declaration, .. }
            | DiagnosticKind::ConstraintViolation { declaration, .. }
            | DiagnosticKind::UnresolvedCapabilityAccess { declaration, .. }
            | DiagnosticKind::RecursiveGenericExpansionLimit { declaration, .. }
            | DiagnosticKind::ArgumentCountMismatch { declaration, .. }
            | DiagnosticKind::NotCallable { declaration, .. } => Some(*declaration),
            DiagnosticKind::UnknownTypeName { .. }
            | DiagnosticKind::DuplicateTypeParameter { .. }
            | DiagnosticKind::DuplicateDeclaration { .. } => None,
        }
    }

    /// Types named by the diagnostic, offending type first.
    pub fn involved_types(&self) -> Vec<TypeId> {
        match self {
            DiagnosticKind::UnificationConflict { conflict, .. } => {
                vec![conflict.actual, conflict.expected]
            }
            DiagnosticKind::ConstraintViolation {
                bound, constraint, ..
            } => vec![*bound, *constraint],
            DiagnosticKind::UnresolvedCapabilityAccess { constraint, .. } => vec![*constraint],
            DiagnosticKind::NotCallable { template, .. } => vec![*template],
            _ => Vec::new(),
        }
    }

    fn args(&self) -> Vec<DiagnosticArg> {
        match self {
            DiagnosticKind::MissingTypeArguments {
                declaration,
                parameters,
                required,
            } => vec![
                DiagnosticArg::Generic {
                    def: *declaration,
                    params: parameters.clone(),
                },
                (*required).into(),
            ],
            DiagnosticKind::TooManyTypeArguments { expected, got, .. }
            | DiagnosticKind::ArgumentCountMismatch { expected, got, .. } => {
                vec![(*expected).into(), (*got).into()]
            }
            DiagnosticKind::UnificationConflict { conflict, .. } => match conflict.kind {
                ConflictKind::MissingField(field) | ConflictKind::ExtraField(field) => vec![
                    conflict.actual.into(),
                    conflict.expected.into(),
                    field.into(),
                ],
                _ => vec![conflict.actual.into(), conflict.expected.into()],
            },
            DiagnosticKind::ConstraintViolation {
                bound, constraint, ..
            } => vec![(*bound).into(), (*constraint).into()],
            DiagnosticKind::UnresolvedCapabilityAccess {
                parameter, member, ..
            } => vec![(*member).into(), (*parameter).into()],
            DiagnosticKind::RecursiveGenericExpansionLimit { .. }
            | DiagnosticKind::NotCallable { .. } => Vec::new(),
            DiagnosticKind::UnknownTypeName { name }
            | DiagnosticKind::DuplicateDeclaration { name } => vec![(*name).into()],
            DiagnosticKind::DuplicateTypeParameter { parameter, .. } => vec![(*parameter).into()],
        }
    }
}

/// Argument for a diagnostic message template.
///
/// Instead of eagerly formatting types to strings, we store the raw data
/// and only format when rendering.
#[derive(Clone, Debug)]
pub enum DiagnosticArg {
    /// A type reference (will be formatted via TypeFormatter)
    Type(TypeId),
    /// A declaration together with its parameter names: `Container<T>`
    Generic { def: DefId, params: Vec<Atom> },
    /// An interned string
    Atom(Atom),
    /// A plain string
    String(Arc<str>),
    /// A number
    Number(usize),
}

macro_rules! impl_from_diagnostic_arg {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(impl From<$source> for DiagnosticArg {
            fn from(v: $source) -> Self { Self::$variant(v) }
        })*
    };
}

impl_from_diagnostic_arg! {
    TypeId => Type,
    Atom   => Atom,
    usize  => Number,
}

impl From<&str> for DiagnosticArg {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl DiagnosticArg {
    fn render(&self, formatter: &TypeFormatter<'_>) -> String {
        match self {
            DiagnosticArg::Type(type_id) => formatter.format(*type_id),
            DiagnosticArg::Generic { def, params } => {
                let names: Vec<String> = params
                    .iter()
                    .map(|&name| formatter.resolve_atom(name))
                    .collect();
                format!("{}<{}>", formatter.def_name(*def), names.join(", "))
            }
            DiagnosticArg::Atom(atom) => formatter.resolve_atom(*atom),
            DiagnosticArg::String(s) => s.to_string(),
            DiagnosticArg::Number(n) => n.to_string(),
        }
    }
}

/// A diagnostic that hasn't been rendered yet.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingDiagnostic {
    pub kind: DiagnosticKind,
    /// Passed through unchanged from the input node.
    pub location: SourceLocation,
}

impl PendingDiagnostic {
    pub fn new(kind: DiagnosticKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }

    pub fn code(&self) -> u32 {
        self.kind.code()
    }

    pub fn involved_types(&self) -> Vec<TypeId> {
        self.kind.involved_types()
    }

    /// Format the message and attach the declaring location as related info.
    pub fn render(&self, formatter: &TypeFormatter<'_>) -> Diagnostic {
        let code = self.code();
        let args: Vec<String> = self
            .kind
            .args()
            .iter()
            .map(|arg| arg.render(formatter))
            .collect();
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let template = get_message_template(code).unwrap_or("Unknown diagnostic");
        let mut message = format_message(template, &arg_refs);
        if let DiagnosticKind::UnificationConflict { conflict, .. } = &self.kind {
            if let Some(detail) = conflict.kind.detail() {
                message.push(' ');
                message.push_str(&format_message(detail, &arg_refs));
            }
        }

        let mut diagnostic = Diagnostic::new(
            self.location.file.to_string(),
            self.location.start,
            self.location.length,
            message,
            code,
        );
        if let Some(def) = self.kind.declaration() {
            if let Some(declared) = formatter
                .def_location(def)
                .filter(|declared| !declared.file.is_empty())
            {
                diagnostic = diagnostic.with_related(
                    declared.file.to_string(),
                    declared.start,
                    declared.length,
                    format!("'{}' is declared here.", formatter.def_name(def)),
                );
            }
        }
        diagnostic
    }
}

#[cfg(test)]
#[path = "../tests/diagnostics_tests.rs"]
mod tests;

//! Type lowering: parser nodes → TypeId
//!
//! This module is the bridge from the [`nodes`](crate::nodes) shapes into
//! interned types. Names resolve against the enclosing declaration's type
//! parameters first, then against the declaration table.
//!
//! References are lowered as written (`Reference(def, args)`); expanding them
//! is the instantiation engine's job.

use crate::application::TypeArguments;
use crate::def::{DefId, DefinitionInfo, DefinitionStore, TypeParamInfo};
use crate::diagnostics::{DiagnosticKind, PendingDiagnostic};
use crate::intern::TypeInterner;
use crate::nodes::{GenericDeclNode, TypeArgumentList, TypeExpr};
use crate::types::{PropertyInfo, TypeId};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use tsgen_common::SourceLocation;
use tsgen_common::interner::Atom;

/// Type lowering context.
pub struct TypeLowering<'a> {
    interner: &'a TypeInterner,
    defs: &'a DefinitionStore,
    /// Type parameters in scope, by name.
    scope: IndexMap<Atom, TypeId, FxBuildHasher>,
}

impl<'a> TypeLowering<'a> {
    pub fn new(interner: &'a TypeInterner, defs: &'a DefinitionStore) -> Self {
        TypeLowering {
            interner,
            defs,
            scope: IndexMap::default(),
        }
    }

    /// Bring the parameters of `owner` into scope, in declaration order.
    pub fn with_type_params(mut self, owner: DefId, names: &[Atom]) -> Self {
        for (ordinal, &name) in names.iter().enumerate() {
            let param = self.interner.type_param(owner, name, ordinal as u32);
            self.scope.entry(name).or_insert(param);
        }
        self
    }

    pub fn lower(&self, expr: &TypeExpr) -> Result<TypeId, DiagnosticKind> {
        let interner = self.interner;
        let type_id = match expr {
            TypeExpr::Keyword { name } => self.lower_keyword(name)?,
            TypeExpr::String { value } => interner.literal_string(value),
            TypeExpr::Number { value } => interner.literal_number(*value),
            TypeExpr::BigInt { value } => interner.literal_bigint(value),
            TypeExpr::Boolean { value } => interner.literal_boolean(*value),
            TypeExpr::Object { fields, open } => {
                let mut properties = Vec::with_capacity(fields.len());
                for field in fields {
                    properties.push(PropertyInfo::new(
                        interner.intern_string(&field.name),
                        self.lower(&field.type_expr)?,
                    ));
                }
                interner.object_with_openness(properties, *open)
            }
            TypeExpr::Tuple { elements } => interner.tuple(self.lower_list(elements)?),
            TypeExpr::Function { params, result } => {
                interner.function(self.lower_list(params)?, self.lower(result)?)
            }
            TypeExpr::Union { members } => interner.union(self.lower_list(members)?),
            TypeExpr::Reference { name, arguments } => {
                let atom = interner.intern_string(name);
                if let (Some(&param), TypeArgumentList::Omitted) = (self.scope.get(&atom), arguments) {
                    return Ok(param);
                }
                let def = self.resolve_name(atom)?;
                let args = match arguments {
                    TypeArgumentList::Omitted => None,
                    TypeArgumentList::Explicit(list) => Some(self.lower_list(list)?),
                };
                interner.reference(def, args)
            }
        };
        Ok(type_id)
    }

    pub fn lower_list(&self, exprs: &[TypeExpr]) -> Result<Vec<TypeId>, DiagnosticKind> {
        exprs.iter().map(|expr| self.lower(expr)).collect()
    }

    pub fn lower_arguments(&self, list: &TypeArgumentList) -> Result<TypeArguments, DiagnosticKind> {
        match list {
            TypeArgumentList::Omitted => Ok(TypeArguments::Omitted),
            TypeArgumentList::Explicit(exprs) => Ok(TypeArguments::Explicit(self.lower_list(exprs)?)),
        }
    }

    pub fn resolve_name(&self, name: Atom) -> Result<DefId, DiagnosticKind> {
        self.defs
            .find_by_name(name)
            .ok_or(DiagnosticKind::UnknownTypeName { name })
    }

    fn lower_keyword(&self, name: &str) -> Result<TypeId, DiagnosticKind> {
        let type_id = match name {
            "number" => TypeId::NUMBER,
            "string" => TypeId::STRING,
            "boolean" => TypeId::BOOLEAN,
            "bigint" => TypeId::BIGINT,
            "symbol" => TypeId::SYMBOL,
            "null" => TypeId::NULL,
            "undefined" => TypeId::UNDEFINED,
            "unknown" | "any" => TypeId::UNKNOWN,
            "never" => TypeId::NEVER,
            _ => {
                return Err(DiagnosticKind::UnknownTypeName {
                    name: self.interner.intern_string(name),
                });
            }
        };
        Ok(type_id)
    }
}

/// Lower one declaration whose id was reserved beforehand.
///
/// Problems are pushed to `diagnostics` and the offending part becomes the
/// error type, so the declaration is always defined.
pub fn lower_declaration(
    interner: &TypeInterner,
    defs: &DefinitionStore,
    id: DefId,
    node: &GenericDeclNode,
    diagnostics: &mut Vec<PendingDiagnostic>,
) -> DefinitionInfo {
    let decl_name = interner.intern_string(&node.name);
    let mut names: Vec<Atom> = Vec::with_capacity(node.parameters.len());
    for param in &node.parameters {
        let name = interner.intern_string(&param.name);
        if names.contains(&name) {
            diagnostics.push(PendingDiagnostic::new(
                DiagnosticKind::DuplicateTypeParameter {
                    declaration: decl_name,
                    parameter: name,
                },
                location_or(&param.location, &node.location),
            ));
        }
        names.push(name);
    }

    let lowering = TypeLowering::new(interner, defs).with_type_params(id, &names);
    let mut lower_or_report = |expr: &TypeExpr, location: &SourceLocation| match lowering.lower(expr) {
        Ok(type_id) => type_id,
        Err(kind) => {
            diagnostics.push(PendingDiagnostic::new(kind, location.clone()));
            TypeId::ERROR
        }
    };

    let mut type_params = Vec::with_capacity(node.parameters.len());
    for (ordinal, (param, &name)) in node.parameters.iter().zip(&names).enumerate() {
        let location = location_or(&param.location, &node.location);
        type_params.push(TypeParamInfo {
            name,
            ordinal: ordinal as u32,
            constraint: param
                .constraint
                .as_ref()
                .map(|expr| lower_or_report(expr, &location)),
            default: param
                .default
                .as_ref()
                .map(|expr| lower_or_report(expr, &location)),
        });
    }
    let template = lower_or_report(&node.template, &node.location);

    DefinitionInfo::new(node.kind, decl_name, type_params, template)
        .with_location(node.location.clone())
}

fn location_or(preferred: &SourceLocation, fallback: &SourceLocation) -> SourceLocation {
    if preferred.file.is_empty() {
        fallback.clone()
    } else {
        preferred.clone()
    }
}

#[cfg(test)]
#[path = "../tests/lower_tests.rs"]
mod tests;

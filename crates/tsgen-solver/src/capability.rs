//! Member access on type parameters.
//!
//! Inside a generic template, a parameter only offers what its constraint
//! guarantees. An unconstrained parameter (constraint `unknown`) offers
//! nothing. For a union constraint the member must exist on every member.

use crate::apparent::apparent_member;
use crate::def::{DefId, DefinitionStore, TypeParamInfo};
use crate::diagnostics::DiagnosticKind;
use crate::intern::TypeInterner;
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::subtype::TypeResolver;
use crate::types::{TypeData, TypeId};
use tracing::trace;
use tsgen_common::interner::Atom;

pub struct CapabilityChecker<'a, R: TypeResolver> {
    interner: &'a TypeInterner,
    defs: &'a DefinitionStore,
    resolver: &'a R,
}

impl<'a, R: TypeResolver> CapabilityChecker<'a, R> {
    pub fn new(interner: &'a TypeInterner, defs: &'a DefinitionStore, resolver: &'a R) -> Self {
        CapabilityChecker {
            interner,
            defs,
            resolver,
        }
    }

    /// Type of `member` read from `parameter` of `def`.
    pub fn check_member_access(
        &self,
        def: DefId,
        parameter: Atom,
        member: Atom,
    ) -> Result<TypeId, DiagnosticKind> {
        let params = self.defs.get_type_params(def).unwrap_or_default();
        let Some(param) = params.iter().find(|p| p.name == parameter) else {
            return Err(DiagnosticKind::UnknownTypeName { name: parameter });
        };
        let constraint = param.constraint.unwrap_or(TypeId::UNKNOWN);
        let mut depth = DepthCounter::with_profile(RecursionProfile::ShallowTraversal);
        match self.member_of(def, &params, constraint, member, &mut depth) {
            Some(found) => {
                trace!(def = def.0, member = ?member, found = found.0, "member access licensed");
                Ok(found)
            }
            None => Err(DiagnosticKind::UnresolvedCapabilityAccess {
                declaration: def,
                parameter,
                member,
                constraint,
            }),
        }
    }

    fn member_of(
        &self,
        def: DefId,
        params: &[TypeParamInfo],
        type_id: TypeId,
        member: Atom,
        depth: &mut DepthCounter,
    ) -> Option<TypeId> {
        if type_id == TypeId::UNKNOWN || type_id.is_error() {
            return None;
        }
        if !depth.enter() {
            return None;
        }
        let found = self.member_of_inner(def, params, type_id, member, depth);
        depth.leave();
        found
    }

    fn member_of_inner(
        &self,
        def: DefId,
        params: &[TypeParamInfo],
        type_id: TypeId,
        member: Atom,
        depth: &mut DepthCounter,
    ) -> Option<TypeId> {
        let interner = self.interner;
        match interner.lookup(type_id)? {
            TypeData::Object(shape_id) => interner
                .object_shape(shape_id)
                .property(member)
                .map(|prop| prop.type_id),
            TypeData::Union(list) => {
                let mut found = Vec::new();
                for &candidate in interner.type_list(list).iter() {
                    found.push(self.member_of(def, params, candidate, member, depth)?);
                }
                Some(interner.union(found))
            }
            // A constraint naming another parameter of the same declaration
            // offers what that parameter's constraint offers.
            TypeData::TypeParameter(param) if param.owner == def => {
                let constraint = params
                    .iter()
                    .find(|p| p.ordinal == param.ordinal)?
                    .constraint?;
                self.member_of(def, params, constraint, member, depth)
            }
            TypeData::Lazy(app) => {
                let expanded = self.resolver.resolve_lazy(app, interner)?;
                self.member_of(def, params, expanded, member, depth)
            }
            TypeData::Reference(target, args) => {
                let expanded = self.resolver.resolve_reference(target, args, interner)?;
                self.member_of(def, params, expanded, member, depth)
            }
            _ => apparent_member(interner, type_id, member),
        }
    }
}

#[cfg(test)]
#[path = "../tests/capability_tests.rs"]
mod tests;

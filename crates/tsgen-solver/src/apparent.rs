//! Apparent members of non-object types.
//!
//! Strings, tuples and function signatures behave like objects carrying a
//! `length: number` field when compared structurally or when a member is
//! accessed through a constraint.

use crate::intern::TypeInterner;
use crate::types::{TypeData, TypeId};
use crate::visitor::primitive_kind;
use tsgen_common::interner::Atom;

/// The kind of value whose apparent members are being asked for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ApparentMemberKind {
    String,
    Tuple,
    Function,
}

pub fn apparent_kind(interner: &TypeInterner, type_id: TypeId) -> Option<ApparentMemberKind> {
    if primitive_kind(interner, type_id) == Some(TypeId::STRING) {
        return Some(ApparentMemberKind::String);
    }
    match interner.lookup(type_id)? {
        TypeData::Tuple(_) => Some(ApparentMemberKind::Tuple),
        TypeData::Function(_) => Some(ApparentMemberKind::Function),
        _ => None,
    }
}

/// Type of the apparent member `name` on `type_id`, if it has one.
pub fn apparent_member(interner: &TypeInterner, type_id: TypeId, name: Atom) -> Option<TypeId> {
    apparent_kind(interner, type_id)?;
    (&*interner.resolve_atom_ref(name) == "length").then_some(TypeId::NUMBER)
}

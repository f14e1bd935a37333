//! Read-only traversal over interned types.
//!
//! Walks are iterative with a visited set, so shared sub-structure is visited
//! once and no walk can overflow the stack. `Reference` and `Lazy` nodes are
//! not expanded: their argument lists are the children.

use crate::intern::TypeInterner;
use crate::types::*;
use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashSet};

/// Call `f` on every direct child of `type_id`.
pub fn for_each_child(interner: &TypeInterner, type_id: TypeId, mut f: impl FnMut(TypeId)) {
    let Some(data) = interner.lookup(type_id) else {
        return;
    };
    match data {
        TypeData::Intrinsic(_)
        | TypeData::Error
        | TypeData::Literal(_)
        | TypeData::TypeParameter(_)
        | TypeData::TypeVar(_) => {}
        TypeData::Object(shape_id) => {
            for prop in &interner.object_shape(shape_id).properties {
                f(prop.type_id);
            }
        }
        TypeData::Tuple(list) | TypeData::Union(list) => {
            for &member in interner.type_list(list).iter() {
                f(member);
            }
        }
        TypeData::Function(shape_id) => {
            let shape = interner.function_shape(shape_id);
            for &param in &shape.params {
                f(param);
            }
            f(shape.return_type);
        }
        TypeData::Reference(_, Some(args)) => {
            for &arg in interner.type_list(args).iter() {
                f(arg);
            }
        }
        TypeData::Reference(_, None) => {}
        TypeData::Lazy(app_id) => {
            for &arg in &interner.type_application(app_id).args {
                f(arg);
            }
        }
    }
}

/// Whether any type reachable from `type_id` (inclusive) satisfies `pred`.
pub fn contains_type_matching(
    interner: &TypeInterner,
    type_id: TypeId,
    mut pred: impl FnMut(&TypeData) -> bool,
) -> bool {
    let mut visited = FxHashSet::default();
    let mut stack = vec![type_id];
    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        if let Some(data) = interner.lookup(current) {
            if pred(&data) {
                return true;
            }
        }
        for_each_child(interner, current, |child| stack.push(child));
    }
    false
}

/// Free type variables of `type_id`, in first-occurrence order.
pub fn collect_type_vars(interner: &TypeInterner, type_id: TypeId) -> Vec<TypeVar> {
    let mut seen = FxHashSet::default();
    let mut vars: IndexSet<TypeVar, FxBuildHasher> = IndexSet::default();
    // Depth-first, left to right, so the order follows the written type.
    let mut stack = vec![type_id];
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        if let Some(TypeData::TypeVar(var)) = interner.lookup(current) {
            vars.insert(var);
            continue;
        }
        let mut children = Vec::new();
        for_each_child(interner, current, |child| children.push(child));
        stack.extend(children.into_iter().rev());
    }
    vars.into_iter().collect()
}

pub fn contains_type_vars(interner: &TypeInterner, type_id: TypeId) -> bool {
    contains_type_matching(interner, type_id, |data| matches!(data, TypeData::TypeVar(_)))
}

pub fn contains_type_parameters(interner: &TypeInterner, type_id: TypeId) -> bool {
    contains_type_matching(interner, type_id, |data| {
        matches!(data, TypeData::TypeParameter(_))
    })
}

/// Whether the type still mentions a variable or parameter of some site.
pub fn is_open_type(interner: &TypeInterner, type_id: TypeId) -> bool {
    contains_type_matching(interner, type_id, |data| {
        matches!(data, TypeData::TypeVar(_) | TypeData::TypeParameter(_))
    })
}

pub fn contains_error_type(interner: &TypeInterner, type_id: TypeId) -> bool {
    contains_type_matching(interner, type_id, |data| matches!(data, TypeData::Error))
}

pub fn type_var(interner: &TypeInterner, type_id: TypeId) -> Option<TypeVar> {
    match interner.lookup(type_id) {
        Some(TypeData::TypeVar(var)) => Some(var),
        _ => None,
    }
}

pub fn union_members(interner: &TypeInterner, type_id: TypeId) -> Option<Vec<TypeId>> {
    match interner.lookup(type_id) {
        Some(TypeData::Union(list)) => Some(interner.type_list(list).to_vec()),
        _ => None,
    }
}

pub fn literal_value(interner: &TypeInterner, type_id: TypeId) -> Option<LiteralValue> {
    match interner.lookup(type_id) {
        Some(TypeData::Literal(value)) => Some(value),
        _ => None,
    }
}

/// The primitive a primitive or literal type belongs to.
///
/// `number` and `1` both give `number`; objects, unions and placeholders give
/// `None`.
pub fn primitive_kind(interner: &TypeInterner, type_id: TypeId) -> Option<TypeId> {
    if type_id.is_primitive() {
        return Some(type_id);
    }
    literal_value(interner, type_id).map(|lit| lit.primitive())
}

#[cfg(test)]
#[path = "../tests/visitor_tests.rs"]
mod tests;

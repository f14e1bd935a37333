//! Generic type instantiation and substitution.
//!
//! Two rewrites share one walker:
//!
//! - [`open_template`] turns the declared `TypeParameter`s of one declaration
//!   into the `TypeVar`s of one instantiation site.
//! - [`instantiate_type`] replaces `TypeVar`s by their bindings in a
//!   [`TypeSubstitution`]. Variables without a binding pass through, which is
//!   what progressive unification needs.
//!
//! Neither rewrite expands `Reference`s; only their argument lists are
//! rewritten. Expansion is the instantiation engine's job.
//!
//! Closed types are returned untouched. A walk over an open type nested
//! deeper than the traversal limit fails with [`DepthLimitExceeded`].

use crate::def::DefId;
use crate::intern::TypeInterner;
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::types::*;
use crate::visitor::is_open_type;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::warn;

/// A substitution walk gave up at `depth`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DepthLimitExceeded {
    pub depth: u32,
}

/// A mapping from per-site type variables to their bindings.
///
/// Scoped to one instantiation; never stored in long-lived structures.
#[derive(Clone, Debug, Default)]
pub struct TypeSubstitution {
    map: FxHashMap<TypeVar, TypeId>,
    /// Bound to Top because no argument or default determined them.
    top_fills: FxHashSet<TypeVar>,
}

impl TypeSubstitution {
    pub fn new() -> Self {
        TypeSubstitution::default()
    }

    /// Bind the variables of `vars` to `args` positionally.
    ///
    /// Extra variables stay unbound; extra arguments are ignored.
    pub fn from_args(vars: &[TypeVar], args: &[TypeId]) -> Self {
        let mut subst = TypeSubstitution::new();
        for (var, &arg) in vars.iter().zip(args) {
            subst.insert(*var, arg);
        }
        subst
    }

    pub fn insert(&mut self, var: TypeVar, type_id: TypeId) {
        self.map.insert(var, type_id);
    }

    /// Bind `var` to Top for want of anything better.
    pub fn insert_top(&mut self, var: TypeVar) {
        self.map.insert(var, TypeId::UNKNOWN);
        self.top_fills.insert(var);
    }

    pub fn is_top_fill(&self, var: TypeVar) -> bool {
        self.top_fills.contains(&var)
    }

    pub fn get(&self, var: TypeVar) -> Option<TypeId> {
        self.map.get(&var).copied()
    }

    pub fn contains(&self, var: TypeVar) -> bool {
        self.map.contains_key(&var)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeVar, TypeId)> + '_ {
        self.map.iter().map(|(&var, &ty)| (var, ty))
    }
}

enum Rewrite<'a> {
    Substitute(&'a TypeSubstitution),
    Open { owner: DefId, site: SiteId },
}

/// Structural rewriter over interned types.
pub struct TypeInstantiator<'a> {
    interner: &'a TypeInterner,
    rewrite: Rewrite<'a>,
    cache: FxHashMap<TypeId, TypeId>,
    depth: DepthCounter,
}

impl<'a> TypeInstantiator<'a> {
    pub fn new(interner: &'a TypeInterner, substitution: &'a TypeSubstitution) -> Self {
        Self::with_rewrite(interner, Rewrite::Substitute(substitution))
    }

    pub fn opening(interner: &'a TypeInterner, owner: DefId, site: SiteId) -> Self {
        Self::with_rewrite(interner, Rewrite::Open { owner, site })
    }

    fn with_rewrite(interner: &'a TypeInterner, rewrite: Rewrite<'a>) -> Self {
        TypeInstantiator {
            interner,
            rewrite,
            cache: FxHashMap::default(),
            depth: DepthCounter::with_profile(RecursionProfile::Instantiation),
        }
    }

    /// Whether the walk gave up on a too-deep type. The subtree it gave up
    /// on was replaced by the error type.
    pub fn is_exceeded(&self) -> bool {
        self.depth.is_exceeded()
    }

    /// Rewrite `type_id`, failing if any part of the walk went too deep.
    pub fn try_instantiate(&mut self, type_id: TypeId) -> Result<TypeId, DepthLimitExceeded> {
        let result = self.instantiate(type_id);
        if self.is_exceeded() {
            return Err(DepthLimitExceeded {
                depth: self.depth.max_depth(),
            });
        }
        Ok(result)
    }

    pub fn instantiate(&mut self, type_id: TypeId) -> TypeId {
        if type_id.is_intrinsic() || type_id.is_error() {
            return type_id;
        }
        if let Some(&cached) = self.cache.get(&type_id) {
            return cached;
        }
        if !self.depth.enter() {
            warn!(type_id = type_id.0, "instantiation walk exceeded depth limit");
            return TypeId::ERROR;
        }
        let result = self.instantiate_inner(type_id);
        self.depth.leave();
        self.cache.insert(type_id, result);
        result
    }

    fn instantiate_list(&mut self, items: &[TypeId]) -> Vec<TypeId> {
        items.iter().map(|&item| self.instantiate(item)).collect()
    }

    fn instantiate_inner(&mut self, type_id: TypeId) -> TypeId {
        let interner = self.interner;
        let Some(data) = interner.lookup(type_id) else {
            return type_id;
        };
        match data {
            TypeData::Intrinsic(_) | TypeData::Error | TypeData::Literal(_) => type_id,
            TypeData::TypeVar(var) => match self.rewrite {
                Rewrite::Substitute(subst) => subst.get(var).unwrap_or(type_id),
                Rewrite::Open { .. } => type_id,
            },
            TypeData::TypeParameter(param) => match self.rewrite {
                Rewrite::Open { owner, site } if param.owner == owner => {
                    interner.type_var(TypeVar {
                        site,
                        ordinal: param.ordinal,
                        name: param.name,
                    })
                }
                _ => type_id,
            },
            TypeData::Object(shape_id) => {
                let shape = interner.object_shape(shape_id);
                let properties = shape
                    .properties
                    .iter()
                    .map(|prop| PropertyInfo::new(prop.name, self.instantiate(prop.type_id)))
                    .collect();
                interner.object_with_openness(properties, shape.open)
            }
            TypeData::Tuple(list) => {
                let elements = self.instantiate_list(&interner.type_list(list));
                interner.tuple(elements)
            }
            TypeData::Union(list) => {
                let members = self.instantiate_list(&interner.type_list(list));
                interner.union(members)
            }
            TypeData::Function(shape_id) => {
                let shape = interner.function_shape(shape_id);
                let params = self.instantiate_list(&shape.params);
                let return_type = self.instantiate(shape.return_type);
                interner.function(params, return_type)
            }
            TypeData::Reference(def, Some(args)) => {
                let args = self.instantiate_list(&interner.type_list(args));
                interner.reference(def, Some(args))
            }
            TypeData::Reference(_, None) => type_id,
            TypeData::Lazy(app_id) => {
                let app = interner.type_application(app_id);
                let args = self.instantiate_list(&app.args);
                interner.lazy(app.def, args)
            }
        }
    }
}

/// Replace bound type variables in `type_id`. Unbound variables pass through.
pub fn instantiate_type(
    interner: &TypeInterner,
    type_id: TypeId,
    substitution: &TypeSubstitution,
) -> Result<TypeId, DepthLimitExceeded> {
    if substitution.is_empty() || !is_open_type(interner, type_id) {
        return Ok(type_id);
    }
    TypeInstantiator::new(interner, substitution).try_instantiate(type_id)
}

/// Replace `owner`'s declared parameters in `type_id` with the variables of `site`.
pub fn open_template(
    interner: &TypeInterner,
    type_id: TypeId,
    owner: DefId,
    site: SiteId,
) -> Result<TypeId, DepthLimitExceeded> {
    if !is_open_type(interner, type_id) {
        return Ok(type_id);
    }
    TypeInstantiator::opening(interner, owner, site).try_instantiate(type_id)
}

#[cfg(test)]
#[path = "../tests/instantiate_tests.rs"]
mod tests;

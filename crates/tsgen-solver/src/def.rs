//! Definition identifiers and storage for generic declarations.
//!
//! A `DefId` names one generic declaration (function, function type, class or
//! type alias). Declarations are published into the `DefinitionStore` once,
//! before any instantiation runs, and are read-only afterwards. The store is a
//! concurrent map so that worker threads can read it without coordination.
//!
//! ## Forward references
//!
//! Declarations may mention each other in any order. Callers first
//! [`reserve`](DefinitionStore::reserve) an id per declaration name, lower every
//! template against the reserved ids, then [`define`](DefinitionStore::define)
//! each declaration.

use crate::types::{SiteId, TypeId, TypeVar};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;
use tsgen_common::SourceLocation;
use tsgen_common::interner::Atom;

/// Generic declaration identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(pub u32);

impl DefId {
    /// Sentinel value for invalid `DefId`.
    pub const INVALID: Self = Self(0);

    /// First valid `DefId`.
    pub const FIRST_VALID: u32 = 1;

    pub const fn is_valid(self) -> bool {
        self.0 >= Self::FIRST_VALID
    }
}

/// Kind of generic declaration.
///
/// The instantiation algorithm is the same for every kind; the kind only
/// decides which entry points apply:
///
/// | Kind | Call inference | Bare-usage check |
/// |------|----------------|------------------|
/// | Function | yes | no |
/// | FunctionType | yes | no |
/// | Class | no | yes |
/// | TypeAlias | no | yes |
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DefKind {
    /// `function identity<T>(value: T): T`
    Function,
    /// `type Mapper<T> = (value: T) => T`
    FunctionType,
    /// `class Container<T> { value: T }`
    Class,
    /// `type List<T> = { value: T, next: List<T> | null }`
    TypeAlias,
}

impl DefKind {
    /// Whether a reference with an omitted argument list must be fully defaultable.
    pub const fn requires_type_arguments(self) -> bool {
        matches!(self, DefKind::Class | DefKind::TypeAlias)
    }

    /// Whether a call site may infer this declaration's arguments.
    pub const fn is_callable(self) -> bool {
        matches!(self, DefKind::Function | DefKind::FunctionType)
    }
}

/// A declared type parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeParamInfo {
    pub name: Atom,
    pub ordinal: u32,
    /// Upper bound; `None` means Top.
    pub constraint: Option<TypeId>,
    pub default: Option<TypeId>,
}

/// Complete information about a generic declaration.
#[derive(Clone, Debug)]
pub struct DefinitionInfo {
    pub kind: DefKind,

    /// Name of the declaration (for diagnostics)
    pub name: Atom,

    /// Type parameters in declaration order
    pub type_params: Vec<TypeParamInfo>,

    /// The declaration's template, with its parameters as `TypeParameter` nodes
    pub template: TypeId,

    /// Where the declaration was written
    pub location: SourceLocation,
}

impl DefinitionInfo {
    pub fn new(
        kind: DefKind,
        name: Atom,
        type_params: Vec<TypeParamInfo>,
        template: TypeId,
    ) -> Self {
        Self {
            kind,
            name,
            type_params,
            template,
            location: SourceLocation::default(),
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    /// The variables standing for this declaration's parameters at `site`.
    pub fn site_vars(&self, site: SiteId) -> Vec<TypeVar> {
        self.type_params
            .iter()
            .map(|param| TypeVar {
                site,
                ordinal: param.ordinal,
                name: param.name,
            })
            .collect()
    }

    pub fn param_names(&self) -> Vec<Atom> {
        self.type_params.iter().map(|param| param.name).collect()
    }

    /// Number of leading parameters that have no default.
    ///
    /// A parameter without a default that follows a defaulted one still
    /// counts, so this is the index just past the last non-defaulted parameter.
    pub fn required_param_count(&self) -> usize {
        self.type_params
            .iter()
            .rposition(|p| p.default.is_none())
            .map_or(0, |idx| idx + 1)
    }
}

/// Storage for generic declarations.
pub struct DefinitionStore {
    /// `DefId` -> `DefinitionInfo` mapping
    definitions: DashMap<DefId, DefinitionInfo>,

    /// Reserved names awaiting their definition
    names: DashMap<Atom, DefId>,

    /// Next available `DefId`
    next_id: AtomicU32,
}

impl Default for DefinitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self {
            definitions: DashMap::new(),
            names: DashMap::new(),
            next_id: AtomicU32::new(DefId::FIRST_VALID),
        }
    }

    fn allocate(&self) -> DefId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        trace!(allocated_def_id = %id, "DefinitionStore::allocate");
        DefId(id)
    }

    /// Reserve an id for `name` without defining it yet.
    ///
    /// Reserving the same name twice returns the first id.
    pub fn reserve(&self, name: Atom) -> DefId {
        *self.names.entry(name).or_insert_with(|| self.allocate())
    }

    /// Attach a definition to a previously reserved id.
    ///
    /// Returns `false` and keeps the existing definition if `id` is already
    /// defined, which is how a second declaration of one name shows up.
    pub fn define(&self, id: DefId, info: DefinitionInfo) -> bool {
        trace!(def_id = %id.0, kind = ?info.kind, "DefinitionStore::define");
        self.names.entry(info.name).or_insert(id);
        match self.definitions.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(info);
                true
            }
        }
    }

    /// Register a new definition and return its `DefId`.
    pub fn register(&self, info: DefinitionInfo) -> DefId {
        let id = self.reserve(info.name);
        self.define(id, info);
        id
    }

    /// Get definition info by `DefId`.
    pub fn get(&self, id: DefId) -> Option<DefinitionInfo> {
        self.definitions.get(&id).map(|r| r.clone())
    }

    pub fn contains(&self, id: DefId) -> bool {
        self.definitions.contains_key(&id)
    }

    pub fn get_kind(&self, id: DefId) -> Option<DefKind> {
        self.definitions.get(&id).map(|r| r.kind)
    }

    pub fn get_name(&self, id: DefId) -> Option<Atom> {
        self.definitions.get(&id).map(|r| r.name)
    }

    pub fn get_type_params(&self, id: DefId) -> Option<Vec<TypeParamInfo>> {
        self.definitions.get(&id).map(|r| r.type_params.clone())
    }

    /// Look up a reserved or defined declaration by name.
    pub fn find_by_name(&self, name: Atom) -> Option<DefId> {
        self.names.get(&name).map(|r| *r)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
#[path = "../tests/def_tests.rs"]
mod tests;

//! Type representation for the generic resolution engine.
//!
//! Every type is hash-consed into the `TypeInterner` and handled as a `TypeId`.
//! Two structurally identical types always receive the same id, so type
//! equality is integer comparison.
//!
//! Placeholders come in two flavours:
//!
//! - `TypeParameter` is the *declared* parameter as it appears inside a
//!   template. It belongs to one declaration and lives as long as that
//!   declaration.
//! - `TypeVar` is a *per-site* variable created when a template is opened for
//!   one instantiation site. Two calls to the same generic function get two
//!   distinct `SiteId`s and therefore never share a binding.

use crate::def::DefId;
use std::hash::{Hash, Hasher};
use tsgen_common::interner::Atom;

/// Interned type handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Sentinel for "no type".
    pub const NONE: TypeId = TypeId(0);
    /// Error recovery type. Compatible with everything so one failure does not cascade.
    pub const ERROR: TypeId = TypeId(1);
    /// Bottom type (`never`).
    pub const NEVER: TypeId = TypeId(2);
    /// Top type (`unknown`).
    pub const UNKNOWN: TypeId = TypeId(3);
    pub const UNDEFINED: TypeId = TypeId(4);
    pub const NULL: TypeId = TypeId(5);
    pub const BOOLEAN: TypeId = TypeId(6);
    pub const NUMBER: TypeId = TypeId(7);
    pub const STRING: TypeId = TypeId(8);
    pub const BIGINT: TypeId = TypeId(9);
    pub const SYMBOL: TypeId = TypeId(10);

    /// First id handed out to interned (non-intrinsic) types.
    pub const FIRST_USER: u32 = 100;

    #[inline]
    pub fn is_intrinsic(self) -> bool {
        self.0 >= Self::NEVER.0 && self.0 < Self::FIRST_USER
    }

    #[inline]
    pub fn is_error(self) -> bool {
        self == Self::ERROR || self == Self::NONE
    }

    /// `true` for the primitive intrinsics (everything except Top and Bottom).
    #[inline]
    pub fn is_primitive(self) -> bool {
        self.0 >= Self::UNDEFINED.0 && self.0 <= Self::SYMBOL.0
    }
}

/// Built-in types that never need interning.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntrinsicKind {
    Never,
    Unknown,
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    Bigint,
    Symbol,
}

impl IntrinsicKind {
    pub const fn to_type_id(self) -> TypeId {
        match self {
            IntrinsicKind::Never => TypeId::NEVER,
            IntrinsicKind::Unknown => TypeId::UNKNOWN,
            IntrinsicKind::Undefined => TypeId::UNDEFINED,
            IntrinsicKind::Null => TypeId::NULL,
            IntrinsicKind::Boolean => TypeId::BOOLEAN,
            IntrinsicKind::Number => TypeId::NUMBER,
            IntrinsicKind::String => TypeId::STRING,
            IntrinsicKind::Bigint => TypeId::BIGINT,
            IntrinsicKind::Symbol => TypeId::SYMBOL,
        }
    }

    pub const fn from_type_id(id: TypeId) -> Option<IntrinsicKind> {
        Some(match id {
            TypeId::NEVER => IntrinsicKind::Never,
            TypeId::UNKNOWN => IntrinsicKind::Unknown,
            TypeId::UNDEFINED => IntrinsicKind::Undefined,
            TypeId::NULL => IntrinsicKind::Null,
            TypeId::BOOLEAN => IntrinsicKind::Boolean,
            TypeId::NUMBER => IntrinsicKind::Number,
            TypeId::STRING => IntrinsicKind::String,
            TypeId::BIGINT => IntrinsicKind::Bigint,
            TypeId::SYMBOL => IntrinsicKind::Symbol,
            _ => return None,
        })
    }

    /// Keyword spelling, used by the formatter and lowering.
    pub const fn name(self) -> &'static str {
        match self {
            IntrinsicKind::Never => "never",
            IntrinsicKind::Unknown => "unknown",
            IntrinsicKind::Undefined => "undefined",
            IntrinsicKind::Null => "null",
            IntrinsicKind::Boolean => "boolean",
            IntrinsicKind::Number => "number",
            IntrinsicKind::String => "string",
            IntrinsicKind::Bigint => "bigint",
            IntrinsicKind::Symbol => "symbol",
        }
    }
}

/// `f64` wrapper with bitwise equality so number literals can be hashed.
#[derive(Copy, Clone, Debug)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for OrderedFloat {}

impl Hash for OrderedFloat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    String(Atom),
    Number(OrderedFloat),
    /// Decimal digits without the trailing `n`.
    BigInt(Atom),
    Boolean(bool),
}

impl LiteralValue {
    /// The primitive a literal widens to.
    pub fn primitive(&self) -> TypeId {
        match self {
            LiteralValue::String(_) => TypeId::STRING,
            LiteralValue::Number(_) => TypeId::NUMBER,
            LiteralValue::BigInt(_) => TypeId::BIGINT,
            LiteralValue::Boolean(_) => TypeId::BOOLEAN,
        }
    }
}

/// Interned list of types (union members, tuple elements, type arguments).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeListId(pub u32);

impl TypeListId {
    /// The empty list; also used for an explicit empty argument list `<>`.
    pub const EMPTY: TypeListId = TypeListId(0);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectShapeId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionShapeId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeApplicationId(pub u32);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropertyInfo {
    pub name: Atom,
    pub type_id: TypeId,
}

impl PropertyInfo {
    pub fn new(name: Atom, type_id: TypeId) -> Self {
        Self { name, type_id }
    }
}

/// Structural object type.
///
/// `properties` are kept sorted by name atom so that field order in the
/// source never affects identity. An `open` shape is a lower bound: values
/// may carry fields beyond the listed ones. A closed shape requires the exact
/// field set when used as a target.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectShape {
    pub properties: Vec<PropertyInfo>,
    pub open: bool,
}

impl ObjectShape {
    pub fn property(&self, name: Atom) -> Option<&PropertyInfo> {
        self.properties
            .binary_search_by_key(&name, |p| p.name)
            .ok()
            .map(|idx| &self.properties[idx])
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionShape {
    pub params: Vec<TypeId>,
    pub return_type: TypeId,
}

/// A generic declaration applied to concrete arguments.
///
/// Used as the key of an instantiation and as the payload of `Lazy`
/// placeholders that stand for an instantiation already in progress.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeApplication {
    pub def: DefId,
    pub args: Vec<TypeId>,
}

/// A declared type parameter as it occurs inside its owner's template.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeParamRef {
    pub owner: DefId,
    pub name: Atom,
    pub ordinal: u32,
}

/// Identity of one instantiation site.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteId(pub u32);

/// A type variable: one parameter of one declaration at one usage site.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeVar {
    pub site: SiteId,
    pub ordinal: u32,
    pub name: Atom,
}

/// The structural content behind a `TypeId`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Intrinsic(IntrinsicKind),
    Error,
    Literal(LiteralValue),
    Object(ObjectShapeId),
    Tuple(TypeListId),
    Function(FunctionShapeId),
    Union(TypeListId),
    /// Reference to a generic declaration. `None` means the argument list was
    /// omitted; `Some(TypeListId::EMPTY)` is the explicit empty list `<>`.
    Reference(DefId, Option<TypeListId>),
    /// Placeholder for an instantiation that is resolved on demand.
    Lazy(TypeApplicationId),
    TypeParameter(TypeParamRef),
    TypeVar(TypeVar),
}

//! Parser-level node shapes consumed by the engine.
//!
//! These are what the parser hands over: declarations with their parameter
//! lists, plus the reference and call sites to instantiate. They deserialize
//! from JSON, so a whole program can be loaded from a file:
//!
//! ```json
//! {
//!   "declarations": [{
//!     "kind": "function", "name": "identity",
//!     "parameters": [{ "name": "T" }],
//!     "template": { "kind": "function",
//!                   "params": [{ "kind": "reference", "name": "T" }],
//!                   "result": { "kind": "reference", "name": "T" } }
//!   }],
//!   "sites": [{ "site": "call", "callee": "identity",
//!               "argumentTypes": [{ "kind": "keyword", "name": "number" }] }]
//! }
//! ```

use crate::def::DefKind;
use serde::{Deserialize, Deserializer};
use tsgen_common::SourceLocation;

/// A written type.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeExpr {
    /// `number`, `string`, `unknown`, `never`, ...
    Keyword { name: String },
    String { value: String },
    Number { value: f64 },
    #[serde(rename = "bigint")]
    BigInt { value: String },
    Boolean { value: bool },
    Object {
        fields: Vec<FieldNode>,
        /// `{ length: number, ... }`
        #[serde(default)]
        open: bool,
    },
    Tuple { elements: Vec<TypeExpr> },
    Function {
        params: Vec<TypeExpr>,
        result: Box<TypeExpr>,
    },
    Union { members: Vec<TypeExpr> },
    /// A type parameter or a declaration, by name.
    Reference {
        name: String,
        #[serde(default)]
        arguments: TypeArgumentList,
    },
}

impl TypeExpr {
    pub fn keyword(name: &str) -> Self {
        TypeExpr::Keyword { name: name.into() }
    }

    pub fn named(name: &str) -> Self {
        TypeExpr::Reference {
            name: name.into(),
            arguments: TypeArgumentList::Omitted,
        }
    }

    pub fn applied(name: &str, arguments: Vec<TypeExpr>) -> Self {
        TypeExpr::Reference {
            name: name.into(),
            arguments: TypeArgumentList::Explicit(arguments),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FieldNode {
    pub name: String,
    #[serde(rename = "type")]
    pub type_expr: TypeExpr,
}

/// The angle-bracket part of a reference.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TypeArgumentList {
    /// No angle brackets.
    #[default]
    Omitted,
    /// `<A, B>`; `<>` is the empty list.
    Explicit(Vec<TypeExpr>),
}

/// Accepts a missing key or `null` (omitted), the string `"<>"` or an array.
impl<'de> Deserialize<'de> for TypeArgumentList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ListOrMarker {
            List(Vec<TypeExpr>),
            Marker(String),
        }

        match Option::<ListOrMarker>::deserialize(deserializer)? {
            None => Ok(TypeArgumentList::Omitted),
            Some(ListOrMarker::List(list)) => Ok(TypeArgumentList::Explicit(list)),
            Some(ListOrMarker::Marker(marker)) if marker.trim() == "<>" => {
                Ok(TypeArgumentList::Explicit(Vec::new()))
            }
            Some(ListOrMarker::Marker(marker)) => Err(Error::custom(format!(
                "invalid type argument list: '{marker}'. Expected an array or \"<>\""
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeParamNode {
    pub name: String,
    #[serde(default)]
    pub constraint: Option<TypeExpr>,
    #[serde(default)]
    pub default: Option<TypeExpr>,
    #[serde(default)]
    pub location: SourceLocation,
}

impl TypeParamNode {
    pub fn new(name: &str) -> Self {
        TypeParamNode {
            name: name.into(),
            constraint: None,
            default: None,
            location: SourceLocation::default(),
        }
    }

    pub fn with_constraint(mut self, constraint: TypeExpr) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn with_default(mut self, default: TypeExpr) -> Self {
        self.default = Some(default);
        self
    }
}

/// A member read from a type parameter inside the template, e.g. `value.length`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberAccessNode {
    pub parameter: String,
    pub member: String,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericDeclNode {
    pub kind: DefKind,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<TypeParamNode>,
    pub template: TypeExpr,
    #[serde(default)]
    pub member_accesses: Vec<MemberAccessNode>,
    #[serde(default)]
    pub location: SourceLocation,
}

impl GenericDeclNode {
    pub fn new(kind: DefKind, name: &str, parameters: Vec<TypeParamNode>, template: TypeExpr) -> Self {
        GenericDeclNode {
            kind,
            name: name.into(),
            parameters,
            template,
            member_accesses: Vec::new(),
            location: SourceLocation::default(),
        }
    }
}

/// `Container<number>` written as an annotation or `new` target.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceNode {
    pub declaration: String,
    #[serde(default)]
    pub explicit_arguments: TypeArgumentList,
    #[serde(default)]
    pub location: SourceLocation,
}

/// `identity(2)` or `identity<number>(2)`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallNode {
    pub callee: String,
    #[serde(default)]
    pub explicit_arguments: TypeArgumentList,
    pub argument_types: Vec<TypeExpr>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "site", rename_all = "camelCase")]
pub enum SiteNode {
    Reference(ReferenceNode),
    Call(CallNode),
}

impl SiteNode {
    pub fn location(&self) -> &SourceLocation {
        match self {
            SiteNode::Reference(node) => &node.location,
            SiteNode::Call(node) => &node.location,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub declarations: Vec<GenericDeclNode>,
    #[serde(default)]
    pub sites: Vec<SiteNode>,
}

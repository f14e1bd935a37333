//! Type formatting for diagnostics and trace output.
//!
//! Produces TypeScript-like text: `{ value: number; next: List<number> | null }`,
//! `(value: T) => T`, `[string, number]`.

use crate::def::{DefId, DefinitionStore};
use crate::intern::TypeInterner;
use crate::types::*;
use std::fmt::Write;
use tsgen_common::SourceLocation;
use tsgen_common::interner::Atom;

/// Nesting beyond this prints as `...`.
const MAX_FORMAT_DEPTH: u32 = 8;

pub struct TypeFormatter<'a> {
    interner: &'a TypeInterner,
    defs: Option<&'a DefinitionStore>,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(interner: &'a TypeInterner) -> Self {
        TypeFormatter {
            interner,
            defs: None,
        }
    }

    /// Resolve declaration names instead of printing `Def(N)`.
    pub fn with_def_store(mut self, defs: &'a DefinitionStore) -> Self {
        self.defs = Some(defs);
        self
    }

    pub fn format(&self, type_id: TypeId) -> String {
        let mut out = String::new();
        self.write_type(&mut out, type_id, 0);
        out
    }

    pub fn resolve_atom(&self, atom: Atom) -> String {
        self.interner.resolve_atom(atom)
    }

    /// Where the declaration was written, when a store is attached.
    pub fn def_location(&self, def: DefId) -> Option<SourceLocation> {
        self.defs?.get(def).map(|info| info.location)
    }

    pub fn def_name(&self, def: DefId) -> String {
        self.defs
            .and_then(|defs| defs.get_name(def))
            .map(|name| self.interner.resolve_atom(name))
            .unwrap_or_else(|| format!("Def({})", def.0))
    }

    fn write_list(&self, out: &mut String, items: &[TypeId], sep: &str, depth: u32) {
        for (idx, &item) in items.iter().enumerate() {
            if idx > 0 {
                out.push_str(sep);
            }
            self.write_type(out, item, depth);
        }
    }

    fn write_type(&self, out: &mut String, type_id: TypeId, depth: u32) {
        if depth > MAX_FORMAT_DEPTH {
            out.push_str("...");
            return;
        }
        let depth = depth + 1;
        let Some(data) = self.interner.lookup(type_id) else {
            let _ = write!(out, "<unknown {}>", type_id.0);
            return;
        };
        match data {
            TypeData::Intrinsic(kind) => out.push_str(kind.name()),
            TypeData::Error => out.push_str("error"),
            TypeData::Literal(lit) => match lit {
                LiteralValue::String(atom) => {
                    let _ = write!(out, "\"{}\"", self.interner.resolve_atom_ref(atom));
                }
                LiteralValue::Number(value) => {
                    let _ = write!(out, "{}", value.0);
                }
                LiteralValue::BigInt(atom) => {
                    let _ = write!(out, "{}n", self.interner.resolve_atom_ref(atom));
                }
                LiteralValue::Boolean(value) => {
                    let _ = write!(out, "{value}");
                }
            },
            TypeData::Object(shape_id) => {
                let shape = self.interner.object_shape(shape_id);
                if shape.properties.is_empty() {
                    out.push_str(if shape.open { "{ ... }" } else { "{}" });
                    return;
                }
                out.push_str("{ ");
                for (idx, prop) in shape.properties.iter().enumerate() {
                    if idx > 0 {
                        out.push_str("; ");
                    }
                    let _ = write!(out, "{}: ", self.interner.resolve_atom_ref(prop.name));
                    self.write_type(out, prop.type_id, depth);
                }
                out.push_str(if shape.open { "; ... }" } else { " }" });
            }
            TypeData::Tuple(list) => {
                out.push('[');
                self.write_list(out, &self.interner.type_list(list), ", ", depth);
                out.push(']');
            }
            TypeData::Function(shape_id) => {
                let shape = self.interner.function_shape(shape_id);
                out.push('(');
                for (idx, &param) in shape.params.iter().enumerate() {
                    if idx > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "arg{idx}: ");
                    self.write_type(out, param, depth);
                }
                out.push_str(") => ");
                self.write_type(out, shape.return_type, depth);
            }
            TypeData::Union(list) => {
                self.write_list(out, &self.interner.type_list(list), " | ", depth);
            }
            TypeData::Reference(def, args) => {
                out.push_str(&self.def_name(def));
                if let Some(args) = args {
                    out.push('<');
                    self.write_list(out, &self.interner.type_list(args), ", ", depth);
                    out.push('>');
                }
            }
            TypeData::Lazy(app_id) => {
                let app = self.interner.type_application(app_id);
                out.push_str(&self.def_name(app.def));
                if !app.args.is_empty() {
                    out.push('<');
                    self.write_list(out, &app.args, ", ", depth);
                    out.push('>');
                }
            }
            TypeData::TypeParameter(param) => {
                out.push_str(&self.interner.resolve_atom_ref(param.name));
            }
            TypeData::TypeVar(var) => {
                out.push_str(&self.interner.resolve_atom_ref(var.name));
            }
        }
    }
}

//! Default resolution for parameters left unbound.
//!
//! Parameters are visited left to right. A declared default is opened for the
//! site and substituted with what is known so far, so it may mention earlier
//! parameters. A parameter with no default becomes `unknown`, recorded as a
//! Top fill so the constraint check does not hold it against the site.
//! Existing bindings are never replaced.

use crate::def::{DefId, TypeParamInfo};
use crate::diagnostics::{DiagnosticKind, depth_limit};
use crate::instantiate::{TypeSubstitution, instantiate_type, open_template};
use crate::intern::TypeInterner;
use crate::types::{SiteId, TypeId, TypeVar};
use crate::visitor::collect_type_vars;
use tracing::trace;

pub fn resolve_defaults(
    interner: &TypeInterner,
    def: DefId,
    params: &[TypeParamInfo],
    site: SiteId,
    subst: &mut TypeSubstitution,
) -> Result<(), DiagnosticKind> {
    for param in params {
        let var = TypeVar {
            site,
            ordinal: param.ordinal,
            name: param.name,
        };
        if subst.contains(var) {
            continue;
        }
        let Some(default) = param.default else {
            trace!(def = def.0, ordinal = param.ordinal, "default to unknown");
            subst.insert_top(var);
            continue;
        };
        let opened = open_template(interner, default, def, site).map_err(depth_limit(def))?;
        let value = instantiate_type(interner, opened, subst).map_err(depth_limit(def))?;
        trace!(def = def.0, ordinal = param.ordinal, value = value.0, "default");
        subst.insert(var, value);
    }
    erase_leftover_vars(interner, def, subst)
}

/// Replace variables that are still free inside bindings with `unknown`.
///
/// Only a default that mentions a later parameter can leave one behind.
fn erase_leftover_vars(
    interner: &TypeInterner,
    def: DefId,
    subst: &mut TypeSubstitution,
) -> Result<(), DiagnosticKind> {
    let mut erasure = TypeSubstitution::new();
    for (_, bound) in subst.iter() {
        for var in collect_type_vars(interner, bound) {
            erasure.insert(var, TypeId::UNKNOWN);
        }
    }
    if erasure.is_empty() {
        return Ok(());
    }
    let mut erased = Vec::with_capacity(subst.len());
    for (var, bound) in subst.iter() {
        erased.push((var, instantiate_type(interner, bound, &erasure).map_err(depth_limit(def))?));
    }
    for (var, bound) in erased {
        subst.insert(var, bound);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/defaults_tests.rs"]
mod tests;

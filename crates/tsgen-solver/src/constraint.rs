//! Constraint validation for resolved bindings.
//!
//! A binding satisfies its parameter's constraint when it is a structural
//! subtype of it. Open object constraints accept any type carrying compatible
//! listed fields; a union of primitives accepts only members of those exact
//! primitive kinds.

use crate::def::{DefId, TypeParamInfo};
use crate::diagnostics::{DiagnosticKind, depth_limit};
use crate::instantiate::{DepthLimitExceeded, TypeSubstitution, instantiate_type, open_template};
use crate::intern::TypeInterner;
use crate::subtype::{SubtypeChecker, TypeResolver};
use crate::types::{SiteId, TypeId, TypeVar};
use crate::visitor::is_open_type;
use tracing::debug;

pub struct ConstraintChecker<'a, R: TypeResolver> {
    interner: &'a TypeInterner,
    resolver: &'a R,
}

impl<'a, R: TypeResolver> ConstraintChecker<'a, R> {
    pub fn new(interner: &'a TypeInterner, resolver: &'a R) -> Self {
        ConstraintChecker { interner, resolver }
    }

    /// Whether `bound` is a structural subtype of `constraint`.
    ///
    /// Fails instead of answering when the comparison runs out of depth.
    pub fn satisfies(&self, bound: TypeId, constraint: TypeId) -> Result<bool, DepthLimitExceeded> {
        if constraint == TypeId::UNKNOWN {
            return Ok(true);
        }
        let mut checker = SubtypeChecker::with_resolver(self.interner, self.resolver);
        if checker.is_subtype_of(bound, constraint) {
            return Ok(true);
        }
        match checker.limit_reached() {
            Some(depth) => Err(DepthLimitExceeded { depth }),
            None => Ok(false),
        }
    }

    /// Validate every constrained parameter of `def` at `site`.
    ///
    /// Constraints may mention other parameters, so each one is opened for the
    /// site and substituted first. Bindings that still mention a variable or
    /// parameter belong to an enclosing declaration and are checked there.
    /// Parameters the site left entirely undetermined (Top fills) are not
    /// checked. A comparison that runs out of depth reports the expansion limit.
    pub fn check_all(
        &self,
        def: DefId,
        params: &[TypeParamInfo],
        site: SiteId,
        subst: &TypeSubstitution,
    ) -> Result<(), DiagnosticKind> {
        for param in params {
            let Some(constraint) = param.constraint else {
                continue;
            };
            let var = TypeVar {
                site,
                ordinal: param.ordinal,
                name: param.name,
            };
            let Some(bound) = subst.get(var) else {
                continue;
            };
            if subst.is_top_fill(var) || is_open_type(self.interner, bound) {
                continue;
            }
            let constraint =
                open_template(self.interner, constraint, def, site).map_err(depth_limit(def))?;
            let constraint =
                instantiate_type(self.interner, constraint, subst).map_err(depth_limit(def))?;
            if !self.satisfies(bound, constraint).map_err(depth_limit(def))? {
                debug!(
                    def = def.0,
                    bound = bound.0,
                    constraint = constraint.0,
                    "constraint violated"
                );
                return Err(DiagnosticKind::ConstraintViolation {
                    declaration: def,
                    parameter: param.name,
                    bound,
                    constraint,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/constraint_tests.rs"]
mod tests;

//! Call-site type inference using Union-Find.
//!
//! The [`Unifier`] matches parameter templates (opened for one call site, so
//! they contain that site's `TypeVar`s) against actual argument types and
//! accumulates one binding per variable in an `ena` unification table.
//!
//! Key points:
//! - Every occurrence of a variable must agree. A second occurrence joins
//!   with the existing binding; see [`Unifier::join`].
//! - Inferred literals are widened to their primitive (`2` binds `number`),
//!   so inference and the equivalent explicit argument agree.
//! - Explicit type arguments are installed as *fixed* bindings. Later
//!   occurrences are checked against them instead of joined.
//! - Template unions match first-come-first-served. Each candidate member runs
//!   inside a table snapshot and is rolled back if it fails.

use crate::apparent::apparent_member;
use crate::def::DefId;
use crate::instantiate::TypeSubstitution;
use crate::intern::TypeInterner;
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::subtype::{SubtypeChecker, TypeResolver};
use crate::types::*;
use crate::visitor::{contains_type_vars, literal_value, primitive_kind, type_var, union_members};
use ena::unify::{InPlaceUnificationTable, NoError, UnifyKey, UnifyValue};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::Deserialize;
use tracing::{debug, trace, warn};
use tsgen_common::interner::Atom;

/// An inference variable: the table-side key of one site's `TypeVar`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct InferenceVar(pub u32);

/// Current binding of an inference variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VarBinding {
    pub type_id: TypeId,
    /// Supplied explicitly; later occurrences must be assignable to it.
    pub fixed: bool,
}

/// Wrapper for the binding to implement UnifyValue (avoiding orphan rule)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InferenceValue(pub Option<VarBinding>);

impl UnifyKey for InferenceVar {
    type Value = InferenceValue;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        InferenceVar(u)
    }

    fn tag() -> &'static str {
        "InferenceVar"
    }
}

impl UnifyValue for InferenceValue {
    type Error = NoError;

    /// Joins are computed before the table is touched, so the newer value wins.
    fn unify_values(a: &Self, b: &Self) -> Result<Self, Self::Error> {
        match (a.0, b.0) {
            (_, Some(binding)) => Ok(InferenceValue(Some(binding))),
            (existing, None) => Ok(InferenceValue(existing)),
        }
    }
}

/// What to do when two bindings of one variable are unrelated non-primitives.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinStrategy {
    /// Report a conflict naming both actual types.
    #[default]
    Fail,
    /// Bind the union of both sides. Primitives of different kinds still conflict.
    Union,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConflictKind {
    /// Two occurrences of a variable have no common type.
    Join,
    /// An actual type is not assignable to an explicitly supplied argument.
    FixedBinding,
    /// The actual type does not have the template's shape.
    Shape,
    MissingField(Atom),
    /// Field present on the actual type but not allowed by a closed template.
    ExtraField(Atom),
    /// Tuple or signature lengths differ.
    Arity,
    /// Matching or comparing nested deeper than the recursion limit.
    TooDeep { depth: u32 },
}

impl ConflictKind {
    /// Extra sentence appended to the rendered message; `{0}` is the actual
    /// type, `{1}` the expected one and `{2}` the field.
    pub fn detail(self) -> Option<&'static str> {
        match self {
            ConflictKind::Join => Some("No common type exists for '{1}' and '{0}'."),
            ConflictKind::MissingField(_) => Some("Property '{2}' is missing in type '{0}'."),
            ConflictKind::ExtraField(_) => {
                Some("Property '{2}' does not exist in closed type '{1}'.")
            }
            ConflictKind::Arity => {
                Some("Source and target have a different number of elements.")
            }
            ConflictKind::FixedBinding | ConflictKind::Shape | ConflictKind::TooDeep { .. } => None,
        }
    }
}

/// Why unification failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UnificationConflict {
    /// Variable whose binding failed, if the failure was at a variable.
    pub parameter: Option<Atom>,
    /// The existing binding or the template-side type.
    pub expected: TypeId,
    /// The actual type that did not fit.
    pub actual: TypeId,
    pub kind: ConflictKind,
}

impl UnificationConflict {
    fn shape(expected: TypeId, actual: TypeId, kind: ConflictKind) -> Self {
        UnificationConflict {
            parameter: None,
            expected,
            actual,
            kind,
        }
    }
}

pub type UnifyResult = Result<(), UnificationConflict>;

/// Structural matcher for one call site.
pub struct Unifier<'a, R: TypeResolver> {
    interner: &'a TypeInterner,
    resolver: &'a R,
    strategy: JoinStrategy,
    table: InPlaceUnificationTable<InferenceVar>,
    vars: IndexMap<TypeVar, InferenceVar, FxBuildHasher>,
    depth: DepthCounter,
    /// Set when a comparison gave up at its depth limit.
    limit_hit: Option<u32>,
}

impl<'a, R: TypeResolver> Unifier<'a, R> {
    pub fn new(interner: &'a TypeInterner, resolver: &'a R, strategy: JoinStrategy) -> Self {
        Unifier {
            interner,
            resolver,
            strategy,
            table: InPlaceUnificationTable::new(),
            vars: IndexMap::default(),
            depth: DepthCounter::with_profile(RecursionProfile::Instantiation),
            limit_hit: None,
        }
    }

    /// Make `var` solvable. Registering twice returns the same key.
    pub fn register(&mut self, var: TypeVar) -> InferenceVar {
        if let Some(&key) = self.vars.get(&var) {
            return key;
        }
        let key = self.table.new_key(InferenceValue(None));
        self.vars.insert(var, key);
        key
    }

    /// Install an explicitly supplied argument.
    pub fn fix(&mut self, var: TypeVar, type_id: TypeId) {
        let key = self.register(var);
        self.table.union_value(
            key,
            InferenceValue(Some(VarBinding {
                type_id,
                fixed: true,
            })),
        );
    }

    pub fn binding(&mut self, var: TypeVar) -> Option<TypeId> {
        let key = *self.vars.get(&var)?;
        self.table.probe_value(key).0.map(|binding| binding.type_id)
    }

    /// Bindings found so far, in registration order.
    pub fn substitution(&mut self) -> TypeSubstitution {
        let mut subst = TypeSubstitution::new();
        let vars: Vec<(TypeVar, InferenceVar)> =
            self.vars.iter().map(|(&var, &key)| (var, key)).collect();
        for (var, key) in vars {
            if let Some(binding) = self.table.probe_value(key).0 {
                subst.insert(var, binding.type_id);
            }
        }
        subst
    }

    /// Match `template` against `actual`, refining the bindings.
    pub fn unify(&mut self, template: TypeId, actual: TypeId) -> UnifyResult {
        if template == actual || actual.is_error() || template.is_error() {
            return Ok(());
        }
        if self.depth.depth() == 0 {
            self.limit_hit = None;
        }
        if !self.depth.enter() {
            let depth = self.depth.max_depth();
            warn!(
                template = template.0,
                actual = actual.0,
                depth,
                "unification exceeded depth limit"
            );
            self.limit_hit = Some(depth);
            return Err(UnificationConflict::shape(
                template,
                actual,
                ConflictKind::TooDeep { depth },
            ));
        }
        let result = self.unify_inner(template, actual).map_err(|conflict| {
            match (self.limit_hit, conflict.kind) {
                (_, ConflictKind::TooDeep { .. }) | (None, _) => conflict,
                (Some(depth), _) => UnificationConflict::shape(
                    template,
                    actual,
                    ConflictKind::TooDeep { depth },
                ),
            }
        });
        self.depth.leave();
        trace!(template = template.0, actual = actual.0, ok = result.is_ok(), "unify");
        result
    }

    fn unify_inner(&mut self, template: TypeId, actual: TypeId) -> UnifyResult {
        let interner = self.interner;
        if let Some(var) = type_var(interner, template) {
            if let Some(&key) = self.vars.get(&var) {
                return self.bind(key, var, actual);
            }
        }
        if !contains_type_vars(interner, template) {
            return self.compare(template, actual);
        }
        let (Some(t_data), Some(a_data)) = (interner.lookup(template), interner.lookup(actual))
        else {
            return Err(UnificationConflict::shape(template, actual, ConflictKind::Shape));
        };

        if let TypeData::Union(list) = t_data {
            return self.unify_union(&interner.type_list(list), template, actual);
        }
        if let (Some((t_def, t_args)), Some((a_def, a_args))) =
            (self.reference_args(&t_data), self.reference_args(&a_data))
        {
            if t_def == a_def {
                return self.unify_lists(&t_args, &a_args, template, actual);
            }
        }
        // A structural template sees through placeholders on the actual side.
        if !matches!(t_data, TypeData::Reference(..) | TypeData::Lazy(_)) {
            if let Some(expanded) = self.expand(&a_data) {
                return self.unify(template, expanded);
            }
        }
        if let TypeData::Union(list) = a_data {
            for &member in interner.type_list(list).iter() {
                self.unify(template, member)?;
            }
            return Ok(());
        }

        match (&t_data, &a_data) {
            (TypeData::Object(t_shape), TypeData::Object(a_shape)) => {
                self.unify_objects(*t_shape, *a_shape, template, actual)
            }
            (TypeData::Object(t_shape), _) => self.unify_apparent(*t_shape, template, actual),
            (TypeData::Tuple(t_list), TypeData::Tuple(a_list)) => {
                let t_elems = interner.type_list(*t_list);
                let a_elems = interner.type_list(*a_list);
                self.unify_lists(&t_elems, &a_elems, template, actual)
            }
            (TypeData::Function(t_fn), TypeData::Function(a_fn)) => {
                let t_fn = interner.function_shape(*t_fn);
                let a_fn = interner.function_shape(*a_fn);
                self.unify_lists(&t_fn.params, &a_fn.params, template, actual)?;
                self.unify(t_fn.return_type, a_fn.return_type)
            }
            _ => {
                if let Some(expanded) = self.expand(&t_data) {
                    return self.unify(expanded, actual);
                }
                if let Some(expanded) = self.expand(&a_data) {
                    return self.unify(template, expanded);
                }
                Err(UnificationConflict::shape(template, actual, ConflictKind::Shape))
            }
        }
    }

    fn bind(&mut self, key: InferenceVar, var: TypeVar, actual: TypeId) -> UnifyResult {
        let current = self.table.probe_value(key).0;
        if let Some(existing) = current.filter(|binding| binding.fixed) {
            return self.check_fixed(var, existing, actual);
        }
        let actual = widen_literals(self.interner, actual);
        let Some(existing) = current else {
            debug!(var = ?var, actual = actual.0, "bind");
            self.table.union_value(
                key,
                InferenceValue(Some(VarBinding {
                    type_id: actual,
                    fixed: false,
                })),
            );
            return Ok(());
        };

        let conflict = |kind| UnificationConflict {
            parameter: Some(var.name),
            expected: existing.type_id,
            actual,
            kind,
        };
        let Some(joined) = self.join(existing.type_id, actual) else {
            debug!(var = ?var, first = existing.type_id.0, second = actual.0, "join failed");
            return Err(conflict(ConflictKind::Join));
        };
        if joined != existing.type_id {
            self.table.union_value(
                key,
                InferenceValue(Some(VarBinding {
                    type_id: joined,
                    fixed: false,
                })),
            );
        }
        Ok(())
    }

    /// An explicitly supplied binding accepts any assignable actual, literals included.
    fn check_fixed(&mut self, var: TypeVar, existing: VarBinding, actual: TypeId) -> UnifyResult {
        if self.is_assignable(actual, existing.type_id) {
            Ok(())
        } else {
            Err(UnificationConflict {
                parameter: Some(var.name),
                expected: existing.type_id,
                actual,
                kind: ConflictKind::FixedBinding,
            })
        }
    }

    /// Common supertype of two bindings of one variable.
    ///
    /// - equal types join to themselves; `error` and `never` are identities
    /// - values of one primitive kind widen to that primitive
    /// - values of different primitive kinds never join
    /// - otherwise the supertype wins, and unrelated types are left to the
    ///   configured [`JoinStrategy`]
    pub fn join(&mut self, first: TypeId, second: TypeId) -> Option<TypeId> {
        if first == second {
            return Some(first);
        }
        if first.is_error() || first == TypeId::NEVER {
            return Some(second);
        }
        if second.is_error() || second == TypeId::NEVER {
            return Some(first);
        }
        let first_kind = primitive_kind(self.interner, first);
        let second_kind = primitive_kind(self.interner, second);
        if let (Some(a), Some(b)) = (first_kind, second_kind) {
            return (a == b).then_some(a);
        }
        if self.is_assignable(second, first) {
            return Some(first);
        }
        if self.is_assignable(first, second) {
            return Some(second);
        }
        if self.limit_hit.is_some() {
            return None;
        }
        match self.strategy {
            JoinStrategy::Fail => None,
            JoinStrategy::Union => Some(self.interner.union2(first, second)),
        }
    }

    /// Discharge actual members that already fit a concrete template member,
    /// then match what is left against the open members in order.
    fn unify_union(&mut self, t_members: &[TypeId], template: TypeId, actual: TypeId) -> UnifyResult {
        let interner = self.interner;
        let (open, concrete): (Vec<TypeId>, Vec<TypeId>) = t_members
            .iter()
            .copied()
            .partition(|&member| contains_type_vars(interner, member));

        let a_members = union_members(interner, actual).unwrap_or_else(|| vec![actual]);
        let mut remaining = Vec::with_capacity(a_members.len());
        for member in a_members {
            if !concrete.iter().any(|&c| self.is_assignable(member, c)) {
                remaining.push(member);
            }
        }
        if remaining.is_empty() {
            return Ok(());
        }
        let rest = interner.union(remaining);

        let mut first_error = None;
        for &candidate in &open {
            let snapshot = self.table.snapshot();
            match self.unify(candidate, rest) {
                Ok(()) => {
                    self.table.commit(snapshot);
                    self.limit_hit = None;
                    return Ok(());
                }
                // Committed bindings are never revisited; only this member's are undone.
                Err(conflict) => {
                    self.table.rollback_to(snapshot);
                    first_error.get_or_insert(conflict);
                }
            }
        }
        Err(first_error
            .unwrap_or_else(|| UnificationConflict::shape(template, rest, ConflictKind::Shape)))
    }

    fn unify_objects(
        &mut self,
        t_shape: ObjectShapeId,
        a_shape: ObjectShapeId,
        template: TypeId,
        actual: TypeId,
    ) -> UnifyResult {
        let t_shape = self.interner.object_shape(t_shape);
        let a_shape = self.interner.object_shape(a_shape);
        if !t_shape.open {
            if let Some(extra) = a_shape
                .properties
                .iter()
                .find(|prop| t_shape.property(prop.name).is_none())
            {
                return Err(UnificationConflict::shape(
                    template,
                    actual,
                    ConflictKind::ExtraField(extra.name),
                ));
            }
        }
        for t_prop in &t_shape.properties {
            let Some(a_prop) = a_shape.property(t_prop.name) else {
                return Err(UnificationConflict::shape(
                    template,
                    actual,
                    ConflictKind::MissingField(t_prop.name),
                ));
            };
            self.unify(t_prop.type_id, a_prop.type_id)?;
        }
        Ok(())
    }

    /// Open object template against a string, tuple or signature.
    fn unify_apparent(
        &mut self,
        t_shape: ObjectShapeId,
        template: TypeId,
        actual: TypeId,
    ) -> UnifyResult {
        let t_shape = self.interner.object_shape(t_shape);
        if !t_shape.open {
            return Err(UnificationConflict::shape(template, actual, ConflictKind::Shape));
        }
        for t_prop in &t_shape.properties {
            let Some(member) = apparent_member(self.interner, actual, t_prop.name) else {
                return Err(UnificationConflict::shape(
                    template,
                    actual,
                    ConflictKind::MissingField(t_prop.name),
                ));
            };
            self.unify(t_prop.type_id, member)?;
        }
        Ok(())
    }

    fn unify_lists(
        &mut self,
        templates: &[TypeId],
        actuals: &[TypeId],
        template: TypeId,
        actual: TypeId,
    ) -> UnifyResult {
        if templates.len() != actuals.len() {
            return Err(UnificationConflict::shape(template, actual, ConflictKind::Arity));
        }
        for (&t, &a) in templates.iter().zip(actuals) {
            self.unify(t, a)?;
        }
        Ok(())
    }

    /// Declaration and arguments of an applied reference or placeholder.
    fn reference_args(&self, data: &TypeData) -> Option<(DefId, Vec<TypeId>)> {
        match *data {
            TypeData::Reference(def, Some(args)) => {
                Some((def, self.interner.type_list(args).to_vec()))
            }
            TypeData::Lazy(app) => {
                let app = self.interner.type_application(app);
                Some((app.def, app.args.clone()))
            }
            _ => None,
        }
    }

    fn expand(&self, data: &TypeData) -> Option<TypeId> {
        match *data {
            TypeData::Lazy(app) => self.resolver.resolve_lazy(app, self.interner),
            TypeData::Reference(def, args) => {
                self.resolver.resolve_reference(def, args, self.interner)
            }
            _ => None,
        }
    }

    /// Concrete base case: the actual type must be assignable to the template.
    fn compare(&mut self, template: TypeId, actual: TypeId) -> UnifyResult {
        if self.is_assignable(actual, template) {
            Ok(())
        } else {
            Err(UnificationConflict::shape(template, actual, ConflictKind::Shape))
        }
    }

    fn is_assignable(&mut self, source: TypeId, target: TypeId) -> bool {
        let mut checker = SubtypeChecker::with_resolver(self.interner, self.resolver);
        if checker.is_subtype_of(source, target) {
            return true;
        }
        if let Some(depth) = checker.limit_reached() {
            self.limit_hit = Some(depth);
        }
        false
    }
}

/// Literal types, alone or as union members, replaced by their primitive.
fn widen_literals(interner: &TypeInterner, type_id: TypeId) -> TypeId {
    if let Some(members) = union_members(interner, type_id) {
        let widened: Vec<TypeId> = members
            .iter()
            .map(|&member| widen_literals(interner, member))
            .collect();
        return interner.union(widened);
    }
    match literal_value(interner, type_id) {
        Some(lit) => lit.primitive(),
        None => type_id,
    }
}

#[cfg(test)]
#[path = "../tests/infer_tests.rs"]
mod tests;

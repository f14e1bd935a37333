//! Structural subtype checking.
//!
//! This is the type comparator the engine delegates to for every
//! concrete-versus-concrete question: unification base cases, constraint
//! validation and joins.
//!
//! Recursive types are compared coinductively: if the pair `(source, target)`
//! is already being compared further up the stack, the nested question is
//! assumed to hold. Running out of depth or iterations is not a cycle: the
//! comparison fails and [`SubtypeChecker::limit_reached`] says so.
//!
//! Object semantics:
//! - An **open** target is a lower bound: the source needs at least the
//!   target's fields, each with a compatible type.
//! - A **closed** target additionally forbids fields the target does not list.

use crate::apparent::apparent_member;
use crate::def::DefId;
use crate::intern::TypeInterner;
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::types::*;
use crate::visitor::primitive_kind;
use tracing::{trace, warn};

/// Resolves placeholders the comparator cannot look through on its own.
pub trait TypeResolver {
    /// Expand an instantiation placeholder by one level.
    fn resolve_lazy(&self, app: TypeApplicationId, interner: &TypeInterner) -> Option<TypeId>;

    /// Expand a reference written in a template.
    fn resolve_reference(
        &self,
        def: DefId,
        args: Option<TypeListId>,
        interner: &TypeInterner,
    ) -> Option<TypeId>;
}

/// Resolver that leaves every placeholder opaque.
pub struct NoopResolver;

impl TypeResolver for NoopResolver {
    fn resolve_lazy(&self, _app: TypeApplicationId, _interner: &TypeInterner) -> Option<TypeId> {
        None
    }

    fn resolve_reference(
        &self,
        _def: DefId,
        _args: Option<TypeListId>,
        _interner: &TypeInterner,
    ) -> Option<TypeId> {
        None
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SubtypeResult {
    True,
    False,
    /// The pair was already under comparison; assumed to hold.
    CycleDetected,
    /// Gave up at the depth or iteration limit.
    DepthExceeded,
}

impl SubtypeResult {
    #[inline]
    pub fn is_true(self) -> bool {
        matches!(self, SubtypeResult::True | SubtypeResult::CycleDetected)
    }

    #[inline]
    fn from_bool(value: bool) -> Self {
        if value {
            SubtypeResult::True
        } else {
            SubtypeResult::False
        }
    }
}

pub struct SubtypeChecker<'a, R: TypeResolver> {
    pub(crate) interner: &'a TypeInterner,
    resolver: &'a R,
    guard: RecursionGuard<(TypeId, TypeId)>,
}

impl<'a> SubtypeChecker<'a, NoopResolver> {
    /// A checker that treats references and lazy placeholders as opaque.
    pub fn new(interner: &'a TypeInterner) -> Self {
        SubtypeChecker::with_resolver(interner, &NoopResolver)
    }
}

impl<'a, R: TypeResolver> SubtypeChecker<'a, R> {
    pub fn with_resolver(interner: &'a TypeInterner, resolver: &'a R) -> Self {
        SubtypeChecker {
            interner,
            resolver,
            guard: RecursionGuard::with_profile(RecursionProfile::SubtypeCheck),
        }
    }

    /// `source <: target`
    pub fn is_subtype_of(&mut self, source: TypeId, target: TypeId) -> bool {
        self.check_subtype(source, target).is_true()
    }

    /// The guard's depth limit, if any comparison so far gave up on it.
    pub fn limit_reached(&self) -> Option<u32> {
        self.guard.is_exceeded().then(|| self.guard.max_depth())
    }

    pub fn check_subtype(&mut self, source: TypeId, target: TypeId) -> SubtypeResult {
        if source == target {
            return SubtypeResult::True;
        }
        // Error types are compatible both ways so one failure is reported once.
        if source.is_error() || target.is_error() {
            return SubtypeResult::True;
        }
        if target == TypeId::UNKNOWN || source == TypeId::NEVER {
            return SubtypeResult::True;
        }

        let key = (source, target);
        match self.guard.enter(key) {
            RecursionResult::Entered => {}
            RecursionResult::Cycle => return SubtypeResult::CycleDetected,
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {
                warn!(
                    source = source.0,
                    target = target.0,
                    "subtype check exceeded its limits"
                );
                return SubtypeResult::DepthExceeded;
            }
        }
        let result = self.check_subtype_inner(source, target);
        self.guard.leave(key);
        trace!(source = source.0, target = target.0, ?result, "check_subtype");
        result
    }

    fn check_subtype_inner(&mut self, source: TypeId, target: TypeId) -> SubtypeResult {
        let interner = self.interner;
        let (Some(s_data), Some(t_data)) = (interner.lookup(source), interner.lookup(target))
        else {
            return SubtypeResult::False;
        };

        // Look through placeholders first, source before target.
        if let Some(expanded) = self.expand(&s_data) {
            return self.check_subtype(expanded, target);
        }
        if let Some(expanded) = self.expand(&t_data) {
            return self.check_subtype(source, expanded);
        }

        // A union source must fit entirely.
        if let TypeData::Union(list) = s_data {
            let members = interner.type_list(list);
            for &member in members.iter() {
                if !self.check_subtype(member, target).is_true() {
                    return SubtypeResult::False;
                }
            }
            return SubtypeResult::True;
        }
        if let TypeData::Union(list) = t_data {
            let members = interner.type_list(list);
            for &member in members.iter() {
                if self.check_subtype(source, member).is_true() {
                    return SubtypeResult::True;
                }
            }
            return SubtypeResult::False;
        }

        match (&s_data, &t_data) {
            // Literals belong to their primitive; primitives only to themselves.
            (TypeData::Literal(lit), TypeData::Intrinsic(_)) => {
                SubtypeResult::from_bool(lit.primitive() == target)
            }
            (TypeData::Tuple(s_list), TypeData::Tuple(t_list)) => {
                let s_elems = interner.type_list(*s_list);
                let t_elems = interner.type_list(*t_list);
                if s_elems.len() != t_elems.len() {
                    return SubtypeResult::False;
                }
                for (&s, &t) in s_elems.iter().zip(t_elems.iter()) {
                    if !self.check_subtype(s, t).is_true() {
                        return SubtypeResult::False;
                    }
                }
                SubtypeResult::True
            }
            (TypeData::Function(s_fn), TypeData::Function(t_fn)) => {
                self.check_function_subtype(*s_fn, *t_fn)
            }
            (TypeData::Object(s_shape), TypeData::Object(t_shape)) => {
                self.check_object_subtype(*s_shape, *t_shape)
            }
            (_, TypeData::Object(t_shape)) => self.check_apparent_subtype(source, *t_shape),
            _ => SubtypeResult::False,
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

    fn check_function_subtype(
        &mut self,
        source: FunctionShapeId,
        target: FunctionShapeId,
    ) -> SubtypeResult {
        let s_fn = self.interner.function_shape(source);
        let t_fn = self.interner.function_shape(target);
        // A function may ignore trailing parameters it is offered.
        if s_fn.params.len() > t_fn.params.len() {
            return SubtypeResult::False;
        }
        for (&s_param, &t_param) in s_fn.params.iter().zip(t_fn.params.iter()) {
            if !self.check_subtype(t_param, s_param).is_true() {
                return SubtypeResult::False;
            }
        }
        self.check_subtype(s_fn.return_type, t_fn.return_type)
    }

    fn check_object_subtype(
        &mut self,
        source: ObjectShapeId,
        target: ObjectShapeId,
    ) -> SubtypeResult {
        let s_shape = self.interner.object_shape(source);
        let t_shape = self.interner.object_shape(target);

        if !t_shape.open
            && s_shape
                .properties
                .iter()
                .any(|prop| t_shape.property(prop.name).is_none())
        {
            return SubtypeResult::False;
        }

        for t_prop in &t_shape.properties {
            let Some(s_prop) = s_shape.property(t_prop.name) else {
                return SubtypeResult::False;
            };
            if !self.check_subtype(s_prop.type_id, t_prop.type_id).is_true() {
                return SubtypeResult::False;
            }
        }
        SubtypeResult::True
    }

    /// Non-object source against an object target, through apparent members.
    fn check_apparent_subtype(&mut self, source: TypeId, target: ObjectShapeId) -> SubtypeResult {
        let t_shape = self.interner.object_shape(target);
        if !t_shape.open {
            return SubtypeResult::False;
        }
        // Primitives other than strings have no members at all.
        if primitive_kind(self.interner, source).is_some_and(|kind| kind != TypeId::STRING)
            && !t_shape.properties.is_empty()
        {
            return SubtypeResult::False;
        }
        for t_prop in &t_shape.properties {
            let Some(member) = apparent_member(self.interner, source, t_prop.name) else {
                return SubtypeResult::False;
            };
            if !self.check_subtype(member, t_prop.type_id).is_true() {
                return SubtypeResult::False;
            }
        }
        SubtypeResult::True
    }
}

/// `source <: target` with a resolver for placeholders.
pub fn is_subtype_of_with_resolver<R: TypeResolver>(
    interner: &TypeInterner,
    resolver: &R,
    source: TypeId,
    target: TypeId,
) -> bool {
    SubtypeChecker::with_resolver(interner, resolver).is_subtype_of(source, target)
}

/// `source <: target` with references treated as opaque.
pub fn is_subtype_of(interner: &TypeInterner, source: TypeId, target: TypeId) -> bool {
    SubtypeChecker::new(interner).is_subtype_of(source, target)
}

#[cfg(test)]
#[path = "../tests/subtype_tests.rs"]
mod tests;

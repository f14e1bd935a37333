//! Generic instantiation engine.
//!
//! Entry points:
//!
//! - [`InstantiationEngine::instantiate_reference`] for `Decl<A, B>`, `Decl<>`
//!   and bare `Decl`: validate the argument count, fill defaults, validate
//!   constraints, then expand the template.
//! - [`InstantiationEngine::instantiate_call`] for `f(a, b)` and `f<A>(a, b)`:
//!   open the signature for a fresh site, unify it against the actual
//!   arguments, then fill defaults and validate constraints as above.
//!
//! ## Recursive templates
//!
//! Expansion is keyed by the interned `(declaration, arguments)` application.
//! An application already being expanded further up the stack is not
//! expanded again; it becomes a `Lazy` placeholder that the comparator
//! resolves on demand. Templates that keep producing new applications
//! (`type Foo<T> = { inner: Foo<Foo<T>> }`) hit the depth limit instead and
//! fail with `RecursiveGenericExpansionLimit`.
//!
//! Every bookkeeping structure lives in the engine, so each worker thread
//! uses its own engine over the shared interner and declaration table.

use crate::bare_usage::{validate_argument_count, validate_bare_usage};
use crate::config::SolverConfig;
use crate::constraint::ConstraintChecker;
use crate::def::{DefId, DefinitionInfo, DefinitionStore};
use crate::defaults::resolve_defaults;
use crate::diagnostics::{DiagnosticKind, depth_limit};
use crate::infer::Unifier;
use crate::instantiate::{TypeSubstitution, instantiate_type, open_template};
use crate::intern::TypeInterner;
use crate::recursion::{RecursionGuard, RecursionResult};
use crate::subtype::TypeResolver;
use crate::types::*;
use crate::visitor::contains_type_matching;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use tracing::{debug, trace, warn};

/// Type arguments written at a reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeArguments {
    /// No angle brackets at all.
    Omitted,
    /// `<A, B>`; `<>` is an empty list.
    Explicit(Vec<TypeId>),
}

/// Result of instantiating a generic call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallInstantiation {
    /// One binding per declared type parameter, in declaration order.
    pub type_arguments: Vec<TypeId>,
    /// Concrete parameter types.
    pub params: Vec<TypeId>,
    /// Concrete result type, for the caller's assignment checks.
    pub result: TypeId,
}

pub struct InstantiationEngine<'a> {
    interner: &'a TypeInterner,
    defs: &'a DefinitionStore,
    config: SolverConfig,
    /// Applications being expanded on the current call stack.
    guard: RefCell<RecursionGuard<TypeApplicationId>>,
    cache: RefCell<FxHashMap<TypeApplicationId, TypeId>>,
}

impl<'a> InstantiationEngine<'a> {
    pub fn new(interner: &'a TypeInterner, defs: &'a DefinitionStore) -> Self {
        Self::with_config(interner, defs, SolverConfig::default())
    }

    pub fn with_config(
        interner: &'a TypeInterner,
        defs: &'a DefinitionStore,
        config: SolverConfig,
    ) -> Self {
        InstantiationEngine {
            interner,
            defs,
            config,
            guard: RefCell::new(RecursionGuard::with_profile(config.expansion_profile())),
            cache: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn interner(&self) -> &'a TypeInterner {
        self.interner
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Instantiate a named reference to `def`.
    ///
    /// Omitted arguments on a class or alias go through bare-usage validation.
    /// A generic function named without arguments stays an unexpanded
    /// reference; calls to it are inferred by [`instantiate_call`](Self::instantiate_call).
    pub fn instantiate_reference(
        &self,
        def: DefId,
        args: &TypeArguments,
    ) -> Result<TypeId, DiagnosticKind> {
        let Some(info) = self.defs.get(def) else {
            warn!(def = def.0, "reference to undeclared definition");
            return Ok(TypeId::ERROR);
        };
        let explicit: &[TypeId] = match args {
            TypeArguments::Omitted => {
                if !info.kind.requires_type_arguments() {
                    return Ok(self.interner.reference(def, None));
                }
                validate_bare_usage(def, &info)?;
                &[]
            }
            TypeArguments::Explicit(list) => {
                validate_argument_count(def, &info, list.len())?;
                list
            }
        };

        let site = self.interner.fresh_site();
        let vars = info.site_vars(site);
        let mut subst = TypeSubstitution::from_args(&vars, explicit);
        resolve_defaults(self.interner, def, &info.type_params, site, &mut subst)?;
        ConstraintChecker::new(self.interner, self).check_all(
            def,
            &info.type_params,
            site,
            &subst,
        )?;

        let args = bound_args(&vars, &subst);
        debug!(def = def.0, ?args, "instantiate_reference");
        self.expand_application(def, &info, args)
    }

    /// Instantiate a call to the generic function `def`.
    ///
    /// With `explicit` arguments the listed parameters are fixed and every
    /// actual argument is checked against them; otherwise they are inferred.
    pub fn instantiate_call(
        &self,
        def: DefId,
        explicit: Option<&[TypeId]>,
        args: &[TypeId],
    ) -> Result<CallInstantiation, DiagnosticKind> {
        let interner = self.interner;
        let Some(info) = self.defs.get(def) else {
            warn!(def = def.0, "call to undeclared definition");
            return Err(DiagnosticKind::NotCallable {
                declaration: def,
                template: TypeId::ERROR,
            });
        };
        let shape_id = match interner.lookup(info.template) {
            Some(TypeData::Function(shape_id)) if info.kind.is_callable() => shape_id,
            _ => {
                return Err(DiagnosticKind::NotCallable {
                    declaration: def,
                    template: info.template,
                });
            }
        };
        if let Some(explicit) = explicit {
            validate_argument_count(def, &info, explicit.len())?;
        }
        let shape = interner.function_shape(shape_id);
        if shape.params.len() != args.len() {
            return Err(DiagnosticKind::ArgumentCountMismatch {
                declaration: def,
                expected: shape.params.len(),
                got: args.len(),
            });
        }

        let site = interner.fresh_site();
        let vars = info.site_vars(site);
        let params = shape
            .params
            .iter()
            .map(|&param| open_template(interner, param, def, site))
            .collect::<Result<Vec<_>, _>>()
            .map_err(depth_limit(def))?;
        let result = open_template(interner, shape.return_type, def, site).map_err(depth_limit(def))?;

        let mut subst = {
            let mut unifier = Unifier::new(interner, self, self.config.join_strategy);
            for &var in &vars {
                unifier.register(var);
            }
            if let Some(explicit) = explicit {
                for (&var, &arg) in vars.iter().zip(explicit) {
                    unifier.fix(var, arg);
                }
            }
            for (&param, &arg) in params.iter().zip(args) {
                unifier
                    .unify(param, arg)
                    .map_err(|conflict| DiagnosticKind::from_conflict(def, conflict))?;
            }
            unifier.substitution()
        };
        resolve_defaults(interner, def, &info.type_params, site, &mut subst)?;
        ConstraintChecker::new(interner, self).check_all(def, &info.type_params, site, &subst)?;

        let concrete = |type_id: TypeId| -> Result<TypeId, DiagnosticKind> {
            let substituted = instantiate_type(interner, type_id, &subst).map_err(depth_limit(def))?;
            self.expand_type(substituted)
        };
        let params = params
            .iter()
            .map(|&param| concrete(param))
            .collect::<Result<Vec<_>, _>>()?;
        let result = concrete(result)?;
        let type_arguments = bound_args(&vars, &subst);
        debug!(def = def.0, ?type_arguments, result = result.0, "instantiate_call");
        Ok(CallInstantiation {
            type_arguments,
            params,
            result,
        })
    }

    /// Expand every generic reference inside `type_id`.
    ///
    /// `Lazy` placeholders are left alone; they resolve on demand.
    pub fn expand_type(&self, type_id: TypeId) -> Result<TypeId, DiagnosticKind> {
        let interner = self.interner;
        if !contains_type_matching(interner, type_id, |data| {
            matches!(data, TypeData::Reference(..))
        }) {
            return Ok(type_id);
        }
        let Some(data) = interner.lookup(type_id) else {
            return Ok(type_id);
        };
        let expanded = match data {
            TypeData::Reference(def, args) => {
                let args = match args {
                    Some(list) => TypeArguments::Explicit(self.expand_list(&interner.type_list(list))?),
                    None => TypeArguments::Omitted,
                };
                self.instantiate_reference(def, &args)?
            }
            TypeData::Object(shape_id) => {
                let shape = interner.object_shape(shape_id);
                let mut properties = Vec::with_capacity(shape.properties.len());
                for prop in &shape.properties {
                    properties.push(PropertyInfo::new(prop.name, self.expand_type(prop.type_id)?));
                }
                interner.object_with_openness(properties, shape.open)
            }
            TypeData::Tuple(list) => interner.tuple(self.expand_list(&interner.type_list(list))?),
            TypeData::Union(list) => interner.union(self.expand_list(&interner.type_list(list))?),
            TypeData::Function(shape_id) => {
                let shape = interner.function_shape(shape_id);
                let params = self.expand_list(&shape.params)?;
                let return_type = self.expand_type(shape.return_type)?;
                interner.function(params, return_type)
            }
            TypeData::Intrinsic(_)
            | TypeData::Error
            | TypeData::Literal(_)
            | TypeData::Lazy(_)
            | TypeData::TypeParameter(_)
            | TypeData::TypeVar(_) => type_id,
        };
        Ok(expanded)
    }

    fn expand_list(&self, items: &[TypeId]) -> Result<Vec<TypeId>, DiagnosticKind> {
        items.iter().map(|&item| self.expand_type(item)).collect()
    }

    /// Substitute `args` into the template of `def` and expand the result.
    fn expand_application(
        &self,
        def: DefId,
        info: &DefinitionInfo,
        args: Vec<TypeId>,
    ) -> Result<TypeId, DiagnosticKind> {
        let interner = self.interner;
        let app_id = interner.intern_application(TypeApplication {
            def,
            args: args.clone(),
        });
        if let Some(&cached) = self.cache.borrow().get(&app_id) {
            return Ok(cached);
        }

        let entered = {
            let mut guard = self.guard.borrow_mut();
            if guard.depth() == 0 {
                guard.reset();
            }
            guard.enter(app_id)
        };
        match entered {
            RecursionResult::Entered => {}
            RecursionResult::Cycle => {
                trace!(def = def.0, "self-referential application; deferring");
                return Ok(interner.lazy(def, args));
            }
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {
                let depth = self.guard.borrow().max_depth();
                warn!(def = def.0, depth, "generic expansion limit reached");
                return Err(DiagnosticKind::RecursiveGenericExpansionLimit {
                    declaration: def,
                    depth,
                });
            }
        }

        let site = interner.fresh_site();
        let subst = TypeSubstitution::from_args(&info.site_vars(site), &args);
        let result = open_template(interner, info.template, def, site)
            .and_then(|body| instantiate_type(interner, body, &subst))
            .map_err(depth_limit(def))
            .and_then(|body| self.expand_type(body));
        self.guard.borrow_mut().leave(app_id);

        let expanded = result?;
        self.cache.borrow_mut().insert(app_id, expanded);
        Ok(expanded)
    }
}

fn bound_args(vars: &[TypeVar], subst: &TypeSubstitution) -> Vec<TypeId> {
    vars.iter()
        .map(|&var| subst.get(var).unwrap_or(TypeId::UNKNOWN))
        .collect()
}

/// One level of expansion for the comparator. Failures and references that
/// expand to themselves stay opaque.
impl TypeResolver for InstantiationEngine<'_> {
    fn resolve_lazy(&self, app: TypeApplicationId, _interner: &TypeInterner) -> Option<TypeId> {
        let application = self.interner.type_application(app);
        let info = self.defs.get(application.def)?;
        let expanded = self
            .expand_application(application.def, &info, application.args.clone())
            .ok()?;
        (self.interner.lookup(expanded) != Some(TypeData::Lazy(app))).then_some(expanded)
    }

    fn resolve_reference(
        &self,
        def: DefId,
        args: Option<TypeListId>,
        _interner: &TypeInterner,
    ) -> Option<TypeId> {
        let type_args = match args {
            Some(list) => TypeArguments::Explicit(self.interner.type_list(list).to_vec()),
            None => TypeArguments::Omitted,
        };
        let expanded = self.instantiate_reference(def, &type_args).ok()?;
        (self.interner.lookup(expanded) != Some(TypeData::Reference(def, args)))
            .then_some(expanded)
    }
}

#[cfg(test)]
#[path = "../tests/application_tests.rs"]
mod tests;

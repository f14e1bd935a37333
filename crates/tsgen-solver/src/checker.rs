//! Checker session: declare everything, then instantiate every site.
//!
//! ## Phases
//!
//! 1. [`CheckerSession::declare`] takes `&mut self`: it reserves an id per
//!    declaration name, lowers parameters and templates, and validates member
//!    accesses inside templates.
//! 2. [`CheckerSession::check_sites`] and
//!    [`CheckerSession::check_sites_parallel`] take `&self`: the declaration
//!    table is read-only from here on, so sites may be checked on any number
//!    of threads. Each worker owns its own `InstantiationEngine`.
//!
//! A failing site yields a diagnostic and never affects its siblings.

use crate::application::{CallInstantiation, InstantiationEngine, TypeArguments};
use crate::capability::CapabilityChecker;
use crate::config::SolverConfig;
use crate::def::{DefId, DefinitionStore};
use crate::diagnostics::{DiagnosticKind, PendingDiagnostic};
use crate::format::TypeFormatter;
use crate::intern::TypeInterner;
use crate::lower::{TypeLowering, lower_declaration};
use crate::nodes::{CallNode, GenericDeclNode, Program, ReferenceNode, SiteNode};
use crate::types::TypeId;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};
use tsgen_common::Diagnostic;

/// What one site produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SiteOutcome {
    /// Concrete type of a reference site.
    Reference(TypeId),
    /// Concrete signature and result of a call site.
    Call(CallInstantiation),
    /// The site's diagnostic is in [`CheckReport::diagnostics`].
    Failed,
}

impl SiteOutcome {
    /// The type a caller would use: the reference type or the call result.
    pub fn result_type(&self) -> Option<TypeId> {
        match self {
            SiteOutcome::Reference(type_id) => Some(*type_id),
            SiteOutcome::Call(call) => Some(call.result),
            SiteOutcome::Failed => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct CheckReport {
    /// One entry per site, in input order.
    pub outcomes: Vec<SiteOutcome>,
    /// Diagnostics in site order.
    pub diagnostics: Vec<PendingDiagnostic>,
}

impl CheckReport {
    fn from_results(results: Vec<Result<SiteOutcome, PendingDiagnostic>>) -> Self {
        let mut report = CheckReport::default();
        for result in results {
            match result {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(diagnostic) => {
                    report.outcomes.push(SiteOutcome::Failed);
                    report.diagnostics.push(diagnostic);
                }
            }
        }
        report
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn codes(&self) -> Vec<u32> {
        self.diagnostics.iter().map(PendingDiagnostic::code).collect()
    }
}

#[derive(Default)]
pub struct CheckerSession {
    interner: TypeInterner,
    defs: DefinitionStore,
    config: SolverConfig,
}

impl CheckerSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SolverConfig) -> Self {
        CheckerSession {
            config,
            ..Self::default()
        }
    }

    pub fn interner(&self) -> &TypeInterner {
        &self.interner
    }

    pub fn defs(&self) -> &DefinitionStore {
        &self.defs
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// An engine over this session's tables.
    pub fn engine(&self) -> InstantiationEngine<'_> {
        InstantiationEngine::with_config(&self.interner, &self.defs, self.config)
    }

    pub fn lookup(&self, name: &str) -> Option<DefId> {
        self.defs.find_by_name(self.interner.intern_string(name))
    }

    /// Publish `decls` into the declaration table.
    ///
    /// Declarations may refer to each other in any order.
    pub fn declare(&mut self, decls: &[GenericDeclNode]) -> Vec<PendingDiagnostic> {
        let mut diagnostics = Vec::new();
        let ids: Vec<DefId> = decls
            .iter()
            .map(|decl| self.defs.reserve(self.interner.intern_string(&decl.name)))
            .collect();
        let mut published = Vec::with_capacity(decls.len());
        for (decl, &id) in decls.iter().zip(&ids) {
            let info = lower_declaration(&self.interner, &self.defs, id, decl, &mut diagnostics);
            let name = info.name;
            if self.defs.define(id, info) {
                published.push((decl, id));
            } else {
                warn!(def = id.0, "duplicate declaration ignored");
                diagnostics.push(PendingDiagnostic::new(
                    DiagnosticKind::DuplicateDeclaration { name },
                    decl.location.clone(),
                ));
            }
        }

        let engine = self.engine();
        let capabilities = CapabilityChecker::new(&self.interner, &self.defs, &engine);
        for (decl, id) in published {
            for access in &decl.member_accesses {
                let parameter = self.interner.intern_string(&access.parameter);
                let member = self.interner.intern_string(&access.member);
                if let Err(kind) = capabilities.check_member_access(id, parameter, member) {
                    diagnostics.push(PendingDiagnostic::new(kind, access.location.clone()));
                }
            }
        }
        info!(
            declarations = decls.len(),
            diagnostics = diagnostics.len(),
            "declarations published"
        );
        diagnostics
    }

    /// Instantiate every site on the current thread.
    pub fn check_sites(&self, sites: &[SiteNode]) -> CheckReport {
        let engine = self.engine();
        let results = sites
            .iter()
            .map(|site| self.check_site(&engine, site))
            .collect();
        CheckReport::from_results(results)
    }

    /// Instantiate every site on the rayon pool. Results keep input order.
    pub fn check_sites_parallel(&self, sites: &[SiteNode]) -> CheckReport {
        let results = sites
            .par_iter()
            .map_init(|| self.engine(), |engine, site| self.check_site(engine, site))
            .collect();
        CheckReport::from_results(results)
    }

    /// Declare the program's declarations, then check its sites.
    ///
    /// Declaration diagnostics come first.
    pub fn check_program(&mut self, program: &Program) -> CheckReport {
        let mut diagnostics = self.declare(&program.declarations);
        let mut report = self.check_sites(&program.sites);
        diagnostics.append(&mut report.diagnostics);
        report.diagnostics = diagnostics;
        report
    }

    pub fn formatter(&self) -> TypeFormatter<'_> {
        TypeFormatter::new(&self.interner).with_def_store(&self.defs)
    }

    pub fn format_type(&self, type_id: TypeId) -> String {
        self.formatter().format(type_id)
    }

    pub fn render(&self, diagnostic: &PendingDiagnostic) -> Diagnostic {
        diagnostic.render(&self.formatter())
    }

    fn check_site(
        &self,
        engine: &InstantiationEngine<'_>,
        site: &SiteNode,
    ) -> Result<SiteOutcome, PendingDiagnostic> {
        let outcome = match site {
            SiteNode::Reference(node) => self.check_reference(engine, node),
            SiteNode::Call(node) => self.check_call(engine, node),
        };
        outcome.map_err(|kind| {
            debug!(code = kind.code(), "site failed");
            PendingDiagnostic::new(kind, site.location().clone())
        })
    }

    fn check_reference(
        &self,
        engine: &InstantiationEngine<'_>,
        node: &ReferenceNode,
    ) -> Result<SiteOutcome, DiagnosticKind> {
        let lowering = TypeLowering::new(&self.interner, &self.defs);
        let def = lowering.resolve_name(self.interner.intern_string(&node.declaration))?;
        let args = match lowering.lower_arguments(&node.explicit_arguments)? {
            TypeArguments::Omitted => TypeArguments::Omitted,
            TypeArguments::Explicit(list) => TypeArguments::Explicit(expand_all(engine, &list)?),
        };
        engine
            .instantiate_reference(def, &args)
            .map(SiteOutcome::Reference)
    }

    fn check_call(
        &self,
        engine: &InstantiationEngine<'_>,
        node: &CallNode,
    ) -> Result<SiteOutcome, DiagnosticKind> {
        let lowering = TypeLowering::new(&self.interner, &self.defs);
        let def = lowering.resolve_name(self.interner.intern_string(&node.callee))?;
        let explicit = match lowering.lower_arguments(&node.explicit_arguments)? {
            TypeArguments::Omitted => None,
            TypeArguments::Explicit(list) => Some(expand_all(engine, &list)?),
        };
        let args = expand_all(engine, &lowering.lower_list(&node.argument_types)?)?;
        engine
            .instantiate_call(def, explicit.as_deref(), &args)
            .map(SiteOutcome::Call)
    }
}

fn expand_all(
    engine: &InstantiationEngine<'_>,
    types: &[TypeId],
) -> Result<Vec<TypeId>, DiagnosticKind> {
    types.iter().map(|&ty| engine.expand_type(ty)).collect()
}

pub fn parse_program(source: &str) -> Result<Program> {
    serde_json::from_str(source).context("failed to parse program JSON")
}

pub fn load_program(path: &Path) -> Result<Program> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read program: {}", path.display()))?;
    parse_program(&source).with_context(|| format!("failed to parse program: {}", path.display()))
}

#[cfg(test)]
#[path = "../tests/checker_tests.rs"]
mod tests;

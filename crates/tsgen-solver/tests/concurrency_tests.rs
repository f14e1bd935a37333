//! Sites checked on the rayon pool against one shared session.

use crate::checker::{CheckerSession, SiteOutcome};
use crate::def::DefKind;
use crate::nodes::*;
use crate::types::TypeId;
use rayon::prelude::*;
use tsgen_common::SourceLocation;

fn declarations() -> Vec<GenericDeclNode> {
    vec![
        GenericDeclNode::new(
            DefKind::Function,
            "identity",
            vec![TypeParamNode::new("T")],
            TypeExpr::Function {
                params: vec![TypeExpr::named("T")],
                result: Box::new(TypeExpr::named("T")),
            },
        ),
        GenericDeclNode::new(
            DefKind::TypeAlias,
            "List",
            vec![TypeParamNode::new("T")],
            TypeExpr::Object {
                fields: vec![
                    FieldNode {
                        name: "value".into(),
                        type_expr: TypeExpr::named("T"),
                    },
                    FieldNode {
                        name: "next".into(),
                        type_expr: TypeExpr::Union {
                            members: vec![
                                TypeExpr::applied("List", vec![TypeExpr::named("T")]),
                                TypeExpr::keyword("null"),
                            ],
                        },
                    },
                ],
                open: false,
            },
        ),
    ]
}

/// A mix of passing and failing sites.
fn sites(count: usize) -> Vec<SiteNode> {
    let keywords = ["number", "string", "boolean", "bigint"];
    (0..count)
        .map(|idx| {
            let location = SourceLocation::new("main.ts", idx as u32, 1);
            let keyword = TypeExpr::keyword(keywords[idx % keywords.len()]);
            match idx % 3 {
                0 => SiteNode::Call(CallNode {
                    callee: "identity".into(),
                    explicit_arguments: TypeArgumentList::Omitted,
                    argument_types: vec![keyword],
                    location,
                }),
                1 => SiteNode::Reference(ReferenceNode {
                    declaration: "List".into(),
                    explicit_arguments: TypeArgumentList::Explicit(vec![keyword]),
                    location,
                }),
                _ => SiteNode::Reference(ReferenceNode {
                    declaration: "List".into(),
                    explicit_arguments: TypeArgumentList::Omitted,
                    location,
                }),
            }
        })
        .collect()
}

#[test]
fn test_parallel_check_matches_sequential() {
    let mut session = CheckerSession::new();
    assert!(session.declare(&declarations()).is_empty());
    let sites = sites(300);

    let sequential = session.check_sites(&sites);
    let parallel = session.check_sites_parallel(&sites);

    assert_eq!(parallel.outcomes, sequential.outcomes);
    assert_eq!(parallel.diagnostics, sequential.diagnostics);
    assert_eq!(parallel.diagnostics.len(), 100);
    let starts: Vec<u32> = parallel.diagnostics.iter().map(|d| d.location.start).collect();
    let mut sorted = starts.clone();
    sorted.sort_unstable();
    assert_eq!(starts, sorted);
}

#[test]
fn test_sites_share_one_session_across_threads() {
    let mut session = CheckerSession::new();
    session.declare(&declarations());
    let session = &session;

    let results: Vec<Option<TypeId>> = (0..64)
        .into_par_iter()
        .map(|idx| {
            let keyword = if idx % 2 == 0 { "number" } else { "string" };
            let report = session.check_sites(&[SiteNode::Call(CallNode {
                callee: "identity".into(),
                explicit_arguments: TypeArgumentList::Omitted,
                argument_types: vec![TypeExpr::keyword(keyword)],
                location: SourceLocation::default(),
            })]);
            report.outcomes[0].result_type()
        })
        .collect();

    for (idx, result) in results.into_iter().enumerate() {
        let expected = if idx % 2 == 0 { TypeId::NUMBER } else { TypeId::STRING };
        assert_eq!(result, Some(expected));
    }
}

#[test]
fn test_parallel_outcomes_keep_input_order() {
    let mut session = CheckerSession::new();
    session.declare(&declarations());
    let sites = sites(12);
    let report = session.check_sites_parallel(&sites);
    for (idx, outcome) in report.outcomes.iter().enumerate() {
        match idx % 3 {
            0 => assert!(matches!(outcome, SiteOutcome::Call(_))),
            1 => assert!(matches!(outcome, SiteOutcome::Reference(_))),
            _ => assert_eq!(outcome, &SiteOutcome::Failed),
        }
    }
}

//! End-to-end behavior of generic declarations checked through a session.

use crate::checker::{CheckerSession, SiteOutcome};
use crate::def::DefKind;
use crate::diagnostics::{DiagnosticKind, codes};
use crate::infer::ConflictKind;
use crate::nodes::*;
use crate::types::TypeId;
use tsgen_common::SourceLocation;

fn obj(fields: &[(&str, TypeExpr)], open: bool) -> TypeExpr {
    TypeExpr::Object {
        fields: fields
            .iter()
            .map(|(name, type_expr)| FieldNode {
                name: (*name).into(),
                type_expr: type_expr.clone(),
            })
            .collect(),
        open,
    }
}

fn func(params: Vec<TypeExpr>, result: TypeExpr) -> TypeExpr {
    TypeExpr::Function {
        params,
        result: Box::new(result),
    }
}

fn kw(name: &str) -> TypeExpr {
    TypeExpr::keyword(name)
}

fn num(value: f64) -> TypeExpr {
    TypeExpr::Number { value }
}

fn call(callee: &str, explicit: TypeArgumentList, args: Vec<TypeExpr>) -> SiteNode {
    SiteNode::Call(CallNode {
        callee: callee.into(),
        explicit_arguments: explicit,
        argument_types: args,
        location: SourceLocation::default(),
    })
}

fn reference(declaration: &str, arguments: TypeArgumentList) -> SiteNode {
    SiteNode::Reference(ReferenceNode {
        declaration: declaration.into(),
        explicit_arguments: arguments,
        location: SourceLocation::default(),
    })
}

/// A session with the declarations used across these tests.
fn session() -> CheckerSession {
    tsgen_common::tracing_config::init_tracing();
    let mut session = CheckerSession::new();
    let decls = vec![
        GenericDeclNode::new(
            DefKind::Function,
            "identity",
            vec![TypeParamNode::new("T")],
            func(vec![TypeExpr::named("T")], TypeExpr::named("T")),
        ),
        GenericDeclNode::new(
            DefKind::Class,
            "Container",
            vec![TypeParamNode::new("T")],
            obj(&[("value", TypeExpr::named("T"))], false),
        ),
        GenericDeclNode::new(
            DefKind::TypeAlias,
            "Boxed",
            vec![TypeParamNode::new("T").with_default(kw("unknown"))],
            obj(&[("value", TypeExpr::named("T"))], false),
        ),
        GenericDeclNode::new(
            DefKind::Function,
            "length",
            vec![TypeParamNode::new("T").with_constraint(obj(&[("length", kw("number"))], true))],
            func(vec![TypeExpr::named("T")], kw("number")),
        ),
        GenericDeclNode::new(
            DefKind::Function,
            "plus",
            vec![TypeParamNode::new("T").with_constraint(TypeExpr::Union {
                members: vec![kw("number"), kw("bigint")],
            })],
            func(
                vec![TypeExpr::named("T"), TypeExpr::named("T")],
                TypeExpr::named("T"),
            ),
        ),
        GenericDeclNode::new(
            DefKind::Function,
            "unwrap",
            vec![TypeParamNode::new("T")],
            func(vec![obj(&[("value", TypeExpr::named("T"))], false)], TypeExpr::named("T")),
        ),
        // choose<T>(pick: { a: T, ... } | { b: T, ... }, other: T): T
        GenericDeclNode::new(
            DefKind::Function,
            "choose",
            vec![TypeParamNode::new("T")],
            func(
                vec![
                    TypeExpr::Union {
                        members: vec![
                            obj(&[("a", TypeExpr::named("T"))], true),
                            obj(&[("b", TypeExpr::named("T"))], true),
                        ],
                    },
                    TypeExpr::named("T"),
                ],
                TypeExpr::named("T"),
            ),
        ),
        GenericDeclNode::new(
            DefKind::Function,
            "unused",
            vec![TypeParamNode::new("T").with_constraint(kw("number"))],
            func(vec![kw("string")], kw("number")),
        ),
    ];
    let diagnostics = session.declare(&decls);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    session
}

fn single(session: &CheckerSession, site: SiteNode) -> Result<SiteOutcome, DiagnosticKind> {
    let mut report = session.check_sites(&[site]);
    match report.diagnostics.pop() {
        Some(diagnostic) => Err(diagnostic.kind),
        None => Ok(report.outcomes.remove(0)),
    }
}

fn result_of(session: &CheckerSession, site: SiteNode) -> TypeId {
    match single(session, site) {
        Ok(outcome) => outcome.result_type().expect("site produced a type"),
        Err(kind) => panic!("unexpected diagnostic: {kind:?}"),
    }
}

#[test]
fn test_inference_identity() {
    let session = session();
    let cases = [
        (num(2.0), TypeId::NUMBER),
        (TypeExpr::String { value: "2".into() }, TypeId::STRING),
        (TypeExpr::Boolean { value: false }, TypeId::BOOLEAN),
        (TypeExpr::BigInt { value: "2".into() }, TypeId::BIGINT),
        (kw("number"), TypeId::NUMBER),
        (kw("string"), TypeId::STRING),
    ];
    for (actual, expected) in cases {
        let result = result_of(&session, call("identity", TypeArgumentList::Omitted, vec![actual.clone()]));
        assert_eq!(result, expected, "identity({actual:?})");
    }

    let same = result_of(&session, call("plus", TypeArgumentList::Omitted, vec![num(1.0), num(1.0)]));
    let different = result_of(&session, call("plus", TypeArgumentList::Omitted, vec![num(1.0), num(2.0)]));
    assert_eq!(same, TypeId::NUMBER);
    assert_eq!(different, TypeId::NUMBER);
}

#[test]
fn test_explicit_override_matches_inference() {
    let session = session();
    let explicit = result_of(
        &session,
        call(
            "identity",
            TypeArgumentList::Explicit(vec![kw("number")]),
            vec![num(2.0)],
        ),
    );
    assert_eq!(explicit, TypeId::NUMBER);
    let inferred = result_of(&session, call("identity", TypeArgumentList::Omitted, vec![num(2.0)]));
    assert_eq!(inferred, explicit);
    let from_keyword = result_of(&session, call("identity", TypeArgumentList::Omitted, vec![kw("number")]));
    assert_eq!(from_keyword, explicit);

    let err = single(
        &session,
        call(
            "identity",
            TypeArgumentList::Explicit(vec![kw("string")]),
            vec![num(2.0)],
        ),
    )
    .unwrap_err();
    assert_eq!(err.code(), codes::UNIFICATION_CONFLICT);
}

#[test]
fn test_bare_usage_rejection() {
    let session = session();
    let err = single(&session, reference("Container", TypeArgumentList::Omitted)).unwrap_err();
    assert!(matches!(err, DiagnosticKind::MissingTypeArguments { required: 1, .. }));

    let ok = result_of(
        &session,
        reference("Container", TypeArgumentList::Explicit(vec![kw("number")])),
    );
    assert_eq!(session.format_type(ok), "{ value: number }");
}

#[test]
fn test_default_fill() {
    let session = session();
    let empty = result_of(&session, reference("Boxed", TypeArgumentList::Explicit(vec![])));
    let bare = result_of(&session, reference("Boxed", TypeArgumentList::Omitted));
    assert_eq!(empty, bare);
    assert_eq!(session.format_type(empty), "{ value: unknown }");
}

#[test]
fn test_constraint_acceptance_and_rejection() {
    let session = session();
    let array_like = obj(
        &[
            ("length", kw("number")),
            ("push", func(vec![kw("number")], kw("number"))),
        ],
        false,
    );
    let exact = obj(&[("length", num(4.0))], false);
    let callable = func(vec![], kw("number"));
    for actual in [array_like, exact, callable, kw("string"), TypeExpr::Tuple {
        elements: vec![kw("number")],
    }] {
        let result = result_of(&session, call("length", TypeArgumentList::Omitted, vec![actual]));
        assert_eq!(result, TypeId::NUMBER);
    }

    let set_like = obj(&[("size", kw("number"))], false);
    let err = single(&session, call("length", TypeArgumentList::Omitted, vec![set_like])).unwrap_err();
    assert_eq!(err.code(), codes::CONSTRAINT_VIOLATION);
}

#[test]
fn test_join_failure_across_occurrences() {
    let session = session();
    let err = single(
        &session,
        call("plus", TypeArgumentList::Omitted, vec![kw("number"), kw("bigint")]),
    )
    .unwrap_err();
    match err {
        DiagnosticKind::UnificationConflict { conflict, .. } => {
            assert_eq!(conflict.kind, ConflictKind::Join);
            assert_eq!(conflict.expected, TypeId::NUMBER);
            assert_eq!(conflict.actual, TypeId::BIGINT);
        }
        other => panic!("expected a unification conflict, got {other:?}"),
    }

    let err = single(
        &session,
        call("plus", TypeArgumentList::Omitted, vec![kw("string"), kw("string")]),
    )
    .unwrap_err();
    assert_eq!(err.code(), codes::CONSTRAINT_VIOLATION);

    let sum = result_of(
        &session,
        call("plus", TypeArgumentList::Omitted, vec![num(1.0), num(2.0)]),
    );
    assert_eq!(sum, TypeId::NUMBER);
}

#[test]
fn test_call_outcome_lists_bindings() {
    let session = session();
    match single(&session, call("plus", TypeArgumentList::Omitted, vec![kw("bigint"), kw("bigint")])) {
        Ok(SiteOutcome::Call(call)) => {
            assert_eq!(call.type_arguments, vec![TypeId::BIGINT]);
            assert_eq!(call.params, vec![TypeId::BIGINT, TypeId::BIGINT]);
            assert_eq!(call.result, TypeId::BIGINT);
        }
        other => panic!("expected a call outcome, got {other:?}"),
    }
}

#[test]
fn test_closed_object_template_rejects_extra_fields() {
    let session = session();
    let exact = obj(&[("value", kw("number"))], false);
    assert_eq!(
        result_of(&session, call("unwrap", TypeArgumentList::Omitted, vec![exact])),
        TypeId::NUMBER
    );

    let wider = obj(&[("value", kw("number")), ("label", kw("string"))], false);
    match single(&session, call("unwrap", TypeArgumentList::Omitted, vec![wider])) {
        Err(DiagnosticKind::UnificationConflict { conflict, .. }) => {
            assert_eq!(
                conflict.kind,
                ConflictKind::ExtraField(session.interner().intern_string("label"))
            );
        }
        other => panic!("expected an extra-field conflict, got {other:?}"),
    }
}

#[test]
fn test_union_template_commits_to_first_matching_member() {
    // The argument fits both members. Whichever member is tried first binds T,
    // and the later occurrence of T cannot move the choice to the other one.
    let session = session();
    let both = obj(&[("a", kw("string")), ("b", kw("number"))], false);
    let with_string = single(
        &session,
        call("choose", TypeArgumentList::Omitted, vec![both.clone(), kw("string")]),
    );
    let with_number = single(
        &session,
        call("choose", TypeArgumentList::Omitted, vec![both, kw("number")]),
    );

    let (committed, rejected) = match (with_string, with_number) {
        (Ok(outcome), Err(kind)) => ((outcome, TypeId::STRING), kind),
        (Err(kind), Ok(outcome)) => ((outcome, TypeId::NUMBER), kind),
        other => panic!("exactly one member can be committed, got {other:?}"),
    };
    assert_eq!(committed.0.result_type(), Some(committed.1));
    match rejected {
        DiagnosticKind::UnificationConflict { conflict, .. } => {
            assert_eq!(conflict.kind, ConflictKind::Join);
            assert_eq!(conflict.expected, committed.1);
        }
        other => panic!("expected a join conflict, got {other:?}"),
    }
}

#[test]
fn test_unreferenced_constrained_parameter_is_not_a_violation() {
    let session = session();
    match single(&session, call("unused", TypeArgumentList::Omitted, vec![kw("string")])) {
        Ok(SiteOutcome::Call(call)) => {
            assert_eq!(call.type_arguments, vec![TypeId::UNKNOWN]);
            assert_eq!(call.result, TypeId::NUMBER);
        }
        other => panic!("expected a call outcome, got {other:?}"),
    }

    // Explicit arguments are still checked, `unknown` included.
    for explicit in [kw("string"), kw("unknown")] {
        let err = single(
            &session,
            call("unused", TypeArgumentList::Explicit(vec![explicit]), vec![kw("string")]),
        )
        .unwrap_err();
        assert_eq!(err.code(), codes::CONSTRAINT_VIOLATION);
    }
}

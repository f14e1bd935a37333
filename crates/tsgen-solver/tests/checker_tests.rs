use super::*;
use crate::def::DefKind;
use crate::diagnostics::codes;
use crate::nodes::{FieldNode, MemberAccessNode, TypeArgumentList, TypeExpr, TypeParamNode};
use crate::types::PropertyInfo;
use std::io::Write;
use tsgen_common::SourceLocation;

fn identity_decl() -> GenericDeclNode {
    GenericDeclNode::new(
        DefKind::Function,
        "identity",
        vec![TypeParamNode::new("T")],
        TypeExpr::Function {
            params: vec![TypeExpr::named("T")],
            result: Box::new(TypeExpr::named("T")),
        },
    )
}

fn container_decl() -> GenericDeclNode {
    GenericDeclNode::new(
        DefKind::Class,
        "Container",
        vec![TypeParamNode::new("T")],
        TypeExpr::Object {
            fields: vec![FieldNode {
                name: "value".into(),
                type_expr: TypeExpr::named("T"),
            }],
            open: false,
        },
    )
}

fn call(callee: &str, args: Vec<TypeExpr>) -> SiteNode {
    SiteNode::Call(CallNode {
        callee: callee.into(),
        explicit_arguments: TypeArgumentList::Omitted,
        argument_types: args,
        location: SourceLocation::default(),
    })
}

fn reference(declaration: &str, arguments: TypeArgumentList, start: u32) -> SiteNode {
    SiteNode::Reference(ReferenceNode {
        declaration: declaration.into(),
        explicit_arguments: arguments,
        location: SourceLocation::new("main.ts", start, declaration.len() as u32),
    })
}

#[test]
fn test_declare_and_check_sites() {
    let mut session = CheckerSession::new();
    let diagnostics = session.declare(&[identity_decl(), container_decl()]);
    assert!(diagnostics.is_empty());
    assert_eq!(session.defs().len(), 2);
    assert!(session.lookup("identity").is_some());
    assert!(session.lookup("missing").is_none());

    let report = session.check_sites(&[
        call("identity", vec![TypeExpr::keyword("number")]),
        reference(
            "Container",
            TypeArgumentList::Explicit(vec![TypeExpr::keyword("string")]),
            0,
        ),
        reference("Container", TypeArgumentList::Omitted, 40),
    ]);

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.outcomes[0].result_type(), Some(TypeId::NUMBER));
    let value = session.interner().intern_string("value");
    assert_eq!(
        report.outcomes[1],
        SiteOutcome::Reference(
            session
                .interner()
                .object(vec![PropertyInfo::new(value, TypeId::STRING)])
        )
    );
    assert_eq!(report.outcomes[2], SiteOutcome::Failed);
    assert_eq!(report.codes(), vec![codes::MISSING_TYPE_ARGUMENTS]);
    assert_eq!(report.diagnostics[0].location.start, 40);
}

#[test]
fn test_duplicate_declaration_keeps_the_first() {
    let mut session = CheckerSession::new();
    let mut duplicate = GenericDeclNode::new(
        DefKind::Function,
        "identity",
        vec![],
        TypeExpr::Function {
            params: vec![TypeExpr::keyword("string")],
            result: Box::new(TypeExpr::keyword("string")),
        },
    );
    duplicate.location = SourceLocation::new("main.ts", 40, 8);

    let diagnostics = session.declare(&[identity_decl(), duplicate]);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind.code(), codes::DUPLICATE_DECLARATION);
    assert_eq!(diagnostics[0].location.start, 40);
    let rendered = session.render(&diagnostics[0]);
    assert_eq!(rendered.message_text, "Duplicate identifier 'identity'.");
    assert_eq!(rendered.code, 2300);

    assert_eq!(session.defs().len(), 1);
    let report = session.check_sites(&[call("identity", vec![TypeExpr::keyword("number")])]);
    assert_eq!(report.outcomes[0].result_type(), Some(TypeId::NUMBER));
}

#[test]
fn test_failed_site_does_not_affect_siblings() {
    let mut session = CheckerSession::new();
    session.declare(&[identity_decl()]);
    let report = session.check_sites(&[
        call("identity", vec![]),
        call("unknownFn", vec![TypeExpr::keyword("number")]),
        call("identity", vec![TypeExpr::keyword("string")]),
    ]);
    assert_eq!(
        report.codes(),
        vec![codes::ARGUMENT_COUNT_MISMATCH, codes::UNKNOWN_TYPE_NAME]
    );
    assert_eq!(report.outcomes[2].result_type(), Some(TypeId::STRING));
}

#[test]
fn test_member_access_validated_at_declaration() {
    let mut session = CheckerSession::new();
    let mut length_of = GenericDeclNode::new(
        DefKind::Function,
        "lengthOf",
        vec![TypeParamNode::new("T")],
        TypeExpr::Function {
            params: vec![TypeExpr::named("T")],
            result: Box::new(TypeExpr::keyword("number")),
        },
    );
    length_of.member_accesses.push(MemberAccessNode {
        parameter: "T".into(),
        member: "length".into(),
        location: SourceLocation::new("lib.ts", 55, 12),
    });

    let diagnostics = session.declare(&[length_of]);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code(), codes::UNRESOLVED_CAPABILITY_ACCESS);
    let rendered = session.render(&diagnostics[0]);
    assert_eq!(
        rendered.message_text,
        "Property 'length' does not exist on type 'T'."
    );
    assert_eq!(rendered.start, 55);
}

#[test]
fn test_explicit_arguments_are_expanded_before_instantiation() {
    let mut session = CheckerSession::new();
    session.declare(&[identity_decl(), container_decl()]);
    let report = session.check_sites(&[SiteNode::Call(CallNode {
        callee: "identity".into(),
        explicit_arguments: TypeArgumentList::Explicit(vec![TypeExpr::applied(
            "Container",
            vec![TypeExpr::keyword("number")],
        )]),
        argument_types: vec![TypeExpr::Object {
            fields: vec![FieldNode {
                name: "value".into(),
                type_expr: TypeExpr::Number { value: 1.0 },
            }],
            open: false,
        }],
        location: SourceLocation::default(),
    })]);

    assert!(!report.has_diagnostics(), "{:?}", report.diagnostics);
    let result = report.outcomes[0].result_type().unwrap();
    assert_eq!(session.format_type(result), "{ value: number }");
}

#[test]
fn test_check_program_orders_declaration_diagnostics_first() {
    let mut session = CheckerSession::new();
    let mut bad = identity_decl();
    bad.name = "bad".into();
    bad.parameters.push(TypeParamNode::new("T"));
    let program = Program {
        declarations: vec![identity_decl(), bad],
        sites: vec![call("identity", vec![])],
    };
    let report = session.check_program(&program);
    assert_eq!(
        report.codes(),
        vec![codes::DUPLICATE_TYPE_PARAMETER, codes::ARGUMENT_COUNT_MISMATCH]
    );
    assert_eq!(report.outcomes, vec![SiteOutcome::Failed]);
}

const PROGRAM: &str = r#"{
  "declarations": [
    {
      "kind": "function", "name": "identity",
      "parameters": [{ "name": "T" }],
      "template": { "kind": "function",
                    "params": [{ "kind": "reference", "name": "T" }],
                    "result": { "kind": "reference", "name": "T" } }
    },
    {
      "kind": "class", "name": "Container",
      "parameters": [{ "name": "T", "default": { "kind": "keyword", "name": "unknown" } }],
      "template": { "kind": "object",
                    "fields": [{ "name": "value", "type": { "kind": "reference", "name": "T" } }] },
      "location": { "file": "lib.ts", "start": 3, "length": 20 }
    }
  ],
  "sites": [
    { "site": "call", "callee": "identity",
      "explicitArguments": [{ "kind": "keyword", "name": "string" }],
      "argumentTypes": [{ "kind": "number", "value": 2 }],
      "location": { "file": "main.ts", "start": 0, "length": 11 } },
    { "site": "reference", "declaration": "Container", "explicitArguments": "<>" },
    { "site": "reference", "declaration": "Container" }
  ]
}"#;

#[test]
fn test_parse_program_json() {
    let program = parse_program(PROGRAM).unwrap();
    assert_eq!(program.declarations.len(), 2);
    assert_eq!(program.declarations[1].kind, DefKind::Class);
    match &program.sites[1] {
        SiteNode::Reference(node) => {
            assert_eq!(node.explicit_arguments, TypeArgumentList::Explicit(vec![]));
        }
        other => panic!("expected a reference site, got {other:?}"),
    }
    match &program.sites[2] {
        SiteNode::Reference(node) => {
            assert_eq!(node.explicit_arguments, TypeArgumentList::Omitted);
        }
        other => panic!("expected a reference site, got {other:?}"),
    }

    let mut session = CheckerSession::new();
    let report = session.check_program(&program);
    assert_eq!(report.codes(), vec![codes::UNIFICATION_CONFLICT]);
    let rendered = session.render(&report.diagnostics[0]);
    assert_eq!(rendered.file, "main.ts");
    assert_eq!(
        rendered.message_text,
        "Argument of type '2' is not assignable to parameter of type 'string'."
    );
    // `identity` was declared without a location.
    assert!(rendered.related_information.is_empty());

    let unknown_box = session.format_type(report.outcomes[1].result_type().unwrap());
    assert_eq!(unknown_box, "{ value: unknown }");
    assert_eq!(report.outcomes[1], report.outcomes[2]);
}

#[test]
fn test_parse_program_rejects_bad_argument_marker() {
    let source = r#"{ "sites": [{ "site": "reference", "declaration": "A", "explicitArguments": "<" }] }"#;
    let err = parse_program(source).unwrap_err();
    assert!(format!("{err:#}").contains("invalid type argument list"));
}

#[test]
fn test_load_program_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(PROGRAM.as_bytes()).unwrap();
    let program = load_program(file.path()).unwrap();
    assert_eq!(program.sites.len(), 3);

    let missing = file.path().with_extension("missing");
    assert!(load_program(&missing).is_err());
}

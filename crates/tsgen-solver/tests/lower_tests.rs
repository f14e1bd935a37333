use super::*;
use crate::def::DefKind;
use crate::nodes::{FieldNode, TypeParamNode};

fn field(name: &str, type_expr: TypeExpr) -> FieldNode {
    FieldNode {
        name: name.into(),
        type_expr,
    }
}

#[test]
fn test_lower_keywords_and_literals() {
    let interner = TypeInterner::new();
    let defs = DefinitionStore::new();
    let lowering = TypeLowering::new(&interner, &defs);

    assert_eq!(lowering.lower(&TypeExpr::keyword("number")), Ok(TypeId::NUMBER));
    assert_eq!(lowering.lower(&TypeExpr::keyword("any")), Ok(TypeId::UNKNOWN));
    assert_eq!(lowering.lower(&TypeExpr::keyword("never")), Ok(TypeId::NEVER));
    assert_eq!(
        lowering.lower(&TypeExpr::Number { value: 2.0 }),
        Ok(interner.literal_number(2.0))
    );
    assert_eq!(
        lowering.lower(&TypeExpr::BigInt { value: "10".into() }),
        Ok(interner.literal_bigint("10"))
    );
    assert_eq!(
        lowering.lower(&TypeExpr::keyword("Number")),
        Err(DiagnosticKind::UnknownTypeName {
            name: interner.intern_string("Number"),
        })
    );
}

#[test]
fn test_lower_structures() {
    let interner = TypeInterner::new();
    let defs = DefinitionStore::new();
    let lowering = TypeLowering::new(&interner, &defs);
    let length = interner.intern_string("length");

    let open = TypeExpr::Object {
        fields: vec![field("length", TypeExpr::keyword("number"))],
        open: true,
    };
    assert_eq!(
        lowering.lower(&open),
        Ok(interner.open_object(vec![PropertyInfo::new(length, TypeId::NUMBER)]))
    );

    let mapper = TypeExpr::Function {
        params: vec![TypeExpr::keyword("string")],
        result: Box::new(TypeExpr::Tuple {
            elements: vec![TypeExpr::keyword("number"), TypeExpr::keyword("boolean")],
        }),
    };
    assert_eq!(
        lowering.lower(&mapper),
        Ok(interner.function(
            vec![TypeId::STRING],
            interner.tuple(vec![TypeId::NUMBER, TypeId::BOOLEAN])
        ))
    );

    let nullable = TypeExpr::Union {
        members: vec![TypeExpr::keyword("string"), TypeExpr::keyword("null")],
    };
    assert_eq!(
        lowering.lower(&nullable),
        Ok(interner.union2(TypeId::STRING, TypeId::NULL))
    );
}

#[test]
fn test_names_resolve_to_scope_then_declarations() {
    let interner = TypeInterner::new();
    let defs = DefinitionStore::new();
    let owner = defs.reserve(interner.intern_string("Owner"));
    let container = defs.reserve(interner.intern_string("Container"));
    let t = interner.intern_string("T");
    let lowering = TypeLowering::new(&interner, &defs).with_type_params(owner, &[t]);

    assert_eq!(
        lowering.lower(&TypeExpr::named("T")),
        Ok(interner.type_param(owner, t, 0))
    );
    assert_eq!(
        lowering.lower(&TypeExpr::named("Container")),
        Ok(interner.reference(container, None))
    );
    assert_eq!(
        lowering.lower(&TypeExpr::applied("Container", vec![TypeExpr::named("T")])),
        Ok(interner.reference(container, Some(vec![interner.type_param(owner, t, 0)])))
    );
    assert!(lowering.lower(&TypeExpr::named("Missing")).is_err());
}

#[test]
fn test_lower_arguments_keeps_omitted_and_empty_apart() {
    let interner = TypeInterner::new();
    let defs = DefinitionStore::new();
    let lowering = TypeLowering::new(&interner, &defs);

    assert_eq!(
        lowering.lower_arguments(&TypeArgumentList::Omitted),
        Ok(TypeArguments::Omitted)
    );
    assert_eq!(
        lowering.lower_arguments(&TypeArgumentList::Explicit(vec![])),
        Ok(TypeArguments::Explicit(vec![]))
    );
}

#[test]
fn test_lower_declaration() {
    let interner = TypeInterner::new();
    let defs = DefinitionStore::new();
    let node = GenericDeclNode::new(
        DefKind::TypeAlias,
        "Pair",
        vec![
            TypeParamNode::new("A"),
            TypeParamNode::new("B").with_default(TypeExpr::named("A")),
        ],
        TypeExpr::Tuple {
            elements: vec![TypeExpr::named("A"), TypeExpr::named("B")],
        },
    );
    let id = defs.reserve(interner.intern_string("Pair"));
    let mut diagnostics = Vec::new();
    let info = lower_declaration(&interner, &defs, id, &node, &mut diagnostics);

    assert!(diagnostics.is_empty());
    assert_eq!(info.kind, DefKind::TypeAlias);
    assert_eq!(info.type_params.len(), 2);
    let a = interner.type_param(id, interner.intern_string("A"), 0);
    let b = interner.type_param(id, interner.intern_string("B"), 1);
    assert_eq!(info.type_params[1].default, Some(a));
    assert_eq!(info.template, interner.tuple(vec![a, b]));
    assert_eq!(info.required_param_count(), 1);
}

#[test]
fn test_lower_declaration_reports_and_continues() {
    let interner = TypeInterner::new();
    let defs = DefinitionStore::new();
    let node = GenericDeclNode {
        location: SourceLocation::new("decl.ts", 0, 30),
        ..GenericDeclNode::new(
            DefKind::Function,
            "broken",
            vec![
                TypeParamNode::new("T"),
                TypeParamNode::new("T"),
                TypeParamNode::new("U").with_constraint(TypeExpr::named("Nope")),
            ],
            TypeExpr::Function {
                params: vec![TypeExpr::named("T")],
                result: Box::new(TypeExpr::named("T")),
            },
        )
    };
    let id = defs.reserve(interner.intern_string("broken"));
    let mut diagnostics = Vec::new();
    let info = lower_declaration(&interner, &defs, id, &node, &mut diagnostics);

    let codes: Vec<u32> = diagnostics.iter().map(PendingDiagnostic::code).collect();
    assert_eq!(codes, vec![2300, 2304]);
    // Parameters without their own location fall back to the declaration's.
    assert_eq!(&*diagnostics[0].location.file, "decl.ts");
    assert_eq!(info.type_params[2].constraint, Some(TypeId::ERROR));
    // The first `T` wins in scope.
    let t = interner.type_param(id, interner.intern_string("T"), 0);
    assert_eq!(info.template, interner.function(vec![t], t));
}

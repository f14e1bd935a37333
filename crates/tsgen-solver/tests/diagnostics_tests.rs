use super::*;
use crate::def::{DefKind, DefinitionInfo, DefinitionStore, TypeParamInfo};
use crate::intern::TypeInterner;
use crate::types::PropertyInfo;

fn container(interner: &TypeInterner, defs: &DefinitionStore) -> DefId {
    let name = interner.intern_string("Container");
    let t = interner.intern_string("T");
    let param = TypeParamInfo {
        name: t,
        ordinal: 0,
        constraint: None,
        default: None,
    };
    let id = defs.reserve(name);
    let template = interner.object(vec![PropertyInfo::new(
        interner.intern_string("value"),
        interner.type_param(id, t, 0),
    )]);
    defs.define(
        id,
        DefinitionInfo::new(DefKind::Class, name, vec![param], template)
            .with_location(SourceLocation::new("lib.ts", 10, 9)),
    );
    id
}

#[test]
fn test_codes_are_stable() {
    let interner = TypeInterner::new();
    let def = DefId(1);
    let name = interner.intern_string("T");
    let cases = [
        (
            DiagnosticKind::MissingTypeArguments {
                declaration: def,
                parameters: vec![name],
                required: 1,
            },
            2314,
        ),
        (
            DiagnosticKind::TooManyTypeArguments {
                declaration: def,
                expected: 1,
                got: 2,
            },
            2558,
        ),
        (
            DiagnosticKind::ConstraintViolation {
                declaration: def,
                parameter: name,
                bound: TypeId::STRING,
                constraint: TypeId::NUMBER,
            },
            2344,
        ),
        (
            DiagnosticKind::RecursiveGenericExpansionLimit {
                declaration: def,
                depth: 50,
            },
            2589,
        ),
        (DiagnosticKind::UnknownTypeName { name }, 2304),
        (DiagnosticKind::DuplicateDeclaration { name }, 2300),
    ];
    for (kind, code) in cases {
        assert_eq!(kind.code(), code, "{kind:?}");
    }
    assert_eq!(codes::UNIFICATION_CONFLICT, 2345);
    assert_eq!(codes::UNRESOLVED_CAPABILITY_ACCESS, 2339);
}

#[test]
fn test_render_missing_type_arguments_names_parameters() {
    let interner = TypeInterner::new();
    let defs = DefinitionStore::new();
    let def = container(&interner, &defs);
    let pending = PendingDiagnostic::new(
        DiagnosticKind::MissingTypeArguments {
            declaration: def,
            parameters: vec![interner.intern_string("T")],
            required: 1,
        },
        SourceLocation::new("main.ts", 42, 9),
    );

    let formatter = TypeFormatter::new(&interner).with_def_store(&defs);
    let rendered = pending.render(&formatter);
    assert_eq!(rendered.code, 2314);
    assert_eq!(rendered.file, "main.ts");
    assert_eq!((rendered.start, rendered.length), (42, 9));
    assert_eq!(
        rendered.message_text,
        "Generic type 'Container<T>' requires 1 type argument(s)."
    );
    assert_eq!(rendered.related_information.len(), 1);
    let related = &rendered.related_information[0];
    assert_eq!(related.file, "lib.ts");
    assert_eq!(related.start, 10);
    assert_eq!(related.message_text, "'Container' is declared here.");
}

#[test]
fn test_render_unification_conflict_appends_detail() {
    let interner = TypeInterner::new();
    let kind = DiagnosticKind::UnificationConflict {
        declaration: DefId(7),
        conflict: UnificationConflict {
            parameter: Some(interner.intern_string("T")),
            expected: TypeId::NUMBER,
            actual: TypeId::BIGINT,
            kind: ConflictKind::Join,
        },
    };
    let rendered = PendingDiagnostic::new(kind, SourceLocation::default())
        .render(&TypeFormatter::new(&interner));
    assert_eq!(
        rendered.message_text,
        "Argument of type 'bigint' is not assignable to parameter of type 'number'. \
         No common type exists for 'number' and 'bigint'."
    );
    // No store, so no declaring location to point at.
    assert!(rendered.related_information.is_empty());
}

#[test]
fn test_conflicts_past_the_limit_become_expansion_errors() {
    let conflict = |kind| UnificationConflict {
        parameter: None,
        expected: TypeId::NUMBER,
        actual: TypeId::STRING,
        kind,
    };
    assert_eq!(
        DiagnosticKind::from_conflict(DefId(4), conflict(ConflictKind::TooDeep { depth: 100 })),
        DiagnosticKind::RecursiveGenericExpansionLimit {
            declaration: DefId(4),
            depth: 100,
        }
    );
    assert_eq!(
        DiagnosticKind::from_conflict(DefId(4), conflict(ConflictKind::Join)).code(),
        codes::UNIFICATION_CONFLICT
    );
}

#[test]
fn test_render_capability_access() {
    let interner = TypeInterner::new();
    let kind = DiagnosticKind::UnresolvedCapabilityAccess {
        declaration: DefId(1),
        parameter: interner.intern_string("T"),
        member: interner.intern_string("length"),
        constraint: TypeId::UNKNOWN,
    };
    let pending = PendingDiagnostic::new(kind, SourceLocation::default());
    assert_eq!(pending.involved_types(), vec![TypeId::UNKNOWN]);
    let rendered = pending.render(&TypeFormatter::new(&interner));
    assert_eq!(
        rendered.message_text,
        "Property 'length' does not exist on type 'T'."
    );
}

#[test]
fn test_involved_types_put_offender_first() {
    let kind = DiagnosticKind::ConstraintViolation {
        declaration: DefId(1),
        parameter: Atom::default(),
        bound: TypeId::STRING,
        constraint: TypeId::NUMBER,
    };
    assert_eq!(kind.involved_types(), vec![TypeId::STRING, TypeId::NUMBER]);
    assert_eq!(kind.declaration(), Some(DefId(1)));

    let unknown = DiagnosticKind::UnknownTypeName {
        name: Atom::default(),
    };
    assert!(unknown.involved_types().is_empty());
    assert_eq!(unknown.declaration(), None);
}

use super::*;
use crate::subtype::NoopResolver;
use crate::types::PropertyInfo;
use tsgen_common::interner::Atom;

fn param(ordinal: u32, name: Atom, constraint: Option<TypeId>) -> TypeParamInfo {
    TypeParamInfo {
        name,
        ordinal,
        constraint,
        default: None,
    }
}

#[test]
fn test_open_object_constraint() {
    let interner = TypeInterner::new();
    let checker = ConstraintChecker::new(&interner, &NoopResolver);
    let length = interner.intern_string("length");
    let has_length = interner.open_object(vec![PropertyInfo::new(length, TypeId::NUMBER)]);

    let array_like = interner.object(vec![
        PropertyInfo::new(length, TypeId::NUMBER),
        PropertyInfo::new(
            interner.intern_string("push"),
            interner.function(vec![TypeId::NUMBER], TypeId::NUMBER),
        ),
    ]);
    let set_like = interner.object(vec![PropertyInfo::new(
        interner.intern_string("size"),
        TypeId::NUMBER,
    )]);

    assert!(checker.satisfies(array_like, has_length).unwrap());
    assert!(checker.satisfies(interner.function(vec![], TypeId::NUMBER), has_length).unwrap());
    assert!(checker.satisfies(TypeId::STRING, has_length).unwrap());
    assert!(!checker.satisfies(set_like, has_length).unwrap());
    assert!(!checker.satisfies(TypeId::NUMBER, has_length).unwrap());
}

#[test]
fn test_primitive_union_constraint_is_exact() {
    let interner = TypeInterner::new();
    let checker = ConstraintChecker::new(&interner, &NoopResolver);
    let numeric = interner.union2(TypeId::NUMBER, TypeId::BIGINT);

    assert!(checker.satisfies(TypeId::NUMBER, numeric).unwrap());
    assert!(checker.satisfies(interner.literal_bigint("7"), numeric).unwrap());
    assert!(!checker.satisfies(TypeId::STRING, numeric).unwrap());
    assert!(!checker.satisfies(TypeId::BOOLEAN, numeric).unwrap());
    assert!(checker.satisfies(TypeId::STRING, TypeId::UNKNOWN).unwrap());
}

#[test]
fn test_check_all_reports_first_violation() {
    let interner = TypeInterner::new();
    let checker = ConstraintChecker::new(&interner, &NoopResolver);
    let def = DefId(1);
    let site = interner.fresh_site();
    let t = interner.intern_string("T");
    let numeric = interner.union2(TypeId::NUMBER, TypeId::BIGINT);
    let params = vec![param(0, t, Some(numeric))];
    let var = TypeVar {
        site,
        ordinal: 0,
        name: t,
    };

    let ok = TypeSubstitution::from_args(&[var], &[TypeId::NUMBER]);
    assert!(checker.check_all(def, &params, site, &ok).is_ok());

    let bad = TypeSubstitution::from_args(&[var], &[TypeId::STRING]);
    assert_eq!(
        checker.check_all(def, &params, site, &bad),
        Err(DiagnosticKind::ConstraintViolation {
            declaration: def,
            parameter: t,
            bound: TypeId::STRING,
            constraint: numeric,
        })
    );
}

#[test]
fn test_constraint_referencing_earlier_parameter() {
    // <T, U: T>
    let interner = TypeInterner::new();
    let checker = ConstraintChecker::new(&interner, &NoopResolver);
    let def = DefId(3);
    let site = interner.fresh_site();
    let t = interner.intern_string("T");
    let u = interner.intern_string("U");
    let t_param = interner.type_param(def, t, 0);
    let params = vec![param(0, t, None), param(1, u, Some(t_param))];
    let vars = [
        TypeVar {
            site,
            ordinal: 0,
            name: t,
        },
        TypeVar {
            site,
            ordinal: 1,
            name: u,
        },
    ];

    let narrower = TypeSubstitution::from_args(&vars, &[TypeId::NUMBER, interner.literal_number(1.0)]);
    assert!(checker.check_all(def, &params, site, &narrower).is_ok());

    let unrelated = TypeSubstitution::from_args(&vars, &[TypeId::NUMBER, TypeId::STRING]);
    let err = checker.check_all(def, &params, site, &unrelated).unwrap_err();
    assert!(matches!(
        err,
        DiagnosticKind::ConstraintViolation { constraint, .. } if constraint == TypeId::NUMBER
    ));
}

#[test]
fn test_open_bindings_are_deferred() {
    let interner = TypeInterner::new();
    let checker = ConstraintChecker::new(&interner, &NoopResolver);
    let def = DefId(1);
    let outer = DefId(2);
    let site = interner.fresh_site();
    let t = interner.intern_string("T");
    let params = vec![param(0, t, Some(TypeId::NUMBER))];
    let var = TypeVar {
        site,
        ordinal: 0,
        name: t,
    };
    let enclosing_param = interner.type_param(outer, interner.intern_string("X"), 0);

    let subst = TypeSubstitution::from_args(&[var], &[enclosing_param]);
    assert!(checker.check_all(def, &params, site, &subst).is_ok());
}

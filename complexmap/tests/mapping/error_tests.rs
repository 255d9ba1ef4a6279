use super::support::*;

fn failure(err: MappingError) -> CompileFailure {
    match err {
        MappingError::CannotCompile(err) => err.reason,
        other => panic!("expected a compile error, got {other:?}"),
    }
}

#[test]
fn unconstructible_target_cannot_compile() {
    init_logging();
    let mapper = Mapper::default();
    let err = mapper.bundle::<Customer, Sealed>("").err().unwrap();
    assert_eq!(
        failure(err),
        CompileFailure::NotConstructible {
            type_name: "Sealed".to_string()
        }
    );
}

#[test]
fn defaulted_field_without_default_cannot_compile() {
    let mapper = Mapper::default();
    let err = mapper.materialize::<Customer, SecretRow>(&linz(), "").err().unwrap();
    assert_eq!(
        failure(err),
        CompileFailure::NoDefault {
            type_name: "SecretRow".to_string(),
            field: "token".to_string(),
        }
    );
}

#[test]
fn unknown_qualified_source_field_cannot_compile() {
    let mapper = Mapper::default();
    let err = mapper.bundle::<Customer, ZipRow>("").err().unwrap();
    let message = err.to_string();
    assert_eq!(
        failure(err),
        CompileFailure::UnknownSourceField {
            owner: "ZipRow".to_string(),
            field: "zip".to_string(),
            source_type: "Address".to_string(),
            source_field: "zip".to_string(),
        }
    );
    assert!(message.contains("Customer -> ZipRow"));
}

#[test]
fn mismatched_value_types_cannot_compile() {
    let mapper = Mapper::default();
    let err = mapper.bundle::<Customer, MistypedRow>("").err().unwrap();
    match failure(err) {
        CompileFailure::TypeMismatch {
            target,
            target_value,
            path,
            source_value,
        } => {
            assert_eq!(target, "MistypedRow.id");
            assert_eq!(target_value, "String");
            assert_eq!(path, "Customer.id");
            assert_eq!(source_value, "u64");
        }
        other => panic!("unexpected failure {other:?}"),
    }
}

#[test]
fn failures_are_cached_per_triple() {
    let mapper = Mapper::default();
    let first = mapper.bundle::<Customer, Sealed>("").err().unwrap().to_string();
    let second = mapper.bundle::<Customer, Sealed>("").err().unwrap().to_string();
    assert_eq!(first, second);

    let stats = mapper.stats();
    assert_eq!(stats.bundles, 1);
    assert_eq!(stats.bundle_syntheses, 1);

    mapper.bundle::<Customer, Sealed>("admin").err().unwrap();
    assert_eq!(mapper.stats().bundle_syntheses, 2);
}

#[test]
fn absent_source_skips_compilation() {
    let mapper = Mapper::default();
    let row = mapper.materialize::<Customer, Sealed>(None::<&Customer>, "").unwrap();
    assert!(row.is_none());
    assert_eq!(mapper.stats().bundle_syntheses, 0);
}

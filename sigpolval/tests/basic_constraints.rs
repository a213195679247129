mod utils;

use sigpolval::*;
use utils::*;

#[test]
fn path_length_from_root() {
    let r = root("Root").basic_constraints(true, Some(1)).build();
    let c1 = ca("CA1", "Root").build();
    let c2 = ca("CA2", "CA1").build();
    let e = ee("EE", "CA2").build();

    assert!(check_basic_constraints(&path(&[&e, &c1, &r])).is_ok());
    assert_eq!(
        Err(Error::PolicyValidation(
            PolicyValidationStatus::InvalidPathLength
        )),
        check_basic_constraints(&path(&[&e, &c2, &c1, &r]))
    );
}

#[test]
fn intermediate_path_length_tightens_budget() {
    let r = root("Root").build();
    let c1 = ca("CA1", "Root").basic_constraints(true, Some(0)).build();
    let c2 = ca("CA2", "CA1").build();
    let e = ee("EE", "CA2").build();

    assert!(check_basic_constraints(&path(&[&e, &c1, &r])).is_ok());
    let result = evaluate_basic_constraints(&path(&[&e, &c2, &c1, &r]));
    assert_eq!(ConstraintStatus::NotOk, result.status);
    assert_eq!(BASIC_CONSTRAINTS_CONSTRAINT, result.name);
    assert_eq!(Some(PolicyValidationStatus::InvalidPathLength), result.error);
}

#[test]
fn self_issued_intermediates_are_not_counted() {
    let r = root("Root").basic_constraints(true, Some(0)).build();
    // key rollover certificate
    let rollover = CertificateNodeBuilder::new("rollover")
        .subject_dn("CN=Root,O=Test,C=US")
        .issuer_dn("CN=Root,O=Test,C=US")
        .self_signed(true)
        .basic_constraints(true, None)
        .build();
    let e = ee("EE", "Root").build();
    assert!(check_basic_constraints(&path(&[&e, &rollover, &r])).is_ok());
}

#[test]
fn intermediate_must_be_ca() {
    let r = root("Root").build();
    let c = ca("CA", "Root").basic_constraints(false, None).build();
    let e = ee("EE", "CA").build();
    assert_eq!(
        Err(Error::PolicyValidation(
            PolicyValidationStatus::InvalidBasicConstraints
        )),
        check_basic_constraints(&path(&[&e, &c, &r]))
    );
}

#[test]
fn ca_target_consumes_budget() {
    let r = root("Root").basic_constraints(true, Some(1)).build();
    let c1 = ca("CA1", "Root").build();
    let c2 = ca("CA2", "CA1").build();
    let e = ee("EE", "CA1").build();
    // an end entity target is exempt, a CA target is counted
    assert!(check_basic_constraints(&path(&[&e, &c1, &r])).is_ok());
    assert!(check_basic_constraints(&path(&[&c1, &r])).is_ok());
    assert!(check_basic_constraints(&path(&[&c2, &c1, &r])).is_err());
}

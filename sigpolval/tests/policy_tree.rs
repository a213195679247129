mod utils;

use const_oid::db::rfc5280::ANY_POLICY;
use sigpolval::*;
use utils::*;

#[test]
fn same_policy_throughout() {
    let (r, c, e) = three_cert_chain(*POLICY_1);
    let p = path(&[&e, &c, &r]);
    let mut cs = settings();
    assert!(check_certificate_policies(&cs, &p).is_ok());

    cs.set_initial_explicit_policy_indicator(true);
    let tree = check_certificate_policies(&cs, &p).unwrap();
    assert!(authority_constrained_policy_set(&tree).contains(&*POLICY_1));
}

#[test]
fn disjoint_policies_with_require_explicit_policy() {
    let r = root("Root").certificate_policies(&[*POLICY_1]).build();
    let c = ca("CA", "Root")
        .certificate_policies(&[*POLICY_1])
        .policy_constraints(Some(0), None)
        .build();
    let e = ee("EE", "CA").certificate_policies(&[*POLICY_2]).build();
    let p = path(&[&e, &c, &r]);

    let r = evaluate_certificate_policies(&settings(), &p);
    assert_eq!(ConstraintStatus::NotOk, r.status);
    assert_eq!(Some(PolicyValidationStatus::NullPolicySet), r.error);
}

#[test]
fn disjoint_policies_without_explicit_policy() {
    let r = root("Root").certificate_policies(&[*POLICY_1]).build();
    let c = ca("CA", "Root").certificate_policies(&[*POLICY_1]).build();
    let e = ee("EE", "CA").certificate_policies(&[*POLICY_2]).build();
    let p = path(&[&e, &c, &r]);

    // a NULL tree is acceptable when explicit policy is never required
    let tree = check_certificate_policies(&settings(), &p).unwrap();
    assert!(tree.is_empty());
}

#[test]
fn inhibit_any_policy_applies_to_subsequent_certificates() {
    let r = root("Root").certificate_policies(&[ANY_POLICY]).build();
    let c = ca("CA", "Root")
        .certificate_policies(&[ANY_POLICY])
        .inhibit_any_policy(0)
        .build();
    // the CA that set inhibitAnyPolicy may itself assert anyPolicy, the end entity may not
    let e = ee("EE", "CA").certificate_policies(&[ANY_POLICY]).build();
    let p = path(&[&e, &c, &r]);

    let mut cs = settings();
    cs.set_initial_explicit_policy_indicator(true);
    assert_eq!(
        Err(Error::PolicyValidation(PolicyValidationStatus::NullPolicySet)),
        check_certificate_policies(&cs, &p)
    );

    let e = ee("EE", "CA").certificate_policies(&[*POLICY_1]).build();
    let p = path(&[&e, &c, &r]);
    assert!(check_certificate_policies(&cs, &p).is_ok());
}

#[test]
fn policy_mapping() {
    let r = root("Root").certificate_policies(&[ANY_POLICY]).build();
    let c = ca("CA", "Root")
        .certificate_policies(&[*POLICY_1])
        .policy_mapping(*POLICY_1, *POLICY_2)
        .build();
    let e = ee("EE", "CA").certificate_policies(&[*POLICY_2]).build();
    let p = path(&[&e, &c, &r]);

    let mut cs = settings();
    cs.set_initial_explicit_policy_indicator(true);
    cs.set_initial_policy_set_from_oid_set(&ObjectIdentifierSet::from([*POLICY_1]));
    assert!(check_certificate_policies(&cs, &p).is_ok());

    // with mapping inhibited the mapped policy is deleted
    cs.set_initial_policy_mapping_inhibit_indicator(true);
    assert_eq!(
        Err(Error::PolicyValidation(PolicyValidationStatus::NullPolicySet)),
        check_certificate_policies(&cs, &p)
    );
}

#[test]
fn mapping_any_policy_is_invalid() {
    let r = root("Root").certificate_policies(&[ANY_POLICY]).build();
    let c = ca("CA", "Root")
        .certificate_policies(&[ANY_POLICY])
        .policy_mapping(ANY_POLICY, *POLICY_2)
        .build();
    let e = ee("EE", "CA").certificate_policies(&[*POLICY_2]).build();
    let p = path(&[&e, &c, &r]);
    assert_eq!(
        Err(Error::PolicyValidation(
            PolicyValidationStatus::InvalidPolicyMapping
        )),
        check_certificate_policies(&settings(), &p)
    );
}

#[test]
fn initial_policy_set_intersection() {
    let (r, c, e) = three_cert_chain(*POLICY_1);
    let p = path(&[&e, &c, &r]);
    let mut cs = settings();
    cs.set_initial_explicit_policy_indicator(true);
    cs.set_initial_policy_set_from_oid_set(&ObjectIdentifierSet::from([*POLICY_3]));
    assert_eq!(
        Err(Error::PolicyValidation(PolicyValidationStatus::NullPolicySet)),
        check_certificate_policies(&cs, &p)
    );

    cs.set_initial_policy_set_from_oid_set(&ObjectIdentifierSet::from([*POLICY_1, *POLICY_3]));
    assert!(check_certificate_policies(&cs, &p).is_ok());
}

/// Root that asserts no certificate policies, as most trust anchors do
fn plain_root() -> CertificateNode {
    root("Root").build()
}

fn explicit_settings() -> ConstraintSettings {
    let mut cs = settings();
    cs.set_initial_explicit_policy_indicator(true);
    cs
}

#[test]
fn trust_anchor_policies_are_not_processed() {
    let r = plain_root();
    let c = ca("CA", "Root").certificate_policies(&[*POLICY_1]).build();
    let e = ee("EE", "CA").certificate_policies(&[*POLICY_1]).build();
    let p = path(&[&e, &c, &r]);

    assert!(check_certificate_policies(&settings(), &p).is_ok());
    let tree = check_certificate_policies(&explicit_settings(), &p).unwrap();
    assert_eq!(
        ObjectIdentifierSet::from([*POLICY_1]),
        authority_constrained_policy_set(&tree)
    );
    assert!(evaluate_certificate_policies(&explicit_settings(), &p).is_ok());

    let pool = vec![c];
    let mut tp = TrustPoint::new(r);
    tp.acceptable_policy_set = Some(ObjectIdentifierSet::from([*POLICY_1]));
    assert_eq!(
        3,
        TrustPointPathValidator::new(&settings(), &tp, &e, &pool)
            .build_path()
            .unwrap()
            .len()
    );
    tp.acceptable_policy_set = Some(ObjectIdentifierSet::from([*POLICY_2]));
    assert!(!TrustPointPathValidator::new(&settings(), &tp, &e, &pool).validate());
}

#[test]
fn trust_anchor_alone() {
    let r = plain_root();
    assert!(check_certificate_policies(&explicit_settings(), &path(&[&r])).is_ok());
}

#[test]
fn ca_any_policy() {
    let r = plain_root();
    let c = ca("CA", "Root").certificate_policies(&[ANY_POLICY]).build();
    let e = ee("EE", "CA").certificate_policies(&[*POLICY_1]).build();
    let tree = check_certificate_policies(&explicit_settings(), &path(&[&e, &c, &r])).unwrap();
    assert_eq!(
        ObjectIdentifierSet::from([*POLICY_1]),
        authority_constrained_policy_set(&tree)
    );
}

#[test]
fn ca_any_policy_with_inhibit_any_policy() {
    let r = plain_root();
    let c = ca("CA", "Root")
        .certificate_policies(&[ANY_POLICY])
        .inhibit_any_policy(0)
        .build();
    let e = ee("EE", "CA").certificate_policies(&[*POLICY_1]).build();
    assert!(check_certificate_policies(&explicit_settings(), &path(&[&e, &c, &r])).is_ok());

    let e = ee("EE", "CA").certificate_policies(&[ANY_POLICY]).build();
    assert_eq!(
        Err(Error::PolicyValidation(PolicyValidationStatus::NullPolicySet)),
        check_certificate_policies(&explicit_settings(), &path(&[&e, &c, &r]))
    );
}

#[test]
fn sign_cert_any_policy() {
    let r = plain_root();
    let c = ca("CA", "Root").certificate_policies(&[*POLICY_1]).build();
    let e = ee("EE", "CA").certificate_policies(&[ANY_POLICY]).build();
    let tree = check_certificate_policies(&explicit_settings(), &path(&[&e, &c, &r])).unwrap();
    assert_eq!(
        ObjectIdentifierSet::from([*POLICY_1]),
        authority_constrained_policy_set(&tree)
    );
}

#[test]
fn sign_cert_any_policy_with_ca_inhibit_any_policy() {
    let r = plain_root();
    let c = ca("CA", "Root")
        .certificate_policies(&[*POLICY_1])
        .inhibit_any_policy(0)
        .build();
    let e = ee("EE", "CA").certificate_policies(&[ANY_POLICY]).build();
    let p = path(&[&e, &c, &r]);

    assert!(check_certificate_policies(&settings(), &p).unwrap().is_empty());
    let r = evaluate_certificate_policies(&explicit_settings(), &p);
    assert_eq!(ConstraintStatus::NotOk, r.status);
    assert_eq!(Some(PolicyValidationStatus::NullPolicySet), r.error);
}

#[test]
fn self_signed_ca_any_policy_with_inhibit_any_policy() {
    let r = plain_root();
    let c1 = ca("CA1", "Root")
        .certificate_policies(&[*POLICY_1])
        .inhibit_any_policy(0)
        .build();
    // self-issued key rollover certificate
    let c2 = root("CA2")
        .trusted(false)
        .certificate_policies(&[ANY_POLICY])
        .build();

    let e = ee("EE", "CA2").certificate_policies(&[*POLICY_1]).build();
    let tree =
        check_certificate_policies(&explicit_settings(), &path(&[&e, &c2, &c1, &r])).unwrap();
    assert_eq!(
        ObjectIdentifierSet::from([*POLICY_1]),
        authority_constrained_policy_set(&tree)
    );

    // the inhibit anyPolicy counter still applies to the certificate that follows
    let e = ee("EE", "CA2").certificate_policies(&[ANY_POLICY]).build();
    assert_eq!(
        Err(Error::PolicyValidation(PolicyValidationStatus::NullPolicySet)),
        check_certificate_policies(&explicit_settings(), &path(&[&e, &c2, &c1, &r]))
    );
}

#[test]
fn expired_explicit_policy_counter_requires_policies() {
    let r = plain_root();
    let c1 = ca("CA1", "Root")
        .certificate_policies(&[*POLICY_1])
        .policy_constraints(Some(1), None)
        .build();
    let c2 = ca("CA2", "CA1").certificate_policies(&[*POLICY_1]).build();
    let e = ee("EE", "CA2").build();
    assert_eq!(
        Err(Error::PolicyValidation(PolicyValidationStatus::NullPolicySet)),
        check_certificate_policies(&settings(), &path(&[&e, &c2, &c1, &r]))
    );

    // the counter expires at the second CA, which must then assert a policy itself
    let bare = ca("CA2", "CA1").build();
    let e = ee("EE", "CA2").certificate_policies(&[*POLICY_1]).build();
    assert!(check_certificate_policies(&settings(), &path(&[&e, &bare, &c1, &r])).is_err());

    // a larger skip count leaves room for the end entity to assert nothing
    let c1 = ca("CA1", "Root")
        .certificate_policies(&[*POLICY_1])
        .policy_constraints(Some(3), None)
        .build();
    let e = ee("EE", "CA2").build();
    assert!(check_certificate_policies(&settings(), &path(&[&e, &c2, &c1, &r])).is_ok());
}

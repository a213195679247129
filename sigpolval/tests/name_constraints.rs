mod utils;

use sigpolval::*;
use utils::*;

#[test]
fn no_name_constraints() {
    let (r, c, e) = three_cert_chain(*POLICY_1);
    let p = path(&[&e, &c, &r]);
    assert!(check_name_constraints(&p).is_ok());
    assert!(evaluate_name_constraints(&p, &LeafNames::from(&e)).is_ok());
}

#[test]
fn permitted_dns_from_intermediate() {
    let r = root("Root").build();
    let c = ca("CA", "Root")
        .name_constraints(&[dns("example.com")], &[])
        .build();
    let good = ee("EE", "CA")
        .subject_alt_name(GeneralNameType::DnsName, "www.example.com")
        .build();
    let bad = ee("EE", "CA")
        .subject_alt_name(GeneralNameType::DnsName, "www.example.org")
        .build();

    assert!(check_name_constraints(&path(&[&good, &c, &r])).is_ok());
    assert_eq!(
        Err(Error::PolicyValidation(
            PolicyValidationStatus::NameConstraintsViolation
        )),
        check_name_constraints(&path(&[&bad, &c, &r]))
    );
}

#[test]
fn permitted_subtrees_intersect_down_the_path() {
    let r = root("Root")
        .name_constraints(&[dns("example.com")], &[])
        .build();
    let c1 = ca("CA1", "Root")
        .name_constraints(&[dns("sales.example.com")], &[])
        .build();
    let c2 = ca("CA2", "CA1").build();
    let inside = ee("EE", "CA2")
        .subject_alt_name(GeneralNameType::DnsName, "host.sales.example.com")
        .build();
    let outside = ee("EE", "CA2")
        .subject_alt_name(GeneralNameType::DnsName, "host.example.com")
        .build();

    assert!(check_name_constraints(&path(&[&inside, &c2, &c1, &r])).is_ok());
    assert!(check_name_constraints(&path(&[&outside, &c2, &c1, &r])).is_err());
}

#[test]
fn excluded_subtrees_accumulate() {
    let r = root("Root")
        .name_constraints(&[], &[dns("bad.example.com")])
        .build();
    let c = ca("CA", "Root")
        .name_constraints(&[], &[dns("worse.example.com")])
        .build();
    let e1 = ee("EE", "CA")
        .subject_alt_name(GeneralNameType::DnsName, "x.bad.example.com")
        .build();
    let e2 = ee("EE", "CA")
        .subject_alt_name(GeneralNameType::DnsName, "x.worse.example.com")
        .build();
    let e3 = ee("EE", "CA")
        .subject_alt_name(GeneralNameType::DnsName, "x.good.example.com")
        .build();

    assert!(check_name_constraints(&path(&[&e1, &c, &r])).is_err());
    assert!(check_name_constraints(&path(&[&e2, &c, &r])).is_err());
    assert!(check_name_constraints(&path(&[&e3, &c, &r])).is_ok());
}

#[test]
fn directory_name_constraints() {
    let r = root("Root").build();
    let c = ca("CA", "Root")
        .name_constraints(&[dn("O=Test,C=US")], &[dn("OU=Blocked,O=Test,C=US")])
        .build();
    let ok = ee("EE", "CA").build();
    let blocked = CertificateNodeBuilder::new("blocked")
        .subject_dn("CN=EE,OU=Blocked,O=Test,C=US")
        .issuer_dn("CN=CA,O=Test,C=US")
        .build();
    let foreign = CertificateNodeBuilder::new("foreign")
        .subject_dn("CN=EE,O=Other,C=US")
        .issuer_dn("CN=CA,O=Test,C=US")
        .build();

    assert!(check_name_constraints(&path(&[&ok, &c, &r])).is_ok());
    assert!(check_name_constraints(&path(&[&blocked, &c, &r])).is_err());
    assert!(check_name_constraints(&path(&[&foreign, &c, &r])).is_err());
}

#[test]
fn rfc822_from_subject_dn() {
    let r = root("Root").build();
    let c = ca("CA", "Root")
        .name_constraints(&[email(".example.com")], &[])
        .build();
    let in_dn = CertificateNodeBuilder::new("ee")
        .subject_dn("CN=EE,emailAddress=ee@mail.example.com,O=Test,C=US")
        .issuer_dn("CN=CA,O=Test,C=US")
        .build();
    let bad_dn = CertificateNodeBuilder::new("ee")
        .subject_dn("CN=EE,emailAddress=ee@example.org,O=Test,C=US")
        .issuer_dn("CN=CA,O=Test,C=US")
        .build();
    // DER encoded IA5String bad@example.org
    let hex_dn = CertificateNodeBuilder::new("ee")
        .subject_dn("CN=EE,1.2.840.113549.1.9.1=#160f626164406578616d706c652e6f7267,O=Test,C=US")
        .issuer_dn("CN=CA,O=Test,C=US")
        .build();

    assert!(check_name_constraints(&path(&[&in_dn, &c, &r])).is_ok());
    assert!(check_name_constraints(&path(&[&bad_dn, &c, &r])).is_err());
    assert!(check_name_constraints(&path(&[&hex_dn, &c, &r])).is_err());

    // an rfc822Name SAN takes precedence over the DN
    let with_san = CertificateNodeBuilder::new("ee")
        .subject_dn("CN=EE,emailAddress=ee@example.org,O=Test,C=US")
        .issuer_dn("CN=CA,O=Test,C=US")
        .subject_alt_name(GeneralNameType::Rfc822Name, "ee@example.com")
        .build();
    assert!(check_name_constraints(&path(&[&with_san, &c, &r])).is_err());
    let with_san = CertificateNodeBuilder::new("ee")
        .subject_dn("CN=EE,emailAddress=ee@example.org,O=Test,C=US")
        .issuer_dn("CN=CA,O=Test,C=US")
        .subject_alt_name(GeneralNameType::Rfc822Name, "ee@www.example.com")
        .build();
    assert!(check_name_constraints(&path(&[&with_san, &c, &r])).is_ok());
}

#[test]
fn uri_constraints() {
    let r = root("Root").build();
    let c = ca("CA", "Root")
        .name_constraints(&[uri(".example.com")], &[])
        .build();
    let ok = ee("EE", "CA")
        .subject_alt_name(
            GeneralNameType::UniformResourceIdentifier,
            "https://host.example.com:8443/path",
        )
        .build();
    let bad = ee("EE", "CA")
        .subject_alt_name(
            GeneralNameType::UniformResourceIdentifier,
            "https://host.example.net/path",
        )
        .build();
    assert!(check_name_constraints(&path(&[&ok, &c, &r])).is_ok());
    assert!(check_name_constraints(&path(&[&bad, &c, &r])).is_err());
}

#[test]
fn ip_address_constraints() {
    let r = root("Root").build();
    let c = ca("CA", "Root")
        .name_constraints(&[ip("#c0a80000ffffff00")], &[])
        .build();
    let ok = ee("EE", "CA")
        .subject_alt_name(GeneralNameType::IpAddress, "#c0a80005")
        .build();
    let ok_text = ee("EE", "CA")
        .subject_alt_name(GeneralNameType::IpAddress, "192.168.0.200")
        .build();
    let bad = ee("EE", "CA")
        .subject_alt_name(GeneralNameType::IpAddress, "#c0a80105")
        .build();

    assert!(check_name_constraints(&path(&[&ok, &c, &r])).is_ok());
    assert!(check_name_constraints(&path(&[&ok_text, &c, &r])).is_ok());
    assert!(check_name_constraints(&path(&[&bad, &c, &r])).is_err());

    let masked = ca("CA", "Root")
        .name_constraints(&[ip("#c0a80000ffff00ff")], &[])
        .build();
    assert!(check_name_constraints(&path(&[&ok, &masked, &r])).is_err());
}

#[test]
fn trust_point_seeded_constraints() {
    let r = root("Root").build();
    let c = ca("CA", "Root").build();
    let e = ee("EE", "CA")
        .subject_alt_name(GeneralNameType::DnsName, "host.example.org")
        .build();
    let p = path(&[&e, &c, &r]);

    let seeded = NameConstraintState::from_constraints(&[NameConstraintsInfo {
        permitted: vec![dns("example.com")],
        excluded: vec![],
    }]);
    assert!(check_name_constraints_from_state(seeded, &p, &LeafNames::from(&e)).is_err());
    assert!(check_name_constraints_from_state(
        NameConstraintState::default(),
        &p,
        &LeafNames::from(&e)
    )
    .is_ok());
}

#[test]
fn directory_name_values_are_case_sensitive() {
    let r = root("Root").build();
    let c = ca("CA", "Root")
        .name_constraints(&[dn("O=Test,C=US")], &[])
        .build();
    let upper = CertificateNodeBuilder::new("upper")
        .subject_dn("CN=EE,O=TEST,C=US")
        .issuer_dn("CN=CA,O=Test,C=US")
        .build();
    let lower_types = CertificateNodeBuilder::new("lower")
        .subject_dn("cn=EE,o=Test,c=US")
        .issuer_dn("CN=CA,O=Test,C=US")
        .build();

    assert!(check_name_constraints(&path(&[&upper, &c, &r])).is_err());
    assert!(check_name_constraints(&path(&[&lower_types, &c, &r])).is_ok());
}

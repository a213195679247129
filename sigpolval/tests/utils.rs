#![allow(dead_code)]

use der::asn1::ObjectIdentifier;
use lazy_static::lazy_static;
use sigpolval::*;

lazy_static! {
    pub static ref POLICY_1: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.2.1.48.1");
    pub static ref POLICY_2: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.2.1.48.2");
    pub static ref POLICY_3: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.2.1.48.3");
}

/// Validation time used by fixtures, 2023-11-14
pub const VALIDATION_TIME: u64 = 1_700_000_000;

/// Returns a self-signed, trusted root
pub fn root(name: &str) -> CertificateNodeBuilder {
    CertificateNodeBuilder::new(name)
        .subject_dn(&format!("CN={},O=Test,C=US", name))
        .issuer_dn(&format!("CN={},O=Test,C=US", name))
        .self_signed(true)
        .trusted(true)
        .basic_constraints(true, None)
}

/// Returns a CA issued by `issuer`
pub fn ca(name: &str, issuer: &str) -> CertificateNodeBuilder {
    CertificateNodeBuilder::new(name)
        .subject_dn(&format!("CN={},O=Test,C=US", name))
        .issuer_dn(&format!("CN={},O=Test,C=US", issuer))
        .basic_constraints(true, None)
}

/// Returns an end entity issued by `issuer`
pub fn ee(name: &str, issuer: &str) -> CertificateNodeBuilder {
    CertificateNodeBuilder::new(name)
        .subject_dn(&format!("CN={},O=Test,C=US", name))
        .issuer_dn(&format!("CN={},O=Test,C=US", issuer))
        .public_key_size(2048)
}

/// Assembles a path from nodes listed from the target to the trust anchor
pub fn path(nodes: &[&CertificateNode]) -> CertificationPath {
    CertificationPath::new(nodes.iter().map(|n| (*n).clone()).collect())
}

/// Returns a root, intermediate CA and end entity that all assert `policy`
pub fn three_cert_chain(policy: ObjectIdentifier) -> (CertificateNode, CertificateNode, CertificateNode) {
    let r = root("Root").certificate_policies(&[policy]).build();
    let c = ca("CA", "Root").certificate_policies(&[policy]).build();
    let e = ee("EE", "CA").certificate_policies(&[policy]).build();
    (r, c, e)
}

/// Returns settings with the validation time set to [`VALIDATION_TIME`]
pub fn settings() -> ConstraintSettings {
    let mut cs = ConstraintSettings::new();
    cs.set_validation_time(VALIDATION_TIME);
    cs
}

pub fn dns(v: &str) -> GeneralNameValue {
    GeneralNameValue::new(GeneralNameType::DnsName, v)
}

pub fn dn(v: &str) -> GeneralNameValue {
    GeneralNameValue::new(GeneralNameType::DirectoryName, v)
}

pub fn email(v: &str) -> GeneralNameValue {
    GeneralNameValue::new(GeneralNameType::Rfc822Name, v)
}

pub fn uri(v: &str) -> GeneralNameValue {
    GeneralNameValue::new(GeneralNameType::UniformResourceIdentifier, v)
}

pub fn ip(v: &str) -> GeneralNameValue {
    GeneralNameValue::new(GeneralNameType::IpAddress, v)
}

/// Returns a valid token bearing `status` produced shortly before [`VALIDATION_TIME`]
pub fn token(token_type: RevocationTokenType, status: Option<bool>) -> RevocationToken {
    RevocationToken::new(token_type, true, status, VALIDATION_TIME - 3_600)
}

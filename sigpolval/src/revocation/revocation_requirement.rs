//! Determines whether a certificate must be supported by revocation data

use alloc::string::String;
use core::fmt;

use const_oid::db::rfc6960::ID_PKIX_OCSP_NOCHECK;
use der::asn1::ObjectIdentifier;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{strings_to_oid_set, CertificateNode, ConstraintSettings, ObjectIdentifierSet, WILDCARD};

/// OID for the valassured-ST-certs extension defined in ETSI EN 319 412-1: 0.4.0.194121.2.1. The extension
/// indicates a short-term certificate whose validity is assured for its lifetime.
pub const ID_ETSI_EXT_VALASSURED_ST_CERTS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("0.4.0.194121.2.1");

/// Reason a revocation requirement was or was not imposed
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RevocationRequirementReason {
    /// Certificate was obtained from a trusted source
    Trusted,
    /// Certificate is self-signed
    SelfSigned,
    /// Certificate carries the id-pkix-ocsp-nocheck extension
    OcspNoCheck,
    /// Certificate carries the valassured-ST-certs extension and is within its validity period
    ShortTermValidity,
    /// Certificate carries an extension configured as exempting it from revocation checking
    ExtensionMatch,
    /// Certificate asserts a policy configured as exempting it from revocation checking
    PolicyMatch,
    /// No exemption applies
    None,
}

impl fmt::Display for RevocationRequirementReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevocationRequirementReason::Trusted => write!(f, "trusted"),
            RevocationRequirementReason::SelfSigned => write!(f, "self-signed"),
            RevocationRequirementReason::OcspNoCheck => write!(f, "ocsp-nocheck"),
            RevocationRequirementReason::ShortTermValidity => write!(f, "valassured-ST-certs"),
            RevocationRequirementReason::ExtensionMatch => write!(f, "extension match"),
            RevocationRequirementReason::PolicyMatch => write!(f, "policy match"),
            RevocationRequirementReason::None => write!(f, "none"),
        }
    }
}

/// Outcome of [`is_revocation_required`]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RevocationRequirement {
    /// True if revocation data must be available for the certificate
    pub required: bool,
    /// Why the determination was made
    pub reason: RevocationRequirementReason,
}

impl RevocationRequirement {
    fn exempt(reason: RevocationRequirementReason) -> Self {
        RevocationRequirement {
            required: false,
            reason,
        }
    }
}

/// OID list setting parsed once, with wildcard detection
struct SkipList {
    any: bool,
    oids: ObjectIdentifierSet,
}

impl SkipList {
    fn new(strs: &[String]) -> Self {
        SkipList {
            any: strs.iter().any(|s| s == WILDCARD),
            oids: strings_to_oid_set(strs),
        }
    }

    fn accepts(&self, oid: &ObjectIdentifier) -> bool {
        self.any || self.oids.contains(oid)
    }

    fn accepts_any<'a, I: IntoIterator<Item = &'a ObjectIdentifier>>(&self, oids: I) -> bool {
        oids.into_iter().any(|o| self.accepts(o))
    }
}

/// `is_revocation_required` determines whether revocation data must be available for `cert`. The first matching
/// rule below decides:
///
/// 1. trusted certificates are exempt,
/// 2. self-signed certificates are exempt,
/// 3. certificates bearing id-pkix-ocsp-nocheck are exempt when that OID (or `*`) is in PS_REVOCATION_SKIP_EXTENSIONS,
/// 4. certificates bearing valassured-ST-certs are exempt when that OID (or `*`) is in PS_REVOCATION_SKIP_EXTENSIONS
///    and PS_VALIDATION_TIME falls within the certificate's validity period,
/// 5. certificates bearing any extension listed in PS_REVOCATION_SKIP_EXTENSIONS (or any extension at all given `*`)
///    are exempt,
/// 6. certificates asserting any policy listed in PS_REVOCATION_SKIP_POLICIES (or any policy given `*`) are exempt.
///
/// Otherwise, revocation data is required.
pub fn is_revocation_required(
    settings: &ConstraintSettings,
    cert: &CertificateNode,
) -> RevocationRequirement {
    if cert.trusted {
        return RevocationRequirement::exempt(RevocationRequirementReason::Trusted);
    }
    if cert.self_signed {
        return RevocationRequirement::exempt(RevocationRequirementReason::SelfSigned);
    }

    let skip_exts = SkipList::new(&settings.get_revocation_skip_extensions());
    if cert.has_extension(&ID_PKIX_OCSP_NOCHECK) && skip_exts.accepts(&ID_PKIX_OCSP_NOCHECK) {
        debug!("Revocation check not required for {} (ocsp-nocheck)", cert.subject_dn);
        return RevocationRequirement::exempt(RevocationRequirementReason::OcspNoCheck);
    }
    if cert.has_extension(&ID_ETSI_EXT_VALASSURED_ST_CERTS)
        && skip_exts.accepts(&ID_ETSI_EXT_VALASSURED_ST_CERTS)
    {
        if cert.valid_at_time(settings.get_validation_time()) {
            debug!(
                "Revocation check not required for {} (valassured-ST-certs)",
                cert.subject_dn
            );
            return RevocationRequirement::exempt(RevocationRequirementReason::ShortTermValidity);
        }
        debug!(
            "Short-term certificate {} is not valid at validation time",
            cert.subject_dn
        );
    }
    if skip_exts.accepts_any(cert.extension_oids.iter()) {
        return RevocationRequirement::exempt(RevocationRequirementReason::ExtensionMatch);
    }

    let skip_policies = SkipList::new(&settings.get_revocation_skip_policies());
    if skip_policies.accepts_any(cert.certificate_policies.iter()) {
        return RevocationRequirement::exempt(RevocationRequirementReason::PolicyMatch);
    }

    RevocationRequirement {
        required: true,
        reason: RevocationRequirementReason::None,
    }
}

#[test]
fn revocation_requirement_order_test() {
    use alloc::string::ToString;
    use crate::CertificateNodeBuilder;

    let mut settings = ConstraintSettings::new();
    settings.set_validation_time(1_000);

    let plain = CertificateNodeBuilder::new("plain").build();
    assert!(is_revocation_required(&settings, &plain).required);

    let nocheck = CertificateNodeBuilder::new("nocheck")
        .extension(ID_PKIX_OCSP_NOCHECK)
        .build();
    // nocheck is honored only when configured
    assert!(is_revocation_required(&settings, &nocheck).required);

    settings.set_revocation_skip_extensions(vec![ID_PKIX_OCSP_NOCHECK.to_string()]);
    assert_eq!(
        RevocationRequirementReason::OcspNoCheck,
        is_revocation_required(&settings, &nocheck).reason
    );
    assert_eq!(
        RevocationRequirementReason::Trusted,
        is_revocation_required(&settings, &nocheck.with_trust(true)).reason
    );

    let st = CertificateNodeBuilder::new("st")
        .extension(ID_ETSI_EXT_VALASSURED_ST_CERTS)
        .validity(0, 500)
        .build();
    settings.set_revocation_skip_extensions(vec![WILDCARD.to_string()]);
    // expired short-term certificate falls through to the wildcard extension match
    assert_eq!(
        RevocationRequirementReason::ExtensionMatch,
        is_revocation_required(&settings, &st).reason
    );
    settings.set_validation_time(100);
    assert_eq!(
        RevocationRequirementReason::ShortTermValidity,
        is_revocation_required(&settings, &st).reason
    );
    // wildcard does not exempt certificates that carry no extensions
    assert!(is_revocation_required(&settings, &plain).required);
}

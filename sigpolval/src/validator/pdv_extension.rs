//! Wrappers around asn.1 encoder/decoder structures that expose the certificate attributes consumed by
//! constraint evaluation

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use const_oid::db::rfc5280::*;
use der::asn1::ObjectIdentifier;
use der::{Decode, Encode};
use x509_cert::ext::pkix::constraints::name::GeneralSubtrees;
use x509_cert::ext::pkix::constraints::{BasicConstraints, PolicyConstraints};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::*;
use x509_cert::Certificate;

use crate::asn1::{MonetaryValue, QcStatements, ID_ETSI_QCS_QC_LIMIT_VALUE, ID_PE_QC_STATEMENTS};
use crate::util::crypto::public_key_size;
use crate::util::error::*;
use crate::util::pdv_utilities::buffer_to_hex;
use crate::{
    CertificateExtensionAccessor, GeneralNameType, GeneralNameValue, NameConstraintsInfo,
};

/// [`PDVExtension`] provides a wrapper for the extension types read during constraint evaluation.
#[derive(PartialEq, Clone, Eq, Debug)]
pub enum PDVExtension {
    /// Parsed BasicConstraints extension
    BasicConstraints(BasicConstraints),
    /// Parsed SubjectKeyIdentifier extension
    SubjectKeyIdentifier(SubjectKeyIdentifier),
    /// Parsed AuthorityKeyIdentifier extension
    AuthorityKeyIdentifier(AuthorityKeyIdentifier),
    /// Parsed SubjectAltName extension
    SubjectAltName(SubjectAltName),
    /// Parsed NameConstraints extension
    NameConstraints(NameConstraints),
    /// Parsed CertificatePolicies extension
    CertificatePolicies(CertificatePolicies),
    /// Parsed PolicyMappings extension
    PolicyMappings(PolicyMappings),
    /// Parsed PolicyConstraints extension
    PolicyConstraints(PolicyConstraints),
    /// Parsed InhibitAnyPolicy extension
    InhibitAnyPolicy(InhibitAnyPolicy),
    /// Parsed QCStatements extension
    QcStatements(QcStatements),
}

/// [`ParsedExtensions`] is a typedef of a BTreeMap map that associates [`PDVExtension`] objects with object
/// identifier values.
pub type ParsedExtensions = BTreeMap<ObjectIdentifier, PDVExtension>;

/// OIDs of the extensions parsed by [`parse_extensions`]
pub const EXTS_OF_INTEREST: &[ObjectIdentifier] = &[
    ID_CE_BASIC_CONSTRAINTS,
    ID_CE_SUBJECT_KEY_IDENTIFIER,
    ID_CE_AUTHORITY_KEY_IDENTIFIER,
    ID_CE_SUBJECT_ALT_NAME,
    ID_CE_NAME_CONSTRAINTS,
    ID_CE_CERTIFICATE_POLICIES,
    ID_CE_POLICY_MAPPINGS,
    ID_CE_POLICY_CONSTRAINTS,
    ID_CE_INHIBIT_ANY_POLICY,
    ID_PE_QC_STATEMENTS,
];

/// `parse_extension` takes an ObjectIdentifier that identifies an extension type and returns a [`PDVExtension`]
/// containing the decoded extension if the extension was present. Where an extension type appears more than
/// once, the first instance is returned.
pub fn parse_extension(cert: &Certificate, oid: &ObjectIdentifier) -> Result<Option<PDVExtension>> {
    macro_rules! decode_as {
        ($v:ident, $t:ident) => {
            match $t::from_der($v) {
                Ok(r) => return Ok(Some(PDVExtension::$t(r))),
                Err(e) => return Err(Error::Asn1Error(e)),
            }
        };
    }

    if let Some(exts) = cert.tbs_certificate.extensions.as_ref() {
        if let Some(i) = exts.iter().find(|&ext| ext.extn_id == *oid) {
            let v = i.extn_value.as_bytes();
            match *oid {
                ID_CE_BASIC_CONSTRAINTS => decode_as!(v, BasicConstraints),
                ID_CE_SUBJECT_KEY_IDENTIFIER => decode_as!(v, SubjectKeyIdentifier),
                ID_CE_AUTHORITY_KEY_IDENTIFIER => decode_as!(v, AuthorityKeyIdentifier),
                ID_CE_SUBJECT_ALT_NAME => decode_as!(v, SubjectAltName),
                ID_CE_NAME_CONSTRAINTS => decode_as!(v, NameConstraints),
                ID_CE_CERTIFICATE_POLICIES => decode_as!(v, CertificatePolicies),
                ID_CE_POLICY_MAPPINGS => decode_as!(v, PolicyMappings),
                ID_CE_POLICY_CONSTRAINTS => decode_as!(v, PolicyConstraints),
                ID_CE_INHIBIT_ANY_POLICY => decode_as!(v, InhibitAnyPolicy),
                ID_PE_QC_STATEMENTS => match QcStatements::from_der(v) {
                    Ok(r) => return Ok(Some(PDVExtension::QcStatements(r))),
                    Err(e) => return Err(Error::Asn1Error(e)),
                },
                _ => {
                    // ignore unrecognized
                }
            }
        }
    }
    Ok(None)
}

/// `parse_extensions` parses each extension in [`EXTS_OF_INTEREST`] that is present in the certificate.
/// Extensions that fail to parse are omitted from the result.
pub fn parse_extensions(cert: &Certificate) -> ParsedExtensions {
    let mut pe = ParsedExtensions::new();
    for oid in EXTS_OF_INTEREST {
        if let Ok(Some(ext)) = parse_extension(cert, oid) {
            pe.insert(*oid, ext);
        }
    }
    pe
}

/// Returns every instance of the extension identified by `oid`
fn extension_instances<'a>(
    cert: &'a Certificate,
    oid: &'a ObjectIdentifier,
) -> impl Iterator<Item = &'a [u8]> {
    cert.tbs_certificate
        .extensions
        .iter()
        .flatten()
        .filter(move |e| e.extn_id == *oid)
        .map(|e| e.extn_value.as_bytes())
}

/// Converts a GeneralName to the string form used for name comparisons. Returns None for name forms that
/// cannot be rendered.
pub fn general_name_to_value(gn: &GeneralName) -> Option<GeneralNameValue> {
    let (name_type, value) = match gn {
        GeneralName::Rfc822Name(rfc822) => (GeneralNameType::Rfc822Name, rfc822.to_string()),
        GeneralName::DnsName(dns) => (GeneralNameType::DnsName, dns.to_string()),
        GeneralName::DirectoryName(dn) => (GeneralNameType::DirectoryName, dn.to_string()),
        GeneralName::UniformResourceIdentifier(uri) => {
            (GeneralNameType::UniformResourceIdentifier, uri.to_string())
        }
        GeneralName::IpAddress(ip) => (
            GeneralNameType::IpAddress,
            format!("#{}", buffer_to_hex(ip.as_bytes()).to_lowercase()),
        ),
        GeneralName::RegisteredId(oid) => (GeneralNameType::RegisteredId, oid.to_string()),
        GeneralName::OtherName(on) => (
            GeneralNameType::OtherName,
            format!("#{}", buffer_to_hex(&on.to_der().ok()?).to_lowercase()),
        ),
        GeneralName::EdiPartyName(epn) => (
            GeneralNameType::EdiPartyName,
            format!("#{}", buffer_to_hex(&epn.to_der().ok()?).to_lowercase()),
        ),
    };
    Some(GeneralNameValue { name_type, value })
}

fn subtrees_to_values(subtrees: &Option<GeneralSubtrees>) -> Vec<GeneralNameValue> {
    match subtrees {
        Some(subtrees) => subtrees
            .iter()
            .filter_map(|s| general_name_to_value(&s.base))
            .collect(),
        None => Vec::new(),
    }
}

impl From<&NameConstraints> for NameConstraintsInfo {
    fn from(nc: &NameConstraints) -> Self {
        NameConstraintsInfo {
            permitted: subtrees_to_values(&nc.permitted_subtrees),
            excluded: subtrees_to_values(&nc.excluded_subtrees),
        }
    }
}

impl CertificateExtensionAccessor for Certificate {
    fn subject_dn(&self) -> String {
        self.tbs_certificate.subject.to_string()
    }

    fn issuer_dn(&self) -> String {
        self.tbs_certificate.issuer.to_string()
    }

    fn serial_number(&self) -> Vec<u8> {
        self.tbs_certificate.serial_number.as_bytes().to_vec()
    }

    fn public_key_size(&self) -> Result<u32> {
        public_key_size(&self.tbs_certificate.subject_public_key_info)
    }

    /// A certificate is treated as self-signed when the subject and issuer names match and the authority key
    /// identifier, if present, matches the subject key identifier.
    fn is_self_signed(&self) -> bool {
        if self.tbs_certificate.subject != self.tbs_certificate.issuer {
            return false;
        }
        let akid = match parse_extension(self, &ID_CE_AUTHORITY_KEY_IDENTIFIER) {
            Ok(Some(PDVExtension::AuthorityKeyIdentifier(akid))) => akid.key_identifier,
            _ => None,
        };
        let skid = match parse_extension(self, &ID_CE_SUBJECT_KEY_IDENTIFIER) {
            Ok(Some(PDVExtension::SubjectKeyIdentifier(skid))) => Some(skid.0),
            _ => None,
        };
        match (akid, skid) {
            (Some(akid), Some(skid)) => akid == skid,
            (Some(_), None) => false,
            _ => true,
        }
    }

    fn validity(&self) -> (u64, u64) {
        let v = &self.tbs_certificate.validity;
        (
            v.not_before.to_unix_duration().as_secs(),
            v.not_after.to_unix_duration().as_secs(),
        )
    }

    fn basic_constraints(&self) -> Result<Option<BasicConstraints>> {
        match parse_extension(self, &ID_CE_BASIC_CONSTRAINTS)? {
            Some(PDVExtension::BasicConstraints(bc)) => Ok(Some(bc)),
            _ => Ok(None),
        }
    }

    fn certificate_policies(&self) -> Result<Vec<ObjectIdentifier>> {
        match parse_extension(self, &ID_CE_CERTIFICATE_POLICIES)? {
            Some(PDVExtension::CertificatePolicies(cp)) => {
                Ok(cp.0.iter().map(|p| p.policy_identifier).collect())
            }
            _ => Ok(Vec::new()),
        }
    }

    fn policy_mappings(&self) -> Result<Vec<PolicyMapping>> {
        match parse_extension(self, &ID_CE_POLICY_MAPPINGS)? {
            Some(PDVExtension::PolicyMappings(pm)) => Ok(pm.0),
            _ => Ok(Vec::new()),
        }
    }

    fn policy_constraints(&self) -> Result<Option<PolicyConstraints>> {
        match parse_extension(self, &ID_CE_POLICY_CONSTRAINTS)? {
            Some(PDVExtension::PolicyConstraints(pc)) => Ok(Some(pc)),
            _ => Ok(None),
        }
    }

    fn inhibit_any_policy(&self) -> Result<Option<u32>> {
        match parse_extension(self, &ID_CE_INHIBIT_ANY_POLICY)? {
            Some(PDVExtension::InhibitAnyPolicy(iap)) => Ok(Some(iap.0)),
            _ => Ok(None),
        }
    }

    fn name_constraints(&self) -> Result<Vec<NameConstraintsInfo>> {
        let mut retval = Vec::new();
        for v in extension_instances(self, &ID_CE_NAME_CONSTRAINTS) {
            let nc = NameConstraints::from_der(v)?;
            retval.push(NameConstraintsInfo::from(&nc));
        }
        Ok(retval)
    }

    fn subject_alt_names(&self) -> Result<Vec<GeneralNameValue>> {
        match parse_extension(self, &ID_CE_SUBJECT_ALT_NAME)? {
            Some(PDVExtension::SubjectAltName(san)) => {
                Ok(san.0.iter().filter_map(general_name_to_value).collect())
            }
            _ => Ok(Vec::new()),
        }
    }

    fn qc_limit_value(&self) -> Result<Option<MonetaryValue>> {
        if let Some(PDVExtension::QcStatements(statements)) =
            parse_extension(self, &ID_PE_QC_STATEMENTS)?
        {
            for statement in statements {
                if statement.statement_id == ID_ETSI_QCS_QC_LIMIT_VALUE {
                    if let Some(info) = &statement.statement_info {
                        let enc = info.to_der()?;
                        return Ok(Some(MonetaryValue::from_der(&enc)?));
                    }
                }
            }
        }
        Ok(None)
    }

    fn extension_oids(&self) -> Vec<ObjectIdentifier> {
        self.tbs_certificate
            .extensions
            .iter()
            .flatten()
            .map(|e| e.extn_id)
            .collect()
    }

    fn encoded(&self) -> Result<Vec<u8>> {
        Ok(self.to_der()?)
    }
}

#[test]
fn general_name_to_value_test() {
    use der::asn1::{Ia5String, OctetString};

    let gn = GeneralName::DnsName(Ia5String::new("example.com").unwrap());
    assert_eq!(
        Some(GeneralNameValue::new(GeneralNameType::DnsName, "example.com")),
        general_name_to_value(&gn)
    );

    let gn = GeneralName::IpAddress(OctetString::new(vec![192, 168, 0, 0, 255, 255, 255, 0]).unwrap());
    assert_eq!(
        Some(GeneralNameValue::new(
            GeneralNameType::IpAddress,
            "#c0a80000ffffff00"
        )),
        general_name_to_value(&gn)
    );
}

#[test]
fn name_constraints_info_test() {
    use der::asn1::Ia5String;
    use x509_cert::ext::pkix::constraints::name::GeneralSubtree;

    let subtree = |name: &str| GeneralSubtree {
        base: GeneralName::DnsName(Ia5String::new(name).unwrap()),
        minimum: 0,
        maximum: None,
    };
    let nc = NameConstraints {
        permitted_subtrees: Some(vec![subtree("example.com"), subtree("example.org")]),
        excluded_subtrees: None,
    };
    let info = NameConstraintsInfo::from(&nc);
    assert_eq!(
        vec![
            GeneralNameValue::new(GeneralNameType::DnsName, "example.com"),
            GeneralNameValue::new(GeneralNameType::DnsName, "example.org"),
        ],
        info.permitted
    );
    assert!(info.excluded.is_empty());
}

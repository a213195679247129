//! Read-only view of the certificate attributes consumed during constraint evaluation

use alloc::collections::BTreeSet;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use der::asn1::ObjectIdentifier;
use log::error;
use serde::{Deserialize, Serialize};
use x509_cert::ext::pkix::constraints::{BasicConstraints, PolicyConstraints};
use x509_cert::ext::pkix::PolicyMapping;
use x509_cert::Certificate;

use crate::asn1::MonetaryValue;
use crate::util::error::Result;
use crate::util::pdv_utilities::buffer_to_hex;
use crate::{calculate_hash, ObjectIdentifierSet};

/// Name forms that may appear in name constraints or subject alternative names, as enumerated by the
/// GeneralName CHOICE in [RFC 5280 Section 4.2.1.6].
///
/// [RFC 5280 Section 4.2.1.6]: https://datatracker.ietf.org/doc/html/rfc5280#section-4.2.1.6
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum GeneralNameType {
    OtherName,
    Rfc822Name,
    DnsName,
    X400Address,
    DirectoryName,
    EdiPartyName,
    UniformResourceIdentifier,
    IpAddress,
    RegisteredId,
}

impl fmt::Display for GeneralNameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneralNameType::OtherName => write!(f, "otherName"),
            GeneralNameType::Rfc822Name => write!(f, "rfc822Name"),
            GeneralNameType::DnsName => write!(f, "dNSName"),
            GeneralNameType::X400Address => write!(f, "x400Address"),
            GeneralNameType::DirectoryName => write!(f, "directoryName"),
            GeneralNameType::EdiPartyName => write!(f, "ediPartyName"),
            GeneralNameType::UniformResourceIdentifier => write!(f, "uniformResourceIdentifier"),
            GeneralNameType::IpAddress => write!(f, "iPAddress"),
            GeneralNameType::RegisteredId => write!(f, "registeredID"),
        }
    }
}

/// A name of a given form rendered as a string.
///
/// Directory names use the RFC 4514 string form. IP addresses and other binary forms use a `#` prefixed
/// hexadecimal string. For IP address name constraints the hexadecimal string covers address and mask.
#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GeneralNameValue {
    /// Form of the name
    pub name_type: GeneralNameType,
    /// String representation of the name
    pub value: String,
}

impl GeneralNameValue {
    /// Creates a new GeneralNameValue
    pub fn new(name_type: GeneralNameType, value: &str) -> Self {
        GeneralNameValue {
            name_type,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for GeneralNameValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name_type, self.value)
    }
}

/// Subtrees asserted by a single name constraints extension instance.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NameConstraintsInfo {
    /// Permitted subtrees (empty when the extension has no permittedSubtrees field)
    pub permitted: Vec<GeneralNameValue>,
    /// Excluded subtrees (empty when the extension has no excludedSubtrees field)
    pub excluded: Vec<GeneralNameValue>,
}

/// The `CertificateExtensionAccessor` trait defines the read contract a parsing layer must satisfy in order for
/// a certificate to participate in constraint evaluation. [`CertificateNode::from_accessor`] takes a snapshot of
/// all values exposed by an implementation.
pub trait CertificateExtensionAccessor {
    /// Subject distinguished name in RFC 4514 string form
    fn subject_dn(&self) -> String;
    /// Issuer distinguished name in RFC 4514 string form
    fn issuer_dn(&self) -> String;
    /// Serial number bytes
    fn serial_number(&self) -> Vec<u8>;
    /// Size of the subject public key in bits
    fn public_key_size(&self) -> Result<u32>;
    /// Whether the certificate is self-signed
    fn is_self_signed(&self) -> bool;
    /// notBefore and notAfter expressed as seconds since the Unix epoch
    fn validity(&self) -> (u64, u64);
    /// Basic constraints extension, if present
    fn basic_constraints(&self) -> Result<Option<BasicConstraints>>;
    /// Certificate policy OIDs in the order asserted
    fn certificate_policies(&self) -> Result<Vec<ObjectIdentifier>>;
    /// Policy mappings, if any
    fn policy_mappings(&self) -> Result<Vec<PolicyMapping>>;
    /// Policy constraints extension, if present
    fn policy_constraints(&self) -> Result<Option<PolicyConstraints>>;
    /// Inhibit anyPolicy skip count, if present
    fn inhibit_any_policy(&self) -> Result<Option<u32>>;
    /// One entry per name constraints extension instance
    fn name_constraints(&self) -> Result<Vec<NameConstraintsInfo>>;
    /// Subject alternative names
    fn subject_alt_names(&self) -> Result<Vec<GeneralNameValue>>;
    /// QcEuLimitValue statement from the QC statements extension, if present
    fn qc_limit_value(&self) -> Result<Option<MonetaryValue>>;
    /// OIDs of all extensions present
    fn extension_oids(&self) -> Vec<ObjectIdentifier>;
    /// DER encoding of the certificate
    fn encoded(&self) -> Result<Vec<u8>>;
}

/// `CertificateNode` captures the attributes of a certificate that are relevant to constraint evaluation.
///
/// Instances are constructed once, either from a [`CertificateExtensionAccessor`] implementation (including
/// [`Certificate`]) or via [`CertificateNodeBuilder`], and are immutable thereafter.
#[readonly::make]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CertificateNode {
    /// Identifier used to compare certificates, the hex-encoded SHA-256 digest when built from an encoded certificate
    pub id: String,
    /// Subject DN in RFC 4514 string form
    pub subject_dn: String,
    /// Issuer DN in RFC 4514 string form
    pub issuer_dn: String,
    /// Serial number bytes
    pub serial_number: Vec<u8>,
    /// Size of public key in bits
    pub public_key_size: u32,
    /// Self-signed flag
    pub self_signed: bool,
    /// Set when the certificate was obtained from a trusted source
    pub trusted: bool,
    /// notBefore in seconds since the Unix epoch
    pub not_before: u64,
    /// notAfter in seconds since the Unix epoch
    pub not_after: u64,
    /// Basic constraints extension, if present
    pub basic_constraints: Option<BasicConstraints>,
    /// Certificate policy OIDs in asserted order
    pub certificate_policies: Vec<ObjectIdentifier>,
    /// Policy mappings
    pub policy_mappings: Vec<PolicyMapping>,
    /// Policy constraints extension, if present
    pub policy_constraints: Option<PolicyConstraints>,
    /// Inhibit anyPolicy skip count, if present
    pub inhibit_any_policy: Option<u32>,
    /// Name constraints, one entry per extension instance
    pub name_constraints: Vec<NameConstraintsInfo>,
    /// Subject alternative names
    pub subject_alt_names: Vec<GeneralNameValue>,
    /// QcEuLimitValue statement, if present
    pub qc_limit_value: Option<MonetaryValue>,
    /// OIDs of all extensions present in the certificate
    pub extension_oids: ObjectIdentifierSet,
    /// DER encoded certificate, may be empty for synthesized nodes
    pub encoded: Vec<u8>,
}

impl CertificateNode {
    /// Takes a snapshot of the values exposed by a [`CertificateExtensionAccessor`].
    pub fn from_accessor<A: CertificateExtensionAccessor>(src: &A, trusted: bool) -> Result<Self> {
        let encoded = src.encoded()?;
        let (not_before, not_after) = src.validity();
        Ok(CertificateNode {
            id: buffer_to_hex(&calculate_hash(&const_oid::db::rfc5912::ID_SHA_256, &encoded)?),
            subject_dn: src.subject_dn(),
            issuer_dn: src.issuer_dn(),
            serial_number: src.serial_number(),
            public_key_size: src.public_key_size().unwrap_or(0),
            self_signed: src.is_self_signed(),
            trusted,
            not_before,
            not_after,
            basic_constraints: src.basic_constraints()?,
            certificate_policies: src.certificate_policies()?,
            policy_mappings: src.policy_mappings()?,
            policy_constraints: src.policy_constraints()?,
            inhibit_any_policy: src.inhibit_any_policy()?,
            name_constraints: src.name_constraints()?,
            subject_alt_names: src.subject_alt_names()?,
            qc_limit_value: src.qc_limit_value()?,
            extension_oids: src.extension_oids().into_iter().collect(),
            encoded,
        })
    }

    /// Returns a copy of this node with the trusted flag set as indicated.
    pub fn with_trust(&self, trusted: bool) -> Self {
        let mut node = self.clone();
        node.trusted = trusted;
        node
    }

    /// Returns a copy of this node with policyConstraints replaced by the given value. Used to apply the
    /// policy constraints a signature policy declares for a trust point.
    pub fn with_policy_constraints(&self, policy_constraints: Option<PolicyConstraints>) -> Self {
        let mut node = self.clone();
        node.policy_constraints = policy_constraints;
        node
    }

    /// Returns true if a basicConstraints extension is present with the cA field set
    pub fn is_ca(&self) -> bool {
        self.basic_constraints
            .as_ref()
            .map(|bc| bc.ca)
            .unwrap_or(false)
    }

    /// Returns the pathLenConstraint value from basicConstraints, if present
    pub fn path_len_constraint(&self) -> Option<u32> {
        self.basic_constraints
            .as_ref()
            .and_then(|bc| bc.path_len_constraint.map(u32::from))
    }

    /// Returns requireExplicitPolicy from policyConstraints, if present
    pub fn require_explicit_policy(&self) -> Option<u32> {
        self.policy_constraints
            .as_ref()
            .and_then(|pc| pc.require_explicit_policy)
    }

    /// Returns inhibitPolicyMapping from policyConstraints, if present
    pub fn inhibit_policy_mapping(&self) -> Option<u32> {
        self.policy_constraints
            .as_ref()
            .and_then(|pc| pc.inhibit_policy_mapping)
    }

    /// Returns true if an extension with the given OID is present
    pub fn has_extension(&self, oid: &ObjectIdentifier) -> bool {
        self.extension_oids.contains(oid)
    }

    /// Returns true if the certificate is valid at the given time, expressed as seconds since the Unix epoch
    pub fn valid_at_time(&self, time_of_interest: u64) -> bool {
        self.not_before <= time_of_interest && time_of_interest <= self.not_after
    }
}

impl TryFrom<&Certificate> for CertificateNode {
    type Error = crate::Error;

    fn try_from(cert: &Certificate) -> Result<Self> {
        CertificateNode::from_accessor(cert, false)
    }
}

impl TryFrom<&[u8]> for CertificateNode {
    type Error = crate::Error;

    fn try_from(enc_cert: &[u8]) -> Result<Self> {
        use der::Decode;
        let cert = Certificate::from_der(enc_cert)?;
        CertificateNode::try_from(&cert)
    }
}

impl CertificateNode {
    /// Parses a certificate that may be either DER or PEM encoded. PEM input is recognized by a leading `-`.
    pub fn from_der_or_pem(buf: &[u8]) -> Result<Self> {
        if buf.first() == Some(&0x2D) {
            match pem_rfc7468::decode_vec(buf) {
                Ok((_label, der)) => CertificateNode::try_from(der.as_slice()),
                Err(e) => {
                    error!("Failed to parse PEM encoded certificate: {:?}", e);
                    Err(crate::Error::Unrecognized)
                }
            }
        } else {
            CertificateNode::try_from(buf)
        }
    }
}

/// `CertificateNodeBuilder` assembles a [`CertificateNode`] from individual attribute values, for
/// use where a parsed certificate is not available.
#[derive(Clone, Debug, Default)]
pub struct CertificateNodeBuilder {
    node: CertificateNode,
}

impl CertificateNodeBuilder {
    /// Creates a builder for a node with the given identifier
    pub fn new(id: &str) -> Self {
        let mut node = CertificateNode::default();
        node.id = id.to_string();
        node.not_after = u64::MAX;
        CertificateNodeBuilder { node }
    }

    /// Sets the subject DN
    pub fn subject_dn(mut self, dn: &str) -> Self {
        self.node.subject_dn = dn.to_string();
        self
    }

    /// Sets the issuer DN
    pub fn issuer_dn(mut self, dn: &str) -> Self {
        self.node.issuer_dn = dn.to_string();
        self
    }

    /// Sets the serial number
    pub fn serial_number(mut self, serial: &[u8]) -> Self {
        self.node.serial_number = serial.to_vec();
        self
    }

    /// Sets the public key size in bits
    pub fn public_key_size(mut self, size: u32) -> Self {
        self.node.public_key_size = size;
        self
    }

    /// Sets the self-signed flag
    pub fn self_signed(mut self, self_signed: bool) -> Self {
        self.node.self_signed = self_signed;
        self
    }

    /// Sets the trusted flag
    pub fn trusted(mut self, trusted: bool) -> Self {
        self.node.trusted = trusted;
        self
    }

    /// Sets the validity interval
    pub fn validity(mut self, not_before: u64, not_after: u64) -> Self {
        self.node.not_before = not_before;
        self.node.not_after = not_after;
        self
    }

    /// Sets basicConstraints
    pub fn basic_constraints(mut self, ca: bool, path_len_constraint: Option<u8>) -> Self {
        self.node.basic_constraints = Some(BasicConstraints {
            ca,
            path_len_constraint,
        });
        self
    }

    /// Sets certificate policies
    pub fn certificate_policies(mut self, policies: &[ObjectIdentifier]) -> Self {
        self.node.certificate_policies = policies.to_vec();
        self
    }

    /// Adds a policy mapping
    pub fn policy_mapping(mut self, issuer: ObjectIdentifier, subject: ObjectIdentifier) -> Self {
        self.node.policy_mappings.push(PolicyMapping {
            issuer_domain_policy: issuer,
            subject_domain_policy: subject,
        });
        self
    }

    /// Sets policyConstraints
    pub fn policy_constraints(
        mut self,
        require_explicit_policy: Option<u32>,
        inhibit_policy_mapping: Option<u32>,
    ) -> Self {
        self.node.policy_constraints = Some(PolicyConstraints {
            require_explicit_policy,
            inhibit_policy_mapping,
        });
        self
    }

    /// Sets inhibitAnyPolicy
    pub fn inhibit_any_policy(mut self, skip_certs: u32) -> Self {
        self.node.inhibit_any_policy = Some(skip_certs);
        self
    }

    /// Adds a name constraints extension instance
    pub fn name_constraints(
        mut self,
        permitted: &[GeneralNameValue],
        excluded: &[GeneralNameValue],
    ) -> Self {
        self.node.name_constraints.push(NameConstraintsInfo {
            permitted: permitted.to_vec(),
            excluded: excluded.to_vec(),
        });
        self
    }

    /// Adds a subject alternative name
    pub fn subject_alt_name(mut self, name_type: GeneralNameType, value: &str) -> Self {
        self.node
            .subject_alt_names
            .push(GeneralNameValue::new(name_type, value));
        self
    }

    /// Sets the QcEuLimitValue statement
    pub fn qc_limit_value(mut self, value: MonetaryValue) -> Self {
        self.node.qc_limit_value = Some(value);
        self
    }

    /// Marks an extension as present
    pub fn extension(mut self, oid: ObjectIdentifier) -> Self {
        self.node.extension_oids.insert(oid);
        self
    }

    /// Sets the DER encoding
    pub fn encoded(mut self, encoded: &[u8]) -> Self {
        self.node.encoded = encoded.to_vec();
        self
    }

    /// Returns the assembled node
    pub fn build(self) -> CertificateNode {
        self.node
    }
}

/// Returns the set of identifiers of the given nodes
pub fn node_ids(nodes: &[CertificateNode]) -> BTreeSet<String> {
    nodes.iter().map(|n| n.id.clone()).collect()
}

#[test]
fn builder_test() {
    use const_oid::db::rfc5280::ANY_POLICY;

    let node = CertificateNodeBuilder::new("ca")
        .subject_dn("CN=CA,O=Test,C=US")
        .basic_constraints(true, Some(2))
        .certificate_policies(&[ANY_POLICY])
        .policy_constraints(Some(0), None)
        .inhibit_any_policy(1)
        .build();
    assert!(node.is_ca());
    assert_eq!(Some(2), node.path_len_constraint());
    assert_eq!(Some(0), node.require_explicit_policy());
    assert_eq!(None, node.inhibit_policy_mapping());
    assert_eq!(Some(1), node.inhibit_any_policy);
    assert!(!node.self_signed);
    assert!(!node.trusted);
    assert!(node.with_trust(true).trusted);
    assert!(node.valid_at_time(1_700_000_000));

    let ee = CertificateNodeBuilder::new("ee").build();
    assert!(!ee.is_ca());
    assert_eq!(None, ee.path_len_constraint());
}

#[test]
fn from_der_or_pem_test() {
    use crate::Error;

    let pem = b"-----BEGIN CERTIFICATE-----\nAwEB\n-----END CERTIFICATE-----\n";
    assert!(matches!(
        CertificateNode::from_der_or_pem(pem),
        Err(Error::Asn1Error(_))
    ));
    let bad_pem = b"-----BEGIN CERTIFICATE-----\nAwEB\n";
    assert_eq!(
        Err(Error::Unrecognized),
        CertificateNode::from_der_or_pem(bad_pem)
    );
    assert!(CertificateNode::from_der_or_pem(&[0x30, 0x00]).is_err());
}

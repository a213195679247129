//! Read-only view of the properties of a signature that signature policy rules are evaluated against

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::{SignedData, SignerIdentifier, SignerInfo};
use const_oid::db::rfc5912::{ID_SHA_1, ID_SHA_256};
use der::asn1::ObjectIdentifier;
use der::{Decode, DecodeOwned, Encode};
use log::{debug, warn};
use x509_cert::attr::{Attribute, Attributes};
use x509_cert::ext::pkix::name::GeneralName;

use crate::asn1::*;
use crate::util::error::*;
use crate::{calculate_hash, CertificateNode, ObjectIdentifierSet};

/// OID for the signature-time-stamp attribute: 1.2.840.113549.1.9.16.2.14
pub const ID_AA_SIGNATURE_TIME_STAMP_TOKEN: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.2.14");

/// A reference to a certificate taken from a signing-certificate or signing-certificate-v2 attribute
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CertificateReference {
    /// ESSCertID from a signing-certificate attribute, hashed with SHA-1
    V1(EssCertId),
    /// ESSCertIDv2 from a signing-certificate-v2 attribute
    V2(EssCertIdV2),
}

impl CertificateReference {
    /// Algorithm used to compute the certificate hash
    pub fn hash_algorithm(&self) -> ObjectIdentifier {
        match self {
            CertificateReference::V1(_) => ID_SHA_1,
            CertificateReference::V2(id) => match &id.hash_algorithm {
                Some(alg) => alg.oid,
                None => ID_SHA_256,
            },
        }
    }

    /// Hash of the referenced certificate
    pub fn cert_hash(&self) -> &[u8] {
        match self {
            CertificateReference::V1(id) => id.cert_hash.as_bytes(),
            CertificateReference::V2(id) => id.cert_hash.as_bytes(),
        }
    }

    /// IssuerSerial of the referenced certificate, if present
    pub fn issuer_serial(&self) -> Option<&IssuerSerial> {
        match self {
            CertificateReference::V1(id) => id.issuer_serial.as_ref(),
            CertificateReference::V2(id) => id.issuer_serial.as_ref(),
        }
    }

    /// Returns true if this reference identifies `cert`. The certificate hash must match and, when an
    /// IssuerSerial is present, the serial number and one of the directory names must match as well.
    pub fn matches(&self, cert: &CertificateNode) -> Result<bool> {
        if cert.encoded.is_empty() {
            return Ok(false);
        }
        let hash = calculate_hash(&self.hash_algorithm(), &cert.encoded)?;
        if hash.as_slice() != self.cert_hash() {
            return Ok(false);
        }
        match self.issuer_serial() {
            Some(is) => {
                let serial_matches = is.serial_number.as_bytes() == cert.serial_number.as_slice();
                let issuer_matches = is.issuer.iter().any(|gn| match gn {
                    GeneralName::DirectoryName(dn) => dn.to_string() == cert.issuer_dn,
                    _ => false,
                });
                Ok(serial_matches && issuer_matches)
            }
            None => Ok(true),
        }
    }
}

/// `SignatureInfo` captures the properties of a single signature that are compared against signature policy
/// rules. Instances may be assembled field by field or read from a CMS SignedData object via
/// [`SignatureInfo::from_signed_data`].
#[derive(Clone, Debug, Default)]
pub struct SignatureInfo {
    /// Certificate used to create the signature, if it could be identified
    pub signing_certificate: Option<CertificateNode>,
    /// Certificates embedded in the signature
    pub embedded_certificates: Vec<CertificateNode>,
    /// Every certificate available for path building, including embedded certificates
    pub certificate_pool: Vec<CertificateNode>,
    /// Types of the signed attributes
    pub signed_attributes: ObjectIdentifierSet,
    /// Types of the unsigned attributes
    pub unsigned_attributes: ObjectIdentifierSet,
    /// References from signing-certificate and signing-certificate-v2 attributes
    pub certificate_references: Vec<CertificateReference>,
    /// Identifiers from commitment-type-indication attributes
    pub commitment_types: Vec<ObjectIdentifier>,
    /// Signature algorithm
    pub signature_algorithm: Option<ObjectIdentifier>,
    /// True when the signed content is not encapsulated in the signature
    pub external_data: bool,
    /// Entries of the PDF signature dictionary, for PAdES signatures
    pub pdf_entries: Option<BTreeMap<String, String>>,
    /// Certificates used to sign signature time stamps
    pub timestamp_signers: Vec<CertificateNode>,
}

/// Decodes every value of the attribute of the given type
fn decode_attribute_values<T: DecodeOwned>(attrs: &Attributes, oid: &ObjectIdentifier) -> Vec<T> {
    let mut retval = Vec::new();
    for attr in attrs.iter().filter(|a| a.oid == *oid) {
        for value in attr.values.iter() {
            match value.to_der().and_then(|enc| T::from_der(&enc)) {
                Ok(v) => retval.push(v),
                Err(e) => warn!("Failed to decode value of attribute {}: {}", oid, e),
            }
        }
    }
    retval
}

fn attribute_types(attrs: &Option<Attributes>) -> ObjectIdentifierSet {
    match attrs {
        Some(attrs) => attrs.iter().map(|a: &Attribute| a.oid).collect(),
        None => ObjectIdentifierSet::new(),
    }
}

/// Returns the certificates conveyed in a SignedData object. Certificates that cannot be re-encoded are skipped.
pub fn embedded_certificates(signed_data: &SignedData) -> Vec<CertificateNode> {
    let mut retval = Vec::new();
    if let Some(certs) = &signed_data.certificates {
        for choice in certs.0.iter() {
            if let CertificateChoices::Certificate(cert) = choice {
                match CertificateNode::try_from(cert) {
                    Ok(node) => retval.push(node),
                    Err(e) => warn!("Failed to read embedded certificate: {}", e),
                }
            }
        }
    }
    retval
}

/// Identifies the certificate that created `signer_info` among `pool`. Certificates identified by issuer and
/// serial number are matched on those values. Otherwise, the signing certificate references in the signed
/// attributes are used.
pub fn find_signer_certificate(
    signer_info: &SignerInfo,
    pool: &[CertificateNode],
) -> Option<CertificateNode> {
    if let SignerIdentifier::IssuerAndSerialNumber(iasn) = &signer_info.sid {
        let issuer = iasn.issuer.to_string();
        let serial = iasn.serial_number.as_bytes();
        if let Some(c) = pool
            .iter()
            .find(|c| c.issuer_dn == issuer && c.serial_number.as_slice() == serial)
        {
            return Some(c.clone());
        }
    }

    let refs = match &signer_info.signed_attrs {
        Some(attrs) => certificate_references(attrs),
        None => return None,
    };
    pool.iter()
        .find(|c| refs.iter().any(|r| r.matches(c).unwrap_or(false)))
        .cloned()
}

/// Collects ESSCertID and ESSCertIDv2 values from signing-certificate and signing-certificate-v2 attributes
pub fn certificate_references(attrs: &Attributes) -> Vec<CertificateReference> {
    let mut retval: Vec<CertificateReference> = Vec::new();
    for sc in decode_attribute_values::<SigningCertificate>(attrs, &ID_AA_SIGNING_CERTIFICATE) {
        retval.extend(sc.certs.into_iter().map(CertificateReference::V1));
    }
    for sc in decode_attribute_values::<SigningCertificateV2>(attrs, &ID_AA_SIGNING_CERTIFICATE_V2) {
        retval.extend(sc.certs.into_iter().map(CertificateReference::V2));
    }
    retval
}

/// Reads the signer certificates of the time stamp tokens in a signature-time-stamp attribute
fn timestamp_signers(attrs: &Attributes, pool: &[CertificateNode]) -> Vec<CertificateNode> {
    let mut retval = Vec::new();
    for ci in decode_attribute_values::<ContentInfo>(attrs, &ID_AA_SIGNATURE_TIME_STAMP_TOKEN) {
        let sd = match ci.content.to_der().and_then(|enc| SignedData::from_der(&enc)) {
            Ok(sd) => sd,
            Err(e) => {
                warn!("Failed to decode time stamp token: {}", e);
                continue;
            }
        };
        let mut tst_pool = embedded_certificates(&sd);
        tst_pool.extend(pool.iter().cloned());
        for si in sd.signer_infos.0.iter() {
            if let Some(c) = find_signer_certificate(si, &tst_pool) {
                retval.push(c);
            }
        }
    }
    retval
}

impl SignatureInfo {
    /// Reads the signature created by the first SignerInfo in `signed_data`. Certificates in `extra_certificates`
    /// are added to the certificate pool after those embedded in the signature.
    pub fn from_signed_data(
        signed_data: &SignedData,
        extra_certificates: &[CertificateNode],
    ) -> Result<Self> {
        let signer_info = match signed_data.signer_infos.0.iter().next() {
            Some(si) => si,
            None => return Err(Error::NotFound),
        };

        let embedded = embedded_certificates(signed_data);
        let mut pool = embedded.clone();
        for c in extra_certificates {
            if !pool.iter().any(|p| p.id == c.id) {
                pool.push(c.clone());
            }
        }

        let signing_certificate = find_signer_certificate(signer_info, &pool);
        if signing_certificate.is_none() {
            debug!("Signing certificate could not be identified");
        }

        let (certificate_references, commitment_types) = match &signer_info.signed_attrs {
            Some(attrs) => (
                certificate_references(attrs),
                decode_attribute_values::<CommitmentTypeIndication>(attrs, &ID_AA_ETS_COMMITMENT_TYPE)
                    .into_iter()
                    .map(|cti| cti.commitment_type_id)
                    .collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        let timestamp_signers = match &signer_info.unsigned_attrs {
            Some(attrs) => timestamp_signers(attrs, &pool),
            None => Vec::new(),
        };

        Ok(SignatureInfo {
            signing_certificate,
            embedded_certificates: embedded,
            certificate_pool: pool,
            signed_attributes: attribute_types(&signer_info.signed_attrs),
            unsigned_attributes: attribute_types(&signer_info.unsigned_attrs),
            certificate_references,
            commitment_types,
            signature_algorithm: Some(signer_info.signature_algorithm.oid),
            external_data: signed_data.encap_content_info.econtent.is_none(),
            pdf_entries: None,
            timestamp_signers,
        })
    }
}

#[test]
fn certificate_reference_test() {
    use der::asn1::OctetString;

    let enc = hex_literal::hex!("3003020101");
    let cert = crate::CertificateNodeBuilder::new("c")
        .issuer_dn("CN=Issuer")
        .serial_number(&[1])
        .encoded(&enc)
        .build();

    let sha1 = calculate_hash(&ID_SHA_1, &enc).unwrap();
    let v1 = CertificateReference::V1(EssCertId {
        cert_hash: OctetString::new(sha1.clone()).unwrap(),
        issuer_serial: None,
    });
    assert_eq!(ID_SHA_1, v1.hash_algorithm());
    assert!(v1.matches(&cert).unwrap());

    // the v2 default is SHA-256, so a SHA-1 hash does not match
    let v2 = CertificateReference::V2(EssCertIdV2 {
        hash_algorithm: None,
        cert_hash: OctetString::new(sha1).unwrap(),
        issuer_serial: None,
    });
    assert_eq!(ID_SHA_256, v2.hash_algorithm());
    assert!(!v2.matches(&cert).unwrap());

    let sha256 = calculate_hash(&ID_SHA_256, &enc).unwrap();
    let v2 = CertificateReference::V2(EssCertIdV2 {
        hash_algorithm: None,
        cert_hash: OctetString::new(sha256).unwrap(),
        issuer_serial: None,
    });
    assert!(v2.matches(&cert).unwrap());
    let unencoded = crate::CertificateNodeBuilder::new("u").build();
    assert!(!v2.matches(&unencoded).unwrap());
}

//! Signing certificate attributes from RFC 2634 and RFC 5035 used to bind a signature to its signing certificate.

use alloc::vec::Vec;

use der::asn1::{ObjectIdentifier, OctetString};
use der::Sequence;
use spki::AlgorithmIdentifierOwned;
use x509_cert::ext::pkix::certpolicy::PolicyInformation;
use x509_cert::ext::pkix::name::GeneralNames;
use x509_cert::serial_number::SerialNumber;

/// OID for the signing-certificate attribute: 1.2.840.113549.1.9.16.2.12. See [`SigningCertificate`].
pub const ID_AA_SIGNING_CERTIFICATE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.2.12");

/// OID for the signing-certificate-v2 attribute: 1.2.840.113549.1.9.16.2.47. See [`SigningCertificateV2`].
pub const ID_AA_SIGNING_CERTIFICATE_V2: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.2.47");

/// SigningCertificate structure as defined in [RFC 2634 Section 5.4].
///
/// ```text
/// SigningCertificate ::=  SEQUENCE {
///     certs        SEQUENCE OF ESSCertID,
///     policies     SEQUENCE OF PolicyInformation OPTIONAL
/// }
/// ```
///
/// [RFC 2634 Section 5.4]: https://datatracker.ietf.org/doc/html/rfc2634#section-5.4
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct SigningCertificate {
    pub certs: Vec<EssCertId>,
    #[asn1(optional = "true")]
    pub policies: Option<Vec<PolicyInformation>>,
}

/// ESSCertID structure as defined in [RFC 2634 Section 5.4.1].
///
/// ```text
/// ESSCertID ::=  SEQUENCE {
///      certHash                 Hash,
///      issuerSerial             IssuerSerial OPTIONAL
/// }
/// Hash ::= OCTET STRING -- SHA1 hash of entire certificate
/// ```
///
/// [RFC 2634 Section 5.4.1]: https://datatracker.ietf.org/doc/html/rfc2634#section-5.4.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct EssCertId {
    pub cert_hash: OctetString,
    #[asn1(optional = "true")]
    pub issuer_serial: Option<IssuerSerial>,
}

/// SigningCertificateV2 structure as defined in [RFC 5035 Section 3].
///
/// ```text
/// SigningCertificateV2 ::=  SEQUENCE {
///      certs        SEQUENCE OF ESSCertIDv2,
///      policies     SEQUENCE OF PolicyInformation OPTIONAL
/// }
/// ```
///
/// [RFC 5035 Section 3]: https://datatracker.ietf.org/doc/html/rfc5035#section-3
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct SigningCertificateV2 {
    pub certs: Vec<EssCertIdV2>,
    #[asn1(optional = "true")]
    pub policies: Option<Vec<PolicyInformation>>,
}

/// ESSCertIDv2 structure as defined in [RFC 5035 Section 4].
///
/// ```text
/// ESSCertIDv2 ::=  SEQUENCE {
///     hashAlgorithm           AlgorithmIdentifier
///            DEFAULT {algorithm id-sha256},
///     certHash                 Hash,
///     issuerSerial             IssuerSerial OPTIONAL
/// }
/// ```
///
/// An absent hash_algorithm denotes SHA-256.
///
/// [RFC 5035 Section 4]: https://datatracker.ietf.org/doc/html/rfc5035#section-4
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct EssCertIdV2 {
    #[asn1(optional = "true")]
    pub hash_algorithm: Option<AlgorithmIdentifierOwned>,
    pub cert_hash: OctetString,
    #[asn1(optional = "true")]
    pub issuer_serial: Option<IssuerSerial>,
}

/// IssuerSerial structure as defined in [RFC 5035 Section 4].
///
/// ```text
/// IssuerSerial ::= SEQUENCE {
///     issuer                   GeneralNames,
///     serialNumber             CertificateSerialNumber
/// }
/// ```
///
/// [RFC 5035 Section 4]: https://datatracker.ietf.org/doc/html/rfc5035#section-4
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct IssuerSerial {
    pub issuer: GeneralNames,
    pub serial_number: SerialNumber,
}

#[test]
fn ess_cert_id_v2_decode_test() {
    use der::{Decode, Encode};
    use hex_literal::hex;

    // certHash only, hashAlgorithm defaulted
    let enc = hex!("3022042000112233445566778899AABBCCDDEEFF00112233445566778899AABBCCDDEEFF");
    let id = EssCertIdV2::from_der(&enc).unwrap();
    assert!(id.hash_algorithm.is_none());
    assert!(id.issuer_serial.is_none());
    assert_eq!(32, id.cert_hash.as_bytes().len());
    assert_eq!(enc.to_vec(), id.to_der().unwrap());
}

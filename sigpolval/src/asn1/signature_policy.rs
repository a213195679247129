//! Selected structures from RFC 3125 (Electronic Signature Policies) consumed by the signature policy validators.
//!
//! Only the portions of the signature policy syntax that are referenced by rule evaluation are defined here. Parsing
//! of complete SignaturePolicy objects is left to callers.

use alloc::vec::Vec;

use der::asn1::{ObjectIdentifier, OctetString};
use der::{Any, Enumerated, Sequence};
use x509_cert::ext::pkix::constraints::{NameConstraints, PolicyConstraints};
use x509_cert::Certificate;

/// SignPolExtn as defined in [RFC 3125 Section 5.1].
///
/// ```text
/// SignPolExtn ::= SEQUENCE {
///         extnID      OBJECT IDENTIFIER,
///         extnValue   OCTET STRING  }
/// ```
///
/// [RFC 3125 Section 5.1]: https://datatracker.ietf.org/doc/html/rfc3125#section-5.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct SignPolExtn {
    pub extn_id: ObjectIdentifier,
    pub extn_value: OctetString,
}

/// SignPolExtensions as defined in [RFC 3125 Section 5.1].
///
/// ```text
/// SignPolExtensions ::= SEQUENCE OF SignPolExtn
/// ```
///
/// [RFC 3125 Section 5.1]: https://datatracker.ietf.org/doc/html/rfc3125#section-5.1
pub type SignPolExtensions = Vec<SignPolExtn>;

/// EnuRevReq as defined in [RFC 3125 Section 6.3].
///
/// ```text
/// EnuRevReq  ::= ENUMERATED {
///         clrCheck        (0),
///         ocspCheck       (1),
///         bothCheck       (2),
///         eitherCheck     (3),
///         noCheck         (4),
///         other           (5) }
/// ```
///
/// [RFC 3125 Section 6.3]: https://datatracker.ietf.org/doc/html/rfc3125#section-6.3
#[derive(Enumerated, Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
#[allow(missing_docs)]
pub enum EnuRevReq {
    CrlCheck = 0,
    OcspCheck = 1,
    BothCheck = 2,
    EitherCheck = 3,
    NoCheck = 4,
    Other = 5,
}

/// RevReq as defined in [RFC 3125 Section 6.3].
///
/// ```text
/// RevReq  ::= SEQUENCE  {
///         enuRevReq  EnuRevReq,
///         exRevReq   SignPolExtensions OPTIONAL}
/// ```
///
/// [RFC 3125 Section 6.3]: https://datatracker.ietf.org/doc/html/rfc3125#section-6.3
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct RevReq {
    pub enu_rev_req: EnuRevReq,
    #[asn1(optional = "true")]
    pub ex_rev_req: Option<SignPolExtensions>,
}

/// CertRevReq as defined in [RFC 3125 Section 6.3].
///
/// ```text
/// CertRevReq ::= SEQUENCE {
///         endCertRevReq   RevReq,
///         caCerts         [0] RevReq
///                                 }
/// ```
///
/// [RFC 3125 Section 6.3]: https://datatracker.ietf.org/doc/html/rfc3125#section-6.3
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct CertRevReq {
    pub end_cert_rev_req: RevReq,
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT")]
    pub ca_certs: RevReq,
}

/// CertRefReq as defined in [RFC 3125 Section 6.2.2].
///
/// ```text
/// CertRefReq ::= ENUMERATED {
///                     signerOnly  (1),
///                     fullPath    (2)
///                     }
/// ```
///
/// [RFC 3125 Section 6.2.2]: https://datatracker.ietf.org/doc/html/rfc3125#section-6.2.2
#[derive(Enumerated, Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
#[allow(missing_docs)]
pub enum CertRefReq {
    SignerOnly = 1,
    FullPath = 2,
}

/// CertInfoReq as defined in [RFC 3125 Section 6.2.2].
///
/// ```text
/// CertInfoReq ::= ENUMERATED {
///                      none        (0) ,
///                      signerOnly  (1) ,
///                      fullPath    (2)
///                      }
/// ```
///
/// [RFC 3125 Section 6.2.2]: https://datatracker.ietf.org/doc/html/rfc3125#section-6.2.2
#[derive(Enumerated, Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
#[allow(missing_docs)]
pub enum CertInfoReq {
    None = 0,
    SignerOnly = 1,
    FullPath = 2,
}

/// AlgAndLength as defined in [RFC 3125 Section 6.10].
///
/// ```text
/// AlgAndLength ::= SEQUENCE {
///      algID          OBJECT IDENTIFIER,
///      minKeyLength   [0] INTEGER OPTIONAL,
///                      -- Minimum key length in bits other
///      other          [1] SignPolExtensions OPTIONAL
///                          }
/// ```
///
/// [RFC 3125 Section 6.10]: https://datatracker.ietf.org/doc/html/rfc3125#section-6.10
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct AlgAndLength {
    pub alg_id: ObjectIdentifier,
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", optional = "true")]
    pub min_key_length: Option<u32>,
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", optional = "true")]
    pub other: Option<SignPolExtensions>,
}

/// CertificateTrustPoint as defined in [RFC 3125 Section 6.2.3].
///
/// ```text
/// CertificateTrustPoint ::= SEQUENCE {
///      trustpoint                Certificate,
///      pathLengthConstraint  [0] PathLenConstraint OPTIONAL,
///      acceptablePolicySet   [1] AcceptablePolicySet OPTIONAL,
///      nameConstraints       [2] NameConstraints OPTIONAL,
///      policyConstraints     [3] PolicyConstraints OPTIONAL }
///
/// AcceptablePolicySet ::= SEQUENCE OF CertPolicyId
/// ```
///
/// [RFC 3125 Section 6.2.3]: https://datatracker.ietf.org/doc/html/rfc3125#section-6.2.3
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct CertificateTrustPoint {
    pub trustpoint: Certificate,
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", optional = "true")]
    pub path_length_constraint: Option<u32>,
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", optional = "true")]
    pub acceptable_policy_set: Option<Vec<ObjectIdentifier>>,
    #[asn1(context_specific = "2", tag_mode = "IMPLICIT", optional = "true")]
    pub name_constraints: Option<NameConstraints>,
    #[asn1(context_specific = "3", tag_mode = "IMPLICIT", optional = "true")]
    pub policy_constraints: Option<PolicyConstraints>,
}

/// OID for the commitment-type-indication attribute: 1.2.840.113549.1.9.16.2.16. See [`CommitmentTypeIndication`].
pub const ID_AA_ETS_COMMITMENT_TYPE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.2.16");

/// CommitmentTypeIndication as defined in [RFC 5126 Section 5.11.1]. Qualifiers are retained undecoded.
///
/// ```text
/// CommitmentTypeIndication ::= SEQUENCE {
///   commitmentTypeId CommitmentTypeIdentifier,
///   commitmentTypeQualifier SEQUENCE SIZE (1..MAX) OF
///                  CommitmentTypeQualifier OPTIONAL}
/// ```
///
/// [RFC 5126 Section 5.11.1]: https://datatracker.ietf.org/doc/html/rfc5126#section-5.11.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct CommitmentTypeIndication {
    pub commitment_type_id: ObjectIdentifier,
    #[asn1(optional = "true")]
    pub commitment_type_qualifier: Option<Vec<Any>>,
}

#[test]
fn rev_req_decode_test() {
    use der::Decode;
    use hex_literal::hex;

    let enc = hex!("30030A0103");
    let rr = RevReq::from_der(&enc).unwrap();
    assert_eq!(EnuRevReq::EitherCheck, rr.enu_rev_req);
    assert!(rr.ex_rev_req.is_none());
}

#[test]
fn commitment_type_indication_decode_test() {
    use der::Decode;
    use hex_literal::hex;

    // proof of origin, 1.2.840.113549.1.9.16.6.1
    let enc = hex!("300D060B2A864886F70D0109100601");
    let cti = CommitmentTypeIndication::from_der(&enc).unwrap();
    assert_eq!(
        ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.6.1"),
        cti.commitment_type_id
    );
    assert!(cti.commitment_type_qualifier.is_none());
}

//! Error types

use core::fmt;

use serde::{Deserialize, Serialize};

/// Result type
pub type Result<T> = core::result::Result<T, Error>;

/// Reasons a constraint evaluation may conclude with a NOT_OK status
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PolicyValidationStatus {
    /// No errors were encountered while evaluating a constraint
    Valid,
    /// NullPolicySet occurs when the valid_policy_tree becomes NULL when processing a certificate while
    /// explicit policy is required, or when the valid_policy_tree is NULL after wrap-up processing with
    /// explicit policy required.
    NullPolicySet,
    /// InvalidPolicyMapping occurs when a policy mappings extension maps to or from anyPolicy.
    InvalidPolicyMapping,
    /// NameConstraintsViolation occurs when the subject name or a subject alternative name of a target
    /// certificate falls outside the permitted subtrees or within the excluded subtrees accumulated
    /// along a certification path.
    NameConstraintsViolation,
    /// InvalidBasicConstraints occurs when an intermediate certificate contains a basicConstraints
    /// extension with the cA field set to false.
    InvalidBasicConstraints,
    /// InvalidPathLength occurs when a path length constraint asserted by a CA certificate in a
    /// certification path is exceeded.
    InvalidPathLength,
    /// RevocationDataMissing occurs when a revocation check mandated by a policy could not find a valid
    /// CRL or OCSP token bearing a status for a certificate.
    RevocationDataMissing,
    /// CertificateRevoked occurs when available revocation data indicates a certificate is revoked.
    CertificateRevoked,
    /// MissingMandatedAttribute occurs when a signed or unsigned attribute mandated by a signature
    /// policy is not present.
    MissingMandatedAttribute,
    /// CertificateReferenceMismatch occurs when signing certificate references do not satisfy the
    /// mandated certificate reference requirement.
    CertificateReferenceMismatch,
    /// CertificateInfoMismatch occurs when the certificates embedded in a signature do not satisfy the
    /// mandated certificate info requirement.
    CertificateInfoMismatch,
    /// NoPathsFound occurs when no certification path could be built to a trust point.
    NoPathsFound,
    /// PathLengthExceeded occurs when the only paths available to a trust point are longer than the
    /// path length constraint asserted for the trust point.
    PathLengthExceeded,
    /// ProhibitedAlg occurs when a signature algorithm and key size do not satisfy any algorithm constraint.
    ProhibitedAlg,
    /// ExternalDataMismatch occurs when the presence of externally referenced signed data does not
    /// match the expectation declared in a signature policy.
    ExternalDataMismatch,
    /// PdfEntryMismatch occurs when one or more mandated PDF signature dictionary entries are absent or
    /// carry unexpected values.
    PdfEntryMismatch,
    /// UnknownSignPolExtension occurs when a signature policy carries an extension that is not recognized.
    UnknownSignPolExtension,
    /// TransactionLimitTooLow occurs when a QcEuLimitValue statement is absent or below the configured minimum.
    TransactionLimitTooLow,
    /// CommitmentRuleNotFound occurs when no commitment rule applies to the commitment type of a signature.
    CommitmentRuleNotFound,
    /// Misconfiguration occurs when settings or inputs prevent a constraint from being evaluated.
    Misconfiguration,
}

/// Error type
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Constraint evaluation failed for the indicated reason
    PolicyValidation(PolicyValidationStatus),
    /// Item could not be found
    NotFound,
    /// Item was not recognized
    Unrecognized,
    /// Length of an input was not as expected
    LengthError,
    /// Item could not be parsed
    ParseError,
    /// Asn1Error is used to propagate error information from the x509 crate.
    Asn1Error(der::Error),
    /// Propagates std::io::ErrorKind
    StdIoError(std::io::ErrorKind),
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Error {
        Error::Asn1Error(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::StdIoError(err.kind())
    }
}

impl From<PolicyValidationStatus> for Error {
    fn from(status: PolicyValidationStatus) -> Error {
        Error::PolicyValidation(status)
    }
}

impl fmt::Display for PolicyValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyValidationStatus::Valid => write!(f, "Valid"),
            PolicyValidationStatus::NullPolicySet => write!(f, "NullPolicySet"),
            PolicyValidationStatus::InvalidPolicyMapping => write!(f, "InvalidPolicyMapping"),
            PolicyValidationStatus::NameConstraintsViolation => {
                write!(f, "NameConstraintsViolation")
            }
            PolicyValidationStatus::InvalidBasicConstraints => write!(f, "InvalidBasicConstraints"),
            PolicyValidationStatus::InvalidPathLength => write!(f, "InvalidPathLength"),
            PolicyValidationStatus::RevocationDataMissing => write!(f, "RevocationDataMissing"),
            PolicyValidationStatus::CertificateRevoked => write!(f, "CertificateRevoked"),
            PolicyValidationStatus::MissingMandatedAttribute => {
                write!(f, "MissingMandatedAttribute")
            }
            PolicyValidationStatus::CertificateReferenceMismatch => {
                write!(f, "CertificateReferenceMismatch")
            }
            PolicyValidationStatus::CertificateInfoMismatch => write!(f, "CertificateInfoMismatch"),
            PolicyValidationStatus::NoPathsFound => write!(f, "NoPathsFound"),
            PolicyValidationStatus::PathLengthExceeded => write!(f, "PathLengthExceeded"),
            PolicyValidationStatus::ProhibitedAlg => write!(f, "ProhibitedAlg"),
            PolicyValidationStatus::ExternalDataMismatch => write!(f, "ExternalDataMismatch"),
            PolicyValidationStatus::PdfEntryMismatch => write!(f, "PdfEntryMismatch"),
            PolicyValidationStatus::UnknownSignPolExtension => write!(f, "UnknownSignPolExtension"),
            PolicyValidationStatus::TransactionLimitTooLow => write!(f, "TransactionLimitTooLow"),
            PolicyValidationStatus::CommitmentRuleNotFound => write!(f, "CommitmentRuleNotFound"),
            PolicyValidationStatus::Misconfiguration => write!(f, "Misconfiguration"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::PolicyValidation(err) => write!(f, "PolicyValidationError: {}", err),
            Error::NotFound => write!(f, "NotFound"),
            Error::Unrecognized => write!(f, "Unrecognized"),
            Error::LengthError => write!(f, "LengthError"),
            Error::ParseError => write!(f, "ParseError"),
            Error::Asn1Error(err) => write!(f, "Asn1Error: {}", err),
            Error::StdIoError(err) => write!(f, "StdIoError: {:?}", err),
        }
    }
}

#[test]
fn error_test() {
    let _s = format!("{}", PolicyValidationStatus::Valid);
    let _s = format!("{}", PolicyValidationStatus::NullPolicySet);
    let _s = format!("{}", PolicyValidationStatus::InvalidPolicyMapping);
    let _s = format!("{}", PolicyValidationStatus::NameConstraintsViolation);
    let _s = format!("{}", PolicyValidationStatus::InvalidBasicConstraints);
    let _s = format!("{}", PolicyValidationStatus::InvalidPathLength);
    let _s = format!("{}", PolicyValidationStatus::RevocationDataMissing);
    let _s = format!("{}", PolicyValidationStatus::CertificateRevoked);
    let _s = format!("{}", PolicyValidationStatus::MissingMandatedAttribute);
    let _s = format!("{}", PolicyValidationStatus::CertificateReferenceMismatch);
    let _s = format!("{}", PolicyValidationStatus::CertificateInfoMismatch);
    let _s = format!("{}", PolicyValidationStatus::NoPathsFound);
    let _s = format!("{}", PolicyValidationStatus::PathLengthExceeded);
    let _s = format!("{}", PolicyValidationStatus::ProhibitedAlg);
    let _s = format!("{}", PolicyValidationStatus::ExternalDataMismatch);
    let _s = format!("{}", PolicyValidationStatus::PdfEntryMismatch);
    let _s = format!("{}", PolicyValidationStatus::UnknownSignPolExtension);
    let _s = format!("{}", PolicyValidationStatus::TransactionLimitTooLow);
    let _s = format!("{}", PolicyValidationStatus::CommitmentRuleNotFound);
    let _s = format!("{}", PolicyValidationStatus::Misconfiguration);

    assert_eq!(
        "PolicyValidationError: NullPolicySet",
        format!("{}", Error::from(PolicyValidationStatus::NullPolicySet))
    );
    let _s = format!("{}", Error::NotFound);
    let _s = format!("{}", Error::Unrecognized);
    let _s = format!("{}", Error::LengthError);
    let _s = format!("{}", Error::ParseError);
    let _s = format!(
        "{}",
        Error::from(std::io::Error::from(std::io::ErrorKind::NotFound))
    );
}

//! Checks the signature algorithm and signing key size against an algorithm constraint list

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use der::asn1::ObjectIdentifier;
use log::debug;

use crate::util::error::*;
use crate::{AlgAndLength, ItemValidator};

/// Name used when reporting the outcome of a signer algorithm constraint check
pub const SIGNER_ALGORITHM_CONSTRAINTS: &str = "algorithmConstraintSet.signerAlgorithmConstraints";

/// `AlgorithmConstraint` pairs an algorithm with the minimum key size, in bits, acceptable for it. An absent
/// minimum accepts any key size.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AlgorithmConstraint {
    /// Signature algorithm
    pub algorithm: ObjectIdentifier,
    /// Minimum key size in bits
    pub min_key_length: Option<u32>,
}

impl From<&AlgAndLength> for AlgorithmConstraint {
    fn from(aal: &AlgAndLength) -> Self {
        AlgorithmConstraint {
            algorithm: aal.alg_id,
            min_key_length: aal.min_key_length,
        }
    }
}

impl AlgorithmConstraint {
    /// Returns true if `algorithm` is the constrained algorithm and `key_size` meets the minimum
    pub fn permits(&self, algorithm: &ObjectIdentifier, key_size: u32) -> bool {
        self.algorithm == *algorithm && self.min_key_length.map_or(true, |min| key_size >= min)
    }
}

/// `AlgorithmConstraintValidator` passes when the signature algorithm and the signing certificate's key size are
/// permitted by at least one entry of an allow list. An empty list permits everything.
pub struct AlgorithmConstraintValidator<'a> {
    constraints: &'a [AlgorithmConstraint],
    algorithm: Option<ObjectIdentifier>,
    key_size: u32,
}

impl<'a> AlgorithmConstraintValidator<'a> {
    /// Creates a validator for a signature made with `algorithm` using a key of `key_size` bits
    pub fn new(
        constraints: &'a [AlgorithmConstraint],
        algorithm: Option<ObjectIdentifier>,
        key_size: u32,
    ) -> Self {
        AlgorithmConstraintValidator {
            constraints,
            algorithm,
            key_size,
        }
    }

    /// Returns the entries naming the signature algorithm, whatever their minimum key size
    pub fn matching_algorithms(&self) -> Vec<&AlgorithmConstraint> {
        match &self.algorithm {
            Some(alg) => self
                .constraints
                .iter()
                .filter(|c| c.algorithm == *alg)
                .collect(),
            None => Vec::new(),
        }
    }
}

impl ItemValidator for AlgorithmConstraintValidator<'_> {
    fn name(&self) -> &str {
        SIGNER_ALGORITHM_CONSTRAINTS
    }

    fn check(&self) -> Result<()> {
        if self.constraints.is_empty() {
            return Ok(());
        }
        let permitted = match &self.algorithm {
            Some(alg) => self.constraints.iter().any(|c| c.permits(alg, self.key_size)),
            None => false,
        };
        if permitted {
            Ok(())
        } else {
            debug!(
                "No algorithm constraint permits {:?} with a {} bit key",
                self.algorithm, self.key_size
            );
            Err(Error::PolicyValidation(PolicyValidationStatus::ProhibitedAlg))
        }
    }

    fn error_detail(&self) -> Option<String> {
        if self.validate() {
            None
        } else {
            Some("Couldn't find minimum requirements for signer constraints".to_string())
        }
    }
}

#[test]
fn algorithm_constraint_test() {
    use const_oid::db::rfc5912::{ECDSA_WITH_SHA_256, SHA_256_WITH_RSA_ENCRYPTION};

    let constraints = [
        AlgorithmConstraint {
            algorithm: SHA_256_WITH_RSA_ENCRYPTION,
            min_key_length: Some(2048),
        },
        AlgorithmConstraint {
            algorithm: ECDSA_WITH_SHA_256,
            min_key_length: None,
        },
    ];

    let v = AlgorithmConstraintValidator::new(&constraints, Some(SHA_256_WITH_RSA_ENCRYPTION), 2048);
    assert!(v.validate());
    let v = AlgorithmConstraintValidator::new(&constraints, Some(SHA_256_WITH_RSA_ENCRYPTION), 1024);
    assert!(!v.validate());
    assert_eq!(1, v.matching_algorithms().len());
    assert_eq!(Some(PolicyValidationStatus::ProhibitedAlg), v.evaluate().error);
    assert_eq!(
        Some("Couldn't find minimum requirements for signer constraints".to_string()),
        v.error_detail()
    );

    assert!(AlgorithmConstraintValidator::new(&constraints, Some(ECDSA_WITH_SHA_256), 256).validate());
    assert!(!AlgorithmConstraintValidator::new(&constraints, None, 4096).validate());
    assert!(AlgorithmConstraintValidator::new(&[], None, 0).validate());
}

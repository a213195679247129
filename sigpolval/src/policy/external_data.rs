//! Checks whether signed content is carried outside of a signature as a signature policy expects

use alloc::format;
use alloc::string::String;

use crate::util::error::*;
use crate::ItemValidator;

/// Name used when reporting the outcome of an external signed data check
pub const EXTERNAL_SIGNED_DATA_CONSTRAINT: &str = "signerRules.externalSignedData";

/// `ExternalDataValidator` compares the presence of externally referenced signed content with the
/// externalSignedData expectation of a signer rules structure. An absent expectation always passes.
pub struct ExternalDataValidator {
    expected: Option<bool>,
    external: bool,
}

impl ExternalDataValidator {
    /// Creates a validator for a signature whose content is external when `external` is true
    pub fn new(expected: Option<bool>, external: bool) -> Self {
        ExternalDataValidator { expected, external }
    }
}

impl ItemValidator for ExternalDataValidator {
    fn name(&self) -> &str {
        EXTERNAL_SIGNED_DATA_CONSTRAINT
    }

    fn check(&self) -> Result<()> {
        match self.expected {
            Some(expected) if expected != self.external => Err(Error::PolicyValidation(
                PolicyValidationStatus::ExternalDataMismatch,
            )),
            _ => Ok(()),
        }
    }

    fn error_detail(&self) -> Option<String> {
        match self.expected {
            Some(expected) if expected != self.external => {
                Some(format!("Expected to be: {}", expected))
            }
            _ => None,
        }
    }
}

#[test]
fn external_data_test() {
    use alloc::string::ToString;

    assert!(ExternalDataValidator::new(None, true).validate());
    assert!(ExternalDataValidator::new(None, false).validate());
    assert!(ExternalDataValidator::new(Some(true), true).validate());
    assert!(ExternalDataValidator::new(Some(false), false).validate());

    let v = ExternalDataValidator::new(Some(true), false);
    assert!(!v.validate());
    assert_eq!(Some("Expected to be: true".to_string()), v.error_detail());
    let r = v.evaluate();
    assert_eq!(Some(PolicyValidationStatus::ExternalDataMismatch), r.error);
    assert!(!ExternalDataValidator::new(Some(false), true).validate());
}

//! Basic constraints processing, i.e., path length constraint enforcement and verification that intermediate
//! certificates are CA certificates

use log::debug;

use crate::util::error::*;
use crate::util::logging::log_error_for_cert;
use crate::{CertificationPath, ConstraintEvaluator, ConstraintLevel, ConstraintResult};

/// Name used when reporting the outcome of basic constraints processing
pub const BASIC_CONSTRAINTS_CONSTRAINT: &str = "basicConstraints";

/// `check_basic_constraints` enforces pathLenConstraint values asserted by CA certificates in the path.
///
/// A path containing a single certificate always passes. Otherwise, a budget seeded with the length of the path
/// is decremented for each certificate that is not self-signed, walking from the trust anchor toward the target,
/// and is capped by each pathLenConstraint encountered. Processing stops at a target that is not a CA. A
/// certificate that would take the budget below zero fails with [`PolicyValidationStatus::InvalidPathLength`].
///
/// An intermediate certificate whose basicConstraints extension has the cA field cleared fails with
/// [`PolicyValidationStatus::InvalidBasicConstraints`]. Intermediate certificates that lack the extension are not
/// rejected here.
pub fn check_basic_constraints(path: &CertificationPath) -> Result<()> {
    let n = path.len();
    if n <= 1 {
        return Ok(());
    }

    for cert in &path.certificates[1..n - 1] {
        if let Some(bc) = &cert.basic_constraints {
            if !bc.ca {
                log_error_for_cert(cert, "intermediate certificate is not a CA");
                return Err(Error::PolicyValidation(
                    PolicyValidationStatus::InvalidBasicConstraints,
                ));
            }
        }
    }

    let mut max_path_length = n as u32;
    for (pos, cert) in path.from_anchor().enumerate() {
        let is_target = pos == n - 1;
        if is_target && !cert.is_ca() {
            break;
        }
        if !cert.self_signed {
            if max_path_length == 0 {
                log_error_for_cert(cert, "path length constraint violated");
                return Err(Error::PolicyValidation(
                    PolicyValidationStatus::InvalidPathLength,
                ));
            }
            max_path_length -= 1;
        }
        if let Some(pl) = cert.path_len_constraint() {
            if pl < max_path_length {
                debug!(
                    "Reducing remaining path length to {} per {}",
                    pl, cert.subject_dn
                );
            }
            max_path_length = max_path_length.min(pl);
        }
    }
    Ok(())
}

/// `evaluate_basic_constraints` runs [`check_basic_constraints`] and reports the outcome as a
/// [`ConstraintResult`].
pub fn evaluate_basic_constraints(path: &CertificationPath) -> ConstraintResult {
    ConstraintEvaluator::new(BASIC_CONSTRAINTS_CONSTRAINT, ConstraintLevel::Fail)
        .evaluate(|| check_basic_constraints(path))
}

#[test]
fn path_length_test() {
    use crate::{CertificateNode, CertificateNodeBuilder};

    fn ca(id: &str, self_signed: bool, pl: Option<u8>) -> CertificateNode {
        CertificateNodeBuilder::new(id)
            .self_signed(self_signed)
            .basic_constraints(true, pl)
            .build()
    }
    let ee = CertificateNodeBuilder::new("ee").build();

    // root with pathLen 0 over an intermediate CA
    let path = CertificationPath::new(vec![ee.clone(), ca("ca", false, None), ca("root", true, Some(0))]);
    assert_eq!(
        Err(Error::PolicyValidation(
            PolicyValidationStatus::InvalidPathLength
        )),
        check_basic_constraints(&path)
    );

    let path = CertificationPath::new(vec![ee.clone(), ca("ca", false, Some(0)), ca("root", true, Some(1))]);
    assert!(check_basic_constraints(&path).is_ok());

    let path = CertificationPath::new(vec![ee.clone()]);
    assert!(evaluate_basic_constraints(&path).is_ok());

    let not_ca = CertificateNodeBuilder::new("notca").basic_constraints(false, None).build();
    let path = CertificationPath::new(vec![ee, not_ca, ca("root", true, None)]);
    assert_eq!(
        Some(PolicyValidationStatus::InvalidBasicConstraints),
        evaluate_basic_constraints(&path).error
    );
}

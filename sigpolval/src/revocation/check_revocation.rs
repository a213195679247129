//! Evaluation of a signature policy RevReq against available revocation data
//!
//! The functions in this module dispatch on the [`EnuRevReq`] value from a signature policy. A certificate for
//! which a check is mandated but no usable token is available yields
//! `Err(Error::PolicyValidation(RevocationDataMissing))` rather than a negative status, so callers can tell the
//! difference between "revoked" and "unknown".

use alloc::format;

use log::{debug, info};

use crate::util::error::*;
use crate::util::logging::log_error_for_cert;
use crate::{
    is_revocation_required, CertificateNode, ConstraintEvaluator, ConstraintLevel,
    ConstraintResult, ConstraintSettings, EnuRevReq, RevocationToken, RevocationTokenSource,
    RevocationTokenType,
};

/// Name used when reporting the outcome of a revocation check
pub const REVOCATION_CONSTRAINT: &str = "revocation";

/// `find_status` returns the status conveyed by the most recent token of the given type that is valid, carries a
/// status and, when `max_age` is provided, is no older than `max_age` seconds before `validation_time`.
pub fn find_status(
    tokens: &[RevocationToken],
    token_type: RevocationTokenType,
    validation_time: u64,
    max_age: Option<u64>,
) -> Option<bool> {
    tokens
        .iter()
        .filter(|t| t.token_type == token_type && t.valid)
        .filter(|t| match max_age {
            Some(max_age) => t.is_fresh(validation_time, max_age),
            None => true,
        })
        .filter_map(|t| t.status.map(|s| (t.this_update, s)))
        .max_by_key(|(this_update, _)| *this_update)
        .map(|(_, s)| s)
}

/// `RevReqValidator` evaluates RevReq values for individual certificates using tokens from a
/// [`RevocationTokenSource`].
///
/// It references the following values in the [`ConstraintSettings`] parameter:
/// - PS_VALIDATION_TIME,
/// - PS_REVOCATION_FRESHNESS,
/// - PS_REVOCATION_SKIP_EXTENSIONS,
/// - PS_REVOCATION_SKIP_POLICIES.
pub struct RevReqValidator<'a> {
    settings: &'a ConstraintSettings,
    source: &'a dyn RevocationTokenSource,
}

impl<'a> RevReqValidator<'a> {
    /// Creates a validator that reads tokens from `source`
    pub fn new(settings: &'a ConstraintSettings, source: &'a dyn RevocationTokenSource) -> Self {
        RevReqValidator { settings, source }
    }

    fn check_token_type(
        &self,
        cert: &CertificateNode,
        token_type: RevocationTokenType,
    ) -> Result<bool> {
        let tokens = self.source.get_revocation_tokens(cert);
        match find_status(
            &tokens,
            token_type,
            self.settings.get_validation_time(),
            self.settings.get_revocation_freshness(),
        ) {
            Some(status) => {
                debug!(
                    "Found {} status {} for {}",
                    token_type, status, cert.subject_dn
                );
                Ok(status)
            }
            None => {
                info!(
                    "No usable {} data found for {} among {} tokens",
                    token_type,
                    cert.subject_dn,
                    tokens.len()
                );
                Err(Error::PolicyValidation(
                    PolicyValidationStatus::RevocationDataMissing,
                ))
            }
        }
    }

    /// Returns the status from CRL data for `cert`, true if not revoked
    pub fn check_crl(&self, cert: &CertificateNode) -> Result<bool> {
        self.check_token_type(cert, RevocationTokenType::Crl)
    }

    /// Returns the status from OCSP data for `cert`, true if not revoked
    pub fn check_ocsp(&self, cert: &CertificateNode) -> Result<bool> {
        self.check_token_type(cert, RevocationTokenType::Ocsp)
    }

    /// `check_revocation` dispatches on `rev_req`:
    /// - noCheck yields true,
    /// - other yields false,
    /// - crlCheck and ocspCheck consult the corresponding data,
    /// - bothCheck requires both OCSP and CRL data to show the certificate is not revoked,
    /// - eitherCheck consults OCSP data, falling back to CRL data only when no usable OCSP data is available.
    pub fn check_revocation(&self, rev_req: EnuRevReq, cert: &CertificateNode) -> Result<bool> {
        match rev_req {
            EnuRevReq::NoCheck => Ok(true),
            EnuRevReq::Other => Ok(false),
            EnuRevReq::CrlCheck => self.check_crl(cert),
            EnuRevReq::OcspCheck => self.check_ocsp(cert),
            EnuRevReq::BothCheck => Ok(self.check_ocsp(cert)? && self.check_crl(cert)?),
            EnuRevReq::EitherCheck => match self.check_ocsp(cert) {
                Ok(status) => Ok(status),
                Err(_) => {
                    debug!("Falling back to CRL for {}", cert.subject_dn);
                    self.check_crl(cert)
                }
            },
        }
    }

    /// `check_rev_req` returns Ok when `cert` needs no revocation data or when the data mandated by `rev_req`
    /// shows the certificate is not revoked. Revoked certificates yield
    /// [`PolicyValidationStatus::CertificateRevoked`], absent data yields
    /// [`PolicyValidationStatus::RevocationDataMissing`] and the unsupported `other` value yields
    /// [`PolicyValidationStatus::Misconfiguration`].
    pub fn check_rev_req(&self, rev_req: EnuRevReq, cert: &CertificateNode) -> Result<()> {
        let requirement = is_revocation_required(self.settings, cert);
        if !requirement.required {
            debug!(
                "Revocation data not required for {} ({})",
                cert.subject_dn, requirement.reason
            );
            return Ok(());
        }

        match self.check_revocation(rev_req, cert) {
            Ok(true) => Ok(()),
            Ok(false) if rev_req == EnuRevReq::Other => {
                log_error_for_cert(cert, "unsupported revocation requirement");
                Err(Error::PolicyValidation(
                    PolicyValidationStatus::Misconfiguration,
                ))
            }
            Ok(false) => {
                log_error_for_cert(cert, "certificate is revoked");
                Err(Error::PolicyValidation(
                    PolicyValidationStatus::CertificateRevoked,
                ))
            }
            Err(e) => {
                log_error_for_cert(cert, &format!("revocation check failed: {}", e));
                Err(e)
            }
        }
    }

    /// Returns true when revocation data is not required for `cert` or when the check mandated by `rev_req`
    /// succeeds.
    pub fn validate(&self, rev_req: EnuRevReq, cert: &CertificateNode) -> bool {
        self.check_rev_req(rev_req, cert).is_ok()
    }

    /// Runs [`RevReqValidator::check_rev_req`] and reports the outcome as a [`ConstraintResult`].
    pub fn evaluate(&self, rev_req: EnuRevReq, cert: &CertificateNode) -> ConstraintResult {
        ConstraintEvaluator::new(REVOCATION_CONSTRAINT, ConstraintLevel::Fail)
            .evaluate(|| self.check_rev_req(rev_req, cert))
    }
}

#[cfg(test)]
fn token(token_type: RevocationTokenType, status: Option<bool>, this_update: u64) -> RevocationToken {
    RevocationToken::new(token_type, true, status, this_update)
}

#[test]
fn find_status_test() {
    let tokens = vec![
        token(RevocationTokenType::Crl, Some(true), 100),
        token(RevocationTokenType::Crl, Some(false), 200),
        token(RevocationTokenType::Crl, None, 300),
        RevocationToken::new(RevocationTokenType::Crl, false, Some(true), 400),
        token(RevocationTokenType::Ocsp, Some(true), 50),
    ];
    assert_eq!(
        Some(false),
        find_status(&tokens, RevocationTokenType::Crl, 1_000, None)
    );
    assert_eq!(
        None,
        find_status(&tokens, RevocationTokenType::Crl, 1_000, Some(500))
    );
    assert_eq!(
        Some(true),
        find_status(&tokens, RevocationTokenType::Ocsp, 100, Some(50))
    );
    assert_eq!(None, find_status(&[], RevocationTokenType::Ocsp, 100, None));
}

#[test]
fn check_revocation_dispatch_test() {
    use crate::{CertificateNodeBuilder, RevocationTokens};

    let cert = CertificateNodeBuilder::new("ee").subject_dn("CN=EE").build();
    let crl_only = CertificateNodeBuilder::new("crl").subject_dn("CN=CRL").build();
    let mut tokens = RevocationTokens::new();
    tokens.add_token(&cert, token(RevocationTokenType::Ocsp, Some(true), 10));
    tokens.add_token(&cert, token(RevocationTokenType::Crl, Some(false), 10));
    tokens.add_token(&crl_only, token(RevocationTokenType::Crl, Some(true), 10));

    let mut settings = ConstraintSettings::new();
    settings.set_validation_time(20);
    let v = RevReqValidator::new(&settings, &tokens);

    assert_eq!(Ok(true), v.check_revocation(EnuRevReq::NoCheck, &cert));
    assert_eq!(Ok(false), v.check_revocation(EnuRevReq::Other, &cert));
    assert_eq!(Ok(true), v.check_revocation(EnuRevReq::OcspCheck, &cert));
    assert_eq!(Ok(false), v.check_revocation(EnuRevReq::CrlCheck, &cert));
    assert_eq!(Ok(false), v.check_revocation(EnuRevReq::BothCheck, &cert));
    assert_eq!(Ok(true), v.check_revocation(EnuRevReq::EitherCheck, &cert));
    assert_eq!(Ok(true), v.check_revocation(EnuRevReq::EitherCheck, &crl_only));
    assert_eq!(
        Err(Error::PolicyValidation(
            PolicyValidationStatus::RevocationDataMissing
        )),
        v.check_revocation(EnuRevReq::OcspCheck, &crl_only)
    );

    assert!(!v.validate(EnuRevReq::CrlCheck, &cert));
    assert!(v.validate(EnuRevReq::CrlCheck, &cert.with_trust(true)));
    assert_eq!(
        Some(PolicyValidationStatus::CertificateRevoked),
        v.evaluate(EnuRevReq::BothCheck, &cert).error
    );
    assert_eq!(
        Some(PolicyValidationStatus::Misconfiguration),
        v.evaluate(EnuRevReq::Other, &cert).error
    );
}

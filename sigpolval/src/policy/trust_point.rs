//! Certification path building to signature policy trust points and evaluation of trust conditions
//!
//! A trust condition (signingCertTrustCondition or timeStampTrustCondition) is satisfied when:
//! - the end certificate satisfies the endCertRevReq revocation requirement,
//! - a path can be built to one of the declared trust points (or, when none are declared, the known chain can be
//!   assembled from the available certificates), and
//! - every CA certificate in the path satisfies the caCerts revocation requirement. Certificates that are both
//!   self-signed and trusted are not checked.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use log::{debug, info};
use x509_cert::ext::pkix::constraints::PolicyConstraints;

use crate::util::error::*;
use crate::{
    build_known_chain, check_basic_constraints, check_certificate_policies,
    check_name_constraints_from_state, find_paths_to_trust_point, CertRevReq, CertificateNode,
    CertificateTrustPoint, CertificationPath, ConstraintSettings, ItemValidator, LeafNames,
    NameConstraintState, NameConstraintsInfo, ObjectIdentifierSet, RevReqValidator,
    RevocationTokenSource,
};

/// Name used when reporting the outcome of path building to a trust point
pub const TRUST_POINT_PATH_CONSTRAINT: &str = "trustPointPath";

/// `TrustPoint` is the evaluation-ready form of a CertificateTrustPoint from a signature policy.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TrustPoint {
    /// Trust point certificate
    pub trust_point: CertificateNode,
    /// Maximum number of non-self-issued intermediate certificates between the trust point and the target
    pub path_length_constraint: Option<u32>,
    /// Policies acceptable for the target certificate, absent when any policy is acceptable
    pub acceptable_policy_set: Option<ObjectIdentifierSet>,
    /// Name constraints that apply to certificates subordinate to the trust point
    pub name_constraints: Vec<NameConstraintsInfo>,
    /// Policy constraints that apply as if asserted by the trust point certificate
    pub policy_constraints: Option<PolicyConstraints>,
}

impl TrustPoint {
    /// Creates a trust point with no constraints
    pub fn new(trust_point: CertificateNode) -> Self {
        TrustPoint {
            trust_point,
            ..Default::default()
        }
    }

    /// Returns the node used as the trust anchor of paths built to this trust point. The node is marked trusted
    /// and carries the declared policy constraints in place of any asserted by the certificate.
    pub fn anchor(&self) -> CertificateNode {
        let anchor = self.trust_point.with_trust(true);
        match &self.policy_constraints {
            Some(pc) => anchor.with_policy_constraints(Some(pc.clone())),
            None => anchor,
        }
    }
}

impl TryFrom<&CertificateTrustPoint> for TrustPoint {
    type Error = Error;

    fn try_from(ctp: &CertificateTrustPoint) -> Result<Self> {
        Ok(TrustPoint {
            trust_point: CertificateNode::try_from(&ctp.trustpoint)?,
            path_length_constraint: ctp.path_length_constraint,
            acceptable_policy_set: ctp
                .acceptable_policy_set
                .as_ref()
                .map(|aps| aps.iter().copied().collect()),
            name_constraints: match &ctp.name_constraints {
                Some(nc) => vec![NameConstraintsInfo::from(nc)],
                None => Vec::new(),
            },
            policy_constraints: ctp.policy_constraints.clone(),
        })
    }
}

/// `TrustPointPathValidator` builds paths from a target certificate to a trust point and returns the shortest
/// path that satisfies the trust point's constraints. Each candidate path is checked for:
/// - basic constraints,
/// - certificate policies, with the acceptable policy set as the initial policy set and explicit policy required
///   when an acceptable policy set is declared,
/// - name constraints, seeded with those declared for the trust point.
///
/// A path longer than the declared path length constraint yields [`PolicyValidationStatus::PathLengthExceeded`],
/// which is distinct from [`PolicyValidationStatus::NoPathsFound`].
pub struct TrustPointPathValidator<'a> {
    settings: &'a ConstraintSettings,
    trust_point: &'a TrustPoint,
    target: &'a CertificateNode,
    pool: &'a [CertificateNode],
}

impl<'a> TrustPointPathValidator<'a> {
    /// Creates a validator for paths from `target` through `pool` to `trust_point`
    pub fn new(
        settings: &'a ConstraintSettings,
        trust_point: &'a TrustPoint,
        target: &'a CertificateNode,
        pool: &'a [CertificateNode],
    ) -> Self {
        TrustPointPathValidator {
            settings,
            trust_point,
            target,
            pool,
        }
    }

    fn path_settings(&self) -> ConstraintSettings {
        let mut settings = self.settings.clone();
        if let Some(aps) = &self.trust_point.acceptable_policy_set {
            settings.set_initial_policy_set_from_oid_set(aps);
            settings.set_initial_explicit_policy_indicator(true);
        }
        settings
    }

    fn check_path(&self, settings: &ConstraintSettings, path: &CertificationPath) -> Result<()> {
        check_basic_constraints(path)?;
        check_certificate_policies(settings, path)?;
        check_name_constraints_from_state(
            NameConstraintState::from_constraints(&self.trust_point.name_constraints),
            path,
            &LeafNames::from(self.target),
        )
    }

    /// Returns the shortest acceptable path to the trust point
    pub fn build_path(&self) -> Result<CertificationPath> {
        let paths = find_paths_to_trust_point(
            self.target,
            &self.trust_point.anchor(),
            self.pool,
            self.trust_point.path_length_constraint,
        )?;

        let settings = self.path_settings();
        let mut last_error = Error::PolicyValidation(PolicyValidationStatus::NoPathsFound);
        for path in paths {
            match self.check_path(&settings, &path) {
                Ok(()) => return Ok(path),
                Err(e) => {
                    debug!(
                        "Discarding path of length {} to {}: {}",
                        path.len(),
                        self.trust_point.trust_point.subject_dn,
                        e
                    );
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

impl ItemValidator for TrustPointPathValidator<'_> {
    fn name(&self) -> &str {
        TRUST_POINT_PATH_CONSTRAINT
    }

    fn check(&self) -> Result<()> {
        self.build_path().map(|_| ())
    }
}

/// Returns the path for `target` given the declared trust points. When no trust points are declared, the known
/// chain assembled from `pool` is returned. Otherwise the first trust point to which an acceptable path can be
/// built determines the result. The error from the last trust point tried is returned when no path is found.
pub fn build_trusted_path(
    settings: &ConstraintSettings,
    target: &CertificateNode,
    trust_points: &[TrustPoint],
    pool: &[CertificateNode],
) -> Result<CertificationPath> {
    if trust_points.is_empty() {
        return Ok(build_known_chain(target, pool));
    }
    let mut last_error = Error::PolicyValidation(PolicyValidationStatus::NoPathsFound);
    for tp in trust_points {
        match TrustPointPathValidator::new(settings, tp, target, pool).build_path() {
            Ok(path) => return Ok(path),
            Err(e) => last_error = e,
        }
    }
    Err(last_error)
}

/// Trust condition for the signing certificate or for time stamp authority certificates
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TrustCondition {
    /// Trust points, empty when none are declared
    pub trust_points: Vec<TrustPoint>,
    /// Revocation requirements for the end certificate and CA certificates
    pub rev_req: CertRevReq,
}

/// Outcome of evaluating a [`TrustCondition`]. `errors` maps a rule path to a description and is empty when the
/// condition is satisfied.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TrustConditionResult {
    /// Certification path that was built, empty when none could be
    pub path: CertificationPath,
    /// Failures keyed by rule path
    pub errors: BTreeMap<String, String>,
}

impl TrustConditionResult {
    /// Returns true if no failures were recorded
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// `evaluate_trust_condition` evaluates `condition` for `cert`, recording failures under keys formed from `label`
/// and the rule names, e.g., "signingCertTrustCondition.signerRevReq.endCertRevReq" or
/// "signingCertTrustCondition.signerTrustTrees". All checks are carried out even when an earlier one fails.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_trust_condition(
    settings: &ConstraintSettings,
    source: &dyn RevocationTokenSource,
    label: &str,
    rev_req_label: &str,
    trust_trees_label: &str,
    condition: &TrustCondition,
    cert: &CertificateNode,
    pool: &[CertificateNode],
) -> TrustConditionResult {
    let mut result = TrustConditionResult::default();
    let rev = RevReqValidator::new(settings, source);
    if !rev.validate(condition.rev_req.end_cert_rev_req.enu_rev_req, cert) {
        result.errors.insert(
            format!("{}.{}.endCertRevReq", label, rev_req_label),
            "End certificate is revoked".to_string(),
        );
    }

    match build_trusted_path(settings, cert, &condition.trust_points, pool) {
        Ok(path) => {
            let ca_rev_req = condition.rev_req.ca_certs.enu_rev_req;
            let ca_revoked = path
                .certificates
                .iter()
                .skip(1)
                .filter(|c| !(c.self_signed && c.trusted))
                .any(|c| !rev.validate(ca_rev_req, c));
            if ca_revoked {
                result.errors.insert(
                    format!("{}.{}.caCerts", label, rev_req_label),
                    "One of the CA certificates is revoked".to_string(),
                );
            }
            result.path = path;
        }
        Err(e) => {
            info!("Failed to build path for {}: {}", cert.subject_dn, e);
            let detail = match e {
                Error::PolicyValidation(PolicyValidationStatus::PathLengthExceeded) => {
                    "Certification path to the trust point exceeds the path length constraint"
                }
                _ => "Could not build certification path to a trust point",
            };
            result
                .errors
                .insert(format!("{}.{}", label, trust_trees_label), detail.to_string());
        }
    }
    result
}

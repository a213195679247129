//! Signature validation policy rules and their evaluation against a signature
//!
//! A [`SignatureValidationPolicy`] carries common rules and a list of commitment rules. The rules that apply to a
//! signature are those of the commitment rule selected by each commitment type indicated in the signature (or the
//! rule that applies when no commitment type is indicated), with any component the commitment rule omits taken
//! from the common rules. [`SignaturePolicyValidator`] evaluates every applicable rule and gathers failures into
//! a [`SignaturePolicyReport`].

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use der::asn1::ObjectIdentifier;
use log::{debug, info};

use crate::policy::trust_point::TrustConditionResult;
use crate::{
    evaluate_trust_condition, AlgorithmConstraint, AlgorithmConstraintValidator,
    CertInfoReq, CertInfoReqValidator, CertRefReq, CertRefReqValidator, CertificationPath,
    ConstraintResult, ConstraintSettings, ExternalDataValidator, ItemValidator,
    MandatedAttributesValidator, PdfEntry, PdfEntryValidator, RevocationTokenSource,
    SignPolExtensions, SignatureInfo, TrustCondition, MANDATED_SIGNED_ATTR_CONSTRAINT,
    MANDATED_UNSIGNED_ATTR_CONSTRAINT, VERIFIER_MANDATED_UNSIGNED_ATTR_CONSTRAINT,
    sign_pol_extension_validator,
};

/// Key under which a missing commitment rule is reported
pub const COMMITMENT_RULES: &str = "commitmentRules";

/// SignerRules as defined in RFC 3125 Section 6.2.1, plus entries mandated for PDF signature dictionaries
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SignerRules {
    /// True if the signed content must be external to the signature, false if it must be encapsulated
    pub external_signed_data: Option<bool>,
    /// Signed attributes that must be present
    pub mandated_signed_attr: Vec<ObjectIdentifier>,
    /// Unsigned attributes that must be present
    pub mandated_unsigned_attr: Vec<ObjectIdentifier>,
    /// Certificate references that must be present, signerOnly when absent
    pub mandated_certificate_ref: Option<CertRefReq>,
    /// Certificates that must be embedded, none when absent
    pub mandated_certificate_info: Option<CertInfoReq>,
    /// Entries that must appear in a PDF signature dictionary
    pub mandated_pdf_entries: Vec<PdfEntry>,
    /// Signature policy extensions
    pub sign_pol_extensions: Option<SignPolExtensions>,
}

/// VerifierRules as defined in RFC 3125 Section 6.2.1
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VerifierRules {
    /// Unsigned attributes that must be present
    pub mandated_unsigned_attr: Vec<ObjectIdentifier>,
    /// Signature policy extensions
    pub sign_pol_extensions: Option<SignPolExtensions>,
}

/// SignerAndVerifierRules as defined in RFC 3125 Section 6.2.1
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SignerAndVerifierRules {
    /// Rules for the signer
    pub signer_rules: SignerRules,
    /// Rules for the verifier
    pub verifier_rules: VerifierRules,
}

/// AlgorithmConstraintSet as defined in RFC 3125 Section 6.10. Only signer algorithm constraints are evaluated.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AlgorithmConstraintSet {
    /// Algorithms and minimum key sizes acceptable for the signature
    pub signer_algorithm_constraints: Vec<AlgorithmConstraint>,
}

/// Rule components shared by [`CommonRules`] and [`CommitmentRule`]. Absent components are taken from the
/// common rules when a commitment rule is selected.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RuleSet {
    /// Signer and verifier rules
    pub signer_and_verifier_rules: Option<SignerAndVerifierRules>,
    /// Trust condition for the signing certificate
    pub signing_cert_trust_condition: Option<TrustCondition>,
    /// Trust condition for time stamp authority certificates
    pub timestamp_trust_condition: Option<TrustCondition>,
    /// Algorithm constraints
    pub algorithm_constraint_set: Option<AlgorithmConstraintSet>,
    /// Signature policy extensions
    pub sign_pol_extensions: Option<SignPolExtensions>,
}

impl RuleSet {
    /// Returns a rule set with each absent component taken from `common`. Extensions are not inherited.
    pub fn merged_with(&self, common: &RuleSet) -> RuleSet {
        RuleSet {
            signer_and_verifier_rules: self
                .signer_and_verifier_rules
                .clone()
                .or_else(|| common.signer_and_verifier_rules.clone()),
            signing_cert_trust_condition: self
                .signing_cert_trust_condition
                .clone()
                .or_else(|| common.signing_cert_trust_condition.clone()),
            timestamp_trust_condition: self
                .timestamp_trust_condition
                .clone()
                .or_else(|| common.timestamp_trust_condition.clone()),
            algorithm_constraint_set: self
                .algorithm_constraint_set
                .clone()
                .or_else(|| common.algorithm_constraint_set.clone()),
            sign_pol_extensions: self.sign_pol_extensions.clone(),
        }
    }
}

/// CommonRules as defined in RFC 3125 Section 6.1
pub type CommonRules = RuleSet;

/// CommitmentRule as defined in RFC 3125 Section 6.1
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommitmentRule {
    /// Commitment types the rule applies to. `None` selects signatures that indicate no commitment type.
    pub sel_commitment_types: Vec<Option<ObjectIdentifier>>,
    /// Rule components
    pub rules: RuleSet,
}

impl CommitmentRule {
    /// Returns true if the rule applies to `commitment_type`
    pub fn selects(&self, commitment_type: Option<&ObjectIdentifier>) -> bool {
        self.sel_commitment_types
            .iter()
            .any(|sel| sel.as_ref() == commitment_type)
    }
}

/// SignatureValidationPolicy as defined in RFC 3125 Section 6
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SignatureValidationPolicy {
    /// Rules that apply unless overridden by a commitment rule
    pub common_rules: CommonRules,
    /// Commitment rules
    pub commitment_rules: Vec<CommitmentRule>,
    /// Signature policy extensions
    pub sign_pol_extensions: Option<SignPolExtensions>,
}

impl SignatureValidationPolicy {
    /// Returns the merged rule set for each of `commitment_types`, or for a signature indicating no commitment
    /// type when `commitment_types` is empty. Each rule set appears once even if selected by several types.
    /// Fails with [`crate::PolicyValidationStatus::CommitmentRuleNotFound`] if any commitment type selects no rule.
    pub fn find_commitment_rules(
        &self,
        commitment_types: &[ObjectIdentifier],
    ) -> crate::Result<Vec<RuleSet>> {
        let selectors: Vec<Option<&ObjectIdentifier>> = if commitment_types.is_empty() {
            vec![None]
        } else {
            commitment_types.iter().map(Some).collect()
        };

        let mut selected: Vec<usize> = Vec::new();
        for sel in selectors {
            match self.commitment_rules.iter().position(|r| r.selects(sel)) {
                Some(index) => {
                    if !selected.contains(&index) {
                        selected.push(index);
                    }
                }
                None => {
                    info!("No commitment rule selects commitment type {:?}", sel);
                    return Err(crate::Error::PolicyValidation(
                        crate::PolicyValidationStatus::CommitmentRuleNotFound,
                    ));
                }
            }
        }
        Ok(selected
            .into_iter()
            .map(|i| self.commitment_rules[i].rules.merged_with(&self.common_rules))
            .collect())
    }
}

/// `SignaturePolicyReport` gathers the outcome of evaluating a signature against a signature validation policy.
/// `errors` maps the path of each failing rule to a description.
#[derive(Clone, Debug, Default)]
pub struct SignaturePolicyReport {
    /// Failures keyed by rule path, e.g., "signerRules.mandatedSignedAttr"
    pub errors: BTreeMap<String, String>,
    /// Result of every item check that was evaluated
    pub results: Vec<ConstraintResult>,
    /// Certification path built for the signing certificate
    pub signer_path: CertificationPath,
}

impl SignaturePolicyReport {
    /// Returns true if no failures were recorded
    pub fn status(&self) -> bool {
        self.errors.is_empty()
    }

    fn add_error(&mut self, key: &str, detail: &str) {
        debug!("{}: {}", key, detail);
        self.errors.insert(key.to_string(), detail.to_string());
    }

    fn add_result(&mut self, result: ConstraintResult) {
        self.results.push(result);
    }

    fn merge_trust_condition(&mut self, tcr: TrustConditionResult) {
        for (k, v) in tcr.errors {
            self.add_error(&k, &v);
        }
    }
}

/// `SignaturePolicyValidator` evaluates a [`SignatureInfo`] against a [`SignatureValidationPolicy`]. For each
/// applicable commitment rule:
/// - the signing certificate trust condition is evaluated first, producing the signer's certification path,
/// - signer and verifier rules are evaluated using that path,
/// - the time stamp trust condition is evaluated for each time stamp signer,
/// - signer algorithm constraints and signature policy extensions are evaluated.
///
/// Every check runs; failures are recorded in the report rather than ending evaluation.
pub struct SignaturePolicyValidator<'a> {
    settings: &'a ConstraintSettings,
    policy: &'a SignatureValidationPolicy,
    signature: &'a SignatureInfo,
    revocation: &'a dyn RevocationTokenSource,
}

impl<'a> SignaturePolicyValidator<'a> {
    /// Creates a validator
    pub fn new(
        settings: &'a ConstraintSettings,
        policy: &'a SignatureValidationPolicy,
        signature: &'a SignatureInfo,
        revocation: &'a dyn RevocationTokenSource,
    ) -> Self {
        SignaturePolicyValidator {
            settings,
            policy,
            signature,
            revocation,
        }
    }

    /// Evaluates the signature and returns the report
    pub fn validate(&self) -> SignaturePolicyReport {
        let mut report = SignaturePolicyReport::default();

        self.validate_extensions(
            &mut report,
            "signatureValidationPolicy.signPolExtensions",
            self.policy.sign_pol_extensions.as_deref(),
        );

        let rule_sets = match self
            .policy
            .find_commitment_rules(&self.signature.commitment_types)
        {
            Ok(rs) => rs,
            Err(_) => {
                report.add_error(COMMITMENT_RULES, "The commitment type used was not found");
                return report;
            }
        };

        for rules in &rule_sets {
            let signer_path = self.validate_signing_cert_trust_condition(&mut report, rules);
            if let Some(svr) = &rules.signer_and_verifier_rules {
                self.validate_signer_rules(&mut report, &svr.signer_rules, &signer_path);
                self.validate_verifier_rules(&mut report, &svr.verifier_rules);
            }
            self.validate_timestamp_trust_condition(&mut report, rules);
            if let Some(acs) = &rules.algorithm_constraint_set {
                self.validate_algorithm_constraint_set(&mut report, acs);
            }
            self.validate_extensions(
                &mut report,
                "commitmentRule.signPolExtensions",
                rules.sign_pol_extensions.as_deref(),
            );
            report.signer_path = signer_path;
        }
        report
    }

    fn validate_extensions(
        &self,
        report: &mut SignaturePolicyReport,
        key: &str,
        extensions: Option<&[crate::SignPolExtn]>,
    ) {
        let v = sign_pol_extension_validator(self.settings, key, extensions);
        if !v.validate() {
            report.add_error(
                key,
                &format!(
                    "Error validating signature policy extension: {}",
                    v.error_detail().unwrap_or_default()
                ),
            );
        }
        report.add_result(v.evaluate());
    }

    fn validate_signing_cert_trust_condition(
        &self,
        report: &mut SignaturePolicyReport,
        rules: &RuleSet,
    ) -> CertificationPath {
        let condition = match &rules.signing_cert_trust_condition {
            Some(c) => c,
            None => return CertificationPath::default(),
        };
        let signer = match &self.signature.signing_certificate {
            Some(s) => s,
            None => {
                report.add_error(
                    "signingCertTrustCondition",
                    "Signing certificate could not be identified",
                );
                return CertificationPath::default();
            }
        };
        let tcr = evaluate_trust_condition(
            self.settings,
            self.revocation,
            "signingCertTrustCondition",
            "signerRevReq",
            "signerTrustTrees",
            condition,
            signer,
            &self.signature.certificate_pool,
        );
        let path = tcr.path.clone();
        report.merge_trust_condition(tcr);
        path
    }

    fn validate_timestamp_trust_condition(
        &self,
        report: &mut SignaturePolicyReport,
        rules: &RuleSet,
    ) {
        let condition = match &rules.timestamp_trust_condition {
            Some(c) => c,
            None => return,
        };
        for tsa in &self.signature.timestamp_signers {
            let tcr = evaluate_trust_condition(
                self.settings,
                self.revocation,
                "timeStampTrustCondition",
                "ttsRevReq",
                "ttsCertificateTrustTrees",
                condition,
                tsa,
                &self.signature.certificate_pool,
            );
            report.merge_trust_condition(tcr);
        }
    }

    fn validate_signer_rules(
        &self,
        report: &mut SignaturePolicyReport,
        signer_rules: &SignerRules,
        signer_path: &CertificationPath,
    ) {
        let signature = self.signature;

        // external data and PDF dictionary entries are specific to CAdES and PAdES respectively
        if signature.pdf_entries.is_none() {
            let v = ExternalDataValidator::new(signer_rules.external_signed_data, signature.external_data);
            if let Some(detail) = v.error_detail() {
                report.add_error(v.name(), &detail);
            }
            report.add_result(v.evaluate());
        } else {
            let v = PdfEntryValidator::new(
                &signer_rules.mandated_pdf_entries,
                signature.pdf_entries.as_ref(),
            );
            if let Some(detail) = v.error_detail() {
                report.add_error(v.name(), &detail);
            }
            report.add_result(v.evaluate());
        }

        let v = MandatedAttributesValidator::new(
            MANDATED_SIGNED_ATTR_CONSTRAINT,
            &signer_rules.mandated_signed_attr,
            &signature.signed_attributes,
        );
        let missing = v.missing_attributes();
        if !missing.is_empty() {
            report.add_error(
                v.name(),
                &format!("Signed attributes missing: {}", oid_list(&missing)),
            );
        }
        report.add_result(v.evaluate());

        let v = MandatedAttributesValidator::new(
            MANDATED_UNSIGNED_ATTR_CONSTRAINT,
            &signer_rules.mandated_unsigned_attr,
            &signature.unsigned_attributes,
        );
        let missing = v.missing_attributes();
        if !missing.is_empty() {
            report.add_error(
                v.name(),
                &format!("Unsigned attributes missing: {}", oid_list(&missing)),
            );
        }
        report.add_result(v.evaluate());

        let v = CertRefReqValidator::new(
            signer_rules.mandated_certificate_ref,
            &signature.certificate_references,
            signature.signing_certificate.as_ref(),
            &signer_path.certificates,
        );
        if let Some(detail) = v.error_detail() {
            report.add_error(v.name(), &detail);
        }
        report.add_result(v.evaluate());

        let v = CertInfoReqValidator::new(
            signer_rules.mandated_certificate_info,
            &signature.embedded_certificates,
            signature.signing_certificate.as_ref(),
            &signer_path.certificates,
        );
        if let Some(detail) = v.error_detail() {
            report.add_error(v.name(), &detail);
        }
        report.add_result(v.evaluate());

        self.validate_extensions(
            report,
            "signerRules.signPolExtensions",
            signer_rules.sign_pol_extensions.as_deref(),
        );
    }

    fn validate_verifier_rules(
        &self,
        report: &mut SignaturePolicyReport,
        verifier_rules: &VerifierRules,
    ) {
        let v = MandatedAttributesValidator::new(
            VERIFIER_MANDATED_UNSIGNED_ATTR_CONSTRAINT,
            &verifier_rules.mandated_unsigned_attr,
            &self.signature.unsigned_attributes,
        );
        let missing = v.missing_attributes();
        if !missing.is_empty() {
            report.add_error(
                v.name(),
                &format!("Unsigned attributes missing: {}", oid_list(&missing)),
            );
        }
        report.add_result(v.evaluate());

        self.validate_extensions(
            report,
            "verifierRules.signPolExtensions",
            verifier_rules.sign_pol_extensions.as_deref(),
        );
    }

    fn validate_algorithm_constraint_set(
        &self,
        report: &mut SignaturePolicyReport,
        acs: &AlgorithmConstraintSet,
    ) {
        let key_size = self
            .signature
            .signing_certificate
            .as_ref()
            .map_or(0, |c| c.public_key_size);
        let v = AlgorithmConstraintValidator::new(
            &acs.signer_algorithm_constraints,
            self.signature.signature_algorithm,
            key_size,
        );
        if let Some(detail) = v.error_detail() {
            report.add_error(v.name(), &detail);
        }
        report.add_result(v.evaluate());
    }
}

fn oid_list(oids: &[ObjectIdentifier]) -> String {
    let oids: Vec<String> = oids.iter().map(|o| o.to_string()).collect();
    format!("[{}]", oids.join(", "))
}

#[test]
fn find_commitment_rules_test() {
    use crate::PolicyValidationStatus;

    let proof_of_origin = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.6.1");
    let proof_of_receipt = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.6.2");
    let common = CommonRules {
        algorithm_constraint_set: Some(AlgorithmConstraintSet::default()),
        ..Default::default()
    };
    let policy = SignatureValidationPolicy {
        common_rules: common.clone(),
        commitment_rules: vec![
            CommitmentRule {
                sel_commitment_types: vec![None, Some(proof_of_origin)],
                rules: RuleSet::default(),
            },
            CommitmentRule {
                sel_commitment_types: vec![Some(proof_of_receipt)],
                rules: RuleSet {
                    signer_and_verifier_rules: Some(SignerAndVerifierRules::default()),
                    ..Default::default()
                },
            },
        ],
        sign_pol_extensions: None,
    };

    let rules = policy.find_commitment_rules(&[]).unwrap();
    assert_eq!(1, rules.len());
    assert_eq!(common.algorithm_constraint_set, rules[0].algorithm_constraint_set);

    // both indicated types select the first rule, which is returned once
    let rules = policy
        .find_commitment_rules(&[proof_of_origin, proof_of_origin])
        .unwrap();
    assert_eq!(1, rules.len());

    let rules = policy
        .find_commitment_rules(&[proof_of_origin, proof_of_receipt])
        .unwrap();
    assert_eq!(2, rules.len());
    assert!(rules[1].signer_and_verifier_rules.is_some());

    let unknown = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.6.3");
    assert_eq!(
        Err(crate::Error::PolicyValidation(
            PolicyValidationStatus::CommitmentRuleNotFound
        )),
        policy.find_commitment_rules(&[unknown])
    );
}

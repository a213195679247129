mod utils;

use std::collections::BTreeMap;

use const_oid::db::rfc5911::{ID_CONTENT_TYPE, ID_MESSAGE_DIGEST, ID_SIGNING_TIME};
use const_oid::db::rfc5912::{ID_SHA_1, ID_SHA_256, SHA_256_WITH_RSA_ENCRYPTION};
use der::asn1::{ObjectIdentifier, OctetString};
use sigpolval::*;
use utils::*;

const EE_DER: [u8; 5] = [0x30, 0x03, 0x02, 0x01, 0x01];
const CA_DER: [u8; 5] = [0x30, 0x03, 0x02, 0x01, 0x02];

fn rev_req(enu_rev_req: EnuRevReq) -> RevReq {
    RevReq {
        enu_rev_req,
        ex_rev_req: None,
    }
}

fn condition(trust_points: Vec<TrustPoint>, end: EnuRevReq, ca: EnuRevReq) -> TrustCondition {
    TrustCondition {
        trust_points,
        rev_req: CertRevReq {
            end_cert_rev_req: rev_req(end),
            ca_certs: rev_req(ca),
        },
    }
}

fn v2_ref(cert: &CertificateNode) -> CertificateReference {
    CertificateReference::V2(EssCertIdV2 {
        hash_algorithm: None,
        cert_hash: OctetString::new(calculate_hash(&ID_SHA_256, &cert.encoded).unwrap()).unwrap(),
        issuer_serial: None,
    })
}

fn v1_ref(cert: &CertificateNode) -> CertificateReference {
    CertificateReference::V1(EssCertId {
        cert_hash: OctetString::new(calculate_hash(&ID_SHA_1, &cert.encoded).unwrap()).unwrap(),
        issuer_serial: None,
    })
}

fn extension(oid: &str) -> SignPolExtn {
    SignPolExtn {
        extn_id: ObjectIdentifier::new_unwrap(oid),
        extn_value: OctetString::new(vec![0x05, 0x00]).unwrap(),
    }
}

#[test]
fn trust_point_acceptable_policy_set() {
    let (r, c, e) = three_cert_chain(*POLICY_1);
    let pool = vec![c];
    let cs = settings();

    let mut tp = TrustPoint::new(r);
    tp.acceptable_policy_set = Some(ObjectIdentifierSet::from([*POLICY_1]));
    let p = TrustPointPathValidator::new(&cs, &tp, &e, &pool)
        .build_path()
        .unwrap();
    assert_eq!(3, p.len());
    assert!(p.trust_anchor().unwrap().trusted);

    tp.acceptable_policy_set = Some(ObjectIdentifierSet::from([*POLICY_2]));
    let v = TrustPointPathValidator::new(&cs, &tp, &e, &pool);
    assert_eq!(
        Err(Error::PolicyValidation(PolicyValidationStatus::NullPolicySet)),
        v.build_path()
    );
    let r = v.evaluate();
    assert_eq!(TRUST_POINT_PATH_CONSTRAINT, r.name);
    assert_eq!(ConstraintStatus::NotOk, r.status);
}

#[test]
fn trust_point_policy_constraints() {
    let r = root("Root").build();
    let c = ca("CA", "Root").build();
    let e = ee("EE", "CA").build();
    let pool = vec![c];
    let cs = settings();

    // certificates assert no policies, acceptable until the trust point requires explicit policy
    let mut tp = TrustPoint::new(r);
    assert!(TrustPointPathValidator::new(&cs, &tp, &e, &pool).validate());
    tp.policy_constraints = Some(x509_cert::ext::pkix::constraints::PolicyConstraints {
        require_explicit_policy: Some(0),
        inhibit_policy_mapping: None,
    });
    assert!(!TrustPointPathValidator::new(&cs, &tp, &e, &pool).validate());
}

#[test]
fn trust_point_path_length_constraint() {
    let r = root("Root").build();
    let c1 = ca("CA1", "Root").build();
    let c2 = ca("CA2", "CA1").build();
    let e = ee("EE", "CA2").build();
    let pool = vec![c1, c2];
    let cs = settings();

    let mut tp = TrustPoint::new(r);
    assert_eq!(4, TrustPointPathValidator::new(&cs, &tp, &e, &pool).build_path().unwrap().len());

    tp.path_length_constraint = Some(2);
    assert!(TrustPointPathValidator::new(&cs, &tp, &e, &pool).validate());

    tp.path_length_constraint = Some(1);
    assert_eq!(
        Err(Error::PolicyValidation(
            PolicyValidationStatus::PathLengthExceeded
        )),
        TrustPointPathValidator::new(&cs, &tp, &e, &pool).build_path()
    );

    let tc = condition(vec![tp], EnuRevReq::NoCheck, EnuRevReq::NoCheck);
    let tcr = evaluate_trust_condition(
        &cs,
        &RevocationTokens::new(),
        "signingCertTrustCondition",
        "signerRevReq",
        "signerTrustTrees",
        &tc,
        &e,
        &pool,
    );
    assert!(!tcr.is_valid());
    assert!(tcr.path.is_empty());
    assert_eq!(
        Some(&"Certification path to the trust point exceeds the path length constraint".to_string()),
        tcr.errors.get("signingCertTrustCondition.signerTrustTrees")
    );
}

#[test]
fn trust_point_name_constraints() {
    let r = root("Root").build();
    let c = ca("CA", "Root").build();
    let e = ee("EE", "CA")
        .subject_alt_name(GeneralNameType::DnsName, "signer.example.org")
        .build();
    let pool = vec![c];
    let cs = settings();

    let mut tp = TrustPoint::new(r);
    tp.name_constraints = vec![NameConstraintsInfo {
        permitted: vec![dns("example.org")],
        excluded: vec![],
    }];
    assert!(TrustPointPathValidator::new(&cs, &tp, &e, &pool).validate());

    tp.name_constraints[0].permitted = vec![dns("example.com")];
    assert_eq!(
        Err(Error::PolicyValidation(
            PolicyValidationStatus::NameConstraintsViolation
        )),
        TrustPointPathValidator::new(&cs, &tp, &e, &pool).build_path()
    );
}

#[test]
fn build_trusted_path_tries_each_trust_point() {
    let (r, c, e) = three_cert_chain(*POLICY_1);
    let other = root("Other").build();
    let pool = vec![c.clone(), r.clone()];
    let cs = settings();

    // no trust points: the known chain is used
    let p = build_trusted_path(&cs, &e, &[], &pool).unwrap();
    assert_eq!(3, p.len());

    let tps = vec![TrustPoint::new(other.clone()), TrustPoint::new(r.clone())];
    let p = build_trusted_path(&cs, &e, &tps, &pool).unwrap();
    assert_eq!("Root", p.trust_anchor().unwrap().id);

    let tps = vec![TrustPoint::new(other)];
    assert_eq!(
        Err(Error::PolicyValidation(PolicyValidationStatus::NoPathsFound)),
        build_trusted_path(&cs, &e, &tps, &pool)
    );
}

#[test]
fn trust_condition_revocation() {
    let (r, c, e) = three_cert_chain(*POLICY_1);
    let pool = vec![c.clone()];
    let cs = settings();
    let tc = condition(
        vec![TrustPoint::new(r)],
        EnuRevReq::CrlCheck,
        EnuRevReq::CrlCheck,
    );
    let eval = |tokens: &RevocationTokens| {
        evaluate_trust_condition(
            &cs,
            tokens,
            "signingCertTrustCondition",
            "signerRevReq",
            "signerTrustTrees",
            &tc,
            &e,
            &pool,
        )
    };

    let mut tokens = RevocationTokens::new();
    tokens.add_token(&e, token(RevocationTokenType::Crl, Some(true)));
    tokens.add_token(&c, token(RevocationTokenType::Crl, Some(true)));
    let tcr = eval(&tokens);
    assert!(tcr.is_valid());
    assert_eq!(3, tcr.path.len());

    let mut tokens = RevocationTokens::new();
    tokens.add_token(&c, token(RevocationTokenType::Crl, Some(false)));
    let tcr = eval(&tokens);
    assert_eq!(2, tcr.errors.len());
    assert_eq!(
        Some(&"End certificate is revoked".to_string()),
        tcr.errors.get("signingCertTrustCondition.signerRevReq.endCertRevReq")
    );
    assert_eq!(
        Some(&"One of the CA certificates is revoked".to_string()),
        tcr.errors.get("signingCertTrustCondition.signerRevReq.caCerts")
    );
    // the path is still reported
    assert_eq!(3, tcr.path.len());
}

#[test]
fn cert_ref_req() {
    let e = ee("EE", "CA").encoded(&EE_DER).build();
    let c = ca("CA", "Root").encoded(&CA_DER).build();
    let chain = vec![e.clone(), c.clone()];

    let signer_only = vec![v2_ref(&e)];
    let v = CertRefReqValidator::new(None, &signer_only, Some(&e), &chain);
    assert!(v.validate());
    assert!(v.contains_signer_cert_ref());
    assert!(!v.contains_additional_cert_ref());

    let both = vec![v2_ref(&e), v1_ref(&c)];
    let v = CertRefReqValidator::new(Some(CertRefReq::SignerOnly), &both, Some(&e), &chain);
    assert!(!v.validate());
    assert_eq!(
        Some("Found more certificate references than expected".to_string()),
        v.error_detail()
    );

    let v = CertRefReqValidator::new(Some(CertRefReq::FullPath), &both, Some(&e), &chain);
    assert!(v.validate());
    let v = CertRefReqValidator::new(Some(CertRefReq::FullPath), &signer_only, Some(&e), &chain);
    assert_eq!(
        Some("Found less references than expected".to_string()),
        v.error_detail()
    );
    assert_eq!(
        Some(PolicyValidationStatus::CertificateReferenceMismatch),
        v.evaluate().error
    );

    let none: Vec<CertificateReference> = vec![];
    let v = CertRefReqValidator::new(None, &none, Some(&e), &chain);
    assert_eq!(
        Some("No signing certificate reference found".to_string()),
        v.error_detail()
    );
    let v = CertRefReqValidator::new(None, &signer_only, None, &chain);
    assert!(!v.validate());
}

/// Signature by "EE" over encapsulated content, with the signing certificate embedded and referenced
fn signature() -> SignatureInfo {
    let (r, c, _) = three_cert_chain(*POLICY_1);
    let e = ee("EE", "CA")
        .certificate_policies(&[*POLICY_1])
        .encoded(&EE_DER)
        .build();
    SignatureInfo {
        signing_certificate: Some(e.clone()),
        embedded_certificates: vec![e.clone()],
        certificate_pool: vec![e.clone(), c, r],
        signed_attributes: ObjectIdentifierSet::from([ID_CONTENT_TYPE, ID_MESSAGE_DIGEST]),
        certificate_references: vec![v2_ref(&e)],
        signature_algorithm: Some(SHA_256_WITH_RSA_ENCRYPTION),
        ..Default::default()
    }
}

fn rules() -> RuleSet {
    let r = root("Root").certificate_policies(&[*POLICY_1]).build();
    RuleSet {
        signer_and_verifier_rules: Some(SignerAndVerifierRules {
            signer_rules: SignerRules {
                external_signed_data: Some(false),
                mandated_signed_attr: vec![ID_CONTENT_TYPE, ID_MESSAGE_DIGEST],
                mandated_certificate_ref: Some(CertRefReq::SignerOnly),
                mandated_certificate_info: Some(CertInfoReq::SignerOnly),
                ..Default::default()
            },
            verifier_rules: VerifierRules::default(),
        }),
        signing_cert_trust_condition: Some(condition(
            vec![TrustPoint::new(r)],
            EnuRevReq::NoCheck,
            EnuRevReq::NoCheck,
        )),
        algorithm_constraint_set: Some(AlgorithmConstraintSet {
            signer_algorithm_constraints: vec![AlgorithmConstraint {
                algorithm: SHA_256_WITH_RSA_ENCRYPTION,
                min_key_length: Some(2048),
            }],
        }),
        ..Default::default()
    }
}

fn policy(common_rules: RuleSet) -> SignatureValidationPolicy {
    SignatureValidationPolicy {
        common_rules,
        commitment_rules: vec![CommitmentRule {
            sel_commitment_types: vec![None],
            rules: RuleSet::default(),
        }],
        sign_pol_extensions: None,
    }
}

#[test]
fn compliant_signature() {
    let cs = settings();
    let pol = policy(rules());
    let sig = signature();
    let tokens = RevocationTokens::new();

    let report = SignaturePolicyValidator::new(&cs, &pol, &sig, &tokens).validate();
    assert!(report.status(), "{:?}", report.errors);
    assert_eq!(3, report.signer_path.len());
    assert!(report.results.iter().all(|r| r.is_ok()));
}

#[test]
fn non_compliant_signature_reports_every_failure() {
    let cs = settings();
    let mut rules = rules();
    if let Some(svr) = rules.signer_and_verifier_rules.as_mut() {
        svr.signer_rules.mandated_signed_attr.push(ID_SIGNING_TIME);
        svr.signer_rules.mandated_unsigned_attr = vec![ID_AA_SIGNATURE_TIME_STAMP_TOKEN];
        svr.signer_rules.mandated_certificate_info = Some(CertInfoReq::FullPath);
        svr.verifier_rules.mandated_unsigned_attr = vec![ID_AA_SIGNATURE_TIME_STAMP_TOKEN];
    }
    rules.algorithm_constraint_set = Some(AlgorithmConstraintSet {
        signer_algorithm_constraints: vec![AlgorithmConstraint {
            algorithm: SHA_256_WITH_RSA_ENCRYPTION,
            min_key_length: Some(3072),
        }],
    });
    let pol = policy(rules);
    let mut sig = signature();
    sig.external_data = true;
    let tokens = RevocationTokens::new();

    let report = SignaturePolicyValidator::new(&cs, &pol, &sig, &tokens).validate();
    assert!(!report.status());
    let expected = [
        (EXTERNAL_SIGNED_DATA_CONSTRAINT, "Expected to be: false".to_string()),
        (
            MANDATED_SIGNED_ATTR_CONSTRAINT,
            format!("Signed attributes missing: [{}]", ID_SIGNING_TIME),
        ),
        (
            MANDATED_UNSIGNED_ATTR_CONSTRAINT,
            format!("Unsigned attributes missing: [{}]", ID_AA_SIGNATURE_TIME_STAMP_TOKEN),
        ),
        (
            VERIFIER_MANDATED_UNSIGNED_ATTR_CONSTRAINT,
            format!("Unsigned attributes missing: [{}]", ID_AA_SIGNATURE_TIME_STAMP_TOKEN),
        ),
        (
            MANDATED_CERTIFICATE_INFO_CONSTRAINT,
            "Should have the signer certificate full path in the signature".to_string(),
        ),
        (
            SIGNER_ALGORITHM_CONSTRAINTS,
            "Couldn't find minimum requirements for signer constraints".to_string(),
        ),
    ];
    assert_eq!(expected.len(), report.errors.len(), "{:?}", report.errors);
    for (key, detail) in expected {
        assert_eq!(Some(&detail), report.errors.get(key), "{}", key);
    }
}

#[test]
fn commitment_rule_selection() {
    let cs = settings();
    let proof_of_origin = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.6.1");
    let proof_of_approval = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.6.5");
    let mut pol = policy(rules());
    pol.commitment_rules.push(CommitmentRule {
        sel_commitment_types: vec![Some(proof_of_origin)],
        rules: RuleSet {
            algorithm_constraint_set: Some(AlgorithmConstraintSet::default()),
            ..Default::default()
        },
    });
    let tokens = RevocationTokens::new();

    let mut sig = signature();
    sig.commitment_types = vec![proof_of_origin];
    assert!(SignaturePolicyValidator::new(&cs, &pol, &sig, &tokens)
        .validate()
        .status());

    sig.commitment_types = vec![proof_of_approval];
    let report = SignaturePolicyValidator::new(&cs, &pol, &sig, &tokens).validate();
    assert_eq!(1, report.errors.len());
    assert_eq!(
        Some(&"The commitment type used was not found".to_string()),
        report.errors.get(COMMITMENT_RULES)
    );
}

#[test]
fn signing_certificate_must_be_identified() {
    let cs = settings();
    let pol = policy(rules());
    let mut sig = signature();
    sig.signing_certificate = None;
    let tokens = RevocationTokens::new();

    let report = SignaturePolicyValidator::new(&cs, &pol, &sig, &tokens).validate();
    assert_eq!(
        Some(&"Signing certificate could not be identified".to_string()),
        report.errors.get("signingCertTrustCondition")
    );
    assert!(report.signer_path.is_empty());
}

#[test]
fn pdf_signature_dictionary() {
    let cs = settings();
    let mut rules = rules();
    if let Some(svr) = rules.signer_and_verifier_rules.as_mut() {
        // not applicable to PAdES signatures
        svr.signer_rules.external_signed_data = Some(true);
        svr.signer_rules.mandated_pdf_entries = vec![
            PdfEntry::with_value("SubFilter", "ETSI.CAdES.detached"),
            PdfEntry::present("Reason"),
        ];
    }
    let pol = policy(rules);
    let tokens = RevocationTokens::new();

    let mut sig = signature();
    let mut dictionary = BTreeMap::new();
    dictionary.insert("SubFilter".to_string(), "ETSI.CAdES.detached".to_string());
    dictionary.insert("Reason".to_string(), "Approval".to_string());
    sig.pdf_entries = Some(dictionary.clone());
    let report = SignaturePolicyValidator::new(&cs, &pol, &sig, &tokens).validate();
    assert!(report.status(), "{:?}", report.errors);

    dictionary.insert("SubFilter".to_string(), "adbe.pkcs7.detached".to_string());
    dictionary.remove("Reason");
    sig.pdf_entries = Some(dictionary);
    let report = SignaturePolicyValidator::new(&cs, &pol, &sig, &tokens).validate();
    assert_eq!(
        Some(&"Invalid entries: [SubFilter=ETSI.CAdES.detached, Reason]".to_string()),
        report.errors.get(PDF_ENTRIES_CONSTRAINT)
    );
    assert_eq!(1, report.errors.len());
}

#[test]
fn unrecognized_sign_pol_extensions() {
    let mut cs = settings();
    let mut rules = rules();
    if let Some(svr) = rules.signer_and_verifier_rules.as_mut() {
        svr.signer_rules.sign_pol_extensions = Some(vec![extension("1.2.3.4")]);
    }
    let mut pol = policy(rules);
    pol.sign_pol_extensions = Some(vec![extension("1.2.3.5")]);
    let sig = signature();
    let tokens = RevocationTokens::new();

    let report = SignaturePolicyValidator::new(&cs, &pol, &sig, &tokens).validate();
    assert_eq!(2, report.errors.len());
    assert_eq!(
        Some(&"Error validating signature policy extension: signPolExtension: Unknown signature policy extension: 1.2.3.5".to_string()),
        report.errors.get("signatureValidationPolicy.signPolExtensions")
    );
    assert!(report.errors.contains_key("signerRules.signPolExtensions"));

    cs.set_recognized_sign_pol_extensions(vec!["1.2.3.4".to_string(), "1.2.3.5".to_string()]);
    let report = SignaturePolicyValidator::new(&cs, &pol, &sig, &tokens).validate();
    assert!(report.status(), "{:?}", report.errors);
}

#[test]
fn time_stamp_trust_condition() {
    let cs = settings();
    let tsa_root = root("TSA Root").build();
    let mut rules = rules();
    rules.timestamp_trust_condition = Some(condition(
        vec![TrustPoint::new(tsa_root.clone())],
        EnuRevReq::NoCheck,
        EnuRevReq::NoCheck,
    ));
    let pol = policy(rules);
    let tokens = RevocationTokens::new();

    let mut sig = signature();
    sig.timestamp_signers = vec![ee("TSA", "TSA Root").build()];
    assert!(SignaturePolicyValidator::new(&cs, &pol, &sig, &tokens)
        .validate()
        .status());

    sig.timestamp_signers = vec![ee("TSA", "Unknown TSA Root").build()];
    let report = SignaturePolicyValidator::new(&cs, &pol, &sig, &tokens).validate();
    assert_eq!(
        Some(&"Could not build certification path to a trust point".to_string()),
        report.errors.get("timeStampTrustCondition.ttsCertificateTrustTrees")
    );
    // the signer's path is unaffected
    assert_eq!(3, report.signer_path.len());
}

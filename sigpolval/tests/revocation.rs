mod utils;

use const_oid::db::rfc6960::ID_PKIX_OCSP_NOCHECK;
use sigpolval::*;
use utils::*;

#[test]
fn trust_anchor_and_self_signed_never_require_data() {
    let (r, _, e) = three_cert_chain(*POLICY_1);
    let cs = settings();
    assert_eq!(
        RevocationRequirementReason::Trusted,
        is_revocation_required(&cs, &r).reason
    );
    let untrusted_root = r.with_trust(false);
    assert_eq!(
        RevocationRequirementReason::SelfSigned,
        is_revocation_required(&cs, &untrusted_root).reason
    );
    assert!(is_revocation_required(&cs, &e).required);
}

#[test]
fn skip_policies() {
    let (_, _, e) = three_cert_chain(*POLICY_1);
    let mut cs = settings();
    cs.set_revocation_skip_policies(vec![POLICY_2.to_string()]);
    assert!(is_revocation_required(&cs, &e).required);

    cs.set_revocation_skip_policies(vec![POLICY_2.to_string(), POLICY_1.to_string()]);
    assert_eq!(
        RevocationRequirementReason::PolicyMatch,
        is_revocation_required(&cs, &e).reason
    );

    cs.set_revocation_skip_policies(vec![WILDCARD.to_string()]);
    assert!(!is_revocation_required(&cs, &e).required);

    // the wildcard requires at least one asserted policy
    let no_policies = ee("EE", "CA").build();
    assert!(is_revocation_required(&cs, &no_policies).required);
}

#[test]
fn ocsp_responder_certificates() {
    let responder = ee("Responder", "CA").extension(ID_PKIX_OCSP_NOCHECK).build();
    let tokens = RevocationTokens::new();
    let mut cs = settings();

    let v = RevReqValidator::new(&cs, &tokens);
    assert_eq!(
        Some(PolicyValidationStatus::RevocationDataMissing),
        v.evaluate(EnuRevReq::OcspCheck, &responder).error
    );

    cs.set_revocation_skip_extensions(vec![ID_PKIX_OCSP_NOCHECK.to_string()]);
    let v = RevReqValidator::new(&cs, &tokens);
    assert!(v.evaluate(EnuRevReq::OcspCheck, &responder).is_ok());
}

#[test]
fn freshness_limits_usable_tokens() {
    let e = ee("EE", "CA").build();
    let mut tokens = RevocationTokens::new();
    tokens.add_token(&e, token(RevocationTokenType::Crl, Some(true)));
    tokens.add_token(
        &e,
        RevocationToken::new(
            RevocationTokenType::Ocsp,
            true,
            Some(true),
            VALIDATION_TIME - 7 * 86_400,
        ),
    );

    let mut cs = settings();
    assert!(RevReqValidator::new(&cs, &tokens).validate(EnuRevReq::BothCheck, &e));

    cs.set_revocation_freshness(86_400);
    let v = RevReqValidator::new(&cs, &tokens);
    assert_eq!(
        Err(Error::PolicyValidation(
            PolicyValidationStatus::RevocationDataMissing
        )),
        v.check_rev_req(EnuRevReq::BothCheck, &e)
    );
    // stale OCSP data is skipped in favor of CRL data
    assert!(v.validate(EnuRevReq::EitherCheck, &e));
}

#[test]
fn most_recent_token_decides() {
    let e = ee("EE", "CA").build();
    let mut tokens = RevocationTokens::new();
    tokens.add_token(
        &e,
        RevocationToken::new(RevocationTokenType::Crl, true, Some(true), VALIDATION_TIME - 7_200),
    );
    tokens.add_token(&e, token(RevocationTokenType::Crl, Some(false)));

    let cs = settings();
    let v = RevReqValidator::new(&cs, &tokens);
    assert_eq!(Ok(false), v.check_crl(&e));
    assert_eq!(
        Err(Error::PolicyValidation(
            PolicyValidationStatus::CertificateRevoked
        )),
        v.check_rev_req(EnuRevReq::CrlCheck, &e)
    );
}

#[test]
fn either_check_does_not_fall_back_on_revoked_status() {
    let e = ee("EE", "CA").build();
    let mut tokens = RevocationTokens::new();
    tokens.add_token(&e, token(RevocationTokenType::Ocsp, Some(false)));
    tokens.add_token(&e, token(RevocationTokenType::Crl, Some(true)));

    let cs = settings();
    let v = RevReqValidator::new(&cs, &tokens);
    assert_eq!(Ok(false), v.check_revocation(EnuRevReq::EitherCheck, &e));
    assert!(v.validate(EnuRevReq::NoCheck, &e));
}

mod utils;

use der::Decode;
use hex_literal::hex;
use sigpolval::*;
use utils::*;

// EUR, amount 1000, exponent 3
const EUR_1000E3: [u8; 14] = hex!("300C1303455552020203E8020103");

fn qualified(name: &str) -> CertificateNode {
    let mv = MonetaryValue::from_der(&EUR_1000E3).unwrap();
    ee(name, "CA").qc_limit_value(mv).build()
}

#[test]
fn limit_against_minimums() {
    let e = qualified("EE");
    assert!(check_qc_limit_value(&e, 500_000, None).is_ok());
    assert!(check_qc_limit_value(&e, 1_000_000, None).is_ok());
    assert_eq!(
        Err(Error::PolicyValidation(
            PolicyValidationStatus::TransactionLimitTooLow
        )),
        check_qc_limit_value(&e, 5_000_000, None)
    );
}

#[test]
fn currency_must_match_when_configured() {
    let e = qualified("EE");
    assert!(check_qc_limit_value(&e, 500_000, Some("EUR")).is_ok());
    assert!(check_qc_limit_value(&e, 500_000, Some("eur")).is_ok());
    assert!(check_qc_limit_value(&e, 500_000, Some("USD")).is_err());
}

#[test]
fn missing_statement_fails_only_when_minimum_configured() {
    let e = ee("EE", "CA").build();
    let mut cs = settings();
    assert!(evaluate_qc_limit_value(&cs, &e).is_ok());

    cs.set_min_qc_transaction_limit(1);
    let r = evaluate_qc_limit_value(&cs, &e);
    assert_eq!(QC_LIMIT_VALUE_CONSTRAINT, r.name);
    assert_eq!(Some(PolicyValidationStatus::TransactionLimitTooLow), r.error);

    cs.set_min_qc_transaction_limit(750_000);
    cs.set_qc_transaction_limit_currency("EUR".to_string());
    assert!(evaluate_qc_limit_value(&cs, &qualified("EE")).is_ok());
}

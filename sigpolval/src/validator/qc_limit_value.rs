//! Evaluation of the QcEuLimitValue statement against a minimum transaction limit

use alloc::format;
use alloc::string::ToString;

use crate::asn1::MonetaryValue;
use crate::util::error::*;
use crate::util::logging::log_error_for_cert;
use crate::{
    CertificateNode, ConstraintEvaluator, ConstraintLevel, ConstraintResult, ConstraintSettings,
};

/// Name used when reporting the outcome of the transaction limit check
pub const QC_LIMIT_VALUE_CONSTRAINT: &str = "qcLimitValue";

/// Returns true if amount * 10^exponent is at least `minimum`. Negative exponents are handled by scaling the
/// minimum rather than the amount, so no precision is lost.
pub fn meets_transaction_limit(value: &MonetaryValue, minimum: u64) -> bool {
    let amount = value.amount as i128;
    let minimum = minimum as i128;
    if value.exponent >= 0 {
        let scaled = u32::try_from(value.exponent)
            .ok()
            .and_then(|e| 10i128.checked_pow(e))
            .and_then(|p| amount.checked_mul(p));
        match scaled {
            Some(v) => v >= minimum,
            // overflow only occurs for magnitudes far beyond any u64 minimum
            None => amount > 0,
        }
    } else {
        let scaled_min = value
            .exponent
            .checked_neg()
            .and_then(|e| u32::try_from(e).ok())
            .and_then(|e| 10i128.checked_pow(e))
            .and_then(|p| minimum.checked_mul(p));
        match scaled_min {
            Some(m) => amount >= m,
            None => minimum == 0 && amount >= 0,
        }
    }
}

/// `check_qc_limit_value` verifies the certificate carries a QcEuLimitValue statement expressing at least
/// `minimum`, in `currency` when one is given.
pub fn check_qc_limit_value(
    cert: &CertificateNode,
    minimum: u64,
    currency: Option<&str>,
) -> Result<()> {
    let value = match &cert.qc_limit_value {
        Some(v) => v,
        None => {
            log_error_for_cert(cert, "QcEuLimitValue statement is absent");
            return Err(Error::PolicyValidation(
                PolicyValidationStatus::TransactionLimitTooLow,
            ));
        }
    };

    if let Some(currency) = currency {
        if !value.currency.to_string().eq_ignore_ascii_case(currency) {
            log_error_for_cert(
                cert,
                &format!(
                    "QcEuLimitValue currency {} does not match {}",
                    value.currency, currency
                ),
            );
            return Err(Error::PolicyValidation(
                PolicyValidationStatus::TransactionLimitTooLow,
            ));
        }
    }

    if !meets_transaction_limit(value, minimum) {
        log_error_for_cert(
            cert,
            &format!(
                "QcEuLimitValue {}e{} is below {}",
                value.amount, value.exponent, minimum
            ),
        );
        return Err(Error::PolicyValidation(
            PolicyValidationStatus::TransactionLimitTooLow,
        ));
    }
    Ok(())
}

/// `evaluate_qc_limit_value` checks the certificate against the PS_MIN_QC_TRANSACTION_LIMIT and
/// PS_QC_TRANSACTION_LIMIT_CURRENCY settings. When no minimum is configured the check passes.
pub fn evaluate_qc_limit_value(
    settings: &ConstraintSettings,
    cert: &CertificateNode,
) -> ConstraintResult {
    ConstraintEvaluator::new(QC_LIMIT_VALUE_CONSTRAINT, ConstraintLevel::Fail).evaluate(|| {
        match settings.get_min_qc_transaction_limit() {
            Some(minimum) => check_qc_limit_value(
                cert,
                minimum,
                settings.get_qc_transaction_limit_currency().as_deref(),
            ),
            None => Ok(()),
        }
    })
}

#[test]
fn meets_transaction_limit_test() {
    use crate::asn1::Iso4217CurrencyCode;

    let mv = |amount: i64, exponent: i64| MonetaryValue {
        currency: Iso4217CurrencyCode::Numeric(978),
        amount,
        exponent,
    };
    assert!(meets_transaction_limit(&mv(1000, 3), 500_000));
    assert!(meets_transaction_limit(&mv(1000, 3), 1_000_000));
    assert!(!meets_transaction_limit(&mv(1000, 3), 5_000_000));
    assert!(meets_transaction_limit(&mv(150, -1), 15));
    assert!(!meets_transaction_limit(&mv(149, -1), 15));
    assert!(meets_transaction_limit(&mv(1, 60), u64::MAX));
    assert!(!meets_transaction_limit(&mv(-1, 0), 0));
    assert_eq!("978", mv(0, 0).currency.to_string());
}

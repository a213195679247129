//! Qualified certificate statements from RFC 3739 and ETSI EN 319 412-5

use alloc::vec::Vec;

use der::asn1::{ObjectIdentifier, PrintableString};
use der::{Any, Choice, Sequence};

/// OID for the qcStatements certificate extension: 1.3.6.1.5.5.7.1.3. See [`QcStatements`].
pub const ID_PE_QC_STATEMENTS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.1.3");

/// OID for the QcEuLimitValue statement: 0.4.0.1862.1.2. See [`MonetaryValue`].
pub const ID_ETSI_QCS_QC_LIMIT_VALUE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("0.4.0.1862.1.2");

/// QCStatements as defined in [RFC 3739 Section 3.2.6].
///
/// ```text
/// QCStatements ::= SEQUENCE OF QCStatement
/// ```
///
/// [RFC 3739 Section 3.2.6]: https://datatracker.ietf.org/doc/html/rfc3739#section-3.2.6
pub type QcStatements = Vec<QcStatement>;

/// QCStatement as defined in [RFC 3739 Section 3.2.6].
///
/// ```text
/// QCStatement ::= SEQUENCE {
///     statementId   QC-STATEMENT.&id({SupportedStatements}),
///     statementInfo QC-STATEMENT.&Type
///     ({SupportedStatements}{@statementId}) OPTIONAL }
/// ```
///
/// [RFC 3739 Section 3.2.6]: https://datatracker.ietf.org/doc/html/rfc3739#section-3.2.6
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct QcStatement {
    pub statement_id: ObjectIdentifier,
    #[asn1(optional = "true")]
    pub statement_info: Option<Any>,
}

/// MonetaryValue as defined in [ETSI EN 319 412-5 Section 4.3.2]. The QcEuLimitValue statement
/// carries a MonetaryValue whose value is amount * 10^exponent.
///
/// ```text
/// MonetaryValue ::= SEQUENCE {
///     currency Iso4217CurrencyCode,
///     amount INTEGER,
///     exponent INTEGER}
/// ```
///
/// [ETSI EN 319 412-5 Section 4.3.2]: https://www.etsi.org/deliver/etsi_en/319400_319499/31941205/
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct MonetaryValue {
    pub currency: Iso4217CurrencyCode,
    pub amount: i64,
    pub exponent: i64,
}

/// Iso4217CurrencyCode as defined in [ETSI EN 319 412-5 Section 4.3.2].
///
/// ```text
/// Iso4217CurrencyCode ::= CHOICE {
///     alphabetic PrintableString (SIZE (3)), -- Recommended
///     numeric INTEGER (1..999) }
/// ```
///
/// [ETSI EN 319 412-5 Section 4.3.2]: https://www.etsi.org/deliver/etsi_en/319400_319499/31941205/
#[derive(Clone, Debug, Eq, PartialEq, Choice)]
#[allow(missing_docs)]
pub enum Iso4217CurrencyCode {
    Alphabetic(PrintableString),
    Numeric(u32),
}

impl core::fmt::Display for Iso4217CurrencyCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Iso4217CurrencyCode::Alphabetic(s) => write!(f, "{}", s),
            Iso4217CurrencyCode::Numeric(n) => write!(f, "{:03}", n),
        }
    }
}

#[test]
fn monetary_value_decode_test() {
    use der::Decode;
    use hex_literal::hex;

    // EUR, amount 1000, exponent 3
    let enc = hex!("300C1303455552020203E8020103");
    let mv = MonetaryValue::from_der(&enc).unwrap();
    assert_eq!(1000, mv.amount);
    assert_eq!(3, mv.exponent);
    assert_eq!("EUR", mv.currency.to_string());
}

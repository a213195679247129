//! Structures and functions related to configuring constraint evaluation

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};
use alloc::{vec, vec::Vec};
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use const_oid::db::rfc5280::ANY_POLICY;
use der::asn1::ObjectIdentifier;

use sigpolmacros::*;

use crate::Result;

#[cfg(feature = "std")]
use std::path::Path;
#[cfg(feature = "std")]
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(feature = "std")]
use crate::Error;

//-----------------------------------------------------------------------------------------------
// Type definitions used in the definition of constraint settings
//-----------------------------------------------------------------------------------------------
/// `ObjectIdentifierSet` is a typedef for a set of ObjectIdentifier values.
pub type ObjectIdentifierSet = BTreeSet<ObjectIdentifier>;

/// `Strings` is a typedef for a vector of String values.
pub type Strings = Vec<String>;

/// Value that matches any OID when present in an OID list setting
pub const WILDCARD: &str = "*";

/// `ConstraintSettings` is a typedef for a `BTreeMap` that maps arbitrary string values to a
/// variant map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSettings(pub BTreeMap<String, ConstraintSettingsTypes>);

impl ConstraintSettings {
    /// Creates a new empty [`ConstraintSettings`]
    pub fn new() -> Self {
        Self::default()
    }
}

/// `ConstraintSettingsTypes` is used to define a variant map with types associated with
/// constraint evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintSettingsTypes {
    /// Represents bool values
    Bool(bool),
    /// Represents u32 values
    U32(u32),
    /// Represents u64 values
    U64(u64),
    /// Represents String values
    String(String),
    /// Represents vectors of Strings
    Strings(Strings),
}

//-----------------------------------------------------------------------------------------------
// Settings keys
//-----------------------------------------------------------------------------------------------
/// `PS_INITIAL_EXPLICIT_POLICY_INDICATOR` is used to retrieve the initial-explicit-policy value
/// for use with certificate policy processing, as described in [RFC 5280 Section 6.1.1].
/// By default, this value is set to false.
///
/// [RFC 5280 Section 6.1.1]: <https://datatracker.ietf.org/doc/html/rfc5280#section-6.1.1>
pub static PS_INITIAL_EXPLICIT_POLICY_INDICATOR: &str = "psInitialExplicitPolicyIndicator";

/// `PS_INITIAL_POLICY_MAPPING_INHIBIT_INDICATOR` is used to retrieve the policy-mapping-inhibit value.
/// By default, this value is set to false.
pub static PS_INITIAL_POLICY_MAPPING_INHIBIT_INDICATOR: &str =
    "psInitialPolicyMappingInhibitIndicator";

/// `PS_INITIAL_INHIBIT_ANY_POLICY_INDICATOR` is used to retrieve the inhibit-anyPolicy value.
/// By default, this value is set to false.
pub static PS_INITIAL_INHIBIT_ANY_POLICY_INDICATOR: &str = "psInitialInhibitAnyPolicyIndicator";

/// `PS_INITIAL_POLICY_SET` is used to retrieve the user-initial-policy-set value, expressed as
/// dotted OID strings. By default, this value is set to anyPolicy.
pub static PS_INITIAL_POLICY_SET: &str = "psInitialPolicySet";

/// `PS_VALIDATION_TIME` is used to retrieve the time at which revocation requirements and validity
/// intervals are evaluated, expressed as seconds since the Unix epoch. By default, the current time is used.
pub static PS_VALIDATION_TIME: &str = "psValidationTime";

/// `PS_REVOCATION_SKIP_EXTENSIONS` lists certificate extension OIDs that relieve a certificate of the
/// need for revocation data. The value `*` matches any extension.
pub static PS_REVOCATION_SKIP_EXTENSIONS: &str = "psRevocationSkipExtensions";

/// `PS_REVOCATION_SKIP_POLICIES` lists certificate policy OIDs that relieve a certificate of the
/// need for revocation data. The value `*` matches any policy.
pub static PS_REVOCATION_SKIP_POLICIES: &str = "psRevocationSkipPolicies";

/// `PS_REVOCATION_FRESHNESS` is used to retrieve the maximum age, in seconds, of revocation data relative
/// to the validation time. Absent a value, revocation data of any age is used.
pub static PS_REVOCATION_FRESHNESS: &str = "psRevocationFreshness";

/// `PS_MIN_QC_TRANSACTION_LIMIT` is used to retrieve the minimum transaction limit a QcEuLimitValue
/// statement must express.
pub static PS_MIN_QC_TRANSACTION_LIMIT: &str = "psMinQcTransactionLimit";

/// `PS_QC_TRANSACTION_LIMIT_CURRENCY` is used to retrieve the currency a QcEuLimitValue statement must
/// be expressed in. Absent a value, any currency is accepted.
pub static PS_QC_TRANSACTION_LIMIT_CURRENCY: &str = "psQcTransactionLimitCurrency";

/// `PS_RECOGNIZED_SIGN_POL_EXTENSIONS` lists signature policy extension OIDs that are processed by
/// dedicated validators. Extensions not in this list are reported as unknown.
pub static PS_RECOGNIZED_SIGN_POL_EXTENSIONS: &str = "psRecognizedSignPolExtensions";

//-----------------------------------------------------------------------------------------------
// Getters/setters for settings
//-----------------------------------------------------------------------------------------------
cs_gets_and_sets_with_default!(PS_INITIAL_EXPLICIT_POLICY_INDICATOR, bool, false);
cs_gets_and_sets_with_default!(PS_INITIAL_POLICY_MAPPING_INHIBIT_INDICATOR, bool, false);
cs_gets_and_sets_with_default!(PS_INITIAL_INHIBIT_ANY_POLICY_INDICATOR, bool, false);
cs_gets_and_sets_with_default!(PS_INITIAL_POLICY_SET, Strings, vec![ANY_POLICY.to_string()]);
cs_gets_and_sets_with_default!(PS_VALIDATION_TIME, u64, now_as_unix_secs());
cs_gets_and_sets_with_default!(PS_REVOCATION_SKIP_EXTENSIONS, Strings, vec![]);
cs_gets_and_sets_with_default!(PS_REVOCATION_SKIP_POLICIES, Strings, vec![]);
cs_gets_and_sets!(PS_REVOCATION_FRESHNESS, u64);
cs_gets_and_sets!(PS_MIN_QC_TRANSACTION_LIMIT, u64);
cs_gets_and_sets!(PS_QC_TRANSACTION_LIMIT_CURRENCY, String);
cs_gets_and_sets_with_default!(PS_RECOGNIZED_SIGN_POL_EXTENSIONS, Strings, vec![]);

/// Returns the current time as seconds since the Unix epoch, or 0 where no clock is available.
pub fn now_as_unix_secs() -> u64 {
    #[cfg(feature = "std")]
    {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(n) => n.as_secs(),
            Err(_) => 0,
        }
    }
    #[cfg(not(feature = "std"))]
    {
        0
    }
}

/// Converts a list of dotted OID strings to a set of ObjectIdentifier values, dropping values that do
/// not parse (including the wildcard).
pub fn strings_to_oid_set(strs: &[String]) -> ObjectIdentifierSet {
    strs.iter()
        .filter_map(|s| ObjectIdentifier::from_str(s.as_str()).ok())
        .collect()
}

/// Converts a set of ObjectIdentifier values to a list of dotted OID strings.
pub fn oid_set_to_strings(oids: &ObjectIdentifierSet) -> Strings {
    oids.iter().map(|o| o.to_string()).collect()
}

impl ConstraintSettings {
    /// `get_initial_policy_set_as_oid_set` is used to retrieve `PS_INITIAL_POLICY_SET` items from a
    /// [`ConstraintSettings`] instance as an ObjectIdentifierSet object instead of a Strings object.
    pub fn get_initial_policy_set_as_oid_set(&self) -> ObjectIdentifierSet {
        strings_to_oid_set(&self.get_initial_policy_set())
    }

    /// `set_initial_policy_set_from_oid_set` is used to set `PS_INITIAL_POLICY_SET` items in a
    /// [`ConstraintSettings`] instance given an ObjectIdentifierSet object instead of a Strings object.
    pub fn set_initial_policy_set_from_oid_set(&mut self, v: &ObjectIdentifierSet) {
        self.set_initial_policy_set(oid_set_to_strings(v));
    }
}

/// `read_settings` accepts a string containing the name of a file that notionally contains JSON data that
/// represents ConstraintSettings. If no file name is provided or the file does not exist, a default
/// instance is returned.
#[cfg(feature = "std")]
pub fn read_settings(fname: &Option<String>) -> Result<ConstraintSettings> {
    if let Some(fname) = fname {
        let p = Path::new(fname.as_str());
        if Path::exists(p) {
            let json = std::fs::read(p)?;
            return match serde_json::from_slice::<ConstraintSettings>(&json) {
                Ok(cs) => Ok(cs),
                Err(_e) => Err(Error::ParseError),
            };
        }
    }
    Ok(ConstraintSettings::new())
}

/// `write_settings` serializes a ConstraintSettings instance as JSON to the named file.
#[cfg(feature = "std")]
pub fn write_settings(fname: &str, cs: &ConstraintSettings) -> Result<()> {
    let json = serde_json::to_vec_pretty(cs).map_err(|_e| Error::ParseError)?;
    std::fs::write(fname, json)?;
    Ok(())
}

#[test]
fn test_default_gets_cs() {
    let cs = ConstraintSettings::default();

    assert!(!cs.get_initial_explicit_policy_indicator());
    assert!(!cs.get_initial_policy_mapping_inhibit_indicator());
    assert!(!cs.get_initial_inhibit_any_policy_indicator());
    assert_eq!(vec![ANY_POLICY.to_string()], cs.get_initial_policy_set());
    assert!(cs.get_initial_policy_set_as_oid_set().contains(&ANY_POLICY));
    assert!(cs.get_revocation_skip_extensions().is_empty());
    assert!(cs.get_revocation_skip_policies().is_empty());
    assert!(cs.get_recognized_sign_pol_extensions().is_empty());
    assert_eq!(None, cs.get_revocation_freshness());
    assert_eq!(None, cs.get_min_qc_transaction_limit());
    assert_eq!(None, cs.get_qc_transaction_limit_currency());
    assert!(cs.get_validation_time() > 1_600_000_000);
}

#[test]
fn test_set_gets_cs() {
    use const_oid::db::rfc5280::ID_CE_CERTIFICATE_POLICIES;

    let mut cs = ConstraintSettings::new();
    cs.set_initial_explicit_policy_indicator(true);
    cs.set_validation_time(1_000);
    cs.set_revocation_freshness(86_400);
    cs.set_min_qc_transaction_limit(500_000);
    cs.set_qc_transaction_limit_currency("EUR".to_string());
    let mut oids = ObjectIdentifierSet::new();
    oids.insert(ID_CE_CERTIFICATE_POLICIES);
    cs.set_initial_policy_set_from_oid_set(&oids);

    assert!(cs.get_initial_explicit_policy_indicator());
    assert_eq!(1_000, cs.get_validation_time());
    assert_eq!(Some(86_400), cs.get_revocation_freshness());
    assert_eq!(Some(500_000), cs.get_min_qc_transaction_limit());
    assert_eq!(Some("EUR".to_string()), cs.get_qc_transaction_limit_currency());
    assert_eq!(oids, cs.get_initial_policy_set_as_oid_set());

    let oids = strings_to_oid_set(&[WILDCARD.to_string(), "2.5.29.32.0".to_string()]);
    assert_eq!(1, oids.len());
}

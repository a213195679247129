//! Name constraints processing, carried out by folding each certificate's permitted and excluded subtrees
//! into a [`NameConstraintState`] from the trust anchor toward the target, then checking the target's names
//! against the accumulated state.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;

use log::debug;

use crate::util::error::*;
use crate::util::logging::log_error_for_cert;
use crate::util::pdv_utilities::{email_addresses_from_dn, is_within_dn, is_within_subtree};
use crate::{
    CertificateNode, CertificationPath, ConstraintEvaluator, ConstraintLevel, ConstraintResult,
    GeneralNameType, GeneralNameValue, NameConstraintsInfo,
};

/// Name used when reporting the outcome of name constraints processing
pub const NAME_CONSTRAINTS_CONSTRAINT: &str = "nameConstraints";

/// `NameSubtrees` groups subtrees by name form
pub type NameSubtrees = BTreeMap<GeneralNameType, BTreeSet<GeneralNameValue>>;

/// Names of the target certificate that are checked against accumulated name constraints
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LeafNames {
    /// Subject DN in RFC 4514 string form
    pub dn: String,
    /// Subject alternative names
    pub subject_alt_names: Vec<GeneralNameValue>,
}

impl From<&CertificateNode> for LeafNames {
    fn from(cert: &CertificateNode) -> Self {
        LeafNames {
            dn: cert.subject_dn.clone(),
            subject_alt_names: cert.subject_alt_names.clone(),
        }
    }
}

impl LeafNames {
    /// Returns the names that are checked against subtrees of their respective types. When no rfc822Name is
    /// present among the subject alternative names, emailAddress attributes from the subject DN are checked as
    /// rfc822Name values.
    pub fn names_to_check(&self) -> Vec<GeneralNameValue> {
        let mut names = self.subject_alt_names.clone();
        if !names
            .iter()
            .any(|n| n.name_type == GeneralNameType::Rfc822Name)
        {
            for email in email_addresses_from_dn(&self.dn) {
                names.push(GeneralNameValue::new(GeneralNameType::Rfc822Name, &email));
            }
        }
        names
    }
}

/// Groups subtrees by type. Returns None when no subtrees were provided.
fn group_subtrees<'a, I>(subtrees: I) -> Option<NameSubtrees>
where
    I: Iterator<Item = &'a GeneralNameValue>,
{
    let mut retval = NameSubtrees::new();
    for gn in subtrees {
        retval.entry(gn.name_type).or_default().insert(gn.clone());
    }
    if retval.is_empty() {
        None
    } else {
        Some(retval)
    }
}

/// Intersection of accumulated permitted subtrees with newly asserted permitted subtrees. Types not asserted
/// anew are unchanged.
fn intersect_subtrees(original: NameSubtrees, current: NameSubtrees) -> NameSubtrees {
    let mut result = NameSubtrees::new();
    for (name_type, current_names) in &current {
        let intersection = result.entry(*name_type).or_default();
        match original.get(name_type) {
            Some(original_names) if !original_names.is_empty() => {
                for cur in current_names {
                    for orig in original_names {
                        if is_within_subtree(orig, cur) {
                            intersection.insert(orig.clone());
                        } else if is_within_subtree(cur, orig) {
                            intersection.insert(cur.clone());
                        }
                    }
                }
            }
            _ => intersection.extend(current_names.iter().cloned()),
        }
    }
    for (name_type, original_names) in original {
        result.entry(name_type).or_insert(original_names);
    }
    result
}

/// Union of accumulated excluded subtrees with newly asserted excluded subtrees, retaining the broader of two
/// nested subtrees.
fn union_subtrees(original: NameSubtrees, current: NameSubtrees) -> NameSubtrees {
    let mut result = NameSubtrees::new();
    for (name_type, current_names) in &current {
        let union = result.entry(*name_type).or_default();
        match original.get(name_type) {
            Some(original_names) if !original_names.is_empty() => {
                for cur in current_names {
                    for orig in original_names {
                        if is_within_subtree(orig, cur) {
                            union.insert(cur.clone());
                        } else if is_within_subtree(cur, orig) {
                            union.insert(orig.clone());
                        } else {
                            union.insert(cur.clone());
                            union.insert(orig.clone());
                        }
                    }
                }
            }
            _ => union.extend(current_names.iter().cloned()),
        }
    }
    for (name_type, original_names) in original {
        result.entry(name_type).or_insert(original_names);
    }
    result
}

/// `NameConstraintState` holds the permitted_subtrees and excluded_subtrees state variables. A value of None
/// indicates no subtrees of any type have been asserted.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NameConstraintState {
    /// Accumulated permitted subtrees
    pub permitted: Option<NameSubtrees>,
    /// Accumulated excluded subtrees
    pub excluded: Option<NameSubtrees>,
}

impl NameConstraintState {
    /// Creates state from initial subtrees, for example, those associated with a trust point.
    pub fn from_constraints(constraints: &[NameConstraintsInfo]) -> Self {
        NameConstraintState::default().apply(constraints)
    }

    /// Folds the name constraints asserted by a certificate into the state per RFC 5280 6.1.4 (g). Multiple
    /// extension instances are treated as a single extension containing all of their subtrees.
    pub fn apply(self, constraints: &[NameConstraintsInfo]) -> Self {
        let cert_permitted = group_subtrees(constraints.iter().flat_map(|nc| nc.permitted.iter()));
        let cert_excluded = group_subtrees(constraints.iter().flat_map(|nc| nc.excluded.iter()));

        let permitted = match (self.permitted, cert_permitted) {
            (Some(original), Some(current)) => Some(intersect_subtrees(original, current)),
            (None, current) => current,
            (original, None) => original,
        };
        let excluded = match (self.excluded, cert_excluded) {
            (Some(original), Some(current)) => Some(union_subtrees(original, current)),
            (None, current) => current,
            (original, None) => original,
        };
        NameConstraintState {
            permitted,
            excluded,
        }
    }

    /// Verifies the target's names are within the permitted subtrees and not within the excluded subtrees
    /// per RFC 5280 6.1.3 (b) and (c).
    pub fn check_names(&self, names: &LeafNames) -> Result<()> {
        let to_check = names.names_to_check();

        if let Some(permitted) = &self.permitted {
            if let Some(dn_subtrees) = permitted.get(&GeneralNameType::DirectoryName) {
                if !is_within_dn_subtrees(&names.dn, dn_subtrees) {
                    debug!("Subject name {} is not within permitted subtrees", names.dn);
                    return Err(Error::PolicyValidation(
                        PolicyValidationStatus::NameConstraintsViolation,
                    ));
                }
            }
            for name in &to_check {
                if let Some(subtrees) = permitted.get(&name.name_type) {
                    if !subtrees.iter().any(|s| is_within_subtree(name, s)) {
                        debug!("{} is not within permitted subtrees", name);
                        return Err(Error::PolicyValidation(
                            PolicyValidationStatus::NameConstraintsViolation,
                        ));
                    }
                }
            }
        }

        if let Some(excluded) = &self.excluded {
            if let Some(dn_subtrees) = excluded.get(&GeneralNameType::DirectoryName) {
                if is_within_dn_subtrees(&names.dn, dn_subtrees) {
                    debug!("Subject name {} is within excluded subtrees", names.dn);
                    return Err(Error::PolicyValidation(
                        PolicyValidationStatus::NameConstraintsViolation,
                    ));
                }
            }
            for name in &to_check {
                if let Some(subtrees) = excluded.get(&name.name_type) {
                    if subtrees.iter().any(|s| is_within_subtree(name, s)) {
                        debug!("{} is within excluded subtrees", name);
                        return Err(Error::PolicyValidation(
                            PolicyValidationStatus::NameConstraintsViolation,
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// An empty subject DN satisfies an empty set of subtrees and nothing else.
fn is_within_dn_subtrees(dn: &str, subtrees: &BTreeSet<GeneralNameValue>) -> bool {
    if dn.is_empty() && subtrees.is_empty() {
        return true;
    }
    subtrees.iter().any(|s| is_within_dn(dn, &s.value))
}

/// `check_name_constraints_from_state` folds the name constraints of every certificate in the path except the
/// target into `initial`, starting at the trust anchor, then checks `leaf_names` against the result.
pub fn check_name_constraints_from_state(
    initial: NameConstraintState,
    path: &CertificationPath,
    leaf_names: &LeafNames,
) -> Result<()> {
    let target = match path.target() {
        Some(t) => t,
        None => return Err(Error::NotFound),
    };
    let state = path
        .certificates
        .iter()
        .skip(1)
        .rev()
        .fold(initial, |state, cert| state.apply(&cert.name_constraints));

    if let Err(e) = state.check_names(leaf_names) {
        log_error_for_cert(target, "name constraints violation");
        return Err(e);
    }
    Ok(())
}

/// `check_name_constraints` verifies the names of the target certificate against the name constraints asserted
/// by the other certificates in the path.
pub fn check_name_constraints(path: &CertificationPath) -> Result<()> {
    let leaf_names = match path.target() {
        Some(t) => LeafNames::from(t),
        None => return Err(Error::NotFound),
    };
    check_name_constraints_from_state(NameConstraintState::default(), path, &leaf_names)
}

/// `evaluate_name_constraints` checks `leaf_names` against the name constraints asserted in the path and reports
/// the outcome as a [`ConstraintResult`].
pub fn evaluate_name_constraints(
    path: &CertificationPath,
    leaf_names: &LeafNames,
) -> ConstraintResult {
    ConstraintEvaluator::new(NAME_CONSTRAINTS_CONSTRAINT, ConstraintLevel::Fail).evaluate(|| {
        check_name_constraints_from_state(NameConstraintState::default(), path, leaf_names)
    })
}

#[cfg(test)]
fn dns(v: &str) -> GeneralNameValue {
    GeneralNameValue::new(GeneralNameType::DnsName, v)
}

#[test]
fn intersect_subtrees_test() {
    let state = NameConstraintState::from_constraints(&[NameConstraintsInfo {
        permitted: vec![dns("example.com")],
        excluded: vec![],
    }]);
    let state = state.apply(&[NameConstraintsInfo {
        permitted: vec![dns("foo.example.com")],
        excluded: vec![],
    }]);
    let permitted = state.permitted.clone().unwrap();
    assert_eq!(1, permitted[&GeneralNameType::DnsName].len());
    assert!(permitted[&GeneralNameType::DnsName].contains(&dns("foo.example.com")));

    let disjoint = state.apply(&[NameConstraintsInfo {
        permitted: vec![dns("example.net")],
        excluded: vec![],
    }]);
    assert!(disjoint.permitted.unwrap()[&GeneralNameType::DnsName].is_empty());
}

#[test]
fn union_subtrees_test() {
    let state = NameConstraintState::from_constraints(&[NameConstraintsInfo {
        permitted: vec![],
        excluded: vec![dns("foo.example.com")],
    }]);
    let state = state.apply(&[NameConstraintsInfo {
        permitted: vec![],
        excluded: vec![dns("example.com"), dns("example.net")],
    }]);
    let excluded = &state.excluded.unwrap()[&GeneralNameType::DnsName];
    assert!(excluded.contains(&dns("example.com")));
    assert!(excluded.contains(&dns("example.net")));
    // disjoint pairs retain both members
    assert_eq!(3, excluded.len());
}

#[test]
fn check_names_test() {
    let state = NameConstraintState::from_constraints(&[NameConstraintsInfo {
        permitted: vec![
            GeneralNameValue::new(GeneralNameType::DirectoryName, "O=Test,C=US"),
            GeneralNameValue::new(GeneralNameType::Rfc822Name, ".example.com"),
        ],
        excluded: vec![GeneralNameValue::new(
            GeneralNameType::DirectoryName,
            "OU=Excluded,O=Test,C=US",
        )],
    }]);

    let names = LeafNames {
        dn: "CN=Alice,O=Test,C=US".to_string(),
        subject_alt_names: vec![GeneralNameValue::new(
            GeneralNameType::Rfc822Name,
            "alice@mail.example.com",
        )],
    };
    assert!(state.check_names(&names).is_ok());

    let names = LeafNames {
        dn: "CN=Bob,OU=Excluded,O=Test,C=US".to_string(),
        subject_alt_names: vec![],
    };
    assert!(state.check_names(&names).is_err());

    // emailAddress in the DN is checked when no rfc822Name is present
    let names = LeafNames {
        dn: "CN=Carol,1.2.840.113549.1.9.1=carol@example.org,O=Test,C=US".to_string(),
        subject_alt_names: vec![],
    };
    assert!(state.check_names(&names).is_err());

    let names = LeafNames {
        dn: String::new(),
        subject_alt_names: vec![],
    };
    assert!(state.check_names(&names).is_err());
    assert!(NameConstraintState::default().check_names(&names).is_ok());
}

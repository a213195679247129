//! Policy tree-based certificate policy processing

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use const_oid::db::rfc5280::ANY_POLICY;
use der::asn1::ObjectIdentifier;
use log::debug;

use crate::util::error::*;
use crate::util::logging::log_error_for_cert;
use crate::validator::policy_utilities::PolicyTree;
use crate::{
    CertificateNode, CertificationPath, ConstraintEvaluator, ConstraintLevel, ConstraintResult,
    ConstraintSettings, ObjectIdentifierSet,
};

/// Name used when reporting the outcome of certificate policy processing
pub const CERTIFICATE_POLICIES_CONSTRAINT: &str = "certificatePolicies";

/// `ValidPolicyTreeNode` represents a node in the valid_policy_tree returned from
/// [`check_certificate_policies`]. Policy qualifiers are not retained.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidPolicyTreeNode {
    /// The valid_policy is a single policy OID representing a valid policy for the path of length x.
    pub valid_policy: ObjectIdentifier,
    /// The expected_policy_set contains one or more policy OIDs that would satisfy this policy in the certificate x+1.
    pub expected_policy_set: ObjectIdentifierSet,
}

/// Define a type to serve as the final value of the valid_policy_tree returned from
/// [`check_certificate_policies`]. Row 0 holds the root. An empty vector represents a NULL tree.
pub type FinalValidPolicyTree = Vec<Vec<ValidPolicyTreeNode>>;

/// Returns the set of policies that are valid for the target certificate, i.e., the valid_policy values of
/// the deepest row of the tree.
pub fn authority_constrained_policy_set(tree: &FinalValidPolicyTree) -> ObjectIdentifierSet {
    match tree.last() {
        Some(row) => row.iter().map(|n| n.valid_policy).collect(),
        None => ObjectIdentifierSet::new(),
    }
}

/// Working state carried from certificate to certificate. Each step consumes the prior state and yields the
/// next one.
#[derive(Clone, Debug)]
struct PolicyState {
    valid_policy_tree: Option<PolicyTree>,
    explicit_policy: u32,
    inhibit_any_policy: u32,
    policy_mapping: u32,
}

impl PolicyState {
    /// Initializes state variables per RFC 5280 6.1.2 (a), (d), (e) and (f). `certs_in_path` excludes the
    /// trust anchor.
    fn new(settings: &ConstraintSettings, certs_in_path: u32) -> Self {
        let initial = |indicator: bool| {
            if indicator {
                0
            } else {
                certs_in_path + 1
            }
        };
        PolicyState {
            valid_policy_tree: Some(PolicyTree::new()),
            explicit_policy: initial(settings.get_initial_explicit_policy_indicator()),
            inhibit_any_policy: initial(settings.get_initial_inhibit_any_policy_indicator()),
            policy_mapping: initial(settings.get_initial_policy_mapping_inhibit_indicator()),
        }
    }

    /// Basic certificate processing per 6.1.3 (d), (e) and (f) for certificate i of n.
    fn process_certificate(mut self, cert: &CertificateNode, i: usize, n: usize) -> Result<Self> {
        self.valid_policy_tree = match self.valid_policy_tree.take() {
            Some(tree) => process_policies(tree, cert, i, n, self.inhibit_any_policy),
            None => None,
        };

        if self.explicit_policy == 0 && self.valid_policy_tree.is_none() {
            log_error_for_cert(cert, "NULL policy set while processing intermediate certificate");
            return Err(Error::PolicyValidation(PolicyValidationStatus::NullPolicySet));
        }
        Ok(self)
    }

    /// Preparation for certificate i+1 per 6.1.4 (a), (b) and (h) through (j).
    fn prepare_for_next(mut self, cert: &CertificateNode, i: usize) -> Result<Self> {
        let mut mappings: BTreeMap<ObjectIdentifier, ObjectIdentifierSet> = BTreeMap::new();
        for m in &cert.policy_mappings {
            if m.issuer_domain_policy == ANY_POLICY || m.subject_domain_policy == ANY_POLICY {
                log_error_for_cert(cert, "policy mapping to or from anyPolicy");
                return Err(Error::PolicyValidation(
                    PolicyValidationStatus::InvalidPolicyMapping,
                ));
            }
            mappings
                .entry(m.issuer_domain_policy)
                .or_default()
                .insert(m.subject_domain_policy);
        }

        if !mappings.is_empty() {
            if let Some(mut tree) = self.valid_policy_tree.take() {
                if self.policy_mapping > 0 {
                    for (idp, sdps) in mappings {
                        if let Some(index) = tree.find_in_row(i, &idp) {
                            tree.set_expected_policy_set(index, sdps);
                        } else if let Some(any_index) = tree.find_in_row(i, &ANY_POLICY) {
                            if let Some(parent) = tree.node(any_index).parent {
                                tree.add_child(parent, idp, sdps);
                            }
                        }
                    }
                } else {
                    for idp in mappings.keys() {
                        while let Some(index) = tree.find_in_row(i, idp) {
                            tree.remove_subtree(index);
                        }
                    }
                    tree.prune_childless(i - 1);
                }
                if !tree.is_null() {
                    self.valid_policy_tree = Some(tree);
                }
            }
        }

        if !cert.self_signed {
            self.explicit_policy = self.explicit_policy.saturating_sub(1);
            self.policy_mapping = self.policy_mapping.saturating_sub(1);
            self.inhibit_any_policy = self.inhibit_any_policy.saturating_sub(1);
        }

        Ok(self.apply_constraints(cert))
    }

    /// Lowers the counters to the skip counts asserted in the policy constraints and inhibit anyPolicy
    /// extensions of `cert`, per 6.1.4 (i) and (j).
    fn apply_constraints(mut self, cert: &CertificateNode) -> Self {
        if let Some(rep) = cert.require_explicit_policy() {
            self.explicit_policy = self.explicit_policy.min(rep);
        }
        if let Some(ipm) = cert.inhibit_policy_mapping() {
            self.policy_mapping = self.policy_mapping.min(ipm);
        }
        if let Some(iap) = cert.inhibit_any_policy {
            self.inhibit_any_policy = self.inhibit_any_policy.min(iap);
        }
        self
    }

    /// Wrap-up procedure per 6.1.5 (a), (b) and (g).
    fn wrap_up(
        mut self,
        cert: &CertificateNode,
        n: usize,
        initial_policy_set: &ObjectIdentifierSet,
    ) -> Result<Self> {
        self.explicit_policy = self.explicit_policy.saturating_sub(1);
        if Some(0) == cert.require_explicit_policy() {
            self.explicit_policy = 0;
        }

        if let Some(mut tree) = self.valid_policy_tree.take() {
            if !initial_policy_set.contains(&ANY_POLICY) {
                intersect_with_initial_policy_set(&mut tree, n, initial_policy_set);
            }
            if !tree.is_null() {
                self.valid_policy_tree = Some(tree);
            }
        }

        if self.explicit_policy == 0 && self.valid_policy_tree.is_none() {
            log_error_for_cert(cert, "NULL policy set while processing target certificate");
            return Err(Error::PolicyValidation(PolicyValidationStatus::NullPolicySet));
        }
        Ok(self)
    }

    fn final_tree(&self) -> FinalValidPolicyTree {
        let tree = match &self.valid_policy_tree {
            Some(tree) => tree,
            None => return FinalValidPolicyTree::new(),
        };
        (0..tree.depth())
            .map(|d| {
                tree.row(d)
                    .iter()
                    .map(|i| {
                        let node = tree.node(*i);
                        ValidPolicyTreeNode {
                            valid_policy: node.valid_policy,
                            expected_policy_set: node.expected_policy_set.clone(),
                        }
                    })
                    .collect::<Vec<ValidPolicyTreeNode>>()
            })
            .filter(|row| !row.is_empty())
            .collect()
    }
}

/// Adds nodes of depth i for the policies asserted by certificate i, per 6.1.3 (d), or returns None
/// when the certificate asserts no policies, per 6.1.3 (e).
fn process_policies(
    mut tree: PolicyTree,
    cert: &CertificateNode,
    i: usize,
    n: usize,
    inhibit_any_policy: u32,
) -> Option<PolicyTree> {
    if cert.certificate_policies.is_empty() {
        debug!(
            "Certificate policies absent from {}, valid_policy_tree is NULL",
            cert.subject_dn
        );
        return None;
    }

    let prev_depth = i - 1;
    let prev_row = tree.row(prev_depth);
    let mut any_policy_asserted = false;

    for policy in &cert.certificate_policies {
        if *policy == ANY_POLICY {
            any_policy_asserted = true;
            continue;
        }

        // (d)(1)(i)
        let mut matched = false;
        for parent in &prev_row {
            if tree.node(*parent).expected_policy_set.contains(policy) {
                matched = true;
                if !tree.has_child(*parent, policy) {
                    tree.add_child(*parent, *policy, ObjectIdentifierSet::from([*policy]));
                }
            }
        }

        // (d)(1)(ii)
        if !matched {
            if let Some(any_parent) = tree.find_in_row(prev_depth, &ANY_POLICY) {
                if !tree.has_child(any_parent, policy) {
                    tree.add_child(any_parent, *policy, ObjectIdentifierSet::from([*policy]));
                }
            }
        }
    }

    // (d)(2)
    if any_policy_asserted && (inhibit_any_policy > 0 || (i < n && cert.self_signed)) {
        for parent in &prev_row {
            let expected: Vec<ObjectIdentifier> = tree
                .node(*parent)
                .expected_policy_set
                .iter()
                .copied()
                .collect();
            for policy in expected {
                if !tree.has_child(*parent, &policy) {
                    tree.add_child(*parent, policy, ObjectIdentifierSet::from([policy]));
                }
            }
        }
    }

    // (d)(3)
    tree.prune_childless(prev_depth);
    if tree.is_null() {
        debug!(
            "No acceptable policies found in {}, valid_policy_tree is NULL",
            cert.subject_dn
        );
        None
    } else {
        Some(tree)
    }
}

/// Calculates the intersection of the valid_policy_tree and the user-initial-policy-set per
/// 6.1.5 (g)(iii).
fn intersect_with_initial_policy_set(
    tree: &mut PolicyTree,
    n: usize,
    initial_policy_set: &ObjectIdentifierSet,
) {
    // 1 and 2
    for index in tree.valid_policy_node_set() {
        let policy = tree.node(index).valid_policy;
        if policy != ANY_POLICY && !initial_policy_set.contains(&policy) {
            tree.remove_subtree(index);
        }
    }

    // 3
    if let Some(any_index) = tree.find_in_row(n, &ANY_POLICY) {
        let surviving: ObjectIdentifierSet = tree
            .valid_policy_node_set()
            .iter()
            .map(|i| tree.node(*i).valid_policy)
            .collect();
        if let Some(parent) = tree.node(any_index).parent {
            for policy in initial_policy_set {
                if !surviving.contains(policy) {
                    tree.add_child(parent, *policy, ObjectIdentifierSet::from([*policy]));
                }
            }
        }
        tree.remove_subtree(any_index);
    }

    // 4
    tree.prune_childless(n - 1);
}

/// `check_certificate_policies` implements certificate policy processing per RFC 5280 sections 6.1.2 through
/// 6.1.5, walking the path from the certificate issued by the trust anchor (certificate 1) to the target
/// (certificate n). The trust anchor asserts no policies of its own. Its policy constraints and inhibit
/// anyPolicy extensions seed the counters.
///
/// It references the following values in the [`ConstraintSettings`] parameter:
/// - PS_INITIAL_EXPLICIT_POLICY_INDICATOR,
/// - PS_INITIAL_POLICY_MAPPING_INHIBIT_INDICATOR,
/// - PS_INITIAL_INHIBIT_ANY_POLICY_INDICATOR,
/// - PS_INITIAL_POLICY_SET.
///
/// Self-signed certificates do not decrement the explicit_policy, policy_mapping or inhibit_any_policy
/// counters. On success, the final valid_policy_tree is returned (empty if NULL).
pub fn check_certificate_policies(
    settings: &ConstraintSettings,
    path: &CertificationPath,
) -> Result<FinalValidPolicyTree> {
    let anchor = path.trust_anchor().ok_or(Error::NotFound)?;
    let n = path.len() - 1;
    let initial_policy_set = settings.get_initial_policy_set_as_oid_set();

    let state = path.from_anchor().skip(1).enumerate().try_fold(
        PolicyState::new(settings, n as u32).apply_constraints(anchor),
        |state, (index, cert)| {
            let i = index + 1;
            let state = state.process_certificate(cert, i, n)?;
            if i != n {
                state.prepare_for_next(cert, i)
            } else {
                state.wrap_up(cert, n, &initial_policy_set)
            }
        },
    )?;
    Ok(state.final_tree())
}

/// `evaluate_certificate_policies` runs [`check_certificate_policies`] and reports the outcome as a
/// [`ConstraintResult`].
pub fn evaluate_certificate_policies(
    settings: &ConstraintSettings,
    path: &CertificationPath,
) -> ConstraintResult {
    ConstraintEvaluator::new(CERTIFICATE_POLICIES_CONSTRAINT, ConstraintLevel::Fail)
        .evaluate(|| check_certificate_policies(settings, path).map(|_| ()))
}

#[cfg(test)]
fn policy_test_path(policies: &[&[ObjectIdentifier]]) -> CertificationPath {
    // policies are listed from the trust anchor to the target
    let count = policies.len();
    let nodes = policies
        .iter()
        .enumerate()
        .map(|(i, p)| {
            crate::CertificateNodeBuilder::new(&format!("{}", i))
                .subject_dn(&format!("CN={}", i))
                .issuer_dn(&format!("CN={}", if i == 0 { 0 } else { i - 1 }))
                .self_signed(i == 0)
                .basic_constraints(i + 1 < count, None)
                .certificate_policies(p)
                .build()
        })
        .rev()
        .collect();
    CertificationPath::new(nodes)
}

#[test]
fn matching_policies_test() {
    use const_oid::db::rfc5280::ID_CE_CERTIFICATE_POLICIES as P1;

    let path = policy_test_path(&[&[P1], &[P1], &[P1]]);
    let cs = ConstraintSettings::default();
    let tree = check_certificate_policies(&cs, &path).unwrap();
    assert_eq!(3, tree.len());
    assert_eq!(
        ObjectIdentifierSet::from([P1]),
        authority_constrained_policy_set(&tree)
    );
    assert!(evaluate_certificate_policies(&cs, &path).is_ok());
}

#[test]
fn explicit_policy_test() {
    use const_oid::db::rfc5280::ID_CE_CERTIFICATE_POLICIES as P1;

    let path = policy_test_path(&[&[P1], &[P1], &[]]);
    let mut cs = ConstraintSettings::default();
    assert!(check_certificate_policies(&cs, &path).unwrap().is_empty());

    cs.set_initial_explicit_policy_indicator(true);
    assert_eq!(
        Err(Error::PolicyValidation(PolicyValidationStatus::NullPolicySet)),
        check_certificate_policies(&cs, &path)
    );
    let r = evaluate_certificate_policies(&cs, &path);
    assert_eq!(Some(PolicyValidationStatus::NullPolicySet), r.error);
}

#[test]
fn initial_policy_set_test() {
    use const_oid::db::rfc5280::{ID_CE_CERTIFICATE_POLICIES as P1, ID_CE_POLICY_MAPPINGS as P2};

    let path = policy_test_path(&[&[ANY_POLICY], &[ANY_POLICY], &[P1]]);
    let mut cs = ConstraintSettings::default();
    cs.set_initial_explicit_policy_indicator(true);

    cs.set_initial_policy_set_from_oid_set(&ObjectIdentifierSet::from([P1]));
    let tree = check_certificate_policies(&cs, &path).unwrap();
    assert_eq!(
        ObjectIdentifierSet::from([P1]),
        authority_constrained_policy_set(&tree)
    );

    cs.set_initial_policy_set_from_oid_set(&ObjectIdentifierSet::from([P2]));
    assert_eq!(
        Err(Error::PolicyValidation(PolicyValidationStatus::NullPolicySet)),
        check_certificate_policies(&cs, &path)
    );
}

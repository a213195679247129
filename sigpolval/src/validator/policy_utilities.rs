//! Utility functions related to certificate policy processing.
//! Functions, structures, etc. in this file are pub(crate).

use alloc::vec::Vec;

use const_oid::db::rfc5280::ANY_POLICY;
use der::asn1::ObjectIdentifier;

use crate::ObjectIdentifierSet;

/// PolicyNode is the node type in the valid_policy_tree. The first two fields correspond to fields shown
/// in Figure 3 in section 6.1.2 of RFC5280 (qualifiers are not retained). The depth field indicates the
/// row in the valid_policy_tree where the node was added. All nodes except the root node have a parent.
///
/// Nodes are never removed from the pool. Removal from the tree removes the node index from its row and
/// from the children list of its parent.
#[derive(Clone, Debug)]
pub(crate) struct PolicyNode {
    pub(crate) valid_policy: ObjectIdentifier,
    pub(crate) expected_policy_set: ObjectIdentifierSet,
    pub(crate) depth: usize,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
}

/// PolicyTree is an arena-backed valid_policy_tree. `rows[d]` lists the indices of nodes of depth d that
/// remain in the tree.
#[derive(Clone, Debug)]
pub(crate) struct PolicyTree {
    pool: Vec<PolicyNode>,
    rows: Vec<Vec<usize>>,
}

impl PolicyTree {
    /// Creates a tree with a single anyPolicy node of depth 0 per 6.1.2 (a).
    pub(crate) fn new() -> Self {
        let root = PolicyNode {
            valid_policy: ANY_POLICY,
            expected_policy_set: ObjectIdentifierSet::from([ANY_POLICY]),
            depth: 0,
            parent: None,
            children: Vec::new(),
        };
        PolicyTree {
            pool: vec![root],
            rows: vec![vec![0]],
        }
    }

    pub(crate) fn node(&self, index: usize) -> &PolicyNode {
        &self.pool[index]
    }

    /// Returns the indices of nodes at the given depth
    pub(crate) fn row(&self, depth: usize) -> Vec<usize> {
        self.rows.get(depth).cloned().unwrap_or_default()
    }

    /// Returns true when the root has been removed
    pub(crate) fn is_null(&self) -> bool {
        self.rows.first().map(|r| r.is_empty()).unwrap_or(true)
    }

    /// Number of rows, including empty rows below the deepest node
    pub(crate) fn depth(&self) -> usize {
        self.rows.len()
    }

    /// Returns the index of the node at `depth` whose valid_policy is `policy`
    pub(crate) fn find_in_row(&self, depth: usize, policy: &ObjectIdentifier) -> Option<usize> {
        self.rows
            .get(depth)?
            .iter()
            .find(|i| self.pool[**i].valid_policy == *policy)
            .copied()
    }

    /// Returns true if the node at `index` has a child whose valid_policy is `policy`
    pub(crate) fn has_child(&self, index: usize, policy: &ObjectIdentifier) -> bool {
        self.pool[index]
            .children
            .iter()
            .any(|c| self.pool[*c].valid_policy == *policy)
    }

    /// Adds a node beneath `parent` and returns its index
    pub(crate) fn add_child(
        &mut self,
        parent: usize,
        valid_policy: ObjectIdentifier,
        expected_policy_set: ObjectIdentifierSet,
    ) -> usize {
        let depth = self.pool[parent].depth + 1;
        let index = self.pool.len();
        self.pool.push(PolicyNode {
            valid_policy,
            expected_policy_set,
            depth,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.pool[parent].children.push(index);
        while self.rows.len() <= depth {
            self.rows.push(Vec::new());
        }
        self.rows[depth].push(index);
        index
    }

    pub(crate) fn set_expected_policy_set(&mut self, index: usize, eps: ObjectIdentifierSet) {
        self.pool[index].expected_policy_set = eps;
    }

    /// Removes the node at `index` and all of its descendants
    pub(crate) fn remove_subtree(&mut self, index: usize) {
        let children = core::mem::take(&mut self.pool[index].children);
        for c in children {
            self.remove_subtree(c);
        }
        let depth = self.pool[index].depth;
        if let Some(row) = self.rows.get_mut(depth) {
            row.retain(|x| *x != index);
        }
        if let Some(parent) = self.pool[index].parent {
            self.pool[parent].children.retain(|x| *x != index);
        }
    }

    /// Deletes nodes of depth `max_depth` or less that have no children, working from the deepest row
    /// toward the root so that removals cascade.
    pub(crate) fn prune_childless(&mut self, max_depth: usize) {
        for depth in (0..=max_depth).rev() {
            let childless: Vec<usize> = self
                .row(depth)
                .into_iter()
                .filter(|i| self.pool[*i].children.is_empty())
                .collect();
            for i in childless {
                self.remove_subtree(i);
            }
        }
    }

    /// Collects the nodes whose parent has a valid_policy of anyPolicy, i.e., the valid_policy_node_set
    /// described in 6.1.5 (g)(iii)(1).
    pub(crate) fn valid_policy_node_set(&self) -> Vec<usize> {
        let mut retval = Vec::new();
        if !self.is_null() {
            self.harvest(0, &mut retval);
        }
        retval
    }

    fn harvest(&self, index: usize, acc: &mut Vec<usize>) {
        let node = &self.pool[index];
        if node.valid_policy == ANY_POLICY {
            for c in &node.children {
                acc.push(*c);
                self.harvest(*c, acc);
            }
        }
    }
}

#[test]
fn policy_tree_prune_test() {
    use const_oid::db::rfc5280::ID_CE_CERTIFICATE_POLICIES;

    let mut tree = PolicyTree::new();
    let p1 = tree.add_child(0, ID_CE_CERTIFICATE_POLICIES, ObjectIdentifierSet::new());
    let any = tree.add_child(0, ANY_POLICY, ObjectIdentifierSet::from([ANY_POLICY]));
    tree.add_child(p1, ID_CE_CERTIFICATE_POLICIES, ObjectIdentifierSet::new());
    assert_eq!(3, tree.depth());
    assert!(tree.has_child(0, &ANY_POLICY));
    assert_eq!(Some(any), tree.find_in_row(1, &ANY_POLICY));

    tree.prune_childless(1);
    assert_eq!(vec![p1], tree.row(1));
    assert_eq!(1, tree.valid_policy_node_set().len());

    tree.remove_subtree(p1);
    assert!(tree.row(2).is_empty());
    tree.prune_childless(1);
    assert!(tree.is_null());
}

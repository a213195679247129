//! Provides a structure that represents a certification path, ordered from the target certificate to a trust
//! anchor, along with functions that build paths from a pool of candidate certificates.

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

use log::debug;

use crate::util::error::{Error, PolicyValidationStatus, Result};
use crate::CertificateNode;

/// `CertificationPath` is used to represent the target certificate, intermediate CA certificates and trust
/// anchor that comprise a certification path.
///
/// The certificates are ordered innermost-first, i.e., `certificates[0]` is the target and the last element
/// is the trust anchor. Each certificate was issued by the certificate that follows it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[readonly::make]
pub struct CertificationPath {
    /// `certificates` contains the target, any intermediate CA certificates and the trust anchor
    #[readonly]
    pub certificates: Vec<CertificateNode>,
}

impl CertificationPath {
    /// Creates a path from certificates ordered from the target to the trust anchor.
    pub fn new(certificates: Vec<CertificateNode>) -> CertificationPath {
        CertificationPath { certificates }
    }

    /// Number of certificates in the path
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    /// Returns true if the path contains no certificates
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// Returns the target certificate, if any
    pub fn target(&self) -> Option<&CertificateNode> {
        self.certificates.first()
    }

    /// Returns the trust anchor, if any
    pub fn trust_anchor(&self) -> Option<&CertificateNode> {
        self.certificates.last()
    }

    /// Returns the certificates ordered from the trust anchor to the target
    pub fn from_anchor(&self) -> impl Iterator<Item = &CertificateNode> {
        self.certificates.iter().rev()
    }

    /// Returns true if a certificate with the same identifier as `cert` appears in the path
    pub fn contains(&self, cert: &CertificateNode) -> bool {
        self.certificates.iter().any(|c| c.id == cert.id)
    }

    /// Number of certificates between the target and the trust anchor that are not self-issued
    pub fn intermediate_count(&self) -> usize {
        if self.certificates.len() < 2 {
            return 0;
        }
        self.certificates[1..self.certificates.len() - 1]
            .iter()
            .filter(|c| !c.self_signed)
            .count()
    }
}

/// Returns the candidates that could have issued `cert`, i.e., those whose subject name matches the issuer
/// name of `cert`, excluding `cert` itself.
fn find_issuers<'a>(
    cert: &CertificateNode,
    pool: &'a [CertificateNode],
) -> impl Iterator<Item = &'a CertificateNode> {
    let issuer = cert.issuer_dn.clone();
    let id = cert.id.clone();
    pool.iter()
        .filter(move |c| c.id != id && c.subject_dn == issuer)
}

/// `build_known_chain` follows issuer links from `target` through `pool` until a self-signed certificate is
/// reached or no issuer can be found. The first matching issuer is followed at each step.
///
/// The returned path always begins with `target`. A path of length one indicates no issuer was found.
pub fn build_known_chain(target: &CertificateNode, pool: &[CertificateNode]) -> CertificationPath {
    let mut chain = vec![target.clone()];
    let mut visited = BTreeSet::new();
    visited.insert(target.id.clone());

    let mut current = target.clone();
    while !current.self_signed {
        let next = find_issuers(&current, pool).find(|c| !visited.contains(&c.id));
        match next {
            Some(issuer) => {
                visited.insert(issuer.id.clone());
                chain.push(issuer.clone());
                current = issuer.clone();
            }
            None => break,
        }
    }
    CertificationPath::new(chain)
}

/// Returns the subject names from which `trust_point` can be reached by following issuer links through `pool`.
fn names_reaching_trust_point(
    trust_point: &CertificateNode,
    pool: &[CertificateNode],
) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    names.insert(trust_point.subject_dn.clone());
    loop {
        let mut added = false;
        for c in pool {
            if c.id != trust_point.id
                && !c.self_signed
                && names.contains(&c.issuer_dn)
                && names.insert(c.subject_dn.clone())
            {
                added = true;
            }
        }
        if !added {
            return names;
        }
    }
}

/// State of a depth-first search for paths to a trust point
struct PathSearch<'a> {
    trust_point: &'a CertificateNode,
    pool: &'a [CertificateNode],
    max_path_length: Option<u32>,
    reaching: BTreeSet<String>,
    visited: BTreeSet<String>,
    paths: Vec<CertificationPath>,
    length_exceeded: bool,
}

impl PathSearch<'_> {
    /// Extends `partial` toward the trust point. Issuers from which the trust point cannot be reached are skipped,
    /// as are issuers that would push the number of non-self-issued intermediates beyond `max_path_length`.
    fn extend(&mut self, partial: &mut Vec<CertificateNode>) {
        let current = match partial.last() {
            Some(c) => c.clone(),
            None => return,
        };
        if current.issuer_dn == self.trust_point.subject_dn && current.id != self.trust_point.id {
            let mut path = partial.clone();
            path.push(self.trust_point.clone());
            self.paths.push(CertificationPath::new(path));
        }
        if current.self_signed {
            return;
        }

        let intermediates = partial.iter().skip(1).filter(|c| !c.self_signed).count();
        let candidates: Vec<CertificateNode> = find_issuers(&current, self.pool)
            .filter(|c| {
                c.id != self.trust_point.id
                    && !self.visited.contains(&c.id)
                    && self.reaching.contains(&c.issuer_dn)
            })
            .cloned()
            .collect();
        for issuer in candidates {
            if let Some(max) = self.max_path_length {
                if !issuer.self_signed && intermediates >= max as usize {
                    self.length_exceeded = true;
                    continue;
                }
            }
            self.visited.insert(issuer.id.clone());
            partial.push(issuer);
            self.extend(partial);
            if let Some(issuer) = partial.pop() {
                self.visited.remove(&issuer.id);
            }
        }
    }
}

/// `find_paths_to_trust_point` returns every path that can be built from `target` through certificates in `pool`
/// to `trust_point`, shortest first. If `target` is itself the trust point, a single path containing only the
/// target is returned.
///
/// When `max_path_length` is provided, the search does not descend past the allowed number of non-self-issued
/// intermediate certificates. If the only paths to the trust point are longer than allowed,
/// [`PolicyValidationStatus::PathLengthExceeded`] is returned. If no path was found,
/// [`PolicyValidationStatus::NoPathsFound`] is returned.
pub fn find_paths_to_trust_point(
    target: &CertificateNode,
    trust_point: &CertificateNode,
    pool: &[CertificateNode],
    max_path_length: Option<u32>,
) -> Result<Vec<CertificationPath>> {
    if target.id == trust_point.id {
        return Ok(vec![CertificationPath::new(vec![target.clone()])]);
    }

    let mut search = PathSearch {
        trust_point,
        pool,
        max_path_length,
        reaching: names_reaching_trust_point(trust_point, pool),
        visited: BTreeSet::from([target.id.clone()]),
        paths: Vec::new(),
        length_exceeded: false,
    };
    search.extend(&mut vec![target.clone()]);

    let mut paths = search.paths;
    if paths.is_empty() {
        if search.length_exceeded {
            debug!(
                "Paths from {} to trust point {} exceed path length constraint of {:?}",
                target.subject_dn, trust_point.subject_dn, max_path_length
            );
            return Err(Error::PolicyValidation(
                PolicyValidationStatus::PathLengthExceeded,
            ));
        }
        debug!(
            "No paths found from {} to trust point {}",
            target.subject_dn, trust_point.subject_dn
        );
        return Err(Error::PolicyValidation(PolicyValidationStatus::NoPathsFound));
    }

    paths.sort_by_key(|p| p.len());
    Ok(paths)
}

#[cfg(test)]
fn test_node(id: &str, subject: &str, issuer: &str, self_signed: bool) -> CertificateNode {
    crate::CertificateNodeBuilder::new(id)
        .subject_dn(subject)
        .issuer_dn(issuer)
        .self_signed(self_signed)
        .build()
}

#[test]
fn build_known_chain_test() {
    let root = test_node("root", "CN=Root", "CN=Root", true);
    let ca = test_node("ca", "CN=CA", "CN=Root", false);
    let ee = test_node("ee", "CN=EE", "CN=CA", false);
    let unrelated = test_node("other", "CN=Other", "CN=Root", false);

    let pool = vec![unrelated, root.clone(), ca.clone()];
    let chain = build_known_chain(&ee, &pool);
    assert_eq!(3, chain.len());
    assert_eq!("ee", chain.target().unwrap().id);
    assert_eq!("root", chain.trust_anchor().unwrap().id);
    assert_eq!(1, chain.intermediate_count());

    let chain = build_known_chain(&ee, &[]);
    assert_eq!(1, chain.len());

    // loops terminate
    let a = test_node("a", "CN=A", "CN=B", false);
    let b = test_node("b", "CN=B", "CN=A", false);
    let chain = build_known_chain(&a, &[a.clone(), b]);
    assert_eq!(2, chain.len());
}

#[test]
fn find_paths_test() {
    let tp = test_node("tp", "CN=TP", "CN=TP", true);
    let ca1 = test_node("ca1", "CN=CA1", "CN=TP", false);
    let ca2 = test_node("ca2", "CN=CA2", "CN=CA1", false);
    let ee = test_node("ee", "CN=EE", "CN=CA2", false);
    let pool = vec![ca1, ca2];

    let paths = find_paths_to_trust_point(&ee, &tp, &pool, None).unwrap();
    assert_eq!(1, paths.len());
    assert_eq!(4, paths[0].len());

    assert!(find_paths_to_trust_point(&ee, &tp, &pool, Some(2)).is_ok());
    assert_eq!(
        Err(Error::PolicyValidation(
            PolicyValidationStatus::PathLengthExceeded
        )),
        find_paths_to_trust_point(&ee, &tp, &pool, Some(1))
    );

    let other_tp = test_node("otp", "CN=Other", "CN=Other", true);
    assert_eq!(
        Err(Error::PolicyValidation(PolicyValidationStatus::NoPathsFound)),
        find_paths_to_trust_point(&ee, &other_tp, &pool, None)
    );

    let paths = find_paths_to_trust_point(&tp, &tp, &pool, Some(0)).unwrap();
    assert_eq!(1, paths[0].len());
}

#[test]
fn find_paths_bounded_by_path_length_test() {
    // ten layers of three cross-certified CAs sharing a subject name per layer
    let tp = test_node("tp", "CN=L10", "CN=L10", true);
    let mut pool = Vec::new();
    for layer in 1..10 {
        for k in 0..3 {
            pool.push(test_node(
                &format!("ca{}.{}", layer, k),
                &format!("CN=L{}", layer),
                &format!("CN=L{}", layer + 1),
                false,
            ));
        }
    }
    let ee = test_node("ee", "CN=EE", "CN=L1", false);

    assert_eq!(
        Err(Error::PolicyValidation(
            PolicyValidationStatus::PathLengthExceeded
        )),
        find_paths_to_trust_point(&ee, &tp, &pool, Some(1))
    );

    let mut short_pool = pool[..6].to_vec();
    short_pool.push(test_node("bridge", "CN=L3", "CN=L10", false));
    let paths = find_paths_to_trust_point(&ee, &tp, &short_pool, Some(3)).unwrap();
    assert_eq!(9, paths.len());
    assert!(paths.iter().all(|p| p.intermediate_count() == 3));

    // unreachable branches are not reported as too long
    let stray = test_node("stray", "CN=L1", "CN=Nowhere", false);
    assert_eq!(
        Err(Error::PolicyValidation(PolicyValidationStatus::NoPathsFound)),
        find_paths_to_trust_point(&ee, &tp, &[stray], Some(0))
    );
}

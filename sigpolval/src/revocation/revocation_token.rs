//! Revocation tokens and the interface used to obtain them

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::CertificateNode;

/// Kind of revocation data a token was derived from
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RevocationTokenType {
    /// Certificate revocation list
    Crl,
    /// OCSP response
    Ocsp,
}

impl fmt::Display for RevocationTokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevocationTokenType::Crl => write!(f, "CRL"),
            RevocationTokenType::Ocsp => write!(f, "OCSP"),
        }
    }
}

/// `RevocationToken` summarizes a CRL entry lookup or OCSP response for a single certificate.
///
/// The `valid` field indicates whether the revocation data itself was successfully verified. The `status` field
/// is `Some(true)` when the data shows the certificate is not revoked, `Some(false)` when it shows the certificate
/// is revoked, and `None` when no status could be determined from the data.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RevocationToken {
    /// Source of the token
    pub token_type: RevocationTokenType,
    /// Whether the revocation data was verified
    pub valid: bool,
    /// Revocation status, true if not revoked
    pub status: Option<bool>,
    /// thisUpdate (or producedAt) in seconds since the Unix epoch
    pub this_update: u64,
    /// nextUpdate in seconds since the Unix epoch, if present
    pub next_update: Option<u64>,
}

impl RevocationToken {
    /// Creates a token with no nextUpdate value
    pub fn new(
        token_type: RevocationTokenType,
        valid: bool,
        status: Option<bool>,
        this_update: u64,
    ) -> Self {
        RevocationToken {
            token_type,
            valid,
            status,
            this_update,
            next_update: None,
        }
    }

    /// Returns a copy of this token with the given nextUpdate value
    pub fn with_next_update(mut self, next_update: u64) -> Self {
        self.next_update = Some(next_update);
        self
    }

    /// Returns true if thisUpdate is no older than `max_age` seconds before `validation_time`
    pub fn is_fresh(&self, validation_time: u64, max_age: u64) -> bool {
        self.this_update >= validation_time.saturating_sub(max_age)
    }
}

/// The [`RevocationTokenSource`] trait defines the interface used to obtain revocation data that has already been
/// fetched and verified for a certificate.
pub trait RevocationTokenSource {
    /// Returns the revocation tokens available for the given certificate, or an empty vector if none are available.
    fn get_revocation_tokens(&self, cert: &CertificateNode) -> Vec<RevocationToken>;
}

/// `RevocationTokens` is a [`RevocationTokenSource`] implementation that holds tokens in memory, keyed by
/// certificate identifier.
#[derive(Clone, Debug, Default)]
pub struct RevocationTokens {
    tokens: BTreeMap<String, Vec<RevocationToken>>,
}

impl RevocationTokens {
    /// Creates an empty token store
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates a token with a certificate
    pub fn add_token(&mut self, cert: &CertificateNode, token: RevocationToken) {
        self.tokens.entry(cert.id.clone()).or_default().push(token);
    }

    /// Number of certificates for which tokens are available
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if no tokens are available
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl RevocationTokenSource for RevocationTokens {
    fn get_revocation_tokens(&self, cert: &CertificateNode) -> Vec<RevocationToken> {
        self.tokens.get(&cert.id).cloned().unwrap_or_default()
    }
}

#[test]
fn revocation_tokens_test() {
    let cert = crate::CertificateNodeBuilder::new("a").build();
    let other = crate::CertificateNodeBuilder::new("b").build();
    let mut tokens = RevocationTokens::new();
    assert!(tokens.is_empty());
    tokens.add_token(
        &cert,
        RevocationToken::new(RevocationTokenType::Crl, true, Some(true), 100).with_next_update(200),
    );
    tokens.add_token(
        &cert,
        RevocationToken::new(RevocationTokenType::Ocsp, false, None, 150),
    );
    assert_eq!(1, tokens.len());
    assert_eq!(2, tokens.get_revocation_tokens(&cert).len());
    assert!(tokens.get_revocation_tokens(&other).is_empty());

    let t = &tokens.get_revocation_tokens(&cert)[0];
    assert_eq!(Some(200), t.next_update);
    assert!(t.is_fresh(150, 50));
    assert!(!t.is_fresh(151, 50));
    assert!(t.is_fresh(10, 50));
    assert_eq!("OCSP", RevocationTokenType::Ocsp.to_string());
}

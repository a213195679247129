//! Utility functions that support name constraints processing and general encoding chores

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::str;
use std::net::IpAddr;

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use subtle_encoding::hex;
use url::Url;

use der::{Any, Decode, Tag, Tagged};

use crate::{GeneralNameType, GeneralNameValue};

/// OID string for the emailAddress attribute from PKCS #9 as it appears in RFC 4514 string representations
pub const EMAIL_ADDRESS_OID_STR: &str = "1.2.840.113549.1.9.1";

/// `buffer_to_hex` takes a byte array and returns a string featuring upper case ASCII hex characters (without
/// commas, spaces, or brackets).
pub fn buffer_to_hex(buffer: &[u8]) -> String {
    let hex = hex::encode_upper(buffer);
    match str::from_utf8(hex.as_slice()) {
        Ok(s) => s.to_string(),
        Err(_) => "".to_string(),
    }
}

/// `hex_to_buffer` decodes a string of hex characters, optionally prefixed with `#`, in either case.
pub fn hex_to_buffer(value: &str) -> Option<Vec<u8>> {
    let digits = value.strip_prefix('#').unwrap_or(value).to_lowercase();
    hex::decode(digits.as_bytes()).ok()
}

/// `decode_rdn_value` returns the string form of an attribute value. Values expressed as `#` followed by
/// the hex encoding of a DER-encoded string type are decoded, other values are returned unchanged.
pub fn decode_rdn_value(value: &str) -> String {
    if !value.starts_with('#') {
        return value.to_string();
    }
    let decoded = hex_to_buffer(value).and_then(|buf| Any::from_der(&buf).ok());
    if let Some(any) = decoded {
        match any.tag() {
            Tag::Ia5String
            | Tag::Utf8String
            | Tag::PrintableString
            | Tag::VisibleString
            | Tag::TeletexString => {
                if let Ok(s) = str::from_utf8(any.value()) {
                    return s.to_string();
                }
            }
            _ => {}
        }
    }
    value.to_string()
}

/// Splits a distinguished name string into relative distinguished name strings at each comma that is not
/// escaped by a preceding backslash.
pub(crate) fn split_rdns(dn: &str) -> Vec<String> {
    let mut rdns = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in dn.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            current.push(c);
            escaped = true;
        } else if c == ',' {
            rdns.push(current);
            current = String::new();
        } else {
            current.push(c);
        }
    }
    rdns.push(current);
    rdns
}

/// `dn_to_map` converts a distinguished name string to a map of attribute type to the set of values asserted
/// for that type.
///
/// Fragments lacking an `=` separator, as arise from leading or trailing commas, are ignored. Attribute types
/// are compared without regard to case. Values are compared as written.
pub fn dn_to_map(dn: &str) -> BTreeMap<String, BTreeSet<String>> {
    let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for rdn in split_rdns(dn) {
        if let Some(idx) = rdn.find('=') {
            let key = rdn[..idx].trim().to_uppercase();
            let value = rdn[idx + 1..].trim().to_string();
            map.entry(key).or_default().insert(value);
        }
    }
    map
}

/// `email_addresses_from_dn` returns the values of any emailAddress attributes present in a distinguished name.
pub fn email_addresses_from_dn(dn: &str) -> Vec<String> {
    let mut retval = Vec::new();
    for rdn in split_rdns(dn) {
        if let Some(idx) = rdn.find('=') {
            let key = rdn[..idx].trim();
            if key == EMAIL_ADDRESS_OID_STR
                || key.eq_ignore_ascii_case("emailAddress")
                || key.eq_ignore_ascii_case("E")
            {
                retval.push(decode_rdn_value(rdn[idx + 1..].trim()));
            }
        }
    }
    retval
}

/// `is_within_dn` returns true if every attribute value in the subtree is also asserted in the name.
pub fn is_within_dn(name: &str, subtree: &str) -> bool {
    let name_map = dn_to_map(name);
    let subtree_map = dn_to_map(subtree);
    subtree_map.iter().all(|(key, values)| match name_map.get(key) {
        Some(name_values) => values.is_subset(name_values),
        None => false,
    })
}

/// `domain_name` returns the host portion of a URI, or the value stripped of any scheme, `www.` prefix, port,
/// path, query or fragment if the value cannot be parsed as a URI with a host.
pub fn domain_name(uri: &str) -> String {
    lazy_static! {
        static ref DOMAIN_RE: Regex = Regex::new("(^.*://)|(www\\.)|([?=:#/].*)").unwrap();
    }

    if let Ok(url) = Url::parse(uri) {
        if let Some(host) = url.host_str() {
            return host.strip_prefix("www.").unwrap_or(host).to_string();
        }
    }
    DOMAIN_RE.replace_all(uri, "").to_string()
}

/// `is_within_domain` returns true if value falls within domain. A domain with a leading period matches
/// any host ending with the domain. Otherwise the host must equal the domain. Comparisons ignore case.
pub fn is_within_domain(value: &str, domain: &str) -> bool {
    if domain.starts_with('.') {
        value.to_lowercase().ends_with(&domain.to_lowercase())
    } else {
        value.eq_ignore_ascii_case(domain)
    }
}

/// `is_within_dns` returns true if the DNS name equals or is a subdomain of the subtree, compared label by
/// label without regard to case.
pub fn is_within_dns(name: &str, subtree: &str) -> bool {
    let name = name.to_lowercase();
    let subtree = subtree.trim_start_matches('.').to_lowercase();
    let name_labels: Vec<&str> = name.split('.').collect();
    let subtree_labels: Vec<&str> = subtree.split('.').collect();
    if subtree_labels.len() > name_labels.len() {
        return false;
    }
    let diff = name_labels.len() - subtree_labels.len();
    name_labels[diff..] == subtree_labels[..]
}

/// `is_within_rfc822` returns true if the email address matches a mailbox subtree exactly or falls within a
/// host or domain subtree.
pub fn is_within_rfc822(name: &str, subtree: &str) -> bool {
    if subtree.contains('@') {
        return name.eq_ignore_ascii_case(subtree);
    }
    let host = match name.find('@') {
        Some(idx) => &name[idx + 1..],
        None => name,
    };
    is_within_domain(host, subtree)
}

/// `is_within_uri` returns true if the host of the URI falls within the domain of the subtree.
pub fn is_within_uri(name: &str, subtree: &str) -> bool {
    is_within_domain(&domain_name(name), &domain_name(subtree))
}

/// Returns the octets of an IP address expressed as `#` prefixed hex or in textual form.
pub(crate) fn ip_to_buffer(value: &str) -> Option<Vec<u8>> {
    if value.starts_with('#') {
        return hex_to_buffer(value);
    }
    match value.parse::<IpAddr>() {
        Ok(IpAddr::V4(a)) => Some(a.octets().to_vec()),
        Ok(IpAddr::V6(a)) => Some(a.octets().to_vec()),
        Err(_) => hex_to_buffer(value),
    }
}

/// `is_within_ip` returns true if the address masked by the subtree's mask equals the subtree's base address
/// masked by the same mask. The subtree carries the base address followed by the mask, i.e., 8 octets for
/// IPv4 and 32 octets for IPv6.
pub fn is_within_ip(name: &str, subtree: &str) -> bool {
    let (target, constraint) = match (ip_to_buffer(name), ip_to_buffer(subtree)) {
        (Some(t), Some(c)) => (t, c),
        _ => return false,
    };
    if constraint.len() != target.len() * 2 {
        return false;
    }
    let (base, mask) = constraint.split_at(target.len());
    target
        .iter()
        .zip(base.iter().zip(mask.iter()))
        .all(|(t, (b, m))| (t & m) == (b & m))
}

/// `is_within_subtree` returns true if name falls within subtree per the matching rules for the name form.
/// Names of differing forms never match.
pub fn is_within_subtree(name: &GeneralNameValue, subtree: &GeneralNameValue) -> bool {
    if name.name_type != subtree.name_type || name.value.is_empty() || subtree.value.is_empty() {
        return false;
    }
    if name.name_type != GeneralNameType::IpAddress && subtree.value.len() > name.value.len() {
        return false;
    }
    match name.name_type {
        GeneralNameType::UniformResourceIdentifier => is_within_uri(&name.value, &subtree.value),
        GeneralNameType::Rfc822Name => is_within_rfc822(&name.value, &subtree.value),
        GeneralNameType::DnsName => is_within_dns(&name.value, &subtree.value),
        GeneralNameType::DirectoryName => is_within_dn(&name.value, &subtree.value),
        GeneralNameType::IpAddress => is_within_ip(&name.value, &subtree.value),
        _ => {
            warn!(
                "Name form {} is compared by exact match only",
                name.name_type
            );
            name.value == subtree.value
        }
    }
}

#[test]
fn split_rdns_test() {
    assert_eq!(
        vec!["CN=a\\,b".to_string(), "O=c".to_string()],
        split_rdns("CN=a\\,b,O=c")
    );
    assert_eq!(3, split_rdns(",CN=a,").len());
}

#[test]
fn dn_to_map_test() {
    let m = dn_to_map(",OU=permittedSubtree1,O=Test Certificates 2011,C=US,");
    assert_eq!(3, m.len());
    assert!(m["OU"].contains("permittedSubtree1"));
    assert!(!m["OU"].contains("permittedsubtree1"));

    let m = dn_to_map("ou=permittedSubtree1,o=Test");
    assert!(m["OU"].contains("permittedSubtree1"));

    let m = dn_to_map("OU=permittedSubtree1\\,O=Test,C=US");
    assert!(m["OU"].contains("permittedSubtree1\\,O=Test"));
    assert!(!m.contains_key("O"));
}

#[test]
fn is_within_dn_test() {
    let subtree = "OU=permittedSubtree1,O=Test Certificates 2011,C=US";
    assert!(is_within_dn(
        "CN=Valid DN nameConstraints EE Certificate Test1,OU=permittedSubtree1,O=Test Certificates 2011,C=US",
        subtree
    ));
    assert!(!is_within_dn(
        "CN=Invalid DN nameConstraints EE Certificate Test2,OU=excludedSubtree1,O=Test Certificates 2011,C=US",
        subtree
    ));
    assert!(!is_within_dn(
        "CN=Test,OU=permittedSubtree1\\,O=Test Certificates 2011,C=US",
        subtree
    ));
    assert!(!is_within_dn(
        "CN=Test,OU=PERMITTEDSUBTREE1,O=Test Certificates 2011,C=US",
        subtree
    ));
    assert!(is_within_dn(
        "cn=Test,ou=permittedSubtree1,o=Test Certificates 2011,c=US",
        subtree
    ));
    assert!(!is_within_dn("", subtree));
    assert!(is_within_dn("CN=anything", ""));
}

#[test]
fn domain_name_test() {
    assert_eq!(
        "testcertificates.gov",
        domain_name("http://testcertificates.gov/invalid.html")
    );
    assert_eq!(
        "invalidcertificates.gov",
        domain_name("ftp://invalidcertificates.gov:21/test37/")
    );
    assert_eq!("host.example.gov", domain_name("https://user@www.host.example.gov"));
    assert_eq!(".testcertificates.gov", domain_name(".testcertificates.gov"));
    assert_eq!("testcertificates.gov", domain_name("testcertificates.gov"));
}

#[test]
fn is_within_domain_test() {
    assert!(is_within_domain("host.example.gov", ".example.gov"));
    assert!(!is_within_domain("example.gov", ".example.gov"));
    assert!(is_within_domain("Example.gov", "example.gov"));
    assert!(!is_within_domain("host.example.gov", "example.gov"));
}

#[test]
fn is_within_dns_test() {
    assert!(is_within_dns("testserver.testcertificates.gov", "testcertificates.gov"));
    assert!(is_within_dns("TestCertificates.gov", "testcertificates.gov"));
    assert!(!is_within_dns("mytestcertificates.gov", "testcertificates.gov"));
    assert!(!is_within_dns("gov", "testcertificates.gov"));
}

#[test]
fn is_within_rfc822_test() {
    assert!(is_within_rfc822("Test@testcertificates.gov", "testcertificates.gov"));
    assert!(!is_within_rfc822(
        "Test@mailserver.testcertificates.gov",
        "testcertificates.gov"
    ));
    assert!(is_within_rfc822(
        "Test@mailserver.testcertificates.gov",
        ".testcertificates.gov"
    ));
    assert!(!is_within_rfc822("Test@testcertificates.gov", ".testcertificates.gov"));
    assert!(is_within_rfc822("test@testcertificates.gov", "Test@testcertificates.gov"));
}

#[test]
fn is_within_ip_test() {
    assert!(is_within_ip("#c0a80005", "#c0a80000ffffff00"));
    assert!(!is_within_ip("#c0a80005", "#c0a80000ffff00ff"));
    assert!(is_within_ip("192.168.0.5", "#C0A80000FFFFFF00"));
    assert!(is_within_ip("#C0000200", "#0000000000000000"));
    assert!(!is_within_ip("#C0000200", "#FFFFFFFFFFFFFFFF"));
    assert!(!is_within_ip("#c0a80005", "#c0a80000"));
}

#[test]
fn decode_rdn_value_test() {
    assert_eq!(
        "Test29EE@invalidcertificates.gov",
        decode_rdn_value("#1620546573743239454540696e76616c69646365727469666963617465732e676f76")
    );
    assert_eq!("plain", decode_rdn_value("plain"));
    assert_eq!(
        vec!["Test29EE@invalidcertificates.gov".to_string()],
        email_addresses_from_dn(
            "1.2.840.113549.1.9.1=#1620546573743239454540696e76616c69646365727469666963617465732e676f76,CN=Test"
        )
    );
}

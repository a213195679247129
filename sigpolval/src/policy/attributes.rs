//! Checks that attributes mandated by a signature policy are present in a signature

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use der::asn1::ObjectIdentifier;
use x509_cert::attr::{Attribute, Attributes};

use crate::util::error::*;
use crate::{ItemValidator, ObjectIdentifierSet};

/// Name used when reporting the outcome of a mandated signed attributes check
pub const MANDATED_SIGNED_ATTR_CONSTRAINT: &str = "signerRules.mandatedSignedAttr";
/// Name used when reporting the outcome of a mandated unsigned attributes check
pub const MANDATED_UNSIGNED_ATTR_CONSTRAINT: &str = "signerRules.mandatedUnsignedAttr";
/// Name used when reporting the outcome of a verifier rules mandated unsigned attributes check
pub const VERIFIER_MANDATED_UNSIGNED_ATTR_CONSTRAINT: &str = "verifierRules.mandatedUnsignedAttr";

/// The [`AttributeAccessor`] trait abstracts the attribute table of a signature.
pub trait AttributeAccessor {
    /// Returns true if an attribute of the given type is present
    fn contains_attribute(&self, oid: &ObjectIdentifier) -> bool;
}

impl AttributeAccessor for ObjectIdentifierSet {
    fn contains_attribute(&self, oid: &ObjectIdentifier) -> bool {
        self.contains(oid)
    }
}

impl AttributeAccessor for Attributes {
    fn contains_attribute(&self, oid: &ObjectIdentifier) -> bool {
        self.iter().any(|a| a.oid == *oid)
    }
}

impl AttributeAccessor for [Attribute] {
    fn contains_attribute(&self, oid: &ObjectIdentifier) -> bool {
        self.iter().any(|a| a.oid == *oid)
    }
}

impl<T: AttributeAccessor + ?Sized> AttributeAccessor for Option<&T> {
    fn contains_attribute(&self, oid: &ObjectIdentifier) -> bool {
        match self {
            Some(t) => t.contains_attribute(oid),
            None => false,
        }
    }
}

/// `MandatedAttributesValidator` fails when any of the mandated attribute types is absent from the attribute
/// table. Every absent type is reported.
pub struct MandatedAttributesValidator<'a, A: AttributeAccessor + ?Sized> {
    name: String,
    mandated: &'a [ObjectIdentifier],
    accessor: &'a A,
}

impl<'a, A: AttributeAccessor + ?Sized> MandatedAttributesValidator<'a, A> {
    /// Creates a validator reporting under `name`
    pub fn new(name: &str, mandated: &'a [ObjectIdentifier], accessor: &'a A) -> Self {
        MandatedAttributesValidator {
            name: name.to_string(),
            mandated,
            accessor,
        }
    }

    /// Returns the mandated attribute types that are absent, in the order they were mandated
    pub fn missing_attributes(&self) -> Vec<ObjectIdentifier> {
        self.mandated
            .iter()
            .filter(|oid| !self.accessor.contains_attribute(oid))
            .copied()
            .collect()
    }
}

impl<A: AttributeAccessor + ?Sized> ItemValidator for MandatedAttributesValidator<'_, A> {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> Result<()> {
        if self.missing_attributes().is_empty() {
            Ok(())
        } else {
            Err(Error::PolicyValidation(
                PolicyValidationStatus::MissingMandatedAttribute,
            ))
        }
    }

    fn error_detail(&self) -> Option<String> {
        let missing = self.missing_attributes();
        if missing.is_empty() {
            return None;
        }
        let missing: Vec<String> = missing.iter().map(|o| o.to_string()).collect();
        Some(format!("Attributes missing: [{}]", missing.join(", ")))
    }
}

#[test]
fn mandated_attributes_test() {
    use const_oid::db::rfc5911::{ID_CONTENT_TYPE, ID_MESSAGE_DIGEST, ID_SIGNING_TIME};
    use der::asn1::SetOfVec;

    let present = ObjectIdentifierSet::from([ID_CONTENT_TYPE, ID_MESSAGE_DIGEST]);
    let mandated = [ID_CONTENT_TYPE, ID_SIGNING_TIME, ID_MESSAGE_DIGEST];
    let v = MandatedAttributesValidator::new(MANDATED_SIGNED_ATTR_CONSTRAINT, &mandated, &present);
    assert!(!v.validate());
    assert_eq!(vec![ID_SIGNING_TIME], v.missing_attributes());
    assert_eq!(
        Some(format!("Attributes missing: [{}]", ID_SIGNING_TIME)),
        v.error_detail()
    );

    let none: [ObjectIdentifier; 0] = [];
    let v = MandatedAttributesValidator::new(MANDATED_SIGNED_ATTR_CONSTRAINT, &none, &present);
    assert!(v.validate());

    let mut attrs: Attributes = SetOfVec::new();
    attrs
        .insert(Attribute {
            oid: ID_SIGNING_TIME,
            values: SetOfVec::new(),
        })
        .unwrap();
    let v = MandatedAttributesValidator::new(MANDATED_SIGNED_ATTR_CONSTRAINT, &mandated, &attrs);
    assert_eq!(vec![ID_CONTENT_TYPE, ID_MESSAGE_DIGEST], v.missing_attributes());

    let absent: Option<&Attributes> = None;
    let v = MandatedAttributesValidator::new(MANDATED_UNSIGNED_ATTR_CONSTRAINT, &mandated, &absent);
    assert_eq!(3, v.missing_attributes().len());
}

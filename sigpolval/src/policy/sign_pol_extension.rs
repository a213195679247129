//! Dispatch of signature policy extensions to validators

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;

use der::asn1::ObjectIdentifier;
use log::warn;

use crate::util::error::*;
use crate::{strings_to_oid_set, CollectionValidator, ConstraintSettings, ItemValidator, SignPolExtn};

/// `UnknownExtensionValidator` represents a signature policy extension that is not recognized. It always fails.
pub struct UnknownExtensionValidator {
    extn_id: ObjectIdentifier,
}

impl UnknownExtensionValidator {
    /// Creates a validator for the extension identified by `extn_id`
    pub fn new(extn_id: ObjectIdentifier) -> Self {
        UnknownExtensionValidator { extn_id }
    }
}

impl ItemValidator for UnknownExtensionValidator {
    fn name(&self) -> &str {
        "signPolExtension"
    }

    fn check(&self) -> Result<()> {
        Err(Error::PolicyValidation(
            PolicyValidationStatus::UnknownSignPolExtension,
        ))
    }

    fn error_detail(&self) -> Option<String> {
        Some(format!("Unknown signature policy extension: {}", self.extn_id))
    }
}

/// Returns a collection with one validator per extension in `extensions` whose identifier is not listed in the
/// recognized signature policy extensions setting. Absent extensions yield an empty collection, which passes.
pub fn sign_pol_extension_validator<'a>(
    settings: &ConstraintSettings,
    name: &str,
    extensions: Option<&[SignPolExtn]>,
) -> CollectionValidator<'a> {
    let recognized = strings_to_oid_set(&settings.get_recognized_sign_pol_extensions());
    let mut collection = CollectionValidator::new(name);
    for extn in extensions.unwrap_or_default() {
        if !recognized.contains(&extn.extn_id) {
            warn!("Unrecognized signature policy extension {} in {}", extn.extn_id, name);
            collection.add(Box::new(UnknownExtensionValidator::new(extn.extn_id)));
        }
    }
    collection
}

#[test]
fn sign_pol_extension_test() {
    use alloc::string::ToString;
    use alloc::vec;
    use der::asn1::OctetString;

    let known = ObjectIdentifier::new_unwrap("1.2.3.4");
    let unknown = ObjectIdentifier::new_unwrap("1.2.3.5");
    let extensions = vec![
        SignPolExtn {
            extn_id: known,
            extn_value: OctetString::new(vec![0x05, 0x00]).unwrap(),
        },
        SignPolExtn {
            extn_id: unknown,
            extn_value: OctetString::new(vec![0x05, 0x00]).unwrap(),
        },
    ];

    let mut settings = ConstraintSettings::new();
    assert!(sign_pol_extension_validator(&settings, "signerRules", None).validate());

    let v = sign_pol_extension_validator(&settings, "signerRules", Some(&extensions));
    assert_eq!(2, v.len());
    assert!(!v.validate());

    settings.set_recognized_sign_pol_extensions(vec![known.to_string()]);
    let v = sign_pol_extension_validator(&settings, "signerRules", Some(&extensions));
    assert_eq!(1, v.len());
    let r = v.evaluate();
    assert_eq!(Some(PolicyValidationStatus::UnknownSignPolExtension), r.error);
    assert_eq!(
        Some(format!("signPolExtension: Unknown signature policy extension: {}", unknown)),
        r.detail
    );

    settings.set_recognized_sign_pol_extensions(vec![known.to_string(), unknown.to_string()]);
    assert!(sign_pol_extension_validator(&settings, "signerRules", Some(&extensions)).validate());
}

//! Checks the entries of a PDF signature dictionary against those mandated by a signature policy

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::util::error::*;
use crate::ItemValidator;

/// Name used when reporting the outcome of a PDF signature dictionary check
pub const PDF_ENTRIES_CONSTRAINT: &str = "signerRules.mandatedPdfSigDicEntries";

/// `PdfEntry` names a signature dictionary entry and, optionally, the value it must carry
#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub struct PdfEntry {
    /// Entry name, without the leading solidus, e.g., "Reason"
    pub name: String,
    /// Required value, absent when any value is acceptable
    pub value: Option<String>,
}

impl PdfEntry {
    /// Creates an entry that must be present with any value
    pub fn present(name: &str) -> Self {
        PdfEntry {
            name: name.to_string(),
            value: None,
        }
    }

    /// Creates an entry that must be present with the given value
    pub fn with_value(name: &str, value: &str) -> Self {
        PdfEntry {
            name: name.to_string(),
            value: Some(value.to_string()),
        }
    }
}

/// `PdfEntryValidator` requires every mandated entry to appear in the signature dictionary, carrying the mandated
/// value where one is given. Every mismatch is collected rather than stopping at the first.
pub struct PdfEntryValidator<'a> {
    mandated: &'a [PdfEntry],
    dictionary: Option<&'a BTreeMap<String, String>>,
}

impl<'a> PdfEntryValidator<'a> {
    /// Creates a validator. An absent dictionary satisfies only an empty list of mandated entries.
    pub fn new(mandated: &'a [PdfEntry], dictionary: Option<&'a BTreeMap<String, String>>) -> Self {
        PdfEntryValidator {
            mandated,
            dictionary,
        }
    }

    /// Returns the mandated entries that are absent or carry a different value
    pub fn invalid_entries(&self) -> Vec<&'a PdfEntry> {
        self.mandated
            .iter()
            .filter(|entry| {
                match self.dictionary.and_then(|d| d.get(&entry.name)) {
                    Some(actual) => match &entry.value {
                        Some(expected) => expected != actual,
                        None => false,
                    },
                    None => true,
                }
            })
            .collect()
    }
}

impl ItemValidator for PdfEntryValidator<'_> {
    fn name(&self) -> &str {
        PDF_ENTRIES_CONSTRAINT
    }

    fn check(&self) -> Result<()> {
        if self.invalid_entries().is_empty() {
            Ok(())
        } else {
            Err(Error::PolicyValidation(PolicyValidationStatus::PdfEntryMismatch))
        }
    }

    fn error_detail(&self) -> Option<String> {
        let invalid = self.invalid_entries();
        if invalid.is_empty() {
            return None;
        }
        let entries: Vec<String> = invalid
            .iter()
            .map(|e| match &e.value {
                Some(v) => format!("{}={}", e.name, v),
                None => e.name.clone(),
            })
            .collect();
        Some(format!("Invalid entries: [{}]", entries.join(", ")))
    }
}

#[test]
fn pdf_entry_test() {
    let mut dict = BTreeMap::new();
    dict.insert("Filter".to_string(), "Adobe.PPKLite".to_string());
    dict.insert("SubFilter".to_string(), "ETSI.CAdES.detached".to_string());
    dict.insert("Reason".to_string(), "Approval".to_string());

    let mandated = [
        PdfEntry::with_value("SubFilter", "ETSI.CAdES.detached"),
        PdfEntry::present("Reason"),
    ];
    assert!(PdfEntryValidator::new(&mandated, Some(&dict)).validate());

    let mandated = [
        PdfEntry::with_value("SubFilter", "adbe.pkcs7.detached"),
        PdfEntry::present("Reason"),
        PdfEntry::present("Location"),
    ];
    let v = PdfEntryValidator::new(&mandated, Some(&dict));
    assert!(!v.validate());
    let invalid = v.invalid_entries();
    assert_eq!(2, invalid.len());
    assert_eq!("SubFilter", invalid[0].name);
    assert_eq!("Location", invalid[1].name);
    assert_eq!(
        Some("Invalid entries: [SubFilter=adbe.pkcs7.detached, Location]".to_string()),
        v.error_detail()
    );
    assert_eq!(Some(PolicyValidationStatus::PdfEntryMismatch), v.evaluate().error);

    assert!(PdfEntryValidator::new(&[], None).validate());
    assert!(!PdfEntryValidator::new(&mandated[1..2], None).validate());
}

//! Common interface implemented by signature policy rule validators, along with a validator that aggregates
//! others

use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::util::error::*;
use crate::{ConstraintEvaluator, ConstraintLevel, ConstraintResult};

/// The [`ItemValidator`] trait is implemented by each check that compares a signature against a signature policy
/// rule. Implementations are stateless with respect to evaluation: calling [`ItemValidator::check`] repeatedly
/// yields the same outcome.
pub trait ItemValidator {
    /// Name used when reporting the outcome of the check
    fn name(&self) -> &str;

    /// Performs the check, returning [`Error::PolicyValidation`] when the rule is not satisfied
    fn check(&self) -> Result<()>;

    /// Describes why the check failed, if a more specific description than the error is available
    fn error_detail(&self) -> Option<String> {
        None
    }

    /// Returns true if the rule is satisfied
    fn validate(&self) -> bool {
        self.check().is_ok()
    }

    /// Performs the check and reports the outcome as a [`ConstraintResult`]
    fn evaluate(&self) -> ConstraintResult {
        let evaluator = ConstraintEvaluator::new(self.name(), ConstraintLevel::Fail);
        match self.check() {
            Ok(()) => ConstraintResult::ok(self.name()),
            Err(e) => {
                let status = match &e {
                    Error::PolicyValidation(pvs) => *pvs,
                    _ => PolicyValidationStatus::Misconfiguration,
                };
                let detail = self.error_detail().unwrap_or_else(|| e.to_string());
                evaluator.failure(status, &detail)
            }
        }
    }
}

/// `CollectionValidator` runs every child validator, without stopping at the first failure, and succeeds only if
/// all children succeed. An empty collection succeeds.
pub struct CollectionValidator<'a> {
    name: String,
    validators: Vec<Box<dyn ItemValidator + 'a>>,
}

impl<'a> CollectionValidator<'a> {
    /// Creates an empty collection
    pub fn new(name: &str) -> Self {
        CollectionValidator {
            name: name.to_string(),
            validators: Vec::new(),
        }
    }

    /// Adds a child validator
    pub fn add(&mut self, validator: Box<dyn ItemValidator + 'a>) {
        self.validators.push(validator);
    }

    /// Number of child validators
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Returns true if there are no child validators
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Evaluates every child and returns the results in the order the children were added
    pub fn results(&self) -> Vec<ConstraintResult> {
        self.validators.iter().map(|v| v.evaluate()).collect()
    }

    /// Returns the results of children that did not succeed
    pub fn failures(&self) -> Vec<ConstraintResult> {
        self.results().into_iter().filter(|r| !r.is_valid()).collect()
    }
}

/// Joins the names and details of failed results
fn summarize(failures: &[ConstraintResult]) -> Option<String> {
    if failures.is_empty() {
        return None;
    }
    let details: Vec<String> = failures
        .iter()
        .map(|r| match &r.detail {
            Some(d) => format!("{}: {}", r.name, d),
            None => r.name.clone(),
        })
        .collect();
    Some(details.join("; "))
}

impl ItemValidator for CollectionValidator<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> Result<()> {
        let mut first_error = None;
        for v in &self.validators {
            if let Err(e) = v.check() {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn error_detail(&self) -> Option<String> {
        summarize(&self.failures())
    }

    // children are evaluated once, with the status taken from the first failure
    fn evaluate(&self) -> ConstraintResult {
        let failures = self.failures();
        match (failures.first(), summarize(&failures)) {
            (Some(first), Some(detail)) => {
                let status = first
                    .error
                    .unwrap_or(PolicyValidationStatus::Misconfiguration);
                ConstraintEvaluator::new(self.name(), ConstraintLevel::Fail).failure(status, &detail)
            }
            _ => ConstraintResult::ok(self.name()),
        }
    }
}

#[cfg(test)]
struct Fixed(&'static str, Option<PolicyValidationStatus>);

#[cfg(test)]
impl ItemValidator for Fixed {
    fn name(&self) -> &str {
        self.0
    }
    fn check(&self) -> Result<()> {
        match self.1 {
            Some(s) => Err(Error::PolicyValidation(s)),
            None => Ok(()),
        }
    }
}

#[test]
fn collection_validator_test() {
    let mut c = CollectionValidator::new("rules");
    assert!(c.validate());
    assert!(c.error_detail().is_none());

    c.add(Box::new(Fixed("a", None)));
    c.add(Box::new(Fixed("b", Some(PolicyValidationStatus::ProhibitedAlg))));
    c.add(Box::new(Fixed("c", Some(PolicyValidationStatus::PdfEntryMismatch))));
    assert_eq!(3, c.len());
    assert!(!c.validate());
    assert_eq!(
        Err(Error::PolicyValidation(PolicyValidationStatus::ProhibitedAlg)),
        c.check()
    );
    let failures = c.failures();
    assert_eq!(2, failures.len());
    assert_eq!("b", failures[0].name);
    assert_eq!("c", failures[1].name);
    let detail = c.error_detail().unwrap();
    assert!(detail.contains("b: ") && detail.contains("c: "));
    assert_eq!(Some(PolicyValidationStatus::ProhibitedAlg), c.evaluate().error);
}

#[cfg(test)]
struct Counted<'a>(&'a core::cell::Cell<usize>);

#[cfg(test)]
impl ItemValidator for Counted<'_> {
    fn name(&self) -> &str {
        "counted"
    }
    fn check(&self) -> Result<()> {
        self.0.set(self.0.get() + 1);
        Err(Error::PolicyValidation(
            PolicyValidationStatus::ExternalDataMismatch,
        ))
    }
}

#[test]
fn collection_evaluates_children_once_test() {
    let calls = core::cell::Cell::new(0);
    let mut c = CollectionValidator::new("rules");
    c.add(Box::new(Counted(&calls)));
    c.add(Box::new(Fixed("b", Some(PolicyValidationStatus::ProhibitedAlg))));

    let r = c.evaluate();
    assert_eq!(1, calls.get());
    assert_eq!("rules", r.name);
    assert_eq!(Some(PolicyValidationStatus::ExternalDataMismatch), r.error);
    let detail = r.detail.unwrap();
    assert!(detail.starts_with("counted: ") && detail.contains("; b: "));

    let mut ok = CollectionValidator::new("rules");
    ok.add(Box::new(Fixed("a", None)));
    assert!(ok.evaluate().is_valid());
}

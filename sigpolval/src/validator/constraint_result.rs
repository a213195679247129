//! Structures used to report the outcome of evaluating a single constraint

use alloc::string::{String, ToString};
use core::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::util::error::{Error, PolicyValidationStatus, Result};

/// Outcome of evaluating a constraint
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ConstraintStatus {
    /// The constraint is satisfied
    Ok,
    /// The constraint is not satisfied and the failure is fatal
    NotOk,
    /// The constraint is not satisfied and the failure is reported as a warning
    Warning,
    /// The constraint is not satisfied and the failure is reported for information only
    Information,
    /// The constraint was not evaluated
    Ignored,
}

impl fmt::Display for ConstraintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintStatus::Ok => write!(f, "OK"),
            ConstraintStatus::NotOk => write!(f, "NOT_OK"),
            ConstraintStatus::Warning => write!(f, "WARNING"),
            ConstraintStatus::Information => write!(f, "INFORMATION"),
            ConstraintStatus::Ignored => write!(f, "IGNORED"),
        }
    }
}

/// Governs how the failure of a constraint is reported
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ConstraintLevel {
    /// Failure yields [`ConstraintStatus::NotOk`]
    #[default]
    Fail,
    /// Failure yields [`ConstraintStatus::Warning`]
    Warn,
    /// Failure yields [`ConstraintStatus::Information`]
    Inform,
    /// The constraint is not evaluated
    Ignore,
}

/// `ConstraintResult` conveys the status of a constraint evaluation along with the reason for and a
/// description of any failure.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConstraintResult {
    /// Name of the constraint that was evaluated
    pub name: String,
    /// Outcome of the evaluation
    pub status: ConstraintStatus,
    /// Reason for failure, if any
    pub error: Option<PolicyValidationStatus>,
    /// Diagnostic detail, if any
    pub detail: Option<String>,
}

impl ConstraintResult {
    /// Creates a result with [`ConstraintStatus::Ok`] status
    pub fn ok(name: &str) -> Self {
        ConstraintResult {
            name: name.to_string(),
            status: ConstraintStatus::Ok,
            error: None,
            detail: None,
        }
    }

    /// Creates a result with [`ConstraintStatus::NotOk`] status
    pub fn not_ok(name: &str, error: PolicyValidationStatus, detail: &str) -> Self {
        ConstraintResult {
            name: name.to_string(),
            status: ConstraintStatus::NotOk,
            error: Some(error),
            detail: Some(detail.to_string()),
        }
    }

    /// Returns true unless the status is [`ConstraintStatus::NotOk`]
    pub fn is_valid(&self) -> bool {
        self.status != ConstraintStatus::NotOk
    }

    /// Returns true if the status is [`ConstraintStatus::Ok`]
    pub fn is_ok(&self) -> bool {
        self.status == ConstraintStatus::Ok
    }
}

impl fmt::Display for ConstraintResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.status)?;
        if let Some(error) = &self.error {
            write!(f, " ({})", error)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, " - {}", detail)?;
        }
        Ok(())
    }
}

/// `ConstraintEvaluator` runs a named check and maps its outcome to a [`ConstraintResult`] according to the
/// configured [`ConstraintLevel`].
#[derive(Clone, Debug)]
pub struct ConstraintEvaluator {
    name: String,
    level: ConstraintLevel,
}

impl ConstraintEvaluator {
    /// Creates an evaluator for the named constraint that fails at the given level
    pub fn new(name: &str, level: ConstraintLevel) -> Self {
        ConstraintEvaluator {
            name: name.to_string(),
            level,
        }
    }

    /// Name of the constraint
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the check and reports the outcome. The check signals failure by returning
    /// [`Error::PolicyValidation`]. Other errors are reported as [`PolicyValidationStatus::Misconfiguration`].
    pub fn evaluate<F>(&self, check: F) -> ConstraintResult
    where
        F: FnOnce() -> Result<()>,
    {
        if self.level == ConstraintLevel::Ignore {
            debug!("Skipping ignored constraint {}", self.name);
            return ConstraintResult {
                name: self.name.clone(),
                status: ConstraintStatus::Ignored,
                error: None,
                detail: None,
            };
        }

        match check() {
            Ok(()) => ConstraintResult::ok(&self.name),
            Err(e) => {
                let error = match &e {
                    Error::PolicyValidation(pvs) => *pvs,
                    _ => PolicyValidationStatus::Misconfiguration,
                };
                self.failure(error, &e.to_string())
            }
        }
    }

    /// Produces a failed result for the configured level
    pub fn failure(&self, error: PolicyValidationStatus, detail: &str) -> ConstraintResult {
        let status = match self.level {
            ConstraintLevel::Fail => ConstraintStatus::NotOk,
            ConstraintLevel::Warn => ConstraintStatus::Warning,
            ConstraintLevel::Inform => ConstraintStatus::Information,
            ConstraintLevel::Ignore => ConstraintStatus::Ignored,
        };
        match status {
            ConstraintStatus::NotOk | ConstraintStatus::Warning => {
                warn!("Constraint {} failed: {}", self.name, detail)
            }
            _ => info!("Constraint {} failed: {}", self.name, detail),
        }
        ConstraintResult {
            name: self.name.clone(),
            status,
            error: Some(error),
            detail: Some(detail.to_string()),
        }
    }
}

#[test]
fn evaluator_levels_test() {
    let failing = || -> Result<()> {
        Err(Error::PolicyValidation(
            PolicyValidationStatus::InvalidPathLength,
        ))
    };

    let r = ConstraintEvaluator::new("pathLength", ConstraintLevel::Fail).evaluate(failing);
    assert_eq!(ConstraintStatus::NotOk, r.status);
    assert_eq!(Some(PolicyValidationStatus::InvalidPathLength), r.error);
    assert!(!r.is_valid());

    let r = ConstraintEvaluator::new("pathLength", ConstraintLevel::Warn).evaluate(failing);
    assert_eq!(ConstraintStatus::Warning, r.status);
    assert!(r.is_valid());

    let r = ConstraintEvaluator::new("pathLength", ConstraintLevel::Inform).evaluate(failing);
    assert_eq!(ConstraintStatus::Information, r.status);

    let r = ConstraintEvaluator::new("pathLength", ConstraintLevel::Ignore).evaluate(failing);
    assert_eq!(ConstraintStatus::Ignored, r.status);
    assert_eq!(None, r.error);

    let r = ConstraintEvaluator::new("pathLength", ConstraintLevel::Fail).evaluate(|| Ok(()));
    assert!(r.is_ok());

    let r = ConstraintEvaluator::new("parse", ConstraintLevel::Fail)
        .evaluate(|| Err(Error::ParseError));
    assert_eq!(Some(PolicyValidationStatus::Misconfiguration), r.error);
    assert_eq!("parse: NOT_OK (Misconfiguration) - ParseError", r.to_string());
}

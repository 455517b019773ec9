//! Definitions of errors that can occur while validating and running a deployment

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::spec::OutputField;

// -------------------
// | SPEC VALIDATION |
// -------------------

/// A structural problem with a deployment spec, detected before any ledger interaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpecViolation {
    /// Two steps share the same id
    DuplicateId {
        /// The repeated id
        id: String,
        /// The position of the first step carrying the id
        first: usize,
        /// The position of the repeated step
        duplicate: usize,
    },
    /// A step references an id that no step in the spec carries
    UnknownReference {
        /// The referencing step
        step: String,
        /// The id it references
        target: String,
    },
    /// A step references itself or a step that appears after it
    ForwardReference {
        /// The referencing step
        step: String,
        /// The id it references
        target: String,
    },
}

impl Display for SpecViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SpecViolation::DuplicateId {
                id,
                first,
                duplicate,
            } => write!(
                f,
                "step id `{id}` at position {duplicate} duplicates the step at position {first}"
            ),
            SpecViolation::UnknownReference { step, target } => {
                write!(f, "step `{step}` references unknown step `{target}`")
            }
            SpecViolation::ForwardReference { step, target } => write!(
                f,
                "step `{step}` references `{target}`, which does not appear before it"
            ),
        }
    }
}

/// Errors that abort a run before any step executes
#[derive(Debug)]
pub enum OrchestratorError {
    /// The spec failed validation; every violation found is listed
    InvalidSpec(Vec<SpecViolation>),
}

impl Display for OrchestratorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorError::InvalidSpec(violations) => {
                write!(f, "invalid spec: {}", violations.iter().join("; "))
            }
        }
    }
}

impl Error for OrchestratorError {}

// -----------------------
// | ARGUMENT RESOLUTION |
// -----------------------

/// Errors resolving a step's declared arguments against prior results
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// No result exists for the referenced step
    UnresolvedDependency(String),
    /// The referenced step failed
    DependencyFailed(String),
    /// The referenced step has no value for the requested field
    MissingField {
        /// The referenced step
        step: String,
        /// The requested field
        field: OutputField,
    },
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::UnresolvedDependency(step) => {
                write!(f, "no result for referenced step `{step}`")
            }
            ResolveError::DependencyFailed(step) => {
                write!(f, "referenced step `{step}` failed")
            }
            ResolveError::MissingField { step, field } => {
                write!(f, "referenced step `{step}` has no {field}")
            }
        }
    }
}

impl Error for ResolveError {}

// ----------
// | LEDGER |
// ----------

/// Errors reported by a [`LedgerClient`](crate::ledger::LedgerClient)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerError {
    /// The ledger rejected the creation transaction before inclusion
    Submission(String),
    /// The transaction was included but reverted
    Reverted,
    /// The transaction was dropped without being included
    Dropped,
    /// No definitive outcome was observed before the timeout
    Timeout,
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Submission(s) => write!(f, "error submitting transaction: {s}"),
            LedgerError::Reverted => write!(f, "transaction reverted"),
            LedgerError::Dropped => write!(f, "transaction dropped"),
            LedgerError::Timeout => write!(f, "timed out awaiting confirmation"),
        }
    }
}

impl Error for LedgerError {}

// --------
// | STEP |
// --------

/// The reason a step did not reach `Confirmed`, stored on its result
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum StepError {
    /// A referenced step had no result
    UnresolvedDependency {
        /// The referenced step
        step: String,
    },
    /// A referenced step did not confirm
    DependencyFailed {
        /// The referenced step
        step: String,
    },
    /// A referenced step had no value for the requested field
    MissingField {
        /// The referenced step
        step: String,
        /// The requested field
        field: OutputField,
    },
    /// The ledger rejected the transaction before inclusion
    SubmissionError(String),
    /// The transaction was included but reverted
    TransactionReverted,
    /// The transaction was dropped without being included
    TransactionDropped,
    /// No confirmation was observed within the configured timeout
    ConfirmationTimeout,
    /// The run was cancelled externally
    Cancelled,
}

impl Display for StepError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StepError::UnresolvedDependency { step } => {
                write!(f, "unresolved dependency on `{step}`")
            }
            StepError::DependencyFailed { step } => write!(f, "dependency `{step}` failed"),
            StepError::MissingField { step, field } => {
                write!(f, "dependency `{step}` has no {field}")
            }
            StepError::SubmissionError(s) => write!(f, "submission error: {s}"),
            StepError::TransactionReverted => write!(f, "transaction reverted"),
            StepError::TransactionDropped => write!(f, "transaction dropped"),
            StepError::ConfirmationTimeout => write!(f, "confirmation timed out"),
            StepError::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl Error for StepError {}

impl From<ResolveError> for StepError {
    fn from(value: ResolveError) -> Self {
        match value {
            ResolveError::UnresolvedDependency(step) => StepError::UnresolvedDependency { step },
            ResolveError::DependencyFailed(step) => StepError::DependencyFailed { step },
            ResolveError::MissingField { step, field } => StepError::MissingField { step, field },
        }
    }
}

impl From<LedgerError> for StepError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::Submission(s) => StepError::SubmissionError(s),
            LedgerError::Reverted => StepError::TransactionReverted,
            LedgerError::Dropped => StepError::TransactionDropped,
            LedgerError::Timeout => StepError::ConfirmationTimeout,
        }
    }
}

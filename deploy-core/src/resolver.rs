//! Substitution of step references with the outputs of earlier steps

use std::fmt::{self, Display, Formatter};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{
    errors::ResolveError,
    record::{StepResult, StepStatus},
    spec::{Argument, OutputField},
};

/// A constructor argument with every reference replaced by a concrete value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ResolvedArgument {
    /// A literal passed through from the spec
    Literal(String),
    /// The address produced by an earlier step
    Address(Address),
}

impl Display for ResolvedArgument {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedArgument::Literal(s) => write!(f, "{s}"),
            ResolvedArgument::Address(address) => write!(f, "{address:#x}"),
        }
    }
}

/// Resolve a step's declared arguments against the results of earlier steps.
///
/// Pure: the same arguments and prior results always produce the same output.
pub fn resolve(
    args: &[Argument],
    prior_results: &[StepResult],
) -> Result<Vec<ResolvedArgument>, ResolveError> {
    args.iter()
        .map(|arg| match arg {
            Argument::Literal(value) => Ok(ResolvedArgument::Literal(value.clone())),
            Argument::Reference { step, field } => resolve_reference(step, *field, prior_results),
        })
        .collect()
}

/// Look up a single referenced output
fn resolve_reference(
    step: &str,
    field: OutputField,
    prior_results: &[StepResult],
) -> Result<ResolvedArgument, ResolveError> {
    let result = prior_results
        .iter()
        .find(|r| r.step_id() == step)
        .ok_or_else(|| ResolveError::UnresolvedDependency(step.to_string()))?;

    if result.status() == StepStatus::Failed {
        return Err(ResolveError::DependencyFailed(step.to_string()));
    }

    match field {
        OutputField::Address => result
            .address()
            .map(ResolvedArgument::Address)
            .ok_or_else(|| ResolveError::MissingField {
                step: step.to_string(),
                field,
            }),
    }
}

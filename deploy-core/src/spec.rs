//! The declarative description of a deployment: an ordered list of
//! contract-creation steps whose constructor arguments may reference the
//! outputs of earlier steps

use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
};

use serde::{Deserialize, Serialize};

use crate::{errors::SpecViolation, record::DeploymentRecord};

/// An output of a completed step that later arguments may reference
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputField {
    /// The address of the created contract
    #[default]
    Address,
}

impl Display for OutputField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OutputField::Address => write!(f, "address"),
        }
    }
}

/// A declared constructor argument
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawArgument", into = "RawArgument")]
pub enum Argument {
    /// A value passed through unchanged, in its textual form
    Literal(String),
    /// A placeholder for an output of an earlier step
    Reference {
        /// The id of the referenced step
        step: String,
        /// The referenced output
        field: OutputField,
    },
}

impl Argument {
    /// A literal argument
    pub fn literal(value: impl Into<String>) -> Self {
        Argument::Literal(value.into())
    }

    /// A reference to the address created by the given step
    pub fn address_of(step: impl Into<String>) -> Self {
        Argument::Reference {
            step: step.into(),
            field: OutputField::Address,
        }
    }

    /// The id of the referenced step, if this is a reference
    pub fn referenced_step(&self) -> Option<&str> {
        match self {
            Argument::Literal(_) => None,
            Argument::Reference { step, .. } => Some(step),
        }
    }
}

/// The on-disk shape of an argument.
///
/// Numbers and booleans are accepted for convenience and carried as text. Only
/// numbers that fit a 64-bit integer are taken unquoted, since anything wider
/// is parsed as a float and would lose digits.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawArgument {
    /// `{"ref": "<step id>", "field": "address"}`
    Reference {
        /// The id of the referenced step
        #[serde(rename = "ref")]
        step: String,
        /// The referenced output
        #[serde(default)]
        field: OutputField,
    },
    /// A string literal
    Text(String),
    /// A numeric literal
    Number(serde_json::Number),
    /// A boolean literal
    Bool(bool),
}

impl TryFrom<RawArgument> for Argument {
    type Error = String;

    fn try_from(value: RawArgument) -> Result<Self, Self::Error> {
        match value {
            RawArgument::Reference { step, field } => Ok(Argument::Reference { step, field }),
            RawArgument::Text(s) => Ok(Argument::Literal(s)),
            RawArgument::Number(n) => exact_integer(&n).map(Argument::Literal).ok_or_else(|| {
                format!("number {n} cannot be represented exactly, quote it as a string")
            }),
            RawArgument::Bool(b) => Ok(Argument::Literal(b.to_string())),
        }
    }
}

/// The decimal text of a number that was parsed as an exact integer
fn exact_integer(n: &serde_json::Number) -> Option<String> {
    n.as_u64()
        .map(|v| v.to_string())
        .or_else(|| n.as_i64().map(|v| v.to_string()))
}

impl From<Argument> for RawArgument {
    fn from(value: Argument) -> Self {
        match value {
            Argument::Literal(s) => RawArgument::Text(s),
            Argument::Reference { step, field } => RawArgument::Reference { step, field },
        }
    }
}

/// One contract-creation unit of work
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// The id of the step, unique within its spec
    id: String,
    /// The name of the contract to create
    contract: String,
    /// An optional human-readable label used in reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    /// The declared constructor arguments
    #[serde(default)]
    args: Vec<Argument>,
}

impl Step {
    /// Create a step deploying `contract` with the given arguments
    pub fn new(id: impl Into<String>, contract: impl Into<String>, args: Vec<Argument>) -> Self {
        Self {
            id: id.into(),
            contract: contract.into(),
            label: None,
            args,
        }
    }

    /// Attach a human-readable label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The step id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The name of the contract this step creates
    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// The label used when reporting on this step, defaulting to its id
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    /// The declared constructor arguments
    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    /// The ids of the steps this step references, in argument order
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.args.iter().filter_map(Argument::referenced_step)
    }
}

/// An ordered sequence of deployment steps
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    /// The steps, in execution order
    steps: Vec<Step>,
}

impl DeploymentSpec {
    /// Create a spec from steps in execution order
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Parse a spec from its JSON form
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The steps, in execution order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the spec has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Check that step ids are unique and that every reference points at a
    /// step strictly earlier in the sequence.
    ///
    /// All violations are collected rather than stopping at the first.
    pub fn validate(&self) -> Result<(), Vec<SpecViolation>> {
        let mut first_positions: HashMap<&str, usize> = HashMap::new();
        for (index, step) in self.steps.iter().enumerate() {
            first_positions.entry(step.id()).or_insert(index);
        }

        let mut violations = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            let first = first_positions[step.id()];
            if first != index {
                violations.push(SpecViolation::DuplicateId {
                    id: step.id().to_string(),
                    first,
                    duplicate: index,
                });
            }

            for target in step.dependencies() {
                match first_positions.get(target) {
                    None => violations.push(SpecViolation::UnknownReference {
                        step: step.id().to_string(),
                        target: target.to_string(),
                    }),
                    Some(&position) if position >= index => {
                        violations.push(SpecViolation::ForwardReference {
                            step: step.id().to_string(),
                            target: target.to_string(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// The spec trimmed to the steps that did not confirm in `record`.
    ///
    /// References to steps that confirmed are replaced by their address as a
    /// literal, so the trimmed spec validates on its own.
    pub fn remaining_after(&self, record: &DeploymentRecord) -> DeploymentSpec {
        let confirmed: HashMap<&str, String> = record
            .steps()
            .iter()
            .filter_map(|r| Some((r.step_id(), format!("{:#x}", r.confirmed_address()?))))
            .collect();

        let steps = self
            .steps
            .iter()
            .filter(|step| !confirmed.contains_key(step.id()))
            .map(|step| {
                let args = step
                    .args
                    .iter()
                    .map(|arg| {
                        arg.referenced_step()
                            .and_then(|target| confirmed.get(target))
                            .map(|address| Argument::Literal(address.clone()))
                            .unwrap_or_else(|| arg.clone())
                    })
                    .collect();

                Step {
                    args,
                    ..step.clone()
                }
            })
            .collect();

        DeploymentSpec { steps }
    }
}

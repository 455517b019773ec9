//! Definitions of errors that can occur during the execution of the deploy scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug)]
pub enum ScriptError {
    /// Error reading a spec, record, config, or deployments file
    ReadFile(String),
    /// Error writing a record or deployments file
    WriteFile(String),
    /// Error resolving the network configuration
    Config(String),
    /// Error parsing a compiled contract artifact
    ArtifactParsing(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error encoding constructor arguments
    CalldataConstruction(String),
    /// The deployment spec failed validation
    InvalidSpec(String),
    /// Error de/serializing JSON
    Serde(String),
    /// The run finished with failed or cancelled steps
    DeploymentFailed(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::ReadFile(s) => write!(f, "error reading file: {}", s),
            ScriptError::WriteFile(s) => write!(f, "error writing file: {}", s),
            ScriptError::Config(s) => write!(f, "invalid configuration: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::InvalidSpec(s) => write!(f, "invalid deployment spec: {}", s),
            ScriptError::Serde(s) => write!(f, "error de/serializing JSON: {}", s),
            ScriptError::DeploymentFailed(s) => write!(f, "deployment failed: {}", s),
        }
    }
}

impl Error for ScriptError {}

//! Lookup of compiled contract artifacts and encoding of their creation code

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier},
    json_abi::{JsonAbi, Param},
    primitives::Bytes,
};
use deploy_core::resolver::ResolvedArgument;
use serde::Deserialize;
use tracing::debug;

use crate::{constants::ARTIFACT_EXTENSION, errors::ScriptError};

/// A directory of compiled contract artifacts, searched recursively by contract name
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    /// The directory the search starts from
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ArtifactStore { root: root.into() }
    }

    /// Find and parse the artifact for `contract`
    pub fn load(&self, contract: &str) -> Result<ContractArtifact, ScriptError> {
        let file_name = format!("{contract}.{ARTIFACT_EXTENSION}");
        let path = find_file(&self.root, &file_name)
            .map_err(|e| ScriptError::ReadFile(format!("{}: {e}", self.root.display())))?
            .ok_or_else(|| {
                ScriptError::ArtifactParsing(format!(
                    "no artifact for `{contract}` under {}",
                    self.root.display()
                ))
            })?;

        debug!(contract, path = %path.display(), "loading artifact");
        let contents =
            fs::read_to_string(&path).map_err(|e| ScriptError::ReadFile(e.to_string()))?;

        ContractArtifact::from_json(&contents)
    }
}

/// Depth-first search for a file named exactly `file_name`.
///
/// Hardhat's `<Name>.dbg.json` companions never match since the full name is compared.
fn find_file(dir: &Path, file_name: &str) -> io::Result<Option<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            if let Some(found) = find_file(&path, file_name)? {
                return Ok(Some(found));
            }
        } else if path.file_name().is_some_and(|name| name == file_name) {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

/// The creation bytecode as laid out by either hardhat or foundry
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ArtifactBytecode {
    /// Hardhat: `"bytecode": "0x..."`
    Hex(Bytes),
    /// Foundry: `"bytecode": { "object": "0x..." }`
    Object {
        /// The hex-encoded creation code
        object: Bytes,
    },
}

/// A compiled contract's ABI and creation bytecode
#[derive(Debug, Clone, Deserialize)]
pub struct ContractArtifact {
    /// The contract's ABI
    pub abi: JsonAbi,
    /// The contract's creation bytecode
    bytecode: ArtifactBytecode,
}

impl ContractArtifact {
    /// Parse an artifact from its JSON form
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        serde_json::from_str(json).map_err(|e| ScriptError::ArtifactParsing(e.to_string()))
    }

    /// The contract's creation bytecode, without constructor arguments
    pub fn bytecode(&self) -> &Bytes {
        match &self.bytecode {
            ArtifactBytecode::Hex(bytes) | ArtifactBytecode::Object { object: bytes } => bytes,
        }
    }

    /// The creation bytecode with the ABI-encoded constructor arguments appended
    pub fn deploy_code(&self, args: &[ResolvedArgument]) -> Result<Bytes, ScriptError> {
        let bytecode = self.bytecode();
        if bytecode.is_empty() {
            return Err(ScriptError::ArtifactParsing(
                "artifact has no creation bytecode".to_string(),
            ));
        }

        let Some(constructor) = self.abi.constructor() else {
            return match args.len() {
                0 => Ok(bytecode.clone()),
                n => Err(ScriptError::CalldataConstruction(format!(
                    "contract has no constructor but {n} arguments were given"
                ))),
            };
        };

        if constructor.inputs.len() != args.len() {
            return Err(ScriptError::CalldataConstruction(format!(
                "constructor takes {} arguments, {} given",
                constructor.inputs.len(),
                args.len()
            )));
        }

        let values = constructor
            .inputs
            .iter()
            .zip(args)
            .map(|(param, arg)| coerce_argument(param, arg))
            .collect::<Result<Vec<_>, _>>()?;

        let encoded = constructor
            .abi_encode_input(&values)
            .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;

        Ok([&bytecode[..], encoded.as_slice()].concat().into())
    }
}

/// Convert a resolved argument into a value of the parameter's Solidity type
fn coerce_argument(param: &Param, arg: &ResolvedArgument) -> Result<DynSolValue, ScriptError> {
    let ty: DynSolType = param
        .resolve()
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;

    match (&ty, arg) {
        (DynSolType::Address, ResolvedArgument::Address(address)) => {
            Ok(DynSolValue::Address(*address))
        }
        (DynSolType::String, ResolvedArgument::Literal(text)) => {
            Ok(DynSolValue::String(text.clone()))
        }
        _ => ty.coerce_str(&arg.to_string()).map_err(|e| {
            ScriptError::CalldataConstruction(format!(
                "argument `{}` for parameter `{}` ({}): {e}",
                arg, param.name, param.ty
            ))
        }),
    }
}

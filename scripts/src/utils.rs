//! Utilities for the deploy scripts.

use std::{fs, path::Path, str::FromStr};

use alloy::{
    network::EthereumWallet,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use deploy_core::{record::DeploymentRecord, spec::DeploymentSpec};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::info;

use crate::{constants::DEPLOYMENTS_KEY, errors::ScriptError};

/// Sets up a signing client for the deployer's private key against the given RPC URL
pub async fn setup_client(priv_key: &str, rpc_url: &str) -> Result<DynProvider, ScriptError> {
    let signer = PrivateKeySigner::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let deployer = signer.address();

    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .on_http(url);

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    info!(chain_id, deployer = %deployer, "connected to {rpc_url}");

    Ok(DynProvider::new(provider))
}

/// Read and deserialize a JSON file
pub fn read_json<T: DeserializeOwned>(file_path: &Path) -> Result<T, ScriptError> {
    let contents = fs::read_to_string(file_path)
        .map_err(|e| ScriptError::ReadFile(format!("{}: {e}", file_path.display())))?;

    serde_json::from_str(&contents).map_err(|e| ScriptError::Serde(e.to_string()))
}

/// Read a deployment spec from a JSON file
pub fn read_spec(file_path: &Path) -> Result<DeploymentSpec, ScriptError> {
    read_json(file_path)
}

/// Read a previously written deployment record
pub fn read_record(file_path: &Path) -> Result<DeploymentRecord, ScriptError> {
    read_json(file_path)
}

/// Write the full deployment record as pretty-printed JSON
pub fn write_record(file_path: &Path, record: &DeploymentRecord) -> Result<(), ScriptError> {
    let json =
        serde_json::to_string_pretty(record).map_err(|e| ScriptError::Serde(e.to_string()))?;
    fs::write(file_path, json).map_err(|e| ScriptError::WriteFile(e.to_string()))
}

/// Write the record's rows as newline-delimited JSON
pub fn write_rows(file_path: &Path, record: &DeploymentRecord) -> Result<(), ScriptError> {
    let ndjson = record
        .to_ndjson()
        .map_err(|e| ScriptError::Serde(e.to_string()))?;
    fs::write(file_path, ndjson).map_err(|e| ScriptError::WriteFile(e.to_string()))
}

/// Merge the addresses of confirmed steps into a deployments file, keyed by step id.
///
/// The file is created if absent. Keys already present and not redeployed are kept.
pub fn write_deployed_addresses(
    file_path: &Path,
    record: &DeploymentRecord,
) -> Result<(), ScriptError> {
    let mut parsed_json = if file_path.exists() {
        read_json(file_path)?
    } else {
        Value::Object(Map::new())
    };

    let root = parsed_json.as_object_mut().ok_or_else(|| {
        ScriptError::ReadFile("deployments file is not a JSON object".to_string())
    })?;
    let deployments = root
        .entry(DEPLOYMENTS_KEY)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| {
            ScriptError::ReadFile(format!("`{DEPLOYMENTS_KEY}` is not a JSON object"))
        })?;

    for result in record.steps() {
        if let Some(address) = result.confirmed_address() {
            deployments.insert(
                result.step_id().to_string(),
                Value::String(format!("{address:#x}")),
            );
        }
    }

    let json = serde_json::to_string_pretty(&parsed_json)
        .map_err(|e| ScriptError::Serde(e.to_string()))?;
    fs::write(file_path, json).map_err(|e| ScriptError::WriteFile(e.to_string()))
}

//! Network configuration for the deploy scripts.
//!
//! A value given on the command line wins over the environment, which wins over
//! the config file, which wins over the built-in networks. Clap folds the
//! environment into [`LedgerOverrides`], so resolution here only layers the
//! overrides over the file.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use deploy_core::constants::DEFAULT_CONFIRMATION_TIMEOUT;
use serde::Deserialize;

use crate::{
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_NETWORK, DEFAULT_POLL_INTERVAL_MS, GOERLI_NETWORK,
        GOERLI_RPC_URL, HARDHAT_RPC_URL,
    },
    errors::ScriptError,
};

/// The contents of a deployment config file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
    /// The network used when none is named on the command line
    #[serde(default = "default_network")]
    pub default_network: String,
    /// The configured networks, keyed by name
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
    /// Filesystem locations
    #[serde(default)]
    pub paths: PathsConfig,
}

/// The configuration of a single network
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    /// The network's RPC URL
    pub url: String,
    /// How long to wait for each deployment to confirm
    #[serde(default)]
    pub confirmation_timeout_secs: Option<u64>,
    /// How often to poll for a pending transaction's receipt
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
}

/// Filesystem locations used by the deploy scripts
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// The directory holding compiled contract artifacts
    #[serde(default = "default_artifacts_dir")]
    pub artifacts: PathBuf,
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct LedgerOverrides {
    /// The network to deploy to
    pub network: Option<String>,
    /// An RPC URL replacing the network's configured one
    pub rpc_url: Option<String>,
    /// The deployer's private key
    pub private_key: Option<String>,
}

/// The fully-resolved configuration a ledger is constructed from
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// The name of the network being deployed to
    pub network: String,
    /// The RPC URL to send transactions to
    pub rpc_url: String,
    /// The deployer's private key
    pub private_key: String,
    /// How often to poll for a pending transaction's receipt
    pub poll_interval: Duration,
    /// How long to wait for each deployment to confirm
    pub confirmation_timeout: Duration,
    /// The directory holding compiled contract artifacts
    pub artifacts_dir: PathBuf,
}

impl NetworkConfig {
    /// A network with the given URL and default timings
    fn with_url(url: &str) -> Self {
        NetworkConfig {
            url: url.to_string(),
            confirmation_timeout_secs: None,
            poll_interval_ms: None,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            artifacts: default_artifacts_dir(),
        }
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        DeployConfig {
            default_network: default_network(),
            networks: builtin_networks(),
            paths: PathsConfig::default(),
        }
    }
}

impl DeployConfig {
    /// Load the config file at `path`, or the built-in config if none is given
    pub fn load(path: Option<&Path>) -> Result<Self, ScriptError> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                let contents =
                    fs::read_to_string(path).map_err(|e| ScriptError::ReadFile(e.to_string()))?;
                Self::from_json(&contents)
            }
        }
    }

    /// Parse a config from JSON. Networks the file does not name fall back to the built-ins.
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        let mut config: DeployConfig =
            serde_json::from_str(json).map_err(|e| ScriptError::Config(e.to_string()))?;

        for (name, network) in builtin_networks() {
            config.networks.entry(name).or_insert(network);
        }

        Ok(config)
    }

    /// Resolve the ledger configuration, layering `overrides` over this config
    pub fn resolve(&self, overrides: &LedgerOverrides) -> Result<LedgerConfig, ScriptError> {
        let name = overrides
            .network
            .as_deref()
            .unwrap_or(&self.default_network);

        let network = self
            .networks
            .get(name)
            .ok_or_else(|| ScriptError::Config(format!("unknown network `{name}`")))?;

        let private_key = overrides.private_key.clone().ok_or_else(|| {
            ScriptError::Config("no deployer key, pass --pkey or set PRIVATE_KEY".to_string())
        })?;

        let rpc_url = overrides
            .rpc_url
            .clone()
            .unwrap_or_else(|| network.url.clone());

        let poll_interval =
            Duration::from_millis(network.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS));

        let confirmation_timeout = network
            .confirmation_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT);

        Ok(LedgerConfig {
            network: name.to_string(),
            rpc_url,
            private_key,
            poll_interval,
            confirmation_timeout,
            artifacts_dir: self.paths.artifacts.clone(),
        })
    }
}

/// The name of the default network
fn default_network() -> String {
    DEFAULT_NETWORK.to_string()
}

/// The default artifacts directory
fn default_artifacts_dir() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACTS_DIR)
}

/// The networks available without a config file
fn builtin_networks() -> BTreeMap<String, NetworkConfig> {
    BTreeMap::from([
        (
            DEFAULT_NETWORK.to_string(),
            NetworkConfig::with_url(HARDHAT_RPC_URL),
        ),
        (
            GOERLI_NETWORK.to_string(),
            NetworkConfig::with_url(GOERLI_RPC_URL),
        ),
    ])
}

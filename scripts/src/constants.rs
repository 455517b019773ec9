//! Constants used in the deploy scripts

/// The network used when neither the CLI nor the config file names one
pub const DEFAULT_NETWORK: &str = "hardhat";

/// The RPC URL of a local development node
pub const HARDHAT_RPC_URL: &str = "http://127.0.0.1:8545";

/// The name of the built-in Goerli network
pub const GOERLI_NETWORK: &str = "goerli";

/// The public Goerli RPC URL
pub const GOERLI_RPC_URL: &str = "https://rpc.ankr.com/eth_goerli/";

/// The directory compiled contract artifacts are read from by default
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The extension of a compiled contract artifact
pub const ARTIFACT_EXTENSION: &str = "json";

/// How often a pending transaction's receipt is polled, in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// The deployments key in the `deployments.json` file
pub const DEPLOYMENTS_KEY: &str = "deployments";

/// How many consecutive polls a transaction may be unknown to the node before
/// it is reported dropped. Load-balanced RPCs can answer from a backend that
/// has not yet seen a just-sent transaction.
pub const DROPPED_AFTER_UNKNOWN_POLLS: u32 = 10;

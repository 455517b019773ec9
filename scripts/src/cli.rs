//! Definitions of CLI arguments and commands for the deploy scripts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use deploy_core::orchestrator::ContinuationPolicy;
use tracing::Level;

use crate::{
    commands::{deploy, validate},
    config::{DeployConfig, LedgerOverrides},
    errors::ScriptError,
};

/// Deploy a sequence of dependent contracts
#[derive(Parser)]
#[command(version)]
pub struct Cli {
    /// Path to a JSON config file describing networks and artifact paths
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Name of the network to deploy to
    #[arg(short, long, global = true)]
    pub network: Option<String>,

    /// Network RPC URL, replacing the selected network's URL
    #[arg(short, long, env = "RPC_URL", global = true)]
    pub rpc_url: Option<String>,

    /// Private key of the deployer
    #[arg(long = "pkey", env = "PRIVATE_KEY", hide_env_values = true, global = true)]
    pub priv_key: Option<String>,

    /// Maximum level of log output
    #[arg(short, long, default_value_t = Level::INFO, global = true)]
    pub verbosity: Level,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The deploy script commands
#[derive(Subcommand)]
pub enum Command {
    /// Deploy every step of a deployment spec, in order
    Deploy(DeployArgs),
    /// Check a deployment spec without contacting any network
    Validate(ValidateArgs),
}

impl Command {
    /// Run the command against the resolved configuration
    pub async fn run(
        self,
        config: DeployConfig,
        overrides: LedgerOverrides,
    ) -> Result<(), ScriptError> {
        match self {
            Command::Deploy(args) => deploy(args, &config, &overrides).await,
            Command::Validate(args) => validate(args),
        }
    }
}

/// Deploy every step of a deployment spec, in order
#[derive(Args)]
pub struct DeployArgs {
    /// Path to the JSON deployment spec
    #[arg(short, long)]
    pub spec: PathBuf,

    /// What to do with the remaining steps after a step fails
    #[arg(short, long, value_enum, default_value_t = FailurePolicy::Halt)]
    pub policy: FailurePolicy,

    /// Seconds to wait for each deployment to confirm,
    /// replacing the network's configured timeout
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Path to write the full deployment record to, as JSON
    #[arg(long)]
    pub record: Option<PathBuf>,

    /// Path to write one JSON row per step to
    #[arg(long)]
    pub rows: Option<PathBuf>,

    /// Path to the deployments file to merge confirmed addresses into
    #[arg(short, long)]
    pub deployments: Option<PathBuf>,

    /// Path to an earlier deployment record. Steps it confirmed are not redeployed.
    #[arg(long)]
    pub resume: Option<PathBuf>,
}

/// Check a deployment spec without contacting any network
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the JSON deployment spec
    #[arg(short, long)]
    pub spec: PathBuf,
}

/// The CLI spelling of a [`ContinuationPolicy`]
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Skip every step after the first failure
    Halt,
    /// Keep deploying steps that do not depend on a failed step
    Continue,
}

impl From<FailurePolicy> for ContinuationPolicy {
    fn from(policy: FailurePolicy) -> Self {
        match policy {
            FailurePolicy::Halt => ContinuationPolicy::HaltOnFailure,
            FailurePolicy::Continue => ContinuationPolicy::ContinueIndependent,
        }
    }
}

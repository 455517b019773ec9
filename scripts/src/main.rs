use clap::Parser;
use deploy_scripts::{
    cli::Cli,
    config::{DeployConfig, LedgerOverrides},
    errors::ScriptError,
};

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let Cli {
        config,
        network,
        rpc_url,
        priv_key,
        verbosity,
        command,
    } = Cli::parse();

    tracing_subscriber::fmt()
        .pretty()
        .with_max_level(verbosity)
        .init();

    let config = DeployConfig::load(config.as_deref())?;
    let overrides = LedgerOverrides {
        network,
        rpc_url,
        private_key: priv_key,
    };

    command.run(config, overrides).await
}

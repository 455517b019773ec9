//! Implementations of the deploy script commands

use std::time::Duration;

use deploy_core::{
    cancel::cancel_pair,
    orchestrator::{Orchestrator, RunOptions},
    record::{DeploymentRecord, StepStatus},
    spec::DeploymentSpec,
};
use tracing::{error, info, warn};

use crate::{
    cli::{DeployArgs, ValidateArgs},
    config::{DeployConfig, LedgerOverrides},
    errors::ScriptError,
    ledger::AlloyLedger,
    utils::{read_record, read_spec, write_deployed_addresses, write_record, write_rows},
};

/// Deploy the steps of a spec, reporting and persisting the resulting record
pub async fn deploy(
    args: DeployArgs,
    config: &DeployConfig,
    overrides: &LedgerOverrides,
) -> Result<(), ScriptError> {
    let mut spec = read_spec(&args.spec)?;
    if let Some(resume_path) = &args.resume {
        let previous = read_record(resume_path)?;
        spec = spec.remaining_after(&previous);
        info!(
            remaining = spec.len(),
            "resuming from {}",
            resume_path.display()
        );
    }

    // Nothing is sent to the network for an invalid spec
    check_spec(&spec)?;

    let ledger_config = config.resolve(overrides)?;
    let confirmation_timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or(ledger_config.confirmation_timeout);

    info!(network = %ledger_config.network, steps = spec.len(), "deploying");
    let ledger = AlloyLedger::connect(&ledger_config).await?;
    let orchestrator = Orchestrator::new(
        ledger,
        RunOptions {
            policy: args.policy.into(),
            confirmation_timeout,
        },
    );

    let (cancel_handle, cancel_signal) = cancel_pair();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling the deployment");
            cancel_handle.cancel();
        }
    });

    let result = orchestrator
        .run_until_cancelled(&spec, cancel_signal)
        .await;
    interrupt.abort();
    let record = result.map_err(|e| ScriptError::InvalidSpec(e.to_string()))?;

    report(&record);

    if let Some(path) = &args.record {
        write_record(path, &record)?;
    }
    if let Some(path) = &args.rows {
        write_rows(path, &record)?;
    }
    if let Some(path) = &args.deployments {
        write_deployed_addresses(path, &record)?;
    }

    if record.has_failures() {
        return Err(ScriptError::DeploymentFailed(format!(
            "{} of {} steps confirmed",
            record.count(StepStatus::Confirmed),
            record.steps().len()
        )));
    }

    Ok(())
}

/// Validate a spec without constructing a ledger
pub fn validate(args: ValidateArgs) -> Result<(), ScriptError> {
    let spec = read_spec(&args.spec)?;
    check_spec(&spec)?;

    println!("{} is valid ({} steps)", args.spec.display(), spec.len());
    Ok(())
}

/// Print every violation in the spec, failing if there are any
fn check_spec(spec: &DeploymentSpec) -> Result<(), ScriptError> {
    let Err(violations) = spec.validate() else {
        return Ok(());
    };

    for violation in &violations {
        error!("{violation}");
    }

    Err(ScriptError::InvalidSpec(format!(
        "{} violation(s)",
        violations.len()
    )))
}

/// Print the confirmed addresses and a summary table of the run
fn report(record: &DeploymentRecord) {
    for result in record.steps() {
        if let Some(address) = result.confirmed_address() {
            println!(
                "{} ({}) deployed to: {:#x}",
                result.label(),
                result.contract(),
                address
            );
        }
    }

    println!("\n{record}");
}

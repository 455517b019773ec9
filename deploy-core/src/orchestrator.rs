//! Runs a deployment spec step by step and assembles the deployment record

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{
    cancel::CancelSignal,
    constants::DEFAULT_CONFIRMATION_TIMEOUT,
    errors::{OrchestratorError, StepError},
    executor::StepExecutor,
    ledger::LedgerClient,
    record::{DeploymentRecord, RunState, StepResult, StepStatus},
    resolver::resolve,
    spec::{DeploymentSpec, Step},
};

/// What the orchestrator does with later steps once a step fails
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContinuationPolicy {
    /// Skip every step after the first failure
    #[default]
    HaltOnFailure,
    /// Keep executing steps whose dependencies all confirmed, skipping only
    /// those that transitively depend on a failed step
    ContinueIndependent,
}

/// Per-run settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOptions {
    /// The continuation policy
    pub policy: ContinuationPolicy,
    /// The bound on waiting for each step's confirmation
    pub confirmation_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            policy: ContinuationPolicy::default(),
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }
}

/// Deploys the steps of a spec in order against a ledger
pub struct Orchestrator<L> {
    /// The ledger steps are deployed to
    ledger: L,
    /// The run settings
    options: RunOptions,
}

impl<L: LedgerClient> Orchestrator<L> {
    /// Create an orchestrator over the given ledger
    pub fn new(ledger: L, options: RunOptions) -> Self {
        Self { ledger, options }
    }

    /// The underlying ledger
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// The run settings
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run every step of the spec, with no external cancellation
    pub async fn run(&self, spec: &DeploymentSpec) -> Result<DeploymentRecord, OrchestratorError> {
        self.run_until_cancelled(spec, CancelSignal::never()).await
    }

    /// Run every step of the spec, stopping early if `cancel` is raised.
    ///
    /// Fails only if the spec is invalid, in which case the ledger is never
    /// contacted. Every other outcome is reported per step in the record.
    pub async fn run_until_cancelled(
        &self,
        spec: &DeploymentSpec,
        cancel: CancelSignal,
    ) -> Result<DeploymentRecord, OrchestratorError> {
        if let Err(violations) = spec.validate() {
            for violation in &violations {
                error!(%violation, "invalid deployment spec");
            }
            return Err(OrchestratorError::InvalidSpec(violations));
        }

        info!(
            steps = spec.len(),
            policy = ?self.options.policy,
            "starting deployment run"
        );

        let executor = StepExecutor::new(&self.ledger, self.options.confirmation_timeout);
        let mut results: Vec<StepResult> = Vec::with_capacity(spec.len());
        let mut state = RunState::Completed;
        let mut halted = false;

        for (index, step) in spec.steps().iter().enumerate() {
            if cancel.is_cancelled() {
                state = RunState::Cancelled;
                results.extend(spec.steps()[index..].iter().map(StepResult::cancelled));
                break;
            }

            if halted {
                results.push(StepResult::skipped(step, None));
                continue;
            }

            let result = self.run_step(step, &results, &executor, &cancel).await;
            let status = result.status();
            results.push(result);

            match status {
                StepStatus::Failed => {
                    halted = self.options.policy == ContinuationPolicy::HaltOnFailure;
                }
                StepStatus::Cancelled => {
                    state = RunState::Cancelled;
                    results.extend(spec.steps()[index + 1..].iter().map(StepResult::cancelled));
                    break;
                }
                _ => {}
            }
        }

        let record = DeploymentRecord::new(state, results);
        info!(
            state = ?record.state(),
            confirmed = record.count(StepStatus::Confirmed),
            failed = record.count(StepStatus::Failed),
            skipped = record.count(StepStatus::Skipped),
            cancelled = record.count(StepStatus::Cancelled),
            "deployment run finished"
        );

        Ok(record)
    }

    /// Gate, resolve, and execute a single step
    async fn run_step(
        &self,
        step: &Step,
        prior_results: &[StepResult],
        executor: &StepExecutor<'_, L>,
        cancel: &CancelSignal,
    ) -> StepResult {
        if let Some(blocker) = unconfirmed_dependency(step, prior_results) {
            warn!(
                step = step.id(),
                dependency = blocker,
                "skipping step with unconfirmed dependency"
            );
            return StepResult::skipped(
                step,
                Some(StepError::DependencyFailed {
                    step: blocker.to_string(),
                }),
            );
        }

        match resolve(step.args(), prior_results) {
            Ok(args) => executor.execute(step, args, cancel).await,
            Err(e) => StepResult::failed(step, e.into()),
        }
    }
}

/// The first dependency of `step` whose prior result is present but not
/// `Confirmed`.
///
/// A dependency with no prior result is left for the resolver to report.
fn unconfirmed_dependency<'a>(step: &'a Step, prior_results: &[StepResult]) -> Option<&'a str> {
    step.dependencies().find(|target| {
        prior_results
            .iter()
            .find(|r| r.step_id() == *target)
            .is_some_and(|r| r.status() != StepStatus::Confirmed)
    })
}

//! Drives a single step from submission to confirmation

use std::time::Duration;

use tokio::time;
use tracing::{debug, warn};

use crate::{
    cancel::CancelSignal,
    errors::StepError,
    ledger::LedgerClient,
    record::StepResult,
    resolver::ResolvedArgument,
    spec::Step,
};

/// Executes steps against a ledger, one at a time.
///
/// Every outcome, including ledger errors, is captured in the returned
/// [`StepResult`]; nothing is retried at this layer.
pub struct StepExecutor<'a, L> {
    /// The ledger to submit creation transactions to
    ledger: &'a L,
    /// The bound on waiting for a confirmation
    confirmation_timeout: Duration,
}

impl<'a, L: LedgerClient> StepExecutor<'a, L> {
    /// Create an executor over the given ledger
    pub fn new(ledger: &'a L, confirmation_timeout: Duration) -> Self {
        Self {
            ledger,
            confirmation_timeout,
        }
    }

    /// Submit the step's creation transaction and wait for it to confirm.
    ///
    /// If `cancel` is raised while waiting, the transaction is left in flight
    /// and the result is `Cancelled` with its hash recorded. An outcome the
    /// ledger already has ready is still taken.
    pub async fn execute(
        &self,
        step: &Step,
        args: Vec<ResolvedArgument>,
        cancel: &CancelSignal,
    ) -> StepResult {
        let mut result = StepResult::pending(step, args);
        debug!(step = step.id(), contract = step.contract(), "executing step");

        let transaction_hash = match self
            .ledger
            .submit_creation(step.contract(), result.args())
            .await
        {
            Ok(hash) => hash,
            Err(e) => {
                result.fail(e.into());
                return result;
            }
        };
        result.submit(transaction_hash);

        // Bounded here regardless of whether the ledger honors `timeout`
        let confirmation = time::timeout(
            self.confirmation_timeout,
            self.ledger
                .await_confirmation(transaction_hash, self.confirmation_timeout),
        );

        tokio::select! {
            biased;

            // A ready confirmation wins over a cancellation raised alongside it
            outcome = confirmation => match outcome {
                Ok(Ok(address)) => result.confirm(address),
                Ok(Err(e)) => result.fail(e.into()),
                Err(_elapsed) => result.fail(StepError::ConfirmationTimeout),
            },
            _ = cancel.cancelled() => {
                warn!(
                    step = step.id(),
                    tx_hash = %transaction_hash,
                    "run cancelled while awaiting confirmation, transaction left in flight"
                );
                result.cancel();
            }
        }

        result
    }
}

//! The outcome log of a deployment run

use std::fmt::{self, Display, Formatter};

use alloy_primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{errors::StepError, resolver::ResolvedArgument, spec::Step};

/// Placeholder printed for absent values in the record table
const EMPTY_CELL: &str = "-";

/// The lifecycle position of a single step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepStatus {
    /// The step has started but nothing has been submitted
    Pending,
    /// The ledger accepted the creation transaction
    Submitted,
    /// The ledger reported inclusion with a resulting address
    Confirmed,
    /// The step failed; terminal
    Failed,
    /// The step was never attempted because of an earlier failure
    Skipped,
    /// The run was cancelled before this step could finish
    Cancelled,
}

impl Display for StepStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Pending => "pending",
            StepStatus::Submitted => "submitted",
            StepStatus::Confirmed => "confirmed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
            StepStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// The outcome of a single step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    /// The id of the step
    step_id: String,
    /// The step's reporting label
    label: String,
    /// The contract the step creates
    contract: String,
    /// Where the step is in its lifecycle
    status: StepStatus,
    /// The concrete constructor arguments, once resolved
    #[serde(default)]
    args: Vec<ResolvedArgument>,
    /// The hash of the creation transaction, once submitted
    transaction_hash: Option<TxHash>,
    /// The created contract's address, once confirmed
    address: Option<Address>,
    /// Why the step did not confirm
    error: Option<StepError>,
}

impl StepResult {
    /// A fresh result for a step about to execute with the given arguments
    pub(crate) fn pending(step: &Step, args: Vec<ResolvedArgument>) -> Self {
        Self {
            step_id: step.id().to_string(),
            label: step.label().to_string(),
            contract: step.contract().to_string(),
            status: StepStatus::Pending,
            args,
            transaction_hash: None,
            address: None,
            error: None,
        }
    }

    /// A failed result for a step that never reached the ledger
    pub(crate) fn failed(step: &Step, error: StepError) -> Self {
        let mut result = Self::pending(step, Vec::new());
        result.fail(error);
        result
    }

    /// A result for a step that was not attempted
    pub(crate) fn skipped(step: &Step, reason: Option<StepError>) -> Self {
        debug!(step = step.id(), "step skipped");
        Self {
            status: StepStatus::Skipped,
            error: reason,
            ..Self::pending(step, Vec::new())
        }
    }

    /// A result for a step that was not attempted because the run was cancelled
    pub(crate) fn cancelled(step: &Step) -> Self {
        let mut result = Self::pending(step, Vec::new());
        result.cancel();
        result
    }

    /// Record acceptance of the creation transaction
    pub(crate) fn submit(&mut self, transaction_hash: TxHash) {
        self.transaction_hash = Some(transaction_hash);
        self.status = StepStatus::Submitted;
        info!(step = %self.step_id, tx_hash = %transaction_hash, "creation transaction submitted");
    }

    /// Record the confirmed contract address
    pub(crate) fn confirm(&mut self, address: Address) {
        self.address = Some(address);
        self.status = StepStatus::Confirmed;
        info!(
            step = %self.step_id,
            contract = %self.contract,
            address = %address,
            "contract deployed"
        );
    }

    /// Record a terminal failure
    pub(crate) fn fail(&mut self, error: StepError) {
        warn!(step = %self.step_id, error = %error, "step failed");
        self.status = StepStatus::Failed;
        self.error = Some(error);
    }

    /// Record that the run was cancelled while this step was outstanding.
    ///
    /// A submitted transaction hash is kept so the caller can reconcile it.
    pub(crate) fn cancel(&mut self) {
        self.status = StepStatus::Cancelled;
        self.error = Some(StepError::Cancelled);
    }

    /// The id of the step
    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    /// The step's reporting label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The contract the step creates
    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// The step's lifecycle position
    pub fn status(&self) -> StepStatus {
        self.status
    }

    /// The constructor arguments actually submitted
    pub fn args(&self) -> &[ResolvedArgument] {
        &self.args
    }

    /// The creation transaction hash, if one was submitted
    pub fn transaction_hash(&self) -> Option<TxHash> {
        self.transaction_hash
    }

    /// The created contract's address, if known
    pub fn address(&self) -> Option<Address> {
        self.address
    }

    /// The address, only if the step is `Confirmed`
    pub fn confirmed_address(&self) -> Option<Address> {
        (self.status == StepStatus::Confirmed)
            .then_some(self.address)
            .flatten()
    }

    /// Why the step did not confirm
    pub fn error(&self) -> Option<&StepError> {
        self.error.as_ref()
    }
}

/// How a run ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Every step was attempted or deliberately skipped
    Completed,
    /// The run was interrupted by an external cancellation
    Cancelled,
}

/// The ordered outcome log of a run, one entry per spec step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// How the run ended
    state: RunState,
    /// Per-step outcomes, in spec order
    steps: Vec<StepResult>,
}

impl DeploymentRecord {
    /// Freeze the results of a run
    pub(crate) fn new(state: RunState, steps: Vec<StepResult>) -> Self {
        Self { state, steps }
    }

    /// How the run ended
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Per-step outcomes, in spec order
    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    /// The outcome of the step with the given id
    pub fn get(&self, step_id: &str) -> Option<&StepResult> {
        self.steps.iter().find(|r| r.step_id() == step_id)
    }

    /// The number of steps with the given status
    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|r| r.status() == status).count()
    }

    /// Whether any step failed or was cancelled
    pub fn has_failures(&self) -> bool {
        self.steps
            .iter()
            .any(|r| matches!(r.status(), StepStatus::Failed | StepStatus::Cancelled))
    }

    /// Whether every step confirmed
    pub fn is_success(&self) -> bool {
        self.steps
            .iter()
            .all(|r| r.status() == StepStatus::Confirmed)
    }

    /// The persisted row form of each step
    pub fn rows(&self) -> Vec<RecordRow> {
        self.steps.iter().map(RecordRow::from).collect()
    }

    /// The rows as newline-delimited JSON
    pub fn to_ndjson(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for row in self.rows() {
            out.push_str(&serde_json::to_string(&row)?);
            out.push('\n');
        }

        Ok(out)
    }
}

impl Display for DeploymentRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rows = self.rows();
        let label_width = column_width("LABEL", rows.iter().map(|r| r.label.as_str()));
        let contract_width = column_width("CONTRACT", rows.iter().map(|r| r.contract.as_str()));

        writeln!(
            f,
            "{:<label_width$}  {:<contract_width$}  {:<9}  {:<42}  TRANSACTION",
            "LABEL", "CONTRACT", "STATUS", "ADDRESS"
        )?;
        for row in rows {
            let address = row
                .address
                .map(|a| format!("{a:#x}"))
                .unwrap_or_else(|| EMPTY_CELL.to_string());
            let tx_hash = row
                .transaction_hash
                .map(|h| format!("{h:#x}"))
                .unwrap_or_else(|| EMPTY_CELL.to_string());

            writeln!(
                f,
                "{:<label_width$}  {:<contract_width$}  {:<9}  {:<42}  {}",
                row.label,
                row.contract,
                row.status.to_string(),
                address,
                tx_hash
            )?;
        }

        Ok(())
    }
}

/// The width of a table column holding the given header and values
fn column_width<'a>(header: &'a str, values: impl Iterator<Item = &'a str>) -> usize {
    values
        .chain([header])
        .map(|value| value.chars().count())
        .max()
        .unwrap_or(0)
}

/// The flattened, persisted form of a step outcome
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRow {
    /// The step's reporting label
    pub label: String,
    /// The contract the step creates
    pub contract: String,
    /// The created address, if any
    pub address: Option<Address>,
    /// The creation transaction hash, if any
    pub transaction_hash: Option<TxHash>,
    /// The step's final status
    pub status: StepStatus,
}

impl From<&StepResult> for RecordRow {
    fn from(result: &StepResult) -> Self {
        Self {
            label: result.label.clone(),
            contract: result.contract.clone(),
            address: result.address,
            transaction_hash: result.transaction_hash,
            status: result.status,
        }
    }
}

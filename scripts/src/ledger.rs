//! A [`LedgerClient`] backed by an Ethereum JSON-RPC node

use std::time::Duration;

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, TxHash},
    providers::{DynProvider, Provider},
    rpc::types::{TransactionReceipt, TransactionRequest},
};
use async_trait::async_trait;
use deploy_core::{errors::LedgerError, ledger::LedgerClient, resolver::ResolvedArgument};
use tokio::time::{self, sleep};
use tracing::{debug, warn};

use crate::{
    artifacts::ArtifactStore, config::LedgerConfig, constants::DROPPED_AFTER_UNKNOWN_POLLS,
    errors::ScriptError, utils::setup_client,
};

/// Deploys contracts from compiled artifacts through a signing RPC client
pub struct AlloyLedger {
    /// The signing client
    provider: DynProvider,
    /// Where compiled contracts are looked up
    artifacts: ArtifactStore,
    /// How often a pending transaction's receipt is polled
    poll_interval: Duration,
}

impl AlloyLedger {
    /// Connect to the configured network
    pub async fn connect(config: &LedgerConfig) -> Result<Self, ScriptError> {
        let provider = setup_client(&config.private_key, &config.rpc_url).await?;
        Ok(AlloyLedger {
            provider,
            artifacts: ArtifactStore::new(&config.artifacts_dir),
            poll_interval: config.poll_interval,
        })
    }

    /// Poll for the transaction's receipt until it is included or the node forgets it
    async fn poll_receipt(&self, transaction_hash: TxHash) -> Result<Address, LedgerError> {
        let mut visibility = Visibility::default();
        loop {
            match self.provider.get_transaction_receipt(transaction_hash).await {
                Ok(Some(receipt)) => return created_address(&receipt),
                Ok(None) => match self.provider.get_transaction_by_hash(transaction_hash).await {
                    Ok(Some(_)) => {
                        debug!(%transaction_hash, "transaction pending");
                        visibility.seen();
                    }
                    Ok(None) => {
                        debug!(%transaction_hash, "transaction unknown to node");
                        if visibility.unknown() {
                            return Err(LedgerError::Dropped);
                        }
                    }
                    Err(e) => warn!(%transaction_hash, "error fetching transaction: {e}"),
                },
                Err(e) => warn!(%transaction_hash, "error fetching receipt: {e}"),
            }

            sleep(self.poll_interval).await;
        }
    }
}

/// Counts consecutive polls in which the node did not know a transaction
#[derive(Debug, Default)]
struct Visibility {
    /// Polls since the transaction was last seen, or since polling began
    unknown_polls: u32,
}

impl Visibility {
    /// The node reported the transaction as pending
    fn seen(&mut self) {
        self.unknown_polls = 0;
    }

    /// The node did not know the transaction. Returns whether it is now
    /// considered dropped.
    fn unknown(&mut self) -> bool {
        self.unknown_polls += 1;
        self.unknown_polls >= DROPPED_AFTER_UNKNOWN_POLLS
    }
}

#[async_trait]
impl LedgerClient for AlloyLedger {
    async fn submit_creation(
        &self,
        contract: &str,
        args: &[ResolvedArgument],
    ) -> Result<TxHash, LedgerError> {
        let deploy_code = self
            .artifacts
            .load(contract)
            .and_then(|artifact| artifact.deploy_code(args))
            .map_err(|e| LedgerError::Submission(e.to_string()))?;

        let tx = TransactionRequest::default().with_deploy_code(deploy_code);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| LedgerError::Submission(e.to_string()))?;

        Ok(*pending.tx_hash())
    }

    async fn await_confirmation(
        &self,
        transaction_hash: TxHash,
        timeout: Duration,
    ) -> Result<Address, LedgerError> {
        time::timeout(timeout, self.poll_receipt(transaction_hash))
            .await
            .map_err(|_| LedgerError::Timeout)?
    }
}

/// The address a creation receipt reports, if the creation succeeded
fn created_address(receipt: &TransactionReceipt) -> Result<Address, LedgerError> {
    if !receipt.status() {
        return Err(LedgerError::Reverted);
    }

    receipt.contract_address.ok_or(LedgerError::Reverted)
}

//! The capability the orchestrator uses to reach a ledger.
//!
//! Transport, signing, fee policy and network selection all live behind this
//! trait; implementations may be reused across steps but are only assumed to
//! be safe for sequential use.

use std::time::Duration;

use alloy_primitives::{Address, TxHash};
use async_trait::async_trait;

use crate::{errors::LedgerError, resolver::ResolvedArgument};

/// A ledger that can create contracts and report on their creation
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submit a creation transaction for `contract` with the given constructor
    /// arguments, returning its hash once the ledger has accepted it.
    ///
    /// Fails with [`LedgerError::Submission`] if the transaction is rejected
    /// before inclusion.
    async fn submit_creation(
        &self,
        contract: &str,
        args: &[ResolvedArgument],
    ) -> Result<TxHash, LedgerError>;

    /// Wait for the transaction to be included, returning the created
    /// contract's address.
    ///
    /// Fails with [`LedgerError::Reverted`], [`LedgerError::Dropped`], or
    /// [`LedgerError::Timeout`] if no confirmation is seen within `timeout`.
    async fn await_confirmation(
        &self,
        transaction_hash: TxHash,
        timeout: Duration,
    ) -> Result<Address, LedgerError>;
}

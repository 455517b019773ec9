//! Orchestration of multi-contract deployments.
//!
//! A [`DeploymentSpec`](spec::DeploymentSpec) lists contract-creation steps in
//! dependency order. The [`Orchestrator`](orchestrator::Orchestrator) validates
//! it, resolves each step's constructor arguments against the addresses of
//! earlier steps, submits the creation transactions through a
//! [`LedgerClient`](ledger::LedgerClient), and returns a
//! [`DeploymentRecord`](record::DeploymentRecord) describing what happened to
//! every step.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod cancel;
pub mod constants;
pub mod errors;
pub mod executor;
pub mod ledger;
pub mod orchestrator;
pub mod record;
pub mod resolver;
pub mod spec;

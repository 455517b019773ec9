//! Scripts for deploying a sequence of contracts described by a deployment spec.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod cli;
mod commands;
pub mod config;
pub mod constants;
pub mod errors;
pub mod ledger;
pub mod utils;

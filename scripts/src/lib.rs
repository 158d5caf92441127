//! Scripts for deploying and bootstrapping the robocup competition contracts.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod cli;
mod commands;
pub mod constants;
pub mod errors;
pub mod handles;
pub mod ledger;
pub mod orchestrator;
pub mod params;
pub mod registry;
pub mod scenario;
pub mod solidity;
pub mod stages;
pub mod types;
pub mod utils;

#[cfg(test)]
mod mock;

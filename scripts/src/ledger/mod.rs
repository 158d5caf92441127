//! The boundary between the scripts and the remote network
//!
//! A [`Ledger`] submits creations and calls on behalf of a single signer and
//! suspends until the network reports a durable outcome. Everything above this
//! trait is network-agnostic, which lets the orchestrator run against a live
//! node through [`rpc::RpcLedger`] or against a simulated ledger in tests.

pub mod rpc;

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;

use crate::{
    errors::ScriptError,
    types::{Confirmation, DeployRequest, Deployed, RemoteCall},
};

/// A ledger shared between every handle of a run
pub type SharedLedger = Arc<dyn Ledger>;

/// A signer's view of a remote ledger network
#[async_trait]
pub trait Ledger: Send + Sync {
    /// The address of the signer that pays for and originates every call
    fn signer_address(&self) -> Address;

    /// Read the current balance of an account, in wei
    async fn balance(&self, account: Address) -> Result<U256, ScriptError>;

    /// Check whether contract code is deployed at an address
    async fn has_code(&self, address: Address) -> Result<bool, ScriptError>;

    /// Create a contract and wait until its address is confirmed
    async fn deploy(&self, request: DeployRequest) -> Result<Deployed, ScriptError>;

    /// Submit a mutating call and wait until it is confirmed
    async fn send(&self, call: RemoteCall) -> Result<Confirmation, ScriptError>;

    /// Execute a non-mutating call and return its raw return data
    async fn view(&self, to: Address, input: Bytes) -> Result<Bytes, ScriptError>;

    /// Execute a call, value included, against the latest state without
    /// submitting it, returning what it would return if mined now
    async fn simulate(&self, call: RemoteCall) -> Result<Bytes, ScriptError>;
}

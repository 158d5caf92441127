//! Definitions of errors that can occur during the execution of the deploy scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use alloy_primitives::U256;

use crate::types::Component;

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// Error reading the deployments file
    ReadDeployments(String),
    /// Error writing the deployments file or a front-end artifact
    WriteDeployments(String),
    /// Error parsing a Solidity compilation artifact
    ArtifactParsing(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// A component could not be created on the network
    DeploymentFailure(String),
    /// A configured address is malformed or holds no contract
    InvalidAddress(String),
    /// Attach mode was selected but the component has no recorded address
    MissingAddress(Component),
    /// A mutating call could not be submitted or confirmed
    RemoteCallFailure(String),
    /// The remote contract rejected the call
    Reverted(String),
    /// The signer cannot cover the value transferred by a call
    InsufficientFunds {
        /// The value the call transfers
        required: U256,
        /// The signer's balance when it was read
        available: U256,
    },
    /// A non-mutating read failed in transport
    RemoteReadFailure(String),
    /// A submitted transaction was not confirmed within the timeout
    Timeout(String),
    /// Error decoding the return data of a remote operation
    Decoding(String),
    /// The checkpoint cursor lies past the end of the stage table
    InvalidCheckpoint {
        /// The requested cursor
        cursor: usize,
        /// The number of stages in the table
        num_stages: usize,
    },
    /// The bootstrap parameters are inconsistent
    InvalidParams(String),
    /// Remote state does not allow the stage to proceed
    UnexpectedState(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::DeploymentFailure(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::InvalidAddress(s) => write!(f, "invalid address: {}", s),
            ScriptError::MissingAddress(c) => write!(f, "no address recorded for {}", c),
            ScriptError::RemoteCallFailure(s) => write!(f, "error submitting call: {}", s),
            ScriptError::Reverted(s) => write!(f, "call reverted: {}", s),
            ScriptError::InsufficientFunds {
                required,
                available,
            } => write!(
                f,
                "insufficient funds: call transfers {} wei, signer holds {} wei",
                required, available
            ),
            ScriptError::RemoteReadFailure(s) => write!(f, "error reading contract: {}", s),
            ScriptError::Timeout(s) => write!(f, "timed out awaiting confirmation: {}", s),
            ScriptError::Decoding(s) => write!(f, "error decoding return data: {}", s),
            ScriptError::InvalidCheckpoint { cursor, num_stages } => write!(
                f,
                "cannot start from stage {}, the table has {} stages",
                cursor, num_stages
            ),
            ScriptError::InvalidParams(s) => write!(f, "invalid bootstrap parameters: {}", s),
            ScriptError::UnexpectedState(s) => write!(f, "unexpected remote state: {}", s),
        }
    }
}

impl Error for ScriptError {}

/// A failure of a single remote operation, tagged with where it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationError {
    /// The component the operation targeted
    pub component: Component,
    /// The Solidity signature of the operation, or `constructor`
    pub operation: &'static str,
    /// The underlying error
    pub error: ScriptError,
}

impl OperationError {
    /// Tag an error with the component and operation it occurred in
    pub fn new(component: Component, operation: &'static str, error: ScriptError) -> Self {
        Self {
            component,
            operation,
            error,
        }
    }
}

impl Display for OperationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.component, self.operation, self.error)
    }
}

impl Error for OperationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

/// The failure that aborted an orchestration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    /// The index of the stage that aborted
    pub index: usize,
    /// The label of the stage that aborted
    pub label: &'static str,
    /// The operation that failed inside the stage
    pub cause: OperationError,
}

impl Display for StageFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stage {} ({}) aborted at {}",
            self.index, self.label, self.cause
        )
    }
}

impl Error for StageFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.cause)
    }
}

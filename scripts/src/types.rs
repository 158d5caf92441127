//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use alloy_primitives::{Address, Bytes, TxHash, U256};
use clap::ValueEnum;

use crate::constants::{
    DEVELOPER_CONTRACT_KEY, PROGRAM_CONTRACT_KEY, ROBOCUP_CONTRACT_KEY, ROBOT_CONTRACT_KEY,
};

/// The on-chain components deployed by the scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    /// The program token contract
    Program,
    /// The developer registry contract
    Developer,
    /// The robot token contract
    Robot,
    /// The competition platform contract
    Robocup,
}

impl Component {
    /// All components, in an order in which each one's dependencies precede it
    pub const DEPLOYMENT_ORDER: [Component; 4] = [
        Component::Program,
        Component::Developer,
        Component::Robot,
        Component::Robocup,
    ];

    /// The name of the Solidity contract backing this component
    pub fn contract_name(&self) -> &'static str {
        match self {
            Component::Program => "Program",
            Component::Developer => "Developer",
            Component::Robot => "Robot",
            Component::Robocup => "RobocupCompetitionPlatform",
        }
    }

    /// The key under which this component's address is recorded in the
    /// deployments file
    pub fn deployments_key(&self) -> &'static str {
        match self {
            Component::Program => PROGRAM_CONTRACT_KEY,
            Component::Developer => DEVELOPER_CONTRACT_KEY,
            Component::Robot => ROBOT_CONTRACT_KEY,
            Component::Robocup => ROBOCUP_CONTRACT_KEY,
        }
    }

    /// The components whose addresses are passed, in order, to this
    /// component's constructor
    pub fn dependencies(&self) -> &'static [Component] {
        match self {
            Component::Program => &[],
            Component::Developer | Component::Robot => &[Component::Program],
            Component::Robocup => &[Component::Robot, Component::Program],
        }
    }
}

impl Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.contract_name())
    }
}

/// How the handles for a run are obtained
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    /// Deploy every component afresh
    Deploy,
    /// Attach to the addresses recorded in the deployments file
    Attach,
    /// Attach to recorded addresses and deploy whatever is missing
    DeployMissing,
}

impl Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentMode::Deploy => write!(f, "deploy"),
            DeploymentMode::Attach => write!(f, "attach"),
            DeploymentMode::DeployMissing => write!(f, "deploy-missing"),
        }
    }
}

/// Whether a stage may be executed again once its effects have landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotence {
    /// Re-executing the stage overwrites state with the same values
    SafeToRerun,
    /// The stage checks remote state and only acts where it is not yet applied
    Guarded,
    /// Re-executing the stage duplicates irreversible effects
    Unsafe,
}

impl Display for Idempotence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Idempotence::SafeToRerun => write!(f, "safe-to-rerun"),
            Idempotence::Guarded => write!(f, "guarded"),
            Idempotence::Unsafe => write!(f, "unsafe"),
        }
    }
}

/// A request to create a contract
#[derive(Debug, Clone)]
pub struct DeployRequest {
    /// The component being created
    pub component: Component,
    /// The creation bytecode with the ABI-encoded constructor arguments appended
    pub init_code: Bytes,
}

/// A mutating call against a deployed contract
#[derive(Debug, Clone)]
pub struct RemoteCall {
    /// The address of the target contract
    pub to: Address,
    /// The ABI-encoded calldata
    pub input: Bytes,
    /// The value transferred with the call, in wei
    pub value: U256,
}

/// The receipt of a confirmed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    /// The hash of the confirmed transaction
    pub tx_hash: TxHash,
    /// The block the transaction was included in, if the node reports it
    pub block_number: Option<u64>,
}

/// A confirmed contract creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployed {
    /// The address the contract was created at
    pub address: Address,
    /// The creation receipt
    pub confirmation: Confirmation,
}

/// A competition between two robots, as recorded by the competition platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompetitionRecord {
    /// The challenging robot
    pub robot_a: U256,
    /// The ability level claimed by the challenging robot
    pub level_a: U256,
    /// The challenged robot
    pub robot_b: U256,
    /// The ability level claimed by the challenged robot
    pub level_b: U256,
    /// The stake paid when the challenge was launched
    pub stake: U256,
    /// Whether the competition has been resolved
    pub finished: bool,
}

impl CompetitionRecord {
    /// Whether the record pairs the given robots at the given levels
    pub fn pairs(&self, robot_a: U256, level_a: U256, robot_b: U256, level_b: U256) -> bool {
        self.robot_a == robot_a
            && self.level_a == level_a
            && self.robot_b == robot_b
            && self.level_b == level_b
    }
}

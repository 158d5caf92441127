//! Definitions of CLI arguments and commands for deploy scripts

use std::{
    fmt::{self, Display},
    path::PathBuf,
    time::Duration,
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use eyre::Result;

use crate::{
    commands::{bootstrap, deploy, print_stages, scenario},
    constants::{DEFAULT_CONFIRMATION_TIMEOUT_SECS, DEFAULT_DEVNET_RPC_URL},
    errors::ScriptError,
    types::DeploymentMode,
};

/// Deploy & bootstrap the robocup contracts
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The available commands
#[derive(Subcommand)]
pub enum Command {
    /// Deploy every component, recording the addresses in the deployments file
    Deploy(DeployArgs),
    /// Run the bootstrap stages against resolved contracts
    Bootstrap(BootstrapArgs),
    /// Print the bootstrap stage table
    Stages,
    /// Deploy, bootstrap and verify against a disposable devnet
    Scenario(ScenarioArgs),
}

impl Command {
    /// Run the command
    pub async fn run(self) -> Result<()> {
        match self {
            Command::Deploy(args) => deploy(args).await,
            Command::Bootstrap(args) => bootstrap(args).await,
            Command::Stages => {
                print_stages();
                Ok(())
            }
            Command::Scenario(args) => scenario(args).await,
        }
    }
}

/// The networks the scripts know how to target
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    /// A local, ephemeral development node
    Devnet,
    /// The Ropsten testnet
    Ropsten,
    /// Ethereum mainnet
    Mainnet,
}

impl Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Devnet => write!(f, "devnet"),
            Network::Ropsten => write!(f, "ropsten"),
            Network::Mainnet => write!(f, "mainnet"),
        }
    }
}

/// Arguments shared by every command that talks to a node
#[derive(Args)]
pub struct NetworkArgs {
    /// The network to target
    #[arg(short, long, env = "NETWORK", default_value_t = Network::Devnet)]
    pub network: Network,

    /// Network RPC URL, required for every network but the devnet
    #[arg(short, long, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    /// Private key of the deployer
    #[arg(short, long, env = "PKEY", hide_env_values = true)]
    pub priv_key: String,

    /// Path to the deployments file, defaults to `deployments.<network>.json`
    #[arg(short, long, env = "DEPLOYMENTS")]
    pub deployments: Option<PathBuf>,

    /// Seconds to wait for each transaction to be confirmed
    #[arg(long, default_value_t = DEFAULT_CONFIRMATION_TIMEOUT_SECS)]
    pub confirmation_timeout: u64,
}

impl NetworkArgs {
    /// The RPC URL to connect to
    pub fn rpc_url(&self) -> Result<String, ScriptError> {
        match (&self.rpc_url, self.network) {
            (Some(url), _) => Ok(url.clone()),
            (None, Network::Devnet) => Ok(DEFAULT_DEVNET_RPC_URL.to_string()),
            (None, network) => Err(ScriptError::ClientInitialization(format!(
                "an RPC URL is required for {network}"
            ))),
        }
    }

    /// The path of the deployments file
    pub fn deployments_path(&self) -> PathBuf {
        self.deployments
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("deployments.{}.json", self.network)))
    }

    /// How long to wait for each transaction to be confirmed
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout)
    }
}

/// Deploy the four components
#[derive(Args)]
pub struct DeployArgs {
    /// Network options
    #[command(flatten)]
    pub network: NetworkArgs,

    /// The Hardhat artifacts directory holding the compiled contracts
    #[arg(short, long, env = "ARTIFACTS")]
    pub artifacts: PathBuf,

    /// Only deploy the components without a recorded address
    #[arg(long)]
    pub missing_only: bool,

    /// Directory to write the front-end address mapping & ABIs to
    #[arg(long)]
    pub frontend_dir: Option<PathBuf>,
}

/// Run the bootstrap stages
#[derive(Args)]
pub struct BootstrapArgs {
    /// Network options
    #[command(flatten)]
    pub network: NetworkArgs,

    /// How to obtain the contracts to bootstrap
    #[arg(short, long, default_value_t = DeploymentMode::Attach)]
    pub mode: DeploymentMode,

    /// The index of the first stage to run; earlier stages are assumed done
    #[arg(short, long, env = "START_FROM", default_value_t = 0)]
    pub start_from: usize,

    /// A JSON file overriding the default bootstrap parameters
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// The Hardhat artifacts directory, required unless attaching
    #[arg(short, long, env = "ARTIFACTS")]
    pub artifacts: Option<PathBuf>,

    /// Skip checking that code is deployed at attached addresses
    #[arg(long)]
    pub no_verify_code: bool,
}

/// Run the end-to-end scenario
#[derive(Args)]
pub struct ScenarioArgs {
    /// Network options
    #[command(flatten)]
    pub network: NetworkArgs,

    /// The Hardhat artifacts directory holding the compiled contracts
    #[arg(short, long, env = "ARTIFACTS")]
    pub artifacts: PathBuf,

    /// A JSON file overriding the default bootstrap parameters
    #[arg(long)]
    pub params: Option<PathBuf>,
}

//! Constants used in the deploy scripts

use alloy_primitives::{address, Address};

/// The number of confirmations to wait for on every submitted transaction
pub const NUM_CONFIRMATIONS: u64 = 1;

/// The default number of seconds to wait for a transaction to be confirmed
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 120;

/// The default RPC URL of a local devnet node
pub const DEFAULT_DEVNET_RPC_URL: &str = "http://127.0.0.1:8545";

/// The deployments key in the deployments file
pub const DEPLOYMENTS_KEY: &str = "deployments";

/// The Program contract key in the deployments file
pub const PROGRAM_CONTRACT_KEY: &str = "program_contract";

/// The Developer contract key in the deployments file
pub const DEVELOPER_CONTRACT_KEY: &str = "developer_contract";

/// The Robot contract key in the deployments file
pub const ROBOT_CONTRACT_KEY: &str = "robot_contract";

/// The competition platform contract key in the deployments file
pub const ROBOCUP_CONTRACT_KEY: &str = "robocup_contract";

/// The name of the address mapping written for the front-end
pub const FRONTEND_ADDRESS_FILE: &str = "contract-address.json";

/// The extension of Hardhat compilation artifacts
pub const ARTIFACT_EXTENSION: &str = "json";

// ------------------------
// | Bootstrap Parameters |
// ------------------------

/// The ability tag that programs are registered under
pub const DEFAULT_ABILITY: &str = "AISoccer";

/// The initial number assigned to a newly supported ability
pub const DEFAULT_ABILITY_INIT_NUMBER: u64 = 1;

/// The developer name registered during bootstrap
pub const DEFAULT_DEV_NAME: &str = "Sam";

/// The developer bio registered during bootstrap
pub const DEFAULT_DEV_BIO: &str = "full stack engineer on blockchain industry";

/// The developer avatar registered during bootstrap
pub const DEFAULT_DEV_IMAGE_URL: &str =
    "https://pbs.twimg.com/profile_images/1454759537429266436/BX-zxPAo_400x400.jpg";

/// The developer profile registered during bootstrap
pub const DEFAULT_DEV_PROFILE_URL: &str = "https://github.com/syslink";

/// The description attached to the registered programs
pub const DEFAULT_PROGRAM_DESCRIPTION: &str = "champion program";

/// The source URL attached to the registered programs
pub const DEFAULT_PROGRAM_URL: &str = "https://github.com/AISoccerMaster";

/// The code hashes of the two program variants registered during bootstrap
pub const DEFAULT_PROGRAM_CODE_HASHES: [[u8; 4]; 2] =
    [[0x12, 0x34, 0x56, 0x78], [0x23, 0x45, 0x67, 0x89]];

/// The emulation platform whitelisted on the competition platform
pub const DEFAULT_EMULATE_PLATFORM: Address =
    address!("0xF0d219afAfDc79b81344534c37Bc69Fc64091F85");

/// The stake paid when launching a challenge, in wei (0.01 ether)
pub const DEFAULT_CHALLENGE_STAKE_WEI: u128 = 10_000_000_000_000_000;

/// The id of the first competition created on a fresh platform
pub const FIRST_COMPETITION_ID: u64 = 1;

//! The values the bootstrap stages register on the deployed components
//!
//! Every field has a default matching the canonical bootstrap, so a params file
//! only needs to name what it overrides.

use std::{fs, path::Path};

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        DEFAULT_ABILITY, DEFAULT_ABILITY_INIT_NUMBER, DEFAULT_CHALLENGE_STAKE_WEI,
        DEFAULT_DEV_BIO, DEFAULT_DEV_IMAGE_URL, DEFAULT_DEV_NAME, DEFAULT_DEV_PROFILE_URL,
        DEFAULT_EMULATE_PLATFORM, DEFAULT_PROGRAM_CODE_HASHES, DEFAULT_PROGRAM_DESCRIPTION,
        DEFAULT_PROGRAM_URL,
    },
    errors::ScriptError,
};

/// The number of robots a challenge pairs
pub const NUM_CHALLENGERS: usize = 2;

/// The developer profile registered by the signer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeveloperProfile {
    /// The display name
    pub name: String,
    /// A short biography
    pub bio: String,
    /// The developer who referred this one, or the zero address
    pub referrer: Address,
    /// The profile flag passed through to the registry
    pub flag: u64,
    /// The avatar URL
    pub image_url: String,
    /// The profile URL
    pub profile_url: String,
}

impl Default for DeveloperProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_DEV_NAME.to_string(),
            bio: DEFAULT_DEV_BIO.to_string(),
            referrer: Address::ZERO,
            flag: 0,
            image_url: DEFAULT_DEV_IMAGE_URL.to_string(),
            profile_url: DEFAULT_DEV_PROFILE_URL.to_string(),
        }
    }
}

/// A program registered under the bootstrap ability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramRegistration {
    /// The ability level the program plays at
    pub level: u64,
    /// The variant of the program within its level
    pub variant: u64,
    /// The hash of the program's code
    pub code_hash: Bytes,
    /// A short description
    pub description: String,
    /// Where the program's source lives
    pub url: String,
}

/// A robot entered into the challenge, along with the program bound to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    /// The index of the robot among the signer's robots
    pub robot_index: u64,
    /// The index of the bound program among the registered programs
    pub program_index: usize,
    /// The ability level the robot competes at
    pub level: u64,
}

/// The full set of values used by the bootstrap stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapParams {
    /// The ability tag programs are registered under
    pub ability: String,
    /// The initial number of the ability tag
    pub ability_init_number: u64,
    /// The developer profile registered by the signer
    pub developer: DeveloperProfile,
    /// The programs registered by the signer, in registration order
    pub programs: Vec<ProgramRegistration>,
    /// The number of robots minted by each successive mint call
    pub mint_batches: Vec<u64>,
    /// The emulation platform whitelisted on the competition platform
    pub emulate_platform: Address,
    /// The two robots paired in the challenge, challenger first
    pub competitors: Vec<Competitor>,
    /// The stake paid when launching the challenge, in wei
    pub challenge_stake_wei: u128,
    /// The competition to read back after the launch, overriding the id the
    /// launch call returns
    pub competition_id: Option<u64>,
}

impl Default for BootstrapParams {
    fn default() -> Self {
        let programs = DEFAULT_PROGRAM_CODE_HASHES
            .iter()
            .enumerate()
            .map(|(variant, code_hash)| ProgramRegistration {
                level: 1,
                variant: variant as u64,
                code_hash: Bytes::copy_from_slice(code_hash),
                description: DEFAULT_PROGRAM_DESCRIPTION.to_string(),
                url: DEFAULT_PROGRAM_URL.to_string(),
            })
            .collect();

        Self {
            ability: DEFAULT_ABILITY.to_string(),
            ability_init_number: DEFAULT_ABILITY_INIT_NUMBER,
            developer: DeveloperProfile::default(),
            programs,
            mint_batches: vec![1, 1],
            emulate_platform: DEFAULT_EMULATE_PLATFORM,
            competitors: vec![
                Competitor {
                    robot_index: 0,
                    program_index: 0,
                    level: 1,
                },
                Competitor {
                    robot_index: 1,
                    program_index: 1,
                    level: 2,
                },
            ],
            challenge_stake_wei: DEFAULT_CHALLENGE_STAKE_WEI,
            competition_id: None,
        }
    }
}

impl BootstrapParams {
    /// Read the parameters from a JSON file, or use the defaults if no file is
    /// given. The result is validated either way.
    pub fn load(path: Option<&Path>) -> Result<Self, ScriptError> {
        let params = match path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|e| {
                    ScriptError::InvalidParams(format!("{}: {}", path.display(), e))
                })?;
                serde_json::from_str(&contents).map_err(|e| {
                    ScriptError::InvalidParams(format!("{}: {}", path.display(), e))
                })?
            }
            None => Self::default(),
        };

        params.validate()?;
        Ok(params)
    }

    /// Check that the parameters describe a bootstrap that can run to completion
    pub fn validate(&self) -> Result<(), ScriptError> {
        if self.ability.is_empty() {
            return Err(ScriptError::InvalidParams(
                "the ability tag is empty".to_string(),
            ));
        }

        if self.mint_batches.is_empty() || self.mint_batches.contains(&0) {
            return Err(ScriptError::InvalidParams(
                "every mint batch must mint at least one robot".to_string(),
            ));
        }

        if self.competitors.len() != NUM_CHALLENGERS {
            return Err(ScriptError::InvalidParams(format!(
                "a challenge pairs {} robots, {} competitors given",
                NUM_CHALLENGERS,
                self.competitors.len()
            )));
        }

        let num_robots = self
            .mint_batches
            .iter()
            .try_fold(0u64, |acc, batch| acc.checked_add(*batch))
            .ok_or_else(|| {
                ScriptError::InvalidParams("mint batches overflow the robot count".to_string())
            })?;
        for competitor in &self.competitors {
            if competitor.program_index >= self.programs.len() {
                return Err(ScriptError::InvalidParams(format!(
                    "competitor binds program #{} but only {} programs are registered",
                    competitor.program_index,
                    self.programs.len()
                )));
            }
            if competitor.robot_index >= num_robots {
                return Err(ScriptError::InvalidParams(format!(
                    "competitor uses robot #{} but only {} robots are minted",
                    competitor.robot_index, num_robots
                )));
            }
        }

        if self.competitors[0].robot_index == self.competitors[1].robot_index {
            return Err(ScriptError::InvalidParams(
                "a robot cannot challenge itself".to_string(),
            ));
        }

        Ok(())
    }

    /// The stake paid when launching the challenge
    pub fn challenge_stake(&self) -> U256 {
        U256::from(self.challenge_stake_wei)
    }

    /// The challenger and the challenged robot
    pub fn challengers(&self) -> Result<(&Competitor, &Competitor), ScriptError> {
        match self.competitors.as_slice() {
            [a, b] => Ok((a, b)),
            other => Err(ScriptError::InvalidParams(format!(
                "a challenge pairs {} robots, {} competitors given",
                NUM_CHALLENGERS,
                other.len()
            ))),
        }
    }
}

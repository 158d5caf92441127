//! Typed handles on the deployed components
//!
//! A [`ContractHandle`] pairs a component with its address and the shared
//! ledger. The typed wrappers below expose exactly the operations each
//! component supports, so a stage can only issue calls its target understands.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use tracing::{debug, info};

use crate::{
    artifacts::Artifact,
    errors::{OperationError, ScriptError},
    ledger::SharedLedger,
    params::{DeveloperProfile, ProgramRegistration},
    solidity::{IDeveloper, IProgram, IRobocupCompetitionPlatform, IRobot},
    types::{CompetitionRecord, Component, Confirmation, DeployRequest, RemoteCall},
};

/// The operation name reported for contract creation
pub const CONSTRUCTOR_OPERATION: &str = "constructor";

/// The operation name reported for attaching to a recorded address
pub const ATTACH_OPERATION: &str = "attach";

/// A deployed or attached component
#[derive(Clone)]
pub struct ContractHandle {
    /// The component behind the address
    component: Component,
    /// The address the component lives at
    address: Address,
    /// The ledger calls are submitted through
    ledger: SharedLedger,
}

impl ContractHandle {
    /// Create the component and wait for its address to be confirmed.
    ///
    /// `dependencies` are the addresses of [`Component::dependencies`], in order.
    pub async fn deploy(
        ledger: SharedLedger,
        component: Component,
        artifact: &Artifact,
        dependencies: &[Address],
    ) -> Result<Self, OperationError> {
        let tag = |e| OperationError::new(component, CONSTRUCTOR_OPERATION, e);

        let expected = component.dependencies().len();
        if dependencies.len() != expected {
            return Err(tag(ScriptError::DeploymentFailure(format!(
                "{} takes {} constructor addresses, got {}",
                component,
                expected,
                dependencies.len()
            ))));
        }

        // Addresses are static ABI types, so each argument is one left-padded word
        let mut init_code = artifact.bytecode.to_vec();
        for dependency in dependencies {
            init_code.extend_from_slice(dependency.into_word().as_slice());
        }

        debug!(%component, "deploying");
        let deployed = ledger
            .deploy(DeployRequest {
                component,
                init_code: Bytes::from(init_code),
            })
            .await
            .map_err(tag)?;
        info!(
            %component,
            address = %deployed.address,
            tx_hash = %deployed.confirmation.tx_hash,
            "deployed"
        );

        Ok(Self {
            component,
            address: deployed.address,
            ledger,
        })
    }

    /// Wrap a known address, optionally checking that code is deployed there
    pub async fn attach(
        ledger: SharedLedger,
        component: Component,
        address: Address,
        verify_code: bool,
    ) -> Result<Self, OperationError> {
        let tag = |e| OperationError::new(component, ATTACH_OPERATION, e);

        if address == Address::ZERO {
            return Err(tag(ScriptError::InvalidAddress(format!(
                "{} cannot live at the zero address",
                component
            ))));
        }

        if verify_code && !ledger.has_code(address).await.map_err(tag)? {
            return Err(tag(ScriptError::InvalidAddress(format!(
                "no contract code at {} for {}",
                address, component
            ))));
        }

        info!(%component, %address, "attached");
        Ok(Self {
            component,
            address,
            ledger,
        })
    }

    /// The component behind this handle
    pub fn component(&self) -> Component {
        self.component
    }

    /// The address of the component
    pub fn address(&self) -> Address {
        self.address
    }

    /// Submit a mutating call, transferring `value` wei along with it.
    ///
    /// The signer's balance is read immediately before any value transfer and
    /// never reused across calls.
    pub async fn call<C: SolCall>(
        &self,
        call: C,
        value: U256,
    ) -> Result<Confirmation, OperationError> {
        let tag = |e| OperationError::new(self.component, C::SIGNATURE, e);
        self.check_funds(value).await.map_err(tag)?;

        debug!(component = %self.component, operation = C::SIGNATURE, %value, "submitting call");
        let confirmation = self
            .ledger
            .send(RemoteCall {
                to: self.address,
                input: Bytes::from(call.abi_encode()),
                value,
            })
            .await
            .map_err(tag)?;
        info!(
            component = %self.component,
            operation = C::SIGNATURE,
            tx_hash = %confirmation.tx_hash,
            "confirmed"
        );

        Ok(confirmation)
    }

    /// Submit a mutating call whose return value is needed afterwards.
    ///
    /// The call is simulated against the latest state right before it is
    /// submitted, and the simulated return is what the submitted call
    /// produces unless other activity lands in between.
    pub async fn call_returning<C: SolCall>(
        &self,
        call: C,
        value: U256,
    ) -> Result<(C::Return, Confirmation), OperationError> {
        let tag = |e| OperationError::new(self.component, C::SIGNATURE, e);
        self.check_funds(value).await.map_err(tag)?;

        let data = self
            .ledger
            .simulate(RemoteCall {
                to: self.address,
                input: Bytes::from(call.abi_encode()),
                value,
            })
            .await
            .map_err(tag)?;
        let ret = C::abi_decode_returns(&data, true)
            .map_err(|e| tag(ScriptError::Decoding(e.to_string())))?;

        let confirmation = self.call(call, value).await?;
        Ok((ret, confirmation))
    }

    /// Fail if the signer cannot cover `value`, reading the balance afresh
    async fn check_funds(&self, value: U256) -> Result<(), ScriptError> {
        if value.is_zero() {
            return Ok(());
        }

        let available = self.ledger.balance(self.ledger.signer_address()).await?;
        if value > available {
            return Err(ScriptError::InsufficientFunds {
                required: value,
                available,
            });
        }
        Ok(())
    }

    /// Execute a non-mutating call and decode its return values
    pub async fn view<C: SolCall>(&self, call: C) -> Result<C::Return, OperationError> {
        let tag = |e| OperationError::new(self.component, C::SIGNATURE, e);

        let data = self
            .ledger
            .view(self.address, Bytes::from(call.abi_encode()))
            .await
            .map_err(tag)?;
        C::abi_decode_returns(&data, true).map_err(|e| tag(ScriptError::Decoding(e.to_string())))
    }
}

/// Defines a typed wrapper around a [`ContractHandle`] for one component
macro_rules! typed_contract {
    ($(#[$doc:meta])* $name:ident, $component:expr) => {
        $(#[$doc])*
        #[derive(Clone)]
        pub struct $name(ContractHandle);

        impl $name {
            /// Wrap a handle, checking that it points at the right component
            pub fn new(handle: ContractHandle) -> Result<Self, OperationError> {
                if handle.component() != $component {
                    return Err(OperationError::new(
                        handle.component(),
                        ATTACH_OPERATION,
                        ScriptError::UnexpectedState(format!(
                            "expected a {} handle, got {}",
                            $component,
                            handle.component()
                        )),
                    ));
                }
                Ok(Self(handle))
            }

            /// The underlying handle
            pub fn handle(&self) -> &ContractHandle {
                &self.0
            }

            /// The address of the contract
            pub fn address(&self) -> Address {
                self.0.address()
            }
        }
    };
}

typed_contract!(
    /// The program token contract
    ProgramContract,
    Component::Program
);

typed_contract!(
    /// The developer registry contract
    DeveloperContract,
    Component::Developer
);

typed_contract!(
    /// The robot token contract
    RobotContract,
    Component::Robot
);

typed_contract!(
    /// The competition platform contract
    RobocupContract,
    Component::Robocup
);

impl ProgramContract {
    /// Point the program contract at the developer registry
    pub async fn set_dev_contract_addr(
        &self,
        developer: Address,
    ) -> Result<Confirmation, OperationError> {
        let call = IProgram::setDevContractAddrCall {
            devContract: developer,
        };
        self.0.call(call, U256::ZERO).await
    }

    /// Enable or disable an ability tag
    pub async fn set_support_ability(
        &self,
        ability: &str,
        supported: bool,
    ) -> Result<Confirmation, OperationError> {
        let call = IProgram::setSupportAbilityCall {
            ability: ability.to_string(),
            supported,
        };
        self.0.call(call, U256::ZERO).await
    }

    /// Set the initial number of an ability tag
    pub async fn set_ability_init_number(
        &self,
        ability: &str,
        init_number: U256,
    ) -> Result<Confirmation, OperationError> {
        let call = IProgram::setAbilityInitNumberCall {
            ability: ability.to_string(),
            initNumber: init_number,
        };
        self.0.call(call, U256::ZERO).await
    }

    /// Allow or revoke an operator over all of the signer's program tokens
    pub async fn set_approval_for_all(
        &self,
        operator: Address,
        approved: bool,
    ) -> Result<Confirmation, OperationError> {
        let call = IProgram::setApprovalForAllCall { operator, approved };
        self.0.call(call, U256::ZERO).await
    }

    /// The number of program tokens held by `owner`
    pub async fn get_user_token_number(&self, owner: Address) -> Result<U256, OperationError> {
        let ret = self
            .0
            .view(IProgram::getUserTokenNumberCall { owner })
            .await?;
        Ok(ret.count)
    }

    /// A page of the program token ids held by `owner`
    pub async fn get_user_token_ids(
        &self,
        owner: Address,
        offset: U256,
        count: U256,
    ) -> Result<Vec<U256>, OperationError> {
        let ret = self
            .0
            .view(IProgram::getUserTokenIdsCall {
                owner,
                offset,
                count,
            })
            .await?;
        Ok(ret.ids)
    }
}

impl DeveloperContract {
    /// Register the signer as a developer
    pub async fn register_dev(
        &self,
        profile: &DeveloperProfile,
    ) -> Result<Confirmation, OperationError> {
        let call = IDeveloper::registerDevCall {
            name: profile.name.clone(),
            bio: profile.bio.clone(),
            referrer: profile.referrer,
            flag: U256::from(profile.flag),
            imageUrl: profile.image_url.clone(),
            profileUrl: profile.profile_url.clone(),
        };
        self.0.call(call, U256::ZERO).await
    }

    /// Register a program, minting a program token to the signer
    pub async fn register_program(
        &self,
        ability: &str,
        program: &ProgramRegistration,
    ) -> Result<Confirmation, OperationError> {
        let call = IDeveloper::registerProgramCall {
            ability: ability.to_string(),
            level: U256::from(program.level),
            variant: U256::from(program.variant),
            codeHash: program.code_hash.clone(),
            description: program.description.clone(),
            url: program.url.clone(),
        };
        self.0.call(call, U256::ZERO).await
    }
}

impl RobotContract {
    /// Point the robot contract at the competition platform
    pub async fn set_robocup(&self, robocup: Address) -> Result<Confirmation, OperationError> {
        self.0
            .call(IRobot::setRobocupCall { robocup }, U256::ZERO)
            .await
    }

    /// The current price of minting `count` robots
    pub async fn get_current_price_to_mint(&self, count: U256) -> Result<U256, OperationError> {
        let ret = self
            .0
            .view(IRobot::getCurrentPriceToMintCall { count })
            .await?;
        Ok(ret.price)
    }

    /// The current refund for burning `count` robots
    pub async fn get_current_price_to_burn(&self, count: U256) -> Result<U256, OperationError> {
        let ret = self
            .0
            .view(IRobot::getCurrentPriceToBurnCall { count })
            .await?;
        Ok(ret.price)
    }

    /// Mint `count` robots, paying `amount` wei
    pub async fn mint(&self, count: U256, amount: U256) -> Result<Confirmation, OperationError> {
        self.0
            .call(IRobot::mintCall { count, amount }, amount)
            .await
    }

    /// The id of the `index`-th robot held by `owner`
    pub async fn token_of_owner_by_index(
        &self,
        owner: Address,
        index: U256,
    ) -> Result<U256, OperationError> {
        let ret = self
            .0
            .view(IRobot::tokenOfOwnerByIndexCall { owner, index })
            .await?;
        Ok(ret.tokenId)
    }

    /// Bind a program token to a robot
    pub async fn bind_program_to_robot(
        &self,
        program_id: U256,
        robot_id: U256,
    ) -> Result<Confirmation, OperationError> {
        let call = IRobot::bindProgram2RobotCall {
            programId: program_id,
            robotId: robot_id,
        };
        self.0.call(call, U256::ZERO).await
    }
}

impl RobocupContract {
    /// Whitelist or remove an emulation platform
    pub async fn set_emulate_platform(
        &self,
        platform: Address,
        enabled: bool,
    ) -> Result<Confirmation, OperationError> {
        let call = IRobocupCompetitionPlatform::setEmulatePlatformCall { platform, enabled };
        self.0.call(call, U256::ZERO).await
    }

    /// Whether the robot is registered as a competitor at the ability level
    pub async fn check_robot_contain_program(
        &self,
        robot_id: U256,
        ability_level: U256,
    ) -> Result<bool, OperationError> {
        let call = IRobocupCompetitionPlatform::checkRobotContainProgramCall {
            robotId: robot_id,
            abilityLevel: ability_level,
        };
        Ok(self.0.view(call).await?.contained)
    }

    /// Register the robot as a competitor at the ability level
    pub async fn add_expect_robot_with_program(
        &self,
        robot_id: U256,
        ability_level: U256,
    ) -> Result<Confirmation, OperationError> {
        let call = IRobocupCompetitionPlatform::addExpectRobotWithProgramCall {
            robotId: robot_id,
            abilityLevel: ability_level,
        };
        self.0.call(call, U256::ZERO).await
    }

    /// Launch a challenge between two robots, paying `stake` wei, and return
    /// the id of the competition it opens
    pub async fn launch_challenge(
        &self,
        robot_a: U256,
        level_a: U256,
        robot_b: U256,
        level_b: U256,
        stake: U256,
    ) -> Result<U256, OperationError> {
        let call = IRobocupCompetitionPlatform::launchChallengeCall {
            robotIdA: robot_a,
            levelA: level_a,
            robotIdB: robot_b,
            levelB: level_b,
        };
        let (ret, _) = self.0.call_returning(call, stake).await?;
        Ok(ret.competitionId)
    }

    /// Read a competition record by id
    pub async fn competition(&self, competition_id: U256) -> Result<CompetitionRecord, OperationError> {
        let ret = self
            .0
            .view(IRobocupCompetitionPlatform::tokenId2CompetitionMapCall {
                competitionId: competition_id,
            })
            .await?;

        Ok(CompetitionRecord {
            robot_a: ret.robotAId,
            level_a: ret.robotALevel,
            robot_b: ret.robotBId,
            level_b: ret.robotBLevel,
            stake: ret.stake,
            finished: ret.finished,
        })
    }
}

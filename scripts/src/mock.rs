//! A simulated ledger that runs the four components in memory
//!
//! Calldata is decoded with the same `sol!` bindings the handles encode with,
//! so the simulation exercises the exact bytes a live node would receive.
//! Every deploy, send and view is recorded, and failures can be injected for
//! any component operation.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::{Arc, Mutex},
};

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolInterface};
use async_trait::async_trait;
use serde_json::Value;
use tempfile::TempDir;

use crate::{
    artifacts::{Artifact, Artifacts},
    errors::ScriptError,
    handles::CONSTRUCTOR_OPERATION,
    ledger::{Ledger, SharedLedger},
    params::BootstrapParams,
    registry::{resolve_contracts, Deployments},
    stages::StageContext,
    solidity::{
        IDeveloper::{self, IDeveloperCalls},
        IProgram::{self, IProgramCalls},
        IRobocupCompetitionPlatform::{self, IRobocupCompetitionPlatformCalls},
        IRobot::{self, IRobotCalls},
    },
    types::{Component, Confirmation, DeployRequest, Deployed, DeploymentMode, RemoteCall},
};

/// The price of the first robot, in wei; each further robot costs one more
/// unit than the last
pub const BASE_ROBOT_PRICE: u128 = 1_000_000_000_000_000;

/// The balance the simulated signer starts with (100 ether)
pub const DEFAULT_SIGNER_BALANCE: u128 = 100_000_000_000_000_000_000;

/// The kind of a recorded ledger operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// A contract creation
    Deploy,
    /// A mutating call
    Send,
    /// A non-mutating read
    View,
    /// A call executed against the latest state without being submitted
    Simulate,
}

/// A ledger operation as observed by the simulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOp {
    /// The kind of operation
    pub kind: OpKind,
    /// The component the operation targeted
    pub component: Component,
    /// The Solidity signature of the operation, or `constructor`
    pub operation: &'static str,
    /// The calldata, or the init code of a creation
    pub input: Bytes,
    /// The value transferred with the operation
    pub value: U256,
}

/// A failure returned the next time an operation is attempted
#[derive(Clone)]
struct InjectedFailure {
    /// The component the operation targets
    component: Component,
    /// The signature of the operation
    operation: &'static str,
    /// The error to return
    error: ScriptError,
}

/// A program token
#[derive(Debug, Clone)]
struct ProgramToken {
    /// The holder of the token
    owner: Address,
    /// The ability level the program plays at
    level: U256,
}

/// A competition record, in the order the platform returns its fields
type CompetitionTuple = (U256, U256, U256, U256, U256, bool);

/// The simulated state of the network and the four components
#[derive(Clone, Default)]
struct MockState {
    /// Account balances in wei
    balances: HashMap<Address, U256>,
    /// The component deployed at each address
    contracts: HashMap<Address, Component>,
    /// The latest address of each component
    deployed: BTreeMap<Component, Address>,
    /// The number of confirmed transactions
    num_txs: u64,
    /// Every attempted operation
    ops: Vec<RecordedOp>,
    /// Pending injected failures
    failures: Vec<InjectedFailure>,

    /// The developer registry the program contract accepts registrations from
    dev_contract: Option<Address>,
    /// Ability tag to (supported, init number)
    abilities: HashMap<String, (bool, U256)>,
    /// Program tokens by id
    programs: BTreeMap<U256, ProgramToken>,
    /// (owner, operator) pairs approved over program tokens
    approvals: BTreeSet<(Address, Address)>,
    /// Registered developers
    developers: BTreeSet<Address>,
    /// The platform the robot contract is linked to
    robocup_contract: Option<Address>,
    /// Robot owners by robot id
    robots: BTreeMap<U256, Address>,
    /// Program ids by robot id
    bindings: BTreeMap<U256, U256>,
    /// Whitelisted emulation platforms
    emulate_platforms: BTreeSet<Address>,
    /// (robot id, level) pairs registered as competitors
    expected: BTreeSet<(U256, U256)>,
    /// Competition records by id
    competitions: BTreeMap<U256, CompetitionTuple>,
}

/// A [`Ledger`] simulating the components in memory
pub struct MockLedger {
    /// The address of the simulated signer
    signer: Address,
    /// The simulated state
    state: Mutex<MockState>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a revert error
fn revert(reason: &str) -> ScriptError {
    ScriptError::Reverted(reason.to_string())
}

impl MockLedger {
    /// A ledger whose signer holds [`DEFAULT_SIGNER_BALANCE`]
    pub fn new() -> Self {
        let signer = Address::repeat_byte(0xd0);
        let mut state = MockState::default();
        state
            .balances
            .insert(signer, U256::from(DEFAULT_SIGNER_BALANCE));

        Self {
            signer,
            state: Mutex::new(state),
        }
    }

    /// Overwrite the signer's balance
    pub fn set_balance(&self, balance: U256) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert(self.signer, balance);
    }

    /// Fail the next attempt of `operation` on `component` with `error`,
    /// leaving state untouched
    pub fn fail_on(&self, component: Component, operation: &'static str, error: ScriptError) {
        self.state.lock().unwrap().failures.push(InjectedFailure {
            component,
            operation,
            error,
        });
    }

    /// Every operation observed so far, in order
    pub fn ops(&self) -> Vec<RecordedOp> {
        self.state.lock().unwrap().ops.clone()
    }

    /// Forget the operations observed so far
    pub fn clear_ops(&self) {
        self.state.lock().unwrap().ops.clear();
    }

    /// The deploys and sends observed so far
    pub fn mutating_ops(&self) -> Vec<RecordedOp> {
        self.ops()
            .into_iter()
            .filter(|op| matches!(op.kind, OpKind::Deploy | OpKind::Send))
            .collect()
    }

    /// The number of submitted calls of an operation
    pub fn sent(&self, operation: &str) -> usize {
        self.ops()
            .iter()
            .filter(|op| op.kind == OpKind::Send && op.operation == operation)
            .count()
    }

    /// The number of observed attempts of an operation
    pub fn count(&self, operation: &str) -> usize {
        self.ops()
            .iter()
            .filter(|op| op.operation == operation)
            .count()
    }

    /// The address a component was last deployed at
    pub fn deployed(&self, component: Component) -> Option<Address> {
        self.state.lock().unwrap().deployed.get(&component).copied()
    }

    /// Hand `owner` a program token outside of any registration, as if it had
    /// been registered by an earlier run, returning its id
    pub fn grant_program(&self, owner: Address, level: U256) -> U256 {
        let mut state = self.state.lock().unwrap();
        let id = U256::from(state.programs.len() + 1);
        state.programs.insert(id, ProgramToken { owner, level });
        id
    }

    /// Place a component at an address without a creation, as if it had been
    /// deployed by an earlier run
    pub fn register_existing(&self, component: Component, address: Address) {
        let mut state = self.state.lock().unwrap();
        state.contracts.insert(address, component);
        state.deployed.insert(component, address);
    }
}

impl MockState {
    /// Record an attempted operation, returning an injected failure if one
    /// matches
    fn attempt(
        &mut self,
        kind: OpKind,
        component: Component,
        operation: &'static str,
        input: &[u8],
        value: U256,
    ) -> Result<(), ScriptError> {
        self.ops.push(RecordedOp {
            kind,
            component,
            operation,
            input: Bytes::copy_from_slice(input),
            value,
        });

        match self
            .failures
            .iter()
            .position(|f| f.component == component && f.operation == operation)
        {
            Some(i) => Err(self.failures.remove(i).error),
            None => Ok(()),
        }
    }

    /// The next transaction hash
    fn next_tx(&mut self) -> Confirmation {
        self.num_txs += 1;
        Confirmation {
            tx_hash: B256::from(U256::from(self.num_txs)),
            block_number: Some(self.num_txs),
        }
    }

    /// The component deployed at an address
    fn component_at(&self, address: Address) -> Result<Component, ScriptError> {
        self.contracts
            .get(&address)
            .copied()
            .ok_or_else(|| ScriptError::RemoteCallFailure(format!("no contract at {address}")))
    }

    /// The number of robots minted so far
    fn robot_supply(&self) -> u128 {
        self.robots.len() as u128
    }

    /// The price of minting `count` more robots
    fn mint_price(&self, count: U256) -> U256 {
        let supply = self.robot_supply();
        let count = count.to::<u128>();
        (0..count).fold(U256::ZERO, |acc, k| {
            acc + U256::from(BASE_ROBOT_PRICE * (supply + k + 1))
        })
    }

    /// The refund for burning `count` robots
    fn burn_price(&self, count: U256) -> U256 {
        let supply = self.robot_supply();
        let count = count.to::<u128>().min(supply);
        (0..count).fold(U256::ZERO, |acc, k| {
            acc + U256::from(BASE_ROBOT_PRICE * (supply - k) / 2)
        })
    }

    /// The ids of the program tokens held by `owner`, ascending
    fn owned_programs(&self, owner: Address) -> Vec<U256> {
        self.programs
            .iter()
            .filter(|(_, token)| token.owner == owner)
            .map(|(id, _)| *id)
            .collect()
    }

    /// The ids of the robots held by `owner`, ascending
    fn owned_robots(&self, owner: Address) -> Vec<U256> {
        self.robots
            .iter()
            .filter(|(_, o)| **o == owner)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Transfer `value` out of an account
    fn debit(&mut self, account: Address, value: U256) -> Result<(), ScriptError> {
        let balance = self.balances.entry(account).or_default();
        if *balance < value {
            return Err(ScriptError::RemoteCallFailure(
                "insufficient funds for transfer".to_string(),
            ));
        }
        *balance -= value;
        Ok(())
    }

    // ------------
    // | Dispatch |
    // ------------

    /// Execute a call against the program contract
    fn program(
        &mut self,
        kind: OpKind,
        from: Address,
        input: &[u8],
        value: U256,
    ) -> Result<Bytes, ScriptError> {
        let call = IProgramCalls::abi_decode(input, true)
            .map_err(|e| ScriptError::Decoding(e.to_string()))?;
        let operation = match &call {
            IProgramCalls::setDevContractAddr(_) => IProgram::setDevContractAddrCall::SIGNATURE,
            IProgramCalls::setSupportAbility(_) => IProgram::setSupportAbilityCall::SIGNATURE,
            IProgramCalls::setAbilityInitNumber(_) => {
                IProgram::setAbilityInitNumberCall::SIGNATURE
            }
            IProgramCalls::getUserTokenNumber(_) => IProgram::getUserTokenNumberCall::SIGNATURE,
            IProgramCalls::getUserTokenIds(_) => IProgram::getUserTokenIdsCall::SIGNATURE,
            IProgramCalls::setApprovalForAll(_) => IProgram::setApprovalForAllCall::SIGNATURE,
        };
        self.attempt(kind, Component::Program, operation, input, value)?;

        let ret = match call {
            IProgramCalls::setDevContractAddr(c) => {
                self.dev_contract = Some(c.devContract);
                vec![]
            }
            IProgramCalls::setSupportAbility(c) => {
                let entry = self.abilities.entry(c.ability).or_default();
                entry.0 = c.supported;
                vec![]
            }
            IProgramCalls::setAbilityInitNumber(c) => {
                match self.abilities.get_mut(&c.ability) {
                    Some(entry) if entry.0 => entry.1 = c.initNumber,
                    _ => return Err(revert("ability not supported")),
                }
                vec![]
            }
            IProgramCalls::getUserTokenNumber(c) => {
                let count = U256::from(self.owned_programs(c.owner).len());
                IProgram::getUserTokenNumberCall::abi_encode_returns(&(count,))
            }
            IProgramCalls::getUserTokenIds(c) => {
                let ids: Vec<U256> = self
                    .owned_programs(c.owner)
                    .into_iter()
                    .skip(c.offset.to::<usize>())
                    .take(c.count.to::<usize>())
                    .collect();
                IProgram::getUserTokenIdsCall::abi_encode_returns(&(ids,))
            }
            IProgramCalls::setApprovalForAll(c) => {
                if c.approved {
                    self.approvals.insert((from, c.operator));
                } else {
                    self.approvals.remove(&(from, c.operator));
                }
                vec![]
            }
        };

        Ok(Bytes::from(ret))
    }

    /// Execute a call against the developer registry
    fn developer(
        &mut self,
        kind: OpKind,
        from: Address,
        input: &[u8],
        value: U256,
    ) -> Result<Bytes, ScriptError> {
        let call = IDeveloperCalls::abi_decode(input, true)
            .map_err(|e| ScriptError::Decoding(e.to_string()))?;
        let operation = match &call {
            IDeveloperCalls::registerDev(_) => IDeveloper::registerDevCall::SIGNATURE,
            IDeveloperCalls::registerProgram(_) => IDeveloper::registerProgramCall::SIGNATURE,
        };
        self.attempt(kind, Component::Developer, operation, input, value)?;

        match call {
            IDeveloperCalls::registerDev(_) => {
                if !self.developers.insert(from) {
                    return Err(revert("developer already registered"));
                }
            }
            IDeveloperCalls::registerProgram(c) => {
                if !self.developers.contains(&from) {
                    return Err(revert("not a registered developer"));
                }
                if self.dev_contract != self.deployed.get(&Component::Developer).copied() {
                    return Err(revert("developer contract not authorized"));
                }
                if !self.abilities.get(&c.ability).is_some_and(|a| a.0) {
                    return Err(revert("ability not supported"));
                }

                let id = U256::from(self.programs.len() + 1);
                self.programs.insert(
                    id,
                    ProgramToken {
                        owner: from,
                        level: c.level,
                    },
                );
            }
        }

        Ok(Bytes::new())
    }

    /// Execute a call against the robot contract
    fn robot(
        &mut self,
        kind: OpKind,
        from: Address,
        input: &[u8],
        value: U256,
    ) -> Result<Bytes, ScriptError> {
        let call =
            IRobotCalls::abi_decode(input, true).map_err(|e| ScriptError::Decoding(e.to_string()))?;
        let operation = match &call {
            IRobotCalls::setRobocup(_) => IRobot::setRobocupCall::SIGNATURE,
            IRobotCalls::getCurrentPriceToMint(_) => IRobot::getCurrentPriceToMintCall::SIGNATURE,
            IRobotCalls::getCurrentPriceToBurn(_) => IRobot::getCurrentPriceToBurnCall::SIGNATURE,
            IRobotCalls::mint(_) => IRobot::mintCall::SIGNATURE,
            IRobotCalls::tokenOfOwnerByIndex(_) => IRobot::tokenOfOwnerByIndexCall::SIGNATURE,
            IRobotCalls::bindProgram2Robot(_) => IRobot::bindProgram2RobotCall::SIGNATURE,
        };
        self.attempt(kind, Component::Robot, operation, input, value)?;

        let ret = match call {
            IRobotCalls::setRobocup(c) => {
                self.robocup_contract = Some(c.robocup);
                vec![]
            }
            IRobotCalls::getCurrentPriceToMint(c) => {
                IRobot::getCurrentPriceToMintCall::abi_encode_returns(&(self.mint_price(c.count),))
            }
            IRobotCalls::getCurrentPriceToBurn(c) => {
                IRobot::getCurrentPriceToBurnCall::abi_encode_returns(&(self.burn_price(c.count),))
            }
            IRobotCalls::mint(c) => {
                if c.amount != value {
                    return Err(revert("amount does not match the value sent"));
                }
                if value < self.mint_price(c.count) {
                    return Err(revert("payment below the current mint price"));
                }
                self.debit(from, value)?;

                for _ in 0..c.count.to::<u64>() {
                    let id = U256::from(self.robots.len() + 1);
                    self.robots.insert(id, from);
                }
                vec![]
            }
            IRobotCalls::tokenOfOwnerByIndex(c) => {
                let id = self
                    .owned_robots(c.owner)
                    .get(c.index.to::<usize>())
                    .copied()
                    .ok_or_else(|| revert("owner index out of bounds"))?;
                IRobot::tokenOfOwnerByIndexCall::abi_encode_returns(&(id,))
            }
            IRobotCalls::bindProgram2Robot(c) => {
                let robot_contract = self
                    .deployed
                    .get(&Component::Robot)
                    .copied()
                    .unwrap_or_default();
                if self.robots.get(&c.robotId) != Some(&from) {
                    return Err(revert("caller does not own the robot"));
                }
                if self.programs.get(&c.programId).map(|p| p.owner) != Some(from) {
                    return Err(revert("caller does not own the program"));
                }
                if !self.approvals.contains(&(from, robot_contract)) {
                    return Err(revert("robot contract not approved for programs"));
                }
                if self.bindings.contains_key(&c.robotId) {
                    return Err(revert("robot already bound"));
                }
                self.bindings.insert(c.robotId, c.programId);
                vec![]
            }
        };

        Ok(Bytes::from(ret))
    }

    /// Execute a call against the competition platform
    fn robocup(
        &mut self,
        kind: OpKind,
        from: Address,
        input: &[u8],
        value: U256,
    ) -> Result<Bytes, ScriptError> {
        use IRobocupCompetitionPlatform as Platform;
        use IRobocupCompetitionPlatformCalls as Calls;

        let call = Calls::abi_decode(input, true).map_err(|e| ScriptError::Decoding(e.to_string()))?;
        let operation = match &call {
            Calls::setEmulatePlatform(_) => Platform::setEmulatePlatformCall::SIGNATURE,
            Calls::checkRobotContainProgram(_) => Platform::checkRobotContainProgramCall::SIGNATURE,
            Calls::addExpectRobotWithProgram(_) => {
                Platform::addExpectRobotWithProgramCall::SIGNATURE
            }
            Calls::launchChallenge(_) => Platform::launchChallengeCall::SIGNATURE,
            Calls::tokenId2CompetitionMap(_) => Platform::tokenId2CompetitionMapCall::SIGNATURE,
        };
        self.attempt(kind, Component::Robocup, operation, input, value)?;

        let ret = match call {
            Calls::setEmulatePlatform(c) => {
                if c.enabled {
                    self.emulate_platforms.insert(c.platform);
                } else {
                    self.emulate_platforms.remove(&c.platform);
                }
                vec![]
            }
            Calls::checkRobotContainProgram(c) => {
                let contained = self.expected.contains(&(c.robotId, c.abilityLevel));
                Platform::checkRobotContainProgramCall::abi_encode_returns(&(contained,))
            }
            Calls::addExpectRobotWithProgram(c) => {
                if self.robots.get(&c.robotId) != Some(&from) {
                    return Err(revert("caller does not own the robot"));
                }
                let bound = self
                    .bindings
                    .get(&c.robotId)
                    .and_then(|id| self.programs.get(id));
                if bound.is_none() {
                    return Err(revert("robot has no program"));
                }
                if !self.expected.insert((c.robotId, c.abilityLevel)) {
                    return Err(revert("robot already expected at this level"));
                }
                vec![]
            }
            Calls::launchChallenge(c) => {
                if self.robocup_contract != self.deployed.get(&Component::Robocup).copied() {
                    return Err(revert("robot contract not linked to the platform"));
                }
                if self.emulate_platforms.is_empty() {
                    return Err(revert("no emulation platform"));
                }
                if !self.expected.contains(&(c.robotIdA, c.levelA))
                    || !self.expected.contains(&(c.robotIdB, c.levelB))
                {
                    return Err(revert("robot not registered at level"));
                }
                if value.is_zero() {
                    return Err(revert("challenge requires a stake"));
                }
                self.debit(from, value)?;

                let id = U256::from(self.competitions.len() + 1);
                self.competitions
                    .insert(id, (c.robotIdA, c.levelA, c.robotIdB, c.levelB, value, false));
                Platform::launchChallengeCall::abi_encode_returns(&(id,))
            }
            Calls::tokenId2CompetitionMap(c) => {
                let record = self
                    .competitions
                    .get(&c.competitionId)
                    .copied()
                    .unwrap_or_default();
                Platform::tokenId2CompetitionMapCall::abi_encode_returns(&record)
            }
        };

        Ok(Bytes::from(ret))
    }

    /// Execute a call against whichever component lives at `to`
    fn dispatch(
        &mut self,
        kind: OpKind,
        from: Address,
        to: Address,
        input: &[u8],
        value: U256,
    ) -> Result<Bytes, ScriptError> {
        match self.component_at(to)? {
            Component::Program => self.program(kind, from, input, value),
            Component::Developer => self.developer(kind, from, input, value),
            Component::Robot => self.robot(kind, from, input, value),
            Component::Robocup => self.robocup(kind, from, input, value),
        }
    }
}

/// The configuration the bootstrap writes to the components, excluding
/// balances & token supplies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    /// The developer registry linked to the program contract
    pub dev_contract: Option<Address>,
    /// Ability tag to (supported, init number)
    pub abilities: BTreeMap<String, (bool, U256)>,
    /// The platform linked to the robot contract
    pub robocup_contract: Option<Address>,
    /// Whitelisted emulation platforms
    pub emulate_platforms: BTreeSet<Address>,
    /// Program ids by robot id
    pub bindings: BTreeMap<U256, U256>,
    /// (robot id, level) pairs registered as competitors
    pub expected: BTreeSet<(U256, U256)>,
}

/// Capture the configuration of the components, for comparing across runs
pub fn config_snapshot(ledger: &MockLedger) -> ConfigSnapshot {
    let state = ledger.state.lock().unwrap();
    ConfigSnapshot {
        dev_contract: state.dev_contract,
        abilities: state
            .abilities
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect(),
        robocup_contract: state.robocup_contract,
        emulate_platforms: state.emulate_platforms.clone(),
        bindings: state.bindings.clone(),
        expected: state.expected.clone(),
    }
}

/// The level of a program token, for assertions
pub fn program_level(ledger: &MockLedger, program_id: U256) -> Option<U256> {
    ledger
        .state
        .lock()
        .unwrap()
        .programs
        .get(&program_id)
        .map(|p| p.level)
}

/// The program bound to a robot, for assertions
pub fn bound_program(ledger: &MockLedger, robot_id: U256) -> Option<U256> {
    ledger
        .state
        .lock()
        .unwrap()
        .bindings
        .get(&robot_id)
        .copied()
}

#[async_trait]
impl Ledger for MockLedger {
    fn signer_address(&self) -> Address {
        self.signer
    }

    async fn balance(&self, account: Address) -> Result<U256, ScriptError> {
        let state = self.state.lock().unwrap();
        Ok(state.balances.get(&account).copied().unwrap_or_default())
    }

    async fn has_code(&self, address: Address) -> Result<bool, ScriptError> {
        Ok(self.state.lock().unwrap().contracts.contains_key(&address))
    }

    async fn deploy(&self, request: DeployRequest) -> Result<Deployed, ScriptError> {
        let mut state = self.state.lock().unwrap();
        let component = request.component;
        state.attempt(
            OpKind::Deploy,
            component,
            CONSTRUCTOR_OPERATION,
            &request.init_code,
            U256::ZERO,
        )?;

        // Constructor arguments are the trailing words of the init code
        let dependencies = component.dependencies();
        let args_len = dependencies.len() * 32;
        if request.init_code.len() <= args_len {
            return Err(ScriptError::DeploymentFailure(format!(
                "{component}: init code too short"
            )));
        }
        let args = &request.init_code[request.init_code.len() - args_len..];
        for (word, dependency) in args.chunks(32).zip(dependencies) {
            let address = Address::from_word(B256::from_slice(word));
            if state.contracts.get(&address) != Some(dependency) {
                return Err(ScriptError::DeploymentFailure(format!(
                    "{component}: constructor expects {dependency} at {address}"
                )));
            }
        }

        let confirmation = state.next_tx();
        let address = Address::from_word(B256::from(U256::from(0xc0de_0000 + state.num_txs)));
        state.contracts.insert(address, component);
        state.deployed.insert(component, address);

        Ok(Deployed {
            address,
            confirmation,
        })
    }

    async fn send(&self, call: RemoteCall) -> Result<Confirmation, ScriptError> {
        let mut state = self.state.lock().unwrap();
        state.dispatch(OpKind::Send, self.signer, call.to, &call.input, call.value)?;
        Ok(state.next_tx())
    }

    async fn view(&self, to: Address, input: Bytes) -> Result<Bytes, ScriptError> {
        let mut state = self.state.lock().unwrap();
        state.dispatch(OpKind::View, self.signer, to, &input, U256::ZERO)
    }

    async fn simulate(&self, call: RemoteCall) -> Result<Bytes, ScriptError> {
        let mut state = self.state.lock().unwrap();

        // Run against a scratch copy, keeping only the record of the attempt
        let mut scratch = state.clone();
        let result = scratch.dispatch(
            OpKind::Simulate,
            self.signer,
            call.to,
            &call.input,
            call.value,
        );
        state.ops = scratch.ops;
        state.failures = scratch.failures;

        result
    }
}

// ------------
// | Fixtures |
// ------------

/// Artifacts with placeholder bytecode for every component
pub fn mock_artifacts() -> Artifacts {
    let mut artifacts = Artifacts::default();
    for component in Component::DEPLOYMENT_ORDER {
        artifacts.insert(
            component,
            Artifact {
                contract_name: component.contract_name().to_string(),
                abi: Value::Array(vec![]),
                bytecode: Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]),
            },
        );
    }
    artifacts
}

/// Deploy every component on a fresh simulated ledger, returning the ledger,
/// the stage context and the directory holding the deployments file
pub async fn setup_context() -> eyre::Result<(Arc<MockLedger>, StageContext, TempDir)> {
    let mock = Arc::new(MockLedger::new());
    let ledger: SharedLedger = mock.clone();

    let dir = tempfile::tempdir()?;
    let mut deployments = Deployments::load(&dir.path().join("deployments.json"))?;
    let contracts = resolve_contracts(
        &ledger,
        DeploymentMode::Deploy,
        &mut deployments,
        Some(&mock_artifacts()),
        true, /* verify_code */
    )
    .await?;

    let ctx = StageContext {
        contracts,
        deployer: mock.signer_address(),
        params: BootstrapParams::default(),
    };
    mock.clear_ops();

    Ok((mock, ctx, dir))
}

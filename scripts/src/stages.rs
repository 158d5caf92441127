//! The bootstrap stage table
//!
//! Each stage is a fixed sequence of remote operations against the resolved
//! contracts. Stages never carry values between each other: anything a stage
//! needs (token ids, prices) is read from remote state inside the stage,
//! immediately before it is used, so a run can start from any stage.

use std::fmt::{self, Display};

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use tracing::{debug, info, warn};

use crate::{
    errors::{OperationError, ScriptError},
    params::BootstrapParams,
    registry::Contracts,
    solidity::{IProgram, IRobocupCompetitionPlatform},
    types::{Component, Idempotence},
};

/// Everything a stage executes against
#[derive(Clone)]
pub struct StageContext {
    /// The resolved contracts
    pub contracts: Contracts,
    /// The signer that owns every token created during bootstrap
    pub deployer: Address,
    /// The values registered during bootstrap
    pub params: BootstrapParams,
}

/// The bootstrap stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Link the program contract to the developer registry and enable the
    /// bootstrap ability
    ConfigureProgram,
    /// Register the signer as a developer along with its programs
    RegisterDeveloper,
    /// Link the robot contract to the competition platform and whitelist the
    /// emulation platform
    ConfigurePlatform,
    /// Mint robots at the current price
    MintRobots,
    /// Bind a program to each competing robot
    BindPrograms,
    /// Register each competing robot at its level
    RegisterCompetitors,
    /// Launch a challenge between the competing robots
    LaunchChallenge,
}

/// The result of a completed stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage issued its mutating calls
    Applied,
    /// The stage's guard found its effects already present and issued no
    /// mutating calls
    AlreadySatisfied,
}

impl Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOutcome::Applied => write!(f, "applied"),
            StageOutcome::AlreadySatisfied => write!(f, "already satisfied"),
        }
    }
}

impl StageId {
    /// Every stage, indexed by its position in the table
    pub const ALL: [StageId; 7] = [
        StageId::ConfigureProgram,
        StageId::RegisterDeveloper,
        StageId::ConfigurePlatform,
        StageId::MintRobots,
        StageId::BindPrograms,
        StageId::RegisterCompetitors,
        StageId::LaunchChallenge,
    ];

    /// The position of the stage in the table
    pub fn index(&self) -> usize {
        match self {
            StageId::ConfigureProgram => 0,
            StageId::RegisterDeveloper => 1,
            StageId::ConfigurePlatform => 2,
            StageId::MintRobots => 3,
            StageId::BindPrograms => 4,
            StageId::RegisterCompetitors => 5,
            StageId::LaunchChallenge => 6,
        }
    }

    /// The human-readable label of the stage
    pub fn label(&self) -> &'static str {
        match self {
            StageId::ConfigureProgram => "configure-program",
            StageId::RegisterDeveloper => "register-developer",
            StageId::ConfigurePlatform => "configure-platform",
            StageId::MintRobots => "mint-robots",
            StageId::BindPrograms => "bind-programs",
            StageId::RegisterCompetitors => "register-competitors",
            StageId::LaunchChallenge => "launch-challenge",
        }
    }

    /// Whether the stage may be executed again once its effects have landed
    pub fn idempotence(&self) -> Idempotence {
        match self {
            StageId::ConfigureProgram | StageId::ConfigurePlatform => Idempotence::SafeToRerun,
            StageId::RegisterCompetitors => Idempotence::Guarded,
            StageId::RegisterDeveloper
            | StageId::MintRobots
            | StageId::BindPrograms
            | StageId::LaunchChallenge => Idempotence::Unsafe,
        }
    }

    /// Execute the stage's operations in order, stopping at the first failure
    pub async fn execute(&self, ctx: &StageContext) -> Result<StageOutcome, OperationError> {
        if self.idempotence() == Idempotence::Unsafe {
            warn!(
                stage = self.label(),
                "executing a stage whose effects are duplicated if it is run again"
            );
        }

        match self {
            StageId::ConfigureProgram => configure_program(ctx).await,
            StageId::RegisterDeveloper => register_developer(ctx).await,
            StageId::ConfigurePlatform => configure_platform(ctx).await,
            StageId::MintRobots => mint_robots(ctx).await,
            StageId::BindPrograms => bind_programs(ctx).await,
            StageId::RegisterCompetitors => register_competitors(ctx).await,
            StageId::LaunchChallenge => launch_challenge(ctx).await,
        }
    }
}

impl Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ----------
// | Stages |
// ----------

/// Link the program contract to the developer registry and enable the ability
async fn configure_program(ctx: &StageContext) -> Result<StageOutcome, OperationError> {
    let program = &ctx.contracts.program;
    let ability = &ctx.params.ability;

    program
        .set_dev_contract_addr(ctx.contracts.developer.address())
        .await?;
    program.set_support_ability(ability, true).await?;
    program
        .set_ability_init_number(ability, U256::from(ctx.params.ability_init_number))
        .await?;

    Ok(StageOutcome::Applied)
}

/// Register the developer profile and every program, then read back the
/// program tokens the signer now holds
async fn register_developer(ctx: &StageContext) -> Result<StageOutcome, OperationError> {
    let developer = &ctx.contracts.developer;
    let program = &ctx.contracts.program;

    developer.register_dev(&ctx.params.developer).await?;
    for registration in &ctx.params.programs {
        developer
            .register_program(&ctx.params.ability, registration)
            .await?;
    }

    // The deployer may hold programs from earlier runs, so the read is capped
    // at the programs this stage registers
    let count = program.get_user_token_number(ctx.deployer).await?;
    let page = count.min(U256::from(ctx.params.programs.len()));
    let ids = program
        .get_user_token_ids(ctx.deployer, U256::ZERO, page)
        .await?;
    info!(%count, ?ids, "program tokens held by the deployer");

    Ok(StageOutcome::Applied)
}

/// Link the robot contract to the competition platform and whitelist the
/// emulation platform
async fn configure_platform(ctx: &StageContext) -> Result<StageOutcome, OperationError> {
    let robocup = &ctx.contracts.robocup;

    ctx.contracts.robot.set_robocup(robocup.address()).await?;
    robocup
        .set_emulate_platform(ctx.params.emulate_platform, true)
        .await?;

    Ok(StageOutcome::Applied)
}

/// Mint every batch of robots, paying the price read right before each mint
async fn mint_robots(ctx: &StageContext) -> Result<StageOutcome, OperationError> {
    let robot = &ctx.contracts.robot;

    for batch in &ctx.params.mint_batches {
        let count = U256::from(*batch);
        // The price moves with the supply, so each batch reads its own
        let price = robot.get_current_price_to_mint(count).await?;
        info!(%count, %price, "minting robots");
        robot.mint(count, price).await?;
    }

    let burn_price = robot.get_current_price_to_burn(U256::from(1)).await?;
    debug!(%burn_price, "current refund for burning one robot");

    Ok(StageOutcome::Applied)
}

/// Approve the robot contract over the signer's programs and bind a program
/// to each competing robot
async fn bind_programs(ctx: &StageContext) -> Result<StageOutcome, OperationError> {
    let program = &ctx.contracts.program;
    let robot = &ctx.contracts.robot;

    program.set_approval_for_all(robot.address(), true).await?;

    let num_programs = U256::from(ctx.params.programs.len());
    let program_ids = program
        .get_user_token_ids(ctx.deployer, U256::ZERO, num_programs)
        .await?;

    for competitor in &ctx.params.competitors {
        let program_id = program_ids
            .get(competitor.program_index)
            .copied()
            .ok_or_else(|| {
                OperationError::new(
                    Component::Program,
                    IProgram::getUserTokenIdsCall::SIGNATURE,
                    ScriptError::UnexpectedState(format!(
                        "deployer holds {} program tokens, program #{} is not among them",
                        program_ids.len(),
                        competitor.program_index
                    )),
                )
            })?;
        let robot_id = robot
            .token_of_owner_by_index(ctx.deployer, U256::from(competitor.robot_index))
            .await?;

        info!(%program_id, %robot_id, "binding program to robot");
        robot.bind_program_to_robot(program_id, robot_id).await?;
    }

    Ok(StageOutcome::Applied)
}

/// Register each competing robot at its level, skipping robots the platform
/// already accepts at that level
async fn register_competitors(ctx: &StageContext) -> Result<StageOutcome, OperationError> {
    let robot = &ctx.contracts.robot;
    let robocup = &ctx.contracts.robocup;

    let mut outcome = StageOutcome::AlreadySatisfied;
    for competitor in &ctx.params.competitors {
        let robot_id = robot
            .token_of_owner_by_index(ctx.deployer, U256::from(competitor.robot_index))
            .await?;
        let level = U256::from(competitor.level);

        if robocup.check_robot_contain_program(robot_id, level).await? {
            debug!(%robot_id, %level, "robot already registered");
            continue;
        }

        robocup
            .add_expect_robot_with_program(robot_id, level)
            .await?;
        outcome = StageOutcome::Applied;
    }

    Ok(outcome)
}

/// Launch a challenge between the competing robots and read back the
/// resulting competition record
async fn launch_challenge(ctx: &StageContext) -> Result<StageOutcome, OperationError> {
    let robot = &ctx.contracts.robot;
    let robocup = &ctx.contracts.robocup;

    let (challenger, challenged) = ctx.params.challengers().map_err(|e| {
        OperationError::new(
            Component::Robocup,
            IRobocupCompetitionPlatform::launchChallengeCall::SIGNATURE,
            e,
        )
    })?;

    let robot_a = robot
        .token_of_owner_by_index(ctx.deployer, U256::from(challenger.robot_index))
        .await?;
    let robot_b = robot
        .token_of_owner_by_index(ctx.deployer, U256::from(challenged.robot_index))
        .await?;
    let level_a = U256::from(challenger.level);
    let level_b = U256::from(challenged.level);

    let stake = ctx.params.challenge_stake();
    info!(%robot_a, %level_a, %robot_b, %level_b, %stake, "launching challenge");
    let launched_id = robocup
        .launch_challenge(robot_a, level_a, robot_b, level_b, stake)
        .await?;
    info!(competition_id = %launched_id, "challenge launched");

    let competition_id = match ctx.params.competition_id {
        Some(id) => U256::from(id),
        None => launched_id,
    };
    let record = robocup.competition(competition_id).await?;
    if record.pairs(robot_a, level_a, robot_b, level_b) {
        info!(%competition_id, ?record, "challenge recorded");
    } else {
        // Rerunning would launch a second challenge, so this is reported but
        // does not fail the run
        warn!(
            %competition_id,
            ?record,
            "competition record does not match the launched challenge"
        );
    }

    Ok(StageOutcome::Applied)
}

//! The end-to-end scenario: deploy every component, run the full bootstrap and
//! check the resulting remote state

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use eyre::{ensure, eyre, Result};
use tracing::info;

use crate::{
    artifacts::Artifacts,
    constants::FIRST_COMPETITION_ID,
    ledger::SharedLedger,
    orchestrator::{Orchestrator, RunResult},
    params::BootstrapParams,
    registry::{resolve_contracts, Deployments},
    stages::StageContext,
    types::{CompetitionRecord, Component, DeploymentMode},
};

/// Whether a competing robot is registered at its level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eligibility {
    /// The robot
    pub robot_id: U256,
    /// The level the robot competes at
    pub level: U256,
    /// Whether the platform accepts the robot at the level
    pub eligible: bool,
}

/// The remote state observed at the end of the scenario
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    /// The address of every component
    pub addresses: BTreeMap<Component, Address>,
    /// The result of the bootstrap run
    pub run: RunResult,
    /// The number of program tokens the deployer holds
    pub program_count: U256,
    /// The ids of the deployer's program tokens
    pub program_ids: Vec<U256>,
    /// The ids of the competing robots, challenger first
    pub robot_ids: Vec<U256>,
    /// The eligibility of each competing robot
    pub eligibility: Vec<Eligibility>,
    /// The competition record read back after the challenge
    pub competition: CompetitionRecord,
}

/// Deploy fresh contracts, run every stage and verify the outcome
pub async fn run_scenario(
    ledger: SharedLedger,
    artifacts: &Artifacts,
    deployments: &mut Deployments,
    params: BootstrapParams,
) -> Result<ScenarioReport> {
    params.validate()?;

    let contracts = resolve_contracts(
        &ledger,
        DeploymentMode::Deploy,
        deployments,
        Some(artifacts),
        false, /* verify_code */
    )
    .await?;

    let ctx = StageContext {
        contracts: contracts.clone(),
        deployer: ledger.signer_address(),
        params,
    };
    let run = Orchestrator::bootstrap().run(0 /* cursor */, &ctx).await?;
    if let Some(failure) = &run.failure {
        return Err(eyre!("scenario aborted: {failure}"));
    }

    let deployer = ctx.deployer;
    let params = &ctx.params;

    let program_count = contracts.program.get_user_token_number(deployer).await?;
    let program_ids = contracts
        .program
        .get_user_token_ids(deployer, U256::ZERO, U256::from(params.programs.len()))
        .await?;
    ensure!(
        program_count == U256::from(params.programs.len()),
        "deployer holds {program_count} program tokens, expected {}",
        params.programs.len()
    );
    ensure!(
        program_ids.windows(2).all(|w| w[0] < w[1]),
        "program ids {program_ids:?} are not distinct and ascending"
    );

    let mut robot_ids = Vec::with_capacity(params.competitors.len());
    let mut eligibility = Vec::with_capacity(params.competitors.len());
    for competitor in &params.competitors {
        let robot_id = contracts
            .robot
            .token_of_owner_by_index(deployer, U256::from(competitor.robot_index))
            .await?;
        let level = U256::from(competitor.level);
        let eligible = contracts
            .robocup
            .check_robot_contain_program(robot_id, level)
            .await?;
        ensure!(eligible, "robot {robot_id} is not registered at level {level}");

        robot_ids.push(robot_id);
        eligibility.push(Eligibility {
            robot_id,
            level,
            eligible,
        });
    }

    // The platform is fresh, so the challenge opened the first competition
    let competition_id = params.competition_id.unwrap_or(FIRST_COMPETITION_ID);
    let competition = contracts
        .robocup
        .competition(U256::from(competition_id))
        .await?;
    ensure!(
        competition.pairs(
            eligibility[0].robot_id,
            eligibility[0].level,
            eligibility[1].robot_id,
            eligibility[1].level,
        ),
        "competition {competition_id} records {competition:?}, not the launched challenge"
    );

    info!(
        %program_count,
        ?program_ids,
        ?robot_ids,
        ?competition,
        "scenario complete"
    );

    Ok(ScenarioReport {
        addresses: contracts.addresses(),
        run,
        program_count,
        program_ids,
        robot_ids,
        eligibility,
        competition,
    })
}

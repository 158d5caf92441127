//! Implementations of the various deploy scripts

use eyre::{eyre, Result};
use tracing::{error, info, warn};

use crate::{
    artifacts::Artifacts,
    cli::{BootstrapArgs, DeployArgs, Network, NetworkArgs, ScenarioArgs},
    ledger::SharedLedger,
    orchestrator::Orchestrator,
    params::BootstrapParams,
    registry::{resolve_contracts, Deployments},
    scenario::run_scenario,
    stages::StageContext,
    types::DeploymentMode,
    utils::{log_deployer, setup_ledger, write_frontend_files},
};

/// Connect to the node selected by the network arguments
async fn connect(args: &NetworkArgs) -> Result<SharedLedger> {
    let rpc_url = args.rpc_url()?;
    info!(network = %args.network, %rpc_url, "connecting");

    let ledger = setup_ledger(&args.priv_key, &rpc_url, args.confirmation_timeout()).await?;
    log_deployer(&ledger).await?;
    Ok(ledger)
}

/// Deploy every component (or only the unrecorded ones), then optionally
/// export the front-end files
pub async fn deploy(args: DeployArgs) -> Result<()> {
    let artifacts = Artifacts::load_dir(&args.artifacts)?;
    let mut deployments = Deployments::load(&args.network.deployments_path())?;
    let mode = if args.missing_only {
        DeploymentMode::DeployMissing
    } else {
        DeploymentMode::Deploy
    };

    let ledger = connect(&args.network).await?;
    let contracts = resolve_contracts(
        &ledger,
        mode,
        &mut deployments,
        Some(&artifacts),
        true, /* verify_code */
    )
    .await?;

    for (component, address) in contracts.addresses() {
        info!(%component, %address, "deployment");
    }
    info!(path = %deployments.path().display(), "addresses recorded");

    if let Some(dir) = &args.frontend_dir {
        write_frontend_files(dir, &contracts.addresses(), &artifacts)?;
    }

    Ok(())
}

/// Resolve the contracts and run the bootstrap stages from the cursor
pub async fn bootstrap(args: BootstrapArgs) -> Result<()> {
    // Everything that can be checked locally is checked before connecting
    let orchestrator = Orchestrator::bootstrap();
    orchestrator.check_cursor(args.start_from)?;
    let params = BootstrapParams::load(args.params.as_deref())?;
    let mut deployments = Deployments::load(&args.network.deployments_path())?;
    let artifacts = match (&args.artifacts, args.mode) {
        (Some(dir), _) => Some(Artifacts::load_dir(dir)?),
        (None, DeploymentMode::Attach) => None,
        (None, mode) => return Err(eyre!("`--mode {mode}` requires `--artifacts`")),
    };

    if args.network.network == Network::Devnet && args.mode == DeploymentMode::Attach {
        warn!("attaching on the devnet, recorded addresses are stale if the node was restarted");
    }

    let ledger = connect(&args.network).await?;
    let contracts = resolve_contracts(
        &ledger,
        args.mode,
        &mut deployments,
        artifacts.as_ref(),
        !args.no_verify_code,
    )
    .await?;

    let ctx = StageContext {
        contracts,
        deployer: ledger.signer_address(),
        params,
    };
    let result = orchestrator.run(args.start_from, &ctx).await?;

    for report in &result.stages {
        let outcome = report.outcome.map(|o| o.to_string()).unwrap_or_default();
        info!(
            index = report.stage.index(),
            stage = report.stage.label(),
            state = %report.state,
            %outcome,
            "stage report"
        );
    }

    match result.into_result() {
        Ok(last) => {
            info!(last_completed_stage = ?last, "bootstrap complete");
            Ok(())
        }
        Err(failure) => {
            error!(
                stage = failure.label,
                component = %failure.cause.component,
                operation = failure.cause.operation,
                error = %failure.cause.error,
                "bootstrap aborted, resume with `--start-from {}`",
                failure.index
            );
            Err(failure.into())
        }
    }
}

/// Print the stage table
pub fn print_stages() {
    println!("{}", Orchestrator::bootstrap().describe());
}

/// Run the end-to-end scenario against a fresh deployment
pub async fn scenario(args: ScenarioArgs) -> Result<()> {
    if args.network.network != Network::Devnet {
        warn!(network = %args.network.network, "running the scenario outside the devnet");
    }

    let artifacts = Artifacts::load_dir(&args.artifacts)?;
    let params = BootstrapParams::load(args.params.as_deref())?;
    let mut deployments = Deployments::load(&args.network.deployments_path())?;

    let ledger = connect(&args.network).await?;
    let report = run_scenario(ledger, &artifacts, &mut deployments, params).await?;

    for (component, address) in &report.addresses {
        info!(%component, %address, "deployment");
    }
    info!(
        program_count = %report.program_count,
        program_ids = ?report.program_ids,
        robot_ids = ?report.robot_ids,
        competition = ?report.competition,
        "scenario passed"
    );

    Ok(())
}

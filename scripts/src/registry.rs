//! Resolution of the component handles for a run, by attaching to recorded
//! addresses or deploying fresh contracts

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use alloy_primitives::Address;
use itertools::Itertools;
use tracing::{info, warn};

use crate::{
    artifacts::Artifacts,
    errors::{OperationError, ScriptError},
    handles::{
        ContractHandle, DeveloperContract, ProgramContract, RobocupContract, RobotContract,
        ATTACH_OPERATION, CONSTRUCTOR_OPERATION,
    },
    ledger::SharedLedger,
    types::{Component, DeploymentMode},
    utils::{parse_addrs_from_deployments_file, write_deployed_address},
};

/// The addresses recorded in a deployments file
#[derive(Debug, Clone)]
pub struct Deployments {
    /// The path of the deployments file
    path: PathBuf,
    /// The recorded address of each component
    addresses: BTreeMap<Component, Address>,
}

impl Deployments {
    /// Read the deployments file; a missing file records nothing
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let addresses = parse_addrs_from_deployments_file(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            addresses,
        })
    }

    /// The path of the deployments file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The recorded address of a component
    pub fn get(&self, component: Component) -> Option<Address> {
        self.addresses.get(&component).copied()
    }

    /// Record a freshly deployed address, writing it through to disk
    pub fn record(&mut self, component: Component, address: Address) -> Result<(), ScriptError> {
        write_deployed_address(&self.path, component, address)?;
        self.addresses.insert(component, address);
        Ok(())
    }
}

/// The handles of all four components
#[derive(Clone)]
pub struct Contracts {
    /// The program token contract
    pub program: ProgramContract,
    /// The developer registry contract
    pub developer: DeveloperContract,
    /// The robot token contract
    pub robot: RobotContract,
    /// The competition platform contract
    pub robocup: RobocupContract,
}

impl Contracts {
    /// The address of every component
    pub fn addresses(&self) -> BTreeMap<Component, Address> {
        BTreeMap::from([
            (Component::Program, self.program.address()),
            (Component::Developer, self.developer.address()),
            (Component::Robot, self.robot.address()),
            (Component::Robocup, self.robocup.address()),
        ])
    }

    /// Assemble the typed contracts from one handle per component
    fn from_handles(
        mut handles: BTreeMap<Component, ContractHandle>,
    ) -> Result<Self, OperationError> {
        let mut take = |component: Component| {
            handles.remove(&component).ok_or_else(|| {
                OperationError::new(
                    component,
                    ATTACH_OPERATION,
                    ScriptError::MissingAddress(component),
                )
            })
        };

        Ok(Self {
            program: ProgramContract::new(take(Component::Program)?)?,
            developer: DeveloperContract::new(take(Component::Developer)?)?,
            robot: RobotContract::new(take(Component::Robot)?)?,
            robocup: RobocupContract::new(take(Component::Robocup)?)?,
        })
    }
}

/// Obtains the handles of every component according to the deployment mode.
///
/// Every configuration problem (a missing address in attach mode, a recorded
/// component whose dependency is not recorded) is reported before any remote
/// call is made. Freshly deployed addresses are recorded as soon as they are
/// confirmed, so a failed deployment can be resumed with
/// [`DeploymentMode::DeployMissing`].
pub async fn resolve_contracts(
    ledger: &SharedLedger,
    mode: DeploymentMode,
    deployments: &mut Deployments,
    artifacts: Option<&Artifacts>,
    verify_code: bool,
) -> Result<Contracts, OperationError> {
    check_recorded(mode, deployments)?;

    let mut handles: BTreeMap<Component, ContractHandle> = BTreeMap::new();
    for component in Component::DEPLOYMENT_ORDER {
        let recorded = match mode {
            DeploymentMode::Deploy => None,
            DeploymentMode::Attach | DeploymentMode::DeployMissing => deployments.get(component),
        };

        let handle = match recorded {
            Some(address) => {
                ContractHandle::attach(ledger.clone(), component, address, verify_code).await?
            }
            None => {
                let tag = |e| OperationError::new(component, CONSTRUCTOR_OPERATION, e);
                let artifact = artifacts
                    .ok_or_else(|| {
                        tag(ScriptError::ArtifactParsing(
                            "deploying requires an artifacts directory".to_string(),
                        ))
                    })?
                    .get(component)
                    .map_err(tag)?;

                let dependencies = component
                    .dependencies()
                    .iter()
                    .map(|dependency| {
                        handles
                            .get(dependency)
                            .map(ContractHandle::address)
                            .ok_or_else(|| tag(ScriptError::MissingAddress(*dependency)))
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                let handle =
                    ContractHandle::deploy(ledger.clone(), component, artifact, &dependencies)
                        .await?;
                deployments
                    .record(component, handle.address())
                    .map_err(tag)?;
                handle
            }
        };

        handles.insert(component, handle);
    }

    let contracts = Contracts::from_handles(handles)?;
    let addresses = contracts
        .addresses()
        .iter()
        .map(|(component, address)| format!("{component}={address}"))
        .join(", ");
    info!(%mode, %addresses, "resolved contracts");

    Ok(contracts)
}

/// Validate the recorded addresses against the deployment mode
fn check_recorded(mode: DeploymentMode, deployments: &Deployments) -> Result<(), OperationError> {
    match mode {
        DeploymentMode::Deploy => {
            let recorded = Component::DEPLOYMENT_ORDER
                .iter()
                .filter(|c| deployments.get(**c).is_some())
                .count();
            if recorded > 0 {
                warn!(
                    path = %deployments.path().display(),
                    recorded,
                    "overwriting recorded addresses with fresh deployments"
                );
            }
        }
        DeploymentMode::Attach => {
            for component in Component::DEPLOYMENT_ORDER {
                if deployments.get(component).is_none() {
                    return Err(OperationError::new(
                        component,
                        ATTACH_OPERATION,
                        ScriptError::MissingAddress(component),
                    ));
                }
            }
        }
        DeploymentMode::DeployMissing => {
            // A recorded component would keep pointing at the old address of a
            // dependency that is about to be redeployed
            for component in Component::DEPLOYMENT_ORDER {
                if deployments.get(component).is_none() {
                    continue;
                }
                for dependency in component.dependencies() {
                    if deployments.get(*dependency).is_none() {
                        return Err(OperationError::new(
                            component,
                            ATTACH_OPERATION,
                            ScriptError::UnexpectedState(format!(
                                "{} is recorded but its dependency {} is not, redeploy with \
                                 `--mode deploy`",
                                component, dependency
                            )),
                        ));
                    }
                }
            }
        }
    }

    Ok(())
}

//! Utilities for the deploy scripts.

use std::{
    collections::BTreeMap,
    fs,
    path::Path,
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use alloy_primitives::{Address, U256};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::{
    artifacts::Artifacts,
    constants::{DEPLOYMENTS_KEY, FRONTEND_ADDRESS_FILE},
    errors::ScriptError,
    ledger::{rpc::RpcLedger, SharedLedger},
    types::Component,
};

/// Sets up the ledger through which every transaction of the run is submitted
pub async fn setup_ledger(
    priv_key: &str,
    rpc_url: &str,
    confirmation_timeout: Duration,
) -> Result<SharedLedger, ScriptError> {
    let ledger = RpcLedger::connect(priv_key, rpc_url, confirmation_timeout).await?;
    Ok(Arc::new(ledger))
}

/// Logs the deployer address & balance, warning if the deployer cannot pay
/// for anything
pub async fn log_deployer(ledger: &SharedLedger) -> Result<U256, ScriptError> {
    let deployer = ledger.signer_address();
    let balance = ledger.balance(deployer).await?;
    info!(%deployer, %balance, "deployer account");

    if balance.is_zero() {
        warn!(%deployer, "deployer balance is zero, every transaction will fail");
    }

    Ok(balance)
}

/// Parses a JSON file, treating a missing file as an empty object
pub fn get_json_from_file(file_path: &Path) -> Result<Value, ScriptError> {
    if !file_path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(file_path)
        .map_err(|e| ScriptError::ReadDeployments(format!("{}: {}", file_path.display(), e)))?;
    serde_json::from_str(&contents)
        .map_err(|e| ScriptError::ReadDeployments(format!("{}: {}", file_path.display(), e)))
}

/// Parses a hex address string
pub fn parse_address(address: &str) -> Result<Address, ScriptError> {
    Address::from_str(address).map_err(|e| ScriptError::InvalidAddress(format!("{address}: {e}")))
}

/// Reads every component address recorded in the deployments file.
///
/// Components without an entry are absent from the result; an entry that is
/// present but malformed is an error.
pub fn parse_addrs_from_deployments_file(
    file_path: &Path,
) -> Result<BTreeMap<Component, Address>, ScriptError> {
    let parsed_json = get_json_from_file(file_path)?;

    let mut addresses = BTreeMap::new();
    for component in Component::DEPLOYMENT_ORDER {
        let entry = &parsed_json[DEPLOYMENTS_KEY][component.deployments_key()];
        if entry.is_null() {
            continue;
        }

        let address = entry.as_str().ok_or_else(|| {
            ScriptError::InvalidAddress(format!(
                "{} entry is not a string",
                component.deployments_key()
            ))
        })?;
        addresses.insert(component, parse_address(address)?);
    }

    Ok(addresses)
}

/// Records a deployed address in the deployments file, creating the file if
/// needed and preserving every other entry
pub fn write_deployed_address(
    file_path: &Path,
    component: Component,
    address: Address,
) -> Result<(), ScriptError> {
    let mut parsed_json = get_json_from_file(file_path)?;
    if !parsed_json.is_object() {
        return Err(ScriptError::WriteDeployments(format!(
            "{} does not hold a JSON object",
            file_path.display()
        )));
    }

    if !parsed_json[DEPLOYMENTS_KEY].is_object() {
        parsed_json[DEPLOYMENTS_KEY] = Value::Object(Map::new());
    }
    parsed_json[DEPLOYMENTS_KEY][component.deployments_key()] =
        Value::String(format!("{address:#x}"));

    let contents = serde_json::to_string_pretty(&parsed_json)
        .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
    fs::write(file_path, contents)
        .map_err(|e| ScriptError::WriteDeployments(format!("{}: {}", file_path.display(), e)))
}

/// Writes the files the front-end reads: an address mapping keyed by contract
/// name, and the ABI of every component
pub fn write_frontend_files(
    dir: &Path,
    addresses: &BTreeMap<Component, Address>,
    artifacts: &Artifacts,
) -> Result<(), ScriptError> {
    fs::create_dir_all(dir)
        .map_err(|e| ScriptError::WriteDeployments(format!("{}: {}", dir.display(), e)))?;

    let address_map: Map<String, Value> = addresses
        .iter()
        .map(|(component, address)| {
            (
                component.contract_name().to_string(),
                Value::String(format!("{address:#x}")),
            )
        })
        .collect();
    write_json(&dir.join(FRONTEND_ADDRESS_FILE), &Value::Object(address_map))?;

    for component in addresses.keys() {
        let artifact = artifacts.get(*component)?;
        let abi_file = serde_json::json!({
            "contractName": artifact.contract_name,
            "abi": artifact.abi,
        });
        let path = dir.join(format!("{}.json", component.contract_name()));
        write_json(&path, &abi_file)?;
    }

    info!(dir = %dir.display(), "wrote front-end files");
    Ok(())
}

/// Pretty-prints a JSON value to a file
fn write_json(path: &Path, value: &Value) -> Result<(), ScriptError> {
    let contents = serde_json::to_string_pretty(value)
        .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
    fs::write(path, contents)
        .map_err(|e| ScriptError::WriteDeployments(format!("{}: {}", path.display(), e)))
}

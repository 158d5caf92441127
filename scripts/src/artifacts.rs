//! Loading of Hardhat compilation artifacts

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy_primitives::Bytes;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{constants::ARTIFACT_EXTENSION, errors::ScriptError, types::Component};

/// The parts of a compilation artifact the scripts use
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// The name of the compiled contract
    pub contract_name: String,
    /// The contract ABI, kept as raw JSON for the front-end export
    pub abi: Value,
    /// The creation bytecode, without constructor arguments
    pub bytecode: Bytes,
}

/// The on-disk layout of a Hardhat artifact
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    /// The name of the compiled contract
    contract_name: String,
    /// The contract ABI
    abi: Value,
    /// The hex-encoded creation bytecode
    bytecode: String,
}

impl Artifact {
    /// Parse an artifact from its JSON contents
    pub fn from_json(contents: &str) -> Result<Self, ScriptError> {
        let raw: HardhatArtifact = serde_json::from_str(contents)
            .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;

        let bytecode = Bytes::from_str(&raw.bytecode).map_err(|e| {
            ScriptError::ArtifactParsing(format!("{} bytecode: {}", raw.contract_name, e))
        })?;
        if bytecode.is_empty() {
            // Abstract contracts & interfaces compile to empty bytecode
            return Err(ScriptError::ArtifactParsing(format!(
                "{} has no creation bytecode",
                raw.contract_name
            )));
        }

        Ok(Self {
            contract_name: raw.contract_name,
            abi: raw.abi,
            bytecode,
        })
    }
}

/// The artifacts of every component, keyed by component
#[derive(Debug, Clone, Default)]
pub struct Artifacts {
    /// The loaded artifacts
    artifacts: BTreeMap<Component, Artifact>,
}

impl Artifacts {
    /// Load the artifact of every component from a Hardhat artifacts directory,
    /// where each lives at `<dir>/<Name>.sol/<Name>.json`
    pub fn load_dir(dir: &Path) -> Result<Self, ScriptError> {
        let mut artifacts = BTreeMap::new();
        for component in Component::DEPLOYMENT_ORDER {
            let path = artifact_path(dir, component);
            let contents = fs::read_to_string(&path)
                .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;

            let artifact = Artifact::from_json(&contents)?;
            if artifact.contract_name != component.contract_name() {
                return Err(ScriptError::ArtifactParsing(format!(
                    "{} holds {}, expected {}",
                    path.display(),
                    artifact.contract_name,
                    component
                )));
            }

            debug!(%component, path = %path.display(), "loaded artifact");
            artifacts.insert(component, artifact);
        }

        Ok(Self { artifacts })
    }

    /// Register an artifact directly
    pub fn insert(&mut self, component: Component, artifact: Artifact) {
        self.artifacts.insert(component, artifact);
    }

    /// The artifact of a component
    pub fn get(&self, component: Component) -> Result<&Artifact, ScriptError> {
        self.artifacts.get(&component).ok_or_else(|| {
            ScriptError::ArtifactParsing(format!("no artifact loaded for {}", component))
        })
    }
}

/// The path of a component's artifact under a Hardhat artifacts directory
pub fn artifact_path(dir: &Path, component: Component) -> PathBuf {
    let name = component.contract_name();
    dir.join(format!("{}.sol", name))
        .join(name)
        .with_extension(ARTIFACT_EXTENSION)
}

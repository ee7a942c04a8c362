use std::path::{Path, PathBuf};

use alloy::json_abi::JsonAbi;
use alloy::primitives::Bytes;
use alloy::sol_types::SolCall;
use serde::Deserialize;

use crate::interface::IUtils;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("artifact has no bytecode")]
    EmptyBytecode,
    #[error("artifact abi does not declare {0}")]
    MissingFunction(&'static str),
}

/// Compiled contract as written by the Truffle build step.
#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    #[serde(rename = "contractName", default)]
    pub contract_name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

impl Artifact {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        let artifact: Artifact = serde_json::from_str(json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// The ABI must expose the three read-only functions with the exact
    /// signatures the verifier encodes calls for.
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.bytecode.is_empty() {
            return Err(ArtifactError::EmptyBytecode);
        }
        let required = [
            (
                IUtils::getCompoundBalancesCall::SIGNATURE,
                IUtils::getCompoundBalancesCall::SELECTOR,
            ),
            (
                IUtils::getSupplyRatesCall::SIGNATURE,
                IUtils::getSupplyRatesCall::SELECTOR,
            ),
            (
                IUtils::getBorrowRatesCall::SIGNATURE,
                IUtils::getBorrowRatesCall::SELECTOR,
            ),
        ];
        for (signature, selector) in required {
            let declared = self
                .abi
                .functions()
                .any(|function| function.selector().0 == selector);
            if !declared {
                return Err(ArtifactError::MissingFunction(signature));
            }
        }
        Ok(())
    }
}

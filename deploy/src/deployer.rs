use std::fmt;
use std::str::FromStr;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, TxHash};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::TransactionRequest;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::artifact::Artifact;
use crate::shared::{signing_provider, ConfigError, DeployConfig, Network, ON_FAILURE};

/// What to do with the remaining networks once a deployment failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    #[default]
    Abort,
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "continue" => Ok(FailurePolicy::Continue),
            other => Err(ConfigError::Invalid {
                var: ON_FAILURE,
                reason: format!("{other:?}, must be abort or continue"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedInstance {
    pub network: Network,
    pub address: Address,
    pub tx_hash: TxHash,
}

#[derive(Debug)]
pub enum DeployStatus {
    Deployed(DeployedInstance),
    Failed(anyhow::Error),
    /// Not attempted because an earlier network failed under [`FailurePolicy::Abort`].
    Skipped,
}

#[derive(Debug)]
pub struct DeployOutcome {
    pub network: Network,
    pub status: DeployStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl DeployOutcome {
    pub fn is_deployed(&self) -> bool {
        matches!(self.status, DeployStatus::Deployed(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, DeployStatus::Failed(_))
    }
}

impl fmt::Display for DeployOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            DeployStatus::Deployed(instance) => write!(
                f,
                "[+] {}: deployed at {} (tx {})",
                self.network, instance.address, instance.tx_hash
            ),
            DeployStatus::Failed(err) => write!(f, "[-] {}: failed: {err:#}", self.network),
            DeployStatus::Skipped => write!(f, "[ ] {}: skipped", self.network),
        }
    }
}

/// One outcome per configured network, in deployment order.
#[derive(Debug, Default)]
pub struct DeployReport {
    pub outcomes: Vec<DeployOutcome>,
}

impl DeployReport {
    pub fn deployed(&self) -> impl Iterator<Item = &DeployedInstance> {
        self.outcomes.iter().filter_map(|outcome| match &outcome.status {
            DeployStatus::Deployed(instance) => Some(instance),
            _ => None,
        })
    }

    pub fn failed_networks(&self) -> Vec<Network> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_failed())
            .map(|outcome| outcome.network)
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(DeployOutcome::is_deployed)
    }

    pub fn log_summary(&self) {
        for outcome in &self.outcomes {
            match outcome.status {
                DeployStatus::Deployed(_) => info!("{outcome}"),
                DeployStatus::Failed(_) => error!("{outcome}"),
                DeployStatus::Skipped => warn!("{outcome}"),
            }
        }
    }

    pub fn into_result(self) -> anyhow::Result<()> {
        if self.is_success() {
            return Ok(());
        }
        let failed = self
            .failed_networks()
            .iter()
            .map(Network::name)
            .collect::<Vec<_>>()
            .join(", ");
        anyhow::bail!("deployment failed on: {failed}")
    }
}

#[async_trait]
pub trait ContractDeployer: Send + Sync {
    /// Submits one contract creation transaction for `artifact` on `network`.
    async fn deploy(&self, network: Network, artifact: &Artifact)
        -> anyhow::Result<DeployedInstance>;
}

type Connector = Box<dyn Fn(Network) -> Result<DynProvider, ConfigError> + Send + Sync>;

/// Deploys through a JSON-RPC node, signing with the configured credential.
pub struct RpcDeployer {
    from: Address,
    connect: Connector,
}

impl RpcDeployer {
    pub fn new(config: &DeployConfig) -> Self {
        let endpoints = config.endpoints.clone();
        let credential = config.credential.clone();
        Self::with_connector(credential.address(), move |network| {
            let url = endpoints.rpc_url(network)?;
            Ok(signing_provider(url, credential.clone()))
        })
    }

    /// `connect` hands out the provider used for a network, it must sign as `from`.
    pub fn with_connector(
        from: Address,
        connect: impl Fn(Network) -> Result<DynProvider, ConfigError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            from,
            connect: Box::new(connect),
        }
    }
}

#[async_trait]
impl ContractDeployer for RpcDeployer {
    async fn deploy(
        &self,
        network: Network,
        artifact: &Artifact,
    ) -> anyhow::Result<DeployedInstance> {
        let provider = (self.connect)(network)?;
        let from = self.from;

        // pin the nonce so the contract address is known without waiting for the receipt,
        // pending so an unmined transaction of the deployer is not replaced
        let nonce = provider
            .get_transaction_count(from)
            .pending()
            .await
            .context("failed to fetch deployer nonce")?;
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_nonce(nonce)
            .with_deploy_code(artifact.bytecode.clone());
        let pending = provider
            .send_transaction(tx)
            .await
            .context("failed to submit contract creation")?;

        Ok(DeployedInstance {
            network,
            address: from.create(nonce),
            tx_hash: *pending.tx_hash(),
        })
    }
}

/// Deploys `artifact` to every network of `networks`, one after another.
///
/// Each network gets exactly one attempt. After a failure, `policy` decides
/// whether the remaining networks are still attempted or reported as skipped.
pub async fn deploy<D>(
    deployer: &D,
    artifact: &Artifact,
    networks: &[Network],
    policy: FailurePolicy,
) -> DeployReport
where
    D: ContractDeployer + ?Sized,
{
    let mut report = DeployReport::default();
    let mut pending = networks.iter().copied();

    for network in pending.by_ref() {
        info!(%network, chain_id = network.chain_id(), "[+] deploying on {network}");
        let started_at = Utc::now();
        let status = match deployer.deploy(network, artifact).await {
            Ok(instance) => {
                info!(
                    %network,
                    address = %instance.address,
                    tx = %instance.tx_hash,
                    "Utils contract submitted"
                );
                DeployStatus::Deployed(instance)
            }
            Err(err) => {
                error!(%network, error = %format!("{err:#}"), "deployment failed");
                DeployStatus::Failed(err)
            }
        };
        let failed = matches!(status, DeployStatus::Failed(_));
        report.outcomes.push(DeployOutcome {
            network,
            status,
            started_at: Some(started_at),
            finished_at: Some(Utc::now()),
        });
        if failed && policy == FailurePolicy::Abort {
            break;
        }
    }

    report.outcomes.extend(pending.map(|network| DeployOutcome {
        network,
        status: DeployStatus::Skipped,
        started_at: None,
        finished_at: None,
    }));
    report
}

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use alloy::network::EthereumWallet;
use alloy::primitives::{address, Address};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::deployer::FailurePolicy;
use crate::format::BLOCKS_PER_YEAR;

pub const INFURA_PROJECT: &str = "INFURA_PROJECT";
pub const PRIVATE_KEY: &str = "PRIVATE_KEY";
pub const DEPLOY_NETWORKS: &str = "DEPLOY_NETWORKS";
pub const UTILS_ARTIFACT: &str = "UTILS_ARTIFACT";
pub const ON_FAILURE: &str = "ON_FAILURE";
pub const DEV_RPC_URL: &str = "DEV_RPC_URL";
pub const VERIFY_NETWORK: &str = "VERIFY_NETWORK";
pub const UTILS_ADDRESS: &str = "UTILS_ADDRESS";
pub const CTOKENS: &str = "CTOKENS";
pub const OWNER: &str = "OWNER";
pub const BLOCKS_PER_YEAR_VAR: &str = "BLOCKS_PER_YEAR";

pub const DEFAULT_ARTIFACT_PATH: &str = "build/contracts/Utils.json";
pub const DEFAULT_DEV_RPC_URL: &str = "http://127.0.0.1:8545";

/// Compound mainnet cTokens queried when `CTOKENS` is not set.
pub const DEFAULT_CTOKENS: [Address; 7] = [
    address!("4ddc2d193948926d02f9b1fe9e1daa0718270ed5"),
    address!("f5dce57282a584d2746faf1593d3121fcac444dc"),
    address!("39aa39c021dfbae8fac545936693ac917d5e7563"),
    address!("6c8c6b02e7b2be14d4fa6022dfd6d75921d90e4e"),
    address!("158079ee67fce2f58472a96584a73c7ab9ac95c1"),
    address!("b3319f5d18bc0d84dd1b4825dcde5d5f7266d407"),
    address!("c11b1268c1a384e55c48c2391d8d480264a3a7f4"),
];
pub const DEFAULT_OWNER: Address = address!("3a9f7c8ca36c42d7035e87c3304ee5cbd353a532");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing env var {0}")]
    MissingVar(&'static str),
    #[error("unknown network {0:?}, expected one of mainnet, ropsten, rinkeby, goerli, kovan, development")]
    UnknownNetwork(String),
    #[error("network {0} is listed more than once")]
    DuplicateNetwork(Network),
    #[error("no networks to deploy to")]
    NoNetworks,
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Ropsten,
    Rinkeby,
    Goerli,
    Kovan,
    Development,
}

impl Network {
    /// Deployment order used when `DEPLOY_NETWORKS` is not set.
    pub const DEPLOY_ORDER: [Network; 5] = [
        Network::Mainnet,
        Network::Ropsten,
        Network::Rinkeby,
        Network::Goerli,
        Network::Kovan,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Ropsten => "ropsten",
            Network::Rinkeby => "rinkeby",
            Network::Goerli => "goerli",
            Network::Kovan => "kovan",
            Network::Development => "development",
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Ropsten => 3,
            Network::Rinkeby => 4,
            Network::Goerli => 5,
            Network::Kovan => 42,
            Network::Development => 1337,
        }
    }

    pub fn is_infura(&self) -> bool {
        !matches!(self, Network::Development)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Network::DEPLOY_ORDER
            .into_iter()
            .chain([Network::Development])
            .find(|network| network.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownNetwork(s.to_string()))
    }
}

/// Where to reach a node for each network.
#[derive(Clone)]
pub struct Endpoints {
    pub infura_project: Option<String>,
    pub dev_rpc_url: Url,
}

impl Endpoints {
    pub fn rpc_url(&self, network: Network) -> Result<Url, ConfigError> {
        if !network.is_infura() {
            return Ok(self.dev_rpc_url.clone());
        }
        let project = self
            .infura_project
            .as_deref()
            .ok_or(ConfigError::MissingVar(INFURA_PROJECT))?;
        let url = format!("https://{}.infura.io/v3/{}", network.name(), project);
        Url::parse(&url).map_err(|err| ConfigError::Invalid {
            var: INFURA_PROJECT,
            reason: err.to_string(),
        })
    }

    fn from_lookup(
        lookup: &impl Fn(&str) -> Option<String>,
        networks: &[Network],
    ) -> Result<Self, ConfigError> {
        let infura_project = lookup(INFURA_PROJECT).filter(|project| !project.is_empty());
        if infura_project.is_none() && networks.iter().any(Network::is_infura) {
            return Err(ConfigError::MissingVar(INFURA_PROJECT));
        }
        let dev_rpc_url = lookup(DEV_RPC_URL).unwrap_or_else(|| DEFAULT_DEV_RPC_URL.to_string());
        let dev_rpc_url = Url::parse(&dev_rpc_url).map_err(|err| ConfigError::Invalid {
            var: DEV_RPC_URL,
            reason: err.to_string(),
        })?;
        Ok(Endpoints {
            infura_project,
            dev_rpc_url,
        })
    }
}

pub struct DeployConfig {
    pub endpoints: Endpoints,
    pub credential: PrivateKeySigner,
    pub networks: Vec<Network>,
    pub artifact_path: PathBuf,
    pub on_failure: FailurePolicy,
}

impl DeployConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let networks = match lookup(DEPLOY_NETWORKS) {
            Some(list) => parse_networks(&list)?,
            None => Network::DEPLOY_ORDER.to_vec(),
        };
        let endpoints = Endpoints::from_lookup(&lookup, &networks)?;
        let private_key = lookup(PRIVATE_KEY).ok_or(ConfigError::MissingVar(PRIVATE_KEY))?;
        let credential =
            PrivateKeySigner::from_str(private_key.trim()).map_err(|err| ConfigError::Invalid {
                var: PRIVATE_KEY,
                reason: err.to_string(),
            })?;
        let on_failure = match lookup(ON_FAILURE) {
            Some(policy) => policy.parse()?,
            None => FailurePolicy::default(),
        };
        Ok(DeployConfig {
            endpoints,
            credential,
            networks,
            artifact_path: lookup(UTILS_ARTIFACT)
                .unwrap_or_else(|| DEFAULT_ARTIFACT_PATH.to_string())
                .into(),
            on_failure,
        })
    }
}

pub struct VerifyConfig {
    pub endpoints: Endpoints,
    pub network: Network,
    pub utils: Address,
    pub tokens: Vec<Address>,
    pub owner: Address,
    pub blocks_per_year: u64,
}

impl VerifyConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let network = match lookup(VERIFY_NETWORK) {
            Some(name) => name.trim().parse()?,
            None => Network::Mainnet,
        };
        let endpoints = Endpoints::from_lookup(&lookup, &[network])?;
        let utils = lookup(UTILS_ADDRESS).ok_or(ConfigError::MissingVar(UTILS_ADDRESS))?;
        let tokens = match lookup(CTOKENS) {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(|token| parse_address(CTOKENS, token))
                .collect::<Result<Vec<_>, _>>()?,
            None => DEFAULT_CTOKENS.to_vec(),
        };
        let owner = match lookup(OWNER) {
            Some(owner) => parse_address(OWNER, &owner)?,
            None => DEFAULT_OWNER,
        };
        let blocks_per_year = match lookup(BLOCKS_PER_YEAR_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|blocks| *blocks > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    var: BLOCKS_PER_YEAR_VAR,
                    reason: format!("{raw:?} is not a positive integer"),
                })?,
            None => BLOCKS_PER_YEAR,
        };
        Ok(VerifyConfig {
            endpoints,
            network,
            utils: parse_address(UTILS_ADDRESS, &utils)?,
            tokens,
            owner,
            blocks_per_year,
        })
    }
}

pub fn parse_networks(list: &str) -> Result<Vec<Network>, ConfigError> {
    let mut networks = Vec::new();
    for name in list.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        let network: Network = name.parse()?;
        if networks.contains(&network) {
            return Err(ConfigError::DuplicateNetwork(network));
        }
        networks.push(network);
    }
    if networks.is_empty() {
        return Err(ConfigError::NoNetworks);
    }
    Ok(networks)
}

fn parse_address(var: &'static str, raw: &str) -> Result<Address, ConfigError> {
    Address::from_str(raw.trim()).map_err(|err| ConfigError::Invalid {
        var,
        reason: format!("{raw:?}: {err}"),
    })
}

fn load_dotenv() {
    // a missing .env is fine, the variables may come from the process environment
    if let Err(err) = dotenv() {
        if !err.not_found() {
            tracing::warn!(%err, "failed to load .env");
        }
    }
}

pub fn read_provider(url: Url) -> DynProvider {
    ProviderBuilder::new().connect_http(url).erased()
}

pub fn signing_provider(url: Url, credential: PrivateKeySigner) -> DynProvider {
    ProviderBuilder::new()
        .wallet(EthereumWallet::from(credential))
        .connect_http(url)
        .erased()
}

/// Installs the global `tracing` subscriber, `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

use alloy::primitives::{Address, U256};
use alloy::providers::DynProvider;
use anyhow::Context;

use crate::format::{
    annualized_percentage, format_percentage, format_units, CTOKEN_DECIMALS, UNDERLYING_DECIMALS,
};
use crate::interface::IUtils::{self, IUtilsInstance};
use crate::shared::{read_provider, ConfigError, VerifyConfig};

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("{method} returned {actual} entries for {expected} tokens")]
    LengthMismatch {
        method: &'static str,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateKind {
    Supply,
    Borrow,
}

impl RateKind {
    fn label(&self) -> &'static str {
        match self {
            RateKind::Supply => "supply",
            RateKind::Borrow => "borrow",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalance {
    pub token: Address,
    pub balance: U256,
    pub underlying: U256,
}

impl TokenBalance {
    pub fn formatted_balance(&self) -> String {
        format_units(self.balance, CTOKEN_DECIMALS)
    }

    pub fn formatted_underlying(&self) -> String {
        format_units(self.underlying, UNDERLYING_DECIMALS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRate {
    pub token: Address,
    pub rate: U256,
}

impl TokenRate {
    pub fn apy(&self, blocks_per_year: u64) -> f64 {
        annualized_percentage(self.rate, blocks_per_year)
    }
}

/// A deployed Utils contract together with the query it is checked with.
pub struct Fixture {
    pub utils: IUtilsInstance<DynProvider>,
    pub tokens: Vec<Address>,
    pub owner: Address,
    pub blocks_per_year: u64,
}

impl Fixture {
    pub fn connect(
        address: Address,
        provider: DynProvider,
        tokens: Vec<Address>,
        owner: Address,
        blocks_per_year: u64,
    ) -> Self {
        Self {
            utils: IUtils::new(address, provider),
            tokens,
            owner,
            blocks_per_year,
        }
    }

    pub fn from_config(config: &VerifyConfig) -> Result<Self, ConfigError> {
        let url = config.endpoints.rpc_url(config.network)?;
        Ok(Self::connect(
            config.utils,
            read_provider(url),
            config.tokens.clone(),
            config.owner,
            config.blocks_per_year,
        ))
    }

    pub async fn get_compound_balances(&self) -> anyhow::Result<Vec<TokenBalance>> {
        let result = self
            .utils
            .getCompoundBalances(self.tokens.clone(), self.owner)
            .call()
            .await
            .context("getCompoundBalances call failed")?;
        self.check_len("getCompoundBalances", result.balances.len())?;
        self.check_len("getCompoundBalances", result.underlying.len())?;
        Ok(self
            .tokens
            .iter()
            .zip(result.balances)
            .zip(result.underlying)
            .map(|((&token, balance), underlying)| TokenBalance {
                token,
                balance,
                underlying,
            })
            .collect())
    }

    pub async fn get_supply_rates(&self) -> anyhow::Result<Vec<TokenRate>> {
        let rates = self
            .utils
            .getSupplyRates(self.tokens.clone())
            .call()
            .await
            .context("getSupplyRates call failed")?;
        self.check_len("getSupplyRates", rates.len())?;
        Ok(self.token_rates(rates))
    }

    pub async fn get_borrow_rates(&self) -> anyhow::Result<Vec<TokenRate>> {
        let rates = self
            .utils
            .getBorrowRates(self.tokens.clone())
            .call()
            .await
            .context("getBorrowRates call failed")?;
        self.check_len("getBorrowRates", rates.len())?;
        Ok(self.token_rates(rates))
    }

    pub async fn get_rates(&self, kind: RateKind) -> anyhow::Result<Vec<TokenRate>> {
        match kind {
            RateKind::Supply => self.get_supply_rates().await,
            RateKind::Borrow => self.get_borrow_rates().await,
        }
    }

    fn token_rates(&self, rates: Vec<U256>) -> Vec<TokenRate> {
        self.tokens
            .iter()
            .zip(rates)
            .map(|(&token, rate)| TokenRate { token, rate })
            .collect()
    }

    fn check_len(&self, method: &'static str, actual: usize) -> Result<(), VerifyError> {
        let expected = self.tokens.len();
        if actual != expected {
            return Err(VerifyError::LengthMismatch {
                method,
                expected,
                actual,
            });
        }
        Ok(())
    }
}

pub fn balance_lines(balances: &[TokenBalance]) -> Vec<String> {
    balances
        .iter()
        .flat_map(|balance| {
            [
                format!("[+] cToken balance:     {}", balance.formatted_balance()),
                format!("[+] underlying balance: {}", balance.formatted_underlying()),
            ]
        })
        .collect()
}

pub fn rate_lines(kind: RateKind, rates: &[TokenRate], blocks_per_year: u64) -> Vec<String> {
    rates
        .iter()
        .map(|rate| {
            format!(
                "[+] {} apy of {} is {}%",
                kind.label(),
                short_token(&rate.token),
                format_percentage(rate.apy(blocks_per_year))
            )
        })
        .collect()
}

/// `0x` plus the first three hex digits, enough to tell the cTokens apart.
fn short_token(token: &Address) -> String {
    let mut hex = token.to_string().to_lowercase();
    hex.truncate(5);
    hex
}

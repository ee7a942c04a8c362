use anyhow::Context;
use deploy::fixture::{balance_lines, rate_lines, Fixture, RateKind};
use deploy::shared::{init_tracing, VerifyConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = VerifyConfig::from_env()?;
    info!(
        network = %config.network,
        utils = %config.utils,
        owner = %config.owner,
        tokens = config.tokens.len(),
        "querying Utils contract"
    );
    let fixture = Fixture::from_config(&config).context("failed to connect to Utils")?;

    call_on_chain_functions(&fixture).await
}

async fn call_on_chain_functions(fixture: &Fixture) -> anyhow::Result<()> {
    let balances = fixture.get_compound_balances().await?;
    for line in balance_lines(&balances) {
        println!("{line}");
    }

    for kind in [RateKind::Supply, RateKind::Borrow] {
        let rates = fixture.get_rates(kind).await?;
        for line in rate_lines(kind, &rates, fixture.blocks_per_year) {
            println!("{line}");
        }
    }
    Ok(())
}

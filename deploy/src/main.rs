use deploy::artifact::Artifact;
use deploy::deployer::{self, RpcDeployer};
use deploy::shared::{init_tracing, DeployConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = DeployConfig::from_env()?;
    let artifact = Artifact::load(&config.artifact_path)?;
    info!(
        deployer = %config.credential.address(),
        artifact = %config.artifact_path.display(),
        networks = ?config.networks,
        on_failure = ?config.on_failure,
        "starting deployment"
    );
    let report = deployer::deploy(
        &RpcDeployer::new(&config),
        &artifact,
        &config.networks,
        config.on_failure,
    )
    .await;
    report.log_summary();
    report.into_result()
}

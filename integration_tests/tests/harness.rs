mod utils;

use std::sync::Mutex;

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;
use deploy::artifact::Artifact;
use deploy::deployer::{self, ContractDeployer, DeployedInstance, FailurePolicy};
use deploy::fixture::{balance_lines, rate_lines, RateKind, TokenBalance, VerifyError};
use deploy::format::BLOCKS_PER_YEAR;
use deploy::shared::Network;
use maplit::hashmap;
use utils::*;

const UTILS_ARTIFACT: &str = r#"{
    "contractName": "Utils",
    "abi": [
        {
            "type": "function",
            "name": "getCompoundBalances",
            "stateMutability": "view",
            "inputs": [
                {"name": "cTokens", "type": "address[]"},
                {"name": "owner", "type": "address"}
            ],
            "outputs": [{"name": "", "type": "uint256[]"}, {"name": "", "type": "uint256[]"}]
        },
        {
            "type": "function",
            "name": "getSupplyRates",
            "stateMutability": "view",
            "inputs": [{"name": "cTokens", "type": "address[]"}],
            "outputs": [{"name": "", "type": "uint256[]"}]
        },
        {
            "type": "function",
            "name": "getBorrowRates",
            "stateMutability": "view",
            "inputs": [{"name": "cTokens", "type": "address[]"}],
            "outputs": [{"name": "", "type": "uint256[]"}]
        }
    ],
    "bytecode": "0x608060405234801561001057600080fd5b50"
}"#;

/// Hands out a fixed address per network and remembers the order of attempts.
struct StubDeployer {
    addresses: std::collections::HashMap<Network, Address>,
    attempts: Mutex<Vec<Network>>,
}

#[async_trait]
impl ContractDeployer for StubDeployer {
    async fn deploy(
        &self,
        network: Network,
        _artifact: &Artifact,
    ) -> anyhow::Result<DeployedInstance> {
        self.attempts.lock().unwrap().push(network);
        let address = self
            .addresses
            .get(&network)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("no node for {network}"))?;
        Ok(DeployedInstance {
            network,
            address,
            tx_hash: TxHash::repeat_byte(network.chain_id() as u8),
        })
    }
}

mod tests {
    use super::*;

    #[tokio::test]
    async fn test_compound_balances_are_formatted() {
        let (fixture, asserter) = mocked_fixture(vec![C_TOKEN_A, C_TOKEN_B]);
        push_balances(&asserter, &[ONE_CTOKEN, 0], &[ONE_UNDERLYING, 0]);

        let balances = fixture.get_compound_balances().await.unwrap();

        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].token, C_TOKEN_A);
        assert_eq!(balances[1].token, C_TOKEN_B);
        let formatted: Vec<String> = balances.iter().map(TokenBalance::formatted_balance).collect();
        let underlying: Vec<String> = balances
            .iter()
            .map(TokenBalance::formatted_underlying)
            .collect();
        assert_eq!(formatted, vec!["1.0", "0.0"]);
        assert_eq!(underlying, vec!["1.0", "0.0"]);
        assert_eq!(
            balance_lines(&balances),
            vec![
                "[+] cToken balance:     1.0",
                "[+] underlying balance: 1.0",
                "[+] cToken balance:     0.0",
                "[+] underlying balance: 0.0",
            ]
        );
    }

    #[tokio::test]
    async fn test_supply_and_borrow_rates() {
        let (fixture, asserter) = mocked_fixture(vec![C_TOKEN_A, C_TOKEN_B]);
        push_rates(&asserter, &[11_415_525_114, 0]);
        push_rates(&asserter, &[22_831_050_228, 47_564_687_975]);

        let supply = fixture.get_supply_rates().await.unwrap();
        let borrow = fixture.get_borrow_rates().await.unwrap();

        assert_eq!(supply.len(), 2);
        assert_eq!(borrow.len(), 2);
        assert_eq!(
            rate_lines(RateKind::Supply, &supply, BLOCKS_PER_YEAR),
            vec!["[+] supply apy of 0x4dd is 2.4%", "[+] supply apy of 0x39a is 0%"]
        );
        assert_eq!(
            rate_lines(RateKind::Borrow, &borrow, BLOCKS_PER_YEAR),
            vec!["[+] borrow apy of 0x4dd is 4.8%", "[+] borrow apy of 0x39a is 10%"]
        );
        // the stored rate stays unrounded
        assert_eq!(
            borrow[1].apy(BLOCKS_PER_YEAR),
            47_564_687_975f64 * 2_102_400f64 / 1e18 * 100.0
        );
    }

    #[tokio::test]
    async fn test_response_length_must_match_request() {
        let (fixture, asserter) = mocked_fixture(vec![C_TOKEN_A, C_TOKEN_B]);
        push_balances(&asserter, &[ONE_CTOKEN], &[ONE_UNDERLYING]);
        push_rates(&asserter, &[1, 2, 3]);

        let err = fixture.get_compound_balances().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VerifyError>(),
            Some(VerifyError::LengthMismatch {
                method: "getCompoundBalances",
                expected: 2,
                actual: 1,
            })
        ));

        let err = fixture.get_rates(RateKind::Supply).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VerifyError>(),
            Some(VerifyError::LengthMismatch { expected: 2, actual: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_token_list() {
        let (fixture, asserter) = mocked_fixture(vec![]);
        push_balances(&asserter, &[], &[]);
        push_rates(&asserter, &[]);

        assert!(fixture.get_compound_balances().await.unwrap().is_empty());
        assert!(fixture.get_borrow_rates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_node_failure_is_reported() {
        let (fixture, asserter) = mocked_fixture(vec![C_TOKEN_A]);
        asserter.push_failure_msg("execution reverted");

        let err = fixture.get_supply_rates().await.unwrap_err();
        assert!(err.to_string().contains("getSupplyRates call failed"));
    }

    #[tokio::test]
    async fn test_deploy_then_verify() {
        let artifact = Artifact::from_json(UTILS_ARTIFACT).unwrap();
        let deployer = StubDeployer {
            addresses: hashmap! {
                Network::Mainnet => UTILS_DEPLOYED_ADDRESS,
                Network::Ropsten => Address::repeat_byte(0x03),
                Network::Goerli => Address::repeat_byte(0x05),
                Network::Kovan => Address::repeat_byte(0x2a),
            },
            attempts: Mutex::new(Vec::new()),
        };

        let report = deployer::deploy(
            &deployer,
            &artifact,
            &Network::DEPLOY_ORDER,
            FailurePolicy::Continue,
        )
        .await;

        assert_eq!(
            deployer.attempts.lock().unwrap().clone(),
            Network::DEPLOY_ORDER.to_vec()
        );
        assert_eq!(report.failed_networks(), vec![Network::Rinkeby]);
        let mainnet = report
            .deployed()
            .find(|instance| instance.network == Network::Mainnet)
            .cloned()
            .unwrap();
        assert!(report.into_result().is_err());

        let (fixture, asserter) = mocked_fixture_at(mainnet.address, vec![C_TOKEN_A]);
        push_balances(&asserter, &[4_999_912_345_678], &[1_020_000_000_000_000_000]);
        let balances = fixture.get_compound_balances().await.unwrap();
        assert_eq!(
            balance_lines(&balances),
            vec![
                "[+] cToken balance:     49999.12345678",
                "[+] underlying balance: 1.02",
            ]
        );
        assert_eq!(*fixture.utils.address(), UTILS_DEPLOYED_ADDRESS);
    }

    #[tokio::test]
    async fn test_deploy_aborts_after_first_failure() {
        let artifact = Artifact::from_json(UTILS_ARTIFACT).unwrap();
        let deployer = StubDeployer {
            addresses: hashmap! {
                Network::Mainnet => UTILS_DEPLOYED_ADDRESS,
            },
            attempts: Mutex::new(Vec::new()),
        };

        let report = deployer::deploy(
            &deployer,
            &artifact,
            &Network::DEPLOY_ORDER,
            FailurePolicy::Abort,
        )
        .await;

        assert_eq!(
            deployer.attempts.lock().unwrap().clone(),
            vec![Network::Mainnet, Network::Ropsten]
        );
        assert_eq!(report.outcomes.len(), 5);
        assert_eq!(report.deployed().count(), 1);
        assert_eq!(report.failed_networks(), vec![Network::Ropsten]);
    }
}

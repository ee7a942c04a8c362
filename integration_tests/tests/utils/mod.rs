use alloy::primitives::{address, Address, Bytes, U256};
use alloy::providers::mock::Asserter;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::sol_types::SolValue;
use deploy::fixture::Fixture;
use deploy::format::BLOCKS_PER_YEAR;

pub const UTILS_DEPLOYED_ADDRESS: Address = address!("0000000000000000000000000000000000007715");

pub const C_TOKEN_A: Address = address!("4ddc2d193948926d02f9b1fe9e1daa0718270ed5");
pub const C_TOKEN_B: Address = address!("39aa39c021dfbae8fac545936693ac917d5e7563");
pub const OWNER: Address = address!("3a9f7c8ca36c42d7035e87c3304ee5cbd353a532");

pub const ONE_CTOKEN: u64 = 100_000_000;
pub const ONE_UNDERLYING: u64 = 1_000_000_000_000_000_000;

/// Fixture talking to a stub node whose `eth_call` responses are queued on the returned asserter.
pub fn mocked_fixture(tokens: Vec<Address>) -> (Fixture, Asserter) {
    mocked_fixture_at(UTILS_DEPLOYED_ADDRESS, tokens)
}

pub fn mocked_fixture_at(utils: Address, tokens: Vec<Address>) -> (Fixture, Asserter) {
    let asserter = Asserter::new();
    let provider = ProviderBuilder::new()
        .connect_mocked_client(asserter.clone())
        .erased();
    let fixture = Fixture::connect(utils, provider, tokens, OWNER, BLOCKS_PER_YEAR);
    (fixture, asserter)
}

pub fn u256s(values: &[u64]) -> Vec<U256> {
    values.iter().map(|&value| U256::from(value)).collect()
}

pub fn push_balances(asserter: &Asserter, balances: &[u64], underlying: &[u64]) {
    let output = (u256s(balances), u256s(underlying)).abi_encode_params();
    asserter.push_success(&Bytes::from(output));
}

pub fn push_rates(asserter: &Asserter, rates: &[u64]) {
    let output = (u256s(rates),).abi_encode_params();
    asserter.push_success(&Bytes::from(output));
}

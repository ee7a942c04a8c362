use alloy::sol;

sol! {
    /// Read-only aggregation helpers over Compound cTokens.
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IUtils {
        function getCompoundBalances(address[] calldata cTokens, address owner)
            external
            view
            returns (uint256[] memory balances, uint256[] memory underlying);

        function getSupplyRates(address[] calldata cTokens)
            external
            view
            returns (uint256[] memory);

        function getBorrowRates(address[] calldata cTokens)
            external
            view
            returns (uint256[] memory);
    }
}

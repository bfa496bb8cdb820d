use alloy_sol_types::sol;

sol! {
    interface IERC20Metadata {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }
}

sol! {
    /// Solidly-style router quote.
    interface IRouter {
        function getAmountOut(uint256 amountIn, address tokenIn, address tokenOut)
            external
            view
            returns (uint256 amount, bool stable);
    }
}

sol! {
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Result3 {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls)
            external
            payable
            returns (Result3[] memory returnData);
    }
}

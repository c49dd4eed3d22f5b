use alloy::sol;

sol! {
    #[sol(rpc)]
    interface ITokenPortal {
        function depositToAztecPublic(bytes32 to, uint256 amount, bytes32 secretHash)
            external
            returns (bytes32, uint256);

        function depositToAztecPrivate(uint256 amount, bytes32 secretHashForL2MessageConsumption)
            external
            returns (bytes32, uint256);

        function withdraw(
            address recipient,
            uint256 amount,
            bool withCaller,
            uint256 l2BlockNumber,
            uint256 leafIndex,
            bytes32[] calldata path
        ) external;

        event DepositToAztecPublic(
            bytes32 to,
            uint256 amount,
            bytes32 secretHash,
            bytes32 key,
            uint256 index
        );

        event DepositToAztecPrivate(
            uint256 amount,
            bytes32 secretHashForL2MessageConsumption,
            bytes32 key,
            uint256 index
        );
    }

    #[sol(rpc)]
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }

    #[sol(rpc)]
    interface IOutbox {
        function hasMessageBeenConsumedAtBlockAndIndex(uint256 l2BlockNumber, uint256 leafIndex)
            external
            view
            returns (bool);
    }
}

#[cfg(feature = "faucet")]
sol! {
    #[sol(rpc)]
    interface IFeeAssetHandler {
        function mint(address recipient) external;
        function mintAmount() external view returns (uint256);
    }
}

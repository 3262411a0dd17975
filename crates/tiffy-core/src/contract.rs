//! Contract invocation capability and the fixed claim configuration.

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;

use crate::abi::AbiFunction;
use crate::errors::ProviderError;
use crate::types::{ClaimRequest, TransactionReceipt};

/// Fixed parameters of the claim flow, supplied by configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimConfig {
    /// Token-distribution contract.
    pub contract: Address,
    /// ABI fragment of the payable claim function.
    pub function: AbiFunction,
    /// Fee attached to every claim, in wei.
    pub fee_wei: U256,
}

impl ClaimConfig {
    /// Build the request a claim from `sender` issues.
    pub fn request_for(&self, sender: Address) -> ClaimRequest {
        ClaimRequest::new(self.function.name.clone(), self.fee_wei, sender)
    }

    /// Build the contract call for a request.
    pub fn call_for(&self, request: &ClaimRequest) -> ContractCall {
        ContractCall {
            contract: self.contract,
            function: self.function.clone(),
            sender: request.sender,
            value_wei: request.value_wei,
        }
    }
}

/// A single state-changing contract call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractCall {
    /// Target contract.
    pub contract: Address,
    /// Function being invoked.
    pub function: AbiFunction,
    /// Account sending the transaction.
    pub sender: Address,
    /// Native value attached, in wei.
    pub value_wei: U256,
}

impl ContractCall {
    /// Encoded calldata.
    pub fn calldata(&self) -> Bytes {
        self.function.calldata()
    }
}

/// Contract-call capability.
#[async_trait]
pub trait ContractInvoker: Send + Sync {
    /// Send the call and wait until it is mined.
    ///
    /// Errors are reported raw; the caller classifies them.
    async fn call(&self, call: &ContractCall) -> Result<TransactionReceipt, ProviderError>;
}

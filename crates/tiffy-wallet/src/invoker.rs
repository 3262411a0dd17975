//! Contract invoker that sends transactions through a node's managed accounts.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{B256, U64, U256};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tiffy_core::{ContractCall, ContractInvoker, ProviderError, TransactionReceipt};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::rpc::RpcClient;

/// `eth_getTransactionReceipt` fields the invoker reads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: B256,
    #[serde(default)]
    block_number: Option<U64>,
    #[serde(default)]
    gas_used: Option<U256>,
    #[serde(default)]
    status: Option<U64>,
}

/// Sends `eth_sendTransaction` and waits for the receipt.
pub struct RpcContractInvoker {
    client: Arc<RpcClient>,
    chain_id: u64,
    poll_interval: Duration,
    receipt_timeout: Duration,
}

impl RpcContractInvoker {
    /// Create an invoker for `chain_id`.
    pub fn new(
        client: Arc<RpcClient>,
        chain_id: u64,
        poll_interval: Duration,
        receipt_timeout: Duration,
    ) -> Self {
        Self {
            client,
            chain_id,
            poll_interval,
            receipt_timeout,
        }
    }

    fn transaction(&self, call: &ContractCall) -> Value {
        json!({
            "from": call.sender,
            "to": call.contract,
            "value": call.value_wei,
            "data": call.calldata(),
            "chainId": format!("{:#x}", self.chain_id),
        })
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<RpcReceipt, ProviderError> {
        let deadline = Instant::now() + self.receipt_timeout;
        loop {
            let receipt: Option<RpcReceipt> = self
                .client
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if let Some(receipt) = receipt {
                return Ok(receipt);
            }
            if Instant::now() >= deadline {
                return Err(ProviderError::Timeout(format!(
                    "no receipt for {tx_hash} after {}ms",
                    self.receipt_timeout.as_millis()
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Replay a reverted transaction with `eth_call` to recover its reason.
    async fn revert_reason(&self, tx: &Value, block: Option<U64>) -> Option<String> {
        let block = block.map_or_else(|| "latest".to_string(), |b| format!("{b:#x}"));
        match self
            .client
            .request::<Value>("eth_call", json!([tx, block]))
            .await
        {
            Err(ProviderError::Rpc { message, data, .. }) => Some(data.unwrap_or(message)),
            Err(e) => {
                debug!(error = %e, "revert replay failed");
                None
            }
            Ok(_) => None,
        }
    }
}

#[async_trait]
impl ContractInvoker for RpcContractInvoker {
    async fn call(&self, call: &ContractCall) -> Result<TransactionReceipt, ProviderError> {
        let tx = self.transaction(call);
        let tx_hash: B256 = self
            .client
            .request("eth_sendTransaction", json!([tx]))
            .await?;
        info!(
            %tx_hash,
            function = %call.function.signature(),
            contract = %call.contract,
            "transaction sent"
        );

        let receipt = self.wait_for_receipt(tx_hash).await?;
        if receipt.status == Some(U64::ZERO) {
            let reason = self.revert_reason(&tx, receipt.block_number).await;
            warn!(%tx_hash, reason = reason.as_deref().unwrap_or("unknown"), "transaction reverted");
            return Err(ProviderError::Reverted { tx_hash, reason });
        }

        Ok(TransactionReceipt {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|b| b.to::<u64>()),
            gas_used: receipt.gas_used,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

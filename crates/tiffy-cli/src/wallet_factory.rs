//! Builds the wallet and contract backends selected in settings.

use std::sync::Arc;

use tiffy_core::{ContractInvoker, ProviderError, WalletProvider};
use tiffy_settings::{ConnectorKind, WalletSettings};
use tiffy_wallet::{RpcClient, RpcContractInvoker, RpcWalletProvider};
use tracing::info;

/// The two capabilities a session needs, backed by one connector.
pub struct Backend {
    /// Account access.
    pub wallet: Arc<dyn WalletProvider>,
    /// Claim submission.
    pub invoker: Arc<dyn ContractInvoker>,
}

/// Create the backend for the configured connector.
pub fn build(settings: &WalletSettings) -> Result<Backend, ProviderError> {
    match settings.connector {
        ConnectorKind::JsonRpc => {
            let client = Arc::new(RpcClient::new(
                settings.rpc_url.clone(),
                settings.request_timeout(),
            )?);
            let wallet = RpcWalletProvider::new(client.clone(), settings.account_poll_interval());
            let invoker = RpcContractInvoker::new(
                client,
                settings.chain_id,
                settings.receipt_poll_interval(),
                settings.receipt_timeout(),
            );
            info!(url = %settings.rpc_url, chain_id = settings.chain_id, "using json-rpc connector");
            Ok(Backend {
                wallet: Arc::new(wallet),
                invoker: Arc::new(invoker),
            })
        }
    }
}

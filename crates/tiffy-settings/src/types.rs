//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a partial
//! JSON file only needs the fields it overrides.

use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::utils::parse_ether;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tiffy_core::abi::{AbiFunction, find_function};
use tiffy_core::contract::ClaimConfig;

use crate::errors::{Result, SettingsError};

/// Contract address the claim client targets by default.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0xE488253DD6B4D31431142F1b7601C96f24Fb7dd5";

/// Default claim fee, in the chain's native unit.
pub const DEFAULT_CLAIM_FEE: &str = "0.00086";

/// Default chain id (BNB Smart Chain).
pub const DEFAULT_CHAIN_ID: u64 = 56;

/// Root settings type.
///
/// Loaded from `~/.tiffy/settings.json` with defaults applied for missing
/// fields. Environment variables can override specific values.
///
/// ```json
/// {
///   "contract": { "claimFee": "0.001" },
///   "wallet": { "rpcUrl": "http://127.0.0.1:8545", "chainId": 97 }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TiffySettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// Target contract.
    pub contract: ContractSettings,
    /// Wallet connector.
    pub wallet: WalletSettings,
    /// Logging.
    pub logging: LoggingSettings,
}

impl Default for TiffySettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "tiffy".to_string(),
            contract: ContractSettings::default(),
            wallet: WalletSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl TiffySettings {
    /// Validate the contract section into the fixed claim parameters.
    ///
    /// Fails if the address does not parse, the fee is not a decimal amount,
    /// the function is missing from the ABI, takes inputs, or is not payable
    /// while a non-zero fee is configured.
    pub fn claim_config(&self) -> Result<ClaimConfig> {
        let contract = Address::from_str(self.contract.address.trim()).map_err(|e| {
            SettingsError::InvalidValue(format!(
                "contract address {:?}: {e}",
                self.contract.address
            ))
        })?;

        let fee_wei = parse_fee(&self.contract.claim_fee)?;

        let function = find_function(&self.contract.abi, &self.contract.function)
            .ok_or_else(|| {
                SettingsError::InvalidValue(format!(
                    "function {:?} not found in contract ABI",
                    self.contract.function
                ))
            })?
            .clone();

        if !function.inputs.is_empty() {
            return Err(SettingsError::InvalidValue(format!(
                "function {} must take no arguments",
                function.signature()
            )));
        }
        if fee_wei > U256::ZERO && !function.is_payable() {
            return Err(SettingsError::InvalidValue(format!(
                "function {} is not payable but a claim fee is configured",
                function.signature()
            )));
        }

        Ok(ClaimConfig {
            contract,
            function,
            fee_wei,
        })
    }
}

/// Parse a decimal native-unit amount (e.g. `"0.00086"`) into wei.
pub fn parse_fee(amount: &str) -> Result<U256> {
    parse_ether(amount.trim())
        .map_err(|e| SettingsError::InvalidValue(format!("claim fee {amount:?}: {e}")))
}

/// Target contract settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContractSettings {
    /// Contract address, hex.
    pub address: String,
    /// Name of the payable function to call.
    pub function: String,
    /// Fee attached to each claim, as a decimal native-unit amount.
    pub claim_fee: String,
    /// JSON ABI fragment containing the function.
    pub abi: Vec<AbiFunction>,
}

impl Default for ContractSettings {
    fn default() -> Self {
        Self {
            address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            function: "claim".to_string(),
            claim_fee: DEFAULT_CLAIM_FEE.to_string(),
            abi: vec![AbiFunction::payable("claim")],
        }
    }
}

/// Which wallet connector backs the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectorKind {
    /// A node exposing managed accounts over JSON-RPC.
    #[default]
    JsonRpc,
}

/// Wallet connector settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalletSettings {
    /// Connector implementation.
    pub connector: ConnectorKind,
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    /// Chain id sent with transactions.
    pub chain_id: u64,
    /// Per-request HTTP timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// How often to re-read the account list after connecting.
    pub account_poll_interval_ms: u64,
    /// How often to poll for a transaction receipt.
    pub receipt_poll_interval_ms: u64,
    /// How long to wait for a receipt before reporting a timeout.
    pub receipt_timeout_ms: u64,
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            connector: ConnectorKind::JsonRpc,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            request_timeout_ms: 30_000,
            account_poll_interval_ms: 4_000,
            receipt_poll_interval_ms: 1_000,
            receipt_timeout_ms: 120_000,
        }
    }
}

impl WalletSettings {
    /// Reject an empty endpoint and intervals or timeouts outside their ranges.
    ///
    /// The ranges match the ones applied to `TIFFY_*` overrides.
    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.trim().is_empty() {
            return Err(SettingsError::InvalidValue("rpcUrl must not be empty".into()));
        }
        if self.chain_id == 0 {
            return Err(SettingsError::InvalidValue("chainId must be non-zero".into()));
        }
        check_range("requestTimeoutMs", self.request_timeout_ms, MIN_INTERVAL_MS, MAX_INTERVAL_MS)?;
        check_range(
            "accountPollIntervalMs",
            self.account_poll_interval_ms,
            MIN_INTERVAL_MS,
            MAX_INTERVAL_MS,
        )?;
        check_range(
            "receiptPollIntervalMs",
            self.receipt_poll_interval_ms,
            MIN_INTERVAL_MS,
            MAX_INTERVAL_MS,
        )?;
        check_range(
            "receiptTimeoutMs",
            self.receipt_timeout_ms,
            self.receipt_poll_interval_ms,
            MAX_RECEIPT_TIMEOUT_MS,
        )
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Account poll interval as a [`Duration`].
    pub fn account_poll_interval(&self) -> Duration {
        Duration::from_millis(self.account_poll_interval_ms)
    }

    /// Receipt poll interval as a [`Duration`].
    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    /// Receipt timeout as a [`Duration`].
    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_millis(self.receipt_timeout_ms)
    }
}

/// Shortest accepted request timeout or poll interval, in milliseconds.
pub const MIN_INTERVAL_MS: u64 = 100;

/// Longest accepted request timeout or poll interval, in milliseconds.
pub const MAX_INTERVAL_MS: u64 = 600_000;

/// Longest accepted receipt wait, in milliseconds.
pub const MAX_RECEIPT_TIMEOUT_MS: u64 = 3_600_000;

fn check_range(field: &str, value: u64, min: u64, max: u64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::InvalidValue(format!(
            "{field} must be between {min} and {max}, got {value}"
        )))
    }
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

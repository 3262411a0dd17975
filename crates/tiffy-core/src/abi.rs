//! Minimal ABI fragment handling for a single contract function.
//!
//! Only what a no-argument payable call needs: the JSON fragment shape, the
//! canonical signature, the 4-byte selector, and the resulting calldata.

use alloy_primitives::{Bytes, Selector, keccak256};
use serde::{Deserialize, Serialize};

/// Solidity state mutability of a function.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    /// Reads no state.
    Pure,
    /// Reads but does not write state.
    View,
    /// Writes state, rejects attached value.
    #[default]
    Nonpayable,
    /// Writes state, accepts attached value.
    Payable,
}

/// One input or output parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    /// Parameter name (may be empty).
    #[serde(default)]
    pub name: String,
    /// Canonical Solidity type, e.g. `uint256`.
    #[serde(rename = "type")]
    pub ty: String,
}

/// A `"type": "function"` entry of a JSON ABI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiFunction {
    /// Entry type; only `function` entries are callable.
    #[serde(rename = "type", default = "function_type")]
    pub kind: String,
    /// Function name.
    pub name: String,
    /// State mutability.
    #[serde(default)]
    pub state_mutability: StateMutability,
    /// Inputs in declaration order.
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    /// Outputs in declaration order.
    #[serde(default)]
    pub outputs: Vec<AbiParam>,
}

fn function_type() -> String {
    "function".to_string()
}

impl AbiFunction {
    /// A payable function with no inputs or outputs.
    pub fn payable(name: impl Into<String>) -> Self {
        Self {
            kind: function_type(),
            name: name.into(),
            state_mutability: StateMutability::Payable,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Whether the entry describes a callable function.
    pub fn is_function(&self) -> bool {
        self.kind == "function"
    }

    /// Whether the function accepts attached value.
    pub fn is_payable(&self) -> bool {
        self.state_mutability == StateMutability::Payable
    }

    /// Canonical signature, e.g. `claim()`.
    pub fn signature(&self) -> String {
        let types: Vec<&str> = self.inputs.iter().map(|p| p.ty.as_str()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// First four bytes of the keccak-256 of the signature.
    pub fn selector(&self) -> Selector {
        let hash = keccak256(self.signature().as_bytes());
        Selector::from_slice(&hash[..4])
    }

    /// Calldata for a call with no arguments.
    pub fn calldata(&self) -> Bytes {
        Bytes::copy_from_slice(self.selector().as_slice())
    }
}

/// Find the callable function named `name` in a parsed ABI.
pub fn find_function<'a>(abi: &'a [AbiFunction], name: &str) -> Option<&'a AbiFunction> {
    abi.iter().find(|f| f.is_function() && f.name == name)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

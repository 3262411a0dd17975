//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`TiffySettings::default()`]
//! 2. If the settings file exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{MAX_INTERVAL_MS, MIN_INTERVAL_MS, TiffySettings, parse_fee};

/// Resolve the path to the settings file (`~/.tiffy/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".tiffy").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<TiffySettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<TiffySettings> {
    let mut settings = load_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Load settings from a file without consulting the environment.
pub fn load_file(path: &Path) -> Result<TiffySettings> {
    let defaults = serde_json::to_value(TiffySettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are ignored with a warning and the file/default value
/// stays in effect.
pub fn apply_env_overrides(settings: &mut TiffySettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary lookup (testable without env vars).
pub fn apply_overrides<F>(settings: &mut TiffySettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    // ── Wallet ──────────────────────────────────────────────────────
    if let Some(v) = read("TIFFY_RPC_URL") {
        settings.wallet.rpc_url = v;
    }
    if let Some(v) = read("TIFFY_CHAIN_ID") {
        match parse_u64_range(&v, 1, u64::MAX) {
            Some(id) => settings.wallet.chain_id = id,
            None => warn_invalid("TIFFY_CHAIN_ID", &v),
        }
    }
    if let Some(v) = read("TIFFY_ACCOUNT_POLL_MS") {
        match parse_u64_range(&v, MIN_INTERVAL_MS, MAX_INTERVAL_MS) {
            Some(ms) => settings.wallet.account_poll_interval_ms = ms,
            None => warn_invalid("TIFFY_ACCOUNT_POLL_MS", &v),
        }
    }

    // ── Contract ────────────────────────────────────────────────────
    if let Some(v) = read("TIFFY_CONTRACT_ADDRESS") {
        settings.contract.address = v;
    }
    if let Some(v) = read("TIFFY_CLAIM_FEE") {
        if parse_fee(&v).is_ok() {
            settings.contract.claim_fee = v;
        } else {
            warn_invalid("TIFFY_CLAIM_FEE", &v);
        }
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read("TIFFY_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

fn warn_invalid(key: &str, value: &str) {
    tracing::warn!(key, value, "invalid env var, ignoring");
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

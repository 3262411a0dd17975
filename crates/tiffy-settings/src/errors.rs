//! Why `~/.tiffy/settings.json` could not become a usable configuration.

use thiserror::Error;

/// Settings failure, reported before any wallet is contacted.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// The settings file is not valid JSON or has mistyped fields.
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A contract or wallet value failed validation (address, fee, ABI, interval).
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

/// Result of loading or validating settings.
pub type Result<T> = std::result::Result<T, SettingsError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

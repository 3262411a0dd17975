//! # tiffy-settings
//!
//! Configuration for the Tiffy claim client.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`TiffySettings::default()`]
//! 2. **User file**: `~/.tiffy/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `TIFFY_*` overrides (highest priority)
//!
//! The contract section is validated into a
//! [`ClaimConfig`](tiffy_core::ClaimConfig) with
//! [`TiffySettings::claim_config`].

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

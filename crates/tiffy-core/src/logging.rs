//! Log filter and subscriber for the claim client.
//!
//! A bare level from settings or `--log-level` (e.g. `"debug"`) applies to
//! the `tiffy` crates only; HTTP and runtime crates stay at `warn` so that
//! JSON-RPC traffic is readable. Full directives and `RUST_LOG` are used
//! verbatim.

use tracing_subscriber::EnvFilter;

/// Crates whose verbosity a bare level controls.
const TIFFY_TARGETS: [&str; 5] = [
    "tiffy",
    "tiffy_core",
    "tiffy_settings",
    "tiffy_wallet",
    "tiffy_session",
];

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Expand a configured level into an [`EnvFilter`] directive.
pub fn filter_directive(level: &str) -> String {
    let level = level.trim().to_ascii_lowercase();
    if !LEVELS.contains(&level.as_str()) {
        return level;
    }
    let dependencies = if matches!(level.as_str(), "error" | "off") {
        level.as_str()
    } else {
        "warn"
    };
    let mut directive = dependencies.to_string();
    for target in TIFFY_TARGETS {
        directive.push_str(&format!(",{target}={level}"));
    }
    directive
}

/// Install the global stderr subscriber; later calls are no-ops.
///
/// `RUST_LOG`, when set, wins over `level`.
pub fn init_subscriber(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    let _ = subscriber.try_init();
}

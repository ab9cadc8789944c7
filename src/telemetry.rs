// src/telemetry.rs

use tracing_subscriber::EnvFilter;

/// Logs go to stderr so the report on stdout stays clean. `RUST_LOG`
/// overrides the level picked from `-v`.
pub fn init(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

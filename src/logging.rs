//! `tracing-subscriber` wiring for the `knib-compress` binary.
//!
//! The library itself never installs a subscriber — only the binary does,
//! matching the pattern in `examples/SuperFlyTV-phaneron/src/main.rs`
//! (`tracing_subscriber::registry()` + `EnvFilter::from_default_env()`).
//! This replaces the original C encoder's scattered `printf` progress
//! lines ("SetAssembler: Output %d", "ThreadPool: Start Work %d") with
//! leveled, structured spans.

use tracing_subscriber::{prelude::*, EnvFilter};

/// Installs a compact stdout subscriber filtered by `RUST_LOG`, defaulting
/// to `info` for this crate when the variable isn't set.
pub fn install() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "knib=info");
    }

    let stdout_log = tracing_subscriber::fmt::layer().compact();
    let env_filter = EnvFilter::from_default_env();
    tracing_subscriber::registry()
        .with(stdout_log.with_filter(env_filter))
        .init();
}

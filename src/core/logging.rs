//! Logging initialization and utilities

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable, e.g.
/// `RUST_LOG=sandfield::spawn=debug` to see per-tick window refreshes.
///
/// # Example
/// ```
/// sandfield::core::logging::init();
/// log::info!("Sand field started");
/// ```
pub fn init() {
    // try_init so repeated calls (doc tests, embedding hosts) are harmless
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).try_init();
}

//! Logging initialization

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`, and `warn` for the
/// GPU stack which is noisy at `info`.
/// Override with RUST_LOG environment variable.
///
/// # Example
/// ```
/// meadow::core::logging::init();
/// log::info!("Meadow started");
/// ```
pub fn init() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info,wgpu_core=warn,wgpu_hal=warn,naga=warn")
    ).init();
}

/// Installs the global `tracing` subscriber.
///
/// Verbosity comes from `RUST_LOG` (for example `RUST_LOG=lemon_api=debug`),
/// falling back to `info` when the variable is unset.
pub fn setup_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber. Filter level comes from
/// `RUST_LOG`; repeated calls are no-ops so tests can call this freely.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .try_init();
}

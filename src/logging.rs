use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber used by the binaries. `RUST_LOG` wins over
/// the `info` default.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

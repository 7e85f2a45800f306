use tracing::warn;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";

/// Installs the global `fmt` subscriber on stderr.
///
/// An explicit directive (from `--log-level` or the config file) wins over
/// `RUST_LOG`; without either the level is `info`. Calling this twice is a
/// no-op.
pub fn init(directive: Option<&str>) {
    let (filter, rejected) = match directive {
        Some(directive) => match EnvFilter::try_new(directive) {
            Ok(filter) => (filter, None),
            Err(_) => (EnvFilter::new(DEFAULT_DIRECTIVE), Some(directive)),
        },
        None => (
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
            None,
        ),
    };
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    if let (true, Some(directive)) = (installed, rejected) {
        warn!(directive, "invalid log filter, falling back to info");
    }
}

use tracing_subscriber::{EnvFilter, fmt};

pub const DEFAULT_FILTER: &str = "info,api=debug,auth=debug";

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over `configured`; an unparsable directive falls back to
/// [`DEFAULT_FILTER`]. Calling this twice is harmless.
pub fn init_tracing(configured: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = fmt().with_env_filter(filter).try_init();
}

//! Application glue module
//!
//! Configuration and logging setup shared by the binaries.

mod config;

pub use config::{default_config_path, Config, ConfigError, MouseConfig};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a stderr tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `default_filter` (usually
/// [`Config::log_filter`]) is used.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

//! Native logging: `RUST_LOG` filter (default `info`) on stderr, so stdout
//! stays clean for the CLI's JSON output.

use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    /// One JSON object per line (`CHARITY_LOG_JSON=1`)
    Json,
}

impl LogFormat {
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag.map(str::trim) {
            Some("1") | Some("true") => Self::Json,
            _ => Self::Compact,
        }
    }

    pub fn from_env() -> Self { Self::from_flag(std::env::var("CHARITY_LOG_JSON").ok().as_deref()) }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt::Subscriber::builder().with_env_filter(filter).with_writer(std::io::stderr);
    let _ = match LogFormat::from_env() {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().with_target(false).try_init(),
    };
}

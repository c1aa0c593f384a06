// src/logging.rs

use tracing_subscriber::EnvFilter;

use crate::Error;

/// Installs the global tracing subscriber. `RUST_LOG` takes precedence
/// over the caller's default directive.
pub fn init(default_directive: &str) -> Result<(), Error> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .map_err(|e| Error::Parse(format!("invalid log directive: {}", e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| Error::Parse(format!("tracing subscriber already set: {}", e)))
}

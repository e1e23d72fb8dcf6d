//! Structured logging setup.
//!
//! Logs are emitted as JSON lines filtered by `RUST_LOG`. Initialisation is
//! idempotent: a second call, or a subscriber installed by an embedder, is
//! reported and otherwise ignored.

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the JSON `tracing` subscriber.
pub fn init_tracing() {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn repeated_initialisation_does_not_panic() {
        init_tracing();
        init_tracing();
    }
}

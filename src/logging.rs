use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const LOG_ENV: &str = "KIRA_DDCT_LOG";

static INIT: Once = Once::new();

/// Installs the stderr subscriber. Filter comes from `KIRA_DDCT_LOG`
/// (e.g. `KIRA_DDCT_LOG=debug`), defaulting to `info`. Idempotent.
pub fn init_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .with(filter)
            .try_init();
    });
}

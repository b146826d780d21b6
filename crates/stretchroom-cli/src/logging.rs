//! Logging setup for the CLI.
//!
//! Logs go to stderr so they never mix with JSON on stdout. The filter comes
//! from `STRETCHROOM_LOG` (tracing `EnvFilter` syntax); without it only
//! warnings are shown, or debug output for our crates with `--verbose`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_ENV: &str = "STRETCHROOM_LOG";

pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "warn,stretchroom=debug,stretchroom_core=debug"
        } else {
            "warn"
        })
    });

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(filter)
        .init();
}

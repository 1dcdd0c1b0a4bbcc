use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log to stderr so report output on stdout stays clean.
///
/// `RUST_LOG` wins over the default level; `verbose` lowers it to debug.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "bankbook=debug" } else { "bankbook=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    // A second init (tests, repeated runs in one process) is not an error.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}

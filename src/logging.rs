use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging to stderr.
///
/// `RUST_LOG` takes precedence; otherwise `sipcalc` logs at `level`.
pub fn init_logging(level: &str) {
    let default_filter = format!("sipcalc={level},tower_http=warn");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    let initialized = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .try_init();

    if initialized.is_ok() {
        tracing::debug!(level, "logging initialized");
    }
}

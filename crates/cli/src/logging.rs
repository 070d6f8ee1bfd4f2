use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the stderr log subscriber.
///
/// The level is read from `PHOTOINDEX_LOG` (e.g. `PHOTOINDEX_LOG=debug`),
/// defaulting to `info`.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_env("PHOTOINDEX_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

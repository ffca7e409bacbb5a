use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Create the initial subscriber, alongside the custom formatting for standard i/o.
pub fn create_subscriber(default_directives: &str) -> impl Subscriber + Send + Sync {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
    let sq_filter = tracing_subscriber::filter::filter_fn(|f| f.target().starts_with("sq_"));

    let sq_format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_thread_ids(true)
        .with_source_location(true);
    let normal_format = sq_format.clone().with_source_location(false);

    // We only want file locations in sq_* logs, we therefore filter those out in the normal_logger.
    let sq_logger = tracing_subscriber::fmt::layer()
        .event_format(sq_format)
        .with_filter(sq_filter)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives)));
    let normal_logger = tracing_subscriber::fmt::layer()
        .event_format(normal_format)
        .with_filter(tracing_subscriber::filter::filter_fn(|m| !m.target().starts_with("sq_")))
        .with_filter(env_filter);

    #[cfg(feature = "debug")]
    let console = Some(console_subscriber::spawn());
    #[cfg(not(feature = "debug"))]
    let console: Option<tracing_subscriber::layer::Identity> = None;

    tracing_subscriber::registry()
        .with(console)
        .with(sq_logger)
        .with(normal_logger)
}

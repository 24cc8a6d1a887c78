use crate::prelude::Result;
use tracing::subscriber::set_global_default;
use tracing::{Level, Subscriber};
use tracing_log::LogTracer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt::MakeWriter};

/// Composes and returns a tracing subscriber for the build step.
///
/// # Arguments
///
/// * `default_level`: Level used when `RUST_LOG` is not set.
/// * `sink`: Destination where logs will be written to. The `vm-step`
///   binary passes `stderr`, keeping `stdout` for build step output.
///
/// # Returns
///
/// `Subscriber` instance.
///
pub fn get_subscriber<Sink>(default_level: Level, sink: Sink) -> impl Subscriber + Sync + Send
where
    Sink: for<'a> MakeWriter<'a> + Sync + Send + 'static,
{
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_error| EnvFilter::new(default_level.as_str()));

    // Compact logs in debug builds, JSON logs in release builds so CI log
    // collectors can parse them.
    #[cfg(debug_assertions)]
    let subscriber_builder = tracing_subscriber::fmt().compact();
    #[cfg(not(debug_assertions))]
    let subscriber_builder = tracing_subscriber::fmt().json().with_current_span(true);

    subscriber_builder
        .with_env_filter(env_filter)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(false)
        .with_writer(sink)
        .finish()
}

/// Installs `subscriber` for the `vm-step` process and routes `log` records
/// from reqwest, rustls and hyper into it.
///
/// `vm-step` calls this before anything else, with a subscriber writing to
/// stderr, so the step output on stdout stays free of log lines. Only the
/// first call succeeds; later ones fail with `Error::Logger`.
///
pub fn init_subscriber(subscriber: impl Subscriber + Sync + Send) -> Result<()> {
    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}

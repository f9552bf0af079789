//! Diagnostic output: a `tracing` subscriber writing to standard error.

use std::io;

use tracing::level_filters::LevelFilter;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Map the number of `-v` flags to a level. Warnings are always shown.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the process-wide subscriber. `RUST_LOG`, when set, overrides
/// the level chosen by `-v`.
pub fn init(verbosity: u8) -> Result<(), TryInitError> {
    subscriber(verbosity, io::stderr).try_init()
}

fn subscriber<W>(verbosity: u8, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::builder()
        .with_default_directive(level_for(verbosity).into())
        .from_env_lossy();

    tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_target(false)
            .without_time()
            .with_writer(writer),
    )
}

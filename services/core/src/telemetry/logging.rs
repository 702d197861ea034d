use std::io;

use thiserror::Error;
use tracing::subscriber::{set_global_default, SetGlobalDefaultError};
use tracing::Subscriber;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::log_tracer::SetLoggerError;
use tracing_log::LogTracer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to set logger: {0}")]
    Logger(#[from] SetLoggerError),
    #[error("Failed to set tracing subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Bunyan formatted subscriber writing to stdout. `RUST_LOG` overrides `default_filter`.
pub fn make_subscriber(name: impl Into<String>, default_filter: impl Into<String>) -> impl Subscriber + Send + Sync {
    make_subscriber_with_sink(name, default_filter, io::stdout)
}

/// Same as [`make_subscriber`], with every record handed to `sink` instead.
pub fn make_subscriber_with_sink<W>(
    name: impl Into<String>,
    default_filter: impl Into<String>,
    sink: W,
) -> impl Subscriber + Send + Sync
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter.into()));

    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new(name.into(), sink))
}

/// Installs `subscriber` for the whole process and routes `log` records (actix, the AWS SDK) into it.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> Result<(), TelemetryError> {
    LogTracer::init()?;
    set_global_default(subscriber)?;

    Ok(())
}

/// Builds a `map_err` closure that logs the error at error level and yields `$result`.
///
/// ```ignore
/// let hash = hash_password(&password).map_err(simple_err_map!("Hashing password failed.", EndpointError::internal()))?;
/// ```
#[macro_export]
macro_rules! simple_err_map {
    ($msg:expr, $result:expr) => {
        |e| {
            tracing::error!(error = ?e, $msg);
            $result
        }
    };
}

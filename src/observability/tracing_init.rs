//! Tracing initialization with configurable logging formats.

use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, Layer, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingConfig, ObservabilityConfig};

/// Install the global subscriber: an `EnvFilter` plus one formatting layer.
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<(), TracingError> {
    let logging = &config.logging;

    tracing_subscriber::registry()
        .with(build_env_filter(logging))
        .with(fmt_layer(logging))
        .try_init()
        .map_err(|e| TracingError::Init(e.to_string()))
}

fn fmt_layer<S>(logging: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_file(logging.file_line)
        .with_line_number(logging.file_line);

    match (logging.format, logging.timestamps) {
        (LogFormat::Pretty, true) => layer.pretty().boxed(),
        (LogFormat::Pretty, false) => layer.pretty().without_time().boxed(),
        (LogFormat::Compact, true) => layer.compact().boxed(),
        (LogFormat::Compact, false) => layer.compact().without_time().boxed(),
        (LogFormat::Json, true) => layer
            .json()
            .with_current_span(logging.include_spans)
            .boxed(),
        (LogFormat::Json, false) => layer
            .json()
            .with_current_span(logging.include_spans)
            .without_time()
            .boxed(),
    }
}

const QUIET_DEPENDENCIES: &str =
    "hyper=warn,hyper_util=warn,h2=warn,rustls=warn,aws_config=warn,aws_smithy_runtime=warn,kube_client=warn,tower=info";

/// `RUST_LOG` wins; otherwise the configured level plus `filter`.
fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    let level = config.level.as_str();

    let directives = match (std::env::var("RUST_LOG"), &config.filter) {
        (Ok(rust_log), _) => rust_log,
        (Err(_), Some(filter)) => format!("{level},{filter}"),
        // SDK and HTTP crates are chatty at debug.
        (Err(_), None) => format!("{level},{QUIET_DEPENDENCIES}"),
    };

    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(level))
}

/// Tracing initialization errors.
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

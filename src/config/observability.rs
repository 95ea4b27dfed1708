use serde::{Deserialize, Serialize};

/// Observability configuration.
///
/// ```toml
/// [observability.logging]
/// level = "debug"
/// format = "json"
/// filter = "aws_smithy_runtime=info"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Log output settings. `RUST_LOG`, when set, overrides `level` and `filter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Prefix events with a timestamp. Disable when the log collector adds its own.
    pub timestamps: bool,
    /// Source file and line of each event.
    pub file_line: bool,
    /// Attach the enclosing `cluster` / `repository` span to JSON events.
    pub include_spans: bool,
    /// Extra `EnvFilter` directives appended to `level`.
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            timestamps: true,
            file_line: false,
            include_spans: true,
            filter: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive accepted by `EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, for local runs.
    Pretty,
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

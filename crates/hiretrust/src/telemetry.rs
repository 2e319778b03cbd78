use crate::config::{LogFormat, TelemetryConfig};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// HTTP client internals stay at warn unless `RUST_LOG` says otherwise.
const QUIET_TARGETS: [&str; 3] = ["hyper=warn", "hyper_util=warn", "reqwest=warn"];

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log level/filter '{value}'")]
    EnvFilter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("unable to install tracing subscriber: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// `RUST_LOG` when set, otherwise the configured level with the oracle client's transport muted.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directives = std::iter::once(config.log_level.as_str())
        .chain(QUIET_TARGETS)
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::try_new(directives).map_err(|source| TelemetryError::EnvFilter {
        value: config.log_level.clone(),
        source,
    })
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config)?)
        .with_target(false)
        .with_ansi(false);

    match config.log_format {
        LogFormat::Compact => subscriber.compact().try_init(),
        LogFormat::Json => subscriber.json().flatten_event(true).try_init(),
    }
    .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(log_level: &str) -> TelemetryConfig {
        TelemetryConfig {
            log_level: log_level.to_string(),
            log_format: LogFormat::Json,
        }
    }

    #[test]
    fn rejects_malformed_level() {
        std::env::remove_var("RUST_LOG");
        match env_filter(&config("hiretrust=loud")) {
            Err(TelemetryError::EnvFilter { value, .. }) => assert_eq!(value, "hiretrust=loud"),
            other => panic!("expected env filter error, got {other:?}"),
        }
    }

    #[test]
    fn configured_level_mutes_http_transport() {
        std::env::remove_var("RUST_LOG");
        let rendered = env_filter(&config("debug")).expect("filter builds").to_string();
        assert!(rendered.contains("debug"));
        assert!(rendered.contains("hyper=warn"));
        assert!(rendered.contains("reqwest=warn"));
    }
}

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingSettings};
use crate::error::ChorusError;

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
/// Output goes to stderr so the REPL's answers stay clean on stdout.
pub fn init(settings: &LoggingSettings) -> Result<(), ChorusError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| {
            ChorusError::ConfigValidation(format!("logging.level '{}': {e}", settings.level))
        })?;

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match settings.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    installed.map_err(|e| ChorusError::Internal(format!("cannot install log subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_level() {
        let settings = LoggingSettings {
            level: "chorus=loud".to_owned(),
            format: LogFormat::Compact,
        };
        if std::env::var_os("RUST_LOG").is_none() {
            let err = init(&settings).unwrap_err();
            assert!(matches!(err, ChorusError::ConfigValidation(_)));
        }
    }
}

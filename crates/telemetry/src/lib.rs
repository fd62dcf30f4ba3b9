//! Tracing subscriber bootstrap.

use anyhow::anyhow;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bookshelf_kernel::settings::{LogFormat, TelemetrySettings};

/// Install the global subscriber. `RUST_LOG` overrides the configured filter.
///
/// Fails if a global subscriber is already installed.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .map_err(|err| anyhow!("invalid log filter '{}': {}", settings.filter, err))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match settings.log_format {
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
    };
    installed.map_err(|err| anyhow!("failed to install tracing subscriber: {}", err))?;

    tracing::info!(
        target: "bookshelf-telemetry",
        format = ?settings.log_format,
        "telemetry initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_reported() {
        let settings = TelemetrySettings::default();
        init(&settings).ok();
        assert!(init(&settings).is_err());
    }

    #[test]
    fn bad_filter_is_rejected() {
        let settings = TelemetrySettings {
            filter: "bookshelf=notalevel".to_string(),
            ..TelemetrySettings::default()
        };
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(init(&settings).is_err());
        }
    }
}

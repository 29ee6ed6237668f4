//! Logging and tracing bootstrap.

use bookshop_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::{fmt::MakeWriter, EnvFilter};

/// Build the filter, letting `RUST_LOG` override the configured directive.
fn env_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.filter)
            .map_err(|e| anyhow::anyhow!("invalid log filter '{}': {}", settings.filter, e)),
    }
}

/// Install the global tracing subscriber writing to stdout.
///
/// Calling this more than once is harmless; later calls keep the subscriber
/// installed by the first one.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    install(settings, std::io::stdout)
}

/// Same as [`init`], but logs go to stderr so stdout stays free for command output.
pub fn init_stderr(settings: &TelemetrySettings) -> anyhow::Result<()> {
    install(settings, std::io::stderr)
}

fn install<W>(settings: &TelemetrySettings, writer: W) -> anyhow::Result<()>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = env_filter(settings)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);

    let installed = match settings.log_format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };

    if installed {
        tracing::debug!(
            target: "bookshop-telemetry",
            format = ?settings.log_format,
            "telemetry initialized"
        );
    }

    Ok(())
}

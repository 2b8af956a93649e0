//! Tracing subscriber setup for the CSE core.
//!
//! This intentionally only carries the console-output half of what a full
//! observability stack could offer: `EnvFilter`-driven level selection and a
//! choice between a human-readable compact formatter and a JSON formatter
//! for log aggregation. Distributed trace export belongs to a metrics/
//! observability surface this workspace treats as an external collaborator,
//! so there is no OTLP exporter here.
use snafu::{ResultExt as _, Snafu};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::{SubscriberInitExt as _, TryInitError};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("unable to install the global tracing subscriber"))]
    Install { source: TryInitError },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Selects the console formatter. JSON output suits log aggregation
/// pipelines, compact suits a developer's terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other}, expected compact or json")),
        }
    }
}

/// Installs the global tracing subscriber. `default_level` is used when the
/// `RUST_LOG` environment variable is unset or doesn't cover a given
/// target.
pub fn init_tracing(format: LogFormat, default_level: LevelFilter) -> Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init(),
    }
    .context(InstallSnafu)
}

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use cse_remote::CseRole;
use tracing::level_filters::LevelFilter;

/// All the configuration this CSE needs to start, assembled from CLI flags
/// and/or their `env`-backed equivalents, the same `#[arg(long, env)]` shape
/// the teacher uses for its `ProductOperatorRun` options.
#[derive(Debug, Parser)]
#[command(name = "cse", long_about = "oneM2M Common Services Entity core")]
pub struct CseConfig {
    /// This CSE's CSE-ID, e.g. `in-cse`.
    #[arg(long, env = "CSE_CSI", default_value = "in-cse")]
    pub cse_csi: String,

    /// This CSE's resource name (also its structured-path root segment).
    #[arg(long, env = "CSE_RN", default_value = "cse-in")]
    pub cse_rn: String,

    /// This CSE's resource identifier.
    #[arg(long, env = "CSE_RI", default_value = "cse-in")]
    pub cse_ri: String,

    /// The admin originator granted full access regardless of ACPs.
    #[arg(long, env = "CSE_ADMIN_ORIGINATOR", default_value = "CAdmin")]
    pub admin_originator: String,

    /// oneM2M release version indicator this CSE answers with and expects.
    #[arg(long, env = "CSE_RVI", default_value = "3")]
    pub rvi: String,

    /// Role determining whether this CSE ascends to a registrar, watches
    /// descendants, or both. One of `asn`, `mn`, `in`.
    #[arg(long, env = "CSE_ROLE", default_value = "in")]
    pub role: CseRoleArg,

    /// Registrar CSE base URL to register with, required when `role` ascends.
    #[arg(long, env = "CSE_REGISTRAR_URL")]
    pub registrar_url: Option<String>,

    /// Registrar CSE's CSE-ID.
    #[arg(long, env = "CSE_REGISTRAR_CSI")]
    pub registrar_csi: Option<String>,

    /// Interval between remote-CSE reconciliation ticks, in seconds.
    #[arg(long, env = "CSE_RECONCILE_INTERVAL_SECS", default_value_t = 60)]
    pub reconcile_interval_secs: u64,

    /// Number of times a failed notification delivery is retried.
    #[arg(long, env = "CSE_NOTIFY_RETRY_ATTEMPTS", default_value_t = 1)]
    pub notify_retry_attempts: u32,

    /// Maximum number of queued notifications before the oldest is dropped.
    #[arg(long, env = "CSE_NOTIFY_QUEUE_CAPACITY", default_value_t = 1024)]
    pub notify_queue_capacity: usize,

    /// HTTP bind address for the request gateway.
    #[arg(long, env = "CSE_BIND_ADDRESS", default_value = "127.0.0.1")]
    pub bind_ip: IpAddr,

    /// HTTP bind port for the request gateway.
    #[arg(long, env = "CSE_BIND_PORT", default_value_t = 8080)]
    pub bind_port: u16,

    /// Console log format: `compact` or `json`.
    #[arg(long, env = "CSE_LOG_FORMAT", default_value = "compact")]
    pub log_format: cse_telemetry::LogFormat,

    /// Default log level applied when `RUST_LOG` doesn't cover a target.
    #[arg(long, env = "CSE_LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevelArg,
}

impl CseConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.bind_port)
    }

    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CseRoleArg(pub CseRole);

impl std::str::FromStr for CseRoleArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asn" => Ok(CseRoleArg(CseRole::Asn)),
            "mn" => Ok(CseRoleArg(CseRole::Mn)),
            "in" => Ok(CseRoleArg(CseRole::In)),
            other => Err(format!("unknown CSE role {other}, expected asn, mn, or in")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLevelArg(pub LevelFilter);

impl std::str::FromStr for LogLevelArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<LevelFilter>()
            .map(LogLevelArg)
            .map_err(|_| format!("unknown log level {s}"))
    }
}

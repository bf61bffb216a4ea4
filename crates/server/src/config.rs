// crates/server/src/config.rs
//! Command-line / environment configuration for the console server.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use pim_console_observability::{LogConfig, LogFormat};

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 47900;

/// Default debounce window for job state notifications, in milliseconds.
pub const DEFAULT_FLUSH_MS: u64 = 200;

#[derive(Debug, Clone, Parser)]
#[command(name = "pim-console", version, about = "Job tracker console for the PIM middleware")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(long, env = "PIM_CONSOLE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, env = "PIM_CONSOLE_BIND", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,

    /// How long state changes are coalesced before observers hear about them.
    #[arg(long = "flush-interval-ms", env = "PIM_CONSOLE_FLUSH_MS", default_value_t = DEFAULT_FLUSH_MS)]
    pub flush_interval_ms: u64,

    /// Start with job tracking switched off.
    #[arg(long, env = "PIM_CONSOLE_START_DISABLED")]
    pub start_disabled: bool,

    /// stderr log format: compact or json.
    #[arg(long, env = "PIM_CONSOLE_LOG_FORMAT", default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Write daily-rolling log files into this directory.
    #[arg(long, env = "PIM_CONSOLE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            format: self.log_format,
            directory: self.log_dir.clone(),
            ..LogConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["pim-console"]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.addr(), SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)));
        assert_eq!(config.flush_interval(), Duration::from_millis(200));
        assert!(!config.start_disabled);
        assert_eq!(config.log_format, LogFormat::Compact);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_flags() {
        let config = ServerConfig::try_parse_from([
            "pim-console",
            "--port",
            "9000",
            "--bind",
            "0.0.0.0",
            "--flush-interval-ms",
            "50",
            "--start-disabled",
            "--log-format",
            "json",
            "--log-dir",
            "/tmp/pim-console",
        ])
        .unwrap();
        assert_eq!(config.addr(), SocketAddr::from(([0, 0, 0, 0], 9000)));
        assert_eq!(config.flush_interval(), Duration::from_millis(50));
        assert!(config.start_disabled);

        let log = config.log_config();
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(log.directory, Some(PathBuf::from("/tmp/pim-console")));
    }

    #[test]
    fn test_rejects_bad_log_format() {
        let result = ServerConfig::try_parse_from(["pim-console", "--log-format", "xml"]);
        assert!(result.is_err());
    }
}

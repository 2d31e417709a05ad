//! Server configuration.
//!
//! Defaults reproduce the classic behaviour: 1 KiB request and response head
//! buffers, a backlog of 5, no timeouts, no connection cap and a fatal
//! accept error. A YAML file can override any of it:
//!
//! ```yaml
//! server:
//!   address: 0.0.0.0
//!   port: 8080
//! limits:
//!   max_request_size: 4096
//!   max_connections: 64
//! timeouts:
//!   read_ms: 5000
//! accept_errors: continue
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV: &str = "TINYHTTP_CONFIG";
/// Environment variable overriding the listen address, as `<ip>:<port>`.
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub limits: Limits,
    pub timeouts: Timeouts,
    pub accept_errors: AcceptErrorPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    /// Listen backlog passed to `listen(2)`
    pub backlog: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            backlog: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Size of the single read buffer; longer requests are truncated
    pub max_request_size: usize,
    /// Largest rendered status line + headers
    pub max_response_head_size: usize,
    /// Live connections allowed at once, unbounded when unset
    pub max_connections: Option<usize>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_request_size: 1024,
            max_response_head_size: 1024,
            max_connections: None,
        }
    }
}

/// Per-connection socket timeouts, in milliseconds. Unset means block
/// forever.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub read_ms: Option<u64>,
    pub write_ms: Option<u64>,
}

impl Timeouts {
    pub fn read(&self) -> Option<Duration> {
        self.read_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }

    pub fn write(&self) -> Option<Duration> {
        self.write_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }
}

/// What the accept loop does when `accept` or spawning a thread fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptErrorPolicy {
    /// Stop serving and return the error
    #[default]
    Fatal,
    /// Log the error and keep accepting
    Continue,
}

impl Config {
    /// Loads the config file named by `TINYHTTP_CONFIG` (defaults when
    /// unset), then applies the `LISTEN` override.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(listen) = std::env::var(LISTEN_ENV) {
            cfg.apply_listen(&listen)?;
        }

        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml_str(raw: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Overrides address and port from an `<ip>:<port>` string.
    pub fn apply_listen(&mut self, listen: &str) -> anyhow::Result<()> {
        let addr: SocketAddr = listen
            .parse()
            .with_context(|| format!("invalid listen address `{listen}`"))?;
        self.server.address = addr.ip();
        self.server.port = addr.port();
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.address, self.server.port)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.limits.max_request_size > 0, "limits.max_request_size must be > 0");
        anyhow::ensure!(
            self.limits.max_response_head_size > 0,
            "limits.max_response_head_size must be > 0"
        );
        anyhow::ensure!(self.limits.max_connections != Some(0), "limits.max_connections must be > 0");
        anyhow::ensure!(self.server.backlog > 0, "server.backlog must be > 0");
        Ok(())
    }
}

//! Resolved per-device connection settings.

use std::fmt;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use regex::bytes::Regex;
use secrecy::SecretString;

use crate::error::ConfigError;
use crate::transport::{Endpoint, HostKeyVerification, SshConfig, TelnetConfig};

/// How the console is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAccess {
    /// Interactive SSH shell on the management address.
    Ssh,
    /// Console line behind a telnet terminal server.
    Serial { host: Ipv4Addr, port: u16 },
}

impl CliAccess {
    /// Build the access method from its name and the `serial` aspect.
    pub fn resolve(method: &str, serial: Option<&str>) -> Result<Self, ConfigError> {
        match method.to_ascii_lowercase().as_str() {
            "ssh" => Ok(CliAccess::Ssh),
            "serial" | "telnet" => {
                let serial = serial.ok_or_else(|| ConfigError::Missing {
                    key: "serial".to_string(),
                })?;
                let (host, port) = parse_serial(serial)?;
                Ok(CliAccess::Serial { host, port })
            }
            _ => Err(ConfigError::Invalid {
                key: "cliaccess".to_string(),
                value: method.to_string(),
                reason: "expected ssh or serial".to_string(),
            }),
        }
    }

    /// Whether this is the serial console.
    pub fn is_serial(&self) -> bool {
        matches!(self, CliAccess::Serial { .. })
    }
}

impl fmt::Display for CliAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliAccess::Ssh => write!(f, "ssh"),
            CliAccess::Serial { host, port } => write!(f, "serial {}:{}", host, port),
        }
    }
}

/// Parse `<ipv4>:<port>`.
pub(crate) fn parse_serial(value: &str) -> Result<(Ipv4Addr, u16), ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        key: "serial".to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let (host, port) = value
        .trim()
        .split_once(':')
        .ok_or_else(|| invalid("expected <ipv4>:<port>"))?;
    let host = host
        .parse::<Ipv4Addr>()
        .map_err(|_| invalid("not an IPv4 address"))?;
    let port = port.parse::<u16>().map_err(|_| invalid("not a port"))?;
    Ok((host, port))
}

/// Timing used by login and command dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Wait for the first prompt after connecting.
    pub login: Duration,
    /// Default wait for a prompt after each command.
    pub command: Duration,
    /// Wait per attempt while disambiguating a serial console.
    pub serial_read: Duration,
    /// Extra wait for a config suffix after an enable prompt at login.
    pub login_settle: Duration,
    /// Extra wait for a config suffix after an enable prompt on the serial console.
    pub command_settle: Duration,
    /// Pause before closing after a command that ends the session.
    pub exit_grace: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            login: Duration::from_secs(10),
            command: Duration::from_secs(120),
            serial_read: Duration::from_secs(3),
            login_settle: Duration::from_millis(250),
            command_settle: Duration::from_secs(1),
            exit_grace: Duration::from_secs(2),
        }
    }
}

/// Parse a duration given in (possibly fractional) seconds.
pub(crate) fn parse_seconds(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
        .ok_or_else(|| ConfigError::Invalid {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a number of seconds".to_string(),
        })
}

/// Default residue left on a serial line after the pager is dismissed.
pub const DEFAULT_PAGER_RESIDUE: &str = r"--More--\x08{8} {8}\x08{8}";

/// Everything needed to open and drive one appliance console.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    /// Device name, e.g. `proxysg_1`.
    pub device: String,
    /// Management address; required for SSH.
    pub ipaddr: Option<String>,
    pub username: String,
    pub password: SecretString,
    pub enable_password: SecretString,
    pub access: CliAccess,
    pub ssh_port: u16,
    pub host_key_verification: HostKeyVerification,
    pub known_hosts_path: Option<PathBuf>,
    /// Removed from serial output before cleanup.
    pub pager_residue: Regex,
    /// Keystroke sent at a pager prompt during a command.
    pub pager_key: String,
    pub timeouts: Timeouts,
}

impl ConnectionParams {
    /// Short index used to tag log records: the last character of the device name.
    pub fn index(&self) -> String {
        self.device
            .chars()
            .last()
            .map(String::from)
            .unwrap_or_default()
    }

    /// Address shown in error messages.
    pub fn address(&self) -> String {
        match &self.access {
            CliAccess::Ssh => self.ipaddr.clone().unwrap_or_default(),
            CliAccess::Serial { host, port } => format!("{}:{}", host, port),
        }
    }

    /// Transport endpoint for the configured access method.
    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        match &self.access {
            CliAccess::Ssh => {
                let host = self.ipaddr.clone().ok_or_else(|| ConfigError::Missing {
                    key: format!("{}.ipaddr", self.device),
                })?;
                Ok(Endpoint::Ssh(SshConfig {
                    host,
                    port: self.ssh_port,
                    username: self.username.clone(),
                    password: self.password.clone(),
                    timeout: self.timeouts.login,
                    terminal_width: 1000,
                    terminal_height: 1000,
                    host_key_verification: self.host_key_verification.clone(),
                    known_hosts_path: self.known_hosts_path.clone(),
                }))
            }
            CliAccess::Serial { host, port } => Ok(Endpoint::Telnet(TelnetConfig {
                host: host.to_string(),
                port: *port,
                timeout: self.timeouts.login,
            })),
        }
    }
}

impl FromStr for CliAccess {
    type Err = ConfigError;

    /// Parse `ssh` or `<ipv4>:<port>` (a serial console line).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ssh") {
            return Ok(CliAccess::Ssh);
        }
        let (host, port) = parse_serial(s)?;
        Ok(CliAccess::Serial { host, port })
    }
}

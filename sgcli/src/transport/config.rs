//! Connection configuration for the console transports.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys. Connection fails if the host
    /// is not already in known_hosts.
    Strict,

    /// Accept and auto-learn unknown keys, but reject changed keys.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. For lab appliances that are
    /// re-imaged often.
    Disabled,
}

impl FromStr for HostKeyVerification {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "accept-new" | "accept_new" => Ok(Self::AcceptNew),
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            _ => Err(ConfigError::Invalid {
                key: "hostkey".to_string(),
                value: s.to_string(),
                reason: "expected strict, accept-new or disabled".to_string(),
            }),
        }
    }
}

/// SSH connection configuration.
#[derive(Debug)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port (default: 22).
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Password for authentication.
    pub password: SecretString,

    /// Connection timeout.
    pub timeout: Duration,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file.
    pub known_hosts_path: Option<PathBuf>,
}

/// Telnet (serial terminal server) connection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelnetConfig {
    /// Terminal server address.
    pub host: String,

    /// Terminal server port for the console line.
    pub port: u16,

    /// Connection timeout.
    pub timeout: Duration,
}

/// Where and how to reach a console.
#[derive(Debug)]
pub enum Endpoint {
    /// Interactive shell over SSH.
    Ssh(SshConfig),
    /// Raw console line behind a terminal server.
    Telnet(TelnetConfig),
}

impl Endpoint {
    /// `host:port` of the endpoint.
    pub fn socket_addr(&self) -> String {
        match self {
            Endpoint::Ssh(config) => format!("{}:{}", config.host, config.port),
            Endpoint::Telnet(config) => format!("{}:{}", config.host, config.port),
        }
    }
}

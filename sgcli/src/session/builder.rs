//! Builder for creating appliance sessions.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use regex::bytes::Regex;
use secrecy::SecretString;

use super::Session;
use crate::config::{
    Aspects, CliAccess, ConnectionParams, DEFAULT_PAGER_RESIDUE, Timeouts, parse_seconds,
};
use crate::error::{ChannelError, ConfigError, Result};
use crate::transport::{Dialer, HostKeyVerification, NetworkDialer};

const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_PASSWORD: &str = "admin";
const DEFAULT_ACCESS: &str = "ssh";

/// Builder for constructing appliance sessions.
///
/// Each setting is taken from an explicit setter if one was called, then
/// from `aspects[device].<key>`, then from the built-in default.
///
/// # Example
///
/// ```rust,no_run
/// use sgcli::{Aspects, SessionBuilder};
///
/// # async fn example() -> Result<(), sgcli::Error> {
/// let aspects = Aspects::load("lab.toml")?;
/// let mut session = SessionBuilder::new("proxysg_1")
///     .aspects(&aspects)
///     .password("secret")
///     .build()?;
///
/// let clock = session.command("show clock", None).await?;
/// println!("{}", clock);
/// session.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    device: String,
    aspects: Option<Aspects>,
    ipaddr: Option<String>,
    username: Option<String>,
    password: Option<String>,
    enable_password: Option<String>,
    cliaccess: Option<String>,
    serial: Option<String>,
    ssh_port: Option<u16>,
    host_key_verification: Option<HostKeyVerification>,
    known_hosts_path: Option<PathBuf>,
    pager_residue: Option<String>,
    pager_key: String,
    login_timeout: Option<Duration>,
    command_timeout: Option<Duration>,
}

impl SessionBuilder {
    /// Create a builder for the named device, e.g. `proxysg_1`.
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            aspects: None,
            ipaddr: None,
            username: None,
            password: None,
            enable_password: None,
            cliaccess: None,
            serial: None,
            ssh_port: None,
            host_key_verification: None,
            known_hosts_path: None,
            pager_residue: None,
            pager_key: " ".to_string(),
            login_timeout: None,
            command_timeout: None,
        }
    }

    /// Look up unset parameters in these aspects.
    pub fn aspects(mut self, aspects: &Aspects) -> Self {
        self.aspects = Some(aspects.clone());
        self
    }

    /// Set the management address.
    pub fn ipaddr(mut self, ipaddr: impl Into<String>) -> Self {
        self.ipaddr = Some(ipaddr.into());
        self
    }

    /// Set the login username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the login password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the password answered at `Enable Password:`.
    pub fn enable_password(mut self, password: impl Into<String>) -> Self {
        self.enable_password = Some(password.into());
        self
    }

    /// Set the access method, `ssh` or `serial`.
    pub fn cliaccess(mut self, method: impl Into<String>) -> Self {
        self.cliaccess = Some(method.into());
        self
    }

    /// Set the serial terminal server line as `<ipv4>:<port>`.
    pub fn serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    /// Set the SSH port (default: 22).
    pub fn ssh_port(mut self, port: u16) -> Self {
        self.ssh_port = Some(port);
        self
    }

    /// Set the host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = Some(mode);
        self
    }

    /// Use a specific known_hosts file.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Set the regex removed from serial output before cleanup.
    pub fn pager_residue(mut self, pattern: impl Into<String>) -> Self {
        self.pager_residue = Some(pattern.into());
        self
    }

    /// Set the keystroke sent at a `--More--` prompt during a command (default: space).
    pub fn pager_key(mut self, key: impl Into<String>) -> Self {
        self.pager_key = key.into();
        self
    }

    /// Set the wait for the first prompt after connecting.
    pub fn login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = Some(timeout);
        self
    }

    /// Set the default wait for a prompt after each command.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let aspects = self.aspects.as_ref()?;
        aspects
            .table(&self.device)?
            .get_str(key)
            .map(str::to_string)
    }

    fn resolve(&self, explicit: &Option<String>, key: &str) -> Option<String> {
        explicit.clone().or_else(|| self.lookup(key))
    }

    fn resolve_duration(&self, explicit: Option<Duration>, key: &str) -> Result<Option<Duration>> {
        if explicit.is_some() {
            return Ok(explicit);
        }
        match self.lookup(key) {
            Some(value) => Ok(Some(parse_seconds(key, &value)?)),
            None => Ok(None),
        }
    }

    /// Resolve and validate the connection parameters without building a session.
    pub fn params(&self) -> Result<ConnectionParams> {
        let method = self
            .resolve(&self.cliaccess, "cliaccess")
            .unwrap_or_else(|| DEFAULT_ACCESS.to_string());
        let serial = self.resolve(&self.serial, "serial");
        let access = CliAccess::resolve(&method, serial.as_deref())?;

        let ipaddr = self.resolve(&self.ipaddr, "ipaddr");
        if access == CliAccess::Ssh && ipaddr.is_none() {
            return Err(ConfigError::Missing {
                key: format!("{}.ipaddr", self.device),
            }
            .into());
        }

        let ssh_port = match (self.ssh_port, self.lookup("ssh_port")) {
            (Some(port), _) => port,
            (None, Some(value)) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "ssh_port".to_string(),
                value: value.clone(),
                reason: "not a port".to_string(),
            })?,
            (None, None) => 22,
        };

        let host_key_verification = match (&self.host_key_verification, self.lookup("hostkey")) {
            (Some(mode), _) => mode.clone(),
            (None, Some(value)) => HostKeyVerification::from_str(&value)?,
            (None, None) => HostKeyVerification::default(),
        };

        let residue = self
            .resolve(&self.pager_residue, "pager_residue")
            .unwrap_or_else(|| DEFAULT_PAGER_RESIDUE.to_string());
        let pager_residue = Regex::new(&residue).map_err(ChannelError::InvalidPattern)?;

        let mut timeouts = Timeouts::default();
        if let Some(login) = self.resolve_duration(self.login_timeout, "login_timeout")? {
            timeouts.login = login;
        }
        if let Some(command) = self.resolve_duration(self.command_timeout, "command_timeout")? {
            timeouts.command = command;
        }

        let secret = |explicit: &Option<String>, key: &str| {
            SecretString::from(
                self.resolve(explicit, key)
                    .unwrap_or_else(|| DEFAULT_PASSWORD.to_string()),
            )
        };

        Ok(ConnectionParams {
            device: self.device.clone(),
            ipaddr,
            username: self
                .resolve(&self.username, "username")
                .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            password: secret(&self.password, "password"),
            enable_password: secret(&self.enable_password, "password_enable"),
            access,
            ssh_port,
            host_key_verification,
            known_hosts_path: self.known_hosts_path.clone(),
            pager_residue,
            pager_key: self.pager_key.clone(),
            timeouts,
        })
    }

    /// Build a session on the network transports.
    ///
    /// This resolves the parameters but does not connect; the first command
    /// logs in.
    pub fn build(self) -> Result<Session> {
        self.build_with(NetworkDialer)
    }

    /// Build a session that opens its console through `dialer`.
    pub fn build_with<D: Dialer>(self, dialer: D) -> Result<Session<D>> {
        Ok(Session::new(self.params()?, dialer))
    }
}

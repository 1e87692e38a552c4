//! Error types for sgcli.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for sgcli operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level errors (SSH, telnet, TCP)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Console session errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration lookup errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Transport layer errors (connection, authentication, stream I/O).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Host is not in known_hosts and strict checking is enabled
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (pattern compilation).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Console session errors (login, command dispatch, context handling).
#[derive(Error, Debug)]
pub enum SessionError {
    /// No usable prompt during login
    #[error("Login to {device} ({address}) failed: {reason}")]
    LoginTimeout {
        device: String,
        address: String,
        reason: String,
    },

    /// No recognized prompt within the command timeout
    #[error("Command '{command}' timed out after {timeout:?} on {device} ({address})")]
    CommandTimeout {
        command: String,
        device: String,
        address: String,
        timeout: Duration,
    },

    /// Requested context is not one the console can be driven to
    #[error("Bad command context: {requested}")]
    BadContextRequest { requested: String },

    /// Reconciliation did not reach the requested context
    #[error("Could not reach context {target} from {current} after {steps} commands")]
    ContextUnreachable {
        current: String,
        target: String,
        steps: usize,
    },

    /// Final output of a batch did not contain any expected pattern
    #[error("command: {command} did not return: {expected:?} in output")]
    BatchCheckFailed {
        command: String,
        expected: Vec<String>,
    },

    /// Output did not contain an expected field
    #[error("Could not find {what} in output of '{command}'")]
    UnexpectedOutput { command: String, what: String },

    /// Device did not answer pings in time
    #[error("{address} not reachable after {waited:?}")]
    NotReachable { address: String, waited: Duration },

    /// Build number is not a plain release id
    #[error("build number format: {build}")]
    InvalidBuild { build: String },

    /// No installed system image holds the build
    #[error("build {build} is not among the installed systems")]
    BuildNotInstalled { build: String },

    /// Appliance came back running another build
    #[error("load build did not match, expected: {expected}, have: {found}")]
    BuildMismatch { expected: String, found: String },

    /// No live connector
    #[error("Session not connected")]
    NotConnected,
}

/// Configuration lookup errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required parameter absent after precedence resolution
    #[error("Need aspect: {key}")]
    Missing { key: String },

    /// Parameter present but unusable
    #[error("Bad value for '{key}': {value} ({reason})")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    /// Write through a dotted key hit a scalar
    #[error("cannot set '{rest}' in '{key}': not a table")]
    NotATable { key: String, rest: String },

    /// Configuration file has no `[aspects]` table
    #[error("configuration file must contain an [aspects] table")]
    MissingSection,

    /// Configuration file is not valid TOML
    #[error("TOML error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias using sgcli's Error.
pub type Result<T> = std::result::Result<T, Error>;

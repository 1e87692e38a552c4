//! Transport layer: byte streams to the appliance console.
//!
//! The expect engine only needs three operations from a stream, captured by
//! [`Transport`]. A [`Dialer`] opens transports for an [`Endpoint`] and
//! pings hosts; [`NetworkDialer`] is the real network binding.

pub mod config;
mod ssh;
mod telnet;

pub use config::{Endpoint, HostKeyVerification, SshConfig, TelnetConfig};
pub use ssh::SshTransport;
pub use telnet::TelnetTransport;

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use log::debug;
use tokio::process::Command;

use crate::error::Result;

/// A bidirectional console byte stream.
pub trait Transport: Send {
    /// Write all of `data`.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Wait for data and return at most `max` bytes.
    ///
    /// An empty vector means the peer closed the stream.
    fn read(&mut self, max: usize) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Close the stream.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Opens console transports and checks whether a host answers.
pub trait Dialer: Send + Sync {
    /// The transport produced by this dialer.
    type Transport: Transport;

    /// Connect to `endpoint`.
    fn dial(&self, endpoint: &Endpoint) -> impl Future<Output = Result<Self::Transport>> + Send;

    /// Single ping that waits at most `timeout` for an answer.
    fn ping(&self, address: &str, timeout: Duration) -> impl Future<Output = bool> + Send;
}

/// Either of the two real console transports.
pub enum NetworkTransport {
    /// SSH interactive shell.
    Ssh(Box<SshTransport>),
    /// Telnet console line.
    Telnet(TelnetTransport),
}

impl Transport for NetworkTransport {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        match self {
            NetworkTransport::Ssh(t) => t.write(data).await,
            NetworkTransport::Telnet(t) => t.write(data).await,
        }
    }

    async fn read(&mut self, max: usize) -> Result<Vec<u8>> {
        match self {
            NetworkTransport::Ssh(t) => t.read(max).await,
            NetworkTransport::Telnet(t) => t.read(max).await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            NetworkTransport::Ssh(t) => t.close().await,
            NetworkTransport::Telnet(t) => t.close().await,
        }
    }
}

/// Dialer for real SSH and telnet endpoints; pings with the system `ping`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkDialer;

impl Dialer for NetworkDialer {
    type Transport = NetworkTransport;

    async fn dial(&self, endpoint: &Endpoint) -> Result<NetworkTransport> {
        match endpoint {
            Endpoint::Ssh(config) => Ok(NetworkTransport::Ssh(Box::new(
                SshTransport::connect(config).await?,
            ))),
            Endpoint::Telnet(config) => Ok(NetworkTransport::Telnet(
                TelnetTransport::connect(config).await?,
            )),
        }
    }

    async fn ping(&self, address: &str, timeout: Duration) -> bool {
        let mut command = ping_command(address, timeout);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let grace = timeout + Duration::from_secs(1);
        match tokio::time::timeout(grace, command.status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                debug!("ping {} failed to run: {}", address, e);
                false
            }
            Err(_) => false,
        }
    }
}

/// One-packet ping with a reply window of `timeout`.
fn ping_command(address: &str, timeout: Duration) -> Command {
    let mut command = Command::new("ping");
    if cfg!(windows) {
        command
            .args(["-n", "1", "-w"])
            .arg(timeout.as_millis().to_string());
    } else if cfg!(any(target_os = "macos", target_os = "freebsd")) {
        command
            .args(["-c", "1", "-t"])
            .arg(timeout.as_secs().max(1).to_string());
    } else {
        command
            .args(["-c", "1", "-W"])
            .arg(timeout.as_secs().max(1).to_string());
    }
    command.arg(address);
    command
}

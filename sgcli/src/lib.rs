//! # sgcli
//!
//! Async console automation for ProxySG appliances.
//!
//! sgcli drives the appliance command line over an SSH shell or a serial
//! console behind a telnet terminal server. It recognizes the console's
//! prompts with an ordered pattern set, tracks which mode the console is in,
//! and walks it to the mode a command needs before sending it.
//!
//! ## Features
//!
//! - Async SSH shells via russh, telnet console lines framed with a
//!   tokio-util codec over libtelnet-rs
//! - Expect engine with declaration-order pattern priority
//! - Serial login that copes with menus, pagers and half-received prompts
//! - Context tracking (`>`, `#`, `#(config)`, `#(config ...)`) with automatic
//!   `enable` / `configure terminal` / `exit` walks
//! - Automatic answers to confirmation, pager and enable password prompts
//! - Appliance helpers: version, restart, switching installed builds
//! - Dotted-key configuration ("aspects") loaded from TOML
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sgcli::{CliContext, SessionBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sgcli::Error> {
//!     let mut session = SessionBuilder::new("proxysg_1")
//!         .ipaddr("192.168.1.10")
//!         .username("admin")
//!         .password("secret")
//!         .build()?;
//!
//!     let cpu = session.command("show cpu", Some(CliContext::Enable)).await?;
//!     println!("{}", cpu);
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod appliance;
pub mod channel;
pub mod config;
pub mod error;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use appliance::{ApplianceInfo, RestartMode};
pub use config::{Aspects, CliAccess, ConnectionParams};
pub use error::Error;
pub use session::{CliContext, CommandOptions, Confirmation, Session, SessionBuilder};
pub use transport::{HostKeyVerification, NetworkDialer};

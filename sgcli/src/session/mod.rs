//! Appliance console sessions.
//!
//! A [`Session`] owns at most one live console and the context it was last
//! seen in. Every command first walks the console to the requested
//! [`CliContext`] with `enable`, `configure terminal` and `exit`, then sends
//! the command and reads up to the next prompt. Confirmation challenges,
//! pagers and the enable password are answered without returning to the
//! caller.
//!
//! Commands and responses are logged on the `sgcmd` and `sgout` targets,
//! tagged with the device index.

mod builder;
mod context;
mod login;
mod response;

pub use builder::SessionBuilder;
pub use context::{CliContext, MAX_RECONCILE_STEPS, Step, next_step};
pub use login::SERIAL_LOGIN_ATTEMPTS;
pub use response::{Confirmation, clean_serial_output, clean_ssh_output};

use std::time::Duration;

use log::{debug, info, warn};
use regex::bytes::RegexBuilder;
use tokio::time::Instant;

use crate::channel::ExpectChannel;
use crate::config::ConnectionParams;
use crate::error::{ChannelError, ConfigError, Result, SessionError};
use crate::transport::{Dialer, NetworkDialer};
use response::{Ending, read_response};

/// Reply window of a single ping.
pub const PING_WINDOW: Duration = Duration::from_secs(2);

/// Default hold before probing after a restart.
pub const DEFAULT_INIT_WAIT: Duration = Duration::from_secs(15);
/// Default budget for the appliance to answer pings again.
pub const DEFAULT_PING_WAIT: Duration = Duration::from_secs(300);
/// Default hold after the appliance answers.
pub const DEFAULT_END_WAIT: Duration = Duration::from_secs(15);

/// Per-command settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandOptions {
    context: Option<CliContext>,
    timeout: Option<Duration>,
    confirmation: Confirmation,
}

impl CommandOptions {
    /// Defaults: current context, session timeout, confirm with yes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk to `context` before sending the command.
    pub fn context(mut self, context: CliContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Wait this long for each prompt instead of the session default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Answer confirmation challenges this way.
    pub fn confirmation(mut self, confirmation: Confirmation) -> Self {
        self.confirmation = confirmation;
        self
    }
}

/// A console session with one appliance.
pub struct Session<D: Dialer = NetworkDialer> {
    params: ConnectionParams,
    dialer: D,
    console: Option<ExpectChannel<D::Transport>>,
    context: Option<CliContext>,
}

impl<D: Dialer> Session<D> {
    pub(crate) fn new(params: ConnectionParams, dialer: D) -> Self {
        Self {
            params,
            dialer,
            console: None,
            context: None,
        }
    }

    /// Resolved connection parameters.
    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Context of the last prompt seen, `None` when not logged in.
    pub fn context(&self) -> Option<CliContext> {
        self.context
    }

    /// Whether a console is connected.
    pub fn is_open(&self) -> bool {
        self.console.is_some()
    }

    /// Connect and log in, unless already connected.
    pub async fn open(&mut self) -> Result<()> {
        if self.console.is_some() {
            return Ok(());
        }

        let endpoint = self.params.endpoint()?;
        debug!(
            "[{}] connecting to {} ({})",
            self.params.index(),
            endpoint.socket_addr(),
            self.params.access
        );

        let transport = self.dialer.dial(&endpoint).await?;
        let mut console = ExpectChannel::new(transport);

        let login = if self.params.access.is_serial() {
            login::login_serial(&mut console, &self.params).await
        } else {
            login::login_ssh(&mut console, &self.params).await
        };

        match login {
            Ok(context) => {
                debug!("[{}] logged in at {}", self.params.index(), context);
                self.console = Some(console);
                self.context = Some(context);
                Ok(())
            }
            Err(e) => {
                if let Err(close) = console.close().await {
                    debug!("[{}] close after failed login: {}", self.params.index(), close);
                }
                Err(e)
            }
        }
    }

    /// Send a command from the current context with default options.
    ///
    /// With `context` set, the console is first walked to that context.
    /// Returns the output without the echoed command and the prompt.
    pub async fn command(&mut self, command: &str, context: Option<CliContext>) -> Result<String> {
        let options = CommandOptions {
            context,
            ..CommandOptions::default()
        };
        self.command_with(command, options).await
    }

    /// Send a command with explicit options.
    pub async fn command_with(&mut self, command: &str, options: CommandOptions) -> Result<String> {
        let timeout = options.timeout.unwrap_or(self.params.timeouts.command);

        if let Some(target) = options.context {
            self.reconcile(target, timeout, options.confirmation)
                .await?;
        }
        self.open().await?;

        if options.context == Some(CliContext::Exit) {
            return self.send_exit(command).await;
        }
        self.send(command, timeout, options.confirmation).await
    }

    /// Send commands in order and return the last output.
    ///
    /// Only the first command is walked to `context`. When `check` is not
    /// empty, at least one of its case-insensitive patterns must match the
    /// last output.
    pub async fn command_batch(
        &mut self,
        context: Option<CliContext>,
        batch: &[&str],
        check: &[&str],
    ) -> Result<String> {
        let checks = check
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(ChannelError::InvalidPattern)
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut context = context;
        let mut output = String::new();
        let mut last = "";
        for &command in batch {
            output = self.command(command, context.take()).await?;
            last = command;
        }

        if !checks.is_empty() && !checks.iter().any(|re| re.is_match(output.as_bytes())) {
            return Err(SessionError::BatchCheckFailed {
                command: last.to_string(),
                expected: check.iter().map(|s| s.to_string()).collect(),
            }
            .into());
        }
        Ok(output)
    }

    /// Wait for the appliance to come back after a restart.
    ///
    /// Holds for `init`, pings the management address until it answers
    /// (giving up once `ping` worth of windows have failed), then holds for
    /// `end`.
    pub async fn wait(&mut self, init: Duration, ping: Duration, end: Duration) -> Result<()> {
        let address = self
            .params
            .ipaddr
            .clone()
            .ok_or_else(|| ConfigError::Missing {
                key: format!("{}.ipaddr", self.params.device),
            })?;

        tokio::time::sleep(init).await;

        let mut waited = Duration::ZERO;
        loop {
            let started = Instant::now();
            if self.dialer.ping(&address, PING_WINDOW).await {
                break;
            }

            waited += PING_WINDOW;
            if waited > ping {
                return Err(SessionError::NotReachable { address, waited }.into());
            }

            let spent = started.elapsed();
            if spent < PING_WINDOW {
                tokio::time::sleep(PING_WINDOW - spent).await;
            }
        }

        debug!("[{}] {} answers after {:?}", self.params.index(), address, waited);
        tokio::time::sleep(end).await;
        Ok(())
    }

    /// [`wait`](Self::wait) with the default restart schedule.
    pub async fn wait_default(&mut self) -> Result<()> {
        self.wait(DEFAULT_INIT_WAIT, DEFAULT_PING_WAIT, DEFAULT_END_WAIT)
            .await
    }

    /// Close the console. The next command logs in again.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(console) = self.console.take() {
            self.context = None;
            console.close().await?;
        }
        Ok(())
    }

    /// Issue intermediate commands until the console is in `target`.
    async fn reconcile(
        &mut self,
        target: CliContext,
        timeout: Duration,
        confirmation: Confirmation,
    ) -> Result<()> {
        let mut steps = 0;
        loop {
            self.open().await?;
            let current = self.context.unwrap_or(CliContext::Root);

            match next_step(current, target)? {
                Step::Done | Step::Stop => return Ok(()),
                Step::Send(step) => {
                    if steps == MAX_RECONCILE_STEPS {
                        return Err(SessionError::ContextUnreachable {
                            current: current.to_string(),
                            target: target.to_string(),
                            steps,
                        }
                        .into());
                    }
                    steps += 1;
                    debug!("[{}] {} -> {}: {}", self.params.index(), current, target, step);
                    self.send(step, timeout, confirmation).await?;
                }
            }
        }
    }

    /// Send one line and read its response up to the next prompt.
    async fn send(
        &mut self,
        command: &str,
        timeout: Duration,
        confirmation: Confirmation,
    ) -> Result<String> {
        let index = self.params.index();
        info!(target: "sgcmd", "[{}] {}", index, command);

        let console = self.console.as_mut().ok_or(SessionError::NotConnected)?;
        let result = match console.send_line(command).await {
            Ok(()) => read_response(console, &self.params, timeout, confirmation).await,
            Err(e) => Err(e),
        };

        let (ending, raw) = match result {
            Ok(read) => read,
            Err(e) => {
                warn!("[{}] console failed during '{}': {}", index, command, e);
                self.teardown(None).await;
                return Err(e);
            }
        };

        match ending {
            Ending::Prompt(context) => self.context = Some(context),
            Ending::Eof => {
                debug!("[{}] console closed during '{}'", index, command);
                self.teardown(Some(CliContext::Root)).await;
            }
            Ending::Timeout => {
                self.teardown(None).await;
                return Err(SessionError::CommandTimeout {
                    command: command.to_string(),
                    device: self.params.device.clone(),
                    address: self.params.address(),
                    timeout,
                }
                .into());
            }
        }

        let output = if self.params.access.is_serial() {
            clean_serial_output(&raw, &self.params.pager_residue)
        } else {
            clean_ssh_output(&raw)
        };
        info!(target: "sgout", "[{}] {}", index, output);
        Ok(output)
    }

    /// Send a line that ends the session and drop the console.
    async fn send_exit(&mut self, command: &str) -> Result<String> {
        info!(target: "sgcmd", "[{}] {}", self.params.index(), command);

        let console = self.console.as_mut().ok_or(SessionError::NotConnected)?;
        if let Err(e) = console.send_line(command).await {
            self.teardown(None).await;
            return Err(e);
        }

        tokio::time::sleep(self.params.timeouts.exit_grace).await;
        self.teardown(None).await;
        Ok(String::new())
    }

    /// Drop the console, ignoring close errors, and record `context`.
    async fn teardown(&mut self, context: Option<CliContext>) {
        self.context = context;
        if let Some(console) = self.console.take() {
            if let Err(e) = console.close().await {
                debug!("[{}] close: {}", self.params.index(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::assert_ok;

    use super::*;
    use crate::Error;
    use crate::error::TransportError;
    use crate::testing::{FakeAppliance, MockDialer, Reply};

    fn ssh_session(dialer: &MockDialer) -> Session<MockDialer> {
        SessionBuilder::new("proxysg_1")
            .ipaddr("10.0.0.5")
            .enable_password("s3cret")
            .build_with(dialer.clone())
            .unwrap()
    }

    fn serial_session(dialer: &MockDialer) -> Session<MockDialer> {
        SessionBuilder::new("proxysg_2")
            .cliaccess("serial")
            .serial("10.0.0.200:2005")
            .build_with(dialer.clone())
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_in_current_context() {
        let dialer = MockDialer::new();
        FakeAppliance::new(CliContext::Root)
            .with_output("show clock", "Local time: 10:00:00 UTC\r\n")
            .install(&dialer);
        let mut session = ssh_session(&dialer);

        let output = session.command("show clock", None).await.unwrap();

        assert_eq!(output, "Local time: 10:00:00 UTC");
        assert_eq!(dialer.handle.writes(), vec!["show clock\r"]);
        assert_eq!(session.context(), Some(CliContext::Root));
        assert!(session.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_enters_enable_first() {
        let dialer = MockDialer::new();
        FakeAppliance::new(CliContext::Root)
            .with_output("show cpu", "CPU 0: 3%\r\n")
            .install(&dialer);
        let mut session = ssh_session(&dialer);

        let output = session
            .command("show cpu", Some(CliContext::Enable))
            .await
            .unwrap();

        assert_eq!(output, "CPU 0: 3%");
        assert_eq!(dialer.handle.writes(), vec!["enable\r", "show cpu\r"]);
        assert_eq!(session.context(), Some(CliContext::Enable));
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_context_sends_nothing_extra() {
        let dialer = MockDialer::new();
        FakeAppliance::new(CliContext::Root).install(&dialer);
        let mut session = ssh_session(&dialer);

        assert_ok!(session.command("show clock", Some(CliContext::Root)).await);
        assert_eq!(dialer.handle.writes(), vec!["show clock\r"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_config_tree_to_config_is_one_exit() {
        let dialer = MockDialer::new();
        FakeAppliance::new(CliContext::ConfigTree)
            .with_output("show", "ok\r\n")
            .install_serial(&dialer);
        let mut session = serial_session(&dialer);

        assert_ok!(session.open().await);
        assert_eq!(session.context(), Some(CliContext::ConfigTree));

        let output = session
            .command("show", Some(CliContext::Config))
            .await
            .unwrap();

        assert_eq!(output, "ok");
        assert_eq!(dialer.handle.writes(), vec!["\r", "exit\r", "show\r"]);
        assert_eq!(session.context(), Some(CliContext::Config));
    }

    #[tokio::test(start_paused = true)]
    async fn test_walks_up_to_config() {
        let dialer = MockDialer::new();
        FakeAppliance::new(CliContext::Root).install(&dialer);
        let mut session = ssh_session(&dialer);

        assert_ok!(session.command("ssl", Some(CliContext::Config)).await);
        assert_eq!(
            dialer.handle.writes(),
            vec!["enable\r", "configure terminal\r", "ssl\r"]
        );
        assert_eq!(session.context(), Some(CliContext::ConfigTree));
    }

    #[tokio::test(start_paused = true)]
    async fn test_config_tree_cannot_be_requested_from_root() {
        let dialer = MockDialer::new();
        FakeAppliance::new(CliContext::Root).install(&dialer);
        let mut session = ssh_session(&dialer);

        let err = session
            .command("show", Some(CliContext::ConfigTree))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::BadContextRequest { .. })
        ));
        assert!(dialer.handle.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmation_declined() {
        let dialer = MockDialer::new();
        FakeAppliance::new(CliContext::Root)
            .with_confirmation("restart regular", "Really restart? [No]", "Restarting\r\n")
            .install(&dialer);
        let mut session = ssh_session(&dialer);

        let output = session
            .command_with(
                "restart regular",
                CommandOptions::new().confirmation(Confirmation::No),
            )
            .await
            .unwrap();

        let writes = dialer.handle.writes();
        assert_eq!(writes, vec!["restart regular\r", "no\r"]);
        assert!(!writes.iter().any(|w| w == "yes\r"));
        assert_eq!(output, "aborted");
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmation_accepted_by_default() {
        let dialer = MockDialer::new();
        FakeAppliance::new(CliContext::Root)
            .with_confirmation("clear arp", "Clear the ARP table (yes/no)? ", "Cleared\r\n")
            .install(&dialer);
        let mut session = ssh_session(&dialer);

        let output = session.command("clear arp", None).await.unwrap();

        assert_eq!(dialer.handle.writes(), vec!["clear arp\r", "yes\r"]);
        assert!(output.ends_with("Cleared"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_password_is_answered() {
        let dialer = MockDialer::new();
        FakeAppliance::new(CliContext::Root)
            .with_enable_password("s3cret")
            .install(&dialer);
        let mut session = ssh_session(&dialer);

        assert_ok!(session.command("show cpu", Some(CliContext::Enable)).await);
        assert_eq!(
            dialer.handle.writes(),
            vec!["enable\r", "s3cret\r", "show cpu\r"]
        );
        assert_eq!(session.context(), Some(CliContext::Enable));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pager_is_advanced() {
        let dialer = MockDialer::new();
        dialer.handle.set_greeting("proxysg>");
        dialer.handle.on_write(|written| match written {
            "show log\r" => vec![Reply::Text("show log\r\nline 1\r\n--More--".to_string())],
            " " => vec![Reply::Text("\r\nline 2\r\nproxysg>".to_string())],
            _ => Vec::new(),
        });
        let mut session = ssh_session(&dialer);

        let output = session.command("show log", None).await.unwrap();

        assert!(output.starts_with("line 1"));
        assert!(output.ends_with("line 2"));
        assert_eq!(dialer.handle.writes(), vec!["show log\r", " "]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eof_mid_command() {
        let dialer = MockDialer::new();
        dialer.handle.set_greeting("proxysg>");
        dialer.handle.on_write(|written| match written {
            "show log\r" => vec![
                Reply::Text("show log\r\npartial line\r\n".to_string()),
                Reply::Close,
            ],
            _ => Vec::new(),
        });
        let mut session = ssh_session(&dialer);

        let output = session.command("show log", None).await.unwrap();

        assert_eq!(output, "partial line");
        assert_eq!(session.context(), Some(CliContext::Root));
        assert!(!session.is_open());
        assert_eq!(dialer.handle.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_failure_tears_down_and_next_command_logs_in() {
        let dialer = MockDialer::new();
        FakeAppliance::new(CliContext::Root)
            .with_output("show clock", "Local time: 10:00:00 UTC\r\n")
            .install(&dialer);
        let mut session = ssh_session(&dialer);
        assert_ok!(session.open().await);

        // Peer goes away; the next write fails
        dialer.handle.close_after_output();
        let err = session.command("show clock", None).await.unwrap_err();

        assert!(matches!(err, Error::Transport(TransportError::Disconnected)));
        assert!(!session.is_open());
        assert_eq!(session.context(), None);
        assert_eq!(dialer.handle.closes(), 1);

        let output = session.command("show clock", None).await.unwrap();
        assert_eq!(output, "Local time: 10:00:00 UTC");
        assert_eq!(dialer.handle.dials(), 2);
        assert_eq!(session.context(), Some(CliContext::Root));
    }

    #[tokio::test(start_paused = true)]
    async fn test_serial_login_close_after_enable_is_not_kept() {
        let dialer = MockDialer::new();
        dialer.handle.set_greeting("");
        let mut first = true;
        dialer.handle.on_write(move |written| match written {
            "\r" if first => {
                first = false;
                vec![Reply::Text("\r\nproxysg#".to_string()), Reply::Close]
            }
            "\r" => vec![Reply::Text("\r\nproxysg>".to_string())],
            "show clock\r" => vec![Reply::Text("show clock\r\n10:00\r\nproxysg>".to_string())],
            _ => Vec::new(),
        });
        let mut session = serial_session(&dialer);

        let err = session.open().await.unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Disconnected)));
        assert!(!session.is_open());
        assert_eq!(session.context(), None);

        let output = session.command("show clock", None).await.unwrap();
        assert_eq!(output, "10:00");
        assert_eq!(dialer.handle.dials(), 2);
        assert_eq!(session.context(), Some(CliContext::Root));
    }

    #[tokio::test(start_paused = true)]
    async fn test_serial_close_after_enable_prompt_mid_command() {
        let dialer = MockDialer::new();
        FakeAppliance::new(CliContext::Enable).install_serial(&dialer);
        let mut session = serial_session(&dialer);
        assert_ok!(session.open().await);
        assert_eq!(session.context(), Some(CliContext::Enable));

        dialer.handle.on_write(|written| match written {
            "show sessions\r" => vec![
                Reply::Text("show sessions\r\nadmin console\r\nproxysg#".to_string()),
                Reply::Close,
            ],
            _ => Vec::new(),
        });
        let output = session.command("show sessions", None).await.unwrap();

        assert_eq!(output, "admin console");
        assert!(!session.is_open());
        assert_eq!(session.context(), Some(CliContext::Root));
        assert_eq!(dialer.handle.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_timeout_tears_down() {
        let dialer = MockDialer::new();
        dialer.handle.set_greeting("proxysg>");
        let mut session = ssh_session(&dialer);

        let started = Instant::now();
        let err = session
            .command_with(
                "show clock",
                CommandOptions::new().timeout(Duration::from_secs(5)),
            )
            .await
            .unwrap_err();

        assert!(started.elapsed() >= Duration::from_secs(5));
        match err {
            Error::Session(SessionError::CommandTimeout {
                command, device, ..
            }) => {
                assert_eq!(command, "show clock");
                assert_eq!(device, "proxysg_1");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!session.is_open());
        assert_eq!(session.context(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_drops_console_and_next_command_logs_in() {
        let dialer = MockDialer::new();
        FakeAppliance::new(CliContext::Root)
            .with_restart("restart regular")
            .install(&dialer);
        let mut session = ssh_session(&dialer);

        assert_ok!(session.command("show clock", Some(CliContext::Config)).await);

        let output = session
            .command("restart regular", Some(CliContext::Exit))
            .await
            .unwrap();

        assert_eq!(output, "");
        assert!(!session.is_open());
        assert_eq!(session.context(), None);
        let writes = dialer.handle.writes();
        assert_eq!(&writes[writes.len() - 2..], ["exit\r", "restart regular\r"]);

        assert_ok!(session.command("show clock", None).await);
        assert_eq!(dialer.handle.dials(), 2);
        assert_eq!(session.context(), Some(CliContext::Root));
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_passes_context_once() {
        let dialer = MockDialer::new();
        FakeAppliance::new(CliContext::Root)
            .with_output("show a", "first\r\n")
            .with_output("show b", "All OK\r\n")
            .install(&dialer);
        let mut session = ssh_session(&dialer);

        let output = session
            .command_batch(Some(CliContext::Enable), &["show a", "show b"], &["ok$"])
            .await
            .unwrap();

        assert_eq!(output, "All OK");
        assert_eq!(
            dialer.handle.writes(),
            vec!["enable\r", "show a\r", "show b\r"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_check_failure() {
        let dialer = MockDialer::new();
        FakeAppliance::new(CliContext::Root)
            .with_output("show b", "failed\r\n")
            .install(&dialer);
        let mut session = ssh_session(&dialer);

        let err = session
            .command_batch(None, &["show a", "show b"], &["ok", "done"])
            .await
            .unwrap_err();

        match err {
            Error::Session(SessionError::BatchCheckFailed { command, expected }) => {
                assert_eq!(command, "show b");
                assert_eq!(expected, vec!["ok", "done"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_serial_enable_prompt_settles() {
        let dialer = MockDialer::new();
        FakeAppliance::new(CliContext::Root)
            .with_output("show cpu", "CPU 0: 3%\r\n")
            .install_serial(&dialer);
        let mut session = serial_session(&dialer);

        let output = session
            .command("show cpu", Some(CliContext::Enable))
            .await
            .unwrap();

        assert_eq!(output, "CPU 0: 3%");
        assert_eq!(session.context(), Some(CliContext::Enable));
        assert_eq!(dialer.handle.writes(), vec!["\r", "enable\r", "show cpu\r"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_reachable() {
        let dialer = MockDialer::new();
        dialer.handle.set_ping_replies(&[false, false, true]);
        let mut session = ssh_session(&dialer);

        let started = Instant::now();
        assert_ok!(
            session
                .wait(
                    Duration::from_secs(1),
                    Duration::from_secs(10),
                    Duration::from_secs(1)
                )
                .await
        );

        assert_eq!(dialer.handle.ping_count(), 3);
        assert!(started.elapsed() >= Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_gives_up() {
        let dialer = MockDialer::new();
        let mut session = ssh_session(&dialer);

        let err = session
            .wait(Duration::ZERO, Duration::from_secs(5), Duration::ZERO)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Session(SessionError::NotReachable { .. })
        ));
        assert_eq!(dialer.handle.ping_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_needs_address() {
        let dialer = MockDialer::new();
        let mut session = serial_session(&dialer);

        let err = session
            .wait(Duration::ZERO, Duration::from_secs(5), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Missing { .. })));
    }
}

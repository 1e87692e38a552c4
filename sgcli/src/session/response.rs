//! Reading a command's response up to the next prompt, and cleaning it.

use std::time::Duration;

use log::{debug, trace};
use memchr::{memchr, memrchr};
use regex::bytes::Regex;
use secrecy::ExposeSecret;

use super::context::CliContext;
use super::login::{Settled, settle_enable};
use crate::channel::patterns::{SERIAL_COMMAND, SSH_COMMAND};
use crate::channel::{ExpectChannel, PromptEvent, PromptKind};
use crate::config::ConnectionParams;
use crate::error::Result;
use crate::transport::Transport;

/// Answer given to yes/no challenges raised by a command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Confirmation {
    /// Answer `yes`.
    #[default]
    Yes,
    /// Answer `no`.
    No,
}

impl Confirmation {
    fn answer(self) -> &'static [u8] {
        match self {
            Confirmation::Yes => b"yes\r",
            Confirmation::No => b"no\r",
        }
    }
}

impl From<bool> for Confirmation {
    fn from(yes: bool) -> Self {
        if yes { Confirmation::Yes } else { Confirmation::No }
    }
}

/// How a command's response ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ending {
    /// A prompt announced this context.
    Prompt(CliContext),
    /// The peer closed the stream.
    Eof,
    /// No prompt arrived in time.
    Timeout,
}

/// Read until the command completes, answering challenges on the way.
///
/// Returns how it ended and every byte of text seen before the prompts.
pub(crate) async fn read_response<T: Transport>(
    console: &mut ExpectChannel<T>,
    params: &ConnectionParams,
    timeout: Duration,
    confirmation: Confirmation,
) -> Result<(Ending, String)> {
    let serial = params.access.is_serial();
    let kinds = if serial { SERIAL_COMMAND } else { SSH_COMMAND };
    let mut raw = String::new();

    loop {
        let kind = match console.expect_prompt(kinds, timeout).await? {
            PromptEvent::Prompt { kind, before } => {
                raw.push_str(&before);
                kind
            }
            PromptEvent::Eof { before } => {
                raw.push_str(&before);
                return Ok((Ending::Eof, raw));
            }
            PromptEvent::Timeout => return Ok((Ending::Timeout, raw)),
        };

        match kind {
            _ if kind.is_confirmation() => {
                debug!("answering confirmation with {:?}", confirmation);
                console.write(confirmation.answer()).await?;
            }
            PromptKind::EnablePassword => {
                let mut line = params.enable_password.expose_secret().as_bytes().to_vec();
                line.push(b'\r');
                console.write(&line).await?;
            }
            PromptKind::Pager => console.write(params.pager_key.as_bytes()).await?,
            PromptKind::Enable if serial => {
                return Ok(match settle_enable(console, params.timeouts.command_settle).await? {
                    Settled::At(context) => (Ending::Prompt(context), raw),
                    Settled::Closed(rest) => {
                        raw.push_str(&rest);
                        (Ending::Eof, raw)
                    }
                });
            }
            _ => match kind.context() {
                Some(context) => return Ok((Ending::Prompt(context), raw)),
                None => trace!("ignoring {:?} during command", kind),
            },
        }
    }
}

/// Strip the echoed command line and surrounding blank lines from SSH output.
pub fn clean_ssh_output(raw: &str) -> String {
    match memchr(b'\n', raw.as_bytes()) {
        Some(first) => raw[first..].trim().to_string(),
        None => String::new(),
    }
}

/// Strip pager residue, the echoed command line and the trailing prompt
/// line from serial output.
pub fn clean_serial_output(raw: &str, pager_residue: &Regex) -> String {
    let stripped = pager_residue.replace_all(raw.as_bytes(), &b""[..]);
    let bytes = stripped.as_ref();

    match (memchr(b'\n', bytes), memrchr(b'\n', bytes)) {
        (Some(first), Some(last)) if first < last => {
            String::from_utf8_lossy(&bytes[first..last]).trim().to_string()
        }
        _ => String::new(),
    }
}

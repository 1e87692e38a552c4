//! Login handshakes that bring a fresh console to a known context.

use log::{debug, trace};
use secrecy::ExposeSecret;

use super::context::CliContext;
use crate::channel::patterns::{CONFIG_BITS, SERIAL_LOGIN, SSH_LOGIN};
use crate::channel::{ExpectChannel, PromptEvent, PromptKind};
use crate::config::ConnectionParams;
use crate::error::{Result, SessionError, TransportError};
use crate::transport::Transport;

/// Attempts a serial console gets before login gives up.
pub const SERIAL_LOGIN_ATTEMPTS: usize = 5;

fn login_failed(params: &ConnectionParams, reason: impl Into<String>) -> SessionError {
    SessionError::LoginTimeout {
        device: params.device.clone(),
        address: params.address(),
        reason: reason.into(),
    }
}

/// Wait once for the root prompt an SSH shell presents after authentication.
pub async fn login_ssh<T: Transport>(
    console: &mut ExpectChannel<T>,
    params: &ConnectionParams,
) -> Result<CliContext> {
    match console
        .expect_prompt(SSH_LOGIN, params.timeouts.login)
        .await?
    {
        PromptEvent::Prompt { .. } => Ok(CliContext::Root),
        PromptEvent::Eof { .. } => Err(TransportError::Disconnected.into()),
        PromptEvent::Timeout => Err(login_failed(
            params,
            format!("no root prompt within {:?}", params.timeouts.login),
        )
        .into()),
    }
}

/// Probe a serial console of unknown state until a prompt identifies its context.
///
/// Menus, pagers and the enable password challenge are answered on the way.
/// A bare enable prompt is held briefly in case it is the head of a
/// configuration prompt still arriving on the line.
pub async fn login_serial<T: Transport>(
    console: &mut ExpectChannel<T>,
    params: &ConnectionParams,
) -> Result<CliContext> {
    console.write(b"\r").await?;

    let mut attempts = 0;
    loop {
        let event = console
            .expect_prompt(SERIAL_LOGIN, params.timeouts.serial_read)
            .await?;
        trace!("serial login: {:?}", event);

        match event {
            PromptEvent::Prompt { kind, .. } => match kind {
                PromptKind::ConfigTop | PromptKind::ConfigDeep | PromptKind::Root => {
                    if let Some(context) = kind.context() {
                        return Ok(context);
                    }
                }
                PromptKind::Enable => {
                    return match settle_enable(console, params.timeouts.login_settle).await? {
                        Settled::At(context) => Ok(context),
                        Settled::Closed(_) => Err(TransportError::Disconnected.into()),
                    };
                }
                PromptKind::EnterOption => console.write(b"1").await?,
                PromptKind::EnablePassword => {
                    let mut line = params.enable_password.expose_secret().as_bytes().to_vec();
                    line.push(b'\r');
                    console.write(&line).await?;
                }
                PromptKind::Pager => console.write(b"q").await?,
                other => debug!("serial login: ignoring {:?}", other),
            },
            PromptEvent::Eof { .. } => return Err(TransportError::Disconnected.into()),
            PromptEvent::Timeout => console.write(b"\r").await?,
        }

        attempts += 1;
        if attempts > SERIAL_LOGIN_ATTEMPTS {
            return Err(login_failed(
                params,
                format!("no usable prompt after {} attempts", attempts),
            )
            .into());
        }
    }
}

/// What followed an enable prompt on a serial line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Settled {
    /// The console is in this context.
    At(CliContext),
    /// The stream ended; holds the text received after the prompt.
    Closed(String),
}

/// After an enable prompt, wait up to `window` for a trailing config marker.
pub(crate) async fn settle_enable<T: Transport>(
    console: &mut ExpectChannel<T>,
    window: std::time::Duration,
) -> Result<Settled> {
    Ok(match console.expect_prompt(CONFIG_BITS, window).await? {
        PromptEvent::Prompt { kind, .. } => {
            Settled::At(kind.context().unwrap_or(CliContext::Enable))
        }
        PromptEvent::Eof { before } => Settled::Closed(before),
        PromptEvent::Timeout => Settled::At(CliContext::Enable),
    })
}

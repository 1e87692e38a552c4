//! Console contexts and the reconciliation walk between them.

use std::fmt;
use std::str::FromStr;

use crate::error::SessionError;

/// Most intermediate commands a single reconciliation may issue.
pub const MAX_RECONCILE_STEPS: usize = 8;

/// Command-interpretation mode of the appliance console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CliContext {
    /// Unprivileged prompt after login, `name>`.
    Root,
    /// Privileged prompt, `name#`.
    Enable,
    /// Top level configuration, `name#(config)`.
    Config,
    /// Any nested configuration level, `name#(config ...)`.
    ConfigTree,
    /// Leave the console; the connection is dropped afterwards.
    Exit,
}

impl CliContext {
    /// Canonical name, as used in configuration and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            CliContext::Root => "CLI_ROOT",
            CliContext::Enable => "CLI_ENABLE",
            CliContext::Config => "CLI_CONFIG",
            CliContext::ConfigTree => "CLI_CONFIG_TREE",
            CliContext::Exit => "CLI_EXIT",
        }
    }
}

impl fmt::Display for CliContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CliContext {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_uppercase().replace('-', "_");
        let name = name.strip_prefix("CLI_").unwrap_or(&name);
        match name {
            "ROOT" => Ok(CliContext::Root),
            "ENABLE" => Ok(CliContext::Enable),
            "CONFIG" => Ok(CliContext::Config),
            "CONFIG_TREE" => Ok(CliContext::ConfigTree),
            "EXIT" => Ok(CliContext::Exit),
            _ => Err(SessionError::BadContextRequest {
                requested: s.to_string(),
            }),
        }
    }
}

/// Next move when walking from one context towards another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Already there.
    Done,
    /// Issue this intermediate command and re-evaluate.
    Send(&'static str),
    /// Stop walking; the requested command itself gets there.
    Stop,
}

/// Decide the next intermediate command to move from `current` to `target`.
///
/// Nested configuration levels are named by the command that enters them,
/// so [`CliContext::ConfigTree`] can only be kept, never entered.
pub fn next_step(current: CliContext, target: CliContext) -> Result<Step, SessionError> {
    use CliContext::*;

    Ok(match (current, target) {
        _ if current == target => Step::Done,
        (Root, Enable | Config) => Step::Send("enable"),
        (Enable, Config) => Step::Send("configure terminal"),
        (Root | Enable, Exit) => Step::Stop,
        (_, ConfigTree) => {
            return Err(SessionError::BadContextRequest {
                requested: format!("{} from {}", target, current),
            });
        }
        _ => Step::Send("exit"),
    })
}

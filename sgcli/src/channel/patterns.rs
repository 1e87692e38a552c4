//! Prompt pattern library for appliance console output.
//!
//! Every prompt the console can stop at is a [`PromptKind`]. Each kind owns
//! one compiled regex; ordered slices of kinds form the pattern sets handed
//! to the expect engine, where position encodes priority.
//!
//! # Prompt Examples
//!
//! ```text
//! proxysg>                          # root
//! proxysg#                          # enable
//! proxysg#(config)                  # configuration, top level
//! proxysg#(config ssl)              # configuration, nested
//! Enable Password:                  # enable password challenge
//! Are you sure? [No]                # confirmation
//! --More--                          # pager
//! Enter option:                     # serial console menu
//! ```

use once_cell::sync::Lazy;
use regex::bytes::Regex;

use super::expect::Pattern;
use crate::session::CliContext;

/// How far back from fresh output a prompt match can start.
///
/// Prompt names are at most 80 bytes; nested config names are short.
pub const PROMPT_REACH: usize = 1024;

/// A prompt type recognized on the appliance console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    /// `... [No]`, `... [Yes]` or `... [n]` confirmation challenge.
    Confirm,
    /// `(YES): ` confirmation challenge.
    ConfirmKeyword,
    /// `(yes/no)? ` confirmation challenge.
    ConfirmYesNo,
    /// Root prompt, `name>`.
    Root,
    /// Enable prompt, `name#`.
    Enable,
    /// `Enable Password:` challenge.
    EnablePassword,
    /// Top level configuration prompt, `name#(config)`.
    ConfigTop,
    /// Nested configuration prompt, `name#(config ...)`.
    ConfigDeep,
    /// `--More--` pager.
    Pager,
    /// Serial console menu, `Enter option: `.
    EnterOption,
    /// Trailing `(config)` that completes a slow-arriving enable prompt.
    ConfigBit,
    /// Trailing `(config ...)` that completes a slow-arriving enable prompt.
    ConfigBitDeep,
}

static CONFIRM: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)^[^\[]+(\[No\]|\[Yes\]|\[n\]):?$"));
static CONFIRM_KEYWORD: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\(YES\): $"));
static CONFIRM_YES_NO: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\(yes/no\)\? $"));
static ROOT: Lazy<Regex> = Lazy::new(|| compile(r#"(?im)^[^>\r\n$=<"]{4,80}>$"#));
static ENABLE: Lazy<Regex> = Lazy::new(|| compile(r#"(?im)^[^#\r\n$=<>"]{4,80}#$"#));
static ENABLE_PASSWORD: Lazy<Regex> = Lazy::new(|| compile(r"(?im)^Enable Password:$"));
static CONFIG_TOP: Lazy<Regex> =
    Lazy::new(|| compile(r#"(?im)^[^#\r\n$=<>"]{4,80}#\(config\)$"#));
static CONFIG_DEEP: Lazy<Regex> =
    Lazy::new(|| compile(r#"(?im)^[^#\r\n$=<>"]{4,80}#\(config[^)]+\)$"#));
static PAGER: Lazy<Regex> = Lazy::new(|| compile(r"(?m)--More--$"));
static ENTER_OPTION: Lazy<Regex> = Lazy::new(|| compile(r"(?i)Enter option: $"));
static CONFIG_BIT: Lazy<Regex> = Lazy::new(|| compile(r"(?im)\(config\)$"));
static CONFIG_BIT_DEEP: Lazy<Regex> = Lazy::new(|| compile(r"(?im)\(config[^)]+\)$"));

// Patterns are constants; a failure here is a programming error.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in prompt pattern must compile")
}

impl PromptKind {
    /// The compiled regex for this prompt.
    pub fn regex(self) -> &'static Regex {
        match self {
            PromptKind::Confirm => &CONFIRM,
            PromptKind::ConfirmKeyword => &CONFIRM_KEYWORD,
            PromptKind::ConfirmYesNo => &CONFIRM_YES_NO,
            PromptKind::Root => &ROOT,
            PromptKind::Enable => &ENABLE,
            PromptKind::EnablePassword => &ENABLE_PASSWORD,
            PromptKind::ConfigTop => &CONFIG_TOP,
            PromptKind::ConfigDeep => &CONFIG_DEEP,
            PromptKind::Pager => &PAGER,
            PromptKind::EnterOption => &ENTER_OPTION,
            PromptKind::ConfigBit => &CONFIG_BIT,
            PromptKind::ConfigBitDeep => &CONFIG_BIT_DEEP,
        }
    }

    /// The regex with its search reach for the expect engine.
    ///
    /// [`PromptKind::Confirm`] is anchored at the start of the buffer and
    /// is always searched in full.
    pub fn pattern(self) -> Pattern<'static> {
        match self {
            PromptKind::Confirm => Pattern::anywhere(self.regex()),
            _ => Pattern::bounded(self.regex(), PROMPT_REACH),
        }
    }

    /// Whether this prompt is a yes/no challenge.
    pub fn is_confirmation(self) -> bool {
        matches!(
            self,
            PromptKind::Confirm | PromptKind::ConfirmKeyword | PromptKind::ConfirmYesNo
        )
    }

    /// The console context this prompt announces, if it ends a command.
    pub fn context(self) -> Option<CliContext> {
        match self {
            PromptKind::Root => Some(CliContext::Root),
            PromptKind::Enable => Some(CliContext::Enable),
            PromptKind::ConfigTop | PromptKind::ConfigBit => Some(CliContext::Config),
            PromptKind::ConfigDeep | PromptKind::ConfigBitDeep => Some(CliContext::ConfigTree),
            _ => None,
        }
    }
}

/// Prompts that end the SSH login handshake.
pub const SSH_LOGIN: &[PromptKind] = &[PromptKind::Root];

/// Prompts that can appear while probing a serial console of unknown state.
pub const SERIAL_LOGIN: &[PromptKind] = &[
    PromptKind::EnterOption,
    PromptKind::ConfigTop,
    PromptKind::ConfigDeep,
    PromptKind::Root,
    PromptKind::Enable,
    PromptKind::EnablePassword,
    PromptKind::Pager,
];

/// Prompts consulted after a command over SSH.
pub const SSH_COMMAND: &[PromptKind] = &[
    PromptKind::Confirm,
    PromptKind::ConfirmKeyword,
    PromptKind::ConfirmYesNo,
    PromptKind::Root,
    PromptKind::Enable,
    PromptKind::EnablePassword,
    PromptKind::ConfigTop,
    PromptKind::ConfigDeep,
    PromptKind::Pager,
];

/// Prompts consulted after a command over a serial console.
///
/// Config prompts precede root and enable so a complete `#(config)` prompt
/// is never read as an enable prompt.
pub const SERIAL_COMMAND: &[PromptKind] = &[
    PromptKind::Confirm,
    PromptKind::ConfirmKeyword,
    PromptKind::ConfirmYesNo,
    PromptKind::ConfigTop,
    PromptKind::ConfigDeep,
    PromptKind::Root,
    PromptKind::Enable,
    PromptKind::EnablePassword,
    PromptKind::Pager,
];

/// Trailing config markers that disambiguate a partially received prompt.
pub const CONFIG_BITS: &[PromptKind] = &[PromptKind::ConfigBit, PromptKind::ConfigBitDeep];

//! Appliance facts read from `show version`, restarts and build switches.

use std::fmt;
use std::time::Duration;

use log::info;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SessionError};
use crate::session::{
    CliContext, DEFAULT_END_WAIT, DEFAULT_INIT_WAIT, DEFAULT_PING_WAIT, Session,
};
use crate::transport::Dialer;

const SHOW_VERSION: &str = "show version";

/// Image slots listed by `installed-systems view`.
pub const INSTALLED_SLOTS: usize = 5;

/// Hold after an upgrade restart before the new build is checked.
pub const UPGRADE_END_WAIT: Duration = Duration::from_secs(300);

static VERSION_BUILD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Version: SGOS (?P<version>[\d.]+)[\s\S]+Release id:\s+(?P<build>\d+)")
        .expect("version pattern must compile")
});
static VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)^Version:\s+SGOS\s+([0-9.]+)").expect("version pattern must compile")
});
static BUILD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^Release id:\s+([0-9]+)").expect("build pattern must compile"));
static SERIAL_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)^Serial\snumber:\s+([0-9\-]+)").expect("serial pattern must compile")
});
static INSTALLED_SYSTEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d+)\. Version: SGOS [\d.]+, Release ID: (\d+)")
        .expect("installed system pattern must compile")
});

/// Identity of a running appliance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplianceInfo {
    /// SGOS version, e.g. `6.7.4.2`.
    pub version: String,
    /// Release id.
    pub build: String,
    pub serial_number: String,
}

impl ApplianceInfo {
    /// Extract every field from `show version` output.
    pub fn parse(output: &str) -> std::result::Result<Self, SessionError> {
        let field = |re: &Regex, what: &str| {
            re.captures(output)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .ok_or_else(|| SessionError::UnexpectedOutput {
                    command: SHOW_VERSION.to_string(),
                    what: what.to_string(),
                })
        };

        Ok(Self {
            version: field(&VERSION, "version")?,
            build: field(&BUILD, "build")?,
            serial_number: field(&SERIAL_NUMBER, "serialnumber")?,
        })
    }
}

impl fmt::Display for ApplianceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SGOS {} (build {}, serial {})",
            self.version, self.build, self.serial_number
        )
    }
}

/// Pull `(version, build)` out of `show version` output.
pub fn parse_version_build(output: &str) -> Option<(String, String)> {
    let caps = VERSION_BUILD.captures(output)?;
    Some((caps["version"].to_string(), caps["build"].to_string()))
}

/// Slot in `installed-systems view` output that holds `build`.
pub fn find_installed_system(view: &str, build: &str) -> Option<usize> {
    INSTALLED_SYSTEM.captures_iter(view).find_map(|caps| {
        let slot: usize = caps[1].parse().ok()?;
        ((1..=INSTALLED_SLOTS).contains(&slot) && &caps[2] == build).then_some(slot)
    })
}

/// Kind of restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RestartMode {
    /// Reboot the running image.
    #[default]
    Regular,
    /// Reboot into a newly loaded image.
    Upgrade,
}

impl RestartMode {
    /// The CLI command for this restart.
    pub fn command(self) -> &'static str {
        match self {
            RestartMode::Regular => "restart regular",
            RestartMode::Upgrade => "restart upgrade",
        }
    }
}

impl<D: Dialer> Session<D> {
    /// SGOS version and release id of the appliance.
    pub async fn version_build(&mut self) -> Result<(String, String)> {
        let output = self
            .command(SHOW_VERSION, Some(CliContext::Enable))
            .await?;
        parse_version_build(&output).ok_or_else(|| {
            SessionError::UnexpectedOutput {
                command: SHOW_VERSION.to_string(),
                what: "version and release id".to_string(),
            }
            .into()
        })
    }

    /// Version, build and serial number of the appliance.
    pub async fn info(&mut self) -> Result<ApplianceInfo> {
        let output = self
            .command(SHOW_VERSION, Some(CliContext::Enable))
            .await?;
        Ok(ApplianceInfo::parse(&output)?)
    }

    /// Restart the appliance and wait until it answers pings again.
    pub async fn restart(&mut self, mode: RestartMode) -> Result<()> {
        self.restart_then_wait(mode, DEFAULT_END_WAIT).await
    }

    /// Boot the appliance into the installed system image holding `build`.
    ///
    /// Returns at once when `build` is already running. Otherwise the slot
    /// holding it becomes the default, the appliance restarts into it, and
    /// the build is checked again after logging back in. Returns the
    /// running `(version, build)`.
    pub async fn load_build(&mut self, build: &str) -> Result<(String, String)> {
        if build.is_empty() || !build.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SessionError::InvalidBuild {
                build: build.to_string(),
            }
            .into());
        }

        let current = self.version_build().await?;
        if current.1 == build {
            return Ok(current);
        }

        self.command("installed-systems", Some(CliContext::Config))
            .await?;
        let view = self.command("view", None).await?;
        let slot = find_installed_system(&view, build).ok_or_else(|| {
            SessionError::BuildNotInstalled {
                build: build.to_string(),
            }
        })?;

        info!(
            "[{}] switching from build {} to {} (slot {})",
            self.params().index(),
            current.1,
            build,
            slot
        );
        self.command(&format!("default {}", slot), None).await?;
        self.command("exit", None).await?;

        self.restart_then_wait(RestartMode::Upgrade, UPGRADE_END_WAIT)
            .await?;

        let (version, running) = self.version_build().await?;
        if running != build {
            return Err(SessionError::BuildMismatch {
                expected: build.to_string(),
                found: running,
            }
            .into());
        }
        Ok((version, running))
    }

    async fn restart_then_wait(&mut self, mode: RestartMode, end: Duration) -> Result<()> {
        self.command("", Some(CliContext::Enable)).await?;
        self.command(mode.command(), Some(CliContext::Exit)).await?;
        info!("[{}] waiting for the appliance to come back", self.params().index());
        self.wait(DEFAULT_INIT_WAIT, DEFAULT_PING_WAIT, end).await
    }
}

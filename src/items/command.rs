//! Command item - a program that must resolve on PATH

use anyhow::{Context, Result, bail};
use declarative::{Item, ItemContext, Outcome};
use probe::Invocation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::INSTALL_TIMEOUT;

/// Package managers a command can be installed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Brew,
    Apt,
    Dnf,
    Pacman,
    Winget,
    Scoop,
    Choco,
}

impl PackageManager {
    /// Program whose presence on PATH means the manager is usable
    pub fn binary(&self) -> &'static str {
        match self {
            Self::Brew => "brew",
            Self::Apt => "apt-get",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
            Self::Winget => "winget",
            Self::Scoop => "scoop",
            Self::Choco => "choco",
        }
    }

    /// Install command for one package
    ///
    /// System package managers on Linux go through sudo.
    pub fn install(&self, package: &str) -> Invocation {
        let invocation = match self {
            Self::Brew => Invocation::new("brew", ["install", package]),
            Self::Apt => Invocation::new("sudo", ["apt-get", "install", "-y", package]),
            Self::Dnf => Invocation::new("sudo", ["dnf", "install", "-y", package]),
            Self::Pacman => Invocation::new("sudo", ["pacman", "-S", "--noconfirm", package]),
            Self::Winget => Invocation::new(
                "winget",
                [
                    "install",
                    "--id",
                    package,
                    "--exact",
                    "--silent",
                    "--accept-package-agreements",
                    "--accept-source-agreements",
                ],
            ),
            Self::Scoop => Invocation::new("scoop", ["install", package]),
            Self::Choco => Invocation::new("choco", ["install", package, "-y"]),
        };
        invocation.with_timeout(INSTALL_TIMEOUT)
    }

    /// Removal command, shown to the user but never run
    pub fn uninstall_hint(&self, package: &str) -> String {
        match self {
            Self::Brew => format!("brew uninstall {package}"),
            Self::Apt => format!("sudo apt-get remove {package}"),
            Self::Dnf => format!("sudo dnf remove {package}"),
            Self::Pacman => format!("sudo pacman -R {package}"),
            Self::Winget => format!("winget uninstall --id {package}"),
            Self::Scoop => format!("scoop uninstall {package}"),
            Self::Choco => format!("choco uninstall {package}"),
        }
    }

    /// Managers to try on a platform, most preferred first
    pub fn defaults_for(platform: declarative::Platform) -> Vec<Self> {
        use declarative::Platform;
        match platform {
            Platform::MacOs => vec![Self::Brew],
            Platform::Linux => vec![Self::Apt, Self::Dnf, Self::Pacman, Self::Brew],
            Platform::Windows => vec![Self::Winget, Self::Scoop, Self::Choco],
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Brew => "brew",
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
            Self::Winget => "winget",
            Self::Scoop => "scoop",
            Self::Choco => "choco",
        })
    }
}

/// A command that must be installed
#[derive(Debug, Clone)]
pub struct InstallableCommand {
    pub command: String,
    /// Package name per manager
    pub packages: BTreeMap<PackageManager, String>,
    /// Managers to try, in order
    pub managers: Vec<PackageManager>,
}

impl InstallableCommand {
    pub fn new(
        command: &str,
        packages: BTreeMap<PackageManager, String>,
        managers: Vec<PackageManager>,
    ) -> Self {
        Self {
            command: command.to_string(),
            packages,
            managers,
        }
    }

    /// First manager that is present and knows a package for this command
    fn choose<'a>(&'a self, ctx: &ItemContext) -> Option<(PackageManager, &'a str)> {
        self.managers.iter().find_map(|manager| {
            let package = self.packages.get(manager)?;
            ctx.shell
                .which(manager.binary())
                .then_some((*manager, package.as_str()))
        })
    }

    fn tried(&self) -> String {
        self.managers
            .iter()
            .filter(|m| self.packages.contains_key(m))
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Item for InstallableCommand {
    fn name(&self) -> String {
        self.command.clone()
    }

    fn kind(&self) -> &'static str {
        "command"
    }

    fn validate(&self, ctx: &ItemContext) -> Result<String> {
        if ctx.shell.which(&self.command) {
            Ok("on PATH".to_string())
        } else {
            bail!("{} is not on PATH", self.command)
        }
    }

    fn install(&self, ctx: &ItemContext) -> Result<Outcome> {
        if ctx.shell.which(&self.command) {
            return Ok(Outcome::Unchanged("on PATH".to_string()));
        }

        let Some((manager, package)) = self.choose(ctx) else {
            let tried = self.tried();
            if tried.is_empty() {
                bail!("no package mapping for any usable package manager");
            }
            bail!("no usable package manager found (tried: {tried})");
        };

        log::info!("installing {} via {manager}", self.command);
        ctx.shell
            .run_checked(&manager.install(package))
            .with_context(|| format!("Failed to install {package} via {manager}"))?;

        Ok(Outcome::Changed(format!("installed {package} via {manager}")))
    }

    fn uninstall(&self, ctx: &ItemContext) -> Result<Outcome> {
        if !ctx.shell.which(&self.command) {
            return Ok(Outcome::Unchanged("not present".to_string()));
        }

        // Packages are often shared with other tools; removal stays manual.
        let hint = self
            .choose(ctx)
            .map(|(manager, package)| manager.uninstall_hint(package))
            .unwrap_or_else(|| format!("remove {} with its installer", self.command));
        Ok(Outcome::Skipped(format!("remove manually: {hint}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe::CommandOutput;
    use probe::fake::ScriptedShell;

    fn jq(managers: Vec<PackageManager>) -> InstallableCommand {
        let packages = [
            (PackageManager::Brew, "jq".to_string()),
            (PackageManager::Apt, "jq".to_string()),
        ]
        .into_iter()
        .collect();
        InstallableCommand::new("jq", packages, managers)
    }

    #[test]
    fn test_validate() {
        let shell = ScriptedShell::new().installed("jq");
        let ctx = ItemContext::new(&shell);
        assert_eq!(jq(vec![]).validate(&ctx).unwrap(), "on PATH");

        let shell = ScriptedShell::new();
        let err = jq(vec![]).validate(&ItemContext::new(&shell)).unwrap_err();
        assert!(err.to_string().contains("jq is not on PATH"));
    }

    #[test]
    fn test_install_uses_first_available_manager() {
        let shell = ScriptedShell::new()
            .installed("apt-get")
            .respond("sudo apt-get install -y jq", CommandOutput::success(""))
            .respond("brew install jq", CommandOutput::success(""));
        shell.set_installed("brew", false);
        let ctx = ItemContext::new(&shell);

        let outcome = jq(vec![PackageManager::Brew, PackageManager::Apt])
            .install(&ctx)
            .unwrap();

        assert_eq!(outcome, Outcome::Changed("installed jq via apt".into()));
        assert_eq!(shell.calls(), ["sudo apt-get install -y jq"]);
    }

    #[test]
    fn test_install_skips_manager_without_mapping() {
        let shell = ScriptedShell::new()
            .installed("dnf")
            .respond("brew install jq", CommandOutput::success(""));
        let ctx = ItemContext::new(&shell);

        jq(vec![PackageManager::Dnf, PackageManager::Brew])
            .install(&ctx)
            .unwrap();

        assert_eq!(shell.calls(), ["brew install jq"]);
    }

    #[test]
    fn test_install_without_manager_fails() {
        let shell = ScriptedShell::new();
        let ctx = ItemContext::new(&shell);

        let err = jq(vec![PackageManager::Brew, PackageManager::Apt])
            .install(&ctx)
            .unwrap_err();

        assert!(err.to_string().contains("tried: brew, apt"));
        assert!(shell.calls().is_empty());
    }

    #[test]
    fn test_install_failure_is_reported() {
        let shell = ScriptedShell::new()
            .respond("brew install jq", CommandOutput::failure("No available formula"));
        let ctx = ItemContext::new(&shell);

        let err = jq(vec![PackageManager::Brew]).install(&ctx).unwrap_err();
        assert!(format!("{err:#}").contains("No available formula"));
    }

    #[test]
    fn test_install_when_present_runs_nothing() {
        let shell = ScriptedShell::new().installed("jq").installed("brew");
        let ctx = ItemContext::new(&shell);
        let item = jq(vec![PackageManager::Brew]);

        assert!(!item.install(&ctx).unwrap().is_change());
        assert!(!item.install(&ctx).unwrap().is_change());
        assert!(shell.calls().is_empty());
    }

    #[test]
    fn test_uninstall_is_manual() {
        let shell = ScriptedShell::new().installed("jq").installed("brew");
        let ctx = ItemContext::new(&shell);

        let outcome = jq(vec![PackageManager::Brew]).uninstall(&ctx).unwrap();

        assert_eq!(
            outcome,
            Outcome::Skipped("remove manually: brew uninstall jq".into())
        );
        assert!(shell.calls().is_empty());
    }

    #[test]
    fn test_install_has_long_timeout() {
        let invocation = PackageManager::Brew.install("jq");
        assert_eq!(invocation.timeout, Some(INSTALL_TIMEOUT));
    }

    #[test]
    fn test_platform_defaults() {
        use declarative::Platform;
        assert_eq!(
            PackageManager::defaults_for(Platform::MacOs),
            [PackageManager::Brew]
        );
        assert_eq!(
            PackageManager::defaults_for(Platform::Linux)[0],
            PackageManager::Apt
        );
    }
}

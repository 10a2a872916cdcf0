//! Workstation provider - config sections to ordered groups per platform
//!
//! `directories` and `commands` are always declared, so emptying either
//! list in the config surfaces as a group error rather than silently
//! managing nothing. The other groups only appear when configured.

use declarative::{Group, Guidance, Platform, Provider};
use probe::Invocation;

use crate::config::expand_path;
use crate::items::{
    ExpectedDirectory, ExpectedEnvVar, HostPreference, InstallableCommand, PackageManager,
    PreferenceStore, RegisteredCredential,
};
use crate::schema::SetupConfig;

pub struct WorkstationProvider {
    setup: SetupConfig,
}

impl WorkstationProvider {
    pub fn new(setup: SetupConfig) -> Self {
        Self { setup }
    }

    fn macos(&self) -> Vec<Group> {
        let platform = Platform::MacOs;
        let mut groups = vec![self.directories(), self.commands(platform)];
        groups.extend(self.environment(platform));
        groups.extend(self.preferences(PreferenceStore::Defaults));
        groups.extend(self.credentials());
        groups
    }

    fn linux(&self) -> Vec<Group> {
        let platform = Platform::Linux;
        let mut groups = vec![self.directories(), self.commands(platform)];
        groups.extend(self.environment(platform));
        groups.extend(self.preferences(PreferenceStore::GSettings));
        groups.extend(self.credentials());
        groups
    }

    fn windows(&self) -> Vec<Group> {
        let platform = Platform::Windows;
        if !self.setup.preferences.is_empty() {
            log::warn!("preferences are not supported on windows; skipping");
        }
        let mut groups = vec![self.directories(), self.commands(platform)];
        groups.extend(self.environment(platform));
        groups.extend(self.credentials());
        groups
    }

    fn directories(&self) -> Group {
        let mut group = Group::new("directories");
        for dir in &self.setup.directories {
            group.push(ExpectedDirectory::new(expand_path(dir)));
        }
        group
    }

    fn commands(&self, platform: Platform) -> Group {
        let managers = if self.setup.package_managers.is_empty() {
            PackageManager::defaults_for(platform)
        } else {
            self.setup.package_managers.clone()
        };

        let mut group = Group::new("commands");
        for (name, packages) in &self.setup.commands {
            group.push(InstallableCommand::new(name, packages.clone(), managers.clone()));
        }
        group
    }

    fn environment(&self, platform: Platform) -> Option<Group> {
        if self.setup.env.is_empty() {
            return None;
        }
        let mut group = Group::new("environment");
        for (name, value) in &self.setup.env {
            let expected = (!value.is_empty()).then(|| value.clone());
            group.push(ExpectedEnvVar::new(name, expected, platform));
        }
        Some(group)
    }

    fn preferences(&self, store: PreferenceStore) -> Option<Group> {
        if self.setup.preferences.is_empty() {
            return None;
        }
        let mut group = Group::new("preferences");
        for pref in &self.setup.preferences {
            group.push(HostPreference::new(
                store,
                &pref.domain,
                &pref.key,
                pref.value.clone(),
            ));
        }
        Some(group)
    }

    fn credentials(&self) -> Option<Group> {
        if self.setup.credentials.is_empty() {
            return None;
        }
        let mut group = Group::new("credentials");
        for cred in &self.setup.credentials {
            let Some((program, args)) = cred.check.split_first() else {
                continue;
            };
            let mut item = RegisteredCredential::new(
                &cred.name,
                Invocation::new(program, args.iter().cloned()),
                Guidance::text(cred.login.clone()),
            );
            if let Some((program, args)) = cred.logout.split_first() {
                item = item.with_logout(Invocation::new(program, args.iter().cloned()));
            }
            group.push(item);
        }
        Some(group)
    }
}

impl Provider for WorkstationProvider {
    fn groups(&self, platform: Platform) -> Vec<Group> {
        match platform {
            Platform::MacOs => self.macos(),
            Platform::Linux => self.linux(),
            Platform::Windows => self.windows(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::PreferenceValue;
    use crate::schema::{CredentialConfig, HearthConfig, PreferenceConfig};
    use declarative::{GroupError, ItemContext, Reconciler, resolve};
    use probe::CommandOutput;
    use probe::fake::ScriptedShell;

    fn names(groups: &[Group]) -> Vec<&str> {
        groups.iter().map(Group::name).collect()
    }

    fn full_setup() -> SetupConfig {
        let mut setup = SetupConfig::default();
        setup.env.insert("EDITOR".into(), "nvim".into());
        setup.preferences.push(PreferenceConfig {
            domain: "com.apple.finder".into(),
            key: "ShowPathbar".into(),
            value: PreferenceValue::Bool(true),
        });
        setup
    }

    #[test]
    fn test_group_order_per_platform() {
        let provider = WorkstationProvider::new(full_setup());

        assert_eq!(
            names(&provider.groups(Platform::MacOs)),
            ["directories", "commands", "environment", "preferences", "credentials"]
        );
        assert_eq!(
            names(&provider.groups(Platform::Windows)),
            ["directories", "commands", "environment", "credentials"]
        );
    }

    #[test]
    fn test_unconfigured_optional_groups_are_omitted() {
        let mut setup = SetupConfig::default();
        setup.credentials.clear();
        let groups = WorkstationProvider::new(setup).groups(Platform::Linux);
        assert_eq!(names(&groups), ["directories", "commands"]);
    }

    #[test]
    fn test_resolve_unknown_platform() {
        let provider = WorkstationProvider::new(SetupConfig::default());
        assert!(resolve(&provider, "haiku").is_none());
        assert!(resolve(&provider, "darwin").is_some());
    }

    #[test]
    fn test_empty_core_group_is_reported() {
        let mut setup = SetupConfig::default();
        setup.directories.clear();
        setup.credentials.clear();
        let groups = WorkstationProvider::new(setup).groups(Platform::Linux);

        let shell = ScriptedShell::new().installed("git").installed("jq").installed("rg").installed("gh");
        let result = Reconciler::new(groups).status(&ItemContext::new(&shell));

        assert_eq!(result.errors.len(), 1);
        assert!(matches!(&result.errors[0], GroupError::Empty { group } if group == "directories"));
    }

    #[test]
    fn test_configured_package_managers_override_platform() {
        let config = HearthConfig::parse(
            "[setup]\npackage_managers = [\"brew\"]\n[setup.commands.fd]\nbrew = \"fd\"\napt = \"fd-find\"\n",
        )
        .unwrap();
        let groups = WorkstationProvider::new(config.setup).groups(Platform::Linux);
        let commands = groups.iter().find(|g| g.name() == "commands").unwrap();

        let shell = ScriptedShell::new()
            .installed("apt-get")
            .respond("brew install", CommandOutput::success(""));
        let report = commands.install(&ItemContext::new(&shell));

        assert!(shell.calls_to("sudo").is_empty());
        assert!(shell.calls_to("brew install fd").len() == 1);
        assert!(report.summary.changed >= 1);
    }

    #[test]
    fn test_credentials_with_logout() {
        let mut setup = SetupConfig::default();
        setup.credentials = vec![CredentialConfig {
            name: "aws".into(),
            check: vec!["aws".into(), "sts".into(), "get-caller-identity".into()],
            login: "run `aws sso login`".into(),
            logout: vec!["aws".into(), "sso".into(), "logout".into()],
        }];
        let groups = WorkstationProvider::new(setup).groups(Platform::MacOs);
        let creds = groups.iter().find(|g| g.name() == "credentials").unwrap();

        let shell = ScriptedShell::new()
            .respond("aws sts get-caller-identity", CommandOutput::success("{}"))
            .respond("aws sso logout", CommandOutput::success(""));
        let report = creds.uninstall(&ItemContext::new(&shell));

        assert!(report.is_success());
        assert_eq!(shell.calls_to("aws sso logout").len(), 1);
    }
}

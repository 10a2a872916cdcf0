use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::items::{PackageManager, PreferenceValue};

// ============================================================================
// Main Config Schema
// ============================================================================

/// The hearth configuration file
///
/// Every section has defaults, so a missing file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HearthConfig {
    /// Desired machine state
    pub setup: SetupConfig,

    /// Probe settings for `hearth inventory`
    pub inventory: InventoryConfig,

    /// AWS scopes for `hearth resources`
    pub resources: ResourcesConfig,
}

impl HearthConfig {
    /// Load from a path, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid TOML format in hearth config")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.setup.validate().context("Invalid [setup]")?;
        self.inventory.validate().context("Invalid [inventory]")?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

// ============================================================================
// Setup
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    /// Directories that must exist (tilde-expanded)
    pub directories: Vec<String>,

    /// Command name → package name per package manager
    pub commands: BTreeMap<String, BTreeMap<PackageManager, String>>,

    /// Package managers to try, in order; empty means the platform default
    pub package_managers: Vec<PackageManager>,

    /// Environment variable → expected value (empty string: only require it to be set)
    pub env: BTreeMap<String, String>,

    /// Host preferences (macOS defaults, GNOME gsettings)
    pub preferences: Vec<PreferenceConfig>,

    /// Credentials registered with external CLIs
    pub credentials: Vec<CredentialConfig>,
}

impl Default for SetupConfig {
    fn default() -> Self {
        let command = |pairs: &[(PackageManager, &str)]| -> BTreeMap<PackageManager, String> {
            pairs.iter().map(|(m, p)| (*m, (*p).to_string())).collect()
        };
        use PackageManager::{Apt, Brew, Choco, Dnf, Pacman, Scoop, Winget};

        let mut commands = BTreeMap::new();
        commands.insert(
            "git".to_string(),
            command(&[
                (Brew, "git"),
                (Apt, "git"),
                (Dnf, "git"),
                (Pacman, "git"),
                (Winget, "Git.Git"),
                (Scoop, "git"),
                (Choco, "git"),
            ]),
        );
        commands.insert(
            "jq".to_string(),
            command(&[
                (Brew, "jq"),
                (Apt, "jq"),
                (Dnf, "jq"),
                (Pacman, "jq"),
                (Winget, "jqlang.jq"),
                (Scoop, "jq"),
                (Choco, "jq"),
            ]),
        );
        commands.insert(
            "rg".to_string(),
            command(&[
                (Brew, "ripgrep"),
                (Apt, "ripgrep"),
                (Dnf, "ripgrep"),
                (Pacman, "ripgrep"),
                (Winget, "BurntSushi.ripgrep.MSVC"),
                (Scoop, "ripgrep"),
                (Choco, "ripgrep"),
            ]),
        );
        commands.insert(
            "gh".to_string(),
            command(&[
                (Brew, "gh"),
                (Apt, "gh"),
                (Dnf, "gh"),
                (Pacman, "github-cli"),
                (Winget, "GitHub.cli"),
                (Scoop, "gh"),
                (Choco, "gh"),
            ]),
        );

        Self {
            directories: vec!["~/dev".to_string(), "~/.config".to_string()],
            commands,
            package_managers: Vec::new(),
            env: BTreeMap::new(),
            preferences: Vec::new(),
            credentials: vec![CredentialConfig {
                name: "github".to_string(),
                check: vec!["gh".to_string(), "auth".to_string(), "status".to_string()],
                login: "Run `gh auth login` and follow the prompts".to_string(),
                logout: Vec::new(),
            }],
        }
    }
}

impl SetupConfig {
    pub fn validate(&self) -> Result<()> {
        for dir in &self.directories {
            if dir.trim().is_empty() {
                bail!("directories must not contain empty paths");
            }
        }

        for (name, packages) in &self.commands {
            if name.trim().is_empty() {
                bail!("command names must not be empty");
            }
            if packages.is_empty() {
                bail!("command '{name}' has no package mapping");
            }
        }

        for name in self.env.keys() {
            if name.is_empty() || name.contains('=') {
                bail!("invalid environment variable name '{name}'");
            }
        }

        for pref in &self.preferences {
            if pref.domain.is_empty() || pref.key.is_empty() {
                bail!("preferences need both domain and key");
            }
        }

        for cred in &self.credentials {
            if cred.check.is_empty() {
                bail!("credential '{}' has an empty check command", cred.name);
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceConfig {
    /// Defaults domain or gsettings schema
    pub domain: String,
    pub key: String,
    pub value: PreferenceValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    pub name: String,
    /// Read-only command that succeeds when authenticated
    pub check: Vec<String>,
    /// Instructions shown when not authenticated
    pub login: String,
    /// Optional command that revokes the credential
    #[serde(default)]
    pub logout: Vec<String>,
}

// ============================================================================
// Inventory
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Bounded wait for each probe, in seconds
    pub timeout_secs: u64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl InventoryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

// ============================================================================
// Resources
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// AWS profiles; empty means every profile `aws configure list-profiles` reports
    pub profiles: Vec<String>,
    pub regions: Vec<String>,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            profiles: Vec::new(),
            regions: [
                "us-east-1",
                "us-east-2",
                "us-west-1",
                "us-west-2",
                "eu-west-1",
                "eu-central-1",
                "ap-southeast-1",
                "ap-northeast-1",
            ]
            .iter()
            .map(|r| (*r).to_string())
            .collect(),
        }
    }
}

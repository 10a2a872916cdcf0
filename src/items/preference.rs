//! Host preference item - macOS `defaults` or GNOME `gsettings`

use anyhow::{Context, Result, bail};
use declarative::{Item, ItemContext, Outcome};
use probe::Invocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value types for preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreferenceValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for PreferenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "\"{s}\""),
        }
    }
}

/// Where preferences live on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceStore {
    /// macOS user defaults; domain is e.g. "com.apple.finder"
    Defaults,
    /// GNOME settings; domain is the schema, e.g. "org.gnome.desktop.interface"
    GSettings,
}

impl PreferenceStore {
    pub fn program(&self) -> &'static str {
        match self {
            Self::Defaults => "defaults",
            Self::GSettings => "gsettings",
        }
    }
}

/// A preference key that must hold a value
#[derive(Debug, Clone)]
pub struct HostPreference {
    pub store: PreferenceStore,
    pub domain: String,
    pub key: String,
    pub value: PreferenceValue,
}

impl HostPreference {
    pub fn new(store: PreferenceStore, domain: &str, key: &str, value: PreferenceValue) -> Self {
        Self {
            store,
            domain: domain.to_string(),
            key: key.to_string(),
            value,
        }
    }

    /// Read the current value; `None` when the key is unset or unreadable
    fn read_current(&self, ctx: &ItemContext) -> Result<Option<PreferenceValue>> {
        let invocation = match self.store {
            PreferenceStore::Defaults => {
                Invocation::new("defaults", ["read", &self.domain, &self.key])
            }
            PreferenceStore::GSettings => {
                Invocation::new("gsettings", ["get", &self.domain, &self.key])
            }
        };

        let output = ctx
            .shell
            .run(&invocation)
            .with_context(|| format!("Failed to execute {}", invocation.display()))?;

        if !output.success {
            // Key doesn't exist
            return Ok(None);
        }

        Ok(self.parse(output.trimmed()))
    }

    /// Parse command output as the same type as the desired value
    fn parse(&self, raw: &str) -> Option<PreferenceValue> {
        let raw = match self.store {
            // gsettings prints GVariant text: `uint32 5`, `'text'`
            PreferenceStore::GSettings => raw
                .rsplit_once(' ')
                .filter(|(prefix, _)| prefix.starts_with("int") || prefix.starts_with("uint"))
                .map_or(raw, |(_, number)| number),
            PreferenceStore::Defaults => raw,
        };

        match &self.value {
            PreferenceValue::Bool(_) => match raw {
                "1" | "true" => Some(PreferenceValue::Bool(true)),
                "0" | "false" => Some(PreferenceValue::Bool(false)),
                _ => None,
            },
            PreferenceValue::Int(_) => raw.parse::<i64>().ok().map(PreferenceValue::Int),
            PreferenceValue::Float(_) => raw.parse::<f64>().ok().map(PreferenceValue::Float),
            PreferenceValue::String(_) => {
                let unquoted = raw
                    .strip_prefix('\'')
                    .and_then(|s| s.strip_suffix('\''))
                    .unwrap_or(raw);
                Some(PreferenceValue::String(unquoted.to_string()))
            }
        }
    }

    fn write_invocation(&self) -> Invocation {
        match self.store {
            PreferenceStore::Defaults => {
                let (flag, value) = match &self.value {
                    PreferenceValue::Bool(b) => ("-bool", b.to_string()),
                    PreferenceValue::Int(i) => ("-int", i.to_string()),
                    PreferenceValue::Float(x) => ("-float", x.to_string()),
                    PreferenceValue::String(s) => ("-string", s.clone()),
                };
                Invocation::new("defaults", ["write", &self.domain, &self.key, flag, &value])
            }
            PreferenceStore::GSettings => {
                let value = match &self.value {
                    PreferenceValue::String(s) => format!("'{s}'"),
                    // GVariant needs the decimal point to type a double
                    PreferenceValue::Float(x) => format!("{x:?}"),
                    other => other.to_string(),
                };
                Invocation::new("gsettings", ["set", &self.domain, &self.key, &value])
            }
        }
    }

    fn delete_invocation(&self) -> Invocation {
        match self.store {
            PreferenceStore::Defaults => {
                Invocation::new("defaults", ["delete", &self.domain, &self.key])
            }
            PreferenceStore::GSettings => {
                Invocation::new("gsettings", ["reset", &self.domain, &self.key])
            }
        }
    }
}

impl Item for HostPreference {
    fn name(&self) -> String {
        format!("{}.{}", self.domain, self.key)
    }

    fn kind(&self) -> &'static str {
        "preference"
    }

    fn validate(&self, ctx: &ItemContext) -> Result<String> {
        if !ctx.shell.which(self.store.program()) {
            bail!("{} is not available", self.store.program());
        }
        match self.read_current(ctx)? {
            None => bail!("not set (want {})", self.value),
            Some(current) if current == self.value => Ok(current.to_string()),
            Some(current) => bail!("is {current}, want {}", self.value),
        }
    }

    fn install(&self, ctx: &ItemContext) -> Result<Outcome> {
        let current = self.read_current(ctx)?;
        if current.as_ref() == Some(&self.value) {
            return Ok(Outcome::Unchanged(self.value.to_string()));
        }

        ctx.shell.run_checked(&self.write_invocation())?;

        let from = current.map_or_else(|| "unset".to_string(), |v| v.to_string());
        Ok(Outcome::Changed(format!("{from} → {}", self.value)))
    }

    fn uninstall(&self, ctx: &ItemContext) -> Result<Outcome> {
        if self.read_current(ctx)?.is_none() {
            return Ok(Outcome::Unchanged("not set".to_string()));
        }

        ctx.shell.run_checked(&self.delete_invocation())?;
        Ok(Outcome::Changed("reset to default".to_string()))
    }
}

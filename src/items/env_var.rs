//! Environment variable item
//!
//! A child process cannot change its parent's environment, so install and
//! uninstall only surface instructions for the user's shell profile.

use anyhow::{Result, bail};
use declarative::{Guidance, Item, ItemContext, Outcome, Platform};
use std::fmt;
use std::sync::Arc;

type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// An environment variable that must be set, optionally to a specific value
#[derive(Clone)]
pub struct ExpectedEnvVar {
    pub name: String,
    /// `None` only requires the variable to be set
    pub expected: Option<String>,
    set: Guidance,
    unset: Guidance,
    lookup: Lookup,
}

impl ExpectedEnvVar {
    pub fn new(name: &str, expected: Option<String>, platform: Platform) -> Self {
        let set = Guidance::text(set_instructions(name, expected.as_deref(), platform));
        let unset = Guidance::text(unset_instructions(name, platform));
        Self {
            name: name.to_string(),
            expected,
            set,
            unset,
            lookup: Arc::new(|name| std::env::var(name).ok()),
        }
    }

    /// Read variables from somewhere other than the process environment
    #[cfg(test)]
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.lookup = Arc::new(lookup);
        self
    }

    fn current(&self) -> Option<String> {
        (self.lookup)(&self.name)
    }

    fn satisfied(&self) -> bool {
        match (self.current(), &self.expected) {
            (None, _) => false,
            (Some(value), Some(expected)) => &value == expected,
            (Some(_), None) => true,
        }
    }
}

impl fmt::Debug for ExpectedEnvVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpectedEnvVar")
            .field("name", &self.name)
            .field("expected", &self.expected)
            .finish_non_exhaustive()
    }
}

fn set_instructions(name: &str, expected: Option<&str>, platform: Platform) -> String {
    let value = expected.unwrap_or("<value>");
    match platform {
        Platform::Windows => format!("run `setx {name} \"{value}\"` and open a new terminal"),
        Platform::MacOs | Platform::Linux => format!(
            "add `export {name}=\"{value}\"` to your shell profile and start a new shell"
        ),
    }
}

fn unset_instructions(name: &str, platform: Platform) -> String {
    match platform {
        Platform::Windows => {
            format!("run `reg delete HKCU\\Environment /v {name} /f` and open a new terminal")
        }
        Platform::MacOs | Platform::Linux => {
            format!("remove the `export {name}=...` line from your shell profile")
        }
    }
}

impl Item for ExpectedEnvVar {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn kind(&self) -> &'static str {
        "env"
    }

    fn validate(&self, _ctx: &ItemContext) -> Result<String> {
        match (self.current(), &self.expected) {
            (None, _) => bail!("{} is not set", self.name),
            (Some(value), Some(expected)) if &value != expected => {
                bail!("{}={value}, expected {expected}", self.name)
            }
            (Some(value), _) => Ok(format!("{}={value}", self.name)),
        }
    }

    fn install(&self, _ctx: &ItemContext) -> Result<Outcome> {
        if self.satisfied() {
            return Ok(Outcome::Unchanged("set".to_string()));
        }
        Ok(self.set.surface())
    }

    fn uninstall(&self, _ctx: &ItemContext) -> Result<Outcome> {
        if self.current().is_none() {
            return Ok(Outcome::Unchanged("not set".to_string()));
        }
        Ok(self.unset.surface())
    }
}

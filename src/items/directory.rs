//! Directory item - a path that must exist as a directory

use anyhow::{Context, Result, bail};
use declarative::{Item, ItemContext, Outcome};
use std::fs;
use std::path::PathBuf;

/// A directory that must exist
#[derive(Debug, Clone)]
pub struct ExpectedDirectory {
    pub path: PathBuf,
}

impl ExpectedDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Item for ExpectedDirectory {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn kind(&self) -> &'static str {
        "directory"
    }

    fn validate(&self, _ctx: &ItemContext) -> Result<String> {
        if self.path.is_dir() {
            Ok("exists".to_string())
        } else if self.path.exists() {
            bail!("{} exists but is not a directory", self.path.display())
        } else {
            bail!("{} does not exist", self.path.display())
        }
    }

    fn install(&self, _ctx: &ItemContext) -> Result<Outcome> {
        if self.path.is_dir() {
            return Ok(Outcome::Unchanged("exists".to_string()));
        }

        fs::create_dir_all(&self.path)
            .with_context(|| format!("Failed to create {}", self.path.display()))?;
        Ok(Outcome::Changed("created".to_string()))
    }

    fn uninstall(&self, _ctx: &ItemContext) -> Result<Outcome> {
        if !self.path.exists() {
            return Ok(Outcome::Unchanged("not present".to_string()));
        }
        if !self.path.is_dir() {
            bail!("{} is not a directory, refusing to remove", self.path.display());
        }

        fs::remove_dir_all(&self.path)
            .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        Ok(Outcome::Changed("removed".to_string()))
    }
}

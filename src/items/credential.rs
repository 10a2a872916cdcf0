//! Credential item - a login registered with an external CLI

use anyhow::{Result, bail};
use declarative::{Guidance, Item, ItemContext, Outcome};
use probe::{Invocation, parse};

/// A credential checked by running a read-only command
///
/// Logging in is interactive, so install only surfaces guidance.
#[derive(Debug, Clone)]
pub struct RegisteredCredential {
    pub name: String,
    pub check: Invocation,
    pub login: Guidance,
    pub logout: Option<Invocation>,
}

impl RegisteredCredential {
    pub fn new(name: &str, check: Invocation, login: Guidance) -> Self {
        Self {
            name: name.to_string(),
            check,
            login,
            logout: None,
        }
    }

    pub fn with_logout(mut self, logout: Invocation) -> Self {
        self.logout = Some(logout);
        self
    }

    /// `Ok(Some(detail))` when authenticated, `Ok(None)` when not
    fn authenticated(&self, ctx: &ItemContext) -> Result<Option<String>> {
        if !ctx.shell.which(&self.check.program) {
            bail!("{} is not installed", self.check.program);
        }
        let output = ctx.shell.run(&self.check)?;
        let detail = parse::first_line(&output.output).unwrap_or_default();
        Ok(output.success.then_some(detail))
    }
}

impl Item for RegisteredCredential {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn kind(&self) -> &'static str {
        "credential"
    }

    fn validate(&self, ctx: &ItemContext) -> Result<String> {
        match self.authenticated(ctx)? {
            Some(detail) if detail.is_empty() => Ok("authenticated".to_string()),
            Some(detail) => Ok(detail),
            None => bail!("not authenticated ({} failed)", self.check.display()),
        }
    }

    fn install(&self, ctx: &ItemContext) -> Result<Outcome> {
        if self.authenticated(ctx)?.is_some() {
            return Ok(Outcome::Unchanged("authenticated".to_string()));
        }
        Ok(self.login.surface())
    }

    fn uninstall(&self, ctx: &ItemContext) -> Result<Outcome> {
        if self.authenticated(ctx)?.is_none() {
            return Ok(Outcome::Unchanged("not authenticated".to_string()));
        }

        match &self.logout {
            Some(logout) => {
                ctx.shell.run_checked(logout)?;
                Ok(Outcome::Changed("logged out".to_string()))
            }
            None => Ok(Outcome::Skipped("log out manually".to_string())),
        }
    }
}

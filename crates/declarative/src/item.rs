//! Configuration item trait
//!
//! An item is the smallest unit of machine state the reconciler manages:
//! a directory, an installed command, an environment variable, a host
//! preference, a registered credential.

use anyhow::Result;
use probe::Shell;
use std::fmt;
use std::sync::Arc;

/// Context passed to every item operation
pub struct ItemContext<'a> {
    /// Boundary to external programs
    pub shell: &'a dyn Shell,
    /// Report what would change without invoking install/uninstall
    pub dry_run: bool,
}

impl<'a> ItemContext<'a> {
    pub fn new(shell: &'a dyn Shell) -> Self {
        Self {
            shell,
            dry_run: false,
        }
    }

    pub fn dry_run(shell: &'a dyn Shell) -> Self {
        Self {
            shell,
            dry_run: true,
        }
    }
}

/// Result of an install or uninstall
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Already in the target state; nothing was done
    Unchanged(String),
    /// A mutation was performed
    Changed(String),
    /// Instructions were surfaced; the target state is NOT reached until the
    /// user acts, so validation keeps failing until then
    Instructions(String),
    /// Not attempted (dry run, or an action that is only ever manual)
    Skipped(String),
}

impl Outcome {
    /// Text for the report
    pub fn report(&self) -> &str {
        match self {
            Self::Unchanged(s) | Self::Changed(s) | Self::Instructions(s) | Self::Skipped(s) => s,
        }
    }

    /// Whether the host was mutated
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Changed(_))
    }

    /// Marker used in report lines
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Unchanged(_) => "✓",
            Self::Changed(_) => "+",
            Self::Instructions(_) => "!",
            Self::Skipped(_) => "-",
        }
    }
}

/// Core trait for configuration items
///
/// # Contract
///
/// - `validate` must be side-effect-free. `Ok` carries a short report of the
///   satisfied state; `Err` means the state is not (or cannot be shown to
///   be) present.
/// - `install` and `uninstall` must be safe to repeat: when the host is
///   already in the target state they return [`Outcome::Unchanged`] without
///   mutating anything.
pub trait Item: Send + Sync + fmt::Debug {
    /// Human-readable name, unique within its group
    fn name(&self) -> String;

    /// Item category (e.g. "directory", "command")
    fn kind(&self) -> &'static str;

    /// Check whether the desired state is present
    fn validate(&self, ctx: &ItemContext) -> Result<String>;

    /// Bring the host into the desired state
    fn install(&self, ctx: &ItemContext) -> Result<Outcome>;

    /// Take the host out of the desired state
    fn uninstall(&self, ctx: &ItemContext) -> Result<Outcome>;
}

/// A boxed item for type-erased storage
pub type BoxedItem = Box<dyn Item>;

/// Injected strategy for state that cannot be set programmatically
///
/// Used for interactive logins and shell-profile edits: calling
/// [`surface`](Self::surface) only produces instructions for the user.
#[derive(Clone)]
pub struct Guidance(Arc<dyn Fn() -> String + Send + Sync>);

impl Guidance {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Fixed instruction text
    pub fn text(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move || message.clone())
    }

    /// Produce the instructions. Success here means "surfaced", not "done".
    pub fn surface(&self) -> Outcome {
        Outcome::Instructions((self.0)())
    }
}

impl fmt::Debug for Guidance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guidance(..)")
    }
}

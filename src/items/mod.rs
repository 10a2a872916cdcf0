//! Configuration items for a developer workstation
//!
//! Each type implements [`declarative::Item`]:
//! - `validate` only reads host state
//! - `install` / `uninstall` re-check state and do nothing when already converged
//!
//! Anything that cannot be changed from a child process (shell profiles,
//! interactive logins) goes through a [`declarative::Guidance`] instead.

mod command;
mod credential;
mod directory;
mod env_var;
mod preference;

pub use command::{InstallableCommand, PackageManager};
pub use credential::RegisteredCredential;
pub use directory::ExpectedDirectory;
pub use env_var::ExpectedEnvVar;
pub use preference::{HostPreference, PreferenceStore, PreferenceValue};

use std::time::Duration;

/// Bounded wait for package installs and other slow mutations
pub const INSTALL_TIMEOUT: Duration = Duration::from_secs(15 * 60);

//! # Declarative
//!
//! Idempotent machine configuration, reconciled in ordered groups.
//!
//! ## Core Concepts
//!
//! - **Item**: the smallest unit of desired machine state (validate / install / uninstall)
//! - **Group**: an ordered, named collection of items reconciled together
//! - **Provider**: platform → ordered list of groups
//! - **Reconciler**: status / apply / reset across every group
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{Group, Item, ItemContext, Outcome, Reconciler};
//! use probe::SystemShell;
//!
//! #[derive(Debug)]
//! struct Dir(std::path::PathBuf);
//!
//! impl Item for Dir {
//!     fn name(&self) -> String { self.0.display().to_string() }
//!     fn kind(&self) -> &'static str { "directory" }
//!
//!     fn validate(&self, _ctx: &ItemContext) -> anyhow::Result<String> {
//!         anyhow::ensure!(self.0.is_dir(), "missing");
//!         Ok("exists".into())
//!     }
//!
//!     fn install(&self, _ctx: &ItemContext) -> anyhow::Result<Outcome> {
//!         std::fs::create_dir_all(&self.0)?;
//!         Ok(Outcome::Changed("created".into()))
//!     }
//!
//!     fn uninstall(&self, _ctx: &ItemContext) -> anyhow::Result<Outcome> {
//!         std::fs::remove_dir_all(&self.0)?;
//!         Ok(Outcome::Changed("removed".into()))
//!     }
//! }
//!
//! let shell = SystemShell::default();
//! let reconciler = Reconciler::new(vec![Group::new("directories").with(Dir("/tmp/dev".into()))]);
//! let result = reconciler.apply(&ItemContext::new(&shell));
//! print!("{}", result.report);
//! ```
//!
//! ## Guarantees
//!
//! - A group installs only items that fail validation and uninstalls only
//!   items that pass it.
//! - Nothing stops at the first failure: every item and every group runs,
//!   and each failure is kept as a typed [`ItemFailure`] inside a
//!   [`GroupError`].
//! - A group with no items is an error, never a silent success.

pub mod error;
pub mod group;
pub mod item;
pub mod platform;
pub mod reconciler;

// Re-export main types at crate root
pub use error::{GroupError, ItemFailure, Operation, ReconcileError, UnknownGroup};
pub use group::{Group, GroupReport, Summary};
pub use item::{BoxedItem, Guidance, Item, ItemContext, Outcome};
pub use platform::{Platform, Provider, resolve};
pub use reconciler::{Reconciler, Reconciliation};

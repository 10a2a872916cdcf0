//! Typed multi-errors for group and reconciler results

use std::fmt;
use thiserror::Error;

/// Which item operation produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Validate,
    Install,
    Uninstall,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validate => "validate",
            Self::Install => "install",
            Self::Uninstall => "uninstall",
        })
    }
}

/// One item that failed, with its original error preserved
#[derive(Debug)]
pub struct ItemFailure {
    pub item: String,
    pub operation: Operation,
    pub error: anyhow::Error,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {:#}", self.item, self.operation, self.error)
    }
}

/// Everything that went wrong in one group
#[derive(Debug, Error)]
pub enum GroupError {
    /// A group must declare at least one item
    #[error("{group}: group declares no items")]
    Empty { group: String },

    /// One or more items failed; every failure is kept
    #[error("{group}: {} item(s) failed: {}", .failures.len(), join(.failures))]
    Items {
        group: String,
        failures: Vec<ItemFailure>,
    },
}

impl GroupError {
    pub fn group(&self) -> &str {
        match self {
            Self::Empty { group } | Self::Items { group, .. } => group,
        }
    }

    pub fn failures(&self) -> &[ItemFailure] {
        match self {
            Self::Empty { .. } => &[],
            Self::Items { failures, .. } => failures,
        }
    }

    /// Names of the items that failed
    pub fn failed_items(&self) -> Vec<&str> {
        self.failures().iter().map(|f| f.item.as_str()).collect()
    }
}

fn join(failures: &[ItemFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Aggregate error for a whole reconciliation run
#[derive(Debug, Error)]
#[error("{} group(s) reported errors: {}", .errors.len(), join_groups(.errors))]
pub struct ReconcileError {
    pub errors: Vec<GroupError>,
}

fn join_groups(errors: &[GroupError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// A group filter named a group the provider does not declare
#[derive(Debug, Error)]
#[error("unknown group '{name}' (available: {})", .available.join(", "))]
pub struct UnknownGroup {
    pub name: String,
    pub available: Vec<String>,
}

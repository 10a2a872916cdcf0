//! Configuration groups - ordered, named collections of items
//!
//! A group runs its items sequentially in declaration order. Later items
//! may rely on earlier ones (a directory before the file that lives in it),
//! so nothing here is parallel.

use crate::error::{GroupError, ItemFailure, Operation};
use crate::item::{BoxedItem, Item, ItemContext, Outcome};
use log::{debug, info, warn};
use std::fmt;

/// Per-outcome counters for a group or a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Items whose validation passed
    pub satisfied: usize,
    /// Items whose validation failed
    pub unsatisfied: usize,
    pub unchanged: usize,
    pub changed: usize,
    pub instructions: usize,
    pub skipped: usize,
    /// Items whose install/uninstall returned an error
    pub failed: usize,
}

impl Summary {
    /// Add an install/uninstall outcome
    pub fn add_outcome(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Unchanged(_) => self.unchanged += 1,
            Outcome::Changed(_) => self.changed += 1,
            Outcome::Instructions(_) => self.instructions += 1,
            Outcome::Skipped(_) => self.skipped += 1,
        }
    }

    pub fn merge(&mut self, other: &Summary) {
        self.satisfied += other.satisfied;
        self.unsatisfied += other.unsatisfied;
        self.unchanged += other.unchanged;
        self.changed += other.changed;
        self.instructions += other.instructions;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    /// Number of actual mutations
    pub fn total_changes(&self) -> usize {
        self.changed
    }
}

/// Text, counters and aggregated error for one group operation
#[derive(Debug)]
pub struct GroupReport {
    pub group: String,
    pub operation: Operation,
    pub text: String,
    pub summary: Summary,
    pub error: Option<GroupError>,
}

impl GroupReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// An ordered, named collection of items
pub struct Group {
    name: String,
    items: Vec<BoxedItem>,
}

impl Group {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            items: Vec::new(),
        }
    }

    /// Builder-style append
    pub fn with(mut self, item: impl Item + 'static) -> Self {
        self.items.push(Box::new(item));
        self
    }

    pub fn push(&mut self, item: impl Item + 'static) {
        self.items.push(Box::new(item));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &[BoxedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Validate every item; the error lists every item that failed
    pub fn validate(&self, ctx: &ItemContext) -> GroupReport {
        let mut run = Run::new(self, Operation::Validate);
        if self.items.is_empty() {
            return run.empty();
        }

        for item in &self.items {
            match item.validate(ctx) {
                Ok(report) => {
                    run.summary.satisfied += 1;
                    run.line("✓", &item.name(), &report);
                }
                Err(e) => {
                    run.summary.unsatisfied += 1;
                    run.line("✗", &item.name(), &format!("{e:#}"));
                    run.fail(item.as_ref(), Operation::Validate, e);
                }
            }
        }

        run.finish()
    }

    /// Install every item that currently fails validation
    pub fn install(&self, ctx: &ItemContext) -> GroupReport {
        self.converge(ctx, Operation::Install)
    }

    /// Uninstall every item that currently passes validation
    pub fn uninstall(&self, ctx: &ItemContext) -> GroupReport {
        self.converge(ctx, Operation::Uninstall)
    }

    fn converge(&self, ctx: &ItemContext, operation: Operation) -> GroupReport {
        let mut run = Run::new(self, operation);
        if self.items.is_empty() {
            return run.empty();
        }

        let installing = operation == Operation::Install;

        for item in &self.items {
            let name = item.name();
            let satisfied = match item.validate(ctx) {
                Ok(_) => {
                    run.summary.satisfied += 1;
                    true
                }
                Err(e) => {
                    debug!("{}/{name}: not satisfied: {e:#}", self.name);
                    run.summary.unsatisfied += 1;
                    false
                }
            };

            // Install only what is missing; uninstall only what is present.
            if satisfied == installing {
                let note = if installing {
                    "already satisfied"
                } else {
                    "not present"
                };
                run.summary.unchanged += 1;
                run.line("✓", &name, note);
                continue;
            }

            if ctx.dry_run {
                let outcome = Outcome::Skipped(format!("dry run: would {operation}"));
                run.summary.add_outcome(&outcome);
                run.line(outcome.symbol(), &name, outcome.report());
                continue;
            }

            let result = if installing {
                item.install(ctx)
            } else {
                item.uninstall(ctx)
            };

            match result {
                Ok(outcome) => {
                    match &outcome {
                        Outcome::Changed(r) => info!("{}/{name}: {r}", self.name),
                        Outcome::Instructions(r) => warn!("{}/{name}: action required: {r}", self.name),
                        _ => {}
                    }
                    run.summary.add_outcome(&outcome);
                    run.line(outcome.symbol(), &name, outcome.report());
                }
                Err(e) => {
                    run.summary.failed += 1;
                    run.line("✗", &name, &format!("{e:#}"));
                    run.fail(item.as_ref(), operation, e);
                }
            }
        }

        run.finish()
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("items", &self.items)
            .finish()
    }
}

/// Accumulator for one group operation
struct Run<'a> {
    group: &'a str,
    operation: Operation,
    text: String,
    summary: Summary,
    failures: Vec<ItemFailure>,
}

impl<'a> Run<'a> {
    fn new(group: &'a Group, operation: Operation) -> Self {
        Self {
            group: &group.name,
            operation,
            text: String::new(),
            summary: Summary::default(),
            failures: Vec::new(),
        }
    }

    fn line(&mut self, symbol: &str, item: &str, detail: &str) {
        if detail.is_empty() {
            self.text.push_str(&format!("  {symbol} {item}\n"));
        } else {
            self.text.push_str(&format!("  {symbol} {item}: {detail}\n"));
        }
    }

    fn fail(&mut self, item: &dyn Item, operation: Operation, error: anyhow::Error) {
        self.failures.push(ItemFailure {
            item: item.name(),
            operation,
            error,
        });
    }

    fn empty(mut self) -> GroupReport {
        self.text.push_str("  ✗ group declares no items\n");
        GroupReport {
            group: self.group.to_string(),
            operation: self.operation,
            text: self.text,
            summary: self.summary,
            error: Some(GroupError::Empty {
                group: self.group.to_string(),
            }),
        }
    }

    fn finish(self) -> GroupReport {
        let error = (!self.failures.is_empty()).then(|| GroupError::Items {
            group: self.group.to_string(),
            failures: self.failures,
        });
        GroupReport {
            group: self.group.to_string(),
            operation: self.operation,
            text: self.text,
            summary: self.summary,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use probe::fake::ScriptedShell;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Item with a switchable state that counts mutating calls
    #[derive(Debug, Default)]
    struct Toggle {
        name: String,
        present: Arc<AtomicBool>,
        installs: Arc<AtomicUsize>,
        uninstalls: Arc<AtomicUsize>,
        fail_mutation: bool,
    }

    impl Toggle {
        fn new(name: &str, present: bool) -> Self {
            Self {
                name: name.to_string(),
                present: Arc::new(AtomicBool::new(present)),
                ..Self::default()
            }
        }

        fn failing(mut self) -> Self {
            self.fail_mutation = true;
            self
        }
    }

    impl Item for Toggle {
        fn name(&self) -> String {
            self.name.clone()
        }

        fn kind(&self) -> &'static str {
            "toggle"
        }

        fn validate(&self, _ctx: &ItemContext) -> Result<String> {
            if self.present.load(Ordering::SeqCst) {
                Ok("present".into())
            } else {
                bail!("{} is missing", self.name)
            }
        }

        fn install(&self, _ctx: &ItemContext) -> Result<Outcome> {
            if self.fail_mutation {
                bail!("cannot install {}", self.name);
            }
            if self.present.swap(true, Ordering::SeqCst) {
                return Ok(Outcome::Unchanged("already present".into()));
            }
            self.installs.fetch_add(1, Ordering::SeqCst);
            Ok(Outcome::Changed("installed".into()))
        }

        fn uninstall(&self, _ctx: &ItemContext) -> Result<Outcome> {
            if self.fail_mutation {
                bail!("cannot uninstall {}", self.name);
            }
            if !self.present.swap(false, Ordering::SeqCst) {
                return Ok(Outcome::Unchanged("already absent".into()));
            }
            self.uninstalls.fetch_add(1, Ordering::SeqCst);
            Ok(Outcome::Changed("removed".into()))
        }
    }

    #[test]
    fn test_empty_group_is_error_for_all_operations() {
        let shell = ScriptedShell::new();
        let ctx = ItemContext::new(&shell);
        let group = Group::new("dotfiles");

        for report in [group.validate(&ctx), group.install(&ctx), group.uninstall(&ctx)] {
            assert!(matches!(report.error, Some(GroupError::Empty { ref group }) if group == "dotfiles"));
        }
    }

    #[test]
    fn test_validate_lists_every_failure() {
        let shell = ScriptedShell::new();
        let ctx = ItemContext::new(&shell);
        let group = Group::new("tools")
            .with(Toggle::new("a", false))
            .with(Toggle::new("b", true))
            .with(Toggle::new("c", false));

        let report = group.validate(&ctx);

        let err = report.error.expect("two items fail validation");
        assert_eq!(err.group(), "tools");
        assert_eq!(err.failed_items(), ["a", "c"]);
        assert!(err.failures().iter().all(|f| f.operation == Operation::Validate));
        assert_eq!(report.summary.satisfied, 1);
        assert_eq!(report.summary.unsatisfied, 2);
        assert!(report.text.contains("✓ b: present"));
        assert!(report.text.contains("✗ a: a is missing"));
    }

    #[test]
    fn test_validate_all_pass_is_ok() {
        let shell = ScriptedShell::new();
        let ctx = ItemContext::new(&shell);
        let group = Group::new("tools").with(Toggle::new("a", true));
        assert!(group.validate(&ctx).is_success());
    }

    #[test]
    fn test_install_only_touches_failing_items() {
        let shell = ScriptedShell::new();
        let ctx = ItemContext::new(&shell);
        let a = Toggle::new("a", false);
        let b = Toggle::new("b", true);
        let (a_installs, b_installs) = (Arc::clone(&a.installs), Arc::clone(&b.installs));
        let group = Group::new("tools").with(a).with(b);

        let report = group.install(&ctx);

        assert!(report.is_success());
        assert_eq!(a_installs.load(Ordering::SeqCst), 1);
        assert_eq!(b_installs.load(Ordering::SeqCst), 0);
        assert_eq!(report.summary.changed, 1);
        assert_eq!(report.summary.unchanged, 1);
    }

    #[test]
    fn test_uninstall_only_touches_passing_items() {
        let shell = ScriptedShell::new();
        let ctx = ItemContext::new(&shell);
        let a = Toggle::new("a", false);
        let b = Toggle::new("b", true);
        let (a_removals, b_removals) = (Arc::clone(&a.uninstalls), Arc::clone(&b.uninstalls));
        let group = Group::new("tools").with(a).with(b);

        let report = group.uninstall(&ctx);

        assert!(report.is_success());
        assert_eq!(a_removals.load(Ordering::SeqCst), 0);
        assert_eq!(b_removals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_install_twice_is_idempotent() {
        let shell = ScriptedShell::new();
        let ctx = ItemContext::new(&shell);
        let a = Toggle::new("a", false);
        let installs = Arc::clone(&a.installs);
        let group = Group::new("tools").with(a);

        group.install(&ctx);
        let second = group.install(&ctx);

        assert_eq!(installs.load(Ordering::SeqCst), 1);
        assert_eq!(second.summary.changed, 0);
        assert_eq!(second.summary.unchanged, 1);
    }

    #[test]
    fn test_install_failure_does_not_stop_siblings() {
        let shell = ScriptedShell::new();
        let ctx = ItemContext::new(&shell);
        let ok = Toggle::new("ok", false);
        let ok_installs = Arc::clone(&ok.installs);
        let group = Group::new("tools")
            .with(Toggle::new("broken", false).failing())
            .with(ok)
            .with(Toggle::new("also-broken", false).failing());

        let report = group.install(&ctx);

        assert_eq!(ok_installs.load(Ordering::SeqCst), 1);
        let err = report.error.expect("two installs fail");
        assert_eq!(err.failed_items(), ["broken", "also-broken"]);
        assert!(err.failures().iter().all(|f| f.operation == Operation::Install));
        assert!(err.to_string().contains("cannot install broken"));
        assert_eq!(report.summary.failed, 2);
    }

    #[test]
    fn test_dry_run_does_not_mutate() {
        let shell = ScriptedShell::new();
        let ctx = ItemContext::dry_run(&shell);
        let a = Toggle::new("a", false);
        let installs = Arc::clone(&a.installs);
        let group = Group::new("tools").with(a);

        let report = group.install(&ctx);

        assert!(report.is_success());
        assert_eq!(installs.load(Ordering::SeqCst), 0);
        assert_eq!(report.summary.skipped, 1);
        assert!(report.text.contains("dry run: would install"));
    }
}

//! Reconciler - status / apply / reset across a provider's groups
//!
//! Groups run in declared order and the reconciler never short-circuits:
//! a failing group is recorded and the next one still runs. Callers that
//! need to know whether anything failed must look at the errors, not the
//! report text.

use crate::error::{GroupError, Operation, ReconcileError, UnknownGroup};
use crate::group::{Group, GroupReport, Summary};
use crate::item::ItemContext;
use log::debug;

/// The result of one reconciliation pass
#[derive(Debug)]
pub struct Reconciliation {
    pub operation: Operation,
    /// Concatenated report of every group, in order
    pub report: String,
    pub summary: Summary,
    /// Every group error, in group order
    pub errors: Vec<GroupError>,
}

impl Reconciliation {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn first_error(&self) -> Option<&GroupError> {
        self.errors.first()
    }

    /// Report on success, aggregate error otherwise
    pub fn into_result(self) -> Result<String, ReconcileError> {
        if self.errors.is_empty() {
            Ok(self.report)
        } else {
            Err(ReconcileError {
                errors: self.errors,
            })
        }
    }
}

/// Orchestrates groups for one run
#[derive(Debug)]
pub struct Reconciler {
    groups: Vec<Group>,
}

impl Reconciler {
    pub fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Keep only the named groups, preserving declared order
    ///
    /// An empty selection keeps everything.
    pub fn select(self, names: &[String]) -> Result<Self, UnknownGroup> {
        if names.is_empty() {
            return Ok(self);
        }

        if let Some(missing) = names
            .iter()
            .find(|n| !self.groups.iter().any(|g| g.name() == n.as_str()))
        {
            return Err(UnknownGroup {
                name: missing.clone(),
                available: self.groups.iter().map(|g| g.name().to_string()).collect(),
            });
        }

        Ok(Self {
            groups: self
                .groups
                .into_iter()
                .filter(|g| names.iter().any(|n| n == g.name()))
                .collect(),
        })
    }

    /// Validate every group
    pub fn status(&self, ctx: &ItemContext) -> Reconciliation {
        self.run(Operation::Validate, |g| g.validate(ctx))
    }

    /// Install whatever is missing, group by group
    pub fn apply(&self, ctx: &ItemContext) -> Reconciliation {
        self.run(Operation::Install, |g| g.install(ctx))
    }

    /// Uninstall whatever is present, group by group
    pub fn reset(&self, ctx: &ItemContext) -> Reconciliation {
        self.run(Operation::Uninstall, |g| g.uninstall(ctx))
    }

    fn run<F>(&self, operation: Operation, mut step: F) -> Reconciliation
    where
        F: FnMut(&Group) -> GroupReport,
    {
        let mut out = Reconciliation {
            operation,
            report: String::new(),
            summary: Summary::default(),
            errors: Vec::new(),
        };

        for group in &self.groups {
            debug!("{operation}: group {}", group.name());
            let report = step(group);

            out.report.push_str(&format!("[{}]\n", report.group));
            out.report.push_str(&report.text);
            out.summary.merge(&report.summary);
            if let Some(err) = report.error {
                out.errors.push(err);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Item, Outcome};
    use anyhow::{Result, bail};
    use probe::fake::ScriptedShell;
    use std::sync::{Arc, Mutex};

    /// Records the order in which items are touched
    #[derive(Debug)]
    struct Recorder {
        name: String,
        ok: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Item for Recorder {
        fn name(&self) -> String {
            self.name.clone()
        }

        fn kind(&self) -> &'static str {
            "recorder"
        }

        fn validate(&self, _ctx: &ItemContext) -> Result<String> {
            self.log.lock().unwrap().push(format!("validate {}", self.name));
            if self.ok {
                Ok(String::new())
            } else {
                bail!("{} not configured", self.name)
            }
        }

        fn install(&self, _ctx: &ItemContext) -> Result<Outcome> {
            self.log.lock().unwrap().push(format!("install {}", self.name));
            bail!("{} install failed", self.name)
        }

        fn uninstall(&self, _ctx: &ItemContext) -> Result<Outcome> {
            self.log.lock().unwrap().push(format!("uninstall {}", self.name));
            Ok(Outcome::Changed("removed".into()))
        }
    }

    fn recorder(name: &str, ok: bool, log: &Arc<Mutex<Vec<String>>>) -> Recorder {
        Recorder {
            name: name.to_string(),
            ok,
            log: Arc::clone(log),
        }
    }

    fn fixture(log: &Arc<Mutex<Vec<String>>>) -> Reconciler {
        Reconciler::new(vec![
            Group::new("directories").with(recorder("dev", true, log)),
            Group::new("empty"),
            Group::new("tools")
                .with(recorder("jq", false, log))
                .with(recorder("git", true, log)),
        ])
    }

    #[test]
    fn test_status_runs_groups_in_order_and_collects_errors() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let shell = ScriptedShell::new();
        let ctx = ItemContext::new(&shell);

        let result = fixture(&log).status(&ctx);

        assert_eq!(
            *log.lock().unwrap(),
            ["validate dev", "validate jq", "validate git"]
        );
        assert!(!result.is_success());
        assert_eq!(result.errors.len(), 2);
        assert!(matches!(result.first_error(), Some(GroupError::Empty { group }) if group == "empty"));
        assert_eq!(result.errors[1].failed_items(), ["jq"]);

        let dirs = result.report.find("[directories]").unwrap();
        let empty = result.report.find("[empty]").unwrap();
        let tools = result.report.find("[tools]").unwrap();
        assert!(dirs < empty && empty < tools);
    }

    #[test]
    fn test_apply_continues_past_failures() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let shell = ScriptedShell::new();
        let ctx = ItemContext::new(&shell);

        let result = fixture(&log).apply(&ctx);

        assert!(log.lock().unwrap().contains(&"install jq".to_string()));
        assert!(!log.lock().unwrap().contains(&"install git".to_string()));
        assert_eq!(result.operation, Operation::Install);
        let err = result.into_result().unwrap_err();
        assert_eq!(err.errors.len(), 2);
        assert!(err.to_string().contains("jq install failed"));
    }

    #[test]
    fn test_reset_uninstalls_only_present_items() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let shell = ScriptedShell::new();
        let ctx = ItemContext::new(&shell);

        let result = fixture(&log).select(&["tools".to_string()]).unwrap().reset(&ctx);

        let log = log.lock().unwrap();
        assert!(log.contains(&"uninstall git".to_string()));
        assert!(!log.contains(&"uninstall jq".to_string()));
        assert!(result.is_success());
        assert_eq!(result.summary.changed, 1);
    }

    #[test]
    fn test_select_unknown_group() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let err = fixture(&log)
            .select(&["fonts".to_string()])
            .unwrap_err();
        assert_eq!(err.name, "fonts");
        assert_eq!(err.available, ["directories", "empty", "tools"]);
    }

    #[test]
    fn test_no_groups_is_success_with_empty_report() {
        let shell = ScriptedShell::new();
        let ctx = ItemContext::new(&shell);
        let result = Reconciler::new(Vec::new()).status(&ctx);
        assert!(result.is_success());
        assert_eq!(result.into_result().unwrap(), "");
    }
}

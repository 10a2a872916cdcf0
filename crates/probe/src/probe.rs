//! A single external check: run a command, parse its text, keep the value or nothing.

use crate::shell::{Invocation, Shell};
use log::debug;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Parser from raw command output to a semantic value.
pub type Parser<T> = Arc<dyn Fn(&str) -> Option<T> + Send + Sync>;

/// One external-command check.
pub struct Probe<T> {
    name: String,
    invocation: Invocation,
    parser: Parser<T>,
}

impl<T> Probe<T> {
    pub fn new<F>(name: &str, invocation: Invocation, parser: F) -> Self
    where
        F: Fn(&str) -> Option<T> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            invocation,
            parser: Arc::new(parser),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// Run the probe. Never fails: every failure mode becomes an absent result.
    pub fn execute(&self, shell: &dyn Shell, index: usize) -> ProbeResult<T> {
        if !shell.which(&self.invocation.program) {
            debug!("probe {}: {} not installed", self.name, self.invocation.program);
            return ProbeResult::absent(&self.name, index, ProbeStatus::NotInstalled);
        }

        let output = match shell.run(&self.invocation) {
            Ok(output) => output,
            Err(e) if e.is_not_found() => {
                return ProbeResult::absent(&self.name, index, ProbeStatus::NotInstalled);
            }
            Err(e) => {
                debug!("probe {}: {e}", self.name);
                return ProbeResult::absent(&self.name, index, ProbeStatus::Failed(e.to_string()));
            }
        };

        if !output.success {
            let reason = format!("{} exited non-zero", self.invocation.display());
            debug!("probe {}: {reason}", self.name);
            return ProbeResult::absent(&self.name, index, ProbeStatus::Failed(reason));
        }

        match catch_unwind(AssertUnwindSafe(|| (self.parser)(&output.output))) {
            Ok(Some(value)) => ProbeResult {
                name: self.name.clone(),
                index,
                value: Some(value),
                status: ProbeStatus::Found,
            },
            Ok(None) => ProbeResult::absent(&self.name, index, ProbeStatus::Empty),
            Err(_) => {
                debug!("probe {}: parser panicked", self.name);
                ProbeResult::absent(
                    &self.name,
                    index,
                    ProbeStatus::Failed("output could not be parsed".to_string()),
                )
            }
        }
    }
}

impl<T> fmt::Debug for Probe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Probe")
            .field("name", &self.name)
            .field("invocation", &self.invocation)
            .finish_non_exhaustive()
    }
}

/// Why a probe did or did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// Ran and parsed a value
    Found,
    /// Ran successfully but reported nothing
    Empty,
    /// Program not present on this host
    NotInstalled,
    /// Non-zero exit, timeout, spawn error or unparsable output
    Failed(String),
}

/// Outcome of one probe, tagged with its submission index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult<T> {
    pub name: String,
    pub index: usize,
    /// Always `None` unless `status` is [`ProbeStatus::Found`]
    pub value: Option<T>,
    pub status: ProbeStatus,
}

impl<T> ProbeResult<T> {
    pub fn absent(name: &str, index: usize, status: ProbeStatus) -> Self {
        Self {
            name: name.to_string(),
            index,
            value: None,
            status,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == ProbeStatus::Found
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }
}

/// Common output parsers.
pub mod parse {
    /// Number of non-blank lines; `None` when there are none.
    pub fn line_count(output: &str) -> Option<usize> {
        let count = output.lines().filter(|l| !l.trim().is_empty()).count();
        (count > 0).then_some(count)
    }

    /// First non-blank line, trimmed.
    pub fn first_line(output: &str) -> Option<String> {
        output
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
    }

    /// First whitespace-separated token that looks like a dotted version.
    ///
    /// Quotes and a leading `v` or `go` are stripped, so `go1.22.5` and
    /// `"1.8.0_392"` both count.
    pub fn version(output: &str) -> Option<String> {
        output
            .split_whitespace()
            .filter_map(version_token)
            .next()
            .map(str::to_string)
    }

    fn version_token(tok: &str) -> Option<&str> {
        let tok = tok.trim_matches(|c: char| c == '"' || c == '\'');
        let tok = tok
            .strip_prefix("go")
            .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
            .unwrap_or(tok);
        let tok = tok
            .trim_start_matches('v')
            .trim_end_matches(|c: char| !c.is_ascii_alphanumeric());

        let looks_like_version = tok.contains('.')
            && tok.starts_with(|c: char| c.is_ascii_digit())
            && tok
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
        looks_like_version.then_some(tok)
    }

    /// Whole output trimmed; `None` when blank.
    pub fn trimmed(output: &str) -> Option<String> {
        let t = output.trim();
        (!t.is_empty()).then(|| t.to_string())
    }
}

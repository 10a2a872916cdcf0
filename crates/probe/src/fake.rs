//! Scripted [`Shell`] for tests in this and downstream crates.

use crate::error::{Error, Result};
use crate::shell::{CommandOutput, Invocation, Shell};
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

#[derive(Debug)]
struct Rule {
    prefix: String,
    reply: Reply,
    delay: Option<Duration>,
}

#[derive(Debug, Clone)]
enum Reply {
    Output(CommandOutput),
    Timeout,
}

/// A shell whose programs and replies are declared up front.
///
/// Rules match on the rendered command line prefix; the first matching
/// rule wins. Registering a rule also marks its program as installed.
#[derive(Debug, Default)]
pub struct ScriptedShell {
    installed: Mutex<BTreeSet<String>>,
    rules: Vec<Rule>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a program as present on PATH.
    pub fn installed(self, program: &str) -> Self {
        lock(&self.installed).insert(program.to_string());
        self
    }

    pub fn respond(self, prefix: &str, output: CommandOutput) -> Self {
        self.rule(prefix, Reply::Output(output), None)
    }

    /// Reply only after sleeping, to force a completion order.
    pub fn respond_after(self, prefix: &str, output: CommandOutput, delay: Duration) -> Self {
        self.rule(prefix, Reply::Output(output), Some(delay))
    }

    pub fn time_out(self, prefix: &str) -> Self {
        self.rule(prefix, Reply::Timeout, None)
    }

    fn rule(mut self, prefix: &str, reply: Reply, delay: Option<Duration>) -> Self {
        if let Some(program) = prefix.split_whitespace().next() {
            lock(&self.installed).insert(program.to_string());
        }
        self.rules.push(Rule {
            prefix: prefix.to_string(),
            reply,
            delay,
        });
        self
    }

    /// Make a program appear or disappear mid-test.
    pub fn set_installed(&self, program: &str, present: bool) {
        let mut installed = lock(&self.installed);
        if present {
            installed.insert(program.to_string());
        } else {
            installed.remove(program);
        }
    }

    /// Every command line run so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Command lines starting with `prefix`.
    pub fn calls_to(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }
}

impl Shell for ScriptedShell {
    fn which(&self, program: &str) -> bool {
        lock(&self.installed).contains(program)
    }

    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let line = invocation.display();
        lock(&self.calls).push(line.clone());

        if !self.which(&invocation.program) {
            return Err(Error::NotFound {
                program: invocation.program.clone(),
            });
        }

        let Some(rule) = self.rules.iter().find(|r| line.starts_with(&r.prefix)) else {
            return Ok(CommandOutput::failure(format!("unscripted: {line}")));
        };

        if let Some(delay) = rule.delay {
            thread::sleep(delay);
        }

        match &rule.reply {
            Reply::Output(output) => Ok(output.clone()),
            Reply::Timeout => Err(Error::Timeout {
                command: line,
                timeout: invocation.timeout.unwrap_or(Duration::from_secs(1)),
            }),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

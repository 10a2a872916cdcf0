//! `status`, `apply` and `reset`
//!
//! - `status` - validate every group and report what is missing
//! - `apply` - install whatever fails validation
//! - `reset` - uninstall whatever passes validation
//!
//! Every group runs even when an earlier one fails; the command exits
//! non-zero afterwards if any group reported an error.

use anyhow::{Result, anyhow, bail};
use colored::Colorize;
use declarative::{ItemContext, Operation, Reconciler, Reconciliation, resolve};
use probe::SystemShell;

use crate::Context;
use crate::cli::{ChangeArgs, GroupArgs};
use crate::config;
use crate::provider::WorkstationProvider;
use crate::schema::SetupConfig;
use crate::ui;

pub fn status(ctx: &Context, args: GroupArgs) -> Result<()> {
    let reconciler = load(ctx, &args.groups)?;
    let shell = SystemShell::default();

    let result = reconciler.status(&ItemContext::new(&shell));
    finish(ctx, &result)
}

pub fn apply(ctx: &Context, args: ChangeArgs) -> Result<()> {
    let reconciler = load(ctx, &args.groups)?;
    let shell = SystemShell::default();

    if !args.dry_run && !args.yes {
        let preview = reconciler.status(&ItemContext::new(&shell));
        if preview.is_success() {
            ui::success("Everything is already in place");
            return Ok(());
        }
        println!();
        ui::info(&format!(
            "{} to install",
            ui::plural(preview.summary.unsatisfied, "item")
        ));
        if !confirm("Continue?", true)? {
            ui::info("Cancelled");
            return Ok(());
        }
    }

    let result = reconciler.apply(&item_context(&shell, args.dry_run));
    finish(ctx, &result)
}

pub fn reset(ctx: &Context, args: ChangeArgs) -> Result<()> {
    let reconciler = load(ctx, &args.groups)?;
    let shell = SystemShell::default();

    if !args.dry_run && !args.yes {
        let names: Vec<&str> = reconciler.groups().iter().map(|g| g.name()).collect();
        ui::warn(&format!("This removes everything managed by: {}", names.join(", ")));
        if !confirm("Continue?", false)? {
            ui::info("Cancelled");
            return Ok(());
        }
    }

    let result = reconciler.reset(&item_context(&shell, args.dry_run));
    finish(ctx, &result)
}

fn item_context(shell: &SystemShell, dry_run: bool) -> ItemContext<'_> {
    if dry_run {
        ItemContext::dry_run(shell)
    } else {
        ItemContext::new(shell)
    }
}

fn load(ctx: &Context, groups: &[String]) -> Result<Reconciler> {
    let (path, config) = config::load(ctx.config.as_deref())?;
    log::debug!("using config {}", path.display());

    let platform = ctx
        .platform
        .clone()
        .unwrap_or_else(|| std::env::consts::OS.to_string());
    plan(config.setup, &platform, groups)
}

/// Resolve the platform's groups and apply the group filter
///
/// An unsupported platform is fatal: nothing is reconciled.
pub fn plan(setup: SetupConfig, platform: &str, groups: &[String]) -> Result<Reconciler> {
    let provider = WorkstationProvider::new(setup);
    let Some(all) = resolve(&provider, platform) else {
        bail!("no configuration provider for platform '{platform}'");
    };
    Ok(Reconciler::new(all).select(groups)?)
}

fn confirm(prompt: &str, default: bool) -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?;

    Ok(confirmed)
}

fn finish(ctx: &Context, result: &Reconciliation) -> Result<()> {
    ui::header(title(result.operation));
    ui::report(&result.report);

    let s = &result.summary;
    if !ctx.quiet {
        println!();
        match result.operation {
            Operation::Validate => println!(
                "  {} satisfied, {} missing",
                s.satisfied.to_string().green(),
                s.unsatisfied.to_string().yellow()
            ),
            Operation::Install | Operation::Uninstall => {
                println!(
                    "  {} changed, {} unchanged, {} need action, {} skipped, {} failed",
                    s.changed.to_string().green(),
                    s.unchanged,
                    s.instructions.to_string().yellow(),
                    s.skipped.to_string().dimmed(),
                    s.failed.to_string().red()
                );
            }
        }
    }

    if result.is_success() {
        return Ok(());
    }

    println!();
    for err in &result.errors {
        ui::error(&err.to_string());
    }
    Err(anyhow!(
        "{} reported errors",
        ui::plural(result.errors.len(), "group")
    ))
}

fn title(operation: Operation) -> &'static str {
    match operation {
        Operation::Validate => "Status",
        Operation::Install => "Apply",
        Operation::Uninstall => "Reset",
    }
}

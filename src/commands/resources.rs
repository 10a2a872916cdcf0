//! `resources` - AWS resource counts per profile and region

use anyhow::{Context as _, Result, bail};
use colored::Colorize;
use probe::{RegionReport, ResourceCount, Shell, SystemShell, count_resources, populated};
use std::time::Duration;

use crate::Context;
use crate::cli::ResourcesArgs;
use crate::config;
use crate::inventory::AwsPages;
use crate::progress;
use crate::ui;

/// Bounded wait for one page of the tagging API
const PAGE_TIMEOUT: Duration = Duration::from_secs(60);

pub fn run(ctx: &Context, args: ResourcesArgs) -> Result<()> {
    let (_, config) = config::load(ctx.config.as_deref())?;
    let shell = SystemShell::new(PAGE_TIMEOUT);
    if !shell.which("aws") {
        bail!("aws CLI not found on PATH");
    }
    let pages = AwsPages::new(&shell, PAGE_TIMEOUT);

    let profiles = if !args.profiles.is_empty() {
        args.profiles
    } else if !config.resources.profiles.is_empty() {
        config.resources.profiles
    } else {
        pages.profiles().context("Could not list AWS profiles")?
    };
    let regions = if args.regions.is_empty() {
        config.resources.regions
    } else {
        args.regions
    };

    if profiles.is_empty() || regions.is_empty() {
        ui::warn("No AWS profiles or regions to scan");
        return Ok(());
    }

    let pb = progress::spinner(
        &format!(
            "Counting resources in {} × {}",
            ui::plural(profiles.len(), "profile"),
            ui::plural(regions.len(), "region")
        ),
        ctx.quiet,
    );
    let reports = count_resources(&pages, &profiles, &regions);
    progress::finish_clear(&pb);

    let reports = if args.all { reports } else { populated(reports) };

    ui::header("AWS resources");
    if reports.is_empty() {
        ui::info("No resources found");
        return Ok(());
    }

    let mut current_profile: Option<&str> = None;
    for report in &reports {
        if current_profile != Some(report.scope.profile.as_str()) {
            ui::section(&report.scope.profile);
            current_profile = Some(report.scope.profile.as_str());
        }
        ui::kv(&report.scope.region, &report.total().to_string().bold().to_string());
        for (kind, count) in &report.counts {
            ui::dim(&format!("  {kind}: {count}"));
        }
    }

    let totals = totals_by_type(&reports);
    ui::section("Totals");
    for (kind, count) in &totals {
        ui::kv(kind, &count.to_string());
    }

    Ok(())
}

/// Sum counts per resource type across every scope
fn totals_by_type(reports: &[RegionReport]) -> ResourceCount {
    reports
        .iter()
        .flat_map(|r| r.counts.iter())
        .fold(ResourceCount::new(), |mut acc, (kind, count)| {
            *acc.entry(kind.clone()).or_default() += count;
            acc
        })
}

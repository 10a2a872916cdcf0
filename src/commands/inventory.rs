//! `inventory` - what package managers, cloud CLIs and tools this host has

use anyhow::Result;
use probe::{ProbeResult, ProbeStatus, Shell, SystemShell, Tally, run_all};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::Context;
use crate::cli::InventoryArgs;
use crate::config;
use crate::inventory::{cloud_probes, package_manager_probes, tool_probes};
use crate::progress;
use crate::ui;

/// Everything the probes found, keyed by probe name
#[derive(Debug, Default, Serialize)]
struct Inventory {
    package_managers: BTreeMap<String, usize>,
    cloud: BTreeMap<String, String>,
    tools: BTreeMap<String, String>,
    /// Cloud CLIs with an active account
    connected: usize,
}

impl Inventory {
    fn from_results(
        packages: &[ProbeResult<usize>],
        clouds: &[ProbeResult<String>],
        tools: &[ProbeResult<String>],
    ) -> Self {
        Self {
            package_managers: found(packages),
            cloud: found(clouds),
            tools: found(tools),
            connected: Tally::of(clouds).found,
        }
    }
}

fn found<T: Clone>(results: &[ProbeResult<T>]) -> BTreeMap<String, T> {
    results
        .iter()
        .filter_map(|r| r.value.clone().map(|v| (r.name.clone(), v)))
        .collect()
}

pub fn run(ctx: &Context, args: InventoryArgs) -> Result<()> {
    let (_, config) = config::load(ctx.config.as_deref())?;
    let timeout = Duration::from_secs(args.timeout.unwrap_or(config.inventory.timeout_secs));
    let shell: Arc<dyn Shell> = Arc::new(SystemShell::new(timeout));

    // Start every fan-out before waiting on any of them
    let packages = run_all(package_manager_probes(timeout), Arc::clone(&shell));
    let clouds = run_all(cloud_probes(timeout), Arc::clone(&shell));
    let tools = run_all(tool_probes(timeout), shell);

    let total = packages.len() + clouds.len() + tools.len();
    let pb = progress::spinner(&format!("Running {total} probes"), ctx.quiet || args.json);
    let packages = packages.collect();
    let clouds = clouds.collect();
    let tools = tools.collect();
    progress::finish_clear(&pb);

    let inventory = Inventory::from_results(&packages, &clouds, &tools);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&inventory)?);
        return Ok(());
    }

    ui::header("Inventory");

    ui::section("Package managers");
    for result in &packages {
        match &result.value {
            Some(count) => ui::kv(&result.name, &ui::plural(*count, "package")),
            None => print_absent(ctx, result),
        }
    }

    ui::section("Cloud accounts");
    for result in &clouds {
        match &result.value {
            Some(account) => ui::kv(&result.name, account),
            None => print_absent(ctx, result),
        }
    }
    ui::dim(&format!("{} of {} connected", inventory.connected, clouds.len()));

    ui::section("Tools");
    for result in &tools {
        match &result.value {
            Some(version) => ui::kv(&result.name, version),
            None => print_absent(ctx, result),
        }
    }

    Ok(())
}

fn print_absent<T>(ctx: &Context, result: &ProbeResult<T>) {
    if ctx.verbose == 0 {
        return;
    }
    let reason = match &result.status {
        ProbeStatus::Failed(reason) => reason.as_str(),
        ProbeStatus::Empty => "no result",
        ProbeStatus::NotInstalled => "not installed",
        ProbeStatus::Found => return,
    };
    ui::dim(&format!("{}: {reason}", result.name));
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe::CommandOutput;
    use probe::fake::ScriptedShell;

    #[test]
    fn test_inventory_keeps_only_found_values() {
        let shell: Arc<dyn Shell> = Arc::new(
            ScriptedShell::new()
                .respond("brew list --formula", CommandOutput::success("git\njq\nripgrep\n"))
                .respond("brew list --cask", CommandOutput::success(""))
                .respond("aws sts", CommandOutput::success("123456789012"))
                .respond("gcloud config", CommandOutput::failure("ERROR: not logged in"))
                .respond("git --version", CommandOutput::success("git version 2.45.1")),
        );
        let timeout = Duration::from_secs(1);

        let packages = run_all(package_manager_probes(timeout), Arc::clone(&shell)).collect();
        let clouds = run_all(cloud_probes(timeout), Arc::clone(&shell)).collect();
        let tools = run_all(tool_probes(timeout), shell).collect();
        let inventory = Inventory::from_results(&packages, &clouds, &tools);

        assert_eq!(inventory.package_managers.len(), 1);
        assert_eq!(inventory.package_managers["brew"], 3);
        assert_eq!(inventory.cloud["aws"], "123456789012");
        assert!(!inventory.cloud.contains_key("gcloud"));
        assert_eq!(inventory.connected, 1);
        assert_eq!(inventory.tools["git"], "2.45.1");
    }

    #[test]
    fn test_inventory_serializes() {
        let inventory = Inventory {
            connected: 2,
            ..Inventory::default()
        };
        let json = serde_json::to_value(&inventory).unwrap();
        assert_eq!(json["connected"], 2);
        assert!(json["package_managers"].as_object().unwrap().is_empty());
    }
}

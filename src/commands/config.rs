use anyhow::Result;
use colored::Colorize;
use declarative::{Platform, Provider};

use crate::Context;
use crate::cli::ConfigCommand;
use crate::config;
use crate::provider::WorkstationProvider;
use crate::ui;

pub fn run(ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Path => path(ctx),
        ConfigCommand::Validate => validate(ctx),
    }
}

fn show(ctx: &Context) -> Result<()> {
    let (path, config) = config::load(ctx.config.as_deref())?;
    if !path.exists() {
        ui::dim(&format!("# {} not found; showing defaults", path.display()));
    }
    print!("{}", config.to_toml()?);
    Ok(())
}

fn path(ctx: &Context) -> Result<()> {
    println!("{}", config::config_path(ctx.config.as_deref())?.display());
    Ok(())
}

fn validate(ctx: &Context) -> Result<()> {
    let (path, config) = config::load(ctx.config.as_deref())?;

    ui::header("Configuration");
    ui::kv("File", &path.display().to_string());
    if !path.exists() {
        ui::kv("Status", "not found, using defaults");
    }

    let current = Platform::current();
    let provider = WorkstationProvider::new(config.setup);
    for platform in Platform::ALL {
        let title = if Some(platform) == current {
            format!("{platform} (this host)")
        } else {
            platform.to_string()
        };
        ui::section(&title);

        for group in provider.groups(platform) {
            let count = ui::plural(group.len(), "item");
            if group.is_empty() {
                ui::kv(group.name(), &count.red().to_string());
            } else {
                ui::kv(group.name(), &count);
            }
        }
    }

    println!();
    ui::success("Config is valid");
    Ok(())
}

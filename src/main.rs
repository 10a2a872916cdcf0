mod cli;
mod commands;
mod config;
mod inventory;
mod items;
mod progress;
mod provider;
mod schema;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Platform identifier override
    pub platform: Option<String>,
    /// Config file override
    pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        platform: cli.platform,
        config: cli.config,
    };

    match cli.command {
        Command::Status(args) => commands::reconcile::status(&ctx, args),
        Command::Apply(args) => commands::reconcile::apply(&ctx, args),
        Command::Reset(args) => commands::reconcile::reset(&ctx, args),
        Command::Inventory(args) => commands::inventory::run(&ctx, args),
        Command::Resources(args) => commands::resources::run(&ctx, args),
        Command::Config(cmd) => commands::config::run(&ctx, cmd),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "hearth", &mut io::stdout());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_release_profile_unwinds() {
        let manifest: toml::Table = toml::from_str(include_str!("../Cargo.toml")).unwrap();
        let panic = manifest["profile"]["release"]
            .get("panic")
            .and_then(toml::Value::as_str);
        assert_ne!(panic, Some("abort"), "parser panics are only caught when unwinding");
    }
}

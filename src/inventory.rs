//! Probe sets for `hearth inventory` and the AWS page source for `hearth resources`

use anyhow::{Context, Result};
use probe::{Invocation, Page, PageSource, Probe, Scope, Shell, parse};
use serde::Deserialize;
use std::time::Duration;

fn command_probe<T, F>(name: &str, program: &str, args: &[&str], timeout: Duration, parser: F) -> Probe<T>
where
    F: Fn(&str) -> Option<T> + Send + Sync + 'static,
{
    Probe::new(
        name,
        Invocation::new(program, args.iter().copied()).with_timeout(timeout),
        parser,
    )
}

/// Installed-package count per package manager
pub fn package_manager_probes(timeout: Duration) -> Vec<Probe<usize>> {
    let t = timeout;
    vec![
        command_probe("brew", "brew", &["list", "--formula", "-1"], t, parse::line_count),
        command_probe("brew casks", "brew", &["list", "--cask", "-1"], t, parse::line_count),
        command_probe("apt", "apt-mark", &["showmanual"], t, parse::line_count),
        command_probe("dnf", "dnf", &["repoquery", "--userinstalled", "-q"], t, parse::line_count),
        command_probe("pacman", "pacman", &["-Qe"], t, parse::line_count),
        command_probe("snap", "snap", &["list"], t, header_table_count),
        command_probe("flatpak", "flatpak", &["list", "--app"], t, parse::line_count),
        command_probe("winget", "winget", &["list", "--disable-interactivity"], t, winget_count),
        command_probe("scoop", "scoop", &["list"], t, header_table_count),
        command_probe("npm", "npm", &["ls", "-g", "--depth=0", "--parseable"], t, npm_count),
        command_probe("pip", "pip3", &["list", "--format=freeze"], t, parse::line_count),
        command_probe("cargo", "cargo", &["install", "--list"], t, cargo_count),
    ]
}

/// Active account or context per cloud CLI
pub fn cloud_probes(timeout: Duration) -> Vec<Probe<String>> {
    let account = |name: &str, program: &str, args: &[&str]| {
        command_probe(name, program, args, timeout, parse::first_line)
    };

    vec![
        account(
            "aws",
            "aws",
            &["sts", "get-caller-identity", "--query", "Account", "--output", "text"],
        ),
        account("gcloud", "gcloud", &["config", "get-value", "account"]),
        account(
            "azure",
            "az",
            &["account", "show", "--query", "name", "--output", "tsv"],
        ),
        account("kubernetes", "kubectl", &["config", "current-context"]),
        account("github", "gh", &["api", "user", "--jq", ".login"]),
        account("docker", "docker", &["context", "show"]),
    ]
}

/// Version per development tool
pub fn tool_probes(timeout: Duration) -> Vec<Probe<String>> {
    let version = |name: &str, args: &[&str]| command_probe(name, name, args, timeout, parse::version);

    vec![
        version("git", &["--version"]),
        version("node", &["--version"]),
        version("python3", &["--version"]),
        version("go", &["version"]),
        version("rustc", &["--version"]),
        // Prints to stderr; the shell merges both streams
        version("java", &["-version"]),
        version("docker", &["--version"]),
        version("terraform", &["-version"]),
    ]
}

/// Tables with a single header row
fn header_table_count(output: &str) -> Option<usize> {
    parse::line_count(output)
        .map(|n| n.saturating_sub(1))
        .filter(|n| *n > 0)
}

/// `npm ls --parseable` prints the global prefix first
fn npm_count(output: &str) -> Option<usize> {
    header_table_count(output)
}

/// Package lines are unindented; their binaries follow indented
fn cargo_count(output: &str) -> Option<usize> {
    let count = output
        .lines()
        .filter(|l| !l.is_empty() && !l.starts_with(char::is_whitespace))
        .count();
    (count > 0).then_some(count)
}

/// Rows after the `----` separator
fn winget_count(output: &str) -> Option<usize> {
    let count = output
        .lines()
        .skip_while(|l| !l.trim_start().starts_with("---"))
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .count();
    (count > 0).then_some(count)
}

// ============================================================================
// AWS resources
// ============================================================================

/// Page size requested from the tagging API
const PAGE_SIZE: &str = "100";

/// Pages of ARNs from the AWS Resource Groups Tagging API via the aws CLI
pub struct AwsPages<'a> {
    shell: &'a dyn Shell,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetResourcesOutput {
    #[serde(default)]
    resource_tag_mapping_list: Vec<ResourceTagMapping>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResourceTagMapping {
    #[serde(rename = "ResourceARN")]
    resource_arn: String,
}

impl<'a> AwsPages<'a> {
    pub fn new(shell: &'a dyn Shell, timeout: Duration) -> Self {
        Self { shell, timeout }
    }

    fn invocation(scope: &Scope, cursor: Option<&str>) -> Invocation {
        let mut args = vec![
            "resourcegroupstaggingapi",
            "get-resources",
            "--profile",
            scope.profile.as_str(),
            "--region",
            scope.region.as_str(),
            "--output",
            "json",
            "--max-items",
            PAGE_SIZE,
        ];
        if let Some(token) = cursor {
            args.extend(["--starting-token", token]);
        }
        Invocation::new("aws", args)
    }

    /// Profiles from `aws configure list-profiles`
    pub fn profiles(&self) -> Result<Vec<String>> {
        let output = self
            .shell
            .run_checked(&Invocation::new("aws", ["configure", "list-profiles"]))?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}

impl PageSource for AwsPages<'_> {
    fn fetch(&self, scope: &Scope, cursor: Option<&str>) -> Result<Page> {
        let invocation = Self::invocation(scope, cursor).with_timeout(self.timeout);
        let output = self.shell.run_checked(&invocation)?;
        parse_page(&output).with_context(|| {
            format!(
                "Unexpected get-resources output for {}/{}",
                scope.profile, scope.region
            )
        })
    }
}

fn parse_page(json: &str) -> Result<Page> {
    let parsed: GetResourcesOutput = serde_json::from_str(json)?;
    Ok(Page {
        resources: parsed
            .resource_tag_mapping_list
            .into_iter()
            .map(|m| m.resource_arn)
            .collect(),
        next: parsed.next_token,
    })
}

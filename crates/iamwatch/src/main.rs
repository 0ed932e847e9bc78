//! iamwatch: AWS IAM user watcher
//!
//! Runs one collection cycle over the configured accounts and prints the
//! resulting change items and recorded exceptions.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use iamwatch::aws::{AwsIamConnector, classify_anyhow_error};
use iamwatch::config::{self, OutputFormat, SlurpConfig};
use iamwatch::watcher::{IamUserWatcher, SlurpOutput, Watcher, WatcherBase};
use iamwatch_common::{AccountRegistry, IamUserItem};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "iamwatch")]
#[command(about = "Collect AWS IAM user configuration across accounts")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Arguments for the slurp command (extracted to reduce enum size)
#[derive(clap::Args, Debug)]
struct SlurpArgs {
    /// JSON file describing the watchable accounts
    #[arg(long, env = "IAMWATCH_ACCOUNTS_FILE")]
    accounts_file: PathBuf,

    /// Comma-separated account names to watch (default: all active accounts)
    #[arg(long)]
    accounts: Option<String>,

    /// IAM user name prefix to ignore (repeatable)
    #[arg(long = "ignore", value_name = "PREFIX")]
    ignore: Vec<String>,

    /// JSON file mapping technology index to ignored name prefixes
    #[arg(long, env = "IAMWATCH_IGNORE_FILE")]
    ignore_file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Also write the JSON document to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Check via STS that each account's credentials belong to that account
    #[arg(long)]
    verify_account: bool,
}

impl From<SlurpArgs> for SlurpConfig {
    fn from(args: SlurpArgs) -> Self {
        Self {
            accounts_file: args.accounts_file,
            accounts: args.accounts.as_deref().map(config::parse_account_list),
            ignore: args.ignore,
            ignore_file: args.ignore_file,
            format: args.format,
            output: args.output,
            verify_account: args.verify_account,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one collection cycle of IAM users
    Slurp(Box<SlurpArgs>),

    /// Validate and list the configured accounts
    Accounts {
        /// JSON file describing the watchable accounts
        #[arg(long, env = "IAMWATCH_ACCOUNTS_FILE")]
        accounts_file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Report a fatal error with its causes and, for AWS failures, a hint
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let _ = std::io::stderr().lock().write_all(render_error(e).as_bytes());
}

fn render_error(e: &anyhow::Error) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let mut chain = e.chain();

    if let Some(top) = chain.next() {
        let _ = writeln!(out, "\n\x1b[1;31mError:\x1b[0m {top}");
    }
    for cause in chain {
        let _ = writeln!(out, "  \x1b[33mCaused by:\x1b[0m {cause}");
    }

    if let Some(hint) = classify_anyhow_error(e).suggestion() {
        let _ = writeln!(out, "\n\x1b[36mHint:\x1b[0m {hint}");
    }

    if e.backtrace().status() == std::backtrace::BacktraceStatus::Captured {
        let _ = writeln!(out, "\n\x1b[2mBacktrace:\x1b[0m\n{}", e.backtrace());
    }

    out
}

async fn run() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
                .add_directive("aws_config=warn".parse()?)
                .add_directive("aws_sdk_iam=warn".parse()?)
                .add_directive("aws_sdk_sts=warn".parse()?)
                .add_directive("aws_smithy_runtime=warn".parse()?),
        )
        .init();

    match args.command {
        Command::Slurp(slurp_args) => {
            let config: SlurpConfig = (*slurp_args).into();
            handle_slurp(config).await?;
        }
        Command::Accounts { accounts_file } => {
            let registry = AccountRegistry::load(&accounts_file).with_context(|| {
                format!("Failed to load accounts from {}", accounts_file.display())
            })?;
            print_accounts(&registry);
        }
    }

    Ok(())
}

/// Handle the slurp command
async fn handle_slurp(config: SlurpConfig) -> Result<()> {
    let accounts = config.load_accounts()?;
    let ignore = config.load_ignore_registry()?;

    info!(
        accounts_file = %config.accounts_file.display(),
        selection = ?config.accounts,
        verify_account = config.verify_account,
        "Starting slurp"
    );

    let base = WatcherBase::new(accounts, config.accounts.clone(), ignore);
    let connector = AwsIamConnector {
        verify_account: config.verify_account,
    };
    let mut watcher = IamUserWatcher::new(base, connector);
    let output = watcher.slurp().await;

    if let Some(path) = &config.output {
        let json = serde_json::to_string_pretty(&output)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write output to {}", path.display()))?;
        info!(path = %path.display(), "Wrote slurp output");
    }

    match config.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Table => print_table(&output),
    }

    Ok(())
}

fn print_table(output: &SlurpOutput<IamUserItem>) {
    if output.items.is_empty() {
        println!("No IAM users collected.");
    } else {
        println!("{:<20} {:<30} {:<60}", "ACCOUNT", "NAME", "ARN");
        println!("{}", "-".repeat(110));
        for item in &output.items {
            println!(
                "{:<20} {:<30} {:<60}",
                truncate(&item.account, 19),
                truncate(&item.name, 29),
                item.arn
            );
        }
        println!("\nTotal: {} users", output.items.len());
    }

    if !output.exceptions.is_empty() {
        println!("\n=== Exceptions ===");
        for record in output.exceptions.iter() {
            println!(
                "{:<45} {:<15} {}",
                record.key.to_string(),
                format!("{:?}", record.kind),
                record.message
            );
        }
        println!("\nTotal: {} exceptions", output.exceptions.len());
    }
}

fn print_accounts(registry: &AccountRegistry) {
    println!(
        "{:<20} {:<14} {:<8} {:<20} {}",
        "NAME", "NUMBER", "ACTIVE", "PROFILE", "REGIONS"
    );
    println!("{}", "-".repeat(80));
    for account in registry.iter() {
        println!(
            "{:<20} {:<14} {:<8} {:<20} {}",
            truncate(&account.name, 19),
            account.number,
            if account.active { "yes" } else { "no" },
            account.profile.as_deref().unwrap_or("-"),
            account.regions.join(",")
        );
    }
    println!("\nTotal: {} accounts", registry.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iamwatch::aws::classify_aws_error;

    #[test]
    fn test_render_error_lists_causes_and_hint() {
        let err = anyhow::Error::new(classify_aws_error(
            Some("ExpiredToken"),
            Some("The security token included in the request is expired"),
        ))
        .context("ListUsers failed")
        .context("Verifying account prod");

        let rendered = render_error(&err);

        assert!(rendered.contains("Error:\x1b[0m Verifying account prod"));
        assert!(rendered.contains("Caused by:\x1b[0m ListUsers failed"));
        assert!(rendered.contains("Refresh the profile's credentials"));
    }

    #[test]
    fn test_render_error_without_aws_cause_has_no_hint() {
        let err = anyhow::anyhow!("accounts file is empty").context("Failed to load accounts");

        let rendered = render_error(&err);

        assert!(rendered.contains("Caused by:\x1b[0m accounts file is empty"));
        assert!(!rendered.contains("Hint:"));
    }
}

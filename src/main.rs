mod common;
mod provision;
mod ui;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use sudo::RunningAs;

use crate::common::config::ProvisionConfig;
use crate::common::paths;
use crate::provision::batch::parse_batch;
use crate::provision::system::SystemBackend;
use crate::ui::prelude::*;

/// Create local user accounts in bulk from BATCH_USER_CREATION
#[derive(Parser, Debug)]
#[command(name = "batch-users", author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Accounts to create, as `user1[:pass1];user2[:pass2];...`
    #[arg(
        long,
        env = "BATCH_USER_CREATION",
        hide_env_values = true,
        global = true
    )]
    users: Option<String>,

    /// Configuration file (defaults to /etc/batch-users/config.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print the commands instead of running them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    output: OutputFormat,

    /// Disable coloured output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Provision the accounts (default)
    Run,
    /// Parse the batch value and list its entries without touching the system
    Parse,
    /// Print the effective configuration as TOML
    PrintConfig,
}

fn main() {
    let cli = Cli::parse();

    ui::configure(ui::Renderer {
        format: cli.output,
        color: !cli.no_color,
        debug: cli.debug,
    });

    let config_path = cli.config.clone().unwrap_or_else(paths::default_config_path);
    let config = match ProvisionConfig::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            emit(
                Level::Error,
                "config.invalid",
                &format!("Error loading configuration: {:#}", err),
                None,
            );
            std::process::exit(1);
        }
    };
    emit(
        Level::Debug,
        "config.loaded",
        &format!("Using configuration from {}", config_path.display()),
        None,
    );

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let dry_run = resolve_dry_run(cli.dry_run);
            warn_if_unprivileged(dry_run);
            let backend = SystemBackend::new(dry_run);
            provision::run(cli.users.as_deref(), &backend, &config);
        }
        Commands::Parse => print_entries(cli.users.as_deref()),
        Commands::PrintConfig => match config.to_toml() {
            Ok(text) => print!("{}", text),
            Err(err) => {
                emit(Level::Error, "config.serialize", &format!("{:#}", err), None);
                std::process::exit(1);
            }
        },
    }
}

fn resolve_dry_run(requested: bool) -> bool {
    if Path::new(paths::FORCE_DRY_RUN_PATH).exists() {
        if !requested {
            emit(
                Level::Warn,
                "batch.forced_dry_run",
                &format!(
                    "Notice: {} exists, forcing dry-run mode.",
                    paths::FORCE_DRY_RUN_PATH
                ),
                None,
            );
        }
        return true;
    }
    requested
}

fn warn_if_unprivileged(dry_run: bool) {
    if dry_run {
        emit(
            Level::Info,
            "batch.dry_run",
            "*** DRY RUN MODE ENABLED - No changes will be made ***",
            None,
        );
        return;
    }

    if matches!(sudo::check(), RunningAs::User) {
        emit(
            Level::Warn,
            "batch.unprivileged",
            "Not running as root, account creation will likely fail",
            None,
        );
    }
}

fn print_entries(batch: Option<&str>) {
    let entries = batch.map(parse_batch).unwrap_or_default();
    if entries.is_empty() {
        emit(Level::Info, "parse.empty", "No entries", None);
        return;
    }

    for entry in entries {
        match entry.spec {
            Ok(spec) => {
                let password = if spec.has_password() {
                    "********"
                } else {
                    "(username)"
                };
                emit(
                    Level::Info,
                    "parse.entry",
                    &format!("{}: {} password={}", entry.position, spec.username, password),
                    Some(serde_json::json!({
                        "position": entry.position,
                        "username": spec.username,
                        "password_given": spec.has_password(),
                    })),
                );
            }
            Err(err) => emit(
                Level::Warn,
                "parse.undefined",
                &format!("{}: {}", entry.position, err),
                Some(serde_json::json!({ "position": entry.position })),
            ),
        }
    }
}

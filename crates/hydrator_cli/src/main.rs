//! CLI probe for `hydrator_core`.
//!
//! # Responsibility
//! - Print the linked core version.
//! - Validate a hydrator configuration file against the built-in registry.
//!
//! Output is one `key=value` line per hydrator so scripts can grep it.

use clap::{Parser, Subcommand};
use hydrator_core::{
    default_log_level, init_logging, HydratorFactory, HydratorsConfig, ServiceRegistry,
};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "hydrator_cli", version, about = "Entity hydrator probe.")]
struct Cli {
    /// Absolute directory for rolling log files; logging stays off when unset.
    #[arg(long, env = "HYDRATOR_LOG_DIR", global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build every hydrator in a JSON config and report each result.
    Check {
        /// Path to the hydrators configuration document.
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Some(log_dir) = cli.log_dir.as_deref() {
        if let Err(err) = init_logging(default_log_level(), log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    match cli.cmd {
        None => {
            println!("hydrator_core version={}", hydrator_core::core_version());
            ExitCode::SUCCESS
        }
        Some(Command::Check { config }) => check(&config),
    }
}

fn check(path: &Path) -> ExitCode {
    let config = match HydratorsConfig::from_path(path) {
        Ok(config) => config,
        Err(err) => {
            error!("event=config_check module=cli status=error reason=load");
            println!("config={} status=error reason={err}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let registry = ServiceRegistry::with_builtins();
    let factory = HydratorFactory::new(&config, &registry);
    let mut failures = 0usize;
    for name in config.hydrator_names() {
        match factory.build(name) {
            Ok(_) => println!("hydrator={name} status=ok"),
            Err(err) => {
                failures += 1;
                println!("hydrator={name} status=error reason={err}");
            }
        }
    }

    info!(
        "event=config_check module=cli status={} hydrators={} failures={}",
        if failures == 0 { "ok" } else { "error" },
        config.hydrators.len(),
        failures
    );
    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Watchtower - community analysis and moderation signals for crypto chats.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod bridge;
mod serve;
mod shutdown;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use watchtower_config::{ConfigError, WatchtowerConfig};

/// Watchtower - community analysis and moderation signals for crypto chats.
#[derive(Parser, Debug)]
#[command(name = "watchtower", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard hierarchy.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every service until SIGINT or SIGTERM.
    Serve,
    /// Load and validate the configuration, then exit.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<WatchtowerConfig, Vec<ConfigError>> {
    match path {
        Some(path) => watchtower_config::load_and_validate_path(path),
        None => watchtower_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            watchtower_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Some(Commands::Serve) => match serve::run_serve(config).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("watchtower: {e}");
                ExitCode::FAILURE
            }
        },
        Some(Commands::CheckConfig) => {
            println!(
                "watchtower: config ok (service.name={}, hub={}:{}, completion={})",
                config.service.name,
                config.hub.host,
                config.hub.port,
                if config.completion.enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            ExitCode::SUCCESS
        }
        None => {
            println!("watchtower: use --help for available commands");
            ExitCode::SUCCESS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["watchtower", "--config", "w.toml", "check-config"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
        assert_eq!(cli.config, Some(PathBuf::from("w.toml")));

        let cli = Cli::try_parse_from(["watchtower", "serve"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve)));
        assert!(Cli::try_parse_from(["watchtower", "launch"]).is_err());
    }

    #[test]
    fn bad_config_file_reports_errors() {
        let dir = std::env::temp_dir().join(format!("watchtower-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("watchtower.toml");
        std::fs::write(&path, "[behavior]\nalert_treshold = 7\n").unwrap();
        let errors = load(Some(&path)).unwrap_err();
        assert!(!errors.is_empty());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}

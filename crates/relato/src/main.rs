// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relato - a Telegram-driven activity logger.
//!
//! This is the binary entry point for the Relato service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use clap::{Parser, Subcommand};

/// Relato - log activities from a Telegram chat, with photos.
#[derive(Parser, Debug)]
#[command(name = "relato", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Relato service (Telegram bot plus optional dashboard).
    Serve,
    /// Print the resolved configuration and exit.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match relato_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            relato_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            match toml::to_string_pretty(&config) {
                Ok(rendered) => println!("{rendered}"),
                Err(e) => {
                    eprintln!("error: failed to render config: {e}");
                    std::process::exit(1);
                }
            }
        }
        None => {
            println!("relato: use --help for available commands");
        }
    }
}

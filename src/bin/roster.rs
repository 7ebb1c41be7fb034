//! Roster CLI Binary
//!
//! Command-line interface for the agent module registry.

use anyhow::Context;
use clap::Parser;
use roster::logging::{init_logging, LoggingConfig};
use roster::tooling::cli::{Cli, CliContext};
use std::process;

fn main() {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::default();
    if let Some(level) = &cli.log_level {
        logging.level = level.clone();
    }
    if let Err(e) = init_logging(Some(&logging)) {
        eprintln!("Error initializing logging: {}", e);
        process::exit(1);
    }

    let context = match CliContext::new(cli.root.clone(), cli.config.clone())
        .context("failed to open registry")
    {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            print!("{}", ensure_newline(output.text));
            if !output.success {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn ensure_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

//! addonsync command-line tool
//!
//! Usage:
//!   addonsync inspect <packs-dir> [--json]
//!   addonsync check <archive> [--json]
//!   addonsync new <archive> --name <name> [--script <entry>]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "addonsync")]
#[command(about = "Inspect addon packages and their entity property schemas")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a packs directory as a server would and report the result
    Inspect {
        /// Directory holding addons.toml and the archives it lists
        packs_dir: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load a single archive and report its contents or the load error
    Check {
        file: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a skeleton .mcpack with a generated manifest
    New {
        file: PathBuf,

        /// Pack name written to the manifest header
        #[arg(long)]
        name: String,

        /// Declare a javascript module with this entry path
        #[arg(long)]
        script: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "starting");
    match args.command {
        Command::Inspect { packs_dir, json } => {
            let report = addonsync_cli::inspect(&packs_dir).await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to encode report")?
                );
            } else {
                print!("{report}");
            }
        }
        Command::Check { file, json } => {
            let summary = addonsync_cli::check(&file)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&summary).context("Failed to encode summary")?
                );
            } else {
                print!("{summary}");
            }
        }
        Command::New { file, name, script } => {
            let id = addonsync_cli::scaffold(&file, &name, script.as_deref())?;
            info!(%id, path = %file.display(), "package written");
            println!("{id}");
        }
    }
    Ok(())
}

//! rhythmcli - rhythmic descriptors for drum pattern files
//!
//! Subcommands:
//! - `rhythmcli describe <FILES>...` - Print one descriptor record per pattern
//! - `rhythmcli bands <FILES>...` - Show the low/mid/high onset streams
//! - `rhythmcli names` - List the descriptor names
//! - `rhythmcli config` - Show the effective configuration and its sources

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use rhythm_descriptors::Windowing;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod input;
mod library;
mod midi;

use input::LoadOptions;

#[derive(Parser)]
#[command(name = "rhythmcli")]
#[command(about = "Rhythmic descriptors for symbolic drum patterns")]
#[command(version)]
struct Cli {
    /// Config file, replacing ./rhythmcli.toml
    #[arg(long, global = true, env = "RHYTHMCLI_CONFIG")]
    config: Option<PathBuf>,

    /// Log more on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Steps per beat of JSON pattern lists (resampled to 4)
    #[arg(long, default_value = "4")]
    resolution: u32,

    /// Steps each pattern of a .txt library is forced to
    #[arg(long, default_value = "16")]
    length: usize,
}

impl InputArgs {
    fn options(&self) -> LoadOptions {
        LoadOptions {
            resolution: self.resolution,
            length: self.length,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compute descriptors for every pattern in the given files
    Describe {
        /// Pattern files (.json, .txt, .mid, .midi)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        input: InputArgs,

        /// Windowing for patterns longer than one bar (exact, tumbling, sliding)
        #[arg(short, long)]
        windowing: Option<Windowing>,

        /// Treat input as non-percussive: skip band descriptors
        #[arg(long)]
        no_drums: bool,

        /// Print one pretty JSON array instead of JSON lines
        #[arg(long)]
        pretty: bool,
    },

    /// Show the low/mid/high onset streams of every pattern
    Bands {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        input: InputArgs,

        /// Also list each onset step with its band, kit-voice and simplified-kit codes
        #[arg(long)]
        codes: bool,
    },

    /// List the descriptor names in record order
    Names,

    /// Show the effective configuration as TOML
    Config,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (mut config, sources) = config::load_with_sources(cli.config.as_deref())?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Describe {
            files,
            input,
            windowing,
            no_drums,
            pretty,
        } => {
            if let Some(windowing) = windowing {
                config.windowing = windowing;
            }
            if no_drums {
                config.drums = false;
            }
            commands::describe(&mut out, config, &files, &input.options(), pretty)?;
        }
        Commands::Bands {
            files,
            input,
            codes,
        } => {
            commands::bands(&mut out, config, &files, &input.options(), codes)?;
        }
        Commands::Names => {
            commands::names(&mut out)?;
        }
        Commands::Config => {
            commands::show_config(&mut out, &config, &sources)?;
        }
    }

    Ok(())
}

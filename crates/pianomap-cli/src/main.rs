//! pianomap - SFZ pianos to per-key JSON sample maps

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use pianomap_cli::{config::Config, config::InstrumentEntry, output::to_json, run_batch};
use pianomap_sfz::parse_instrument;

#[derive(Parser)]
#[command(name = "pianomap")]
#[command(author, version, about = "Map SFZ piano instruments to per-key JSON sample lists", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every configured instrument to `<output-dir>/<name>.json`
    Build {
        /// Config file path (default: ~/.config/pianomap/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory the JSON documents are written to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Base directory for relative instrument paths
        #[arg(short, long)]
        root_dir: Option<PathBuf>,

        /// Additional instrument as NAME=PATH (repeatable)
        #[arg(short, long = "instrument", value_name = "NAME=PATH")]
        instruments: Vec<InstrumentEntry>,
    },
    /// Print the JSON document of a single SFZ file
    Inspect {
        /// Root SFZ file
        file: PathBuf,

        /// Instrument name (default: the file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Profile name (default: the instrument name)
        #[arg(short, long)]
        profile: Option<String>,
    },
    /// Create a default configuration file
    Init,
    /// Show the configuration file path
    ConfigPath,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            config,
            output_dir,
            root_dir,
            instruments,
        } => build(config, output_dir, root_dir, instruments),
        Commands::Inspect {
            file,
            name,
            profile,
        } => inspect(file, name, profile),
        Commands::Init => {
            let path = Config::create_default_config_file()?;
            println!("Created default config at: {}", path.display());
            Ok(())
        }
        Commands::ConfigPath => {
            let path = Config::config_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn build(
    config_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    root_dir: Option<PathBuf>,
    instruments: Vec<InstrumentEntry>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => Config::load_from(&path)?,
        None => Config::load_or_default(),
    };

    // Apply CLI overrides
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    if root_dir.is_some() {
        config.root_dir = root_dir;
    }
    config.instruments.extend(instruments);

    if config.instruments.is_empty() {
        log::warn!("No instruments configured; add [[instruments]] to the config or pass -i NAME=PATH");
        return Ok(());
    }

    let report = run_batch(&config);
    log::info!(
        "Done: {} converted, {} failed",
        report.succeeded(),
        report.failed()
    );
    if !report.is_success() {
        bail!(
            "{} of {} instruments failed",
            report.failed(),
            report.instruments.len()
        );
    }
    Ok(())
}

fn inspect(file: PathBuf, name: Option<String>, profile: Option<String>) -> Result<()> {
    let name = name
        .or_else(|| file.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "instrument".to_string());
    let entry = InstrumentEntry {
        name,
        sfz: file,
        profile,
    };

    let config = Config::load_or_default();
    let document = parse_instrument(&entry.name, &entry.sfz, &config.profile_for(&entry))?;
    print!("{}", to_json(&document)?);
    Ok(())
}

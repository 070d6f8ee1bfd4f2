mod commands;
mod logging;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use photoindex_core::catalog::Catalog;
use photoindex_core::config::IndexerConfig;

/// photoindex: photo indexing and reconciliation engine
#[derive(Parser)]
#[command(name = "photoindex", version, about)]
struct Cli {
    /// Path to the catalog database
    #[arg(long, default_value_t = default_catalog_path())]
    catalog: String,

    /// Indexer settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every photo below an originals directory
    Index {
        /// Originals directory
        root: PathBuf,
    },
    /// Index only the group of files related to one photo
    Related {
        /// Originals directory
        root: PathBuf,
        /// Any photo file of the group
        file: PathBuf,
    },
    /// Show catalog status summary
    Status,
    /// List indexed photos with their files and tags
    Ls,
}

fn default_catalog_path() -> String {
    dirs_path().to_string_lossy().to_string()
}

fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".photoindex").join("catalog.db")
}

fn load_config(path: Option<&Path>) -> Result<IndexerConfig> {
    let Some(path) = path else {
        return Ok(IndexerConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    let config: IndexerConfig = toml::from_str(&content)
        .with_context(|| format!("cannot parse config file {}", path.display()))?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init();

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!("Opening catalog {}", cli.catalog);
    let catalog = Catalog::open(Path::new(&cli.catalog))?;

    match cli.command {
        Commands::Index { root } => commands::index::run(catalog, &root, config)?,
        Commands::Related { root, file } => {
            commands::index::related(catalog, &root, &file, config)?
        }
        Commands::Status => commands::status::run(&catalog)?,
        Commands::Ls => commands::ls::run(&catalog)?,
    }

    Ok(())
}

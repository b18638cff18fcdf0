pub mod backfill;
pub mod buckets;
pub mod list;
pub mod migrate;
pub mod resolve;
pub mod serve;
pub mod sign;

use crate::{Config, Database};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bmedia")]
#[command(version)]
#[command(about = "Barangay media library storage tools", long_about = None)]
pub struct Cli {
    #[arg(short, long, default_value = "bmedia.toml", env = "BMEDIA_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the media API
    Serve {
        #[arg(short = 'H', long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Apply database migrations
    Migrate {
        #[command(subcommand)]
        command: Option<MigrateCommand>,
    },
    /// Show which bucket and path a stored reference resolves to
    Resolve {
        reference: String,
        /// Known bucket names; defaults to the provider's bucket list
        #[arg(short, long = "bucket")]
        buckets: Vec<String>,
    },
    /// Load the media library as the UI would
    List {
        /// List one user's files
        #[arg(long, conflicts_with = "admin")]
        user: Option<String>,
        /// List every file, scanning storage when the table is empty
        #[arg(long)]
        admin: bool,
        #[arg(long)]
        json: bool,
    },
    /// Print a signed URL for a stored reference
    Sign {
        reference: String,
        /// Use the short download lifetime instead of the preview one
        #[arg(long)]
        download: bool,
    },
    /// Persist resolved bucket/path pairs for rows that lack them
    Backfill {
        #[arg(long)]
        dry_run: bool,
    },
    /// List storage buckets
    Buckets,
}

#[derive(Subcommand)]
pub enum MigrateCommand {
    Status,
}

pub(crate) fn open(config_path: &Path) -> Result<(Config, Database)> {
    let config = Config::load(config_path)?;
    let db = Database::open(&config.database.path, config.database.pool_size)?;
    db.migrate()?;
    Ok((config, db))
}

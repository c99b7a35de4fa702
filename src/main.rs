mod catalog_import;
mod config;
mod database;
mod entities;
mod logging;
mod ports;
mod services;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};

use crate::{
    catalog_import::{CatalogImportService, ImportOptions},
    config::Config,
    database::Database,
    logging::setup_logging,
    services::media_storage::FsAssetStore,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "ANIME_CATALOG_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// SQLite database file, overrides the config
    #[arg(long, env = "ANIME_CATALOG_DATABASE", global = true)]
    database: Option<PathBuf>,

    /// Console log level (default: off)
    #[arg(long, default_value = "off", global = true, env = "LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// File log level (default: debug)
    #[arg(long, default_value = "debug", global = true)]
    log_file_level: log::LevelFilter,

    /// Path to log file
    #[arg(long, env = "ANIME_CATALOG_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn is_file(s: &str) -> Result<PathBuf, String> {
    let p: PathBuf = s.into();
    if p.is_file() {
        Ok(p)
    } else {
        Err(format!("`{}` is not an existing file", s))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a series with its seasons, episodes and genres from a CSV file
    Import {
        /// CSV with columns title,description,season,episode,episode_title,content[,genre]
        #[arg(value_parser = is_file)]
        csv_path: PathBuf,

        /// Series image file
        #[arg(long)]
        image: Option<PathBuf>,

        /// Update existing episode titles/contents and the series description
        #[arg(long)]
        update: bool,
    },
    /// Print a stored series with its seasons and episodes
    Show {
        /// Exact series title
        title: String,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_logging(args.log_level, args.log_file.clone(), args.log_file_level)?;

    log::debug!("Anime catalog starting");

    if let Commands::Config(config_commands) = &args.command {
        match config_commands {
            ConfigCommands::CreateDefault => {
                log::debug!("Creating default config");
                let path = Config::create_default()?;
                println!("{}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        }
        return Ok(());
    }

    log::debug!("Loading configuration");
    let config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .with_context(|| "Failed to load anime-catalog config")?;

    let database_path = args.database.unwrap_or_else(|| config.database_path());
    let database = Arc::new(Database::open(&database_path).await?);

    match args.command {
        Commands::Import {
            csv_path,
            image,
            update,
        } => {
            log::debug!("Starting import command for: {}", csv_path.display());
            let service =
                CatalogImportService::new(database, FsAssetStore::new(config.media_root()));
            let summary = service
                .import(&ImportOptions {
                    csv_path: csv_path.clone(),
                    image_path: image,
                    update,
                })
                .await
                .wrap_err_with(|| format!("Failed to import {}", csv_path.display()))?;
            log::info!(
                "Series {} (new: {}), genres: [{}], photo: {}",
                summary.series_id,
                summary.series_created,
                summary.genres.join(", "),
                summary.photo.as_deref().unwrap_or("none")
            );
            println!("{}", summary);
        }
        Commands::Show { title } => match database.series_catalog(&title).await? {
            Some(catalog) => {
                log::debug!("{} episodes stored", catalog.episode_count());
                print!("{}", catalog);
            }
            None => {
                return Err(color_eyre::eyre::eyre!("No series titled {:?}", title));
            }
        },
        Commands::Config(_) => {}
    }

    Ok(())
}

//! Bulk import of one series (seasons, episodes, genres) from a tabular file.
//!
//! The whole import runs in a single transaction: either every row lands or
//! nothing does.

pub mod error;
pub mod genres;
pub mod reader;
pub mod upsert;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sea_orm::{DatabaseTransaction, TransactionTrait};

use crate::database::Database;
use crate::ports::asset_store::{AssetStore, StoredAsset};

pub use error::ImportError;
use error::db_err;
use reader::CatalogTable;
use upsert::EpisodeRow;

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub csv_path: PathBuf,
    /// Series photo; ignored when the file does not exist.
    pub image_path: Option<PathBuf>,
    /// Rewrite changed fields of rows that already exist.
    pub update: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub series_id: i64,
    pub series_created: bool,
    /// Episodes inserted by this run
    pub created: usize,
    /// Pre-existing episodes rewritten by this run, always 0 without `update`
    pub updated: usize,
    pub update_mode: bool,
    /// Genre names the series was linked to, empty when links were left alone
    pub genres: Vec<String>,
    pub photo: Option<String>,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "완료: 생성 {}개", self.created)?;
        if self.update_mode {
            write!(f, ", 업데이트 {}개", self.updated)?;
        }
        Ok(())
    }
}

pub struct CatalogImportService<S: AssetStore> {
    db: Arc<Database>,
    assets: S,
}

impl<S: AssetStore> CatalogImportService<S> {
    pub fn new(db: Arc<Database>, assets: S) -> Self {
        Self { db, assets }
    }

    pub async fn import(&self, options: &ImportOptions) -> Result<ImportSummary, ImportError> {
        let started = Instant::now();
        log::info!(
            "Importing {} (update: {})",
            options.csv_path.display(),
            options.update
        );

        let table = reader::read_catalog_file(&options.csv_path)?;
        log::debug!(
            "Read {} rows ({})",
            table.rows.len(),
            table.encoding.label()
        );

        let txn = self
            .db
            .conn
            .begin()
            .await
            .map_err(db_err("begin transaction"))?;

        let mut stored_photo = None;
        let result = match self
            .import_rows(&txn, &table, options, &mut stored_photo)
            .await
        {
            Ok(summary) => txn
                .commit()
                .await
                .map(|_| summary)
                .map_err(db_err("commit transaction")),
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    log::warn!("Rollback failed: {}", rollback_err);
                }
                Err(err)
            }
        };

        match &result {
            Ok(summary) => {
                let elapsed = Duration::from_millis(started.elapsed().as_millis() as u64);
                log::info!(
                    "Import of {} finished in {}: {}",
                    options.csv_path.display(),
                    humantime::format_duration(elapsed),
                    summary
                );
            }
            Err(err) => {
                log::error!("Import of {} failed: {}", options.csv_path.display(), err);
                if let Some(photo) = stored_photo {
                    self.discard_photo(photo).await;
                }
            }
        }

        result
    }

    /// Everything that must be undone together lives here.
    async fn import_rows(
        &self,
        txn: &DatabaseTransaction,
        table: &CatalogTable,
        options: &ImportOptions,
        stored_photo: &mut Option<StoredAsset>,
    ) -> Result<ImportSummary, ImportError> {
        // Series identity comes from the first row only
        let first = table.rows.first().ok_or_else(|| ImportError::EmptyInput {
            path: options.csv_path.display().to_string(),
        })?;
        let title = first.value("title").trim();
        let description = first.value("description").trim();

        let genre_names = genres::collect_genres(table);

        let (mut series, series_created) =
            upsert::get_or_create_series(txn, title, description).await?;
        if !series_created && options.update {
            series = upsert::update_series_description(txn, series, description).await?;
        }

        let linked = genres::reconcile_genres(txn, series.id, &genre_names).await?;

        if let Some(image_path) = &options.image_path {
            if image_path.exists() {
                let file_name = image_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let stored = self
                    .assets
                    .save(&file_name, image_path)
                    .await
                    .map_err(|e| ImportError::Asset {
                        path: image_path.display().to_string(),
                        reason: e.to_string(),
                    })?;
                let reference = stored.reference.clone();
                *stored_photo = Some(stored).filter(|s| s.newly_written);
                series = upsert::set_series_photo(txn, series, &reference).await?;
                log::info!("Series photo set to: {}", reference);
            } else {
                log::warn!(
                    "Image {} does not exist, leaving series photo unchanged",
                    image_path.display()
                );
            }
        }

        let mut created = 0;
        let mut updated = 0;
        for (index, row) in table.rows.iter().enumerate() {
            let row = EpisodeRow::parse(index + 1, row)?;

            let season = upsert::get_or_create_season(txn, series.id, row.season_number).await?;
            let (episode, episode_created) =
                upsert::get_or_create_episode(txn, season.id, &row).await?;

            if episode_created {
                created += 1;
            } else if options.update {
                let (_, changes) = upsert::update_episode(txn, episode, &row).await?;
                if !changes.is_empty() {
                    updated += 1;
                }
            }
        }

        Ok(ImportSummary {
            series_id: series.id,
            series_created,
            created,
            updated,
            update_mode: options.update,
            genres: linked.into_iter().map(|g| g.name).collect(),
            photo: series.photo,
        })
    }

    async fn discard_photo(&self, photo: StoredAsset) {
        match self.assets.remove(&photo.reference).await {
            Ok(()) => log::debug!("Removed orphaned photo: {}", photo.reference),
            Err(err) => log::warn!(
                "Failed to remove orphaned photo {}: {}",
                photo.reference,
                err
            ),
        }
    }
}

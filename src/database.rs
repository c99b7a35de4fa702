use std::fmt;
use std::path::Path;
use std::time::Duration;

use color_eyre::{
    Result,
    eyre::{Context, bail},
};
use migration::MigratorTrait;
use sea_orm::{
    ColumnTrait, ConnectOptions, Database as SeaDatabase, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::entities::{episode, genre, season, series, series_genre};

pub struct Database {
    pub conn: DatabaseConnection,
}

/// One series with everything hanging off it, in storage order.
#[derive(Debug, Clone)]
pub struct SeriesCatalog {
    pub series: series::Model,
    pub genres: Vec<String>,
    pub seasons: Vec<SeasonEntry>,
}

#[derive(Debug, Clone)]
pub struct SeasonEntry {
    pub season: season::Model,
    pub episodes: Vec<episode::Model>,
}

impl SeriesCatalog {
    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(|s| s.episodes.len()).sum()
    }
}

impl fmt::Display for SeriesCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = &self.series.title;
        writeln!(f, "{}", title)?;
        if let Some(description) = self.series.description.as_deref()
            && !description.is_empty()
        {
            writeln!(f, "  {}", description)?;
        }
        if !self.genres.is_empty() {
            writeln!(f, "  genres: {}", self.genres.join(", "))?;
        }
        if let Some(photo) = self.series.photo.as_deref() {
            writeln!(f, "  photo: {}", photo)?;
        }
        for entry in &self.seasons {
            writeln!(f, "{}", season_label(title, entry.season.season_number))?;
            for ep in &entry.episodes {
                writeln!(
                    f,
                    "  {} {}",
                    episode_label(title, entry.season.season_number, ep.episode_number),
                    ep.episode_title
                )?;
            }
        }
        Ok(())
    }
}

pub fn season_label(series_title: &str, season_number: i32) -> String {
    format!("{} - Season {}", series_title, season_number)
}

pub fn episode_label(series_title: &str, season_number: i32, episode_number: i32) -> String {
    format!("{} S{}E{}", series_title, season_number, episode_number)
}

impl Database {
    /// Open or create a database at the given path
    pub async fn open(path: &Path) -> Result<Self> {
        log::debug!("Opening database at: {}", path.display());

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).context(format!(
                "Failed to create database directory: {}",
                parent.display()
            ))?;
        }

        let url = format!("sqlite://{}?mode=rwc", path.display());

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(8)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let conn = SeaDatabase::connect(opt)
            .await
            .context(format!("Failed to open database: {}", path.display()))?;

        log::debug!("Running database migrations");
        migration::Migrator::up(&conn, None)
            .await
            .context("Failed to run database migrations")?;

        log::info!("Database ready at: {}", path.display());
        Ok(Database { conn })
    }

    /// Exact title match. Errors when several stored series share the title.
    pub async fn find_series_by_title(&self, title: &str) -> Result<Option<series::Model>> {
        let mut matches = series::Entity::find()
            .filter(series::Column::Title.eq(title))
            .order_by_asc(series::Column::Id)
            .limit(2)
            .all(&self.conn)
            .await
            .context("Failed to query series by title")?;

        if matches.len() > 1 {
            let count = series::Entity::find()
                .filter(series::Column::Title.eq(title))
                .count(&self.conn)
                .await
                .context("Failed to count series by title")?;
            bail!("{} stored series share the title {:?}", count, title);
        }

        Ok(matches.pop())
    }

    pub async fn genre_names_for_series(&self, series_id: i64) -> Result<Vec<String>> {
        let links = series_genre::Entity::find()
            .filter(series_genre::Column::SeriesId.eq(series_id))
            .all(&self.conn)
            .await
            .context("Failed to query series genres")?;

        if links.is_empty() {
            return Ok(Vec::new());
        }

        let genres = genre::Entity::find()
            .filter(genre::Column::Id.is_in(links.iter().map(|l| l.genre_id)))
            .order_by_asc(genre::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to query genres")?;

        Ok(genres.into_iter().map(|g| g.name).collect())
    }

    /// Load a series by title with its genres, seasons and episodes
    pub async fn series_catalog(&self, title: &str) -> Result<Option<SeriesCatalog>> {
        let Some(series) = self.find_series_by_title(title).await? else {
            return Ok(None);
        };

        let genres = self.genre_names_for_series(series.id).await?;

        let seasons = season::Entity::find()
            .filter(season::Column::SeriesId.eq(series.id))
            .order_by_asc(season::Column::SeasonNumber)
            .all(&self.conn)
            .await
            .context("Failed to query seasons")?;

        let episodes = episode::Entity::find()
            .filter(episode::Column::SeasonId.is_in(seasons.iter().map(|s| s.id)))
            .order_by_asc(episode::Column::EpisodeNumber)
            .all(&self.conn)
            .await
            .context("Failed to query episodes")?;

        let seasons = seasons
            .into_iter()
            .map(|season| SeasonEntry {
                episodes: episodes
                    .iter()
                    .filter(|e| e.season_id == season.id)
                    .cloned()
                    .collect(),
                season,
            })
            .collect();

        Ok(Some(SeriesCatalog {
            series,
            genres,
            seasons,
        }))
    }
}

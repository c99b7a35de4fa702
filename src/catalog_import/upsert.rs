use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::error::{ImportError, db_err, insert_or_reread};
use super::reader::TabularRow;
use crate::entities::{episode, season, series};

/// A data row with its numbering parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRow {
    pub season_number: i32,
    pub episode_number: i32,
    /// Trimmed
    pub episode_title: String,
    /// Raw, untrimmed
    pub content: String,
}

fn parse_number(raw: &str) -> Option<i32> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .and_then(|n| i32::try_from(n).ok())
}

impl EpisodeRow {
    /// `row_number` is 1-based and only used for error reporting.
    pub fn parse(row_number: usize, row: &TabularRow) -> Result<Self, ImportError> {
        let invalid = || ImportError::InvalidRow {
            row: row_number,
            raw: row.to_string(),
        };

        let season_number = parse_number(row.value("season")).ok_or_else(invalid)?;
        let episode_number = parse_number(row.value("episode")).ok_or_else(invalid)?;

        Ok(Self {
            season_number,
            episode_number,
            episode_title: row.value("episode_title").trim().to_string(),
            content: row.value("content").to_string(),
        })
    }
}

/// Fields an update actually rewrote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeField {
    Title,
    Content,
}

/// Find the series by exact title, creating it with `description` when absent.
pub async fn get_or_create_series(
    txn: &impl ConnectionTrait,
    title: &str,
    description: &str,
) -> Result<(series::Model, bool), ImportError> {
    let mut matches = series::Entity::find()
        .filter(series::Column::Title.eq(title))
        .order_by_asc(series::Column::Id)
        .limit(2)
        .all(txn)
        .await
        .map_err(db_err("query series"))?;

    if matches.len() > 1 {
        let count = series::Entity::find()
            .filter(series::Column::Title.eq(title))
            .count(txn)
            .await
            .map_err(db_err("count series"))?;
        return Err(ImportError::AmbiguousSeries {
            title: title.to_string(),
            count: count as usize,
        });
    }

    if let Some(existing) = matches.pop() {
        log::debug!("Found existing series '{}' (ID: {})", title, existing.id);
        return Ok((existing, false));
    }

    let created = series::ActiveModel {
        title: Set(title.to_string()),
        description: Set(Some(description.to_string())),
        photo: Set(None),
        ..series::ActiveModel::new()
    }
    .insert(txn)
    .await
    .map_err(db_err("insert series"))?;

    log::info!("Series created: '{}' (ID: {})", title, created.id);
    Ok((created, true))
}

/// Overwrite a pre-existing series' description when it differs.
pub async fn update_series_description(
    txn: &impl ConnectionTrait,
    series: series::Model,
    description: &str,
) -> Result<series::Model, ImportError> {
    if series.description.as_deref() == Some(description) {
        return Ok(series);
    }

    let id = series.id;
    let mut active: series::ActiveModel = series.into();
    active.description = Set(Some(description.to_string()));
    let updated = active
        .update(txn)
        .await
        .map_err(db_err("update series description"))?;

    log::info!("Series description updated (ID: {})", id);
    Ok(updated)
}

pub async fn set_series_photo(
    txn: &impl ConnectionTrait,
    series: series::Model,
    reference: &str,
) -> Result<series::Model, ImportError> {
    let mut active: series::ActiveModel = series.into();
    active.photo = Set(Some(reference.to_string()));
    active
        .update(txn)
        .await
        .map_err(db_err("update series photo"))
}

async fn find_season(
    txn: &impl ConnectionTrait,
    series_id: i64,
    season_number: i32,
) -> Result<Option<season::Model>, ImportError> {
    season::Entity::find()
        .filter(season::Column::SeriesId.eq(series_id))
        .filter(season::Column::SeasonNumber.eq(season_number))
        .one(txn)
        .await
        .map_err(db_err("query season"))
}

pub async fn get_or_create_season(
    txn: &impl ConnectionTrait,
    series_id: i64,
    season_number: i32,
) -> Result<season::Model, ImportError> {
    if let Some(existing) = find_season(txn, series_id, season_number).await? {
        return Ok(existing);
    }

    let model = season::ActiveModel {
        series_id: Set(series_id),
        season_number: Set(season_number),
        ..season::ActiveModel::new()
    };
    let (season, created) = insert_or_reread(model.insert(txn).await, "insert season", || {
        find_season(txn, series_id, season_number)
    })
    .await?;
    if created {
        log::debug!(
            "Season {} created for series {} (ID: {})",
            season_number,
            series_id,
            season.id
        );
    }
    Ok(season)
}

async fn find_episode(
    txn: &impl ConnectionTrait,
    season_id: i64,
    episode_number: i32,
) -> Result<Option<episode::Model>, ImportError> {
    episode::Entity::find()
        .filter(episode::Column::SeasonId.eq(season_id))
        .filter(episode::Column::EpisodeNumber.eq(episode_number))
        .one(txn)
        .await
        .map_err(db_err("query episode"))
}

/// Returns the episode and whether this call created it.
pub async fn get_or_create_episode(
    txn: &impl ConnectionTrait,
    season_id: i64,
    row: &EpisodeRow,
) -> Result<(episode::Model, bool), ImportError> {
    if let Some(existing) = find_episode(txn, season_id, row.episode_number).await? {
        return Ok((existing, false));
    }

    let model = episode::ActiveModel {
        season_id: Set(season_id),
        episode_number: Set(row.episode_number),
        episode_title: Set(row.episode_title.clone()),
        content: Set(Some(row.content.clone())),
        ..episode::ActiveModel::new()
    };
    insert_or_reread(model.insert(txn).await, "insert episode", || {
        find_episode(txn, season_id, row.episode_number)
    })
    .await
}

/// Stored fields that `row` would rewrite.
///
/// A blank title never overwrites; content is compared raw, so an empty
/// cell clears stored content.
pub fn episode_changes(
    stored_title: &str,
    stored_content: Option<&str>,
    row: &EpisodeRow,
) -> Vec<EpisodeField> {
    let mut changes = Vec::new();
    if !row.episode_title.is_empty() && stored_title != row.episode_title {
        changes.push(EpisodeField::Title);
    }
    if stored_content != Some(row.content.as_str()) {
        changes.push(EpisodeField::Content);
    }
    changes
}

/// Apply `row` to a pre-existing episode. No write happens when nothing differs.
pub async fn update_episode(
    txn: &impl ConnectionTrait,
    existing: episode::Model,
    row: &EpisodeRow,
) -> Result<(episode::Model, Vec<EpisodeField>), ImportError> {
    let changes = episode_changes(&existing.episode_title, existing.content.as_deref(), row);
    if changes.is_empty() {
        return Ok((existing, changes));
    }

    let mut active: episode::ActiveModel = existing.into();
    for field in &changes {
        match field {
            EpisodeField::Title => active.episode_title = Set(row.episode_title.clone()),
            EpisodeField::Content => active.content = Set(Some(row.content.clone())),
        }
    }
    let updated = active
        .update(txn)
        .await
        .map_err(db_err("update episode"))?;

    log::debug!(
        "Episode S{}E{} updated: {:?}",
        row.season_number,
        row.episode_number,
        changes
    );
    Ok((updated, changes))
}

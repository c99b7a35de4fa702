use std::collections::BTreeSet;

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    Set,
};

use super::error::{ImportError, db_err, insert_or_reread};
use super::reader::{CatalogTable, GENRE_COLUMN};
use crate::entities::{genre, series_genre};

fn is_genre_separator(c: char) -> bool {
    matches!(c, ',' | ';' | '，')
}

/// Split a multi-value genre cell into trimmed, non-empty names.
pub fn parse_genres(raw: &str) -> Vec<String> {
    raw.split(is_genre_separator)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Union of every row's genres, empty when the column is absent.
pub fn collect_genres(table: &CatalogTable) -> BTreeSet<String> {
    if !table.has_column(GENRE_COLUMN) {
        return BTreeSet::new();
    }
    table
        .rows
        .iter()
        .flat_map(|row| parse_genres(row.value(GENRE_COLUMN)))
        .collect()
}

async fn find_genre(
    txn: &impl ConnectionTrait,
    name: &str,
) -> Result<Option<genre::Model>, ImportError> {
    genre::Entity::find()
        .filter(genre::Column::Name.eq(name))
        .one(txn)
        .await
        .map_err(db_err("query genre"))
}

pub async fn get_or_create_genre(
    txn: &impl ConnectionTrait,
    name: &str,
) -> Result<genre::Model, ImportError> {
    if let Some(existing) = find_genre(txn, name).await? {
        return Ok(existing);
    }

    let model = genre::ActiveModel {
        name: Set(name.to_string()),
        ..genre::ActiveModel::new()
    };
    let (genre, created) =
        insert_or_reread(model.insert(txn).await, "insert genre", || find_genre(txn, name))
            .await?;
    if created {
        log::info!("Genre created: '{}' (ID: {})", name, genre.id);
    }
    Ok(genre)
}

async fn find_link(
    txn: &impl ConnectionTrait,
    series_id: i64,
    genre_id: i64,
) -> Result<Option<series_genre::Model>, ImportError> {
    series_genre::Entity::find()
        .filter(series_genre::Column::SeriesId.eq(series_id))
        .filter(series_genre::Column::GenreId.eq(genre_id))
        .one(txn)
        .await
        .map_err(db_err("query series genre"))
}

async fn link_series_genre(
    txn: &impl ConnectionTrait,
    series_id: i64,
    genre_id: i64,
) -> Result<(), ImportError> {
    if find_link(txn, series_id, genre_id).await?.is_some() {
        return Ok(());
    }

    let model = series_genre::ActiveModel {
        series_id: Set(series_id),
        genre_id: Set(genre_id),
    };
    let inserted = series_genre::Entity::insert(model)
        .exec(txn)
        .await
        .map(|_| ());
    insert_or_reread(inserted, "insert series genre", || async {
        Ok::<_, ImportError>(find_link(txn, series_id, genre_id).await?.map(|_| ()))
    })
    .await?;
    Ok(())
}

/// Replace the series' genre links with exactly `names`.
///
/// An empty set leaves existing links alone.
pub async fn reconcile_genres(
    txn: &impl ConnectionTrait,
    series_id: i64,
    names: &BTreeSet<String>,
) -> Result<Vec<genre::Model>, ImportError> {
    if names.is_empty() {
        log::debug!("No genres in input, keeping existing links");
        return Ok(Vec::new());
    }

    let mut genres = Vec::with_capacity(names.len());
    for name in names {
        genres.push(get_or_create_genre(txn, name).await?);
    }

    let removed = series_genre::Entity::delete_many()
        .filter(series_genre::Column::SeriesId.eq(series_id))
        .exec(txn)
        .await
        .map_err(db_err("delete series genres"))?;
    log::debug!(
        "Removed {} genre links for series {}",
        removed.rows_affected,
        series_id
    );

    for genre in &genres {
        link_series_genre(txn, series_id, genre.id).await?;
    }

    log::info!(
        "Series {} genres set to: {}",
        series_id,
        genres
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(genres)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_import::reader::{TextEncoding, parse_catalog};
    use crate::entities::series;
    use crate::test_utils::test_db;
    use sea_orm::{PaginatorTrait, TransactionTrait};

    #[test]
    fn test_parse_genres_all_separators() {
        assert_eq!(
            parse_genres(" 액션, 코미디;드라마，판타지 ,, ;"),
            vec!["액션", "코미디", "드라마", "판타지"]
        );
        assert!(parse_genres("").is_empty());
        assert!(parse_genres(" , ; ").is_empty());
    }

    #[test]
    fn test_collect_genres_union() {
        let table = parse_catalog(
            "title,description,season,episode,episode_title,content,genre\n\
             A,B,1,1,C,D,\"액션, 코미디\"\n\
             A,B,1,2,C,D,\n\
             A,B,1,3,C,D,코미디;드라마\n",
            TextEncoding::Utf8,
            "genres.csv",
        )
        .unwrap();

        let names: Vec<_> = collect_genres(&table).into_iter().collect();

        assert_eq!(names, vec!["드라마", "액션", "코미디"]);
    }

    #[test]
    fn test_collect_genres_without_column() {
        let table = parse_catalog(
            "title,description,season,episode,episode_title,content\nA,B,1,1,C,D\n",
            TextEncoding::Utf8,
            "no_genre.csv",
        )
        .unwrap();

        assert!(collect_genres(&table).is_empty());
    }

    async fn insert_series(txn: &impl ConnectionTrait, title: &str) -> series::Model {
        series::ActiveModel {
            title: Set(title.into()),
            ..series::ActiveModel::new()
        }
        .insert(txn)
        .await
        .unwrap()
    }

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_reconcile_replaces_links() {
        let db = test_db().await;
        let series = insert_series(&db.conn, "테스트 애니메이션").await;

        reconcile_genres(&db.conn, series.id, &names(&["Action"]))
            .await
            .unwrap();
        reconcile_genres(&db.conn, series.id, &names(&["Comedy"]))
            .await
            .unwrap();

        assert_eq!(
            db.genre_names_for_series(series.id).await.unwrap(),
            vec!["Comedy"]
        );
        // Genres are shared and never deleted
        assert_eq!(genre::Entity::find().count(&db.conn).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reconcile_empty_keeps_links() {
        let db = test_db().await;
        let series = insert_series(&db.conn, "테스트 애니메이션").await;
        reconcile_genres(&db.conn, series.id, &names(&["액션"]))
            .await
            .unwrap();

        let result = reconcile_genres(&db.conn, series.id, &BTreeSet::new())
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(
            db.genre_names_for_series(series.id).await.unwrap(),
            vec!["액션"]
        );
    }

    #[tokio::test]
    async fn test_genres_shared_between_series() {
        let db = test_db().await;
        let txn = db.conn.begin().await.unwrap();
        let first = insert_series(&txn, "첫 번째").await;
        let second = insert_series(&txn, "두 번째").await;

        let a = reconcile_genres(&txn, first.id, &names(&["액션"]))
            .await
            .unwrap();
        let b = reconcile_genres(&txn, second.id, &names(&["액션", "SF"]))
            .await
            .unwrap();
        txn.commit().await.unwrap();

        assert!(b.iter().any(|g| g.id == a[0].id));
        assert_eq!(genre::Entity::find().count(&db.conn).await.unwrap(), 2);
    }
}

use std::future::Future;

use sea_orm::{DbErr, SqlErr};

/// Every failure aborts the whole import and rolls back the transaction.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(
        "Could not decode {path} as any of [{}]. Save the file as UTF-8 or CP949",
        .tried.join(", ")
    )]
    Encoding {
        path: String,
        tried: Vec<&'static str>,
    },

    #[error(
        "Header must contain all of [{}]; missing [{}], found [{}]",
        .required.join(", "),
        .missing.join(", "),
        .found.join(", ")
    )]
    Schema {
        required: Vec<&'static str>,
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("{path} has no data rows")]
    EmptyInput { path: String },

    #[error("Row {row}: season/episode must be integers, got {raw}")]
    InvalidRow { row: usize, raw: String },

    #[error("{count} stored series share the title {title:?}, cannot pick one")]
    AmbiguousSeries { title: String, count: usize },

    #[error("Failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed catalog file {path}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Database error during {operation}")]
    Database {
        operation: &'static str,
        #[source]
        source: DbErr,
    },

    #[error("Failed to store series image {path}: {reason}")]
    Asset { path: String, reason: String },
}

pub(crate) fn db_err(operation: &'static str) -> impl FnOnce(DbErr) -> ImportError {
    move |source| ImportError::Database { operation, source }
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Settle an insert that may have raced another writer.
///
/// A unique violation means the row exists now; `reread` fetches it. The flag
/// is true only when this insert created the row.
pub(crate) async fn insert_or_reread<M, F, Fut>(
    inserted: Result<M, DbErr>,
    operation: &'static str,
    reread: F,
) -> Result<(M, bool), ImportError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<M>, ImportError>>,
{
    match inserted {
        Ok(created) => Ok((created, true)),
        Err(err) if is_unique_violation(&err) => {
            log::debug!("{} hit an existing row, re-reading", operation);
            match reread().await? {
                Some(existing) => Ok((existing, false)),
                None => Err(ImportError::Database {
                    operation,
                    source: err,
                }),
            }
        }
        Err(err) => Err(db_err(operation)(err)),
    }
}

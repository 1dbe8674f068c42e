use thiserror::Error;

/// Errors produced by the model layer.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A lookup by id found no row.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A unique constraint rejected the write.
    #[error("{0} already exists")]
    Duplicate(&'static str),

    #[error("invalid input: {0}")]
    Invalid(String),

    /// The acting user may not perform this operation.
    #[error("{0}")]
    NotAllowed(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("record"),
            err => StoreError::Sqlx(err),
        }
    }
}

impl StoreError {
    /// Maps a unique-constraint violation onto [`StoreError::Duplicate`].
    pub(crate) fn unique(what: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
        move |err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate(what),
            _ => StoreError::from(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

// crates/activity/src/error.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("database error: {0}")]
    Db(#[from] activity_db::DbError),
}

#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("database error: {0}")]
    Db(#[from] activity_db::DbError),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("{scope} {id} not found")]
    NotFound { scope: &'static str, id: String },
    #[error("forbidden")]
    Forbidden,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("database error: {0}")]
    Db(#[from] activity_db::DbError),
    #[error("image store error: {0}")]
    ImageStore(#[from] crate::collaborators::ImageStoreError),
}

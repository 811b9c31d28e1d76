// crates/notifier/src/error.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

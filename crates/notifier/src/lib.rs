//! Chat delivery for operational alerts: a structured `Alert` body
//! rendered to MarkdownV2 and sent through a rate-limited, retrying
//! HTTP client.

mod alert;
mod client;
mod error;
mod markdown;

pub use alert::Alert;
pub use client::{ChatNotifier, Level, Notifier, NotifierConfig};
pub use error::NotifierError;

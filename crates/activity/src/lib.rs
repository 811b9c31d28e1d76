//! Event Recorder, Session Aggregator, Feed Reader, and Heatmap Reader:
//! everything that turns a stream of fine-grained domain events into a
//! paged, permission-filtered activity feed.

pub mod aggregator;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod feed;
pub mod heatmap;
pub mod recorder;

pub use aggregator::{aggregate, AggregateOutcome};
pub use config::FeedConfig;
pub use error::{AggregatorError, FeedError, RecorderError};
pub use feed::{get_element_feed, get_folder_feed, get_project_feed, Page};
pub use heatmap::get_heatmap;
pub use recorder::{record, AGGREGATE_SESSION_JOB};

//! Shared wire and storage types for the activity aggregation engine and
//! its operational monitoring pipeline. Pure data: no I/O, no domain
//! logic (see `activity-core` for that).

mod activity;
mod event;
mod feed;
mod health;

pub use activity::{Activity, DailyCounter, Group, NamedItem, SnippetItem, Summary, WidgetItem};
pub use event::{EventCategory, EventDetail, NewEvent, RawEvent};
pub use feed::{ActivityFeedResponse, ActivityHeatmapItem, ActivityHeatmapResponse, ActivityItem, UserRef};
pub use health::{AlertLevel, HealthSnapshot};

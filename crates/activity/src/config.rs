// crates/activity/src/config.rs
//! Configuration for the Event Recorder and Session Aggregator, grounded
//! in `ActivityFeedConfig` from the source system: which categories are
//! recorded, how wide a session window is, and the per-session event cap.

use activity_core::category::CategoryPolicy;
use activity_types::EventCategory;

/// `session_window`, `max_events_per_session`, `enabled_categories` from
/// the configuration keys table. `max_events_per_session` bounds the
/// claim a single aggregation pass will fold into one `Activity`; beyond
/// it, a session's tail is left for the next job run rather than grown
/// without limit.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub session_window_secs: i64,
    pub max_events_per_session: i64,
    pub category_policy: CategoryPolicy,
}

impl FeedConfig {
    pub fn new(session_window_secs: i64, max_events_per_session: i64, enabled: impl IntoIterator<Item = EventCategory>) -> Self {
        Self {
            session_window_secs,
            max_events_per_session,
            category_policy: CategoryPolicy::new(enabled),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            session_window_secs: 900,
            max_events_per_session: 100,
            category_policy: CategoryPolicy::all_enabled(),
        }
    }
}

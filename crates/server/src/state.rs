// crates/server/src/state.rs
//! Application state shared by every route handler and background
//! worker, grounded in the source repository's `AppState` struct.

use std::sync::Arc;
use std::time::Instant;

use activity_db::Database;
use activity_feed::collaborators::{ActorDirectory, ImageStore, PermissionOracle};
use activity_feed::FeedConfig;
use activity_kv::KvAdapter;
use activity_monitoring::MonitoringConfig;
use activity_notifier::Notifier;

/// Shared application state accessible from all route handlers and the
/// background worker loops in `workers.rs`.
pub struct AppState {
    /// Server start time, for an eventual uptime gauge.
    pub start_time: Instant,
    pub db: Database,
    pub kv: Arc<dyn KvAdapter>,
    pub notifier: Arc<Notifier>,
    pub feed_config: FeedConfig,
    pub monitoring_config: MonitoringConfig,
    pub oracle: Arc<dyn PermissionOracle>,
    pub actor_directory: Arc<dyn ActorDirectory>,
    pub image_store: Arc<dyn ImageStore>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Database,
        kv: Arc<dyn KvAdapter>,
        notifier: Arc<Notifier>,
        feed_config: FeedConfig,
        monitoring_config: MonitoringConfig,
        oracle: Arc<dyn PermissionOracle>,
        actor_directory: Arc<dyn ActorDirectory>,
        image_store: Arc<dyn ImageStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            db,
            kv,
            notifier,
            feed_config,
            monitoring_config,
            oracle,
            actor_directory,
            image_store,
        })
    }
}

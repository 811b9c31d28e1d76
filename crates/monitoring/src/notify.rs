// crates/monitoring/src/notify.rs
//! A thin seam over `Notifier` so task instrumentation, the interceptor,
//! and the health worker can be tested without a real chat endpoint.

use activity_notifier::{Alert, Notifier};
use async_trait::async_trait;

#[async_trait]
pub trait Alerter: Send + Sync {
    async fn alert(&self, alert: Alert) -> bool;
}

#[async_trait]
impl Alerter for Notifier {
    async fn alert(&self, alert: Alert) -> bool {
        self.send_alert(&alert).await
    }
}

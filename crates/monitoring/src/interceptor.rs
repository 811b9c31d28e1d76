// crates/monitoring/src/interceptor.rs
//! C6: the Exception Interceptor, grounded in `monitoring/middleware.py`'s
//! `MonitoringMiddleware.dispatch`. Runs as Axum middleware wrapping every
//! route: times the request, records slow-request stats, and fires a
//! rate-limited alert for error responses the config doesn't ignore.

use std::sync::Arc;
use std::time::Instant;

use activity_kv::KvAdapter;
use activity_types::AlertLevel;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::config::MonitoringConfig;
use crate::keys;
use crate::notify::Alerter;

pub struct InterceptorState {
    pub kv: Arc<dyn KvAdapter>,
    pub alerter: Arc<dyn Alerter>,
    pub config: MonitoringConfig,
}

/// Marks a response as synthesized by the process's panic boundary
/// (the `tower_http::catch_panic` layer wired beneath this middleware in
/// `create_app`), carrying the panic payload so the interceptor can
/// fingerprint it the same way as any other unhandled exception. A
/// handler-returned `>= 500` response never carries this extension.
#[derive(Debug, Clone)]
pub struct RecoveredPanic {
    pub message: String,
}

/// `tower::Layer`-compatible handler function for
/// `axum::middleware::from_fn_with_state`.
pub async fn track_requests(State(state): State<Arc<InterceptorState>>, request: Request<Body>, next: Next) -> Response {
    if !state.config.is_enabled() {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    if !state.config.should_monitor_path(&path) {
        return next.run(request).await;
    }

    let method = request.method().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed();
    let status = response.status();

    if let Err(err) = record_endpoint_stats(&*state.kv, &path).await {
        tracing::warn!(%err, path, "failed to record endpoint stats");
    }

    if elapsed >= state.config.slow_request_threshold {
        if let Err(err) = record_slow_request(&*state.kv, &*state.alerter, &path, &method, elapsed).await {
            tracing::warn!(%err, path, "failed to record slow request");
        }
    }

    // Mirrors the original's HTTPException split: client errors (4xx)
    // never alert. A handler-raised `>= 500` re-raises unchanged after
    // scheduling its alert; a response recovered from a panic is an "any
    // other exception" and gets the synthetic `{detail, error_id}` body.
    if status.as_u16() >= 500 {
        if let Some(panic) = response.extensions().get::<RecoveredPanic>().cloned() {
            return handle_unhandled_exception(&*state.kv, &*state.alerter, &state.config, &path, &method, &panic.message).await;
        }

        let error_class = format!("HTTP{}", status.as_u16());
        if state.config.should_monitor_exception(&error_class) {
            if let Err(err) = alert_server_error(&*state.kv, &*state.alerter, &state.config, &path, &method, status.as_u16()).await {
                tracing::warn!(%err, path, "failed to deliver server error alert");
            }
        }
    }

    response
}

async fn record_endpoint_stats(kv: &dyn KvAdapter, path: &str) -> Result<(), activity_kv::KvError> {
    kv.incr(&keys::endpoint_stats(path), Some(keys::ONE_DAY)).await?;
    Ok(())
}

/// Accumulates a slow-request marker for C9's batch cycle to drain and
/// emits the immediate first-occurrence warning the dedup key guards;
/// repeats within the same hour are left for C9's batch summary.
async fn record_slow_request(kv: &dyn KvAdapter, alerter: &dyn Alerter, path: &str, method: &str, elapsed: std::time::Duration) -> Result<(), activity_kv::KvError> {
    let entry = serde_json::json!({
        "path": path,
        "method": method,
        "elapsed_secs": elapsed.as_secs_f64(),
    });
    kv.lpush(&keys::slow_request_batch(), &entry.to_string()).await?;

    let dedup_key = keys::slow_request_dedup(path);
    let acquired = kv.set_if_absent(&dedup_key, "1", keys::ONE_HOUR).await?;
    if acquired {
        tracing::warn!(path, method, elapsed_secs = elapsed.as_secs_f64(), "slow request detected");
        alerter
            .alert(
                activity_notifier::Alert::new(format!("Slow request: {method} {path}"), format!("took {:.2}s", elapsed.as_secs_f64()), AlertLevel::Warning)
                    .with_detail("method", method)
                    .with_detail("elapsed_secs", format!("{:.2}", elapsed.as_secs_f64())),
            )
            .await;
    }
    Ok(())
}

async fn alert_server_error(
    kv: &dyn KvAdapter,
    alerter: &dyn Alerter,
    config: &MonitoringConfig,
    path: &str,
    method: &str,
    status: u16,
) -> Result<(), activity_kv::KvError> {
    let error_class = format!("HTTP{status}");
    let message = format!("{method} {path} returned {status}");

    if let Err(err) = crate::stats::record_error(kv, chrono::Utc::now().date_naive(), &error_class, path, status).await {
        tracing::warn!(%err, path, "failed to record error stats");
    }

    let fingerprint = crate::rate_limiter::error_fingerprint(path, method, &error_class, &message);
    if crate::rate_limiter::should_alert(kv, &fingerprint, config.rate_limit_window).await? {
        alerter
            .alert(
                activity_notifier::Alert::new(format!("Server error on {path}"), message, AlertLevel::Critical)
                    .with_detail("method", method)
                    .with_detail("status", status.to_string())
                    .with_error(error_class, format!("{method} {path} -> {status}")),
            )
            .await;
    }
    Ok(())
}

/// Step 6 of the exception interceptor: a panic recovered from the
/// `catch_panic` layer beneath this middleware, i.e. "any other
/// exception" in the original. Always records error stats; alerts
/// (rate-limited) unless `Panic` is in the configured ignore list, and
/// always replaces the body with the generic `{detail, error_id}` shape
/// rather than leaking the panic message to the client.
async fn handle_unhandled_exception(
    kv: &dyn KvAdapter,
    alerter: &dyn Alerter,
    config: &MonitoringConfig,
    path: &str,
    method: &str,
    panic_message: &str,
) -> Response {
    let error_class = "Panic";
    let status = StatusCode::INTERNAL_SERVER_ERROR;

    if let Err(err) = crate::stats::record_error(kv, chrono::Utc::now().date_naive(), error_class, path, status.as_u16()).await {
        tracing::warn!(%err, path, "failed to record error stats");
    }

    let fingerprint = crate::rate_limiter::error_fingerprint(path, method, error_class, panic_message);

    if config.should_monitor_exception(error_class) {
        match crate::rate_limiter::should_alert(kv, &fingerprint, config.rate_limit_window).await {
            Ok(true) => {
                alerter
                    .alert(
                        activity_notifier::Alert::new(format!("Unhandled exception on {path}"), panic_message.to_string(), AlertLevel::Critical)
                            .with_detail("method", method)
                            .with_error(error_class, panic_message),
                    )
                    .await;
            }
            Ok(false) => {}
            Err(err) => tracing::warn!(%err, path, "failed to rate-limit panic alert"),
        }
    }

    (status, Json(serde_json::json!({ "detail": "Internal server error", "error_id": fingerprint }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use activity_kv::LocalFallbackKv;
    use axum::body::Body;
    use axum::routing::get;
    use axum::Router;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingAlerter {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Alerter for RecordingAlerter {
        async fn alert(&self, alert: activity_notifier::Alert) -> bool {
            self.sent.lock().unwrap().push(alert.title.clone());
            true
        }
    }

    fn app(state: Arc<InterceptorState>) -> Router {
        Router::new()
            .route("/boom", get(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }))
            .route("/ok", get(|| async { "fine" }))
            .route(
                "/panic",
                get(|| async {
                    let mut response = Response::new(Body::empty());
                    *response.status_mut() = axum::http::StatusCode::INTERNAL_SERVER_ERROR;
                    response.extensions_mut().insert(RecoveredPanic {
                        message: "index out of bounds".to_string(),
                    });
                    response
                }),
            )
            .layer(axum::middleware::from_fn_with_state(state, track_requests))
    }

    #[tokio::test]
    async fn server_error_triggers_an_alert() {
        let alerter = Arc::new(RecordingAlerter::default());
        let state = Arc::new(InterceptorState {
            kv: Arc::new(LocalFallbackKv::new()),
            alerter: alerter.clone(),
            config: MonitoringConfig::default(),
        });

        use tower::ServiceExt;
        let response = app(state)
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(alerter.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn recovered_panic_gets_a_synthetic_body_and_alerts_once() {
        let alerter = Arc::new(RecordingAlerter::default());
        let state = Arc::new(InterceptorState {
            kv: Arc::new(LocalFallbackKv::new()),
            alerter: alerter.clone(),
            config: MonitoringConfig::default(),
        });

        use tower::ServiceExt;
        let response = app(state)
            .oneshot(Request::builder().uri("/panic").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(alerter.sent.lock().unwrap().len(), 1);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["detail"], "Internal server error");
        assert!(json["error_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn healthy_response_never_alerts() {
        let alerter = Arc::new(RecordingAlerter::default());
        let state = Arc::new(InterceptorState {
            kv: Arc::new(LocalFallbackKv::new()),
            alerter: alerter.clone(),
            config: MonitoringConfig::default(),
        });

        use tower::ServiceExt;
        let response = app(state)
            .oneshot(Request::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        assert!(alerter.sent.lock().unwrap().is_empty());
    }
}

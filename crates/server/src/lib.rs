//! The activity aggregation engine's HTTP server: route handlers,
//! process configuration, background worker scheduling, and the Axum
//! app builder the binary and its tests both call into.

pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod workers;

use std::any::Any;
use std::sync::Arc;

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use activity_monitoring::{InterceptorState, RecoveredPanic};
use state::AppState;

/// Builds the full Axum app: a panic-catching layer sits beneath the
/// monitoring interceptor so a handler panic surfaces to it as an
/// ordinary `>= 500` response (carrying a `RecoveredPanic` extension)
/// instead of aborting the connection; `tower-http` supplies
/// tracing/compression/CORS the same way the source repository's own
/// `create_app` does.
pub fn create_app(state: Arc<AppState>) -> Router {
    let interceptor_state = Arc::new(InterceptorState {
        kv: state.kv.clone(),
        alerter: state.notifier.clone(),
        config: state.monitoring_config.clone(),
    });

    routes::api_routes()
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(axum::middleware::from_fn_with_state(interceptor_state, activity_monitoring::track_requests))
        .layer(cors_layer())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

/// Turns a caught panic payload into a plain `500` response carrying a
/// `RecoveredPanic` extension; `track_requests` reads the extension and
/// replaces the body with the fingerprinted `{detail, error_id}` shape.
fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };

    let mut response = Response::builder().status(StatusCode::INTERNAL_SERVER_ERROR).body(Body::empty()).expect("static response is valid");
    response.extensions_mut().insert(RecoveredPanic { message });
    response
}

// crates/server/src/routes/mod.rs
//! API route handlers for the activity server.

pub mod feed;
pub mod health;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Combines every resource's router under `/api`, following the source
/// repository's `nest("/api", ...)` convention.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", feed::router()).nest("/api", health::router())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_routes_builds_without_panicking() {
        let _router = api_routes();
    }
}

//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use homeguard_app::ports::{ActuatorStateStore, AlarmEventStore, SensorReadingStore};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Mounts the JSON API under `/api` next to a plain `/health` check, with a
/// [`TraceLayer`] logging each request at `DEBUG`.
pub fn build<AS, RS, SS>(state: AppState<AS, RS, SS>) -> Router
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn should_return_ok_on_health_check() {
        let app = TestApp::new();

        let (status, body) = app.get("/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn should_return_404_for_unknown_route() {
        let app = TestApp::new();

        let (status, _) = app.get("/api/nope").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_return_405_for_wrong_method() {
        let app = TestApp::new();

        let (status, _) = app.post_empty("/api/state").await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}

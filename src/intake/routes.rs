//! Read-only REST endpoints for health and profile inspection.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::store::ProfileStore;

/// Shared state for the status routes.
#[derive(Clone)]
pub struct StatusRouteState {
    pub store: Arc<dyn ProfileStore>,
}

/// GET /health
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// GET /api/profiles/{identity}
///
/// Returns the stored profile, or 404 if the identity has never written in.
/// Does not create a record.
async fn get_profile(
    State(state): State<StatusRouteState>,
    Path(identity): Path<String>,
) -> impl IntoResponse {
    match state.store.find(&identity).await {
        Ok(Some(profile)) => Json(profile).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "No profile for this identity"})),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(identity = %identity, "Profile lookup failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Profile lookup failed"})),
            )
                .into_response()
        }
    }
}

/// Build the status REST routes.
pub fn status_routes(state: StatusRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/profiles/{identity}", get(get_profile))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::intake::model::ChildIdentity;
    use crate::store::LibSqlBackend;

    async fn app() -> (Router, Arc<dyn ProfileStore>) {
        let store: Arc<dyn ProfileStore> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let router = status_routes(StatusRouteState {
            store: Arc::clone(&store),
        });
        (router, store)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (router, _) = app().await;
        let (status, body) = get_json(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_profile_is_404_and_not_created() {
        let (router, store) = app().await;
        let (status, body) = get_json(router, "/api/profiles/nobody").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
        assert!(store.find("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn existing_profile_is_returned() {
        let (router, store) = app().await;
        store.get_or_create("42").await.unwrap();
        store
            .set_child_identity(
                "42",
                &ChildIdentity {
                    name: "Maria".into(),
                    age: 3,
                },
            )
            .await
            .unwrap();

        let (status, body) = get_json(router, "/api/profiles/42").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["identity"], "42");
        assert_eq!(body["child_name"], "Maria");
        assert_eq!(body["child_age"], 3);
        assert_eq!(body["phase"], "awaiting_accepted_foods");
        assert_eq!(body["status"], "trial");
        assert_eq!(body["trial_usage_count"], 0);
    }
}

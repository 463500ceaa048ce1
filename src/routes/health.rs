use axum::{extract::State, routing::get, Json, Router};

use crate::models::{AppState, HealthResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage = &state.config.storage;

    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        storage: storage.provider.to_string(),
        bucket: storage.bucket.clone(),
        permanent_urls: storage.use_permanent_urls,
    })
}

#[cfg(test)]
mod tests {
    use crate::models::HealthResponse;
    use crate::routes::test_support::{read_json, test_app};
    use crate::storage::MemoryStorage;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_storage_mode() {
        let app = test_app(MemoryStorage::new("relay-test"), true);

        let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let health: HealthResponse = read_json(response).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.storage, "memory");
        assert_eq!(health.bucket, "relay-test");
        assert!(health.permanent_urls);
    }
}

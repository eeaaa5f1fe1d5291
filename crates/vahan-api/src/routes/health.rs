//! 헬스 체크 핸들러.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 헬스 체크 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// 서비스 상태 ("ok")
    pub status: String,
    /// API 버전
    pub version: String,
    /// 업타임 (초)
    pub uptime_secs: i64,
}

/// 준비 상태 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReadyResponse {
    /// 서비스 상태 ("ready")
    pub status: String,
    /// 데이터베이스 연결 상태
    pub database: String,
}

/// 생존 확인.
///
/// GET /health
#[utoipa::path(get, path = "/health", responses((status = 200, body = HealthResponse)))]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
        uptime_secs: (chrono::Utc::now() - state.started_at).num_seconds(),
    })
}

/// 준비 상태 확인 (DB ping 포함).
///
/// GET /health/ready
#[utoipa::path(get, path = "/health/ready", responses(
    (status = 200, body = ReadyResponse),
    (status = 503, body = ApiErrorResponse),
))]
pub async fn ready(State(state): State<Arc<AppState>>) -> ApiResult<Json<ReadyResponse>> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(state.store.pool())
        .await
        .map_err(|e| {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiErrorResponse::new("DB_UNAVAILABLE", e.to_string())),
            )
        })?;

    Ok(Json(ReadyResponse {
        status: "ready".to_string(),
        database: "ok".to_string(),
    }))
}

/// 헬스 체크 라우터.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health))
        .route("/ready", get(ready))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_test_state;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_endpoint() {
        let state = Arc::new(create_test_state().await);
        let app = Router::new().nest("/health", health_router()).with_state(state);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "ok");
        assert!(!health.version.is_empty());
    }

    #[tokio::test]
    async fn test_ready_endpoint() {
        let state = Arc::new(create_test_state().await);
        let app = Router::new().nest("/health", health_router()).with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}

//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness, DB ping)
//! - `/api/v1/registrations` - 필터 조회 (누적 Till date 블록 분리)
//! - `/api/v1/analytics/growth` - 그룹별 YoY/QoQ 성장률
//! - `/api/v1/analytics/summary` - 투자자 요약 (CAGR, 변동성, 상위 기간 등)
//! - `/api/v1/analytics/pivot` - 피벗(교차) 집계

pub mod analytics;
pub mod health;
pub mod registrations;

pub use analytics::{
    analytics_router, GrowthResponse, GrowthRowResponse, PivotRequest, PivotResponse,
    SummaryResponse,
};
pub use health::{health_router, HealthResponse, ReadyResponse};
pub use registrations::{registrations_router, RecordResponse, RegistrationsResponse};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 모든 서브 라우터를 조합하여 하나의 라우터로 반환합니다.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/v1/registrations", registrations_router())
        .nest("/api/v1/analytics", analytics_router())
}

//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiErrorResponse;
use crate::routes::analytics::{
    BestGroupResponse, GroupShareResponse, GrowthResponse, GrowthRowResponse, PeriodSlotResponse,
    PivotColumnResponse, PivotRequest, PivotResponse, PivotRowResponse, PositivePeriodResponse,
    SummaryResponse,
};
use crate::routes::health::{HealthResponse, ReadyResponse};
use crate::routes::registrations::{
    CumulativeResponse, RecordResponse, RegistrationsResponse,
};

/// Vahan Analytics API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vahan Registration Analytics API",
        version = "0.1.0",
        description = r#"
차량 등록 추세 분석 REST API입니다.

## 주요 기능

- **등록 조회**: 차종/연도/클래스/제조사 필터, 누적(Till date) 분리
- **성장률**: 그룹별 YoY/QoQ 성장률 테이블
- **투자자 요약**: CAGR, 변동성, 최고/최저 기간, 상위 N, 성장 연속 그룹
- **피벗**: 행/열 축과 측정값 선택으로 교차 집계

미정의 지표는 `null`로 내려가며 "N/A"로 표시해야 합니다.
"#
    ),
    paths(
        crate::routes::health::health,
        crate::routes::health::ready,
        crate::routes::registrations::get_registrations,
        crate::routes::analytics::get_growth,
        crate::routes::analytics::get_summary,
        crate::routes::analytics::post_pivot,
    ),
    components(schemas(
        ApiErrorResponse,
        HealthResponse,
        ReadyResponse,
        RegistrationsResponse,
        RecordResponse,
        CumulativeResponse,
        GrowthResponse,
        GrowthRowResponse,
        SummaryResponse,
        PeriodSlotResponse,
        PositivePeriodResponse,
        BestGroupResponse,
        GroupShareResponse,
        PivotRequest,
        PivotResponse,
        PivotColumnResponse,
        PivotRowResponse,
    ))
)]
pub struct ApiDoc;

/// Swagger UI 라우터를 생성합니다.
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

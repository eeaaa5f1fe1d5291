//! 분석 핸들러.
//!
//! 성장률 테이블, 투자자 요약, 피벗 집계 API를 제공합니다.
//!
//! 수치적으로 정의되지 않는 지표는 응답에서 `null`로 내려갑니다
//! 클라이언트는 "N/A"로 표시해야 하며, 0으로 간주하면 안 됩니다.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use vahan_analytics::{
    aggregate, best_group_by_period, group_share, pivot, with_growth, InvestorSummary, PeriodSlot,
    PivotTable,
};
use vahan_analytics::{positive_growth_periods, DEFAULT_TOP_N};
use vahan_core::{PeriodGranularity, RegistrationRecord, VehicleType};

use crate::error::{map_data_error, map_vahan_error, ApiErrorResponse, ApiResult};
use crate::routes::registrations::build_filter;
use crate::state::AppState;

// ==================== 공통 파라미터 처리 ====================

/// 분석 쿼리 파라미터.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AnalyticsQuery {
    /// 차종 (two_wheeler | three_wheeler | four_wheeler)
    pub vehicle_type: String,
    /// 그룹핑 속성 (쉼표 구분 복합 지정 가능, 기본값은 설정)
    pub group_by: Option<String>,
    /// 기간 단위 (year | quarter, 기본 year)
    pub granularity: Option<String>,
    /// 측정값 컬럼 (기본 TOTAL)
    pub measure: Option<String>,
    /// 상위 기간 목록 크기 (기본 5, summary 전용)
    pub top_n: Option<usize>,
    /// 연도 필터 (쉼표 구분)
    pub years: Option<String>,
    /// 차량 클래스 필터 (쉼표 구분)
    pub vehicle_classes: Option<String>,
    /// 제조사 필터 (쉼표 구분)
    pub manufacturers: Option<String>,
}

/// 파싱된 분석 요청 파라미터.
struct AnalyticsParams {
    vehicle_type: VehicleType,
    group_by: Vec<String>,
    granularity: PeriodGranularity,
    measure: String,
    top_n: usize,
}

impl AnalyticsParams {
    fn parse(query: &AnalyticsQuery, state: &AppState) -> ApiResult<Self> {
        let vehicle_type: VehicleType = query
            .vehicle_type
            .parse()
            .map_err(|e| map_vahan_error(&e))?;

        let granularity: PeriodGranularity = query
            .granularity
            .as_deref()
            .unwrap_or(&state.config.analytics.default_granularity)
            .parse()
            .map_err(|e| map_vahan_error(&e))?;

        let group_by: Vec<String> = query
            .group_by
            .clone()
            .unwrap_or_else(|| state.config.analytics.default_group_by.clone())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect();

        Ok(Self {
            vehicle_type,
            group_by,
            granularity,
            measure: query
                .measure
                .clone()
                .unwrap_or_else(|| "TOTAL".to_string()),
            top_n: query.top_n.unwrap_or(DEFAULT_TOP_N),
        })
    }

    fn group_by_refs(&self) -> Vec<&str> {
        self.group_by.iter().map(String::as_str).collect()
    }
}

/// 필터링된 레코드를 조회합니다.
async fn fetch_filtered(
    state: &AppState,
    query: &AnalyticsQuery,
    vehicle_type: VehicleType,
) -> ApiResult<Vec<RegistrationRecord>> {
    let filter = build_filter(&query.years, &query.vehicle_classes, &query.manufacturers);
    state
        .store
        .fetch_records(vehicle_type, &filter)
        .await
        .map_err(|e| map_data_error(&e))
}

// ==================== 성장률 ====================

/// 성장률 응답 행.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GrowthRowResponse {
    /// 그룹 값
    pub group: Vec<String>,
    /// 기간 키 (예: "2023", "2023Q2")
    pub period: String,
    /// 측정값 합계
    pub total: i64,
    /// 직전 기간 대비 성장률 (%). 미정의면 null → "N/A" 표시
    pub growth_pct: Option<String>,
}

/// 성장률 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GrowthResponse {
    /// 차종 키
    pub vehicle_type: String,
    /// 그룹핑 속성
    pub group_by: Vec<String>,
    /// 기간 단위
    pub granularity: String,
    /// 측정값 컬럼
    pub measure: String,
    /// 성장률 행 (그룹 사전순, 기간 오름차순)
    pub rows: Vec<GrowthRowResponse>,
}

/// 그룹별 전기 대비 성장률 조회.
///
/// GET /api/v1/analytics/growth
#[utoipa::path(get, path = "/api/v1/analytics/growth", params(AnalyticsQuery), responses(
    (status = 200, body = GrowthResponse),
    (status = 400, body = ApiErrorResponse),
))]
pub async fn get_growth(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<GrowthResponse>> {
    let params = AnalyticsParams::parse(&query, &state)?;
    let records = fetch_filtered(&state, &query, params.vehicle_type).await?;

    let rows = aggregate(
        &records,
        &params.group_by_refs(),
        params.granularity,
        &params.measure,
    )
    .map_err(|e| map_vahan_error(&e))?;
    let growth = with_growth(&rows);

    Ok(Json(GrowthResponse {
        vehicle_type: params.vehicle_type.to_string(),
        group_by: params.group_by.clone(),
        granularity: params.granularity.to_string(),
        measure: params.measure.clone(),
        rows: growth
            .iter()
            .map(|row| GrowthRowResponse {
                group: row.group.clone(),
                period: row.period.to_string(),
                total: row.total,
                growth_pct: row.growth_pct.as_ref().map(Decimal::to_string),
            })
            .collect(),
    }))
}

// ==================== 투자자 요약 ====================

/// 기간 슬롯 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PeriodSlotResponse {
    /// 기간 키
    pub period: String,
    /// 측정값 합계
    pub total: i64,
}

impl From<&PeriodSlot> for PeriodSlotResponse {
    fn from(slot: &PeriodSlot) -> Self {
        Self {
            period: slot.period.to_string(),
            total: slot.total,
        }
    }
}

/// 양의 성장 기간 응답 행.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PositivePeriodResponse {
    /// 기간 키
    pub period: String,
    /// 성장률 (%)
    pub growth_pct: String,
}

/// 기간별 최고 그룹 응답 행.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BestGroupResponse {
    /// 기간 키
    pub period: String,
    /// 그룹 값
    pub group: Vec<String>,
    /// 그룹 합계
    pub total: i64,
}

/// 그룹 점유율 응답 행.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupShareResponse {
    /// 그룹 값
    pub group: Vec<String>,
    /// 그룹 합계
    pub total: i64,
    /// 전체 대비 점유율 (%). 전체 합계 0이면 null
    pub share_pct: Option<String>,
}

/// 투자자 요약 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SummaryResponse {
    /// 차종 키
    pub vehicle_type: String,
    /// 기간 단위
    pub granularity: String,
    /// 측정값 컬럼
    pub measure: String,
    /// 기간별 합계 시계열
    pub totals: Vec<PeriodSlotResponse>,
    /// 전체 집합 성장률 시계열 (totals와 인덱스 정렬, 미정의는 null)
    pub growth: Vec<Option<String>>,
    /// CAGR (%). 미정의면 null → "N/A" 표시
    pub cagr_pct: Option<String>,
    /// 변동성 (성장률 표본 표준편차, %). 미정의면 null
    pub volatility_pct: Option<String>,
    /// 합계 최고 기간
    pub best_period: Option<PeriodSlotResponse>,
    /// 합계 최저 기간
    pub worst_period: Option<PeriodSlotResponse>,
    /// 합계 내림차순 상위 기간
    pub top_periods: Vec<PeriodSlotResponse>,
    /// 양의 성장 기간이 임계값(3) 이상인 그룹
    pub streak_groups: Vec<Vec<String>>,
    /// 양의 성장 기간 (성장률 내림차순)
    pub positive_periods: Vec<PositivePeriodResponse>,
    /// 기간별 최고 그룹
    pub best_groups: Vec<BestGroupResponse>,
    /// 그룹 점유율
    pub shares: Vec<GroupShareResponse>,
}

/// 투자자 요약 조회.
///
/// GET /api/v1/analytics/summary
#[utoipa::path(get, path = "/api/v1/analytics/summary", params(AnalyticsQuery), responses(
    (status = 200, body = SummaryResponse),
    (status = 400, body = ApiErrorResponse),
))]
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<SummaryResponse>> {
    let params = AnalyticsParams::parse(&query, &state)?;
    let records = fetch_filtered(&state, &query, params.vehicle_type).await?;
    let group_by = params.group_by_refs();

    let summary = InvestorSummary::from_records(
        &records,
        &group_by,
        params.granularity,
        &params.measure,
        params.top_n,
    )
    .map_err(|e| map_vahan_error(&e))?;

    let positive_periods = positive_growth_periods(&summary.totals);
    let best_groups =
        best_group_by_period(&records, &group_by, params.granularity, &params.measure)
            .map_err(|e| map_vahan_error(&e))?;
    let shares =
        group_share(&records, &group_by, &params.measure).map_err(|e| map_vahan_error(&e))?;

    Ok(Json(SummaryResponse {
        vehicle_type: params.vehicle_type.to_string(),
        granularity: summary.granularity.to_string(),
        measure: summary.measure.clone(),
        totals: summary.totals.iter().map(PeriodSlotResponse::from).collect(),
        growth: summary
            .growth
            .iter()
            .map(|g| g.as_ref().map(Decimal::to_string))
            .collect(),
        cagr_pct: summary.cagr_pct.as_ref().map(Decimal::to_string),
        volatility_pct: summary.volatility_pct.as_ref().map(Decimal::to_string),
        best_period: summary.best_period.as_ref().map(PeriodSlotResponse::from),
        worst_period: summary.worst_period.as_ref().map(PeriodSlotResponse::from),
        top_periods: summary
            .top_periods
            .iter()
            .map(PeriodSlotResponse::from)
            .collect(),
        streak_groups: summary.streak_groups.clone(),
        positive_periods: positive_periods
            .iter()
            .map(|(period, growth)| PositivePeriodResponse {
                period: period.to_string(),
                growth_pct: growth.to_string(),
            })
            .collect(),
        best_groups: best_groups
            .iter()
            .map(|row| BestGroupResponse {
                period: row.period.to_string(),
                group: row.group.clone(),
                total: row.total,
            })
            .collect(),
        shares: shares
            .iter()
            .map(|share| GroupShareResponse {
                group: share.group.clone(),
                total: share.total,
                share_pct: share.share_pct.as_ref().map(Decimal::to_string),
            })
            .collect(),
    }))
}

// ==================== 피벗 ====================

/// 피벗 요청.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PivotRequest {
    /// 차종 (two_wheeler | three_wheeler | four_wheeler)
    pub vehicle_type: String,
    /// 행 축 속성 (최소 1개: vehicle_category | manufacturer | vehicle_class | year)
    pub rows: Vec<String>,
    /// 선택적 열 축 속성
    pub column: Option<String>,
    /// 측정값 컬럼 (최소 1개)
    pub values: Vec<String>,
    /// 연도 필터 (쉼표 구분)
    pub years: Option<String>,
    /// 차량 클래스 필터 (쉼표 구분)
    pub vehicle_classes: Option<String>,
    /// 제조사 필터 (쉼표 구분)
    pub manufacturers: Option<String>,
}

/// 피벗 열 헤더 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PivotColumnResponse {
    /// 열 축 값 (열 축이 없으면 null)
    pub column: Option<String>,
    /// 측정값 컬럼 이름
    pub value_attr: String,
}

/// 피벗 행 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PivotRowResponse {
    /// 행 축 키
    pub key: Vec<String>,
    /// 셀 값 (columns와 인덱스 정렬, 누락 셀은 0)
    pub cells: Vec<i64>,
}

/// 피벗 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PivotResponse {
    /// 행 축 속성
    pub row_attrs: Vec<String>,
    /// 열 축 속성
    pub column_attr: Option<String>,
    /// 측정값 컬럼
    pub value_attrs: Vec<String>,
    /// 열 헤더
    pub columns: Vec<PivotColumnResponse>,
    /// 행
    pub rows: Vec<PivotRowResponse>,
}

impl From<&PivotTable> for PivotResponse {
    fn from(table: &PivotTable) -> Self {
        Self {
            row_attrs: table.row_attrs.clone(),
            column_attr: table.column_attr.clone(),
            value_attrs: table.value_attrs.clone(),
            columns: table
                .columns
                .iter()
                .map(|c| PivotColumnResponse {
                    column: c.column.clone(),
                    value_attr: c.value_attr.clone(),
                })
                .collect(),
            rows: table
                .rows
                .iter()
                .map(|r| PivotRowResponse {
                    key: r.key.clone(),
                    cells: r.cells.clone(),
                })
                .collect(),
        }
    }
}

/// 피벗 집계 실행.
///
/// POST /api/v1/analytics/pivot
#[utoipa::path(post, path = "/api/v1/analytics/pivot", request_body = PivotRequest, responses(
    (status = 200, body = PivotResponse),
    (status = 400, body = ApiErrorResponse),
))]
pub async fn post_pivot(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PivotRequest>,
) -> ApiResult<Json<PivotResponse>> {
    // 빈 행 축 선택은 호출자 측에서 거부 (코어에 닿기 전에)
    if request.rows.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse::new(
                "INVALID_INPUT",
                "pivot requires at least one row attribute",
            )),
        ));
    }

    let vehicle_type: VehicleType = request
        .vehicle_type
        .parse()
        .map_err(|e| map_vahan_error(&e))?;

    let filter = build_filter(
        &request.years,
        &request.vehicle_classes,
        &request.manufacturers,
    );
    let records = state
        .store
        .fetch_records(vehicle_type, &filter)
        .await
        .map_err(|e| map_data_error(&e))?;

    let rows: Vec<&str> = request.rows.iter().map(String::as_str).collect();
    let values: Vec<&str> = request.values.iter().map(String::as_str).collect();
    let table = pivot(&records, &rows, request.column.as_deref(), &values)
        .map_err(|e| map_vahan_error(&e))?;

    Ok(Json(PivotResponse::from(&table)))
}

/// 분석 라우터.
pub fn analytics_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/growth", get(get_growth))
        .route("/summary", get(get_summary))
        .route("/pivot", post(post_pivot))
}

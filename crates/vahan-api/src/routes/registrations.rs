//! 등록 데이터 조회 핸들러.
//!
//! 필터링된 데이터 테이블과 누적(Till date) 블록을 분리해 제공합니다.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use vahan_core::{RegistrationRecord, VehicleType};
use vahan_data::{CumulativeRow, RecordFilter};

use crate::error::{map_data_error, map_vahan_error, ApiResult};
use crate::state::AppState;

/// 쉼표로 구분된 목록 파라미터를 파싱합니다.
pub(crate) fn parse_csv_list(raw: &Option<String>) -> Option<Vec<String>> {
    raw.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(ToString::to_string)
            .collect()
    })
}

/// 쉼표로 구분된 연도 목록을 파싱합니다.
pub(crate) fn parse_year_list(raw: &Option<String>) -> Option<Vec<i32>> {
    parse_csv_list(raw).map(|items| items.iter().filter_map(|y| y.parse().ok()).collect())
}

/// 공통 필터 쿼리 파라미터에서 RecordFilter를 구성합니다.
pub(crate) fn build_filter(
    years: &Option<String>,
    vehicle_classes: &Option<String>,
    manufacturers: &Option<String>,
) -> RecordFilter {
    RecordFilter {
        years: parse_year_list(years),
        vehicle_classes: parse_csv_list(vehicle_classes),
        manufacturers: parse_csv_list(manufacturers),
    }
}

/// 등록 조회 쿼리 파라미터.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct RegistrationsQuery {
    /// 차종 (two_wheeler | three_wheeler | four_wheeler)
    pub vehicle_type: String,
    /// 연도 필터 (쉼표 구분, 예: "2021,2022")
    pub years: Option<String>,
    /// 차량 클래스 필터 (쉼표 구분)
    pub vehicle_classes: Option<String>,
    /// 제조사 필터 (쉼표 구분)
    pub manufacturers: Option<String>,
}

/// 등록 레코드 응답 행.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordResponse {
    /// 등록 기준일 (YYYY-MM-DD)
    pub recorded_at: String,
    /// 차량 카테고리
    pub vehicle_category: String,
    /// 제조사
    pub manufacturer: String,
    /// 차량 클래스
    pub vehicle_class: String,
    /// 측정값 컬럼
    pub measures: BTreeMap<String, i64>,
}

impl From<&RegistrationRecord> for RecordResponse {
    fn from(record: &RegistrationRecord) -> Self {
        Self {
            recorded_at: record.recorded_at.to_string(),
            vehicle_category: record.vehicle_category.clone(),
            manufacturer: record.manufacturer.clone(),
            vehicle_class: record.vehicle_class.clone(),
            measures: record.measures.clone(),
        }
    }
}

/// 누적(Till date) 응답 행.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CumulativeResponse {
    /// 차량 카테고리
    pub vehicle_category: String,
    /// 제조사
    pub manufacturer: String,
    /// 차량 클래스
    pub vehicle_class: String,
    /// 측정값 컬럼
    pub measures: BTreeMap<String, i64>,
}

impl From<&CumulativeRow> for CumulativeResponse {
    fn from(row: &CumulativeRow) -> Self {
        Self {
            vehicle_category: row.vehicle_category.clone(),
            manufacturer: row.manufacturer.clone(),
            vehicle_class: row.vehicle_class.clone(),
            measures: row.measures.clone(),
        }
    }
}

/// 등록 조회 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegistrationsResponse {
    /// 차종 키
    pub vehicle_type: String,
    /// 필터링된 레코드 (기간 시계열 대상)
    pub records: Vec<RecordResponse>,
    /// 누적(Till date) 행 (기간 시계열에는 절대 포함되지 않음)
    pub cumulative: Vec<CumulativeResponse>,
    /// 누적 합계 (TOTAL 기준)
    pub cumulative_total: i64,
    /// 조회 가능한 연도 목록
    pub available_years: Vec<i32>,
    /// 조회 가능한 차량 클래스 목록
    pub available_classes: Vec<String>,
    /// 차종 스키마의 측정값 컬럼 (피벗 값 선택 옵션)
    pub measure_columns: Vec<String>,
}

/// 필터링된 등록 데이터 조회.
///
/// GET /api/v1/registrations
#[utoipa::path(get, path = "/api/v1/registrations", params(RegistrationsQuery), responses(
    (status = 200, body = RegistrationsResponse),
    (status = 400, description = "잘못된 차종 또는 필터"),
))]
pub async fn get_registrations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RegistrationsQuery>,
) -> ApiResult<Json<RegistrationsResponse>> {
    let vehicle_type: VehicleType = query
        .vehicle_type
        .parse()
        .map_err(|e| map_vahan_error(&e))?;

    let filter = build_filter(&query.years, &query.vehicle_classes, &query.manufacturers);
    let records = state
        .store
        .fetch_records(vehicle_type, &filter)
        .await
        .map_err(|e| map_data_error(&e))?;
    let cumulative = state
        .store
        .fetch_cumulative(vehicle_type)
        .await
        .map_err(|e| map_data_error(&e))?;
    let available_years = state
        .store
        .distinct_years(vehicle_type)
        .await
        .map_err(|e| map_data_error(&e))?;
    let available_classes = state
        .store
        .distinct_vehicle_classes(vehicle_type)
        .await
        .map_err(|e| map_data_error(&e))?;

    let cumulative_total = cumulative
        .iter()
        .map(|row| row.measures.get("TOTAL").copied().unwrap_or(0))
        .sum();

    Ok(Json(RegistrationsResponse {
        vehicle_type: vehicle_type.to_string(),
        records: records.iter().map(RecordResponse::from).collect(),
        cumulative: cumulative.iter().map(CumulativeResponse::from).collect(),
        cumulative_total,
        available_years,
        available_classes,
        measure_columns: vehicle_type
            .measure_columns()
            .iter()
            .map(ToString::to_string)
            .collect(),
    }))
}

/// 등록 조회 라우터.
pub fn registrations_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_registrations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn request(uri: &str) -> (StatusCode, Vec<u8>) {
        let state = Arc::new(create_test_state().await);
        let app = Router::new()
            .nest("/api/v1/registrations", registrations_router())
            .with_state(state);

        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_get_registrations_separates_cumulative() {
        let (status, body) =
            request("/api/v1/registrations?vehicle_type=four_wheeler").await;
        assert_eq!(status, StatusCode::OK);

        let response: RegistrationsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.records.len(), 6);
        assert_eq!(response.cumulative.len(), 1);
        assert_eq!(response.cumulative_total, 900);
        assert_eq!(response.available_years, vec![2020, 2021, 2022, 2023]);
        assert!(response
            .measure_columns
            .contains(&"TOTAL".to_string()));
    }

    #[tokio::test]
    async fn test_get_registrations_with_filters() {
        let (status, body) = request(
            "/api/v1/registrations?vehicle_type=four_wheeler&years=2021,2022&vehicle_classes=LMV",
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let response: RegistrationsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.records.len(), 2);
        assert!(response
            .records
            .iter()
            .all(|r| r.vehicle_class == "LMV"));
    }

    #[tokio::test]
    async fn test_get_registrations_invalid_vehicle_type() {
        let (status, _) = request("/api/v1/registrations?vehicle_type=airplane").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

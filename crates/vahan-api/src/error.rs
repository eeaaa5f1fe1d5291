//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.
//!
//! 구조적 에러(`UNKNOWN_ATTRIBUTE`, `INVALID_TIMESTAMP`, `INVALID_INPUT`)는
//! 400으로, 저장소 에러는 500으로 매핑됩니다. 수치적으로 정의되지 않는
//! 지표는 에러가 아니라 응답 본문의 `null`로 내려가며 클라이언트가
//! "N/A"로 표시합니다.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use vahan_core::VahanError;
use vahan_data::DataError;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "UNKNOWN_ATTRIBUTE",
///   "message": "알 수 없는 속성: fuel_type",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "DB_ERROR", "INVALID_INPUT", "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details),
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// 핵심 에러를 HTTP 응답으로 매핑합니다.
pub fn map_vahan_error(err: &VahanError) -> (StatusCode, Json<ApiErrorResponse>) {
    let (status, code) = match err {
        VahanError::UnknownAttribute(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_ATTRIBUTE"),
        VahanError::InvalidTimestamp(_) => (StatusCode::BAD_REQUEST, "INVALID_TIMESTAMP"),
        VahanError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        VahanError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };
    (status, Json(ApiErrorResponse::new(code, err.to_string())))
}

/// 저장소 에러를 HTTP 응답으로 매핑합니다.
pub fn map_data_error(err: &DataError) -> (StatusCode, Json<ApiErrorResponse>) {
    let (status, code) = match err {
        DataError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        DataError::ParseError(_) | DataError::InvalidData(_) => {
            (StatusCode::BAD_REQUEST, "INVALID_DATA")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "DB_ERROR"),
    };
    (status, Json(ApiErrorResponse::new(code, err.to_string())))
}

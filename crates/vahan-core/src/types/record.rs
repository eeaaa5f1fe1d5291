//! 등록 레코드 타입.
//!
//! 적재 계층이 생성하는 입력 데이터의 한 행을 나타냅니다.
//! 레코드는 적재 후 불변이며, 모든 변환은 새 테이블을 생성합니다.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 합계 측정값의 관례적 컬럼 이름.
pub const TOTAL_MEASURE: &str = "TOTAL";

/// 차량 등록 레코드 한 행.
///
/// 등록일, 카테고리 속성 3종, 차종 스키마에 따른 측정값 컬럼들을 가집니다.
/// 측정값 맵은 와이드 포맷 입력(예: `4WIC`, `LMV`, ..., `TOTAL`)을 그대로
/// 컬럼 이름으로 보존합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// 등록 기준일
    pub recorded_at: NaiveDate,
    /// 차량 카테고리 (예: "Four Wheeler")
    pub vehicle_category: String,
    /// 제조사
    pub manufacturer: String,
    /// 차량 클래스 (예: "LMV")
    pub vehicle_class: String,
    /// 측정값 컬럼 (컬럼 이름 → 등록 대수)
    pub measures: BTreeMap<String, i64>,
}

impl RegistrationRecord {
    /// 카테고리 속성을 이름으로 조회합니다.
    ///
    /// 스키마에 없는 이름이면 `None`을 반환하며, 호출자는 이를
    /// `UnknownAttribute` 에러로 변환해야 합니다.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match name {
            "vehicle_category" => Some(&self.vehicle_category),
            "manufacturer" => Some(&self.manufacturer),
            "vehicle_class" => Some(&self.vehicle_class),
            _ => None,
        }
    }

    /// 측정값을 컬럼 이름으로 조회합니다.
    pub fn measure(&self, name: &str) -> Option<i64> {
        self.measures.get(name).copied()
    }

    /// 합계(`TOTAL`) 측정값을 반환합니다. 없으면 0.
    pub fn total(&self) -> i64 {
        self.measure(TOTAL_MEASURE).unwrap_or(0)
    }

    /// 레코드가 가진 측정값 컬럼 이름 목록을 반환합니다.
    pub fn measure_names(&self) -> impl Iterator<Item = &str> {
        self.measures.keys().map(String::as_str)
    }
}

/// 레코드가 지원하는 카테고리 속성 이름 목록.
pub const ATTRIBUTE_NAMES: &[&str] = &["vehicle_category", "manufacturer", "vehicle_class"];

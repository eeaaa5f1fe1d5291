//! 그룹별 기간 집계.
//!
//! 등록 레코드를 (그룹 값, 기간 키) 쌍으로 묶어 측정값을 합산합니다.
//! 출력은 그룹 값(사전순), 기간(오름차순) 순서로 정렬되어 하위의 성장률
//! 계산이 결정적으로 동작하도록 보장합니다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use vahan_core::{
    PeriodGranularity, PeriodKey, RegistrationRecord, VahanError, VahanResult, ATTRIBUTE_NAMES,
};

/// 집계 행: 하나의 (그룹 값, 기간) 쌍에 대한 측정값 합계.
///
/// 고정된 그룹 값에 대해 입력에 존재하는 기간마다 정확히 한 행이 생성되며,
/// 누락된 기간에 대한 행은 합성하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRow {
    /// 그룹 값 (그룹핑 속성당 하나, 복합 그룹핑 지원)
    pub group: Vec<String>,
    /// 기간 키
    pub period: PeriodKey,
    /// 측정값 합계
    pub total: i64,
}

/// 전체 집합 기간 슬롯: 그룹 구분 없는 기간별 합계.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSlot {
    /// 기간 키
    pub period: PeriodKey,
    /// 측정값 합계
    pub total: i64,
}

/// 그룹핑 속성 이름을 검증합니다.
fn validate_attributes(group_by: &[&str]) -> VahanResult<()> {
    for name in group_by {
        if !ATTRIBUTE_NAMES.contains(name) {
            return Err(VahanError::UnknownAttribute((*name).to_string()));
        }
    }
    Ok(())
}

/// 측정값 컬럼 이름을 관측된 스키마에 대해 검증합니다.
///
/// 스키마는 레코드들이 가진 측정값 컬럼의 합집합입니다. 입력이 비어 있으면
/// 검증을 건너뜁니다 (빈 입력 → 빈 출력, 에러 아님).
fn validate_measure(records: &[RegistrationRecord], measure: &str) -> VahanResult<()> {
    if records.is_empty() {
        return Ok(());
    }
    let known = records
        .iter()
        .any(|r| r.measure_names().any(|name| name == measure));
    if !known {
        return Err(VahanError::UnknownAttribute(measure.to_string()));
    }
    Ok(())
}

/// 레코드를 그룹핑 속성과 기간 단위로 집계합니다.
///
/// 출력 순서: 그룹 값 사전순 → 기간 오름차순.
/// 측정값 컬럼이 없는 레코드는 해당 셀에 0으로 기여합니다
/// (와이드 포맷 입력은 실제로는 스키마의 모든 컬럼을 가집니다).
///
/// # 인자
///
/// * `records` - 필터링된 등록 레코드
/// * `group_by` - 그룹핑 속성 이름 (복수 지정 시 복합 그룹)
/// * `granularity` - 기간 단위 (연도/분기)
/// * `measure` - 합산할 측정값 컬럼 이름
///
/// # Errors
///
/// 그룹핑 속성 또는 측정값 이름이 입력 스키마에 없으면
/// `VahanError::UnknownAttribute`.
pub fn aggregate(
    records: &[RegistrationRecord],
    group_by: &[&str],
    granularity: PeriodGranularity,
    measure: &str,
) -> VahanResult<Vec<AggregateRow>> {
    validate_attributes(group_by)?;
    validate_measure(records, measure)?;

    let mut sums: BTreeMap<(Vec<String>, PeriodKey), i64> = BTreeMap::new();
    for record in records {
        let group: Vec<String> = group_by
            .iter()
            .map(|name| {
                record
                    .attribute(name)
                    .map(ToString::to_string)
                    .ok_or_else(|| VahanError::UnknownAttribute((*name).to_string()))
            })
            .collect::<VahanResult<_>>()?;
        let period = PeriodKey::from_date(record.recorded_at, granularity);
        let value = record.measure(measure).unwrap_or(0);

        *sums.entry((group, period)).or_insert(0) += value;
    }

    // BTreeMap 순회가 (그룹 사전순, 기간 오름차순)을 그대로 제공
    Ok(sums
        .into_iter()
        .map(|((group, period), total)| AggregateRow {
            group,
            period,
            total,
        })
        .collect())
}

/// 전체 필터 집합의 기간별 합계 시계열을 계산합니다.
///
/// 그룹 구분 없이 기간 오름차순으로 정렬된 시계열을 반환합니다.
/// CAGR, 변동성, 최고/최저 기간 계산의 입력입니다.
///
/// # Errors
///
/// 측정값 이름이 입력 스키마에 없으면 `VahanError::UnknownAttribute`.
pub fn totals_by_period(
    records: &[RegistrationRecord],
    granularity: PeriodGranularity,
    measure: &str,
) -> VahanResult<Vec<PeriodSlot>> {
    validate_measure(records, measure)?;

    let mut sums: BTreeMap<PeriodKey, i64> = BTreeMap::new();
    for record in records {
        let period = PeriodKey::from_date(record.recorded_at, granularity);
        *sums.entry(period).or_insert(0) += record.measure(measure).unwrap_or(0);
    }

    Ok(sums
        .into_iter()
        .map(|(period, total)| PeriodSlot { period, total })
        .collect())
}

//! 피벗(교차) 집계.
//!
//! 선택한 행 축 속성, 선택적 열 축 속성, 측정값 컬럼들에 대해 합계
//! 교차표를 생성합니다. 관측되지 않은 (행, 열) 셀은 0으로 채웁니다.
//!
//! 행 축에는 카테고리 속성 외에 의사 속성 `"year"`(등록일의 달력 연도)를
//! 사용할 수 있습니다.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use vahan_core::{RegistrationRecord, VahanError, VahanResult, ATTRIBUTE_NAMES};

/// 행 축/열 축에 허용되는 의사 속성: 등록일의 달력 연도.
pub const YEAR_ATTRIBUTE: &str = "year";

/// 피벗 열 헤더: (열 축 값, 측정값 컬럼) 쌍.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotColumn {
    /// 열 축 값 (열 축이 없으면 `None`)
    pub column: Option<String>,
    /// 측정값 컬럼 이름
    pub value_attr: String,
}

/// 피벗 행: 행 축 키와 열 헤더 순서대로 정렬된 셀 값.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotRow {
    /// 행 축 키 (행 축 속성당 하나)
    pub key: Vec<String>,
    /// 셀 값 (`PivotTable::columns`와 인덱스 정렬, 누락 셀은 0)
    pub cells: Vec<i64>,
}

/// 피벗 집계 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotTable {
    /// 행 축 속성 이름
    pub row_attrs: Vec<String>,
    /// 열 축 속성 이름 (선택)
    pub column_attr: Option<String>,
    /// 측정값 컬럼 이름
    pub value_attrs: Vec<String>,
    /// 열 헤더 (열 축 값 오름차순 × 측정값 컬럼 지정 순서)
    pub columns: Vec<PivotColumn>,
    /// 행 (행 축 키 오름차순)
    pub rows: Vec<PivotRow>,
}

/// 레코드에서 피벗 축 속성 값을 해석합니다.
fn axis_value(record: &RegistrationRecord, name: &str) -> VahanResult<String> {
    if name == YEAR_ATTRIBUTE {
        use chrono::Datelike;
        return Ok(record.recorded_at.year().to_string());
    }
    record
        .attribute(name)
        .map(ToString::to_string)
        .ok_or_else(|| VahanError::UnknownAttribute(name.to_string()))
}

/// 축 속성 이름을 검증합니다.
fn validate_axis(name: &str) -> VahanResult<()> {
    if name == YEAR_ATTRIBUTE || ATTRIBUTE_NAMES.contains(&name) {
        Ok(())
    } else {
        Err(VahanError::UnknownAttribute(name.to_string()))
    }
}

/// 피벗 교차표를 생성합니다.
///
/// 집계 함수는 합계이며, 관측되지 않은 셀은 0으로 채워집니다.
/// 행은 행 축 키 오름차순, 열은 (열 축 값 오름차순 × 측정값 지정 순서)로
/// 결정적으로 정렬됩니다.
///
/// # 인자
///
/// * `records` - 필터링된 등록 레코드
/// * `rows` - 행 축 속성 이름 (최소 1개, 빈 선택은 호출자가 막아야 함)
/// * `column` - 선택적 열 축 속성 이름
/// * `values` - 측정값 컬럼 이름 (최소 1개)
///
/// # Errors
///
/// * 행 축 또는 측정값 선택이 비어 있으면 `VahanError::InvalidInput`
/// * 축 속성 또는 측정값 이름이 스키마에 없으면 `VahanError::UnknownAttribute`
pub fn pivot(
    records: &[RegistrationRecord],
    rows: &[&str],
    column: Option<&str>,
    values: &[&str],
) -> VahanResult<PivotTable> {
    if rows.is_empty() {
        return Err(VahanError::InvalidInput(
            "pivot requires at least one row attribute".to_string(),
        ));
    }
    if values.is_empty() {
        return Err(VahanError::InvalidInput(
            "pivot requires at least one value attribute".to_string(),
        ));
    }
    for name in rows {
        validate_axis(name)?;
    }
    if let Some(name) = column {
        validate_axis(name)?;
    }
    if !records.is_empty() {
        for measure in values {
            let known = records
                .iter()
                .any(|r| r.measure_names().any(|name| name == *measure));
            if !known {
                return Err(VahanError::UnknownAttribute((*measure).to_string()));
            }
        }
    }

    // 셀 합산: (행 키, 열 값, 측정값) → 합계
    let mut sums: BTreeMap<(Vec<String>, Option<String>, usize), i64> = BTreeMap::new();
    let mut row_keys: BTreeSet<Vec<String>> = BTreeSet::new();
    let mut column_values: BTreeSet<Option<String>> = BTreeSet::new();

    for record in records {
        let key: Vec<String> = rows
            .iter()
            .map(|name| axis_value(record, name))
            .collect::<VahanResult<_>>()?;
        let column_value = match column {
            Some(name) => Some(axis_value(record, name)?),
            None => None,
        };

        row_keys.insert(key.clone());
        column_values.insert(column_value.clone());

        for (value_idx, measure) in values.iter().enumerate() {
            let value = record.measure(measure).unwrap_or(0);
            *sums
                .entry((key.clone(), column_value.clone(), value_idx))
                .or_insert(0) += value;
        }
    }

    // 열 헤더: 열 축 값 오름차순 × 측정값 지정 순서
    let mut columns = Vec::new();
    for column_value in &column_values {
        for measure in values {
            columns.push(PivotColumn {
                column: column_value.clone(),
                value_attr: (*measure).to_string(),
            });
        }
    }

    // 행: 누락 셀은 0으로 채움
    let table_rows = row_keys
        .into_iter()
        .map(|key| {
            let mut cells = Vec::with_capacity(columns.len());
            for column_value in &column_values {
                for value_idx in 0..values.len() {
                    let cell = sums
                        .get(&(key.clone(), column_value.clone(), value_idx))
                        .copied()
                        .unwrap_or(0);
                    cells.push(cell);
                }
            }
            PivotRow { key, cells }
        })
        .collect();

    Ok(PivotTable {
        row_attrs: rows.iter().map(ToString::to_string).collect(),
        column_attr: column.map(ToString::to_string),
        value_attrs: values.iter().map(ToString::to_string).collect(),
        columns,
        rows: table_rows,
    })
}

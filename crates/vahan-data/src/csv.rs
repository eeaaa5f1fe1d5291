//! 차종별 CSV 파일 파싱.
//!
//! 와이드 포맷 입력을 파싱합니다:
//!
//! ```csv
//! Date,Vehicle Category,Manufacturer,Vehicle Class,4WIC,LMV,MMV,HMV,TOTAL
//! 2023-04-01,Four Wheeler,Maruti,LMV,0,120,0,0,120
//! Till date,Four Wheeler,Maruti,LMV,0,9100,0,0,9100
//! ```
//!
//! 첫 네 컬럼은 고정이고 나머지 컬럼 이름은 헤더에서 그대로 측정값
//! 스키마가 됩니다. `Date`가 `Till date` 센티널(대소문자 무시)인 행은
//! 누적 행으로 분리되어 기간 시계열에 절대 들어가지 않습니다.
//!
//! 날짜나 숫자를 파싱할 수 없는 행은 배치 전체를 거부하는 대신 제외하고
//! 개수를 집계합니다. 조용한 누락 집계를 막기 위해 제외 행 수는 결과에
//! 그대로 노출되고 경고 로그로 남습니다.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use vahan_core::{is_till_date, parse_record_date, RegistrationRecord};

use crate::error::{DataError, Result};

/// 고정 선행 컬럼 수: Date, Vehicle Category, Manufacturer, Vehicle Class.
const FIXED_COLUMNS: usize = 4;

/// 누적(Till date) 행.
///
/// 달력 기간에 속하지 않으므로 등록일 없이 보관됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeRow {
    /// 차량 카테고리
    pub vehicle_category: String,
    /// 제조사
    pub manufacturer: String,
    /// 차량 클래스
    pub vehicle_class: String,
    /// 측정값 컬럼 (컬럼 이름 → 등록 대수)
    pub measures: BTreeMap<String, i64>,
}

/// CSV 파싱 결과.
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    /// 기간 시계열에 들어갈 날짜 있는 레코드
    pub records: Vec<RegistrationRecord>,
    /// 분리 보관되는 누적(Till date) 행
    pub cumulative: Vec<CumulativeRow>,
    /// 제외된 행 수 (파싱 불가 날짜/숫자, 컬럼 수 불일치)
    pub skipped_rows: usize,
}

/// 헤더 행을 파싱해 측정값 컬럼 이름을 추출합니다.
fn parse_header(line: &str) -> Result<Vec<String>> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() <= FIXED_COLUMNS {
        return Err(DataError::ParseError(format!(
            "CSV header must have at least {} columns, got {}",
            FIXED_COLUMNS + 1,
            parts.len()
        )));
    }
    if !parts[0].eq_ignore_ascii_case("date") {
        return Err(DataError::ParseError(format!(
            "CSV header must start with 'Date', got '{}'",
            parts[0]
        )));
    }
    Ok(parts[FIXED_COLUMNS..]
        .iter()
        .map(ToString::to_string)
        .collect())
}

/// 데이터 행의 측정값 필드를 파싱합니다.
fn parse_measures(
    fields: &[&str],
    measure_names: &[String],
    line_no: usize,
) -> std::result::Result<BTreeMap<String, i64>, String> {
    let mut measures = BTreeMap::new();
    for (name, raw) in measure_names.iter().zip(fields) {
        let value: i64 = raw
            .parse()
            .map_err(|_| format!("invalid count '{}' at line {}", raw, line_no + 1))?;
        measures.insert(name.clone(), value);
    }
    Ok(measures)
}

/// CSV 내용을 파싱해 레코드와 누적 행으로 분리합니다.
///
/// # Errors
///
/// 헤더가 없거나 형식이 어긋나면 `DataError::ParseError`.
/// 개별 데이터 행의 오류는 에러가 아니라 제외로 처리됩니다
/// ([`ImportOutcome::skipped_rows`]).
pub fn parse_csv(content: &str) -> Result<ImportOutcome> {
    let mut lines = content.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

    let (_, header) = lines
        .next()
        .ok_or_else(|| DataError::ParseError("CSV file is empty".to_string()))?;
    let measure_names = parse_header(header)?;
    let expected_fields = FIXED_COLUMNS + measure_names.len();

    let mut outcome = ImportOutcome::default();

    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != expected_fields {
            warn!(
                line = line_no + 1,
                expected = expected_fields,
                got = fields.len(),
                "Skipping row with unexpected column count"
            );
            outcome.skipped_rows += 1;
            continue;
        }

        let (date_field, vehicle_category, manufacturer, vehicle_class) =
            (fields[0], fields[1], fields[2], fields[3]);

        let measures = match parse_measures(&fields[FIXED_COLUMNS..], &measure_names, line_no) {
            Ok(measures) => measures,
            Err(reason) => {
                warn!(line = line_no + 1, %reason, "Skipping unparseable row");
                outcome.skipped_rows += 1;
                continue;
            }
        };

        if is_till_date(date_field) {
            outcome.cumulative.push(CumulativeRow {
                vehicle_category: vehicle_category.to_string(),
                manufacturer: manufacturer.to_string(),
                vehicle_class: vehicle_class.to_string(),
                measures,
            });
            continue;
        }

        match parse_record_date(date_field) {
            Ok(recorded_at) => outcome.records.push(RegistrationRecord {
                recorded_at,
                vehicle_category: vehicle_category.to_string(),
                manufacturer: manufacturer.to_string(),
                vehicle_class: vehicle_class.to_string(),
                measures,
            }),
            Err(err) => {
                warn!(line = line_no + 1, %err, "Skipping row with invalid date");
                outcome.skipped_rows += 1;
            }
        }
    }

    if outcome.skipped_rows > 0 {
        warn!(
            skipped = outcome.skipped_rows,
            imported = outcome.records.len(),
            "CSV import excluded rows; totals may undercount the source file"
        );
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
Date,Vehicle Category,Manufacturer,Vehicle Class,4WIC,LMV,MMV,HMV,TOTAL
2022-04-01,Four Wheeler,Maruti,LMV,0,120,0,0,120
2023-04-01,Four Wheeler,Maruti,LMV,0,150,0,0,150
Till date,Four Wheeler,Maruti,LMV,0,9100,0,0,9100
";

    #[test]
    fn test_parse_csv_basic() {
        let outcome = parse_csv(SAMPLE).unwrap();

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.cumulative.len(), 1);
        assert_eq!(outcome.skipped_rows, 0);

        let first = &outcome.records[0];
        assert_eq!(
            first.recorded_at,
            NaiveDate::from_ymd_opt(2022, 4, 1).unwrap()
        );
        assert_eq!(first.manufacturer, "Maruti");
        assert_eq!(first.measure("LMV"), Some(120));
        assert_eq!(first.total(), 120);

        let cumulative = &outcome.cumulative[0];
        assert_eq!(cumulative.measures.get("TOTAL"), Some(&9100));
    }

    #[test]
    fn test_parse_csv_skips_bad_rows_and_counts() {
        let content = "\
Date,Vehicle Category,Manufacturer,Vehicle Class,TOTAL
2022-04-01,Four Wheeler,Maruti,LMV,120
not-a-date,Four Wheeler,Maruti,LMV,130
2023-04-01,Four Wheeler,Maruti,LMV,abc
2023-05-01,Four Wheeler,Maruti,LMV
2024-04-01,Four Wheeler,Maruti,LMV,140
";
        let outcome = parse_csv(content).unwrap();

        // 잘못된 날짜 1, 잘못된 숫자 1, 컬럼 수 불일치 1
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.skipped_rows, 3);
    }

    #[test]
    fn test_parse_csv_till_date_case_insensitive() {
        let content = "\
Date,Vehicle Category,Manufacturer,Vehicle Class,TOTAL
TILL DATE,Four Wheeler,Maruti,LMV,9000
";
        let outcome = parse_csv(content).unwrap();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.cumulative.len(), 1);
    }

    #[test]
    fn test_parse_csv_rejects_missing_header() {
        assert!(parse_csv("").is_err());

        let bad_header = "Year,Category,TOTAL\n2022,Four Wheeler,10\n";
        assert!(parse_csv(bad_header).is_err());
    }

    #[test]
    fn test_parse_csv_measure_schema_from_header() {
        let content = "\
Date,Vehicle Category,Manufacturer,Vehicle Class,3WN,3WT,TOTAL
2022-04-01,Three Wheeler,Bajaj,3WN,80,20,100
";
        let outcome = parse_csv(content).unwrap();
        let record = &outcome.records[0];
        assert_eq!(record.measure("3WN"), Some(80));
        assert_eq!(record.measure("3WT"), Some(20));
        assert_eq!(record.total(), 100);
    }
}

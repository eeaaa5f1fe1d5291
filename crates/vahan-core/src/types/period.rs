//! 기간 키 (연도/분기) 정의 및 추출.
//!
//! 이 모듈은 등록일로부터 달력 기간 키를 파생하는 타입을 정의합니다.
//! 기간 키는 저장되지 않고 분석 실행마다 새로 계산됩니다.

use chrono::{Datelike, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{VahanError, VahanResult};

/// 누적 의사 기간을 나타내는 예약 센티널 값.
///
/// 이 값(대소문자 무시)을 가진 행은 연도 시계열 계산에서 제외되고
/// 누적 합계로 별도 표시됩니다.
pub const TILL_DATE: &str = "till date";

/// 주어진 기간 레이블이 누적(Till date) 센티널인지 확인합니다.
pub fn is_till_date(label: &str) -> bool {
    label.trim().eq_ignore_ascii_case(TILL_DATE)
}

/// 기간 단위.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodGranularity {
    /// 달력 연도 (YoY 분석)
    Year,
    /// 달력 분기 (QoQ 분석)
    Quarter,
}

impl Default for PeriodGranularity {
    fn default() -> Self {
        Self::Year
    }
}

impl fmt::Display for PeriodGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodGranularity::Year => write!(f, "year"),
            PeriodGranularity::Quarter => write!(f, "quarter"),
        }
    }
}

impl FromStr for PeriodGranularity {
    type Err = VahanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "year" | "yearly" | "y" => Ok(Self::Year),
            "quarter" | "quarterly" | "q" => Ok(Self::Quarter),
            _ => Err(VahanError::InvalidInput(format!(
                "Invalid granularity: {}",
                s
            ))),
        }
    }
}

/// 달력 기간 키.
///
/// 연도 또는 (연도, 분기) 쌍이며 기간 오름차순으로 정렬됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PeriodKey {
    /// 달력 연도 (예: 2023)
    Year(i32),
    /// 달력 분기 (연도 + 1~4 분기)
    Quarter {
        /// 연도
        year: i32,
        /// 분기 (1-4)
        quarter: u8,
    },
}

impl PeriodKey {
    /// 등록일에서 기간 키를 파생합니다.
    ///
    /// 분기는 월의 정수 나눗셈으로 결정됩니다:
    /// 1~3월→Q1, 4~6월→Q2, 7~9월→Q3, 10~12월→Q4.
    pub fn from_date(date: NaiveDate, granularity: PeriodGranularity) -> Self {
        match granularity {
            PeriodGranularity::Year => PeriodKey::Year(date.year()),
            PeriodGranularity::Quarter => PeriodKey::Quarter {
                year: date.year(),
                quarter: ((date.month() - 1) / 3 + 1) as u8,
            },
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Year(y) => write!(f, "{}", y),
            PeriodKey::Quarter { year, quarter } => write!(f, "{}Q{}", year, quarter),
        }
    }
}

impl FromStr for PeriodKey {
    type Err = VahanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((year, quarter)) = s.split_once(['Q', 'q']) {
            let year: i32 = year
                .parse()
                .map_err(|_| VahanError::InvalidInput(format!("Invalid period key: {}", s)))?;
            let quarter: u8 = quarter
                .parse()
                .map_err(|_| VahanError::InvalidInput(format!("Invalid period key: {}", s)))?;
            if !(1..=4).contains(&quarter) {
                return Err(VahanError::InvalidInput(format!(
                    "Quarter out of range: {}",
                    s
                )));
            }
            Ok(PeriodKey::Quarter { year, quarter })
        } else {
            let year: i32 = s
                .parse()
                .map_err(|_| VahanError::InvalidInput(format!("Invalid period key: {}", s)))?;
            Ok(PeriodKey::Year(year))
        }
    }
}

impl Serialize for PeriodKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PeriodKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// 원시 문자열 값에서 등록일을 파싱합니다 (`YYYY-MM-DD`).
///
/// 기간 추출기의 실패 가능한 진입점입니다. 비어 있거나 파싱할 수 없는
/// 값은 원인 값이 포함된 `InvalidTimestamp`를 반환합니다.
///
/// # Errors
///
/// 값이 비어 있거나 `YYYY-MM-DD` 형식이 아니면 `VahanError::InvalidTimestamp`.
pub fn parse_record_date(raw: &str) -> VahanResult<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(VahanError::InvalidTimestamp("<empty>".to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| VahanError::InvalidTimestamp(raw.to_string()))
}

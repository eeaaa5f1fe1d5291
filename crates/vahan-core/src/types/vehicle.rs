//! 차종 정의 및 측정값 컬럼 스키마.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VahanError;

/// 분석 대상 차종.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    /// 이륜차
    TwoWheeler,
    /// 삼륜차
    ThreeWheeler,
    /// 사륜차
    FourWheeler,
}

impl VehicleType {
    /// 저장 테이블을 구분하는 키를 반환합니다.
    pub fn key(&self) -> &'static str {
        match self {
            VehicleType::TwoWheeler => "two_wheeler",
            VehicleType::ThreeWheeler => "three_wheeler",
            VehicleType::FourWheeler => "four_wheeler",
        }
    }

    /// 표시용 이름을 반환합니다.
    pub fn display_name(&self) -> &'static str {
        match self {
            VehicleType::TwoWheeler => "Two Wheeler",
            VehicleType::ThreeWheeler => "Three Wheeler",
            VehicleType::FourWheeler => "Four Wheeler",
        }
    }

    /// 이 차종의 측정값 컬럼 스키마를 반환합니다 (`TOTAL` 포함).
    pub fn measure_columns(&self) -> &'static [&'static str] {
        match self {
            VehicleType::TwoWheeler => &["2WIC", "2WN", "2WT", "TOTAL"],
            VehicleType::ThreeWheeler => &["3WN", "3WT", "TOTAL"],
            VehicleType::FourWheeler => &["4WIC", "LMV", "MMV", "HMV", "TOTAL"],
        }
    }

    /// 모든 차종 목록을 반환합니다.
    pub fn all() -> &'static [VehicleType] {
        &[
            VehicleType::TwoWheeler,
            VehicleType::ThreeWheeler,
            VehicleType::FourWheeler,
        ]
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for VehicleType {
    type Err = VahanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "two_wheeler" | "2w" => Ok(VehicleType::TwoWheeler),
            "three_wheeler" | "3w" => Ok(VehicleType::ThreeWheeler),
            "four_wheeler" | "4w" => Ok(VehicleType::FourWheeler),
            _ => Err(VahanError::InvalidInput(format!(
                "Invalid vehicle type: {}",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_type_from_str() {
        assert_eq!(
            "four_wheeler".parse::<VehicleType>().unwrap(),
            VehicleType::FourWheeler
        );
        assert_eq!(
            "three-wheeler".parse::<VehicleType>().unwrap(),
            VehicleType::ThreeWheeler
        );
        assert_eq!("2w".parse::<VehicleType>().unwrap(), VehicleType::TwoWheeler);
        assert!("airplane".parse::<VehicleType>().is_err());
    }

    #[test]
    fn test_measure_columns_include_total() {
        for vt in VehicleType::all() {
            assert!(vt.measure_columns().contains(&"TOTAL"));
        }
    }

    #[test]
    fn test_display_matches_key() {
        assert_eq!(VehicleType::FourWheeler.to_string(), "four_wheeler");
    }
}

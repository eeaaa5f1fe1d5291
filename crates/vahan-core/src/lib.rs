//! # Vahan Core
//!
//! 차량 등록 분석 서비스의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 분석 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 등록 레코드 및 차종 스키마
//! - 기간 키 (연도/분기) 및 기간 추출
//! - 누적(Till date) 센티널 처리
//! - 설정 관리
//! - 로깅 인프라
//! - 에러 타입

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

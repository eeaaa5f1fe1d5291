//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 데이터베이스 설정
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 데이터 적재 설정
    #[serde(default)]
    pub data: DataConfig,
    /// 분석 기본값 설정
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite 연결 URL (예: "sqlite://data/vahan.db?mode=rwc")
    pub url: String,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/vahan.db?mode=rwc".to_string(),
            max_connections: 5,
            connection_timeout_secs: 30,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 데이터 적재 설정.
///
/// 최초 기동 시 시드할 차종별 CSV 파일 경로를 관리합니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    /// CSV 파일이 위치한 디렉토리
    pub csv_dir: String,
    /// 차종 키 → CSV 파일명 매핑 (예: "four_wheeler" → "four_wheeler_data.csv")
    #[serde(default)]
    pub csv_files: HashMap<String, String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        let mut csv_files = HashMap::new();
        csv_files.insert(
            "four_wheeler".to_string(),
            "four_wheeler_data.csv".to_string(),
        );
        csv_files.insert(
            "three_wheeler".to_string(),
            "three_wheeler_data.csv".to_string(),
        );
        csv_files.insert(
            "two_wheeler".to_string(),
            "two_wheeler_data.csv".to_string(),
        );

        Self {
            csv_dir: "./data".to_string(),
            csv_files,
        }
    }
}

/// 분석 기본값 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyticsConfig {
    /// 기본 그룹핑 속성 (카테고리 컬럼 중 하나)
    pub default_group_by: String,
    /// 기본 기간 단위 (year | quarter)
    pub default_granularity: String,
    /// 상위 기간 목록의 기본 크기
    pub top_n: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_group_by: "vehicle_class".to_string(),
            default_granularity: "year".to_string(),
            top_n: 5,
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("VAHAN")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }
}

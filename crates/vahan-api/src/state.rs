//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! `AppState`는 모든 API 핸들러에서 공유되는 상태를 관리합니다.
//! Arc로 래핑되어 여러 요청 간에 안전하게 공유됩니다.

use vahan_core::AppConfig;
use vahan_data::RegistrationStore;

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 핸들러에 주입됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 등록 데이터 저장소
    pub store: RegistrationStore,

    /// 애플리케이션 설정
    pub config: AppConfig,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    pub fn new(store: RegistrationStore, config: AppConfig) -> Self {
        Self {
            store,
            config,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// 테스트용 상태를 생성합니다.
///
/// 인메모리 SQLite 저장소에 소형 사륜차 샘플을 시드합니다.
#[cfg(any(test, feature = "test-utils"))]
pub async fn create_test_state() -> AppState {
    use vahan_core::VehicleType;
    use vahan_data::parse_csv;

    const SAMPLE: &str = "\
Date,Vehicle Category,Manufacturer,Vehicle Class,LMV,HMV,TOTAL
2020-04-01,Four Wheeler,Maruti,LMV,100,0,100
2021-04-01,Four Wheeler,Maruti,LMV,110,0,110
2022-04-01,Four Wheeler,Maruti,LMV,121,0,121
2023-04-01,Four Wheeler,Maruti,LMV,133,0,133
2021-05-01,Four Wheeler,Tata,HMV,0,40,40
2022-05-01,Four Wheeler,Tata,HMV,0,30,30
Till date,Four Wheeler,Maruti,LMV,900,0,900
";

    let store = RegistrationStore::connect("sqlite::memory:", 1)
        .await
        .expect("in-memory store");
    store.ensure_initialized().await.expect("schema");

    let outcome = parse_csv(SAMPLE).expect("sample csv");
    store
        .insert_outcome(VehicleType::FourWheeler, &outcome)
        .await
        .expect("seed sample");

    AppState::new(store, AppConfig::default())
}

//! 등록 분석 API 서버.
//!
//! Axum 기반 REST API 서버를 시작합니다.
//! 시작 시 저장소 스키마를 멱등하게 초기화하고, 저장소가 비어 있으면
//! 설정된 CSV 디렉토리에서 시드합니다. 요청 처리 경로에는 초기화 검사가
//! 없습니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use vahan_api::routes::create_api_router;
use vahan_api::state::AppState;
use vahan_api::swagger_ui_router;
use vahan_core::{init_logging, AppConfig, LogConfig};
use vahan_data::RegistrationStore;

/// ctrl-c 수신 시 종료합니다.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // 설정 파일이 없으면 기본값으로 기동
    let config = AppConfig::load_default().unwrap_or_else(|e| {
        eprintln!("Config file not loaded ({}), using defaults", e);
        AppConfig::default()
    });

    let log_config = LogConfig::new(&config.logging.level).with_format(
        config
            .logging
            .format
            .parse()
            .unwrap_or_default(),
    );
    init_logging(log_config).map_err(|e| anyhow::anyhow!("logging init failed: {}", e))?;

    // 저장소 연결 및 명시적 초기화 (프로세스 시작 시 한 번)
    let store = RegistrationStore::connect(
        &config.database.url,
        config.database.max_connections,
    )
    .await?;
    store.ensure_initialized().await?;

    if store.is_empty().await? {
        let imported = store.seed_from_dir(&config.data).await?;
        if imported == 0 {
            warn!(
                csv_dir = %config.data.csv_dir,
                "Store is empty and no seed CSV files were found"
            );
        } else {
            info!(files = imported, "Store seeded from CSV directory");
        }
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = Arc::new(AppState::new(store, config));

    let app = create_api_router()
        .merge(swagger_ui_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state);

    info!(%addr, "Starting registration analytics API server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

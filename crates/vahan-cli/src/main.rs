//! 등록 분석 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 사륜차 CSV 적재
//! vahan import -t four_wheeler -f data/four_wheeler_data.csv
//!
//! # 연도별 투자자 리포트 (차량 클래스 그룹)
//! vahan report -t four_wheeler -g vehicle_class -p year
//!
//! # 분기별 리포트, 상위 3개 기간
//! vahan report -t four_wheeler -p quarter --top-n 3
//!
//! # 조회 가능한 연도/클래스 목록
//! vahan classes -t four_wheeler
//! ```

use clap::{Parser, Subcommand};
use tracing::error;

mod commands;

use commands::import::run_import;
use commands::report::{run_classes, run_report};

use vahan_core::{init_logging, AppConfig, LogConfig};
use vahan_data::RegistrationStore;

#[derive(Parser)]
#[command(name = "vahan")]
#[command(about = "Vehicle registration analytics CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 차종별 CSV 파일을 저장소에 적재
    Import {
        /// 차종 (two_wheeler | three_wheeler | four_wheeler)
        #[arg(short = 't', long)]
        vehicle_type: String,

        /// CSV 파일 경로
        #[arg(short = 'f', long)]
        file: String,
    },

    /// 투자자 리포트 출력 (기간 합계, 성장률, 지표)
    Report {
        /// 차종 (two_wheeler | three_wheeler | four_wheeler)
        #[arg(short = 't', long)]
        vehicle_type: String,

        /// 그룹핑 속성 (vehicle_category | manufacturer | vehicle_class)
        #[arg(short = 'g', long, default_value = "vehicle_class")]
        group_by: String,

        /// 기간 단위 (year | quarter)
        #[arg(short = 'p', long, default_value = "year")]
        granularity: String,

        /// 측정값 컬럼
        #[arg(short = 'm', long, default_value = "TOTAL")]
        measure: String,

        /// 상위 기간 목록 크기
        #[arg(long, default_value = "5")]
        top_n: usize,

        /// 연도 필터 (쉼표 구분, 예: 2021,2022)
        #[arg(long)]
        years: Option<String>,
    },

    /// 조회 가능한 연도/차량 클래스 목록 출력
    Classes {
        /// 차종 (two_wheeler | three_wheeler | four_wheeler)
        #[arg(short = 't', long)]
        vehicle_type: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load_default().unwrap_or_default();
    init_logging(LogConfig::new(&config.logging.level))
        .map_err(|e| anyhow::anyhow!("logging init failed: {}", e))?;

    let store = RegistrationStore::connect(
        &config.database.url,
        config.database.max_connections,
    )
    .await?;
    store.ensure_initialized().await?;

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Import { vehicle_type, file } => run_import(&store, &vehicle_type, &file).await,
        Commands::Report {
            vehicle_type,
            group_by,
            granularity,
            measure,
            top_n,
            years,
        } => {
            run_report(
                &store,
                &vehicle_type,
                &group_by,
                &granularity,
                &measure,
                top_n,
                years.as_deref(),
            )
            .await
        }
        Commands::Classes { vehicle_type } => run_classes(&store, &vehicle_type).await,
    };

    if let Err(e) = &result {
        error!("Command failed: {}", e);
    }
    result
}

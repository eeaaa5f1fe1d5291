//! CSV 적재 커맨드.

use anyhow::Context;
use tracing::info;

use vahan_core::VehicleType;
use vahan_data::RegistrationStore;

/// CSV 파일을 저장소에 적재하고 결과를 출력합니다.
pub async fn run_import(
    store: &RegistrationStore,
    vehicle_type: &str,
    file: &str,
) -> anyhow::Result<()> {
    let vehicle_type: VehicleType = vehicle_type
        .parse()
        .with_context(|| format!("invalid vehicle type '{}'", vehicle_type))?;

    let outcome = store
        .import_csv(vehicle_type, file)
        .await
        .with_context(|| format!("failed to import '{}'", file))?;

    info!(
        vehicle_type = %vehicle_type,
        records = outcome.records.len(),
        cumulative = outcome.cumulative.len(),
        skipped = outcome.skipped_rows,
        "Import finished"
    );

    println!("Imported {} ({})", file, vehicle_type.display_name());
    println!("  records:    {}", outcome.records.len());
    println!("  cumulative: {}", outcome.cumulative.len());
    if outcome.skipped_rows > 0 {
        // 제외 행은 조용히 사라지면 안 됨, 집계가 원본보다 적을 수 있음을 알림
        println!(
            "  skipped:    {} (rows excluded; totals may undercount the source)",
            outcome.skipped_rows
        );
    }

    Ok(())
}

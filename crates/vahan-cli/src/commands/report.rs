//! 투자자 리포트 커맨드.
//!
//! 기간 합계, 그룹별 성장률, 투자자 지표를 터미널 테이블로 출력합니다.
//! 미정의 지표는 "N/A"로 표시합니다. 0으로 대체하지 않습니다.

use anyhow::Context;
use rust_decimal::Decimal;

use vahan_analytics::{aggregate, with_growth, InvestorSummary};
use vahan_core::{PeriodGranularity, VehicleType};
use vahan_data::{RecordFilter, RegistrationStore};

/// Option<Decimal> 지표를 표시 문자열로 변환합니다.
fn fmt_pct(value: &Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{}%", v),
        None => "N/A".to_string(),
    }
}

/// 쉼표로 구분된 연도 목록을 파싱합니다.
fn parse_years(raw: Option<&str>) -> Option<Vec<i32>> {
    raw.map(|s| {
        s.split(',')
            .filter_map(|y| y.trim().parse().ok())
            .collect()
    })
}

/// 투자자 리포트를 출력합니다.
pub async fn run_report(
    store: &RegistrationStore,
    vehicle_type: &str,
    group_by: &str,
    granularity: &str,
    measure: &str,
    top_n: usize,
    years: Option<&str>,
) -> anyhow::Result<()> {
    let vehicle_type: VehicleType = vehicle_type
        .parse()
        .with_context(|| format!("invalid vehicle type '{}'", vehicle_type))?;
    let granularity: PeriodGranularity = granularity
        .parse()
        .with_context(|| format!("invalid granularity '{}'", granularity))?;

    let filter = RecordFilter {
        years: parse_years(years),
        ..Default::default()
    };
    let records = store.fetch_records(vehicle_type, &filter).await?;
    if records.is_empty() {
        println!("No records found for {}", vehicle_type.display_name());
        return Ok(());
    }

    let summary = InvestorSummary::from_records(&records, &[group_by], granularity, measure, top_n)
        .with_context(|| "failed to compute investor summary")?;

    println!("=== {} / {} by {} ===", vehicle_type.display_name(), measure, granularity);
    println!();

    println!("Totals by period:");
    for (slot, growth) in summary.totals.iter().zip(&summary.growth) {
        println!("  {:<8} {:>12}  {:>10}", slot.period, slot.total, fmt_pct(growth));
    }
    println!();

    println!("Growth by {}:", group_by);
    let rows = aggregate(&records, &[group_by], granularity, measure)?;
    for row in with_growth(&rows) {
        println!(
            "  {:<20} {:<8} {:>12}  {:>10}",
            row.group.join("/"),
            row.period,
            row.total,
            fmt_pct(&row.growth_pct)
        );
    }
    println!();

    println!("Investor metrics:");
    println!("  CAGR:       {}", fmt_pct(&summary.cagr_pct));
    println!("  Volatility: {}", fmt_pct(&summary.volatility_pct));
    match &summary.best_period {
        Some(best) => println!("  Best period:  {} ({})", best.period, best.total),
        None => println!("  Best period:  N/A"),
    }
    match &summary.worst_period {
        Some(worst) => println!("  Worst period: {} ({})", worst.period, worst.total),
        None => println!("  Worst period: N/A"),
    }
    println!();

    println!("Top {} periods:", top_n);
    for slot in &summary.top_periods {
        println!("  {:<8} {:>12}", slot.period, slot.total);
    }
    println!();

    if summary.streak_groups.is_empty() {
        println!("No groups with 3+ positive-growth periods.");
    } else {
        println!("Groups with 3+ positive-growth periods:");
        for group in &summary.streak_groups {
            println!("  {}", group.join("/"));
        }
    }

    // 누적(Till date) 합계는 기간 시계열과 분리해 표시
    let cumulative = store.fetch_cumulative(vehicle_type).await?;
    if !cumulative.is_empty() {
        let total: i64 = cumulative
            .iter()
            .map(|row| row.measures.get("TOTAL").copied().unwrap_or(0))
            .sum();
        println!();
        println!("Cumulative (Till date) total: {}", total);
    }

    Ok(())
}

/// 조회 가능한 연도/차량 클래스 목록을 출력합니다.
pub async fn run_classes(store: &RegistrationStore, vehicle_type: &str) -> anyhow::Result<()> {
    let vehicle_type: VehicleType = vehicle_type
        .parse()
        .with_context(|| format!("invalid vehicle type '{}'", vehicle_type))?;

    let years = store.distinct_years(vehicle_type).await?;
    let classes = store.distinct_vehicle_classes(vehicle_type).await?;

    println!("{}", vehicle_type.display_name());
    println!(
        "  years:   {}",
        years
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  classes: {}", classes.join(", "));

    Ok(())
}

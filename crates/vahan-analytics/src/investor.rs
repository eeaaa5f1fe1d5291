//! 투자자 지표 계산 모듈.
//!
//! 등록 추세를 투자 관점에서 평가하기 위한 지표를 제공합니다:
//! - CAGR (연평균 성장률): 첫 기간 대비 마지막 기간의 복리 성장률
//! - 변동성 (Volatility): 성장률 시계열의 표준편차
//! - 최고/최저 기간: 기간별 합계의 argmax/argmin
//! - 상위 N 기간: 합계 내림차순 상위 목록
//! - 성장 연속 그룹: 양(+)의 성장 기간이 임계값 이상인 그룹
//! - 그룹 점유율: 전체 대비 그룹별 비중
//!
//! 모든 연산은 순수 함수이며, 수치적으로 의미 있는 결과를 만들 수 없는
//! 경우 (기저값 0의 CAGR, 기간 부족 등) 에러 대신 `None`을 반환합니다.
//! 한 지표의 미정의가 다른 지표의 계산을 막지 않습니다.

use rust_decimal::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use vahan_core::{PeriodGranularity, PeriodKey, RegistrationRecord, VahanResult};

use crate::aggregate::{aggregate, totals_by_period, PeriodSlot};
use crate::growth::{growth_series, with_growth, GrowthRow};

/// 상위 기간 목록의 기본 크기.
pub const DEFAULT_TOP_N: usize = 5;

/// 성장 연속 그룹 판정 임계값 (양의 성장 기간 수).
///
/// 고정 상수입니다. 설정으로 노출하지 않습니다.
pub const STREAK_THRESHOLD: usize = 3;

/// 지표 표시 소수 자릿수.
const METRIC_SCALE: u32 = 2;

fn round_pct(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(METRIC_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Decimal 타입의 제곱근을 뉴턴 방법으로 계산합니다.
///
/// 초기 추정값 value/2에서 시작해 next = (guess + value/guess) / 2를
/// 수렴할 때까지 반복합니다 (최대 50회, 정밀도 10^-10).
fn decimal_sqrt(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let mut guess = value / Decimal::TWO;
    let precision = Decimal::new(1, 10); // 0.0000000001

    for _ in 0..50 {
        let next_guess = (guess + value / guess) / Decimal::TWO;
        if (next_guess - guess).abs() < precision {
            return next_guess;
        }
        guess = next_guess;
    }

    guess
}

/// CAGR (연평균 성장률, %)을 계산합니다.
///
/// 전체 필터 집합의 기간별 합계 시계열에서 첫 기간과 마지막 기간을 취해
/// `((end / start)^(1/n) - 1) × 100`을 계산합니다. 복리 지수는
/// `n = 기간 수 - 1`입니다.
///
/// # 반환
///
/// 기간이 2개 미만이거나 첫 기간 합계가 0 이하이면 `None`.
pub fn cagr(series: &[PeriodSlot]) -> Option<Decimal> {
    if series.len() < 2 {
        return None;
    }
    let start = series[0].total;
    if start <= 0 {
        return None;
    }
    let end = series[series.len() - 1].total;
    let n = (series.len() - 1) as f64;

    // 분수 지수는 f64 경유로 계산 (Decimal에는 거듭제곱근이 없음)
    let ratio = end as f64 / start as f64;
    let growth = (ratio.powf(1.0 / n) - 1.0) * 100.0;

    Decimal::from_f64_retain(growth).map(round_pct)
}

/// 변동성 (성장률 시계열의 표본 표준편차, %)을 계산합니다.
///
/// 정의된 성장률 값만 사용하며, 표본 분산(n-1 분모)을 사용합니다
/// (pandas `Series.std()`와 동일한 규약).
///
/// # 반환
///
/// 정의된 성장률 값이 2개 미만이면 `None`.
pub fn volatility(growth: &[Option<Decimal>]) -> Option<Decimal> {
    let defined: Vec<Decimal> = growth.iter().flatten().copied().collect();
    if defined.len() < 2 {
        return None;
    }

    let n = Decimal::from(defined.len());
    let mean = defined.iter().copied().sum::<Decimal>() / n;

    // 표본 분산: Σ(xi - mean)² / (n-1)
    let variance = defined
        .iter()
        .map(|g| {
            let d = *g - mean;
            d * d
        })
        .sum::<Decimal>()
        / (n - Decimal::ONE);

    Some(round_pct(decimal_sqrt(variance)))
}

/// 합계가 가장 큰 기간을 반환합니다. 동률이면 첫 번째 기간이 이깁니다.
pub fn best_period(series: &[PeriodSlot]) -> Option<PeriodSlot> {
    let mut best: Option<PeriodSlot> = None;
    for slot in series {
        if best.map_or(true, |b| slot.total > b.total) {
            best = Some(*slot);
        }
    }
    best
}

/// 합계가 가장 작은 기간을 반환합니다. 동률이면 첫 번째 기간이 이깁니다.
pub fn worst_period(series: &[PeriodSlot]) -> Option<PeriodSlot> {
    let mut worst: Option<PeriodSlot> = None;
    for slot in series {
        if worst.map_or(true, |w| slot.total < w.total) {
            worst = Some(*slot);
        }
    }
    worst
}

/// 합계 내림차순 상위 N개 기간을 반환합니다.
///
/// 동률은 이른 기간이 먼저 옵니다 (안정 정렬). N이 기간 수보다 크면
/// 전체를 반환하며 에러가 아닙니다.
pub fn top_periods(series: &[PeriodSlot], n: usize) -> Vec<PeriodSlot> {
    let mut sorted = series.to_vec();
    sorted.sort_by(|a, b| b.total.cmp(&a.total));
    sorted.truncate(n);
    sorted
}

/// 양의 성장 기간이 임계값 이상인 그룹 값을 반환합니다.
///
/// 그룹의 기간 순 성장률 시계열에서 엄격히 양수인 정의된 값의 개수를
/// 세며, 미정의(`None`) 성장률은 양수로 치지 않습니다. 연속일 필요는
/// 없습니다 (원본 동작과 동일). 반환 순서는 그룹 값 사전순입니다.
pub fn positive_growth_groups(rows: &[GrowthRow], threshold: usize) -> Vec<Vec<String>> {
    let mut counts: BTreeMap<&[String], usize> = BTreeMap::new();
    for row in rows {
        let count = counts.entry(row.group.as_slice()).or_insert(0);
        if matches!(row.growth_pct, Some(g) if g > Decimal::ZERO) {
            *count += 1;
        }
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count >= threshold)
        .map(|(group, _)| group.to_vec())
        .collect()
}

/// 전체 집합에서 양의 성장을 보인 기간을 성장률 내림차순으로 반환합니다.
pub fn positive_growth_periods(series: &[PeriodSlot]) -> Vec<(PeriodKey, Decimal)> {
    let growth = growth_series(series);
    let mut positives: Vec<(PeriodKey, Decimal)> = series
        .iter()
        .zip(growth)
        .filter_map(|(slot, g)| match g {
            Some(g) if g > Decimal::ZERO => Some((slot.period, g)),
            _ => None,
        })
        .collect();
    positives.sort_by(|a, b| b.1.cmp(&a.1));
    positives
}

/// 기간별 최고 그룹 행.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestGroupRow {
    /// 기간 키
    pub period: PeriodKey,
    /// 해당 기간 합계가 가장 큰 그룹 값
    pub group: Vec<String>,
    /// 그룹 합계
    pub total: i64,
}

/// 기간마다 합계가 가장 큰 그룹을 찾습니다.
///
/// 동률이면 그룹 값 사전순으로 앞서는 그룹이 이깁니다.
///
/// # Errors
///
/// 그룹핑 속성 또는 측정값 이름이 스키마에 없으면
/// `VahanError::UnknownAttribute`.
pub fn best_group_by_period(
    records: &[RegistrationRecord],
    group_by: &[&str],
    granularity: PeriodGranularity,
    measure: &str,
) -> VahanResult<Vec<BestGroupRow>> {
    let rows = aggregate(records, group_by, granularity, measure)?;

    let mut best: BTreeMap<PeriodKey, (Vec<String>, i64)> = BTreeMap::new();
    for row in &rows {
        match best.get(&row.period) {
            Some((_, total)) if row.total <= *total => {}
            _ => {
                best.insert(row.period, (row.group.clone(), row.total));
            }
        }
    }

    Ok(best
        .into_iter()
        .map(|(period, (group, total))| BestGroupRow {
            period,
            group,
            total,
        })
        .collect())
}

/// 그룹 점유율 행.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupShare {
    /// 그룹 값
    pub group: Vec<String>,
    /// 그룹 합계
    pub total: i64,
    /// 전체 대비 점유율 (%). 전체 합계가 0이면 `None`.
    pub share_pct: Option<Decimal>,
}

/// 전체 대비 그룹별 점유율을 계산합니다 (점유율 차트용).
///
/// # Errors
///
/// 그룹핑 속성 또는 측정값 이름이 스키마에 없으면
/// `VahanError::UnknownAttribute`.
pub fn group_share(
    records: &[RegistrationRecord],
    group_by: &[&str],
    measure: &str,
) -> VahanResult<Vec<GroupShare>> {
    // 기간 구분 없이 그룹 합계만 필요하므로 연도 집계 후 재합산
    let rows = aggregate(records, group_by, PeriodGranularity::Year, measure)?;

    let mut sums: BTreeMap<Vec<String>, i64> = BTreeMap::new();
    for row in rows {
        *sums.entry(row.group).or_insert(0) += row.total;
    }

    let grand_total: i64 = sums.values().sum();
    Ok(sums
        .into_iter()
        .map(|(group, total)| {
            let share_pct = if grand_total != 0 {
                Some(round_pct(
                    Decimal::from(total) / Decimal::from(grand_total) * Decimal::from(100),
                ))
            } else {
                None
            };
            GroupShare {
                group,
                total,
                share_pct,
            }
        })
        .collect())
}

/// 투자자 요약.
///
/// 현재 필터 집합에 대한 파생 지표를 한 번에 모읍니다. 각 지표는 독립적으로
/// 계산되므로 하나가 미정의여도 (예: 기간 1개뿐인 CAGR) 나머지는 유효합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestorSummary {
    /// 기간 단위
    pub granularity: PeriodGranularity,
    /// 측정값 컬럼 이름
    pub measure: String,
    /// 기간별 합계 시계열 (기간 오름차순)
    pub totals: Vec<PeriodSlot>,
    /// 전체 집합 성장률 시계열 (`totals`와 인덱스 정렬, 첫 원소는 항상 `None`)
    pub growth: Vec<Option<Decimal>>,
    /// CAGR (%). 기간 2개 미만 또는 기저값 0 이하이면 `None`.
    pub cagr_pct: Option<Decimal>,
    /// 변동성 (성장률 표본 표준편차, %). 정의된 성장률 2개 미만이면 `None`.
    pub volatility_pct: Option<Decimal>,
    /// 합계가 가장 큰 기간
    pub best_period: Option<PeriodSlot>,
    /// 합계가 가장 작은 기간
    pub worst_period: Option<PeriodSlot>,
    /// 합계 내림차순 상위 기간 목록
    pub top_periods: Vec<PeriodSlot>,
    /// 양의 성장 기간이 임계값 이상인 그룹 값 목록
    pub streak_groups: Vec<Vec<String>>,
}

impl InvestorSummary {
    /// 필터링된 레코드 집합에서 투자자 요약을 계산합니다.
    ///
    /// # 인자
    ///
    /// * `records` - 필터링된 등록 레코드
    /// * `group_by` - 성장 연속 그룹 판정에 사용할 그룹핑 속성
    /// * `granularity` - 기간 단위
    /// * `measure` - 측정값 컬럼 이름
    /// * `top_n` - 상위 기간 목록 크기
    ///
    /// # Errors
    ///
    /// 그룹핑 속성 또는 측정값 이름이 스키마에 없으면
    /// `VahanError::UnknownAttribute`.
    pub fn from_records(
        records: &[RegistrationRecord],
        group_by: &[&str],
        granularity: PeriodGranularity,
        measure: &str,
        top_n: usize,
    ) -> VahanResult<Self> {
        let totals = totals_by_period(records, granularity, measure)?;
        let growth = growth_series(&totals);

        let grouped = aggregate(records, group_by, granularity, measure)?;
        let grouped_growth = with_growth(&grouped);

        Ok(Self {
            granularity,
            measure: measure.to_string(),
            cagr_pct: cagr(&totals),
            volatility_pct: volatility(&growth),
            best_period: best_period(&totals),
            worst_period: worst_period(&totals),
            top_periods: top_periods(&totals, top_n),
            streak_groups: positive_growth_groups(&grouped_growth, STREAK_THRESHOLD),
            totals,
            growth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::record;
    use rust_decimal_macros::dec;

    fn slot(year: i32, total: i64) -> PeriodSlot {
        PeriodSlot {
            period: PeriodKey::Year(year),
            total,
        }
    }

    fn growth_row(group: &str, year: i32, growth_pct: Option<Decimal>) -> GrowthRow {
        GrowthRow {
            group: vec![group.to_string()],
            period: PeriodKey::Year(year),
            total: 0,
            growth_pct,
        }
    }

    #[test]
    fn test_cagr_single_compounding_period() {
        // [100, 121], n=1 → 21.00%
        let series = vec![slot(2021, 100), slot(2022, 121)];
        assert_eq!(cagr(&series), Some(dec!(21.00)));
    }

    #[test]
    fn test_cagr_two_compounding_periods() {
        // [100, _, 121], n=2 → (1.21^(1/2) - 1) * 100 = 10.00%
        let series = vec![slot(2020, 100), slot(2021, 500), slot(2022, 121)];
        assert_eq!(cagr(&series), Some(dec!(10.00)));
    }

    #[test]
    fn test_cagr_undefined_cases() {
        // 기간 1개 → 미정의
        assert_eq!(cagr(&[slot(2021, 100)]), None);
        assert_eq!(cagr(&[]), None);

        // 기저값 0 → 미정의 (에러 아님)
        let series = vec![slot(2021, 0), slot(2022, 50)];
        assert_eq!(cagr(&series), None);
    }

    #[test]
    fn test_cagr_negative_growth() {
        // [200, 100] → (0.5 - 1) * 100 = -50.00%
        let series = vec![slot(2021, 200), slot(2022, 100)];
        assert_eq!(cagr(&series), Some(dec!(-50.00)));
    }

    #[test]
    fn test_volatility_reference_fixture() {
        // 표본 표준편차 [10, -5, 15]: 평균 6.6667,
        // 분산 = (3.3333² + 11.6667² + 8.3333²) / 2 = 108.3333 → 10.41
        let growth = vec![Some(dec!(10.0)), Some(dec!(-5.0)), Some(dec!(15.0))];
        assert_eq!(volatility(&growth), Some(dec!(10.41)));
    }

    #[test]
    fn test_volatility_ignores_undefined() {
        // 미정의 값은 표본에서 제외, 첫 기간 None은 영향 없음
        let growth = vec![None, Some(dec!(10.0)), Some(dec!(-5.0)), Some(dec!(15.0))];
        assert_eq!(volatility(&growth), Some(dec!(10.41)));
    }

    #[test]
    fn test_volatility_insufficient_data() {
        assert_eq!(volatility(&[None, Some(dec!(5.0))]), None);
        assert_eq!(volatility(&[None, None]), None);
        assert_eq!(volatility(&[]), None);
    }

    #[test]
    fn test_best_worst_period_ties_first_wins() {
        let series = vec![slot(2018, 50), slot(2019, 90), slot(2020, 90), slot(2021, 50)];

        let best = best_period(&series).unwrap();
        assert_eq!(best.period, PeriodKey::Year(2019));
        assert_eq!(best.total, 90);

        let worst = worst_period(&series).unwrap();
        assert_eq!(worst.period, PeriodKey::Year(2018));
    }

    #[test]
    fn test_best_worst_empty() {
        assert_eq!(best_period(&[]), None);
        assert_eq!(worst_period(&[]), None);
    }

    #[test]
    fn test_top_periods_ordering() {
        // 합계 [10,50,30,90,20,70] / 기간 2018..2023
        let series = vec![
            slot(2018, 10),
            slot(2019, 50),
            slot(2020, 30),
            slot(2021, 90),
            slot(2022, 20),
            slot(2023, 70),
        ];

        let top = top_periods(&series, 5);
        let periods: Vec<PeriodKey> = top.iter().map(|s| s.period).collect();
        assert_eq!(
            periods,
            vec![
                PeriodKey::Year(2021),
                PeriodKey::Year(2023),
                PeriodKey::Year(2019),
                PeriodKey::Year(2020),
                PeriodKey::Year(2022),
            ]
        );
        assert_eq!(top[0].total, 90);
        assert_eq!(top[1].total, 70);
    }

    #[test]
    fn test_top_periods_ties_earliest_first() {
        let series = vec![slot(2018, 70), slot(2019, 90), slot(2020, 70)];
        let top = top_periods(&series, 2);
        assert_eq!(top[0].period, PeriodKey::Year(2019));
        assert_eq!(top[1].period, PeriodKey::Year(2018)); // 동률은 이른 기간 먼저
    }

    #[test]
    fn test_top_periods_n_exceeds_available() {
        let series = vec![slot(2021, 10), slot(2022, 20)];
        // N > 기간 수 → 전체 반환, 에러 아님
        assert_eq!(top_periods(&series, 5).len(), 2);
    }

    #[test]
    fn test_streak_groups_threshold_boundary() {
        // 양수 2개 → 제외
        let excluded = vec![
            growth_row("A", 2020, None),
            growth_row("A", 2021, Some(dec!(5.0))),
            growth_row("A", 2022, Some(dec!(3.0))),
            growth_row("A", 2023, Some(dec!(-1.0))),
        ];
        assert!(positive_growth_groups(&excluded, STREAK_THRESHOLD).is_empty());

        // 양수 3개 → 포함 (첫 기간의 미정의는 세지 않음)
        let included = vec![
            growth_row("B", 2020, None),
            growth_row("B", 2021, Some(dec!(5.0))),
            growth_row("B", 2022, Some(dec!(3.0))),
            growth_row("B", 2023, Some(dec!(4.0))),
        ];
        assert_eq!(
            positive_growth_groups(&included, STREAK_THRESHOLD),
            vec![vec!["B".to_string()]]
        );
    }

    #[test]
    fn test_streak_groups_not_consecutive() {
        // 양수가 연속일 필요는 없음: [5, -1, 3, 4] → 양수 3개 → 포함
        let rows = vec![
            growth_row("C", 2019, None),
            growth_row("C", 2020, Some(dec!(5.0))),
            growth_row("C", 2021, Some(dec!(-1.0))),
            growth_row("C", 2022, Some(dec!(3.0))),
            growth_row("C", 2023, Some(dec!(4.0))),
        ];
        assert_eq!(
            positive_growth_groups(&rows, STREAK_THRESHOLD),
            vec![vec!["C".to_string()]]
        );
    }

    #[test]
    fn test_streak_groups_zero_growth_not_positive() {
        // 0% 성장은 엄격히 양수가 아님
        let rows = vec![
            growth_row("D", 2020, Some(dec!(0.0))),
            growth_row("D", 2021, Some(dec!(1.0))),
            growth_row("D", 2022, Some(dec!(2.0))),
        ];
        assert!(positive_growth_groups(&rows, STREAK_THRESHOLD).is_empty());
    }

    #[test]
    fn test_positive_growth_periods_sorted_desc() {
        let series = vec![slot(2020, 100), slot(2021, 110), slot(2022, 99), slot(2023, 148)];
        let positives = positive_growth_periods(&series);

        // 2023: +49.49%, 2021: +10.00% 내림차순
        assert_eq!(positives.len(), 2);
        assert_eq!(positives[0].0, PeriodKey::Year(2023));
        assert_eq!(positives[1].0, PeriodKey::Year(2021));
        assert_eq!(positives[1].1, dec!(10.00));
    }

    #[test]
    fn test_best_group_by_period() {
        let records = vec![
            record("2021-01-01", "Tata", "LMV", 10),
            record("2021-02-01", "Tata", "HMV", 30),
            record("2022-01-01", "Tata", "LMV", 50),
            record("2022-02-01", "Tata", "HMV", 20),
        ];

        let best = best_group_by_period(
            &records,
            &["vehicle_class"],
            PeriodGranularity::Year,
            "TOTAL",
        )
        .unwrap();

        assert_eq!(best.len(), 2);
        assert_eq!(best[0].period, PeriodKey::Year(2021));
        assert_eq!(best[0].group, vec!["HMV".to_string()]);
        assert_eq!(best[1].group, vec!["LMV".to_string()]);
        assert_eq!(best[1].total, 50);
    }

    #[test]
    fn test_group_share() {
        let records = vec![
            record("2021-01-01", "Tata", "LMV", 75),
            record("2022-01-01", "Tata", "HMV", 25),
        ];

        let shares = group_share(&records, &["vehicle_class"], "TOTAL").unwrap();
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].group, vec!["HMV".to_string()]);
        assert_eq!(shares[0].share_pct, Some(dec!(25.00)));
        assert_eq!(shares[1].share_pct, Some(dec!(75.00)));
    }

    #[test]
    fn test_investor_summary_assembly() {
        let records = vec![
            record("2020-01-01", "Tata", "LMV", 100),
            record("2021-01-01", "Tata", "LMV", 110),
            record("2022-01-01", "Tata", "LMV", 121),
            record("2023-01-01", "Tata", "LMV", 133),
        ];

        let summary = InvestorSummary::from_records(
            &records,
            &["vehicle_class"],
            PeriodGranularity::Year,
            "TOTAL",
            DEFAULT_TOP_N,
        )
        .unwrap();

        assert_eq!(summary.totals.len(), 4);
        // CAGR: (133/100)^(1/3) - 1 ≈ 9.97%
        assert_eq!(summary.cagr_pct, Some(dec!(9.97)));
        assert!(summary.volatility_pct.is_some());
        assert_eq!(summary.best_period.unwrap().period, PeriodKey::Year(2023));
        assert_eq!(summary.worst_period.unwrap().period, PeriodKey::Year(2020));
        // LMV는 양의 성장 3개 기간 → 연속 성장 그룹
        assert_eq!(summary.streak_groups, vec![vec!["LMV".to_string()]]);
    }

    #[test]
    fn test_investor_summary_undefined_metrics_do_not_block() {
        // 기간이 1개면 CAGR/변동성은 미정의지만 최고/최저 기간은 유효
        let records = vec![record("2021-01-01", "Tata", "LMV", 100)];

        let summary = InvestorSummary::from_records(
            &records,
            &["vehicle_class"],
            PeriodGranularity::Year,
            "TOTAL",
            DEFAULT_TOP_N,
        )
        .unwrap();

        assert_eq!(summary.cagr_pct, None);
        assert_eq!(summary.volatility_pct, None);
        assert_eq!(summary.best_period.unwrap().total, 100);
        assert_eq!(summary.top_periods.len(), 1);
    }

    #[test]
    fn test_decimal_sqrt() {
        assert!((decimal_sqrt(dec!(4)) - dec!(2)).abs() < dec!(0.0001));
        assert!((decimal_sqrt(dec!(2)) - dec!(1.4142)).abs() < dec!(0.001));
        assert_eq!(decimal_sqrt(Decimal::ZERO), Decimal::ZERO);
        assert_eq!(decimal_sqrt(dec!(-1)), Decimal::ZERO);
    }
}

//! 전기 대비 성장률 계산.
//!
//! 집계 행에 같은 그룹 내 직전 기간 대비 성장률(%)을 주석으로 추가합니다.
//! 각 그룹의 첫 기간과 직전 값이 0인 경우 성장률은 정의되지 않으며
//! (`None`), 0이나 에러로 대체되지 않습니다. 하위 소비자는 추가 산술 전에
//! 명시적으로 걸러내야 합니다 (연속 성장 카운트에서 미정의는 양수가 아님).

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use vahan_core::PeriodKey;

use crate::aggregate::{AggregateRow, PeriodSlot};

/// 성장률 표시 소수 자릿수.
const GROWTH_SCALE: u32 = 2;

/// 성장률 주석이 붙은 집계 행.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthRow {
    /// 그룹 값
    pub group: Vec<String>,
    /// 기간 키
    pub period: PeriodKey,
    /// 측정값 합계
    pub total: i64,
    /// 직전 기간 대비 성장률 (%). 첫 기간 또는 직전 값 0이면 `None`.
    pub growth_pct: Option<Decimal>,
}

/// 직전 값 대비 변화율(%)을 계산합니다.
///
/// `(curr - prev) / prev * 100`, 소수점 2자리 반올림
/// (중간값은 0에서 멀어지는 방향, pandas `.round(2)`와 동일).
/// 직전 값이 0이면 정의되지 않습니다.
fn pct_change(prev: i64, curr: i64) -> Option<Decimal> {
    if prev == 0 {
        return None;
    }
    let change = Decimal::from(curr - prev) / Decimal::from(prev) * Decimal::from(100);
    Some(change.round_dp_with_strategy(GROWTH_SCALE, RoundingStrategy::MidpointAwayFromZero))
}

/// 집계 행에 그룹별 성장률을 주석으로 추가합니다.
///
/// 입력은 이미 (그룹, 기간 오름차순)으로 정렬되어 있어야 합니다
/// ([`crate::aggregate::aggregate`]의 출력). 입력을 변경하지 않고
/// 새 시퀀스를 생성합니다.
pub fn with_growth(rows: &[AggregateRow]) -> Vec<GrowthRow> {
    let mut result = Vec::with_capacity(rows.len());
    let mut prev: Option<&AggregateRow> = None;

    for row in rows {
        let growth_pct = match prev {
            // 같은 그룹의 직전 기간 행이 있을 때만 성장률 정의
            Some(p) if p.group == row.group => pct_change(p.total, row.total),
            _ => None,
        };

        result.push(GrowthRow {
            group: row.group.clone(),
            period: row.period,
            total: row.total,
            growth_pct,
        });
        prev = Some(row);
    }

    result
}

/// 전체 집합 기간 시계열의 성장률 시퀀스를 계산합니다.
///
/// 반환 벡터는 입력 슬롯과 인덱스가 정렬되어 있으며, 첫 원소는 항상
/// `None`입니다 (직전 기간 없음).
pub fn growth_series(slots: &[PeriodSlot]) -> Vec<Option<Decimal>> {
    let mut result = Vec::with_capacity(slots.len());
    for (i, slot) in slots.iter().enumerate() {
        if i == 0 {
            result.push(None);
        } else {
            result.push(pct_change(slots[i - 1].total, slot.total));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::aggregate::tests::record;
    use rust_decimal_macros::dec;
    use vahan_core::PeriodGranularity;

    fn agg_row(group: &str, year: i32, total: i64) -> AggregateRow {
        AggregateRow {
            group: vec![group.to_string()],
            period: PeriodKey::Year(year),
            total,
        }
    }

    #[test]
    fn test_first_period_growth_undefined() {
        let rows = vec![agg_row("LMV", 2021, 100), agg_row("LMV", 2022, 121)];
        let growth = with_growth(&rows);

        assert_eq!(growth[0].growth_pct, None);
        assert_eq!(growth[1].growth_pct, Some(dec!(21.00)));
    }

    #[test]
    fn test_growth_hand_computed_fixture() {
        // (150-120)/120*100 = 25.00, (135-150)/150*100 = -10.00
        let rows = vec![
            agg_row("LMV", 2020, 120),
            agg_row("LMV", 2021, 150),
            agg_row("LMV", 2022, 135),
        ];
        let growth = with_growth(&rows);

        assert_eq!(growth[1].growth_pct, Some(dec!(25.00)));
        assert_eq!(growth[2].growth_pct, Some(dec!(-10.00)));
    }

    #[test]
    fn test_growth_rounded_to_two_decimals() {
        // (1/3)*100 = 33.333... → 33.33, (2/3)*100 = 66.666... → 66.67
        let rows = vec![
            agg_row("LMV", 2020, 3),
            agg_row("LMV", 2021, 4),
            agg_row("LMV", 2022, 2),
        ];
        let growth = with_growth(&rows);

        assert_eq!(growth[1].growth_pct, Some(dec!(33.33)));
        assert_eq!(growth[2].growth_pct, Some(dec!(-50.00)));
    }

    #[test]
    fn test_growth_zero_previous_undefined() {
        // 직전 값 0 → 0 나누기 → 미정의 (에러 아님)
        let rows = vec![agg_row("LMV", 2021, 0), agg_row("LMV", 2022, 50)];
        let growth = with_growth(&rows);

        assert_eq!(growth[1].growth_pct, None);
    }

    #[test]
    fn test_growth_resets_between_groups() {
        // 그룹 경계에서 직전 기간 비교가 이어지면 안 됨
        let rows = vec![
            agg_row("HMV", 2021, 10),
            agg_row("HMV", 2022, 20),
            agg_row("LMV", 2021, 40),
            agg_row("LMV", 2022, 50),
        ];
        let growth = with_growth(&rows);

        assert_eq!(growth[1].growth_pct, Some(dec!(100.00)));
        assert_eq!(growth[2].growth_pct, None); // LMV의 첫 기간
        assert_eq!(growth[3].growth_pct, Some(dec!(25.00)));
    }

    #[test]
    fn test_growth_single_period_group() {
        // 한 기간만 있는 그룹은 성장 파트너 없이 단일 행
        let rows = vec![agg_row("3WT", 2021, 10)];
        let growth = with_growth(&rows);

        assert_eq!(growth.len(), 1);
        assert_eq!(growth[0].growth_pct, None);
    }

    #[test]
    fn test_growth_does_not_mutate_totals() {
        // 라운드트립: GrowthRow에서 복원한 합계가 원시 입력 합계와 같아야 함
        let records = vec![
            record("2021-01-01", "Tata", "LMV", 11),
            record("2022-01-01", "Tata", "LMV", 13),
            record("2022-03-01", "Maruti", "HMV", 17),
        ];
        let raw_sum: i64 = records.iter().map(|r| r.total()).sum();

        let rows =
            aggregate(&records, &["vehicle_class"], PeriodGranularity::Year, "TOTAL").unwrap();
        let growth = with_growth(&rows);
        let growth_sum: i64 = growth.iter().map(|r| r.total).sum();

        assert_eq!(raw_sum, growth_sum);
    }

    #[test]
    fn test_growth_series_whole_set() {
        let slots = vec![
            PeriodSlot {
                period: PeriodKey::Year(2021),
                total: 100,
            },
            PeriodSlot {
                period: PeriodKey::Year(2022),
                total: 110,
            },
            PeriodSlot {
                period: PeriodKey::Year(2023),
                total: 99,
            },
        ];
        let series = growth_series(&slots);

        assert_eq!(series, vec![None, Some(dec!(10.00)), Some(dec!(-10.00))]);
    }

    #[test]
    fn test_growth_series_empty() {
        assert!(growth_series(&[]).is_empty());
    }
}
